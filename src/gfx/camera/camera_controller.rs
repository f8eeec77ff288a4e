use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use super::orbit_camera::OrbitCamera;

/// Orbit/pan/zoom input handling with inertial damping.
///
/// Mouse motion feeds a pending velocity; [`CameraController::update`] applies
/// it each frame and decays it by the damping factor, so releasing the button
/// lets the orbit coast to a stop. Rotation can be disabled while a
/// manipulator axis drag is in flight so the two gestures never compete.
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub damping: f32,
    rotation_enabled: bool,
    is_shift_held: bool,
    is_mouse_pressed: bool,
    yaw_velocity: f32,
    pitch_velocity: f32,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            damping: 0.3,
            rotation_enabled: true,
            is_shift_held: false,
            is_mouse_pressed: false,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
        }
    }

    /// Disabled for the duration of an axis drag.
    pub fn set_rotation_enabled(&mut self, enabled: bool) {
        self.rotation_enabled = enabled;
        if !enabled {
            self.yaw_velocity = 0.0;
            self.pitch_velocity = 0.0;
        }
    }

    pub fn rotation_enabled(&self) -> bool {
        self.rotation_enabled
    }

    pub fn process_events(
        &mut self,
        event: &DeviceEvent,
        window: &Window,
        camera: &mut OrbitCamera,
    ) {
        match event {
            DeviceEvent::Button {
                button: 0, // Left Mouse Button
                state,
            } => {
                self.is_mouse_pressed = *state == ElementState::Pressed;
            }
            DeviceEvent::MouseWheel { delta, .. } => {
                let scroll_amount = -match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32
                    }
                };
                camera.add_distance(scroll_amount * self.zoom_speed);
                window.request_redraw();
            }
            DeviceEvent::MouseMotion { delta } => {
                if self.is_mouse_pressed {
                    if self.is_shift_held {
                        // SHIFT + DRAG = PAN (move focus point)
                        camera.pan((
                            -delta.0 as f32 * self.pan_speed,
                            delta.1 as f32 * self.pan_speed,
                        ));
                        window.request_redraw();
                    } else if self.rotation_enabled {
                        // NORMAL DRAG = ORBIT
                        self.yaw_velocity -= delta.0 as f32 * self.rotate_speed;
                        self.pitch_velocity += delta.1 as f32 * self.rotate_speed;
                        window.request_redraw();
                    }
                }
            }
            _ => (),
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) {
        match event {
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight),
                state,
                ..
            } => {
                self.is_shift_held = *state == ElementState::Pressed;
            }
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::KeyC),
                state: ElementState::Pressed,
                ..
            } => {
                if self.is_shift_held {
                    camera.reset_to_default();
                }
            }
            _ => (),
        }
    }

    /// Applies accumulated orbit velocity with damping. Call once per frame.
    pub fn update(&mut self, camera: &mut OrbitCamera) {
        if self.yaw_velocity.abs() > f32::EPSILON || self.pitch_velocity.abs() > f32::EPSILON {
            camera.add_yaw(self.yaw_velocity);
            camera.add_pitch(self.pitch_velocity);
        }

        let keep = 1.0 - self.damping;
        self.yaw_velocity *= keep;
        self.pitch_velocity *= keep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_decays_under_damping() {
        let mut controller = CameraController::new(0.005, 0.1);
        let mut camera = OrbitCamera::editor_default(1.0);
        controller.yaw_velocity = 1.0;

        controller.update(&mut camera);
        assert!((controller.yaw_velocity - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_disabling_rotation_clears_velocity() {
        let mut controller = CameraController::new(0.005, 0.1);
        controller.yaw_velocity = 1.0;
        controller.pitch_velocity = -1.0;

        controller.set_rotation_enabled(false);
        assert_eq!(controller.yaw_velocity, 0.0);
        assert_eq!(controller.pitch_velocity, 0.0);
        assert!(!controller.rotation_enabled());
    }
}
