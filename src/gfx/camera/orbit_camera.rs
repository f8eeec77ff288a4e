use cgmath::*;

use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};

/// Maps OpenGL clip depth (z in [-1, 1]) to wgpu clip depth (z in [0, 1]).
/// Column-major, as `Matrix4::new` expects.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Default editor camera offset: eye at (300, 150, 300) looking at the origin.
pub const DEFAULT_DISTANCE: f32 = 450.0;
pub const DEFAULT_YAW: f32 = std::f32::consts::FRAC_PI_4;
/// asin(150 / 450)
pub const DEFAULT_PITCH: f32 = 0.339_836_9;

/// Y-up orbit camera circling a target point.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.eye);
        let target = Point3::from_vec(self.target);
        let view = Matrix4::look_at_rh(eye, target, self.up);
        let proj =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            eye: Vector3::zero(), // Recalculated in `update()`
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy: Deg(70.0).into(),
            znear: 1.0,
            zfar: 5000.0,
            uniform: CameraUniform::default(),
        };
        camera.update();
        camera
    }

    /// Camera at the editor's default offset.
    pub fn editor_default(aspect: f32) -> Self {
        Self::new(
            DEFAULT_DISTANCE,
            DEFAULT_PITCH,
            DEFAULT_YAW,
            Vector3::zero(),
            aspect,
        )
    }

    pub fn reset_to_default(&mut self) {
        self.distance = DEFAULT_DISTANCE;
        self.pitch = DEFAULT_PITCH;
        self.yaw = DEFAULT_YAW;
        self.target = Vector3::zero();
        self.update();
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(
            self.bounds.min_distance.unwrap_or(f32::EPSILON),
            self.bounds.max_distance.unwrap_or(f32::MAX),
        );
        self.update();
    }

    pub fn add_distance(&mut self, delta: f32) {
        // Log-scaled so zoom speed feels uniform across distances
        let corrected_zoom = f32::log10(self.distance.max(1.0 + f32::EPSILON)) * delta;
        self.set_distance(self.distance + corrected_zoom);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.yaw = yaw;
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    /// Pans the camera relative to the current view direction.
    /// delta.0 is horizontal, delta.1 vertical, both in view space.
    pub fn pan(&mut self, delta: (f32, f32)) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();

        // Distance-scaled so panning feels consistent at every zoom level
        let pan_scale = self.distance * 0.1;
        let movement = right * delta.0 * pan_scale + up * delta.1 * pan_scale;

        self.eye += movement;
        self.target += movement;
    }

    /// Updates the eye position after changing `distance`, `pitch` or `yaw`.
    fn update(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: None,
            max_distance: Some(DEFAULT_DISTANCE * 100.0),
            min_pitch: -std::f32::consts::PI / 2.0 + f32::EPSILON,
            max_pitch: std::f32::consts::PI / 2.0 - f32::EPSILON,
        }
    }
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
        distance * yaw.cos() * pitch.cos(),
    ) + target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_default_eye_position() {
        let camera = OrbitCamera::editor_default(1.5);
        assert!((camera.eye.x - 300.0).abs() < 0.5);
        assert!((camera.eye.y - 150.0).abs() < 0.5);
        assert!((camera.eye.z - 300.0).abs() < 0.5);
    }

    #[test]
    fn test_depth_remap_maps_gl_clip_range_to_wgpu() {
        // GL near plane (z = -1) lands at wgpu z = 0, far plane (z = 1) at z = 1.
        let near = OPENGL_TO_WGPU_MATRIX * Vector4::new(0.0, 0.0, -1.0, 1.0);
        let far = OPENGL_TO_WGPU_MATRIX * Vector4::new(0.0, 0.0, 1.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-6);
        assert!((far.z / far.w - 1.0).abs() < 1e-6);
        assert!((near.w - 1.0).abs() < 1e-6);
        assert!((far.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_clamps_at_max_distance() {
        let mut camera = OrbitCamera::editor_default(1.0);
        camera.set_distance(1.0e9);
        assert_eq!(camera.distance, DEFAULT_DISTANCE * 100.0);

        camera.add_distance(1.0e9);
        assert_eq!(camera.distance, DEFAULT_DISTANCE * 100.0);
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut camera = OrbitCamera::editor_default(1.0);
        camera.resize_projection(1920, 1080);
        assert_eq!(camera.aspect, 1920.0 / 1080.0);
    }
}
