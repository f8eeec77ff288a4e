use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::KeyCode,
    window::{Window, WindowAttributes},
};

use crate::events::SceneRequest;
use crate::gfx::{
    geometry::PrimitiveKind,
    rendering::render_engine::RenderEngine,
    scene::LightKind,
};
use crate::viewport::{ViewportController, ViewportOptions};

/// Top-level viewport application owning the winit event loop.
///
/// The controller is built immediately so headless callers can mutate the
/// scene before the window exists; GPU resources are created lazily on the
/// first frame after `resumed`.
pub struct ViewportApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    controller: ViewportController,
}

impl ViewportApp {
    pub fn new(options: ViewportOptions) -> Self {
        let event_loop = EventLoop::new().expect("Failed to create event loop");
        let controller = ViewportController::new(options, 1.5);

        Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                controller,
            },
        }
    }

    /// Mutable access to the controller, for pre-run scene setup.
    pub fn controller_mut(&mut self) -> &mut ViewportController {
        &mut self.app_state.controller
    }

    /// Runs the event loop until the window closes or Escape is pressed.
    pub fn run(mut self) -> anyhow::Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;
        Ok(())
    }
}

impl AppState {
    /// Cursor position in pixels to normalized device coordinates, y up.
    fn cursor_ndc(&self, x: f64, y: f64) -> (f32, f32) {
        let Some(window) = self.window.as_ref() else {
            return (0.0, 0.0);
        };
        let size = window.inner_size();
        let ndc_x = (2.0 * x / size.width as f64 - 1.0) as f32;
        let ndc_y = (-2.0 * y / size.height as f64 + 1.0) as f32;
        (ndc_x, ndc_y)
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key_code: KeyCode) {
        match key_code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyX => self.controller.delete_selected(),
            KeyCode::Digit1 => self.submit_primitive(PrimitiveKind::Sphere),
            KeyCode::Digit2 => self.submit_primitive(PrimitiveKind::Cube),
            KeyCode::Digit3 => self.submit_primitive(PrimitiveKind::Cylinder),
            KeyCode::Digit4 => self.submit_primitive(PrimitiveKind::Cone),
            KeyCode::Digit5 => self.submit_primitive(PrimitiveKind::Plane),
            KeyCode::Digit6 => self.submit_primitive(PrimitiveKind::Torus),
            KeyCode::Digit7 => self.submit_light(LightKind::Point),
            KeyCode::Digit8 => self.submit_light(LightKind::Spot),
            KeyCode::Digit9 => self.submit_light(LightKind::Ambient),
            _ => {}
        }
    }

    fn submit_primitive(&mut self, kind: PrimitiveKind) {
        self.controller.bus.submit(SceneRequest::AddPrimitive(kind));
    }

    fn submit_light(&mut self, kind: LightKind) {
        self.controller.bus.submit(SceneRequest::AddLight(kind));
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Ok(window) = event_loop.create_window(
            WindowAttributes::default()
                .with_title("sceneforge")
                .with_inner_size(winit::dpi::LogicalSize::new(1200, 800)),
        ) {
            let window_handle = Arc::new(window);
            self.window = Some(window_handle.clone());

            let (width, height) = window_handle.inner_size().into();
            self.controller.set_size(width, height);

            let window_clone = window_handle.clone();
            let renderer = pollster::block_on(async move {
                RenderEngine::new(window_clone, width, height).await
            });

            self.render_engine = Some(renderer);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: winit::event::WindowEvent,
    ) {
        // Close and key handling must work even when the render engine
        // failed to come up, so each arm guards its own engine use.
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let ndc = self.cursor_ndc(position.x, position.y);
                self.controller.pointer_move(ndc);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => self.controller.pointer_down(),
                ElementState::Released => self.controller.pointer_up(),
            },
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                self.controller
                    .scene
                    .camera_manager
                    .process_keyboard_event(&key_event);

                if key_event.state == ElementState::Pressed && !key_event.repeat {
                    if let winit::keyboard::PhysicalKey::Code(key_code) = key_event.physical_key {
                        self.handle_key(event_loop, key_code);
                    }
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.controller.set_size(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.controller.process_requests();
                self.controller.update();

                let Some(render_engine) = self.render_engine.as_mut() else {
                    return;
                };

                self.controller
                    .scene
                    .init_gpu_resources(render_engine.device(), render_engine.queue());
                self.controller
                    .scene
                    .update_all_transforms(render_engine.queue());

                render_engine.update(
                    self.controller.scene.camera_manager.camera.uniform,
                    &self.controller.scene,
                );
                render_engine.render_frame(&self.controller.scene);

                for event in self.controller.bus.drain_events() {
                    log::info!("viewport event: {event:?}");
                }
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        self.controller
            .scene
            .camera_manager
            .process_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
