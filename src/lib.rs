// src/lib.rs
//! Sceneforge 3D Editor Viewport
//!
//! An interactive scene-editor viewport built on wgpu and winit: orbit camera,
//! object factories for primitives/lights/models, mouse picking, and an
//! axis-constrained translation manipulator.

pub mod app;
pub mod error;
pub mod events;
pub mod gfx;
pub mod viewport;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::ViewportApp;
pub use error::ViewportError;
pub use viewport::controller::{ViewportController, ViewportOptions};

/// Creates a default viewport application instance
pub fn default() -> ViewportApp {
    ViewportApp::new(ViewportOptions::default())
}
