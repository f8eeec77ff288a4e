//! Viewport interaction layer: picking, the manipulator, and the
//! controller state machine tying them to the scene.

pub mod controller;
pub mod manipulator;
pub mod picking;

pub use controller::{ViewportController, ViewportOptions};
pub use manipulator::Manipulator;
pub use picking::{PickHit, Ray, ScenePicker};
