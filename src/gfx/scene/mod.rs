//! # Scene Management Module
//!
//! The scene graph the viewport edits: an ordered node collection, the light
//! table, and the camera. Nodes cover fabricated primitives, loaded models,
//! light rigs, the ground grid, and the manipulator's axis handles.

pub mod node;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use node::{Axis, DrawNode, Light, LightId, LightKind, Mesh, NodeId, NodeKind, SceneNode};
pub use scene::Scene;
pub use vertex::Vertex3D;
