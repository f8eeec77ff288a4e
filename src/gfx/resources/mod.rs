//! GPU resource management: materials and textures.

pub mod material;
pub mod texture;

pub use material::{Material, MaterialId, MaterialManager};
pub use texture::DepthTexture;
