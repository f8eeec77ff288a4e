//! Error taxonomy for the viewport
//!
//! Editor chrome may deliver primitive and light kinds as plain strings;
//! unsupported kinds are reported here instead of silently dropped.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewportError {
    /// A primitive kind string that maps to no known geometry.
    #[error("unsupported primitive kind: {0:?}")]
    UnsupportedPrimitive(String),

    /// A light kind string that maps to no known light rig.
    #[error("unsupported light kind: {0:?}")]
    UnsupportedLight(String),

    /// OBJ model loading failed.
    #[error("failed to load model: {0}")]
    ModelLoad(#[from] tobj::LoadError),
}
