// src/wgpu_utils/mod.rs
//! WGPU utility helpers.

pub mod uniform_buffer;

pub use uniform_buffer::UniformBuffer;
