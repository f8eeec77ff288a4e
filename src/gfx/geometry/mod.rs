//! # Procedural Geometry Generation
//!
//! Generates the primitive shapes the viewport factories insert into the
//! scene, plus the ground grid and manipulator handle geometry. No external
//! model files are needed for any of these.

pub mod primitives;

use std::{fmt, str::FromStr};

pub use primitives::*;

use crate::error::ViewportError;
use crate::gfx::scene::vertex::Vertex3D;

/// The primitive shapes the viewport can fabricate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Sphere,
    Cube,
    Cylinder,
    Cone,
    Plane,
    Torus,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 6] = [
        PrimitiveKind::Sphere,
        PrimitiveKind::Cube,
        PrimitiveKind::Cylinder,
        PrimitiveKind::Cone,
        PrimitiveKind::Plane,
        PrimitiveKind::Torus,
    ];

    /// Type tag used when naming new nodes, e.g. `"sphere.12"`.
    pub fn tag(self) -> &'static str {
        match self {
            PrimitiveKind::Sphere => "sphere",
            PrimitiveKind::Cube => "cube",
            PrimitiveKind::Cylinder => "cylinder",
            PrimitiveKind::Cone => "cone",
            PrimitiveKind::Plane => "plane",
            PrimitiveKind::Torus => "torus",
        }
    }

    /// Plane and torus are generated facing +Z and need a -90 degree X
    /// rotation to lie flat on the ground.
    pub fn lies_flat(self) -> bool {
        matches!(self, PrimitiveKind::Plane | PrimitiveKind::Torus)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for PrimitiveKind {
    type Err = ViewportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sphere" => Ok(PrimitiveKind::Sphere),
            "cube" => Ok(PrimitiveKind::Cube),
            "cylinder" => Ok(PrimitiveKind::Cylinder),
            "cone" => Ok(PrimitiveKind::Cone),
            "plane" => Ok(PrimitiveKind::Plane),
            "torus" => Ok(PrimitiveKind::Torus),
            other => Err(ViewportError::UnsupportedPrimitive(other.to_string())),
        }
    }
}

/// Generated geometry ready for GPU upload.
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Indices; triangle list for solid shapes, line list for the grid
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Converts to the interleaved vertex format the renderer consumes.
    pub fn to_mesh_format(&self) -> (Vec<Vertex3D>, Vec<u32>) {
        let vertices = (0..self.vertices.len())
            .map(|i| Vertex3D {
                position: self.vertices[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect();

        (vertices, self.indices.clone())
    }

    /// Generates the geometry for a primitive kind at the editor's default
    /// dimensions.
    pub fn for_primitive(kind: PrimitiveKind) -> GeometryData {
        match kind {
            PrimitiveKind::Sphere => generate_sphere(100.0, 16, 16),
            PrimitiveKind::Cube => generate_cube(100.0),
            PrimitiveKind::Cylinder => generate_cylinder(50.0, 50.0, 100.0, 16),
            PrimitiveKind::Cone => generate_cylinder(0.0, 50.0, 100.0, 16),
            PrimitiveKind::Plane => generate_plane(200.0, 200.0, 3, 3),
            PrimitiveKind::Torus => generate_torus(100.0, 40.0, 8, 6),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_kind_parsing() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(kind.tag().parse::<PrimitiveKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_primitive_kind_is_reported() {
        let err = "teapot".parse::<PrimitiveKind>().unwrap_err();
        assert!(matches!(
            err,
            ViewportError::UnsupportedPrimitive(ref s) if s == "teapot"
        ));
    }

    #[test]
    fn test_flat_primitives() {
        assert!(PrimitiveKind::Plane.lies_flat());
        assert!(PrimitiveKind::Torus.lies_flat());
        assert!(!PrimitiveKind::Cube.lies_flat());
    }
}
