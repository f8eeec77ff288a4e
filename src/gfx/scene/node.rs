//! Scene nodes and lights
//!
//! A [`SceneNode`] is anything the scene graph holds: fabricated primitives,
//! loaded models, light rigs, the ground grid, and the manipulator's axis
//! handles. Nodes carry their meshes, a position/rotation transform, an
//! optional material reference, and an optional light marker linking a light
//! rig's visual mesh to its entry in the scene's light table.

use std::{
    fmt,
    ops::Range,
    str::FromStr,
    sync::atomic::{AtomicU32, Ordering},
};

use cgmath::{Matrix4, Rad, Vector3};
use wgpu::Device;

use crate::error::ViewportError;
use crate::gfx::geometry::GeometryData;
use crate::gfx::resources::material::MaterialId;

use super::vertex::Vertex3D;

/// Unique node identity, monotonic for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

impl NodeId {
    /// Allocates the next node id.
    pub fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a light in the scene's light table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightId(pub u32);

/// World axis constrained by a manipulator handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// What a node is, as far as rendering and picking are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A renderable, pickable mesh (primitives, models, light rig markers).
    Mesh,
    /// A manipulator axis handle; pickable, drawn as overlay.
    Handle(Axis),
    /// The ground grid; drawn as lines, never picked.
    Grid,
}

/// The flavors of light rig the viewport can fabricate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Point,
    Spot,
    Ambient,
}

impl LightKind {
    pub fn tag(self) -> &'static str {
        match self {
            LightKind::Point => "point",
            LightKind::Spot => "spot",
            LightKind::Ambient => "ambient",
        }
    }
}

impl fmt::Display for LightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for LightKind {
    type Err = ViewportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "point" => Ok(LightKind::Point),
            "spot" => Ok(LightKind::Spot),
            "ambient" => Ok(LightKind::Ambient),
            other => Err(ViewportError::UnsupportedLight(other.to_string())),
        }
    }
}

/// A light entry; its world position follows the rig node that carries it.
#[derive(Debug, Clone, Copy)]
pub struct Light {
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Light {
    pub fn new(kind: LightKind) -> Self {
        Self {
            kind,
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

/// Mesh data with lazily created GPU buffers.
#[derive(Debug)]
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        let index_count = indices.len() as u32;
        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    pub fn from_geometry(data: &GeometryData) -> Self {
        let (vertices, indices) = data.to_mesh_format();
        Self::new(vertices, indices)
    }

    /// Builds a mesh from flat position/normal arrays as loaded from OBJ.
    pub fn from_arrays(positions: &[f32], normals: &[f32], indices: Vec<u32>) -> Self {
        let mut vertices = Vec::with_capacity(positions.len() / 3);
        for i in 0..positions.len() / 3 {
            vertices.push(Vertex3D {
                position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
            });
        }
        Self::new(vertices, indices)
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Averages face normals per vertex for OBJ files without normals.
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0f32; positions.len()];

        for triangle in indices.chunks(3) {
            let i0 = triangle[0] as usize;
            let i1 = triangle[1] as usize;
            let i2 = triangle[2] as usize;

            let v = |i: usize| {
                Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2])
            };
            let face_normal = (v(i1) - v(i0)).cross(v(i2) - v(i0));

            for &vertex_idx in &[i0, i1, i2] {
                normals[vertex_idx * 3] += face_normal.x;
                normals[vertex_idx * 3 + 1] += face_normal.y;
                normals[vertex_idx * 3 + 2] += face_normal.z;
            }
        }

        for i in 0..vertex_count {
            let length = (normals[i * 3].powi(2)
                + normals[i * 3 + 1].powi(2)
                + normals[i * 3 + 2].powi(2))
            .sqrt();
            if length > 0.0 {
                normals[i * 3] /= length;
                normals[i * 3 + 1] /= length;
                normals[i * 3 + 2] /= length;
            }
        }

        normals
    }
}

/// Per-node GPU uniforms for the model transform.
#[derive(Debug)]
pub struct NodeGpuResources {
    pub transform_buffer: wgpu::Buffer,
    pub transform_bind_group: wgpu::BindGroup,
}

#[derive(Debug)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub position: Vector3<f32>,
    /// Euler rotation in radians, applied X then Y then Z.
    pub rotation: Vector3<f32>,
    pub material: Option<MaterialId>,
    /// Light marker; set on light rig nodes only.
    pub light: Option<LightId>,
    pub meshes: Vec<Mesh>,
    pub visible: bool,
    pub gpu_resources: Option<NodeGpuResources>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind, meshes: Vec<Mesh>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            kind,
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            material: None,
            light: None,
            meshes,
            visible: true,
            gpu_resources: None,
        }
    }

    pub fn with_material(mut self, material: impl Into<MaterialId>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// True for light rig nodes.
    pub fn is_light(&self) -> bool {
        self.light.is_some()
    }

    /// True for nodes the pick ray may hit.
    pub fn pickable(&self) -> bool {
        self.visible && !matches!(self.kind, NodeKind::Grid)
    }

    /// World transform from position and Euler rotation.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_z(Rad(self.rotation.z))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_x(Rad(self.rotation.x))
    }

    /// Creates vertex/index buffers and the transform uniform for this node.
    pub fn init_gpu_resources(&mut self, device: &Device) {
        use wgpu::util::DeviceExt;

        for mesh in self.meshes.iter_mut() {
            if mesh.vertex_buffer.is_some() {
                continue;
            }

            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            mesh.vertex_buffer = Some(vertex_buffer);
            mesh.index_buffer = Some(index_buffer);
        }

        if self.gpu_resources.is_some() {
            return;
        }

        let transform_data: [[f32; 4]; 4] = self.model_matrix().into();
        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Transform Uniform Buffer"),
            contents: bytemuck::cast_slice(&transform_data),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let transform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Transform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Transform Bind Group"),
            layout: &transform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
        });

        self.gpu_resources = Some(NodeGpuResources {
            transform_buffer,
            transform_bind_group,
        });
    }

    /// Syncs the model transform to the GPU if resources exist.
    pub fn update_transform(&self, queue: &wgpu::Queue) {
        if let Some(gpu_resources) = &self.gpu_resources {
            let transform_data: [[f32; 4]; 4] = self.model_matrix().into();
            queue.write_buffer(
                &gpu_resources.transform_buffer,
                0,
                bytemuck::cast_slice(&transform_data),
            );
        }
    }

    pub fn transform_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources
            .as_ref()
            .map(|res| &res.transform_bind_group)
    }
}

pub trait DrawNode<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
    fn draw_node(&mut self, node: &'a SceneNode);
}

impl<'a, 'b> DrawNode<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        let vertex_buffer = match &mesh.vertex_buffer {
            Some(buffer) => buffer,
            None => return, // Skip drawing if not uploaded
        };
        let index_buffer = match &mesh.index_buffer {
            Some(buffer) => buffer,
            None => return,
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, instances);
    }

    fn draw_node(&mut self, node: &'b SceneNode) {
        for mesh in &node.meshes {
            self.draw_mesh_instanced(mesh, 0..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;

    #[test]
    fn test_node_ids_are_unique() {
        let a = SceneNode::new("a", NodeKind::Mesh, vec![]);
        let b = SceneNode::new("b", NodeKind::Mesh, vec![]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_light_kind_parsing() {
        assert_eq!("point".parse::<LightKind>().unwrap(), LightKind::Point);
        assert_eq!("spot".parse::<LightKind>().unwrap(), LightKind::Spot);
        assert_eq!("ambient".parse::<LightKind>().unwrap(), LightKind::Ambient);
        assert!(matches!(
            "sun".parse::<LightKind>(),
            Err(ViewportError::UnsupportedLight(_))
        ));
    }

    #[test]
    fn test_grid_nodes_are_not_pickable() {
        let mut node = SceneNode::new("grid", NodeKind::Grid, vec![]);
        assert!(!node.pickable());

        node.kind = NodeKind::Mesh;
        assert!(node.pickable());

        node.visible = false;
        assert!(!node.pickable());
    }

    #[test]
    fn test_model_matrix_translates() {
        let mut node = SceneNode::new(
            "cube",
            NodeKind::Mesh,
            vec![Mesh::from_geometry(&generate_cube(100.0))],
        );
        node.position = Vector3::new(10.0, 20.0, 30.0);

        let m = node.model_matrix();
        assert_eq!(m.w.x, 10.0);
        assert_eq!(m.w.y, 20.0);
        assert_eq!(m.w.z, 30.0);
    }
}
