use std::collections::HashMap;

use cgmath::Vector3;
use log::{debug, warn};
use wgpu::Device;

use crate::error::ViewportError;
use crate::gfx::{
    camera::camera_utils::CameraManager,
    resources::material::{Material, MaterialManager},
};

use super::node::{Light, LightId, Mesh, NodeId, NodeKind, SceneNode};

/// Main scene: an ordered collection of nodes plus the light table, camera,
/// and material storage. The viewport controller appends and removes nodes;
/// the renderer only reads.
pub struct Scene {
    pub camera_manager: CameraManager,
    pub nodes: Vec<SceneNode>,
    pub material_manager: MaterialManager,
    lights: HashMap<LightId, Light>,
    next_light_id: u32,
}

impl Scene {
    pub fn new(camera_manager: CameraManager) -> Self {
        Self {
            camera_manager,
            nodes: Vec::new(),
            material_manager: MaterialManager::new(),
            lights: HashMap::new(),
            next_light_id: 1,
        }
    }

    /// Appends a node, returning its id.
    pub fn add_node(&mut self, node: SceneNode) -> NodeId {
        let id = node.id;
        debug!("scene: add node {} ({})", node.name, id);
        self.nodes.push(node);
        id
    }

    /// Removes a node and, if it carries a light marker, the attached light.
    pub fn remove_node(&mut self, id: NodeId) -> Option<SceneNode> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(index);

        if let Some(light_id) = node.light {
            self.lights.remove(&light_id);
        }

        debug!("scene: removed node {} ({})", node.name, id);
        Some(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Registers a light in the light table.
    pub fn add_light(&mut self, light: Light) -> LightId {
        let id = LightId(self.next_light_id);
        self.next_light_id += 1;
        self.lights.insert(id, light);
        id
    }

    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.get(&id)
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Lights paired with the world position of the rig node carrying them.
    pub fn active_lights(&self) -> Vec<(Vector3<f32>, Light)> {
        self.nodes
            .iter()
            .filter_map(|node| {
                let light_id = node.light?;
                let light = self.lights.get(&light_id)?;
                Some((node.position, *light))
            })
            .collect()
    }

    /// Loads a 3D model from an OBJ file with material extraction.
    ///
    /// Returns the assembled node without inserting it; the viewport's
    /// model-loaded path decides insertion and selection.
    pub fn load_model(&mut self, object_path: &str) -> Result<SceneNode, ViewportError> {
        let (models, materials) = tobj::load_obj(
            object_path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )?;

        let materials = materials.unwrap_or_else(|_| {
            warn!("no MTL file found for {object_path}, using default materials");
            Vec::new()
        });

        for (i, mtl) in materials.iter().enumerate() {
            let material_name = if mtl.name.is_empty() {
                format!("material_{i}")
            } else {
                mtl.name.clone()
            };

            if self.material_manager.get_material(&material_name).is_some() {
                continue;
            }

            let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
            let material = Material::new(
                &material_name,
                [
                    diffuse[0],
                    diffuse[1],
                    diffuse[2],
                    mtl.dissolve.unwrap_or(1.0),
                ],
            );
            self.material_manager.add_material(material);
        }

        let mut meshes = Vec::new();
        for m in models.iter() {
            let mesh = &m.mesh;

            // Use normals from the OBJ if present, otherwise derive them
            let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len()
            {
                mesh.normals.clone()
            } else {
                Mesh::calculate_face_normals(&mesh.positions, &mesh.indices)
            };

            meshes.push(Mesh::from_arrays(
                &mesh.positions,
                &normals,
                mesh.indices.clone(),
            ));
        }

        let mut node = SceneNode::new("model", NodeKind::Mesh, meshes);

        if let Some(first_model) = models.first() {
            if !first_model.name.is_empty() {
                node.name = format!("{}.{}", first_model.name, node.id);
            } else {
                node.name = format!("model.{}", node.id);
            }

            if let Some(material_id) = first_model.mesh.material_id {
                if material_id < materials.len() {
                    let material_name = if materials[material_id].name.is_empty() {
                        format!("material_{material_id}")
                    } else {
                        materials[material_id].name.clone()
                    };
                    node.material = Some(material_name);
                }
            }
        }

        Ok(node)
    }

    /// Creates GPU resources for any node or material that lacks them.
    ///
    /// Called every frame before drawing, so newly fabricated nodes and
    /// invalidated material programs get (re)built on the next tick.
    pub fn init_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        for node in self.nodes.iter_mut() {
            node.init_gpu_resources(device);
        }
        self.material_manager.update_all_gpu_resources(device, queue);
    }

    /// Syncs all node transforms to the GPU.
    pub fn update_all_transforms(&self, queue: &wgpu::Queue) {
        for node in &self.nodes {
            node.update_transform(queue);
        }
    }

    pub fn material_for_node(&self, node: &SceneNode) -> &Material {
        self.material_manager
            .get_material_for_node(node.material.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
    use crate::gfx::scene::node::LightKind;

    fn test_scene() -> Scene {
        let camera = OrbitCamera::editor_default(1.5);
        let controller = CameraController::new(0.005, 0.1);
        Scene::new(CameraManager::new(camera, controller))
    }

    #[test]
    fn test_remove_node_drops_attached_light() {
        let mut scene = test_scene();

        let light_id = scene.add_light(Light::new(LightKind::Point));
        let mut rig = SceneNode::new("point.1", NodeKind::Mesh, vec![]);
        rig.light = Some(light_id);
        let rig_id = scene.add_node(rig);

        assert_eq!(scene.light_count(), 1);
        let removed = scene.remove_node(rig_id).unwrap();
        assert_eq!(removed.id, rig_id);
        assert_eq!(scene.node_count(), 0);
        assert_eq!(scene.light_count(), 0);
    }

    #[test]
    fn test_active_lights_follow_rig_position() {
        let mut scene = test_scene();

        let light_id = scene.add_light(Light::new(LightKind::Spot));
        let mut rig = SceneNode::new("spot.1", NodeKind::Mesh, vec![]);
        rig.light = Some(light_id);
        rig.position = Vector3::new(100.0, 150.0, 0.0);
        scene.add_node(rig);

        let lights = scene.active_lights();
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].0, Vector3::new(100.0, 150.0, 0.0));
        assert_eq!(lights[0].1.kind, LightKind::Spot);
    }

    #[test]
    fn test_remove_missing_node_is_a_no_op() {
        let mut scene = test_scene();
        let id = scene.add_node(SceneNode::new("cube.1", NodeKind::Mesh, vec![]));
        assert!(scene.remove_node(id).is_some());
        assert!(scene.remove_node(id).is_none());
    }
}
