//! Translation manipulator
//!
//! Three axis handles drawn over the selected object. Each handle is a
//! thin box running from the object's origin along one world axis, drawn
//! unlit in the axis color and picked like any other node. Grabbing a
//! handle constrains dragging to that axis.

use cgmath::Vector3;

use crate::gfx::{
    geometry::generate_box,
    resources::material::Material,
    scene::{Axis, Mesh, NodeId, NodeKind, Scene, SceneNode},
};

pub const X_HANDLE: &str = "x_manipulator";
pub const Y_HANDLE: &str = "y_manipulator";
pub const Z_HANDLE: &str = "z_manipulator";

const HANDLE_LENGTH: f32 = 150.0;
const HANDLE_HALF_THICKNESS: f32 = 4.0;

/// Axis handle nodes tracking the current selection's position.
pub struct Manipulator {
    pub position: Vector3<f32>,
    x_handle: NodeId,
    y_handle: NodeId,
    z_handle: NodeId,
}

impl Manipulator {
    /// Builds the three handle nodes and inserts them into the scene,
    /// hidden until something is selected.
    pub fn new(scene: &mut Scene) -> Self {
        scene
            .material_manager
            .add_material(Material::unlit(X_HANDLE, [1.0, 0.0, 0.0, 1.0]));
        scene
            .material_manager
            .add_material(Material::unlit(Y_HANDLE, [0.0, 1.0, 0.0, 1.0]));
        scene
            .material_manager
            .add_material(Material::unlit(Z_HANDLE, [0.0, 0.0, 1.0, 1.0]));

        let t = HANDLE_HALF_THICKNESS;
        let x_handle = Self::handle_node(
            scene,
            X_HANDLE,
            Axis::X,
            [0.0, -t, -t],
            [HANDLE_LENGTH, t, t],
        );
        let y_handle = Self::handle_node(
            scene,
            Y_HANDLE,
            Axis::Y,
            [-t, 0.0, -t],
            [t, HANDLE_LENGTH, t],
        );
        let z_handle = Self::handle_node(
            scene,
            Z_HANDLE,
            Axis::Z,
            [-t, -t, 0.0],
            [t, t, HANDLE_LENGTH],
        );

        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            x_handle,
            y_handle,
            z_handle,
        }
    }

    fn handle_node(
        scene: &mut Scene,
        name: &str,
        axis: Axis,
        min: [f32; 3],
        max: [f32; 3],
    ) -> NodeId {
        let geometry = generate_box(min, max);
        let mut node = SceneNode::new(
            name,
            NodeKind::Handle(axis),
            vec![Mesh::from_geometry(&geometry)],
        )
        .with_material(name);
        node.visible = false;
        scene.add_node(node)
    }

    /// Axis of a handle node, or None for any other node.
    pub fn axis_of(&self, id: NodeId) -> Option<Axis> {
        if id == self.x_handle {
            Some(Axis::X)
        } else if id == self.y_handle {
            Some(Axis::Y)
        } else if id == self.z_handle {
            Some(Axis::Z)
        } else {
            None
        }
    }

    pub fn is_handle(&self, id: NodeId) -> bool {
        self.axis_of(id).is_some()
    }

    /// Moves the handles to follow a selection.
    pub fn set_position(&mut self, scene: &mut Scene, position: Vector3<f32>) {
        self.position = position;
        for id in [self.x_handle, self.y_handle, self.z_handle] {
            if let Some(node) = scene.node_mut(id) {
                node.position = position;
            }
        }
    }

    /// Shows or hides all three handles.
    pub fn set_visible(&mut self, scene: &mut Scene, visible: bool) {
        for id in [self.x_handle, self.y_handle, self.z_handle] {
            if let Some(node) = scene.node_mut(id) {
                node.visible = visible;
            }
        }
    }

    /// Offsets the manipulator along one world axis.
    pub fn translate_axis(&mut self, scene: &mut Scene, axis: Axis, delta: f32) {
        match axis {
            Axis::X => self.position.x += delta,
            Axis::Y => self.position.y += delta,
            Axis::Z => self.position.z += delta,
        }
        let position = self.position;
        self.set_position(scene, position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};

    fn test_scene() -> Scene {
        let camera = OrbitCamera::editor_default(1.5);
        let controller = CameraController::new(0.005, 0.1);
        Scene::new(CameraManager::new(camera, controller))
    }

    #[test]
    fn handles_start_hidden() {
        let mut scene = test_scene();
        let manipulator = Manipulator::new(&mut scene);

        assert_eq!(scene.node_count(), 3);
        for node in &scene.nodes {
            assert!(!node.visible);
            assert!(manipulator.is_handle(node.id));
            assert!(matches!(node.kind, NodeKind::Handle(_)));
        }
    }

    #[test]
    fn axis_lookup_matches_handle_nodes() {
        let mut scene = test_scene();
        let manipulator = Manipulator::new(&mut scene);

        let axis_by_name = |name: &str| {
            let node = scene.nodes.iter().find(|n| n.name == name).unwrap();
            manipulator.axis_of(node.id).unwrap()
        };

        assert_eq!(axis_by_name(X_HANDLE), Axis::X);
        assert_eq!(axis_by_name(Y_HANDLE), Axis::Y);
        assert_eq!(axis_by_name(Z_HANDLE), Axis::Z);
    }

    #[test]
    fn set_position_moves_all_handles() {
        let mut scene = test_scene();
        let mut manipulator = Manipulator::new(&mut scene);

        let target = Vector3::new(25.0, -10.0, 40.0);
        manipulator.set_position(&mut scene, target);

        assert_eq!(manipulator.position, target);
        for node in &scene.nodes {
            assert_eq!(node.position, target);
        }
    }

    #[test]
    fn translate_axis_only_moves_one_component() {
        let mut scene = test_scene();
        let mut manipulator = Manipulator::new(&mut scene);
        manipulator.set_position(&mut scene, Vector3::new(1.0, 2.0, 3.0));

        manipulator.translate_axis(&mut scene, Axis::Y, 10.0);

        assert_eq!(manipulator.position, Vector3::new(1.0, 12.0, 3.0));
        for node in &scene.nodes {
            assert_eq!(node.position, Vector3::new(1.0, 12.0, 3.0));
        }
    }
}
