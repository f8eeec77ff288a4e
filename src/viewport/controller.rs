//! Viewport controller
//!
//! Owns the scene, the selection state, and the manipulator, and turns
//! pointer input plus bus requests into scene edits. Everything here is
//! GPU-free so the whole interaction model runs headless under test.

use std::f32::consts::FRAC_PI_2;

use cgmath::Vector3;
use log::{debug, info};

use crate::error::ViewportError;
use crate::events::{EditorEvent, EventBus, SceneRequest};
use crate::gfx::{
    camera::{CameraController, CameraManager, OrbitCamera},
    geometry::{generate_grid, generate_sphere, GeometryData, PrimitiveKind},
    resources::material::Material,
    scene::{Axis, Light, LightKind, Mesh, NodeId, NodeKind, Scene, SceneNode},
};

use super::manipulator::Manipulator;
use super::picking::ScenePicker;

/// Normalized mouse deltas are scaled by this much to get world units.
const DRAG_SCALE: f32 = 1000.0;

/// Where new light rigs are spawned, up and to the side so they are not
/// buried inside whatever sits at the origin.
const LIGHT_SPAWN: Vector3<f32> = Vector3::new(100.0, 150.0, 0.0);

const GRID_EXTENT: f32 = 500.0;
const GRID_STEP: f32 = 50.0;

const GRID_MATERIAL: &str = "grid";

/// Shared unlit material for the light rig markers.
const LIGHT_RIG_MATERIAL: &str = "light_rig";
const LIGHT_RIG_RADIUS: f32 = 10.0;

#[derive(Debug, Clone, Copy)]
pub struct ViewportOptions {
    /// Draw the ground grid and the manipulator handles.
    pub grid: bool,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self { grid: true }
    }
}

/// Scene editing state machine behind the viewport window.
///
/// Selection survives empty clicks and pointer release; only deleting the
/// selected object clears it. While an axis handle is engaged the camera's
/// orbit rotation is suspended so dragging does not also tumble the view.
pub struct ViewportController {
    pub scene: Scene,
    pub bus: EventBus,
    picker: ScenePicker,
    manipulator: Option<Manipulator>,
    selected: Option<NodeId>,
    engaged_axis: Option<Axis>,
    mouse: (f32, f32),
    prev_mouse: (f32, f32),
}

impl ViewportController {
    /// Builds the controller with the default scene: grid, manipulator,
    /// one cube, and one point light, with the cube selected.
    pub fn new(options: ViewportOptions, aspect: f32) -> Self {
        let camera = OrbitCamera::editor_default(aspect);
        let camera_controller = CameraController::new(0.005, 0.1);
        let mut scene = Scene::new(CameraManager::new(camera, camera_controller));

        if options.grid {
            scene
                .material_manager
                .add_material(Material::unlit(GRID_MATERIAL, [0.35, 0.35, 0.35, 1.0]));
            let grid = SceneNode::new(
                GRID_MATERIAL,
                NodeKind::Grid,
                vec![Mesh::from_geometry(&generate_grid(GRID_EXTENT, GRID_STEP))],
            )
            .with_material(GRID_MATERIAL);
            scene.add_node(grid);
        }

        let manipulator = options.grid.then(|| Manipulator::new(&mut scene));

        let mut controller = Self {
            scene,
            bus: EventBus::new(),
            picker: ScenePicker::new(),
            manipulator,
            selected: None,
            engaged_axis: None,
            mouse: (0.0, 0.0),
            prev_mouse: (0.0, 0.0),
        };

        controller.setup_default_scene();
        controller
    }

    /// One cube and one point light, just like Blender.
    fn setup_default_scene(&mut self) {
        let cube = self.add_primitive(PrimitiveKind::Cube);
        self.add_light(LightKind::Point);

        // Initial selection is implicit: the editor chrome has not asked
        // for anything yet, so nothing is published.
        self.selected = Some(cube);
        self.update_manipulator();
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn engaged_axis(&self) -> Option<Axis> {
        self.engaged_axis
    }

    // -------------------------------------------------------------------
    // Object factories
    // -------------------------------------------------------------------

    /// Fabricates a primitive at the origin and inserts it into the scene.
    pub fn add_primitive(&mut self, kind: PrimitiveKind) -> NodeId {
        let geometry = GeometryData::for_primitive(kind);
        let mut node = SceneNode::new(
            kind.tag(),
            NodeKind::Mesh,
            vec![Mesh::from_geometry(&geometry)],
        );
        node.name = format!("{}.{}", kind.tag(), node.id);

        // Flat shapes are generated facing +Z and laid down onto the grid
        if kind.lies_flat() {
            node.rotation.x = -FRAC_PI_2;
        }

        let material = Material::new(&node.name, [1.0, 1.0, 1.0, 1.0]);
        self.scene.material_manager.add_material(material);
        node.material = Some(node.name.clone());

        info!("viewport: add primitive {}", node.name);
        self.scene.add_node(node)
    }

    /// Registers a light and inserts its rig node at the spawn offset.
    ///
    /// All cached material programs are invalidated so every surface picks
    /// up the new light on the next frame.
    pub fn add_light(&mut self, kind: LightKind) -> NodeId {
        let light_id = self.scene.add_light(Light::new(kind));

        if self
            .scene
            .material_manager
            .get_material(LIGHT_RIG_MATERIAL)
            .is_none()
        {
            self.scene
                .material_manager
                .add_material(Material::unlit(LIGHT_RIG_MATERIAL, [1.0, 0.95, 0.6, 1.0]));
        }

        // Small glowing sphere so the rig can be seen and aimed at
        let marker = Mesh::from_geometry(&generate_sphere(LIGHT_RIG_RADIUS, 8, 8));
        let mut rig = SceneNode::new(kind.tag(), NodeKind::Mesh, vec![marker])
            .with_material(LIGHT_RIG_MATERIAL);
        rig.name = format!("{}.{}", kind.tag(), rig.id);
        rig.light = Some(light_id);
        rig.position = LIGHT_SPAWN;

        info!("viewport: add light {}", rig.name);
        let id = self.scene.add_node(rig);
        self.reset_materials();
        id
    }

    /// Inserts an externally loaded node and selects it.
    pub fn add_model(&mut self, node: SceneNode) -> NodeId {
        let id = self.scene.add_node(node);
        self.select(id);
        id
    }

    /// Loads an OBJ file and inserts the result as the new selection.
    pub fn load_model(&mut self, path: &str) -> Result<NodeId, ViewportError> {
        let node = self.scene.load_model(path)?;
        Ok(self.add_model(node))
    }

    /// Drops every cached material program; they are rebuilt during the
    /// next frame's upload pass. Safe to call repeatedly.
    pub fn reset_materials(&mut self) {
        self.scene.material_manager.invalidate_all_programs();
    }

    // -------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------

    /// Makes the node the current selection, snaps the manipulator onto it,
    /// and announces it, as a light or a mesh depending on the node's light
    /// marker.
    pub fn select(&mut self, id: NodeId) {
        self.selected = Some(id);

        let is_light = self.scene.node(id).is_some_and(|n| n.is_light());
        if is_light {
            self.bus.publish(EditorEvent::LightSelected(id));
        } else {
            self.bus.publish(EditorEvent::MeshSelected(id));
        }

        self.update_manipulator();
    }

    /// Removes the selected node (and its light, if any) from the scene.
    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected.take() else {
            return;
        };

        if let Some(node) = self.scene.remove_node(id) {
            info!("viewport: removed {}", node.name);
        }
        if let Some(manipulator) = self.manipulator.as_mut() {
            manipulator.set_visible(&mut self.scene, false);
        }
        self.bus.publish(EditorEvent::ObjectRemoved);
    }

    /// Snaps the manipulator onto the selected node.
    fn update_manipulator(&mut self) {
        let Some(position) = self
            .selected
            .and_then(|id| self.scene.node(id))
            .map(|node| node.position)
        else {
            return;
        };

        if let Some(manipulator) = self.manipulator.as_mut() {
            manipulator.set_position(&mut self.scene, position);
            manipulator.set_visible(&mut self.scene, true);
        }
    }

    // -------------------------------------------------------------------
    // Pointer input
    // -------------------------------------------------------------------

    /// Casts a pick ray from the current cursor position.
    ///
    /// Hitting an axis handle engages that axis for dragging and suspends
    /// camera rotation. Hitting anything else selects it. Hitting nothing
    /// leaves the selection alone.
    pub fn pointer_down(&mut self) {
        let hit = self
            .picker
            .pick(self.mouse, &self.scene.camera_manager.camera, &self.scene);

        let Some(hit) = hit else {
            return;
        };

        let hit_axis = self
            .manipulator
            .as_ref()
            .and_then(|m| m.axis_of(hit.node));

        match hit_axis {
            Some(axis) if self.engaged_axis != Some(axis) => {
                debug!("viewport: engaged {axis:?} handle");
                self.scene
                    .camera_manager
                    .controller
                    .set_rotation_enabled(false);
                self.engaged_axis = Some(axis);
            }
            _ => {
                self.select(hit.node);
            }
        }
    }

    /// Tracks the cursor and, while an axis is engaged, drags the selected
    /// node along it.
    ///
    /// Cursor deltas in normalized device coordinates are scaled straight
    /// into world units. The z axis reuses the vertical delta, negated, so
    /// pushing the cursor up moves the object away from the viewer.
    pub fn pointer_move(&mut self, ndc: (f32, f32)) {
        self.prev_mouse = self.mouse;
        self.mouse = ndc;

        let (Some(axis), Some(selected)) = (self.engaged_axis, self.selected) else {
            return;
        };

        let tx = (self.mouse.0 - self.prev_mouse.0) * DRAG_SCALE;
        let ty = (self.mouse.1 - self.prev_mouse.1) * DRAG_SCALE;

        let delta = match axis {
            Axis::X => tx,
            Axis::Y => ty,
            Axis::Z => -ty,
        };

        if let Some(manipulator) = self.manipulator.as_mut() {
            manipulator.translate_axis(&mut self.scene, axis, delta);
            let position = manipulator.position;
            if let Some(node) = self.scene.node_mut(selected) {
                node.position = position;
            }
        }
    }

    /// Ends any axis drag and restores camera rotation. The selection is
    /// untouched.
    pub fn pointer_up(&mut self) {
        self.scene
            .camera_manager
            .controller
            .set_rotation_enabled(true);
        self.engaged_axis = None;
    }

    // -------------------------------------------------------------------
    // Bus and frame plumbing
    // -------------------------------------------------------------------

    pub fn handle_request(&mut self, request: SceneRequest) {
        match request {
            SceneRequest::AddPrimitive(kind) => {
                self.add_primitive(kind);
            }
            SceneRequest::AddLight(kind) => {
                self.add_light(kind);
            }
            SceneRequest::ModelLoaded(node) => {
                self.add_model(*node);
            }
        }
    }

    /// Drains and applies all pending bus requests, in submission order.
    pub fn process_requests(&mut self) {
        for request in self.bus.drain_requests() {
            self.handle_request(request);
        }
    }

    /// Updates the camera projection after a window resize.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.scene
            .camera_manager
            .camera
            .resize_projection(width, height);
    }

    /// Per-frame tick: camera damping and view matrix refresh.
    pub fn update(&mut self) {
        self.scene.camera_manager.update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::camera_utils::Camera;
    use cgmath::{InnerSpace, Vector4};

    fn controller() -> ViewportController {
        ViewportController::new(ViewportOptions::default(), 1.5)
    }

    /// Projects a world point to normalized device coordinates through the
    /// controller's own camera, so clicks land exactly where intended.
    fn ndc_of(c: &ViewportController, point: Vector3<f32>) -> (f32, f32) {
        let view_proj = c.scene.camera_manager.camera.build_view_projection_matrix();
        let h = view_proj * Vector4::new(point.x, point.y, point.z, 1.0);
        (h.x / h.w, h.y / h.w)
    }

    fn click(c: &mut ViewportController, point: Vector3<f32>) {
        let ndc = ndc_of(c, point);
        c.pointer_move(ndc);
        c.pointer_down();
    }

    fn find_node(c: &ViewportController, prefix: &str) -> NodeId {
        c.scene
            .nodes
            .iter()
            .find(|n| n.name.starts_with(prefix))
            .map(|n| n.id)
            .unwrap()
    }

    #[test]
    fn default_scene_has_cube_light_grid_and_handles() {
        let c = controller();

        // grid + 3 handles + cube + light rig
        assert_eq!(c.scene.node_count(), 6);
        assert_eq!(c.scene.light_count(), 1);

        let cube = find_node(&c, "cube.");
        assert_eq!(c.selected(), Some(cube));

        // Bootstrap selection is silent
        assert_eq!(c.bus.pending_events(), 0);
    }

    #[test]
    fn default_camera_looks_from_the_editor_corner() {
        let c = controller();
        let eye = c.scene.camera_manager.camera.eye;
        assert!((eye - Vector3::new(300.0, 150.0, 300.0)).magnitude() < 1.0);
    }

    #[test]
    fn every_primitive_kind_inserts_exactly_one_node() {
        let mut c = controller();

        for kind in PrimitiveKind::ALL {
            let before = c.scene.node_count();
            let id = c.add_primitive(kind);
            assert_eq!(c.scene.node_count(), before + 1);
            assert!(c.scene.node(id).unwrap().name.contains(kind.tag()));
        }
    }

    #[test]
    fn reset_materials_is_idempotent() {
        let mut c = controller();

        let programs = |c: &ViewportController| -> Vec<bool> {
            c.scene
                .material_manager
                .list_materials()
                .iter()
                .map(|&id| c.scene.material_manager.get_material(id).unwrap().has_program())
                .collect()
        };

        c.reset_materials();
        let after_once = programs(&c);

        c.reset_materials();
        let after_twice = programs(&c);

        assert_eq!(after_once, after_twice);
        assert!(after_twice.iter().all(|&p| !p));
    }

    #[test]
    fn primitives_are_named_by_kind_and_id() {
        let mut c = controller();
        let id = c.add_primitive(PrimitiveKind::Sphere);
        let node = c.scene.node(id).unwrap();
        assert_eq!(node.name, format!("sphere.{}", id));
        assert_eq!(node.rotation, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn flat_primitives_are_rotated_onto_the_grid() {
        let mut c = controller();
        for kind in [PrimitiveKind::Plane, PrimitiveKind::Torus] {
            let id = c.add_primitive(kind);
            let node = c.scene.node(id).unwrap();
            assert!((node.rotation.x + FRAC_PI_2).abs() < 1e-6);
        }
    }

    #[test]
    fn lights_spawn_offset_from_the_origin() {
        let mut c = controller();
        let id = c.add_light(LightKind::Spot);
        let rig = c.scene.node(id).unwrap();
        assert_eq!(rig.position, Vector3::new(100.0, 150.0, 0.0));
        assert!(rig.is_light());
        assert_eq!(c.scene.light_count(), 2);
    }

    #[test]
    fn light_rigs_carry_a_visible_marker_mesh() {
        let mut c = controller();
        let id = c.add_light(LightKind::Point);
        let rig = c.scene.node(id).unwrap();

        assert!(!rig.meshes.is_empty());
        assert_eq!(rig.material.as_deref(), Some(LIGHT_RIG_MATERIAL));
        assert!(c
            .scene
            .material_manager
            .get_material(LIGHT_RIG_MATERIAL)
            .is_some_and(|m| m.unlit));
    }

    #[test]
    fn select_snaps_the_manipulator_onto_the_node() {
        let mut c = controller();
        let rig = find_node(&c, "point.");

        c.select(rig);

        let manipulator = c.manipulator.as_ref().unwrap();
        assert_eq!(manipulator.position, Vector3::new(100.0, 150.0, 0.0));
    }

    #[test]
    fn clicking_a_mesh_selects_and_publishes() {
        let mut c = controller();
        c.bus.drain_events();

        click(&mut c, Vector3::new(0.0, 0.0, 0.0));

        let cube = find_node(&c, "cube.");
        assert_eq!(c.selected(), Some(cube));
        assert_eq!(c.bus.drain_events(), vec![EditorEvent::MeshSelected(cube)]);
    }

    #[test]
    fn clicking_a_light_rig_publishes_light_selected() {
        let mut c = controller();
        c.bus.drain_events();

        click(&mut c, Vector3::new(100.0, 150.0, 0.0));

        let rig = find_node(&c, "point.");
        assert_eq!(c.selected(), Some(rig));
        assert_eq!(c.bus.drain_events(), vec![EditorEvent::LightSelected(rig)]);
    }

    #[test]
    fn clicking_empty_space_keeps_the_selection() {
        let mut c = controller();
        let cube = c.selected().unwrap();
        c.bus.drain_events();

        c.pointer_move((-0.95, 0.95));
        c.pointer_down();

        assert_eq!(c.selected(), Some(cube));
        assert_eq!(c.bus.pending_events(), 0);
    }

    #[test]
    fn clicking_a_handle_engages_its_axis() {
        let mut c = controller();

        // Midpoint of the x handle protruding from the selected cube
        click(&mut c, Vector3::new(100.0, 0.0, 0.0));

        assert_eq!(c.engaged_axis(), Some(Axis::X));
        assert!(!c.scene.camera_manager.controller.rotation_enabled());
        // Engaging a handle is not a selection change
        assert_eq!(c.selected(), Some(find_node(&c, "cube.")));
    }

    #[test]
    fn dragging_the_x_handle_moves_the_selection_in_x() {
        let mut c = controller();
        let cube = c.selected().unwrap();

        let ndc = ndc_of(&c, Vector3::new(100.0, 0.0, 0.0));
        c.pointer_move(ndc);
        c.pointer_down();
        assert_eq!(c.engaged_axis(), Some(Axis::X));

        c.pointer_move((ndc.0 + 0.05, ndc.1));

        let position = c.scene.node(cube).unwrap().position;
        assert!((position.x - 50.0).abs() < 1e-3);
        assert_eq!(position.y, 0.0);
        assert_eq!(position.z, 0.0);
    }

    #[test]
    fn dragging_the_z_handle_uses_the_negated_vertical_delta() {
        let mut c = controller();
        let cube = c.selected().unwrap();

        let ndc = ndc_of(&c, Vector3::new(0.0, 0.0, 100.0));
        c.pointer_move(ndc);
        c.pointer_down();
        assert_eq!(c.engaged_axis(), Some(Axis::Z));

        // Cursor down by 0.02 pushes the object 20 units toward +z
        c.pointer_move((ndc.0, ndc.1 - 0.02));

        let position = c.scene.node(cube).unwrap().position;
        assert!((position.z - 20.0).abs() < 1e-3);
    }

    #[test]
    fn handles_follow_the_dragged_selection() {
        let mut c = controller();

        let ndc = ndc_of(&c, Vector3::new(0.0, 100.0, 0.0));
        c.pointer_move(ndc);
        c.pointer_down();
        assert_eq!(c.engaged_axis(), Some(Axis::Y));

        c.pointer_move((ndc.0, ndc.1 + 0.03));

        let manipulator = c.manipulator.as_ref().unwrap();
        assert!((manipulator.position.y - 30.0).abs() < 1e-3);
    }

    #[test]
    fn pointer_up_ends_the_drag_but_not_the_selection() {
        let mut c = controller();
        let cube = c.selected().unwrap();

        click(&mut c, Vector3::new(100.0, 0.0, 0.0));
        assert_eq!(c.engaged_axis(), Some(Axis::X));

        c.pointer_up();

        assert_eq!(c.engaged_axis(), None);
        assert!(c.scene.camera_manager.controller.rotation_enabled());
        assert_eq!(c.selected(), Some(cube));

        // Further motion no longer drags
        let before = c.scene.node(cube).unwrap().position;
        c.pointer_move((0.5, 0.5));
        assert_eq!(c.scene.node(cube).unwrap().position, before);
    }

    #[test]
    fn deleting_the_selection_removes_node_and_light() {
        let mut c = controller();
        c.bus.drain_events();

        let rig = find_node(&c, "point.");
        c.select(rig);
        c.bus.drain_events();

        c.delete_selected();

        assert_eq!(c.selected(), None);
        assert!(c.scene.node(rig).is_none());
        assert_eq!(c.scene.light_count(), 0);
        assert_eq!(c.bus.drain_events(), vec![EditorEvent::ObjectRemoved]);
    }

    #[test]
    fn delete_with_nothing_selected_is_a_no_op() {
        let mut c = controller();
        c.delete_selected();
        assert_eq!(c.bus.drain_events(), vec![EditorEvent::ObjectRemoved]);

        let count = c.scene.node_count();
        c.delete_selected();
        assert_eq!(c.scene.node_count(), count);
        assert_eq!(c.bus.pending_events(), 0);
    }

    #[test]
    fn bus_requests_are_applied_in_order() {
        let mut c = controller();
        let before = c.scene.node_count();

        c.bus.submit(SceneRequest::AddPrimitive(PrimitiveKind::Torus));
        c.bus.submit(SceneRequest::AddLight(LightKind::Ambient));
        c.process_requests();

        assert_eq!(c.scene.node_count(), before + 2);
        assert_eq!(c.scene.light_count(), 2);
    }

    #[test]
    fn loaded_models_are_selected_on_insert() {
        let mut c = controller();
        c.bus.drain_events();

        let node = SceneNode::new("import.obj", NodeKind::Mesh, vec![]);
        let id = node.id;
        c.bus.submit(SceneRequest::ModelLoaded(Box::new(node)));
        c.process_requests();

        assert_eq!(c.selected(), Some(id));
        assert_eq!(c.bus.drain_events(), vec![EditorEvent::MeshSelected(id)]);
    }

    #[test]
    fn resize_updates_the_camera_aspect() {
        let mut c = controller();
        c.set_size(1000, 500);
        assert!((c.scene.camera_manager.camera.aspect - 2.0).abs() < 1e-6);
    }

    #[test]
    fn grid_can_be_disabled() {
        let c = ViewportController::new(ViewportOptions { grid: false }, 1.5);

        // cube + light rig only
        assert_eq!(c.scene.node_count(), 2);
        assert!(c.manipulator.is_none());
    }
}
