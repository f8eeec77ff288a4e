//! Mouse ray picking
//!
//! Converts normalized device coordinates into a world-space ray by
//! inverting the camera's view-projection matrix, then tests the ray
//! against each node's transformed bounding box. The nearest hit wins.

use cgmath::{ElementWise, InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4, Zero};

use crate::gfx::{
    camera::{camera_utils::Camera, orbit_camera::OrbitCamera},
    scene::{NodeId, Scene, SceneNode},
};

/// A world-space ray for intersection testing.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vector3<f32>,
    /// Normalized direction.
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Point along the ray at distance t.
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        if vertices.is_empty() {
            return Self::new(Vector3::zero(), Vector3::zero());
        }

        let mut min = Vector3::new(vertices[0][0], vertices[0][1], vertices[0][2]);
        let mut max = min;

        for vertex in vertices.iter().skip(1) {
            let v = Vector3::new(vertex[0], vertex[1], vertex[2]);
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            min.z = min.z.min(v.z);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
            max.z = max.z.max(v.z);
        }

        Self::new(min, max)
    }

    /// Slab test. Returns the distance to the entry point, or the exit
    /// point when the ray starts inside the box.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t1 = Vector3::new(
            t_min.x.min(t_max.x),
            t_min.y.min(t_max.y),
            t_min.z.min(t_max.z),
        );
        let t2 = Vector3::new(
            t_min.x.max(t_max.x),
            t_min.y.max(t_max.y),
            t_min.z.max(t_max.z),
        );

        let t_near = t1.x.max(t1.y.max(t1.z));
        let t_far = t2.x.min(t2.y.min(t2.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Transforms all 8 corners and rebounds.
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = [
            Vector3::new(self.min.x, self.min.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.min.z),
            Vector3::new(self.min.x, self.max.y, self.min.z),
            Vector3::new(self.min.x, self.min.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.max.z),
            Vector3::new(self.min.x, self.max.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut transformed = Vec::with_capacity(8);
        for corner in &corners {
            let h = matrix * Vector4::new(corner.x, corner.y, corner.z, 1.0);
            transformed.push([h.x / h.w, h.y / h.w, h.z / h.w]);
        }

        Self::from_vertices(&transformed)
    }
}

/// Result of a pick query.
#[derive(Debug, Clone, Copy)]
pub struct PickHit {
    pub node: NodeId,
    /// Distance from the ray origin to the hit.
    pub distance: f32,
    /// World-space intersection point.
    pub point: Vector3<f32>,
}

/// Casts rays from normalized mouse coordinates into the scene.
#[derive(Default)]
pub struct ScenePicker;

impl ScenePicker {
    pub fn new() -> Self {
        Self
    }

    /// Unprojects the cursor into a world-space ray.
    ///
    /// `ndc` is the cursor position in normalized device coordinates,
    /// x and y both in [-1, 1] with y up.
    pub fn screen_ray(&self, ndc: (f32, f32), camera: &OrbitCamera) -> Ray {
        let view_proj = camera.build_view_projection_matrix();
        let inv_view_proj = view_proj.invert().unwrap_or_else(Matrix4::identity);

        // Near and far plane in wgpu clip space (z in [0, 1])
        let near = inv_view_proj * Vector4::new(ndc.0, ndc.1, 0.0, 1.0);
        let far = inv_view_proj * Vector4::new(ndc.0, ndc.1, 1.0, 1.0);

        let near = Vector3::new(near.x / near.w, near.y / near.w, near.z / near.w);
        let far = Vector3::new(far.x / far.w, far.y / far.w, far.z / far.w);

        Ray::new(near, far - near)
    }

    /// Returns the nearest pickable node hit by the cursor ray.
    pub fn pick(&self, ndc: (f32, f32), camera: &OrbitCamera, scene: &Scene) -> Option<PickHit> {
        let ray = self.screen_ray(ndc, camera);
        self.pick_with_ray(&ray, scene, |_| true)
    }

    /// Nearest hit among pickable nodes passing the extra filter.
    pub fn pick_with_ray<F>(&self, ray: &Ray, scene: &Scene, filter: F) -> Option<PickHit>
    where
        F: Fn(&SceneNode) -> bool,
    {
        let mut closest: Option<PickHit> = None;

        for node in scene.nodes.iter() {
            if !node.pickable() || !filter(node) {
                continue;
            }

            let local_aabb = Self::node_aabb(node);
            let world_aabb = local_aabb.transform(&node.model_matrix());

            if let Some(distance) = world_aabb.intersect_ray(ray) {
                if closest.map_or(true, |hit| distance < hit.distance) {
                    closest = Some(PickHit {
                        node: node.id,
                        distance,
                        point: ray.point_at(distance),
                    });
                }
            }
        }

        closest
    }

    fn node_aabb(node: &SceneNode) -> Aabb {
        let mut all_vertices = Vec::new();
        for mesh in &node.meshes {
            for vertex in mesh.vertices() {
                all_vertices.push(vertex.position);
            }
        }

        if all_vertices.is_empty() {
            // Meshless nodes (e.g. empty imports) still get a grabbable box
            Aabb::new(
                Vector3::new(-10.0, -10.0, -10.0),
                Vector3::new(10.0, 10.0, 10.0),
            )
        } else {
            Aabb::from_vertices(&all_vertices)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
    use crate::gfx::geometry::{GeometryData, PrimitiveKind};
    use crate::gfx::scene::{Mesh, NodeKind, SceneNode};

    fn test_scene() -> Scene {
        let camera = OrbitCamera::editor_default(1.5);
        let controller = CameraController::new(0.005, 0.1);
        Scene::new(CameraManager::new(camera, controller))
    }

    fn mesh_node(kind: PrimitiveKind, position: Vector3<f32>) -> SceneNode {
        let geometry = GeometryData::for_primitive(kind);
        let mut node = SceneNode::new(
            kind.tag(),
            NodeKind::Mesh,
            vec![Mesh::from_geometry(&geometry)],
        );
        node.position = position;
        node
    }

    #[test]
    fn aabb_bounds_vertices() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [-1.0, -1.0, -1.0]];
        let aabb = Aabb::from_vertices(&vertices);

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn ray_hits_and_misses_aabb() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let hit = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&hit).is_some());

        let miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&miss).is_none());
    }

    #[test]
    fn ray_from_inside_reports_exit() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Vector3::zero(), Vector3::new(0.0, 0.0, 1.0));

        let t = aabb.intersect_ray(&ray).unwrap();
        assert!((t - 1.0).abs() < 1e-5);
    }

    #[test]
    fn transformed_aabb_follows_translation() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));
        let moved = aabb.transform(&Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0)));

        assert!((moved.min.x - 9.0).abs() < 1e-5);
        assert!((moved.max.x - 11.0).abs() < 1e-5);
    }

    #[test]
    fn center_ray_points_at_the_camera_target() {
        let camera = OrbitCamera::editor_default(1.5);
        let picker = ScenePicker::new();

        let ray = picker.screen_ray((0.0, 0.0), &camera);
        let toward_target = (camera.target - camera.eye).normalize();

        // The ray leaves the near plane heading into the scene, not behind it
        assert!(ray.direction.dot(toward_target) > 0.99);
        assert!((ray.origin - camera.eye).magnitude() < camera.znear * 2.0);
    }

    #[test]
    fn center_ray_picks_origin_cube() {
        let mut scene = test_scene();
        let cube = mesh_node(PrimitiveKind::Cube, Vector3::zero());
        let id = cube.id;
        scene.add_node(cube);

        let picker = ScenePicker::new();
        let hit = picker
            .pick((0.0, 0.0), &scene.camera_manager.camera, &scene)
            .expect("cube under the cursor");
        assert_eq!(hit.node, id);
    }

    #[test]
    fn nearest_of_two_nodes_wins() {
        let mut scene = test_scene();

        // Both cubes sit on the eye-to-origin line; the offset one is closer
        let near = mesh_node(PrimitiveKind::Cube, Vector3::new(150.0, 75.0, 150.0));
        let near_id = near.id;
        scene.add_node(near);

        let far = mesh_node(PrimitiveKind::Cube, Vector3::zero());
        scene.add_node(far);

        let picker = ScenePicker::new();
        let hit = picker
            .pick((0.0, 0.0), &scene.camera_manager.camera, &scene)
            .unwrap();
        assert_eq!(hit.node, near_id);
    }

    #[test]
    fn miss_returns_none() {
        let mut scene = test_scene();
        scene.add_node(mesh_node(PrimitiveKind::Cube, Vector3::zero()));

        let picker = ScenePicker::new();
        // Top-left corner of the frustum is far away from the origin cube
        assert!(picker
            .pick((-0.99, 0.99), &scene.camera_manager.camera, &scene)
            .is_none());
    }

    #[test]
    fn invisible_nodes_are_skipped() {
        let mut scene = test_scene();
        let mut cube = mesh_node(PrimitiveKind::Cube, Vector3::zero());
        cube.visible = false;
        scene.add_node(cube);

        let picker = ScenePicker::new();
        assert!(picker
            .pick((0.0, 0.0), &scene.camera_manager.camera, &scene)
            .is_none());
    }
}
