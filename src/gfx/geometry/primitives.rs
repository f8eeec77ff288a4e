//! # Primitive Shape Generation
//!
//! Generates the editor's primitive shapes with outward normals, using the
//! y-up world convention: cylinders and cones stand on the ground, planes and
//! tori come out facing +Z and are laid flat by the factory rotation.

use std::f32::consts::PI;

use super::GeometryData;

/// Generate an axis-aligned box between `min` and `max`.
///
/// Each face gets four dedicated vertices so the normals stay hard-edged.
pub fn generate_box(min: [f32; 3], max: [f32; 3]) -> GeometryData {
    let mut data = GeometryData::new();
    let [x0, y0, z0] = min;
    let [x1, y1, z1] = max;

    let positions = [
        // Front face (+Z)
        [x0, y0, z1], [x1, y0, z1], [x1, y1, z1], [x0, y1, z1],
        // Back face (-Z)
        [x0, y0, z0], [x0, y1, z0], [x1, y1, z0], [x1, y0, z0],
        // Left face (-X)
        [x0, y0, z0], [x0, y0, z1], [x0, y1, z1], [x0, y1, z0],
        // Right face (+X)
        [x1, y0, z1], [x1, y0, z0], [x1, y1, z0], [x1, y1, z1],
        // Top face (+Y)
        [x0, y1, z1], [x1, y1, z1], [x1, y1, z0], [x0, y1, z0],
        // Bottom face (-Y)
        [x0, y0, z0], [x1, y0, z0], [x1, y0, z1], [x0, y0, z1],
    ];

    let face_normals = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
    ];

    data.vertices = positions.to_vec();
    for normal in face_normals {
        for _ in 0..4 {
            data.normals.push(normal);
        }
    }

    // Two counter-clockwise triangles per face
    for face in 0u32..6 {
        let base = face * 4;
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

/// Generate a cube of the given edge length centered at the origin.
pub fn generate_cube(size: f32) -> GeometryData {
    let h = size * 0.5;
    generate_box([-h, -h, -h], [h, h, h])
}

/// Generate a UV sphere centered at the origin.
///
/// # Arguments
/// * `radius` - Sphere radius
/// * `longitude_segments` - Vertical segments (longitude lines)
/// * `latitude_segments` - Horizontal segments (latitude lines)
pub fn generate_sphere(radius: f32, longitude_segments: u32, latitude_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32; // 0 to PI
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32; // 0 to 2*PI

            // Spherical to Cartesian, y-up
            let x = sin_theta * phi.cos();
            let y = cos_theta;
            let z = sin_theta * phi.sin();

            data.vertices.push([x * radius, y * radius, z * radius]);
            data.normals.push([x, y, z]);
        }
    }

    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * (long_segs + 1) + long;
            let second = first + long_segs + 1;

            data.indices.push(first);
            data.indices.push(second);
            data.indices.push(first + 1);

            data.indices.push(second);
            data.indices.push(second + 1);
            data.indices.push(first + 1);
        }
    }

    data
}

/// Generate a plane in the XY plane, facing +Z.
///
/// The factory rotates it -90 degrees about X so it lies on the ground.
pub fn generate_plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let h_segs = height_segments.max(1);

    for y in 0..=h_segs {
        let v = y as f32 / h_segs as f32;
        let pos_y = (v - 0.5) * height;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.vertices.push([pos_x, pos_y, 0.0]);
            data.normals.push([0.0, 0.0, 1.0]);
        }
    }

    for y in 0..h_segs {
        for x in 0..w_segs {
            let i = y * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.push(i);
            data.indices.push(next_row);
            data.indices.push(i + 1);

            data.indices.push(next_row);
            data.indices.push(next_row + 1);
            data.indices.push(i + 1);
        }
    }

    data
}

/// Generate a cylinder (or cone, with `radius_top` zero) along the Y axis.
///
/// Extends from -height/2 to height/2. Caps are only emitted for non-zero
/// radii.
pub fn generate_cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let segs = segments.max(3);
    let half_height = height * 0.5;
    let slope = (radius_bottom - radius_top) / height;

    // Side vertices, bottom and top ring interleaved
    for i in 0..=segs {
        let angle = i as f32 * 2.0 * PI / segs as f32;
        let cos_a = angle.cos();
        let sin_a = angle.sin();

        let normal_len = (1.0 + slope * slope).sqrt();
        let normal = [cos_a / normal_len, slope / normal_len, sin_a / normal_len];

        data.vertices
            .push([radius_bottom * cos_a, -half_height, radius_bottom * sin_a]);
        data.normals.push(normal);

        data.vertices
            .push([radius_top * cos_a, half_height, radius_top * sin_a]);
        data.normals.push(normal);
    }

    for i in 0..segs {
        let bottom_current = i * 2;
        let top_current = bottom_current + 1;
        let bottom_next = (i + 1) * 2;
        let top_next = bottom_next + 1;

        data.indices.push(bottom_current);
        data.indices.push(top_current);
        data.indices.push(bottom_next);

        data.indices.push(top_current);
        data.indices.push(top_next);
        data.indices.push(bottom_next);
    }

    // Caps
    for (radius, y, normal_y) in [
        (radius_bottom, -half_height, -1.0f32),
        (radius_top, half_height, 1.0),
    ] {
        if radius <= 0.0 {
            continue;
        }

        let center = data.vertices.len() as u32;
        data.vertices.push([0.0, y, 0.0]);
        data.normals.push([0.0, normal_y, 0.0]);

        let ring = data.vertices.len() as u32;
        for i in 0..=segs {
            let angle = i as f32 * 2.0 * PI / segs as f32;
            data.vertices
                .push([radius * angle.cos(), y, radius * angle.sin()]);
            data.normals.push([0.0, normal_y, 0.0]);
        }

        for i in 0..segs {
            if normal_y < 0.0 {
                data.indices
                    .extend_from_slice(&[center, ring + i, ring + i + 1]);
            } else {
                data.indices
                    .extend_from_slice(&[center, ring + i + 1, ring + i]);
            }
        }
    }

    data
}

/// Generate a torus in the XY plane, facing +Z.
///
/// # Arguments
/// * `radius` - Distance from torus center to tube center
/// * `tube` - Tube radius
/// * `radial_segments` - Segments around the tube cross-section
/// * `tubular_segments` - Segments around the main ring
pub fn generate_torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let radial = radial_segments.max(3);
    let tubular = tubular_segments.max(3);

    for j in 0..=radial {
        let v = j as f32 * 2.0 * PI / radial as f32;

        for i in 0..=tubular {
            let u = i as f32 * 2.0 * PI / tubular as f32;

            let cx = radius * u.cos();
            let cy = radius * u.sin();

            let x = (radius + tube * v.cos()) * u.cos();
            let y = (radius + tube * v.cos()) * u.sin();
            let z = tube * v.sin();

            data.vertices.push([x, y, z]);

            let len = ((x - cx).powi(2) + (y - cy).powi(2) + z.powi(2)).sqrt();
            data.normals.push([(x - cx) / len, (y - cy) / len, z / len]);
        }
    }

    for j in 0..radial {
        for i in 0..tubular {
            let a = j * (tubular + 1) + i;
            let b = (j + 1) * (tubular + 1) + i;

            data.indices.extend_from_slice(&[a, b, a + 1]);
            data.indices.extend_from_slice(&[b, b + 1, a + 1]);
        }
    }

    data
}

/// Generate a ground grid as a line list in the XZ plane.
///
/// # Arguments
/// * `size` - Half-extent of the grid on each axis
/// * `step` - Spacing between grid lines
pub fn generate_grid(size: f32, step: f32) -> GeometryData {
    let mut data = GeometryData::new();

    let mut distance = -size;
    while distance <= size {
        let base = data.vertices.len() as u32;

        // Line parallel to X
        data.vertices.push([-size, 0.0, distance]);
        data.vertices.push([size, 0.0, distance]);
        // Line parallel to Z
        data.vertices.push([distance, 0.0, -size]);
        data.vertices.push([distance, 0.0, size]);

        for _ in 0..4 {
            data.normals.push([0.0, 1.0, 0.0]);
        }

        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 3]);

        distance += step;
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_generation() {
        let cube = generate_cube(100.0);
        assert_eq!(cube.vertices.len(), 24); // 6 faces * 4 vertices
        assert_eq!(cube.indices.len(), 36); // 6 faces * 2 triangles * 3 indices
        assert_eq!(cube.triangle_count(), 12);

        // Edge length respected
        let max_x = cube.vertices.iter().map(|v| v[0]).fold(f32::MIN, f32::max);
        assert_eq!(max_x, 50.0);
    }

    #[test]
    fn test_sphere_generation() {
        let sphere = generate_sphere(100.0, 16, 16);
        assert!(!sphere.vertices.is_empty());
        assert!(!sphere.indices.is_empty());
        assert_eq!(sphere.vertices.len(), sphere.normals.len());

        // Every vertex sits on the radius
        for v in &sphere.vertices {
            let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert!((r - 100.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_cone_has_single_cap() {
        let cone = generate_cylinder(0.0, 50.0, 100.0, 16);
        let cylinder = generate_cylinder(50.0, 50.0, 100.0, 16);
        assert!(cone.vertices.len() < cylinder.vertices.len());
    }

    #[test]
    fn test_plane_generation() {
        let plane = generate_plane(200.0, 200.0, 3, 3);
        assert_eq!(plane.vertices.len(), 16); // 4x4 grid
        assert_eq!(plane.indices.len(), 54); // 9 quads * 2 triangles * 3 indices

        // Generated flat in XY, facing +Z
        for v in &plane.vertices {
            assert_eq!(v[2], 0.0);
        }
    }

    #[test]
    fn test_torus_generation() {
        let torus = generate_torus(100.0, 40.0, 8, 6);
        assert_eq!(torus.vertices.len(), (8 + 1) * (6 + 1));
        assert_eq!(torus.vertices.len(), torus.normals.len());
    }

    #[test]
    fn test_grid_is_line_list() {
        let grid = generate_grid(500.0, 50.0);
        assert_eq!(grid.indices.len() % 2, 0);
        assert!(grid.vertices.iter().all(|v| v[1] == 0.0));
    }
}
