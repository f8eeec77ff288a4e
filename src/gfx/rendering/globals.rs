//! Frame-global GPU bindings: camera and scene lighting.

use cgmath::{InnerSpace, Vector3};
use wgpu::Device;

use crate::gfx::camera::camera_utils::CameraUniform;
use crate::gfx::scene::{Light, LightKind};
use crate::wgpu_utils::uniform_buffer::UniformBuffer;

/// Upper bound on non-ambient lights uploaded per frame.
pub const MAX_LIGHTS: usize = 8;

/// One non-ambient light as the shader sees it.
///
/// `position.w` is the kind (0 point, 1 spot), `color.w` the intensity,
/// `direction.w` the spot cone cosine cutoff.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub direction: [f32; 4],
}

const SPOT_CUTOFF_COS: f32 = 0.866; // 30 degree half-angle

/// Frame-global uniform block: camera plus lighting.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
    /// Accumulated ambient light color.
    pub ambient: [f32; 4],
    /// Active light count in x; y/z/w pad to 16 bytes.
    pub light_count: [u32; 4],
    pub lights: [LightUniform; MAX_LIGHTS],
}

impl GlobalUniform {
    /// Assembles the frame globals from the camera and the scene's lights.
    ///
    /// Ambient lights fold into the ambient term; the rest fill the light
    /// array, truncated at [`MAX_LIGHTS`]. Spot lights aim at the origin.
    pub fn build(camera: CameraUniform, scene_lights: &[(Vector3<f32>, Light)]) -> Self {
        let mut ambient = [0.0f32; 4];
        let mut lights = [LightUniform::default(); MAX_LIGHTS];
        let mut count = 0usize;

        for (position, light) in scene_lights {
            match light.kind {
                LightKind::Ambient => {
                    for i in 0..3 {
                        ambient[i] += light.color[i] * light.intensity;
                    }
                }
                kind => {
                    if count == MAX_LIGHTS {
                        continue;
                    }

                    let direction = if position.magnitude2() > f32::EPSILON {
                        -position.normalize()
                    } else {
                        Vector3::new(0.0, -1.0, 0.0)
                    };

                    lights[count] = LightUniform {
                        position: [
                            position.x,
                            position.y,
                            position.z,
                            if kind == LightKind::Spot { 1.0 } else { 0.0 },
                        ],
                        color: [light.color[0], light.color[1], light.color[2], light.intensity],
                        direction: [direction.x, direction.y, direction.z, SPOT_CUTOFF_COS],
                    };
                    count += 1;
                }
            }
        }

        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            ambient,
            light_count: [count as u32, 0, 0, 0],
            lights,
        }
    }
}

/// Bind group 0: the frame-global uniform block.
pub struct GlobalBindings {
    ubo: UniformBuffer<GlobalUniform>,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &Device) -> Self {
        let ubo = UniformBuffer::new(device);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Global Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.binding_resource(),
            }],
        });

        Self {
            ubo,
            bind_group_layout,
            bind_group,
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, uniform: GlobalUniform) {
        self.ubo.update_content(queue, uniform);
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambient_lights_fold_into_ambient_term() {
        let mut ambient = Light::new(LightKind::Ambient);
        ambient.color = [0.2, 0.3, 0.4];

        let uniform = GlobalUniform::build(
            CameraUniform::default(),
            &[(Vector3::new(0.0, 0.0, 0.0), ambient)],
        );

        assert_eq!(uniform.light_count[0], 0);
        assert_eq!(uniform.ambient[0], 0.2);
        assert_eq!(uniform.ambient[2], 0.4);
    }

    #[test]
    fn test_light_array_truncates_at_max() {
        let lights: Vec<_> = (0..MAX_LIGHTS + 3)
            .map(|i| (Vector3::new(i as f32, 0.0, 0.0), Light::new(LightKind::Point)))
            .collect();

        let uniform = GlobalUniform::build(CameraUniform::default(), &lights);
        assert_eq!(uniform.light_count[0], MAX_LIGHTS as u32);
    }

    #[test]
    fn test_spot_lights_aim_at_origin() {
        let spot = Light::new(LightKind::Spot);
        let uniform = GlobalUniform::build(
            CameraUniform::default(),
            &[(Vector3::new(100.0, 0.0, 0.0), spot)],
        );

        assert_eq!(uniform.lights[0].position[3], 1.0);
        assert!((uniform.lights[0].direction[0] + 1.0).abs() < 1e-6);
    }
}
