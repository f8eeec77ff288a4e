//! Material system for the viewport
//!
//! Phong-style materials stored centrally in [`MaterialManager`]; nodes
//! reference them by id. Each material caches a compiled GPU program (uniform
//! buffer plus bind group). Adding a light changes per-pixel lighting inputs
//! the renderer cannot detect on its own, so the viewport invalidates these
//! cached programs and they are rebuilt on the next upload pass.

use std::collections::HashMap;

use wgpu::Device;

use crate::wgpu_utils::uniform_buffer::UniformBuffer;

/// Material ID for referencing materials
pub type MaterialId = String;

/// GPU uniform data for materials
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    /// Ambient reflectance in xyz, shininess in w.
    pub ambient: [f32; 4],
    /// Emissive color in xyz; w flags unlit rendering (grid, handles).
    pub emissive: [f32; 4],
}

type MaterialUbo = UniformBuffer<MaterialUniform>;

/// The cached GPU side of a material.
///
/// Dropped wholesale by [`Material::invalidate_program`] and rebuilt on the
/// next `update_gpu_resources` call.
pub struct MaterialProgram {
    ubo: MaterialUbo,
    bind_group: wgpu::BindGroup,
}

/// Material definition with Phong-style properties.
pub struct Material {
    pub name: String,
    pub color: [f32; 4],
    pub ambient: [f32; 3],
    pub emissive: [f32; 3],
    pub shininess: f32,
    /// Rendered without lighting when set (grid lines, axis handles).
    pub unlit: bool,

    program: Option<MaterialProgram>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            color: [0.8, 0.8, 0.8, 1.0],
            ambient: [0.8, 0.8, 0.8],
            emissive: [0.0, 0.0, 0.0],
            shininess: 30.0,
            unlit: false,
            program: None,
        }
    }
}

impl Material {
    /// Creates a new material whose ambient reflectance matches its color,
    /// the way every fabricated primitive starts out.
    pub fn new(name: &str, color: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            color,
            ambient: [color[0], color[1], color[2]],
            ..Default::default()
        }
    }

    /// Flat-shaded variant used for the grid and the manipulator handles.
    pub fn unlit(name: &str, color: [f32; 4]) -> Self {
        Self {
            unlit: true,
            ..Self::new(name, color)
        }
    }

    /// Drops the cached GPU program so it is recompiled with current lighting
    /// inputs on the next upload pass. Safe to call repeatedly.
    pub fn invalidate_program(&mut self) {
        self.program = None;
    }

    /// Whether a compiled GPU program is currently cached.
    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            color: self.color,
            ambient: [self.ambient[0], self.ambient[1], self.ambient[2], self.shininess],
            emissive: [
                self.emissive[0],
                self.emissive[1],
                self.emissive[2],
                if self.unlit { 1.0 } else { 0.0 },
            ],
        }
    }

    /// Rebuilds the cached program if missing and syncs uniform data.
    pub fn update_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        if self.program.is_none() {
            let ubo = MaterialUbo::new(device);
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Material Bind Group"),
                layout: &Self::bind_group_layout(device),
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.binding_resource(),
                }],
            });
            self.program = Some(MaterialProgram { ubo, bind_group });
        }

        let uniform = self.uniform();
        if let Some(program) = &mut self.program {
            program.ubo.update_content(queue, uniform);
        }
    }

    /// Bind group for rendering, if the program has been built.
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.program.as_ref().map(|p| &p.bind_group)
    }

    /// Layout shared by all materials; fragment-stage uniform at binding 0.
    pub fn bind_group_layout(device: &Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        })
    }
}

/// Centralized material storage; objects reference materials by id so GPU
/// resources are shared between nodes using the same material.
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    default_material_id: MaterialId,
}

impl MaterialManager {
    pub fn new() -> Self {
        let mut manager = Self {
            materials: HashMap::new(),
            default_material_id: "default".to_string(),
        };
        manager.materials.insert("default".to_string(), Material::default());
        manager
    }

    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn get_material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn get_material_mut(&mut self, id: &str) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    pub fn get_default_material(&self) -> &Material {
        self.materials.get(&self.default_material_id).unwrap()
    }

    /// Material lookup with fallback to the default material.
    pub fn get_material_for_node(&self, material_id: Option<&MaterialId>) -> &Material {
        match material_id {
            Some(id) => self
                .get_material(id)
                .unwrap_or_else(|| self.get_default_material()),
            None => self.get_default_material(),
        }
    }

    /// Drops the cached GPU program of every material so the next frame's
    /// upload pass rebuilds them all.
    pub fn invalidate_all_programs(&mut self) {
        for material in self.materials.values_mut() {
            material.invalidate_program();
        }
    }

    pub fn list_materials(&self) -> Vec<&MaterialId> {
        self.materials.keys().collect()
    }

    /// Rebuilds any invalidated programs and syncs uniform data for all
    /// materials. Called once per frame before drawing.
    pub fn update_all_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        for material in self.materials.values_mut() {
            material.update_gpu_resources(device, queue);
        }
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_material_ambient_matches_color() {
        let material = Material::new("white", [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(material.ambient, [1.0, 1.0, 1.0]);
        assert!(!material.unlit);
        assert!(!material.has_program());
    }

    #[test]
    fn test_invalidate_program_is_idempotent() {
        let mut material = Material::new("white", [1.0, 1.0, 1.0, 1.0]);
        material.invalidate_program();
        let after_once = material.has_program();
        material.invalidate_program();
        assert_eq!(material.has_program(), after_once);
        assert!(!material.has_program());
    }

    #[test]
    fn test_manager_falls_back_to_default() {
        let manager = MaterialManager::new();
        let missing = "nope".to_string();
        assert_eq!(
            manager.get_material_for_node(Some(&missing)).name,
            "default"
        );
        assert_eq!(manager.get_material_for_node(None).name, "default");
    }
}
