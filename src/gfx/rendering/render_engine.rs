//! WGPU-based rendering engine for the editor viewport
//!
//! One forward pass per frame: grid lines first, then solid meshes, then the
//! manipulator handles as a depth-ignoring overlay so they stay grabbable
//! even when buried in geometry.

use std::sync::Arc;

use wgpu::{Device, TextureFormat};

use crate::gfx::{
    camera::camera_utils::CameraUniform,
    resources::{material::Material, texture::DepthTexture},
    scene::{DrawNode, NodeKind, Scene},
};

use super::globals::{GlobalBindings, GlobalUniform};
use super::pipeline_manager::{DepthMode, PipelineConfig, PipelineManager};

/// Background clear color, the editor's neutral mid-gray.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.5,
    g: 0.5,
    b: 0.5,
    a: 1.0,
};

/// Core rendering engine managing GPU resources and draw calls.
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: DepthTexture,
    format: TextureFormat,
    pipeline_manager: PipelineManager,
    global_bindings: GlobalBindings,
}

impl RenderEngine {
    /// Creates a render engine drawing into the given window surface.
    ///
    /// # Panics
    /// Panics if no wgpu adapter or device can be acquired; the viewport
    /// assumes the graphics stack never fails.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> RenderEngine {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .expect("Failed to create surface!");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to request adapter!");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("Failed to request a device!");

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = DepthTexture::create(&device, &config, "depth_texture");
        let global_bindings = GlobalBindings::new(&device);

        // Per-node transform layout; structurally identical to the one each
        // node builds for itself
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
        let material_bind_group_layout = Material::bind_group_layout(&device);

        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("scene", include_str!("scene.wgsl"));

        let shared_layouts = || {
            vec![
                global_bindings.bind_group_layout().clone(),
                transform_bind_group_layout.clone(),
                material_bind_group_layout.clone(),
            ]
        };

        pipeline_manager.create_pipeline(
            "Mesh",
            PipelineConfig::default()
                .with_label("MESH")
                .with_color_format(format)
                .with_bind_group_layouts(shared_layouts()),
        );

        pipeline_manager.create_pipeline(
            "Line",
            PipelineConfig::default()
                .with_label("LINE")
                .with_color_format(format)
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                .with_cull_mode(None)
                .with_bind_group_layouts(shared_layouts()),
        );

        pipeline_manager.create_pipeline(
            "Overlay",
            PipelineConfig::default()
                .with_label("OVERLAY")
                .with_color_format(format)
                .with_cull_mode(None)
                .with_depth_mode(DepthMode::Overlay)
                .with_bind_group_layouts(shared_layouts()),
        );

        RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_bindings,
        }
    }

    /// Updates the frame-global uniforms from the camera and scene lights.
    pub fn update(&mut self, camera_uniform: CameraUniform, scene: &Scene) {
        let uniform = GlobalUniform::build(camera_uniform, &scene.active_lights());
        self.global_bindings.update(&self.queue, uniform);
    }

    /// Draws one frame of the scene.
    pub fn render_frame(&mut self, scene: &Scene) {
        let surface_texture = self
            .surface
            .get_current_texture()
            .expect("Failed to get surface texture!");

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            // Grid lines under everything
            self.draw_kind(&mut render_pass, scene, "Line", |kind| {
                matches!(kind, NodeKind::Grid)
            });

            // Solid meshes
            self.draw_kind(&mut render_pass, scene, "Mesh", |kind| {
                matches!(kind, NodeKind::Mesh)
            });

            // Manipulator handles on top, ignoring depth
            self.draw_kind(&mut render_pass, scene, "Overlay", |kind| {
                matches!(kind, NodeKind::Handle(_))
            });
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    fn draw_kind<'a, F>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        scene: &'a Scene,
        pipeline: &str,
        filter: F,
    ) where
        F: Fn(NodeKind) -> bool,
    {
        let Some(pipeline) = self.pipeline_manager.get_pipeline(pipeline) else {
            return;
        };
        render_pass.set_pipeline(pipeline);

        for node in scene.nodes.iter() {
            if !node.visible || !filter(node.kind) {
                continue;
            }

            let Some(transform_bind_group) = node.transform_bind_group() else {
                continue;
            };
            let material = scene.material_for_node(node);
            let Some(material_bind_group) = material.bind_group() else {
                continue;
            };

            render_pass.set_bind_group(1, transform_bind_group, &[]);
            render_pass.set_bind_group(2, material_bind_group, &[]);
            render_pass.draw_node(node);
        }
    }

    /// Resizes the render surface and recreates the depth buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width.max(1);
        self.config.height = height.max(1);

        self.surface.configure(&self.device, &self.config);
        self.depth_texture = DepthTexture::create(&self.device, &self.config, "depth_texture");
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
