use std::iter;

use camera::Camera;
use depth_texture::DepthTexture;
use glam::{Mat4, Vec3};
use pipeline::{Pipelines, ShaderType};
use shadow::{light_space_matrix, ShadowMap};
use uniform::{
    global::{GlobalUniform, GlobalUniformBuffer},
    joint::JointsUniformBuffer,
};
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingResource, BindingType, BufferBindingType, Color, CommandEncoder,
    CommandEncoderDescriptor, Device, LoadOp, Operations, Queue, RenderPass,
    RenderPassColorAttachment, RenderPassDepthStencilAttachment, RenderPassDescriptor,
    SamplerBindingType, ShaderStages, StoreOp, TextureFormat, TextureSampleType, TextureView,
    TextureViewDimension,
};
use winit::dpi::PhysicalSize;

use crate::config::ViewerConfig;

pub mod camera;
mod depth_texture;
pub mod mesh;
pub mod model;
pub mod pipeline;
pub mod shadow;
pub mod texture;
pub mod uniform;
pub mod vertex;

pub use depth_texture::DEPTH_TEXTURE_FORMAT;

/// Bind group slots of the object pipeline
pub const GLOBAL_GROUP: u32 = 0;
pub const INSTANCE_GROUP: u32 = 1;
pub const MATERIAL_GROUP: u32 = 2;
pub const JOINT_GROUP: u32 = 3;
/// Joint slot of the depth pipeline, which has no material group
pub const DEPTH_JOINT_GROUP: u32 = 2;

fn uniform_layout_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub struct RendererLayouts {
    /// Frame uniform, shadow map and comparison sampler
    pub global: BindGroupLayout,
    /// Frame uniform alone, for the shadow pass
    pub shadow: BindGroupLayout,
    pub instance: BindGroupLayout,
    /// Material uniform, base color texture and sampler
    pub material: BindGroupLayout,
    pub joint: BindGroupLayout,
}

impl RendererLayouts {
    pub fn new(device: &Device) -> Self {
        let global = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            entries: &[
                uniform_layout_entry(0, ShaderStages::VERTEX | ShaderStages::FRAGMENT),
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        multisampled: false,
                        view_dimension: TextureViewDimension::D2,
                        sample_type: TextureSampleType::Depth,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Comparison),
                    count: None,
                },
            ],
            label: Some("Global Bind Group Layout"),
        });
        let shadow = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            entries: &[uniform_layout_entry(0, ShaderStages::VERTEX)],
            label: Some("Shadow Bind Group Layout"),
        });
        let instance = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            entries: &[uniform_layout_entry(0, ShaderStages::VERTEX)],
            label: Some("Instance Bind Group Layout"),
        });
        let material = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            entries: &[
                uniform_layout_entry(0, ShaderStages::FRAGMENT),
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        multisampled: false,
                        view_dimension: TextureViewDimension::D2,
                        sample_type: TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("Material Bind Group Layout"),
        });
        let joint = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            entries: &[uniform_layout_entry(0, ShaderStages::VERTEX)],
            label: Some("Joint Bind Group Layout"),
        });
        Self {
            global,
            shadow,
            instance,
            material,
            joint,
        }
    }
}

/// The color pass of a frame. The egui overlay draws into the same pass.
pub struct OngoingRenderState {
    pub encoder: CommandEncoder,
    pub render_pass: RenderPass<'static>,
}

impl OngoingRenderState {
    pub fn new(mut encoder: CommandEncoder, texture_view: &TextureView, renderer: &Renderer) -> Self {
        let mut render_pass = encoder
            .begin_render_pass(&RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: texture_view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(renderer.clear_color),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: renderer.depth_texture.texture_view(),
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            })
            .forget_lifetime();

        render_pass.set_pipeline(renderer.pipelines.get(ShaderType::Object).render_pipeline());
        render_pass.set_bind_group(GLOBAL_GROUP, &renderer.global_bind_group, &[]);
        render_pass.set_bind_group(JOINT_GROUP, renderer.default_joints.bind_group(), &[]);

        Self {
            encoder,
            render_pass,
        }
    }

    pub fn finish(self, queue: &Queue) {
        drop(self.render_pass);
        queue.submit(iter::once(self.encoder.finish()));
    }
}

pub struct Renderer {
    pub layouts: RendererLayouts,
    pipelines: Pipelines,
    global_buffer: GlobalUniformBuffer,
    global_bind_group: BindGroup,
    shadow_bind_group: BindGroup,
    shadow_map: ShadowMap,
    depth_texture: DepthTexture,
    /// Bound for draws that do not skin
    default_joints: JointsUniformBuffer,
    camera: Camera,
    view_aspect: f32,
    light_direction: Vec3,
    shadow_extent: f32,
    clear_color: Color,
}

impl Renderer {
    pub fn new(
        device: &Device,
        target_texture_format: TextureFormat,
        size: PhysicalSize<u32>,
        config: &ViewerConfig,
    ) -> Self {
        let layouts = RendererLayouts::new(device);
        let pipelines = Pipelines::new(device, &layouts, target_texture_format);

        let global_buffer =
            GlobalUniformBuffer::new(device, GlobalUniform::new(&config.light, &config.fog));
        let shadow_map = ShadowMap::new(device, config.shadow_map_size.max(1));
        let global_bind_group = device.create_bind_group(&BindGroupDescriptor {
            layout: &layouts.global,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: global_buffer.buffer().as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::TextureView(shadow_map.texture_view()),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: BindingResource::Sampler(shadow_map.sampler()),
                },
            ],
            label: Some("Global Bind Group"),
        });
        let shadow_bind_group = device.create_bind_group(&BindGroupDescriptor {
            layout: &layouts.shadow,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: global_buffer.buffer().as_entire_binding(),
            }],
            label: Some("Shadow Bind Group"),
        });
        let default_joints = JointsUniformBuffer::new(device, &layouts.joint, 0);

        let [r, g, b] = config.clear_color.map(f64::from);
        Self {
            pipelines,
            global_buffer,
            global_bind_group,
            shadow_bind_group,
            shadow_map,
            depth_texture: DepthTexture::new(device, (size.width, size.height), "Depth texture"),
            default_joints,
            camera: Camera::from_config(&config.camera),
            view_aspect: size.width as f32 / size.height.max(1) as f32,
            light_direction: Vec3::from_array(config.light.direction),
            shadow_extent: config.light.shadow_extent,
            clear_color: Color { r, g, b, a: 1.0 },
            layouts,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn update_camera(&mut self, func: impl FnOnce(&mut Camera)) {
        func(&mut self.camera);
    }

    pub fn resize(&mut self, device: &Device, size: PhysicalSize<u32>) {
        self.view_aspect = size.width as f32 / size.height.max(1) as f32;
        self.depth_texture = DepthTexture::new(device, (size.width, size.height), "Depth texture");
    }

    /// The shadow volume follows the ground in front of the camera.
    fn shadow_focus(&self) -> Vec3 {
        let eye = self.camera.view.eye;
        let front = self.camera.view.front_ignore_pitch(0.0);
        Vec3::new(eye.x, 0.0, eye.z) + front * self.shadow_extent * 0.5
    }

    pub fn light_space_matrix(&self) -> Mat4 {
        light_space_matrix(self.light_direction, self.shadow_focus(), self.shadow_extent)
    }

    pub fn prepare(&mut self, queue: &Queue) {
        let view_proj = self.camera.matrix(self.view_aspect);
        let light_space = self.light_space_matrix();
        self.global_buffer
            .update_view(view_proj, self.camera.view.eye, light_space);
        self.global_buffer.update(queue);
    }

    pub fn create_encoder(&self, device: &Device) -> CommandEncoder {
        device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        })
    }

    /// Start the depth pass rendering shadow casters into the shadow map.
    pub fn begin_shadow_pass<'e>(&self, encoder: &'e mut CommandEncoder) -> RenderPass<'e> {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: self.shadow_map.texture_view(),
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
        render_pass.set_pipeline(self.pipelines.get(ShaderType::Depth).render_pipeline());
        render_pass.set_bind_group(GLOBAL_GROUP, &self.shadow_bind_group, &[]);
        render_pass.set_bind_group(DEPTH_JOINT_GROUP, self.default_joints.bind_group(), &[]);
        render_pass
    }

    pub fn shadow_map_size(&self) -> u32 {
        self.shadow_map.size()
    }
}
