use bytemuck::{cast_slice, Pod, Zeroable};
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindingResource, Buffer,
    BufferUsages, Device,
};

use crate::renderer::texture::TextureItem;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct MaterialUniform {
    base_color: [f32; 4],
}

/// Base color factor and texture of one primitive. The color multiplies the
/// texture, untextured materials bind a white texture.
#[derive(Debug)]
pub struct MaterialBinding {
    _buffer: Buffer,
    bind_group: BindGroup,
}

impl MaterialBinding {
    pub fn new(
        device: &Device,
        layout: &BindGroupLayout,
        base_color: [f32; 4],
        texture: &TextureItem,
        label: Option<&str>,
    ) -> Self {
        let buffer = device.create_buffer_init(&BufferInitDescriptor {
            label,
            contents: cast_slice(&[MaterialUniform { base_color }]),
            usage: BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::TextureView(texture.texture_view()),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: BindingResource::Sampler(texture.sampler()),
                },
            ],
            label,
        });
        Self {
            _buffer: buffer,
            bind_group,
        }
    }

    pub fn bind_group(&self) -> &BindGroup {
        &self.bind_group
    }
}
