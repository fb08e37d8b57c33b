use bytemuck::cast_slice;
use skinview_asset::mesh::PrimitiveData;
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    Buffer, BufferUsages, Device, IndexFormat, RenderPass,
};

use super::vertex::SkinVertex;

/// Vertex and 32-bit index buffers of one primitive.
#[derive(Debug)]
pub struct MeshBuffers {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
}

impl MeshBuffers {
    pub fn new(device: &Device, primitive: &PrimitiveData, label: Option<&str>) -> Self {
        let vertices: Vec<SkinVertex> = primitive.vertices.iter().map(SkinVertex::from).collect();
        let vertex_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label,
            contents: cast_slice(&vertices),
            usage: BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label,
            contents: cast_slice(&primitive.indices),
            usage: BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: primitive.indices.len() as u32,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn bind(&self, render_pass: &mut RenderPass) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), IndexFormat::Uint32);
    }

    pub fn draw(&self, render_pass: &mut RenderPass) {
        self.bind(render_pass);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
