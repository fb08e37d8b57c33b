use std::iter;

use bytemuck::cast_slice;
use glam::Mat4;
use log::warn;
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, Buffer, BufferUsages, Device,
    Queue,
};

/// Size of the joint matrix array in the shaders.
pub const MAX_JOINTS: usize = 256;

/// Identity padded array of column major matrices, `MAX_JOINTS` long.
fn padded_matrices(items: &[Mat4]) -> Vec<[f32; 16]> {
    items
        .iter()
        .map(|matrix| matrix.to_cols_array())
        .chain(iter::repeat(Mat4::IDENTITY.to_cols_array()))
        .take(MAX_JOINTS)
        .collect()
}

#[derive(Debug)]
pub struct JointsUniformBuffer {
    buffer: Buffer,
    bind_group: BindGroup,
}

impl JointsUniformBuffer {
    pub fn new(device: &Device, layout: &BindGroupLayout, joint_count: usize) -> Self {
        if joint_count > MAX_JOINTS {
            warn!(
                "Skeleton has {} joints, only the first {} are skinned",
                joint_count, MAX_JOINTS
            );
        }
        let buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("Joint Uniform Buffer"),
            contents: cast_slice(&padded_matrices(&[])),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("Joint Bind Group"),
        });
        Self { buffer, bind_group }
    }

    pub fn update(&self, queue: &Queue, items: &[Mat4]) {
        let items = &items[..items.len().min(MAX_JOINTS)];
        let items: Vec<[f32; 16]> = items.iter().map(|matrix| matrix.to_cols_array()).collect();
        queue.write_buffer(&self.buffer, 0, cast_slice(&items));
    }

    pub fn bind_group(&self) -> &BindGroup {
        &self.bind_group
    }
}
