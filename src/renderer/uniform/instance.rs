use bytemuck::{cast_slice, Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, Buffer, BufferUsages, Device,
    Queue,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, PartialEq)]
struct InstanceUniform {
    transform: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    use_skinning: u32,
    padding: [u32; 3],
}

impl InstanceUniform {
    fn pad_vec3(vec: Vec3) -> [f32; 4] {
        [vec.x, vec.y, vec.z, 0.0]
    }

    fn new(transform: Mat4, use_skinning: bool) -> Self {
        let normal = Mat3::from_mat4(transform).inverse().transpose();
        Self {
            transform: transform.to_cols_array_2d(),
            normal: [
                Self::pad_vec3(normal.x_axis),
                Self::pad_vec3(normal.y_axis),
                Self::pad_vec3(normal.z_axis),
            ],
            use_skinning: use_skinning as u32,
            padding: [0; 3],
        }
    }
}

/// Model matrix of one draw, with its normal matrix and skinning switch.
#[derive(Debug)]
pub struct InstanceUniformBuffer {
    buffer: Buffer,
    bind_group: BindGroup,
    transform: Mat4,
    use_skinning: bool,
}

impl InstanceUniformBuffer {
    pub fn new(
        device: &Device,
        layout: &BindGroupLayout,
        transform: Mat4,
        use_skinning: bool,
    ) -> Self {
        let buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("Instance Uniform Buffer"),
            contents: cast_slice(&[InstanceUniform::new(transform, use_skinning)]),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("Instance Bind Group"),
        });
        Self {
            buffer,
            bind_group,
            transform,
            use_skinning,
        }
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    pub fn update(&self, queue: &Queue) {
        let uniform = InstanceUniform::new(self.transform, self.use_skinning);
        queue.write_buffer(&self.buffer, 0, cast_slice(&[uniform]));
    }

    pub fn bind_group(&self) -> &BindGroup {
        &self.bind_group
    }
}
