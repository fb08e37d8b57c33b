use bytemuck::{cast_slice, Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    Buffer, BufferUsages, Device, Queue,
};

use crate::config::{FogConfig, LightConfig};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, Default, PartialEq)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub light_space: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub ambient: f32,
    pub light_direction: [f32; 3],
    pub fog_start: f32,
    pub light_color: [f32; 3],
    pub fog_end: f32,
    pub fog_color: [f32; 3],
    padding: f32,
}

impl GlobalUniform {
    pub fn new(light: &LightConfig, fog: &FogConfig) -> Self {
        let direction = Vec3::from_array(light.direction)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Y);
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            light_space: Mat4::IDENTITY.to_cols_array_2d(),
            camera_position: [0.0; 3],
            ambient: light.ambient.clamp(0.0, 1.0),
            light_direction: direction.to_array(),
            fog_start: fog.start,
            light_color: light.color,
            // Keep the fog ramp from dividing by zero
            fog_end: fog.end.max(fog.start + 0.001),
            fog_color: fog.color,
            padding: 0.0,
        }
    }
}

/// Camera, light and fog parameters shared by every draw of a frame.
pub struct GlobalUniformBuffer {
    buffer: Buffer,
    pub uniform: GlobalUniform,
}

impl GlobalUniformBuffer {
    pub fn new(device: &Device, uniform: GlobalUniform) -> Self {
        let buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("Global Uniform Buffer"),
            contents: cast_slice(&[uniform]),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        Self { buffer, uniform }
    }

    pub fn update_view(&mut self, view_proj: Mat4, camera_position: Vec3, light_space: Mat4) {
        self.uniform.view_proj = view_proj.to_cols_array_2d();
        self.uniform.camera_position = camera_position.to_array();
        self.uniform.light_space = light_space.to_cols_array_2d();
    }

    pub fn update(&self, queue: &Queue) {
        queue.write_buffer(&self.buffer, 0, cast_slice(&[self.uniform]));
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }
}

#[cfg(test)]
mod test {
    use std::mem::size_of;

    use super::*;

    #[test]
    fn test_layout_matches_shader() {
        assert_eq!(size_of::<GlobalUniform>(), 192);
    }

    #[test]
    fn test_degenerate_config_is_sanitized() {
        let uniform = GlobalUniform::new(
            &LightConfig {
                direction: [0.0; 3],
                ambient: 4.0,
                ..Default::default()
            },
            &FogConfig {
                color: [0.5; 3],
                start: 100.0,
                end: 50.0,
            },
        );
        assert_eq!(uniform.light_direction, [0.0, -1.0, 0.0]);
        assert_eq!(uniform.ambient, 1.0);
        assert!(uniform.fog_end > uniform.fog_start);
    }
}
