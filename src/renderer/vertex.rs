use std::mem::size_of;

use bytemuck::{Pod, Zeroable};
use skinview_asset::mesh::ModelVertex;
use wgpu::{vertex_attr_array, BufferAddress, VertexAttribute, VertexBufferLayout, VertexStepMode};

pub trait Vertex: Copy + Clone + Pod + Zeroable {
    const ATTRIBS: &[VertexAttribute];

    fn desc<'a>() -> VertexBufferLayout<'a> {
        VertexBufferLayout {
            array_stride: size_of::<Self>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: Self::ATTRIBS,
        }
    }
}

/// The single vertex layout shared by every object. Static geometry leaves
/// joints and weights at zero.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SkinVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub joint_index: [u32; 4],
    pub joint_weight: [f32; 4],
}

impl Vertex for SkinVertex {
    const ATTRIBS: &[VertexAttribute] = &vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Uint32x4,
        4 => Float32x4
    ];
}

impl From<&ModelVertex> for SkinVertex {
    fn from(value: &ModelVertex) -> Self {
        Self {
            position: value.position,
            normal: value.normal,
            tex_coords: value.tex_coords,
            joint_index: value.joints,
            joint_weight: value.weights,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_skin_vertex_layout() {
        assert_eq!(size_of::<SkinVertex>(), 64);
        let layout = SkinVertex::desc();
        assert_eq!(layout.array_stride, 64);
        let offsets: Vec<_> = layout.attributes.iter().map(|attr| attr.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24, 32, 48]);
    }

    #[test]
    fn test_from_model_vertex() {
        let vertex = SkinVertex::from(&ModelVertex {
            position: [1.0, 2.0, 3.0],
            normal: [0.0, 1.0, 0.0],
            tex_coords: [0.5, 0.25],
            joints: [3, 1, 0, 0],
            weights: [0.75, 0.25, 0.0, 0.0],
        });
        assert_eq!(vertex.joint_index, [3, 1, 0, 0]);
        assert_eq!(vertex.joint_weight, [0.75, 0.25, 0.0, 0.0]);
        assert_eq!(vertex.tex_coords, [0.5, 0.25]);
    }
}
