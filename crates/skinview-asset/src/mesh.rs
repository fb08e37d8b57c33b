use std::{
    collections::HashSet,
    error::Error,
    fmt::{self, Display, Formatter},
};

use glam::Mat4;
use log::warn;

use crate::{
    accessor::{
        accessor, check_dimensions, chunk, read_f32, read_indices, read_joints, read_normalized,
        AccessorError, ElementType,
    },
    document::{DocumentAsset, PrimitiveAsset, PrimitiveMode},
    material::MaterialAsset,
};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub joints: [u32; 4],
    pub weights: [f32; 4],
}

/// A primitive decoded into flat vertex and index arrays.
#[derive(Debug, Clone)]
pub struct PrimitiveData {
    pub name: Option<String>,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: MaterialAsset,
    /// True when the vertices carry joints and weights bound to a skin.
    pub skinned: bool,
    /// Rest placement for unskinned primitives. Identity for skinned ones.
    pub transform: Mat4,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MeshError {
    MissingPositions,
    UnsupportedMode(PrimitiveMode),
    IndexOutOfRange { index: u32, vertex_count: usize },
    Accessor(AccessorError),
}

impl Display for MeshError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::MissingPositions => write!(f, "Primitive has no POSITION attribute"),
            MeshError::UnsupportedMode(mode) => write!(f, "Unsupported primitive mode: {:?}", mode),
            MeshError::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(
                f,
                "Index {} is out of range of {} vertices",
                index, vertex_count
            ),
            MeshError::Accessor(error) => Display::fmt(error, f),
        }
    }
}

impl Error for MeshError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MeshError::Accessor(error) => Some(error),
            _ => None,
        }
    }
}

impl From<AccessorError> for MeshError {
    fn from(value: AccessorError) -> Self {
        MeshError::Accessor(value)
    }
}

/// Rescale weights to sum to one. All-zero weights stay zero.
pub fn normalize_weights(weights: [f32; 4]) -> [f32; 4] {
    let sum: f32 = weights.iter().sum();
    if sum > 0.0 {
        weights.map(|weight| weight / sum)
    } else {
        [0.0; 4]
    }
}

fn read_vec<const N: usize>(
    document: &DocumentAsset,
    index: Option<usize>,
    element_type: ElementType,
    normalized: bool,
) -> Result<Option<Vec<[f32; N]>>, MeshError> {
    let Some(index) = index else {
        return Ok(None);
    };
    let accessor = accessor(document, index)?;
    check_dimensions(accessor, element_type)?;
    let data = if normalized {
        read_normalized(document, accessor)?
    } else {
        read_f32(document, accessor)?
    };
    Ok(Some(chunk(&data)))
}

/// Decode one primitive. The result is placed at the origin; callers set
/// `transform` from the instancing node.
pub fn build_primitive(
    document: &DocumentAsset,
    primitive: &PrimitiveAsset,
) -> Result<PrimitiveData, MeshError> {
    if primitive.mode != PrimitiveMode::Triangles {
        return Err(MeshError::UnsupportedMode(primitive.mode));
    }

    let positions: Vec<[f32; 3]> = read_vec(document, primitive.positions, ElementType::Vec3, false)?
        .ok_or(MeshError::MissingPositions)?;
    let normals: Vec<[f32; 3]> =
        read_vec(document, primitive.normals, ElementType::Vec3, false)?.unwrap_or_default();
    let tex_coords: Vec<[f32; 2]> =
        read_vec(document, primitive.tex_coords, ElementType::Vec2, true)?.unwrap_or_default();
    let weights: Vec<[f32; 4]> =
        read_vec(document, primitive.weights, ElementType::Vec4, true)?.unwrap_or_default();
    let joints = primitive
        .joints
        .map(|index| read_joints(document, accessor(document, index)?))
        .transpose()?
        .unwrap_or_default();
    let skinned = primitive.joints.is_some() && primitive.weights.is_some();

    let vertices: Vec<ModelVertex> = positions
        .into_iter()
        .enumerate()
        .map(|(index, position)| ModelVertex {
            position,
            normal: normals.get(index).copied().unwrap_or_default(),
            tex_coords: tex_coords.get(index).copied().unwrap_or_default(),
            joints: joints.get(index).copied().unwrap_or_default(),
            weights: weights
                .get(index)
                .copied()
                .map(normalize_weights)
                .unwrap_or_default(),
        })
        .collect();

    let indices = match primitive.indices {
        Some(index) => read_indices(document, accessor(document, index)?)?,
        None => (0..vertices.len() as u32).collect(),
    };
    if let Some(&index) = indices.iter().find(|&&index| index as usize >= vertices.len()) {
        return Err(MeshError::IndexOutOfRange {
            index,
            vertex_count: vertices.len(),
        });
    }

    let material = primitive
        .material
        .and_then(|index| document.materials.get(index))
        .cloned()
        .unwrap_or_default();

    Ok(PrimitiveData {
        name: None,
        vertices,
        indices,
        material,
        skinned,
        transform: Mat4::IDENTITY,
    })
}

/// Decode every primitive reachable from the scene roots. Failing primitives
/// are logged and skipped.
pub fn build_primitives(document: &DocumentAsset) -> Vec<PrimitiveData> {
    let parents = document.parents();
    let mut result = Vec::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<usize> = document.root_nodes().into_iter().rev().collect();

    while let Some(node_index) = stack.pop() {
        if !visited.insert(node_index) {
            continue;
        }
        let Some(node) = document.nodes.get(node_index) else {
            warn!("Node #{} not found", node_index);
            continue;
        };
        stack.extend(node.children.iter().rev());

        let Some(mesh_index) = node.mesh else {
            continue;
        };
        let Some(mesh) = document.meshes.get(mesh_index) else {
            warn!("Mesh #{} of node #{} not found", mesh_index, node_index);
            continue;
        };
        for (primitive_index, primitive) in mesh.primitives.iter().enumerate() {
            match build_primitive(document, primitive) {
                Ok(mut data) => {
                    data.name = mesh.name.clone();
                    // The skeleton places skinned vertices
                    if data.skinned && node.skin.is_some() {
                        data.transform = Mat4::IDENTITY;
                    } else {
                        data.skinned = false;
                        data.transform = document.global_transform(&parents, node_index);
                    }
                    result.push(data);
                }
                Err(error) => warn!(
                    "Skipping primitive #{} of mesh #{}: {}",
                    primitive_index, mesh_index, error
                ),
            }
        }
    }
    result
}
