use std::collections::HashMap;

use glam::Mat4;

use crate::{
    accessor::{AccessorAsset, BufferViewAsset},
    material::MaterialAsset,
    node::NodeAsset,
    skin::SkinAsset,
    texture::TextureAsset,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// One draw unit of a mesh, as accessor indices.
#[derive(Debug, Clone)]
pub struct PrimitiveAsset {
    pub positions: Option<usize>,
    pub normals: Option<usize>,
    pub tex_coords: Option<usize>,
    pub joints: Option<usize>,
    pub weights: Option<usize>,
    pub indices: Option<usize>,
    pub material: Option<usize>,
    pub mode: PrimitiveMode,
}

#[derive(Debug, Clone, Default)]
pub struct MeshAsset {
    pub name: Option<String>,
    pub primitives: Vec<PrimitiveAsset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationPath {
    Translation,
    Rotation,
    Scale,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnimationInterpolation {
    #[default]
    Linear,
    Step,
    CubicSpline,
}

#[derive(Debug, Clone)]
pub struct AnimationSamplerAsset {
    /// Keyframe times accessor.
    pub input: usize,
    /// Keyframe values accessor.
    pub output: usize,
    pub interpolation: AnimationInterpolation,
}

#[derive(Debug, Clone)]
pub struct AnimationChannelAsset {
    pub target_node: usize,
    pub path: AnimationPath,
    pub sampler: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AnimationAsset {
    pub name: Option<String>,
    pub samplers: Vec<AnimationSamplerAsset>,
    pub channels: Vec<AnimationChannelAsset>,
}

#[derive(Debug, Clone, Default)]
pub struct SceneAsset {
    pub name: Option<String>,
    pub nodes: Vec<usize>,
}

/// Owned scene graph tables of a glTF document. Every cross reference is an
/// index into one of the other tables.
#[derive(Debug, Clone, Default)]
pub struct DocumentAsset {
    pub nodes: Vec<NodeAsset>,
    pub meshes: Vec<MeshAsset>,
    pub accessors: Vec<AccessorAsset>,
    pub buffer_views: Vec<BufferViewAsset>,
    pub buffers: Vec<Vec<u8>>,
    pub materials: Vec<MaterialAsset>,
    /// None when the source image could not be decoded.
    pub textures: Vec<Option<TextureAsset>>,
    pub skins: Vec<SkinAsset>,
    pub animations: Vec<AnimationAsset>,
    pub scenes: Vec<SceneAsset>,
    pub default_scene: Option<usize>,
}

impl DocumentAsset {
    /// Map every child node to the node listing it as a child.
    pub fn parents(&self) -> HashMap<usize, usize> {
        let mut parents = HashMap::new();
        for (index, node) in self.nodes.iter().enumerate() {
            for child in &node.children {
                parents.entry(*child).or_insert(index);
            }
        }
        parents
    }

    /// Root nodes of the default scene, or every parentless node.
    pub fn root_nodes(&self) -> Vec<usize> {
        let scene = self.default_scene.or(if self.scenes.is_empty() {
            None
        } else {
            Some(0)
        });
        if let Some(scene) = scene.and_then(|index| self.scenes.get(index)) {
            return scene.nodes.clone();
        }
        let parents = self.parents();
        (0..self.nodes.len())
            .filter(|index| !parents.contains_key(index))
            .collect()
    }

    /// Rest pose world matrix of a node, walking up the parent chain.
    pub fn global_transform(&self, parents: &HashMap<usize, usize>, node: usize) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(node);
        let mut depth = 0;
        while let Some(index) = current {
            let Some(asset) = self.nodes.get(index) else {
                break;
            };
            matrix = asset.local_matrix() * matrix;
            current = parents.get(&index).copied();
            // Malformed documents can contain cycles
            depth += 1;
            if depth > self.nodes.len() {
                break;
            }
        }
        matrix
    }
}

#[cfg(test)]
mod test {
    use glam::{Mat4, Vec3};

    use crate::node::{DecomposedTransform, NodeAsset, NodeTransform};

    use super::*;

    fn translated(y: f32, children: Vec<usize>) -> NodeAsset {
        NodeAsset {
            children,
            transform: Some(NodeTransform::Decomposed(DecomposedTransform {
                translation: Vec3::new(0.0, y, 0.0),
                ..Default::default()
            })),
            ..Default::default()
        }
    }

    #[test]
    fn test_global_transform_accumulates_parents() {
        let document = DocumentAsset {
            nodes: vec![translated(1.0, vec![1]), translated(2.0, vec![2]), translated(3.0, vec![])],
            ..Default::default()
        };
        let parents = document.parents();
        assert_eq!(parents.get(&2), Some(&1));
        assert_eq!(document.root_nodes(), vec![0]);
        let matrix = document.global_transform(&parents, 2);
        assert_eq!(matrix, Mat4::from_translation(Vec3::new(0.0, 6.0, 0.0)));
    }

    #[test]
    fn test_cyclic_parents_terminate() {
        let document = DocumentAsset {
            nodes: vec![translated(1.0, vec![1]), translated(1.0, vec![0])],
            ..Default::default()
        };
        let parents = document.parents();
        let matrix = document.global_transform(&parents, 0);
        assert!(matrix.is_finite());
    }
}
