use std::collections::HashMap;

use glam::Mat4;
use log::warn;

use crate::{
    accessor::{accessor, check_dimensions, chunk_mat4, read_f32, AccessorError, ElementType},
    document::DocumentAsset,
    node::DecomposedTransform,
};

#[derive(Debug, Clone)]
pub struct Bone {
    pub name: Option<String>,
    /// Node index in the source document.
    pub node: usize,
    pub parent: Option<usize>,
    pub inverse_bind_matrix: Mat4,
    pub rest: DecomposedTransform,
    /// World transform of the non-joint ancestors of a root bone. Identity
    /// for bones with a parent.
    pub root_transform: Mat4,
}

impl Bone {
    pub fn new(node: usize, parent: Option<usize>) -> Self {
        Self {
            name: None,
            node,
            parent,
            inverse_bind_matrix: Mat4::IDENTITY,
            rest: DecomposedTransform::default(),
            root_transform: Mat4::IDENTITY,
        }
    }
}

/// Flat bone array in skin joint order, parents referenced by index.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    node_to_bone: HashMap<usize, usize>,
    evaluation_order: Vec<usize>,
}

impl Skeleton {
    pub fn new(mut bones: Vec<Bone>) -> Self {
        for index in 0..bones.len() {
            if bones[index].parent.is_some_and(|parent| parent >= bones.len()) {
                warn!("Bone #{} has an invalid parent, treating it as root", index);
                bones[index].parent = None;
            }
        }
        let node_to_bone = bones
            .iter()
            .enumerate()
            .map(|(index, bone)| (bone.node, index))
            .collect();
        let evaluation_order = Self::sort_parent_first(&mut bones);
        Self {
            bones,
            node_to_bone,
            evaluation_order,
        }
    }

    /// Order bones parent-before-child. Bones caught in a parent cycle are
    /// detached from their parent.
    fn sort_parent_first(bones: &mut [Bone]) -> Vec<usize> {
        let mut children = vec![Vec::new(); bones.len()];
        for (index, bone) in bones.iter().enumerate() {
            if let Some(parent) = bone.parent {
                children[parent].push(index);
            }
        }

        let mut order = Vec::with_capacity(bones.len());
        let mut visited = vec![false; bones.len()];
        let mut roots: Vec<usize> = (0..bones.len())
            .filter(|index| bones[*index].parent.is_none())
            .collect();
        loop {
            for root in roots.drain(..) {
                let mut stack = vec![root];
                while let Some(index) = stack.pop() {
                    if visited[index] {
                        continue;
                    }
                    visited[index] = true;
                    order.push(index);
                    stack.extend(children[index].iter().rev());
                }
            }
            let Some(index) = visited.iter().position(|visited| !visited) else {
                break;
            };
            warn!("Bone #{} is part of a parent cycle, treating it as root", index);
            bones[index].parent = None;
            roots.push(index);
        }
        order
    }

    /// Build the skeleton of a skin. Parent links only follow nodes that are
    /// joints of the same skin.
    pub fn from_skin(document: &DocumentAsset, skin_index: usize) -> Option<Self> {
        let skin = document.skins.get(skin_index)?;
        let parents = document.parents();
        let joint_bones: HashMap<usize, usize> = skin
            .joints
            .iter()
            .enumerate()
            .map(|(index, node)| (*node, index))
            .collect();

        let inverse_bind_matrices = match skin
            .inverse_bind_matrices
            .map(|index| Self::read_inverse_bind_matrices(document, index))
            .transpose()
        {
            Ok(matrices) => matrices.unwrap_or_default(),
            Err(error) => {
                warn!("Bad inverse bind matrices of skin #{}: {}", skin_index, error);
                Vec::new()
            }
        };
        if skin.inverse_bind_matrices.is_some() && inverse_bind_matrices.len() < skin.joints.len() {
            warn!(
                "Skin #{} has {} inverse bind matrices for {} joints, padding with identity",
                skin_index,
                inverse_bind_matrices.len(),
                skin.joints.len()
            );
        }

        let bones = skin
            .joints
            .iter()
            .enumerate()
            .map(|(index, &node)| {
                let parent_node = parents.get(&node).copied();
                let parent = parent_node.and_then(|parent| joint_bones.get(&parent).copied());
                let root_transform = match (parent, parent_node) {
                    (None, Some(parent_node)) => document.global_transform(&parents, parent_node),
                    _ => Mat4::IDENTITY,
                };
                let asset = document.nodes.get(node);
                Bone {
                    name: asset.and_then(|asset| asset.name.clone()),
                    node,
                    parent,
                    inverse_bind_matrix: inverse_bind_matrices
                        .get(index)
                        .copied()
                        .unwrap_or(Mat4::IDENTITY),
                    rest: asset.map(|asset| asset.rest_pose()).unwrap_or_default(),
                    root_transform,
                }
            })
            .collect();
        Some(Self::new(bones))
    }

    fn read_inverse_bind_matrices(
        document: &DocumentAsset,
        index: usize,
    ) -> Result<Vec<Mat4>, AccessorError> {
        let accessor = accessor(document, index)?;
        check_dimensions(accessor, ElementType::Mat4)?;
        Ok(chunk_mat4(&read_f32(document, accessor)?))
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bone_index(&self, node: usize) -> Option<usize> {
        self.node_to_bone.get(&node).copied()
    }

    /// Bone indices with every parent ahead of its children.
    pub fn evaluation_order(&self) -> &[usize] {
        &self.evaluation_order
    }
}

#[cfg(test)]
mod test {
    use glam::Vec3;

    use crate::{
        node::{NodeAsset, NodeTransform},
        skin::SkinAsset,
    };

    use super::*;

    fn node(children: Vec<usize>, translation: Vec3) -> NodeAsset {
        NodeAsset {
            name: None,
            children,
            mesh: None,
            skin: None,
            transform: Some(NodeTransform::Decomposed(DecomposedTransform {
                translation,
                ..Default::default()
            })),
        }
    }

    #[test]
    fn test_parents_resolved_through_node_ids() {
        // Node 0 is an armature above the joints, joints are nodes 3 and 1
        let document = DocumentAsset {
            nodes: vec![
                node(vec![3], Vec3::new(0.0, 0.0, 5.0)),
                node(vec![], Vec3::new(0.0, 1.0, 0.0)),
                node(vec![], Vec3::ZERO),
                node(vec![1], Vec3::ZERO),
            ],
            skins: vec![SkinAsset {
                joints: vec![3, 1],
                ..Default::default()
            }],
            ..Default::default()
        };
        let skeleton = Skeleton::from_skin(&document, 0).unwrap();
        assert_eq!(skeleton.len(), 2);
        assert_eq!(skeleton.bone_index(3), Some(0));
        assert_eq!(skeleton.bone_index(1), Some(1));
        assert_eq!(skeleton.bone_index(2), None);

        let bones = skeleton.bones();
        assert_eq!(bones[0].parent, None);
        assert_eq!(bones[1].parent, Some(0));
        assert_eq!(bones[1].rest.translation, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(bones[0].inverse_bind_matrix, Mat4::IDENTITY);
        assert_eq!(
            bones[0].root_transform,
            Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0))
        );
        assert_eq!(bones[1].root_transform, Mat4::IDENTITY);
    }

    #[test]
    fn test_child_listed_before_parent() {
        let skeleton = Skeleton::new(vec![Bone::new(10, Some(2)), Bone::new(11, None), Bone::new(12, Some(1))]);
        let order = skeleton.evaluation_order();
        let position = |bone: usize| order.iter().position(|item| *item == bone).unwrap();
        assert_eq!(order.len(), 3);
        assert!(position(1) < position(2));
        assert!(position(2) < position(0));
    }

    #[test]
    fn test_parent_cycle_is_broken() {
        let skeleton = Skeleton::new(vec![Bone::new(0, Some(1)), Bone::new(1, Some(0))]);
        assert_eq!(skeleton.evaluation_order().len(), 2);
        let roots = skeleton
            .bones()
            .iter()
            .filter(|bone| bone.parent.is_none())
            .count();
        assert_eq!(roots, 1);
        assert_eq!(skeleton.evaluation_order()[0], 0);
    }

    #[test]
    fn test_missing_skin() {
        assert!(Skeleton::from_skin(&DocumentAsset::default(), 0).is_none());
    }
}
