use std::path::Path;

use log::{info, warn};

use crate::{
    animation::build_animations,
    document::DocumentAsset,
    loader::gltf::{load_from_path, GltfLoaderError},
    mesh::{build_primitives, PrimitiveData},
    pose::Animator,
    skeleton::Skeleton,
    texture::TextureAsset,
};

/// Everything needed to draw and animate one model, without GPU resources.
#[derive(Debug, Clone, Default)]
pub struct ModelAsset {
    pub primitives: Vec<PrimitiveData>,
    pub textures: Vec<Option<TextureAsset>>,
    pub animator: Animator,
}

impl ModelAsset {
    pub fn from_document(document: &DocumentAsset) -> Self {
        if document.skins.len() > 1 {
            warn!(
                "Document has {} skins, only the first one is animated",
                document.skins.len()
            );
        }
        let skeleton = Skeleton::from_skin(document, 0).unwrap_or_default();
        let animations = if skeleton.is_empty() {
            Vec::new()
        } else {
            build_animations(document, &skeleton)
        };

        let mut primitives = build_primitives(document);
        if skeleton.is_empty() {
            for primitive in primitives.iter_mut().filter(|primitive| primitive.skinned) {
                warn!("Primitive carries joints but the document has no skin");
                primitive.skinned = false;
            }
        }

        info!(
            "Model ready: {} primitives, {} bones, {} animations",
            primitives.len(),
            skeleton.len(),
            animations.len()
        );
        Self {
            primitives,
            textures: document.textures.clone(),
            animator: Animator::new(skeleton, animations),
        }
    }

    pub fn is_animated(&self) -> bool {
        self.animator.is_animated()
    }
}

pub fn load_model(path: impl AsRef<Path>) -> Result<ModelAsset, GltfLoaderError> {
    let document = load_from_path(path)?;
    Ok(ModelAsset::from_document(&document))
}

#[cfg(test)]
mod test {
    use glam::{Mat4, Vec3};

    use crate::loader::gltf::{
        load_from_slice,
        test::{data_uri, f32_bytes, triangle_gltf},
    };

    use super::*;

    /// A triangle skinned to a two joint chain, with one animation sliding the
    /// second joint up over one second and a three second channel targeting a
    /// node outside the skin.
    fn skinned_gltf() -> String {
        let mut buffer = f32_bytes(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        buffer.extend_from_slice(&[0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0]);
        buffer.extend(f32_bytes(&[
            1.0, 0.0, 0.0, 0.0, //
            2.0, 0.0, 0.0, 0.0, //
            1.0, 1.0, 0.0, 0.0,
        ]));
        buffer.extend(f32_bytes(&Mat4::IDENTITY.to_cols_array()));
        buffer.extend(f32_bytes(
            &Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)).to_cols_array(),
        ));
        buffer.extend(f32_bytes(&[0.0, 1.0]));
        buffer.extend(f32_bytes(&[0.0, 1.0, 0.0, 0.0, 3.0, 0.0]));
        buffer.extend(f32_bytes(&[0.0, 3.0]));
        assert_eq!(buffer.len(), 264);

        format!(
            r#"{{
                "asset": {{ "version": "2.0" }},
                "scene": 0,
                "scenes": [{{ "nodes": [0, 1, 3] }}],
                "nodes": [
                    {{ "mesh": 0, "skin": 0 }},
                    {{ "name": "hip", "children": [2] }},
                    {{ "name": "spine", "translation": [0.0, 1.0, 0.0] }},
                    {{ "name": "prop" }}
                ],
                "meshes": [{{
                    "primitives": [{{
                        "attributes": {{ "POSITION": 0, "JOINTS_0": 1, "WEIGHTS_0": 2 }}
                    }}]
                }}],
                "skins": [{{ "joints": [1, 2], "inverseBindMatrices": 3 }}],
                "animations": [{{
                    "name": "rise",
                    "samplers": [
                        {{ "input": 4, "output": 5, "interpolation": "LINEAR" }},
                        {{ "input": 6, "output": 5, "interpolation": "LINEAR" }}
                    ],
                    "channels": [
                        {{ "sampler": 0, "target": {{ "node": 2, "path": "translation" }} }},
                        {{ "sampler": 1, "target": {{ "node": 3, "path": "translation" }} }}
                    ]
                }}],
                "buffers": [{{ "byteLength": 264, "uri": "{}" }}],
                "bufferViews": [
                    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
                    {{ "buffer": 0, "byteOffset": 36, "byteLength": 12 }},
                    {{ "buffer": 0, "byteOffset": 48, "byteLength": 48 }},
                    {{ "buffer": 0, "byteOffset": 96, "byteLength": 128 }},
                    {{ "buffer": 0, "byteOffset": 224, "byteLength": 8 }},
                    {{ "buffer": 0, "byteOffset": 232, "byteLength": 24 }},
                    {{ "buffer": 0, "byteOffset": 256, "byteLength": 8 }}
                ],
                "accessors": [
                    {{
                        "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                        "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
                    }},
                    {{ "bufferView": 1, "componentType": 5121, "count": 3, "type": "VEC4" }},
                    {{ "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC4" }},
                    {{ "bufferView": 3, "componentType": 5126, "count": 2, "type": "MAT4" }},
                    {{
                        "bufferView": 4, "componentType": 5126, "count": 2, "type": "SCALAR",
                        "min": [0.0], "max": [1.0]
                    }},
                    {{ "bufferView": 5, "componentType": 5126, "count": 2, "type": "VEC3" }},
                    {{
                        "bufferView": 6, "componentType": 5126, "count": 2, "type": "SCALAR",
                        "min": [0.0], "max": [3.0]
                    }}
                ]
            }}"#,
            data_uri(&buffer)
        )
    }

    fn skinned_model() -> ModelAsset {
        let document = load_from_slice(skinned_gltf().as_bytes()).unwrap();
        ModelAsset::from_document(&document)
    }

    #[test]
    fn test_skinned_model_tables() {
        let model = skinned_model();
        assert!(model.is_animated());
        assert_eq!(model.primitives.len(), 1);

        let primitive = &model.primitives[0];
        assert!(primitive.skinned);
        assert_eq!(primitive.transform, Mat4::IDENTITY);
        assert_eq!(primitive.vertices[1].joints, [1, 0, 0, 0]);
        assert_eq!(primitive.vertices[2].weights, [0.5, 0.5, 0.0, 0.0]);

        let skeleton = model.animator.skeleton();
        assert_eq!(skeleton.len(), 2);
        assert_eq!(skeleton.bones()[1].parent, Some(0));
        assert_eq!(skeleton.bones()[0].name.as_deref(), Some("hip"));

        let animation = &model.animator.animations()[0];
        assert_eq!(animation.name.as_deref(), Some("rise"));
        // The channel on the prop node is not part of the skin
        assert_eq!(animation.channels.len(), 1);
        assert_eq!(animation.channels[0].bone, 1);
    }

    #[test]
    fn test_loop_period_includes_non_joint_channels() {
        let mut model = skinned_model();
        let animation = &model.animator.animations()[0];
        assert_eq!(animation.samplers.len(), 1);
        assert_eq!(animation.max_time, 3.0);

        // Past the spine keyframes but inside the period, the last value holds
        model.animator.update_animation(2.0);
        let matrix = model.animator.final_bone_matrices()[1];
        assert!(matrix.abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)), 1e-6));
    }

    #[test]
    fn test_bind_pose_skinning_is_identity() {
        let model = skinned_model();
        for matrix in model.animator.final_bone_matrices() {
            assert!(matrix.abs_diff_eq(Mat4::IDENTITY, 1e-6));
        }
    }

    #[test]
    fn test_update_moves_skinning_matrix() {
        let mut model = skinned_model();
        model.animator.update_animation(0.5);
        let matrix = model.animator.final_bone_matrices()[1];
        assert!(matrix.abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)), 1e-6));
    }

    #[test]
    fn test_document_without_skin() {
        let document = load_from_slice(triangle_gltf().as_bytes()).unwrap();
        let mut model = ModelAsset::from_document(&document);
        assert!(!model.is_animated());
        assert_eq!(model.animator.skeleton().len(), 0);
        model.animator.update_animation(0.1);
        assert!(model.animator.final_bone_matrices().is_empty());
        assert_eq!(model.primitives.len(), 1);
        assert!(!model.primitives[0].skinned);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_model("does/not/exist.gltf").is_err());
    }
}
