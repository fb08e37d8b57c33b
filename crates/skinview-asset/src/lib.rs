//! Provide asset handling for skinview.
//!
//! This library decodes GLTF documents into plain tables, and builds the
//! CPU side of a skinned model from them: vertex streams for every mesh
//! primitive, a flat bone array, keyframe timelines and the per-frame pose
//! evaluation producing skinning matrices. Nothing in here touches the GPU,
//! the renderer uploads what this crate produces.
//!
pub mod accessor;
pub mod animation;
pub mod document;
/// Model loaders
pub mod loader;
pub mod material;
pub mod mesh;
pub mod model;
pub mod node;
pub mod pose;
pub mod skeleton;
pub mod skin;
pub mod texture;
