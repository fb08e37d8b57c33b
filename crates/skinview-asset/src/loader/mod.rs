/// glTF 2.0 loader with `gltf` crate.
pub mod gltf;
