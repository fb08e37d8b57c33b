use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    path::Path,
};

use glam::{Mat4, Quat, Vec3};
use gltf::{
    accessor::{DataType, Dimensions},
    animation::{Interpolation, Property},
    image::Format,
    mesh::Mode,
    scene::Transform,
    texture::{MagFilter, MinFilter, WrappingMode},
    Document, Semantic,
};
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use log::{info, warn};

use crate::{
    accessor::{AccessorAsset, BufferViewAsset, ComponentType, ElementType},
    document::{
        AnimationAsset, AnimationChannelAsset, AnimationInterpolation, AnimationPath,
        AnimationSamplerAsset, DocumentAsset, MeshAsset, PrimitiveAsset, PrimitiveMode,
        SceneAsset,
    },
    material::MaterialAsset,
    node::{DecomposedTransform, NodeAsset, NodeTransform},
    skin::SkinAsset,
    texture::{
        SamplerAsset, TextureAsset, TextureMagFilter, TextureMinFilter, TextureMipmapFilter,
        TextureWrappingMode,
    },
};

#[derive(Debug)]
pub enum GltfLoaderError {
    Gltf(gltf::Error),
    UnsupportedTextureFormat(Format),
    BadImageData(usize),
}

impl Display for GltfLoaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GltfLoaderError::Gltf(error) => Display::fmt(error, f),
            GltfLoaderError::UnsupportedTextureFormat(format) => {
                write!(f, "Unsupported texture format: {:?}", format)
            }
            GltfLoaderError::BadImageData(index) => {
                write!(f, "Pixel data of image #{} does not match its size", index)
            }
        }
    }
}

impl Error for GltfLoaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GltfLoaderError::Gltf(error) => Some(error),
            _ => None,
        }
    }
}

impl From<gltf::Error> for GltfLoaderError {
    fn from(value: gltf::Error) -> Self {
        GltfLoaderError::Gltf(value)
    }
}

type DecodedImage = ((u32, u32), Vec<u8>);

struct GltfDocumentLoader<'a> {
    document: &'a Document,
    images: Vec<Option<DecodedImage>>,
}

impl<'a> GltfDocumentLoader<'a> {
    fn new(document: &'a Document, images: Vec<gltf::image::Data>) -> Self {
        let images = images
            .into_iter()
            .enumerate()
            .map(|(index, image)| match Self::decode_image(index, image) {
                Ok(image) => Some(image),
                Err(error) => {
                    warn!("Skipping image #{}: {}", index, error);
                    None
                }
            })
            .collect();
        Self { document, images }
    }

    fn decode_image(
        index: usize,
        image: gltf::image::Data,
    ) -> Result<DecodedImage, GltfLoaderError> {
        let gltf::image::Data {
            pixels,
            format,
            width,
            height,
        } = image;
        let image = match format {
            Format::R8 => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
            Format::R8G8 => {
                GrayAlphaImage::from_raw(width, height, pixels).map(DynamicImage::ImageLumaA8)
            }
            Format::R8G8B8 => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
            Format::R8G8B8A8 => {
                RgbaImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgba8)
            }
            unsupported => return Err(GltfLoaderError::UnsupportedTextureFormat(unsupported)),
        }
        .ok_or(GltfLoaderError::BadImageData(index))?;
        Ok(((width, height), image.into_rgba8().into_raw()))
    }

    fn load_texture_sampler(sampler: gltf::texture::Sampler) -> SamplerAsset {
        let (min_filter, mipmap_filter) = sampler
            .min_filter()
            .map(|filter| match filter {
                MinFilter::Nearest => (TextureMinFilter::Nearest, TextureMipmapFilter::default()),
                MinFilter::Linear => (TextureMinFilter::Linear, TextureMipmapFilter::default()),
                MinFilter::NearestMipmapNearest => {
                    (TextureMinFilter::Nearest, TextureMipmapFilter::Nearest)
                }
                MinFilter::LinearMipmapNearest => {
                    (TextureMinFilter::Linear, TextureMipmapFilter::Nearest)
                }
                MinFilter::NearestMipmapLinear => {
                    (TextureMinFilter::Nearest, TextureMipmapFilter::Linear)
                }
                MinFilter::LinearMipmapLinear => {
                    (TextureMinFilter::Linear, TextureMipmapFilter::Linear)
                }
            })
            .unwrap_or_default();

        fn wrapping_mode(mode: WrappingMode) -> TextureWrappingMode {
            match mode {
                WrappingMode::ClampToEdge => TextureWrappingMode::ClampToEdge,
                WrappingMode::MirroredRepeat => TextureWrappingMode::MirroredRepeat,
                WrappingMode::Repeat => TextureWrappingMode::Repeat,
            }
        }

        SamplerAsset {
            mag_filter: sampler
                .mag_filter()
                .map(|filter| match filter {
                    MagFilter::Nearest => TextureMagFilter::Nearest,
                    MagFilter::Linear => TextureMagFilter::Linear,
                })
                .unwrap_or_default(),
            min_filter,
            mipmap_filter,
            wrap_x: wrapping_mode(sampler.wrap_s()),
            wrap_y: wrapping_mode(sampler.wrap_t()),
        }
    }

    fn load_texture(&self, texture: gltf::Texture) -> Option<TextureAsset> {
        let image_index = texture.source().index();
        let (size, data) = self.images.get(image_index)?.as_ref()?;
        Some(TextureAsset {
            name: texture.name().map(str::to_string),
            size: *size,
            data: data.clone(),
            sampler: Self::load_texture_sampler(texture.sampler()),
        })
    }

    fn load_material(material: gltf::Material) -> MaterialAsset {
        let pbr = material.pbr_metallic_roughness();
        MaterialAsset {
            name: material.name().map(str::to_string),
            base_color: pbr.base_color_factor(),
            base_color_texture: pbr.base_color_texture().map(|info| info.texture().index()),
        }
    }

    fn load_accessor(accessor: gltf::Accessor) -> AccessorAsset {
        let component_type = match accessor.data_type() {
            DataType::I8 => ComponentType::I8,
            DataType::U8 => ComponentType::U8,
            DataType::I16 => ComponentType::I16,
            DataType::U16 => ComponentType::U16,
            DataType::U32 => ComponentType::U32,
            DataType::F32 => ComponentType::F32,
        };
        let element_type = match accessor.dimensions() {
            Dimensions::Scalar => ElementType::Scalar,
            Dimensions::Vec2 => ElementType::Vec2,
            Dimensions::Vec3 => ElementType::Vec3,
            Dimensions::Vec4 => ElementType::Vec4,
            Dimensions::Mat2 => ElementType::Mat2,
            Dimensions::Mat3 => ElementType::Mat3,
            Dimensions::Mat4 => ElementType::Mat4,
        };
        if accessor.sparse().is_some() {
            warn!(
                "Accessor #{} is sparse, reading its dense base only",
                accessor.index()
            );
        }
        AccessorAsset {
            view: accessor.view().map(|view| view.index()),
            byte_offset: accessor.offset(),
            count: accessor.count(),
            component_type,
            element_type,
            normalized: accessor.normalized(),
        }
    }

    fn load_primitive(primitive: gltf::Primitive) -> PrimitiveAsset {
        let mode = match primitive.mode() {
            Mode::Points => PrimitiveMode::Points,
            Mode::Lines => PrimitiveMode::Lines,
            Mode::LineLoop => PrimitiveMode::LineLoop,
            Mode::LineStrip => PrimitiveMode::LineStrip,
            Mode::Triangles => PrimitiveMode::Triangles,
            Mode::TriangleStrip => PrimitiveMode::TriangleStrip,
            Mode::TriangleFan => PrimitiveMode::TriangleFan,
        };
        let attribute = |semantic: Semantic| primitive.get(&semantic).map(|item| item.index());
        PrimitiveAsset {
            positions: attribute(Semantic::Positions),
            normals: attribute(Semantic::Normals),
            tex_coords: attribute(Semantic::TexCoords(0)),
            joints: attribute(Semantic::Joints(0)),
            weights: attribute(Semantic::Weights(0)),
            indices: primitive.indices().map(|accessor| accessor.index()),
            material: primitive.material().index(),
            mode,
        }
    }

    fn load_mesh(mesh: gltf::Mesh) -> MeshAsset {
        if mesh.weights().is_some() {
            warn!(
                "Morph target weights of mesh #{} are not supported",
                mesh.index()
            );
        }
        MeshAsset {
            name: mesh.name().map(str::to_string),
            primitives: mesh.primitives().map(Self::load_primitive).collect(),
        }
    }

    fn load_node(node: gltf::Node) -> NodeAsset {
        let transform = match node.transform() {
            Transform::Matrix { matrix } => NodeTransform::Matrix(Mat4::from_cols_array_2d(&matrix)),
            Transform::Decomposed {
                translation,
                rotation,
                scale,
            } => NodeTransform::Decomposed(DecomposedTransform {
                translation: Vec3::from_array(translation),
                rotation: Quat::from_array(rotation),
                scale: Vec3::from_array(scale),
            }),
        };
        NodeAsset {
            name: node.name().map(str::to_string),
            children: node.children().map(|child| child.index()).collect(),
            mesh: node.mesh().map(|mesh| mesh.index()),
            skin: node.skin().map(|skin| skin.index()),
            transform: Some(transform),
        }
    }

    fn load_skin(skin: gltf::Skin) -> SkinAsset {
        SkinAsset {
            name: skin.name().map(str::to_string),
            joints: skin.joints().map(|joint| joint.index()).collect(),
            inverse_bind_matrices: skin.inverse_bind_matrices().map(|accessor| accessor.index()),
            skeleton: skin.skeleton().map(|node| node.index()),
        }
    }

    fn load_animation(animation: gltf::Animation) -> AnimationAsset {
        let samplers = animation
            .samplers()
            .map(|sampler| AnimationSamplerAsset {
                input: sampler.input().index(),
                output: sampler.output().index(),
                interpolation: match sampler.interpolation() {
                    Interpolation::Linear => AnimationInterpolation::Linear,
                    Interpolation::Step => AnimationInterpolation::Step,
                    Interpolation::CubicSpline => AnimationInterpolation::CubicSpline,
                },
            })
            .collect();
        let channels = animation
            .channels()
            .filter_map(|channel| {
                let target = channel.target();
                let path = match target.property() {
                    Property::Translation => AnimationPath::Translation,
                    Property::Rotation => AnimationPath::Rotation,
                    Property::Scale => AnimationPath::Scale,
                    Property::MorphTargetWeights => {
                        warn!(
                            "Skipping morph target weights channel of animation #{}",
                            animation.index()
                        );
                        return None;
                    }
                };
                Some(AnimationChannelAsset {
                    target_node: target.node().index(),
                    path,
                    sampler: channel.sampler().index(),
                })
            })
            .collect();
        AnimationAsset {
            name: animation.name().map(str::to_string),
            samplers,
            channels,
        }
    }

    fn load(self, buffers: Vec<gltf::buffer::Data>) -> DocumentAsset {
        let document = self.document;
        DocumentAsset {
            nodes: document.nodes().map(Self::load_node).collect(),
            meshes: document.meshes().map(Self::load_mesh).collect(),
            accessors: document.accessors().map(Self::load_accessor).collect(),
            buffer_views: document
                .views()
                .map(|view| BufferViewAsset {
                    buffer: view.buffer().index(),
                    byte_offset: view.offset(),
                    byte_length: view.length(),
                    byte_stride: view.stride(),
                })
                .collect(),
            buffers: buffers.into_iter().map(|data| data.0).collect(),
            materials: document.materials().map(Self::load_material).collect(),
            textures: document
                .textures()
                .map(|texture| self.load_texture(texture))
                .collect(),
            skins: document.skins().map(Self::load_skin).collect(),
            animations: document.animations().map(Self::load_animation).collect(),
            scenes: document
                .scenes()
                .map(|scene| SceneAsset {
                    name: scene.name().map(str::to_string),
                    nodes: scene.nodes().map(|node| node.index()).collect(),
                })
                .collect(),
            default_scene: document.default_scene().map(|scene| scene.index()),
        }
    }
}

fn load_imported(
    document: Document,
    buffers: Vec<gltf::buffer::Data>,
    images: Vec<gltf::image::Data>,
) -> DocumentAsset {
    let loader = GltfDocumentLoader::new(&document, images);
    let asset = loader.load(buffers);
    info!(
        "Loaded document: {} nodes, {} meshes, {} skins, {} animations",
        asset.nodes.len(),
        asset.meshes.len(),
        asset.skins.len(),
        asset.animations.len()
    );
    asset
}

/// Load a `.gltf` or `.glb` file, resolving buffers and images relative to it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<DocumentAsset, GltfLoaderError> {
    let (document, buffers, images) = gltf::import(path)?;
    Ok(load_imported(document, buffers, images))
}

/// Load a document from memory. External files can't be resolved here, so
/// buffers and images must be embedded as data URIs or in a GLB chunk.
pub fn load_from_slice(data: &[u8]) -> Result<DocumentAsset, GltfLoaderError> {
    let (document, buffers, images) = gltf::import_slice(data)?;
    Ok(load_imported(document, buffers, images))
}

#[cfg(test)]
pub(crate) mod test {
    use base64::{engine::general_purpose::STANDARD, Engine};

    use super::*;

    /// Pack little endian f32 values into a data URI buffer.
    pub(crate) fn data_uri(bytes: &[u8]) -> String {
        format!(
            "data:application/octet-stream;base64,{}",
            STANDARD.encode(bytes)
        )
    }

    pub(crate) fn f32_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|value| value.to_le_bytes()).collect()
    }

    /// A single triangle, indexed with u16, without UVs.
    pub(crate) fn triangle_gltf() -> String {
        let mut buffer = f32_bytes(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        for index in [0u16, 1, 2] {
            buffer.extend_from_slice(&index.to_le_bytes());
        }
        buffer.extend_from_slice(&[0, 0]);
        format!(
            r#"{{
                "asset": {{ "version": "2.0" }},
                "scene": 0,
                "scenes": [{{ "nodes": [0] }}],
                "nodes": [{{ "mesh": 0, "translation": [0.0, 2.0, 0.0] }}],
                "meshes": [{{
                    "primitives": [{{
                        "attributes": {{ "POSITION": 0 }},
                        "indices": 1,
                        "material": 0
                    }}]
                }}],
                "materials": [{{
                    "pbrMetallicRoughness": {{ "baseColorFactor": [1.0, 0.5, 0.25, 1.0] }}
                }}],
                "buffers": [{{ "byteLength": {}, "uri": "{}" }}],
                "bufferViews": [
                    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
                    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }}
                ],
                "accessors": [
                    {{
                        "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                        "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
                    }},
                    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
                ]
            }}"#,
            buffer.len(),
            data_uri(&buffer)
        )
    }

    #[test]
    fn test_load_tables() {
        let document = load_from_slice(triangle_gltf().as_bytes()).unwrap();
        assert_eq!(document.nodes.len(), 1);
        assert_eq!(document.nodes[0].mesh, Some(0));
        assert_eq!(document.default_scene, Some(0));
        assert_eq!(document.scenes[0].nodes, vec![0]);

        let primitive = &document.meshes[0].primitives[0];
        assert_eq!(primitive.positions, Some(0));
        assert_eq!(primitive.tex_coords, None);
        assert_eq!(primitive.indices, Some(1));
        assert_eq!(primitive.mode, PrimitiveMode::Triangles);

        let indices = &document.accessors[1];
        assert_eq!(indices.component_type, ComponentType::U16);
        assert_eq!(indices.element_type, ElementType::Scalar);
        assert_eq!(document.buffer_views[1].byte_offset, 36);
        assert_eq!(document.materials[0].base_color, [1.0, 0.5, 0.25, 1.0]);
        assert!(document.skins.is_empty());
    }

    #[test]
    fn test_invalid_document_is_an_error() {
        let result = load_from_slice(b"{ not json");
        assert!(matches!(result, Err(GltfLoaderError::Gltf(_))));
    }

    #[test]
    fn test_decode_gray_image_to_rgba() {
        let image = gltf::image::Data {
            pixels: vec![10, 20],
            format: Format::R8,
            width: 2,
            height: 1,
        };
        let (size, pixels) = GltfDocumentLoader::decode_image(0, image).unwrap();
        assert_eq!(size, (2, 1));
        assert_eq!(pixels, vec![10, 10, 10, 255, 20, 20, 20, 255]);
    }

    #[test]
    fn test_short_image_data_is_rejected() {
        let image = gltf::image::Data {
            pixels: vec![0; 3],
            format: Format::R8G8B8A8,
            width: 1,
            height: 1,
        };
        assert!(matches!(
            GltfDocumentLoader::decode_image(3, image),
            Err(GltfLoaderError::BadImageData(3))
        ));
    }
}
