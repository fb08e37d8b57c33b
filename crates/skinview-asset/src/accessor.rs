use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use glam::Mat4;

use crate::document::DocumentAsset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    pub fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    pub fn components(self) -> usize {
        match self {
            ElementType::Scalar => 1,
            ElementType::Vec2 => 2,
            ElementType::Vec3 => 3,
            ElementType::Vec4 => 4,
            ElementType::Mat2 => 4,
            ElementType::Mat3 => 9,
            ElementType::Mat4 => 16,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BufferViewAsset {
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
}

/// A typed view into one of the document buffers.
#[derive(Debug, Clone)]
pub struct AccessorAsset {
    /// Accessors without a view are all zeros.
    pub view: Option<usize>,
    pub byte_offset: usize,
    pub count: usize,
    pub component_type: ComponentType,
    pub element_type: ElementType,
    pub normalized: bool,
}

impl AccessorAsset {
    pub fn element_size(&self) -> usize {
        self.component_type.size() * self.element_type.components()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccessorError {
    AccessorNotFound(usize),
    ViewNotFound(usize),
    BufferNotFound(usize),
    OutOfBounds {
        end: usize,
        limit: usize,
    },
    BadComponentType {
        expected: &'static str,
        actual: ComponentType,
    },
    BadDimensions {
        expected: ElementType,
        actual: ElementType,
    },
}

impl Display for AccessorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AccessorError::AccessorNotFound(index) => write!(f, "Accessor #{} not found", index),
            AccessorError::ViewNotFound(index) => write!(f, "Buffer view #{} not found", index),
            AccessorError::BufferNotFound(index) => write!(f, "Buffer #{} not found", index),
            AccessorError::OutOfBounds { end, limit } => write!(
                f,
                "Accessor reads up to byte {}, but only {} bytes are available",
                end, limit
            ),
            AccessorError::BadComponentType { expected, actual } => write!(
                f,
                "Bad accessor component type: expected {}, but got {:?}",
                expected, actual
            ),
            AccessorError::BadDimensions { expected, actual } => write!(
                f,
                "Bad accessor dimensions: expected {:?}, but got {:?}",
                expected, actual
            ),
        }
    }
}

impl Error for AccessorError {}

pub fn accessor(document: &DocumentAsset, index: usize) -> Result<&AccessorAsset, AccessorError> {
    document
        .accessors
        .get(index)
        .ok_or(AccessorError::AccessorNotFound(index))
}

pub fn check_dimensions(
    accessor: &AccessorAsset,
    expected: ElementType,
) -> Result<(), AccessorError> {
    if accessor.element_type == expected {
        Ok(())
    } else {
        Err(AccessorError::BadDimensions {
            expected,
            actual: accessor.element_type,
        })
    }
}

/// Gather the bytes of every element, dropping the stride padding.
pub fn read_bytes(document: &DocumentAsset, accessor: &AccessorAsset) -> Result<Vec<u8>, AccessorError> {
    let item_length = accessor.element_size();
    let Some(view_index) = accessor.view else {
        return Ok(vec![0; item_length * accessor.count]);
    };
    let view = document
        .buffer_views
        .get(view_index)
        .ok_or(AccessorError::ViewNotFound(view_index))?;
    let buffer = document
        .buffers
        .get(view.buffer)
        .ok_or(AccessorError::BufferNotFound(view.buffer))?;
    if accessor.count == 0 {
        return Ok(Vec::new());
    }

    let stride = view.byte_stride.unwrap_or(item_length).max(item_length);
    let offset = view.byte_offset + accessor.byte_offset;
    let end = offset + stride * (accessor.count - 1) + item_length;
    let limit = (view.byte_offset + view.byte_length).min(buffer.len());
    if end > limit {
        return Err(AccessorError::OutOfBounds { end, limit });
    }

    let mut result = Vec::with_capacity(item_length * accessor.count);
    for index in 0..accessor.count {
        let start = offset + index * stride;
        result.extend_from_slice(&buffer[start..start + item_length]);
    }
    Ok(result)
}

fn decode_u16(data: &[u8]) -> impl Iterator<Item = u16> + '_ {
    data.chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
}

fn decode_i16(data: &[u8]) -> impl Iterator<Item = i16> + '_ {
    data.chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
}

fn decode_u32(data: &[u8]) -> impl Iterator<Item = u32> + '_ {
    data.chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

fn decode_f32(data: &[u8]) -> impl Iterator<Item = f32> + '_ {
    data.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

pub fn read_f32(document: &DocumentAsset, accessor: &AccessorAsset) -> Result<Vec<f32>, AccessorError> {
    if accessor.component_type != ComponentType::F32 {
        return Err(AccessorError::BadComponentType {
            expected: "f32",
            actual: accessor.component_type,
        });
    }
    let data = read_bytes(document, accessor)?;
    Ok(decode_f32(&data).collect())
}

/// Read face indices of any unsigned width, widened to u32.
pub fn read_indices(
    document: &DocumentAsset,
    accessor: &AccessorAsset,
) -> Result<Vec<u32>, AccessorError> {
    check_dimensions(accessor, ElementType::Scalar)?;
    let data = read_bytes(document, accessor)?;
    match accessor.component_type {
        ComponentType::U8 => Ok(data.into_iter().map(u32::from).collect()),
        ComponentType::U16 => Ok(decode_u16(&data).map(u32::from).collect()),
        ComponentType::U32 => Ok(decode_u32(&data).collect()),
        actual => Err(AccessorError::BadComponentType {
            expected: "u8, u16 or u32",
            actual,
        }),
    }
}

pub fn read_joints(
    document: &DocumentAsset,
    accessor: &AccessorAsset,
) -> Result<Vec<[u32; 4]>, AccessorError> {
    check_dimensions(accessor, ElementType::Vec4)?;
    let data = read_bytes(document, accessor)?;
    let joints: Vec<u32> = match accessor.component_type {
        ComponentType::U8 => data.into_iter().map(u32::from).collect(),
        ComponentType::U16 => decode_u16(&data).map(u32::from).collect(),
        actual => {
            return Err(AccessorError::BadComponentType {
                expected: "u8 or u16",
                actual,
            })
        }
    };
    Ok(chunk(&joints))
}

/// Read floats, mapping normalized integers into [0, 1] or [-1, 1].
pub fn read_normalized(
    document: &DocumentAsset,
    accessor: &AccessorAsset,
) -> Result<Vec<f32>, AccessorError> {
    let data = read_bytes(document, accessor)?;
    let result = match accessor.component_type {
        ComponentType::F32 => decode_f32(&data).collect(),
        ComponentType::U8 => data
            .into_iter()
            .map(|item| item as f32 / u8::MAX as f32)
            .collect(),
        ComponentType::I8 => data
            .into_iter()
            .map(|item| (item as i8 as f32 / i8::MAX as f32).max(-1.0))
            .collect(),
        ComponentType::U16 => decode_u16(&data)
            .map(|item| item as f32 / u16::MAX as f32)
            .collect(),
        ComponentType::I16 => decode_i16(&data)
            .map(|item| (item as f32 / i16::MAX as f32).max(-1.0))
            .collect(),
        ComponentType::U32 => decode_u32(&data)
            .map(|item| item as f32 / u32::MAX as f32)
            .collect(),
    };
    Ok(result)
}

pub fn chunk<T: Copy + Default, const N: usize>(data: &[T]) -> Vec<[T; N]> {
    data.chunks_exact(N)
        .map(|item| {
            let mut array = [T::default(); N];
            array.copy_from_slice(item);
            array
        })
        .collect()
}

pub fn chunk_mat4(data: &[f32]) -> Vec<Mat4> {
    data.chunks_exact(16).map(Mat4::from_cols_slice).collect()
}

#[cfg(test)]
mod test {
    use crate::document::DocumentAsset;

    use super::*;

    fn document_with(buffer: Vec<u8>, view: BufferViewAsset) -> DocumentAsset {
        DocumentAsset {
            buffers: vec![buffer],
            buffer_views: vec![view],
            ..Default::default()
        }
    }

    fn scalar(component_type: ComponentType, count: usize) -> AccessorAsset {
        AccessorAsset {
            view: Some(0),
            byte_offset: 0,
            count,
            component_type,
            element_type: ElementType::Scalar,
            normalized: false,
        }
    }

    #[test]
    fn test_indices_widen_to_u32() {
        let view = BufferViewAsset {
            buffer: 0,
            byte_offset: 0,
            byte_length: 3,
            byte_stride: None,
        };
        let document = document_with(vec![0, 2, 255], view.clone());
        let indices = read_indices(&document, &scalar(ComponentType::U8, 3)).unwrap();
        assert_eq!(indices, vec![0, 2, 255]);

        let mut bytes = Vec::new();
        for index in [1u16, 513, 65535] {
            bytes.extend_from_slice(&index.to_le_bytes());
        }
        let document = document_with(
            bytes,
            BufferViewAsset {
                byte_length: 6,
                ..view.clone()
            },
        );
        let indices = read_indices(&document, &scalar(ComponentType::U16, 3)).unwrap();
        assert_eq!(indices, vec![1, 513, 65535]);

        let mut bytes = Vec::new();
        for index in [7u32, 70000] {
            bytes.extend_from_slice(&index.to_le_bytes());
        }
        let document = document_with(
            bytes,
            BufferViewAsset {
                byte_length: 8,
                ..view
            },
        );
        let indices = read_indices(&document, &scalar(ComponentType::U32, 2)).unwrap();
        assert_eq!(indices, vec![7, 70000]);
    }

    #[test]
    fn test_float_indices_rejected() {
        let view = BufferViewAsset {
            buffer: 0,
            byte_offset: 0,
            byte_length: 4,
            byte_stride: None,
        };
        let document = document_with(vec![0; 4], view);
        let result = read_indices(&document, &scalar(ComponentType::F32, 1));
        assert!(matches!(
            result,
            Err(AccessorError::BadComponentType { .. })
        ));
    }

    #[test]
    fn test_strided_read_skips_padding() {
        // Two vec2<u8> elements with two bytes of padding after each
        let view = BufferViewAsset {
            buffer: 0,
            byte_offset: 1,
            byte_length: 8,
            byte_stride: Some(4),
        };
        let document = document_with(vec![99, 1, 2, 0, 0, 3, 4, 0, 0], view);
        let accessor = AccessorAsset {
            element_type: ElementType::Vec2,
            ..scalar(ComponentType::U8, 2)
        };
        assert_eq!(read_bytes(&document, &accessor).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_out_of_bounds_is_an_error() {
        let view = BufferViewAsset {
            buffer: 0,
            byte_offset: 0,
            byte_length: 4,
            byte_stride: None,
        };
        let document = document_with(vec![0; 4], view);
        let result = read_f32(&document, &scalar(ComponentType::F32, 2));
        assert_eq!(result, Err(AccessorError::OutOfBounds { end: 8, limit: 4 }));
    }

    #[test]
    fn test_accessor_without_view_is_zeroed() {
        let document = DocumentAsset::default();
        let accessor = AccessorAsset {
            view: None,
            element_type: ElementType::Vec3,
            ..scalar(ComponentType::F32, 2)
        };
        assert_eq!(read_f32(&document, &accessor).unwrap(), vec![0.0; 6]);
    }

    #[test]
    fn test_normalized_integers() {
        let view = BufferViewAsset {
            buffer: 0,
            byte_offset: 0,
            byte_length: 4,
            byte_stride: None,
        };
        let document = document_with(vec![0, 255, 0x81, 0x7f], view);
        let unsigned = read_normalized(&document, &scalar(ComponentType::U8, 2)).unwrap();
        assert_eq!(unsigned, vec![0.0, 1.0]);
        let signed = AccessorAsset {
            byte_offset: 2,
            ..scalar(ComponentType::I8, 2)
        };
        assert_eq!(read_normalized(&document, &signed).unwrap(), vec![-1.0, 1.0]);
    }
}
