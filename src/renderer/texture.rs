use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    path::Path,
};

use image::ImageError;
use log::info;
use skinview_asset::texture::{
    SamplerAsset, TextureAsset, TextureMagFilter, TextureMinFilter, TextureMipmapFilter,
    TextureWrappingMode,
};
use wgpu::{
    AddressMode, Device, Extent3d, FilterMode, ImageCopyTexture, ImageDataLayout, Origin3d, Queue,
    Sampler, SamplerDescriptor, TextureAspect, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages, TextureView, TextureViewDescriptor,
};

#[derive(Debug)]
pub enum TextureLoadError {
    Image(ImageError),
    BadSize { size: (u32, u32), bytes: usize },
}

impl Display for TextureLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TextureLoadError::Image(err) => write!(f, "Failed to decode image: {}", err),
            TextureLoadError::BadSize { size, bytes } => write!(
                f,
                "{} bytes do not make a {}x{} RGBA image",
                bytes, size.0, size.1
            ),
        }
    }
}

impl Error for TextureLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TextureLoadError::Image(err) => Some(err),
            TextureLoadError::BadSize { .. } => None,
        }
    }
}

impl From<ImageError> for TextureLoadError {
    fn from(value: ImageError) -> Self {
        TextureLoadError::Image(value)
    }
}

fn check_rgba_size(size: (u32, u32), bytes: usize) -> Result<(), TextureLoadError> {
    let expected = size.0 as usize * size.1 as usize * 4;
    if size.0 == 0 || size.1 == 0 || bytes != expected {
        return Err(TextureLoadError::BadSize { size, bytes });
    }
    Ok(())
}

fn wrap_mode(wrap_mode: TextureWrappingMode) -> AddressMode {
    match wrap_mode {
        TextureWrappingMode::ClampToEdge => AddressMode::ClampToEdge,
        TextureWrappingMode::MirroredRepeat => AddressMode::MirrorRepeat,
        TextureWrappingMode::Repeat => AddressMode::Repeat,
    }
}

fn sampler_descriptor<'a>(sampler: &SamplerAsset, label: Option<&'a str>) -> SamplerDescriptor<'a> {
    SamplerDescriptor {
        label,
        address_mode_u: wrap_mode(sampler.wrap_x),
        address_mode_v: wrap_mode(sampler.wrap_y),
        address_mode_w: AddressMode::ClampToEdge,
        mag_filter: match sampler.mag_filter {
            TextureMagFilter::Nearest => FilterMode::Nearest,
            TextureMagFilter::Linear => FilterMode::Linear,
        },
        min_filter: match sampler.min_filter {
            TextureMinFilter::Nearest => FilterMode::Nearest,
            TextureMinFilter::Linear => FilterMode::Linear,
        },
        mipmap_filter: match sampler.mipmap_filter {
            TextureMipmapFilter::Nearest => FilterMode::Nearest,
            TextureMipmapFilter::Linear => FilterMode::Linear,
        },
        ..Default::default()
    }
}

/// An uploaded sRGB texture with its sampler.
#[derive(Debug)]
pub struct TextureItem {
    texture_view: TextureView,
    sampler: Sampler,
}

impl TextureItem {
    fn upload(
        device: &Device,
        queue: &Queue,
        size: (u32, u32),
        data: &[u8],
        sampler: &SamplerAsset,
        label: Option<&str>,
    ) -> Self {
        let extent = Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&TextureDescriptor {
            label,
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            data,
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.0),
                rows_per_image: Some(size.1),
            },
            extent,
        );
        let texture_view = texture.create_view(&TextureViewDescriptor::default());
        let sampler = device.create_sampler(&sampler_descriptor(sampler, label));

        Self {
            texture_view,
            sampler,
        }
    }

    /// Upload RGBA8 pixels. The data length must match the size.
    pub fn from_rgba(
        device: &Device,
        queue: &Queue,
        size: (u32, u32),
        data: &[u8],
        sampler: &SamplerAsset,
        label: Option<&str>,
    ) -> Result<Self, TextureLoadError> {
        check_rgba_size(size, data.len())?;
        Ok(Self::upload(device, queue, size, data, sampler, label))
    }

    pub fn from_asset(
        device: &Device,
        queue: &Queue,
        asset: &TextureAsset,
    ) -> Result<Self, TextureLoadError> {
        Self::from_rgba(
            device,
            queue,
            asset.size,
            &asset.data,
            &asset.sampler,
            asset.name.as_deref(),
        )
    }

    /// Decode an image file from disk, repeating in both directions.
    pub fn from_path(
        device: &Device,
        queue: &Queue,
        path: impl AsRef<Path>,
    ) -> Result<Self, TextureLoadError> {
        let path = path.as_ref();
        let image = image::open(path)?.into_rgba8();
        info!(
            "Loaded texture {:?} ({}x{})",
            path,
            image.width(),
            image.height()
        );
        let label = path.to_string_lossy();
        Self::from_rgba(
            device,
            queue,
            image.dimensions(),
            image.as_raw(),
            &SamplerAsset::default(),
            Some(&label),
        )
    }

    /// 1x1 white texture, bound by materials without a base color texture.
    pub fn white(device: &Device, queue: &Queue) -> Self {
        Self::upload(
            device,
            queue,
            (1, 1),
            &[u8::MAX; 4],
            &SamplerAsset::default(),
            Some("White texture"),
        )
    }

    pub fn texture_view(&self) -> &TextureView {
        &self.texture_view
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rgba_size_check() {
        assert!(check_rgba_size((2, 2), 16).is_ok());
        assert!(matches!(
            check_rgba_size((2, 2), 12),
            Err(TextureLoadError::BadSize { bytes: 12, .. })
        ));
        assert!(check_rgba_size((0, 4), 0).is_err());
    }

    #[test]
    fn test_sampler_mapping() {
        let descriptor = sampler_descriptor(
            &SamplerAsset {
                mag_filter: TextureMagFilter::Nearest,
                min_filter: TextureMinFilter::Linear,
                mipmap_filter: TextureMipmapFilter::Linear,
                wrap_x: TextureWrappingMode::MirroredRepeat,
                wrap_y: TextureWrappingMode::ClampToEdge,
            },
            None,
        );
        assert_eq!(descriptor.mag_filter, FilterMode::Nearest);
        assert_eq!(descriptor.min_filter, FilterMode::Linear);
        assert_eq!(descriptor.mipmap_filter, FilterMode::Linear);
        assert_eq!(descriptor.address_mode_u, AddressMode::MirrorRepeat);
        assert_eq!(descriptor.address_mode_v, AddressMode::ClampToEdge);
    }
}
