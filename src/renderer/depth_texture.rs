use wgpu::{
    Device, Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
    TextureView, TextureViewDescriptor,
};

pub const DEPTH_TEXTURE_FORMAT: TextureFormat = TextureFormat::Depth32Float;

pub struct DepthTexture {
    texture_view: TextureView,
    size: (u32, u32),
}

impl DepthTexture {
    pub fn new(device: &Device, size: (u32, u32), label: &str) -> Self {
        // Zero sized textures are invalid, a minimized window reports 0x0
        let size = (size.0.max(1), size.1.max(1));
        let desc = TextureDescriptor {
            label: Some(label),
            size: Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: DEPTH_TEXTURE_FORMAT,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        };
        let texture = device.create_texture(&desc);
        let texture_view = texture.create_view(&TextureViewDescriptor::default());

        Self { texture_view, size }
    }

    pub fn texture_view(&self) -> &TextureView {
        &self.texture_view
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}
