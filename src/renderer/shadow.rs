use glam::{Mat4, Vec3};
use wgpu::{
    AddressMode, CompareFunction, Device, FilterMode, Sampler, SamplerDescriptor, TextureView,
};

use super::depth_texture::DepthTexture;

/// Orthographic view-projection of a directional light, centered on
/// `focus` and covering `extent` units to every side of it.
pub fn light_space_matrix(direction: Vec3, focus: Vec3, extent: f32) -> Mat4 {
    let direction = direction.try_normalize().unwrap_or(Vec3::NEG_Y);
    let extent = extent.max(1.0);
    let up = if direction.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let eye = focus - direction * extent * 2.0;
    let view = Mat4::look_at_rh(eye, focus, up);
    let projection = Mat4::orthographic_rh(-extent, extent, -extent, extent, 0.0, extent * 4.0);
    projection * view
}

/// Depth map rendered from the light, sampled with depth comparison.
pub struct ShadowMap {
    depth: DepthTexture,
    sampler: Sampler,
}

impl ShadowMap {
    pub fn new(device: &Device, size: u32) -> Self {
        let depth = DepthTexture::new(device, (size, size), "Shadow map");
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("Shadow map sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Nearest,
            compare: Some(CompareFunction::LessEqual),
            ..Default::default()
        });
        Self { depth, sampler }
    }

    pub fn texture_view(&self) -> &TextureView {
        self.depth.texture_view()
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    pub fn size(&self) -> u32 {
        self.depth.size().0
    }
}

#[cfg(test)]
mod test {
    use glam::Vec4Swizzles;

    use super::*;

    #[test]
    fn test_focus_lands_in_the_middle() {
        let focus = Vec3::new(30.0, 0.0, -20.0);
        let matrix = light_space_matrix(Vec3::new(-0.5, -1.0, -0.3), focus, 100.0);
        let ndc = matrix * focus.extend(1.0);
        assert!(ndc.xy().abs_diff_eq(glam::Vec2::ZERO, 1e-4));
        assert!((ndc.z - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_extent_bounds_the_volume() {
        let matrix = light_space_matrix(Vec3::NEG_Y, Vec3::ZERO, 50.0);
        let inside = matrix * Vec3::new(49.0, 0.0, -49.0).extend(1.0);
        let outside = matrix * Vec3::new(51.0, 0.0, 0.0).extend(1.0);
        assert!(inside.x.abs() <= 1.0 && inside.y.abs() <= 1.0);
        assert!(outside.x.abs() > 1.0 || outside.y.abs() > 1.0);
    }
}
