use std::path::Path;

use glam::Mat4;
use log::{error, info, warn};
use skinview_asset::{
    mesh::PrimitiveData,
    model::{load_model, ModelAsset},
    pose::Animator,
};
use wgpu::{Device, Queue, RenderPass};

use super::{
    mesh::MeshBuffers,
    texture::TextureItem,
    uniform::{instance::InstanceUniformBuffer, joint::JointsUniformBuffer, material::MaterialBinding},
    RendererLayouts, DEPTH_JOINT_GROUP, INSTANCE_GROUP, JOINT_GROUP, MATERIAL_GROUP,
};

struct RenderPrimitive {
    mesh: MeshBuffers,
    material: MaterialBinding,
    instance: InstanceUniformBuffer,
    /// Placement inside the model, before the model transform
    local_transform: Mat4,
}

/// GPU side of a loaded model: one draw per primitive, plus the joint
/// matrices of its skeleton when it has one.
pub struct Model {
    label: Option<String>,
    primitives: Vec<RenderPrimitive>,
    animator: Animator,
    joints: Option<JointsUniformBuffer>,
    transform: Mat4,
    transform_dirty: bool,
    load_error: Option<String>,
}

impl Model {
    /// Load a glTF file. Failures are logged and give an empty model that
    /// draws nothing, with the message kept in `load_error`.
    pub fn load(
        device: &Device,
        queue: &Queue,
        layouts: &RendererLayouts,
        path: impl AsRef<Path>,
    ) -> Self {
        let path = path.as_ref();
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string());
        match load_model(path) {
            Ok(asset) => Self::from_asset(device, queue, layouts, asset, label),
            Err(err) => {
                error!("Failed to load model {:?}: {}", path, err);
                Self::empty(
                    label,
                    Some(format!("Load \"{}\" failed: {}", path.to_string_lossy(), err)),
                )
            }
        }
    }

    pub fn empty(label: Option<String>, load_error: Option<String>) -> Self {
        Self {
            label,
            primitives: Vec::new(),
            animator: Animator::default(),
            joints: None,
            transform: Mat4::IDENTITY,
            transform_dirty: false,
            load_error,
        }
    }

    /// Static geometry built in code
    pub fn from_primitives(
        device: &Device,
        queue: &Queue,
        layouts: &RendererLayouts,
        primitives: Vec<PrimitiveData>,
        label: Option<String>,
    ) -> Self {
        let asset = ModelAsset {
            primitives,
            ..Default::default()
        };
        Self::from_asset(device, queue, layouts, asset, label)
    }

    pub fn from_asset(
        device: &Device,
        queue: &Queue,
        layouts: &RendererLayouts,
        asset: ModelAsset,
        label: Option<String>,
    ) -> Self {
        let textures: Vec<Option<TextureItem>> = asset
            .textures
            .iter()
            .enumerate()
            .map(|(index, texture)| {
                let texture = texture.as_ref()?;
                TextureItem::from_asset(device, queue, texture)
                    .map_err(|err| warn!("Skipping texture #{}: {}", index, err))
                    .ok()
            })
            .collect();
        let white = TextureItem::white(device, queue);

        let bone_count = asset.animator.skeleton().len();
        let joints = (bone_count > 0)
            .then(|| JointsUniformBuffer::new(device, &layouts.joint, bone_count));

        let primitives = asset
            .primitives
            .iter()
            .map(|primitive| {
                let name = primitive.name.as_deref().or(label.as_deref());
                let texture = primitive
                    .material
                    .base_color_texture
                    .and_then(|index| textures.get(index))
                    .and_then(Option::as_ref)
                    .unwrap_or(&white);
                RenderPrimitive {
                    mesh: MeshBuffers::new(device, primitive, name),
                    material: MaterialBinding::new(
                        device,
                        &layouts.material,
                        primitive.material.base_color,
                        texture,
                        name,
                    ),
                    instance: InstanceUniformBuffer::new(
                        device,
                        &layouts.instance,
                        primitive.transform,
                        primitive.skinned && joints.is_some(),
                    ),
                    local_transform: primitive.transform,
                }
            })
            .collect::<Vec<_>>();

        info!(
            "Uploaded model {}: {} primitives, {} joints",
            label.as_deref().unwrap_or("<unnamed>"),
            primitives.len(),
            bone_count
        );
        Self {
            label,
            primitives,
            animator: asset.animator,
            joints,
            transform: Mat4::IDENTITY,
            transform_dirty: true,
            load_error: None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut Animator {
        &mut self.animator
    }

    pub fn is_animated(&self) -> bool {
        self.animator.is_animated()
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        self.transform_dirty = true;
    }

    /// Advance the pose. Static models ignore this.
    pub fn update_animation(&mut self, delta_time: f32) {
        self.animator.update_animation(delta_time);
    }

    /// Write the instance and joint uniforms for this frame.
    pub fn prepare(&mut self, queue: &Queue) {
        if self.transform_dirty {
            self.transform_dirty = false;
            for primitive in &mut self.primitives {
                primitive
                    .instance
                    .set_transform(self.transform * primitive.local_transform);
                primitive.instance.update(queue);
            }
        }
        if let Some(joints) = &self.joints {
            joints.update(queue, self.animator.final_bone_matrices());
        }
    }

    /// Draw into the color pass. The object pipeline and the frame bind
    /// group, which carries the shadow map, must be set.
    pub fn render(&self, render_pass: &mut RenderPass) {
        if let Some(joints) = &self.joints {
            render_pass.set_bind_group(JOINT_GROUP, joints.bind_group(), &[]);
        }
        for primitive in &self.primitives {
            render_pass.set_bind_group(INSTANCE_GROUP, primitive.instance.bind_group(), &[]);
            render_pass.set_bind_group(MATERIAL_GROUP, primitive.material.bind_group(), &[]);
            primitive.mesh.draw(render_pass);
        }
    }

    /// Draw into the shadow pass, whose frame uniform holds the light space
    /// matrix.
    pub fn render_depth(&self, render_pass: &mut RenderPass) {
        if let Some(joints) = &self.joints {
            render_pass.set_bind_group(DEPTH_JOINT_GROUP, joints.bind_group(), &[]);
        }
        for primitive in &self.primitives {
            render_pass.set_bind_group(INSTANCE_GROUP, primitive.instance.bind_group(), &[]);
            primitive.mesh.draw(render_pass);
        }
    }
}
