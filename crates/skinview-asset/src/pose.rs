use glam::{Mat4, Quat, Vec3};
use log::warn;

use crate::{
    animation::Animation,
    document::AnimationPath,
    skeleton::Skeleton,
};

/// Per-frame pose state of a skeleton playing one animation on a loop.
#[derive(Debug, Clone, Default)]
pub struct Animator {
    skeleton: Skeleton,
    animations: Vec<Animation>,
    active: usize,
    animation_time: f32,
    playing: bool,
    local_transforms: Vec<Mat4>,
    global_transforms: Vec<Mat4>,
    final_bone_matrices: Vec<Mat4>,
}

impl Animator {
    /// Create the animator and evaluate the first pose, so the matrices are
    /// valid before the first frame.
    pub fn new(skeleton: Skeleton, animations: Vec<Animation>) -> Self {
        let bone_count = skeleton.len();
        let mut animator = Self {
            skeleton,
            animations,
            active: 0,
            animation_time: 0.0,
            playing: true,
            local_transforms: vec![Mat4::IDENTITY; bone_count],
            global_transforms: vec![Mat4::IDENTITY; bone_count],
            final_bone_matrices: vec![Mat4::IDENTITY; bone_count],
        };
        animator.evaluate();
        animator
    }

    pub fn is_animated(&self) -> bool {
        !self.skeleton.is_empty() && !self.animations.is_empty()
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn active_animation(&self) -> Option<&Animation> {
        self.animations.get(self.active)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn animation_time(&self) -> f32 {
        self.animation_time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    /// Switch to another stored animation, restarting from time zero.
    pub fn set_active_animation(&mut self, index: usize) -> bool {
        if index >= self.animations.len() {
            warn!(
                "Animation #{} not found, {} available",
                index,
                self.animations.len()
            );
            return false;
        }
        self.active = index;
        self.animation_time = 0.0;
        self.evaluate();
        true
    }

    /// Jump to a time inside the active animation.
    pub fn seek(&mut self, time: f32) {
        self.animation_time = self.wrap_time(time);
        self.evaluate();
    }

    pub fn local_transforms(&self) -> &[Mat4] {
        &self.local_transforms
    }

    pub fn global_transforms(&self) -> &[Mat4] {
        &self.global_transforms
    }

    /// Skinning matrices, global transform times inverse bind matrix.
    pub fn final_bone_matrices(&self) -> &[Mat4] {
        &self.final_bone_matrices
    }

    fn wrap_time(&self, time: f32) -> f32 {
        let max_time = self
            .active_animation()
            .map(|animation| animation.max_time)
            .unwrap_or(0.0);
        if max_time <= 0.0 || !time.is_finite() {
            return 0.0;
        }
        if (0.0..max_time).contains(&time) {
            return time;
        }
        let wrapped = time.rem_euclid(max_time);
        // rem_euclid may round up to the divisor
        if wrapped >= max_time {
            0.0
        } else {
            wrapped
        }
    }

    /// Advance the clock and recompute every bone matrix. Static models skip
    /// all work.
    pub fn update_animation(&mut self, delta_time: f32) {
        if !self.is_animated() {
            return;
        }
        if self.playing {
            self.animation_time = self.wrap_time(self.animation_time + delta_time);
        }
        self.evaluate();
    }

    fn evaluate(&mut self) {
        let bones = self.skeleton.bones();
        let mut translations: Vec<Vec3> = bones.iter().map(|bone| bone.rest.translation).collect();
        let mut rotations: Vec<Quat> = bones.iter().map(|bone| bone.rest.rotation).collect();
        let mut scales: Vec<Vec3> = bones.iter().map(|bone| bone.rest.scale).collect();

        if let Some(animation) = self.animations.get(self.active) {
            for channel in &animation.channels {
                let Some(sampler) = animation.samplers.get(channel.sampler) else {
                    continue;
                };
                if channel.bone >= bones.len() {
                    continue;
                }
                match channel.path {
                    AnimationPath::Translation => {
                        if let Some(value) = sampler.sample_vec3(self.animation_time) {
                            translations[channel.bone] = value;
                        }
                    }
                    AnimationPath::Rotation => {
                        if let Some(value) = sampler.sample_quat(self.animation_time) {
                            rotations[channel.bone] = value;
                        }
                    }
                    AnimationPath::Scale => {
                        if let Some(value) = sampler.sample_vec3(self.animation_time) {
                            scales[channel.bone] = value;
                        }
                    }
                }
            }
        }

        for (index, local) in self.local_transforms.iter_mut().enumerate() {
            *local = Mat4::from_scale_rotation_translation(
                scales[index],
                rotations[index],
                translations[index],
            );
        }
        for &index in self.skeleton.evaluation_order() {
            let bone = &bones[index];
            let parent = match bone.parent {
                Some(parent) => self.global_transforms[parent],
                None => bone.root_transform,
            };
            self.global_transforms[index] = parent * self.local_transforms[index];
        }
        for (index, bone) in bones.iter().enumerate() {
            self.final_bone_matrices[index] =
                self.global_transforms[index] * bone.inverse_bind_matrix;
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        animation::{AnimationChannel, AnimationSampler, Interpolation, Keyframes},
        node::DecomposedTransform,
        skeleton::Bone,
    };

    use super::*;

    fn two_bone_chain() -> Skeleton {
        let mut child = Bone::new(1, Some(0));
        child.rest = DecomposedTransform {
            translation: Vec3::new(0.0, 1.0, 0.0),
            ..Default::default()
        };
        Skeleton::new(vec![Bone::new(0, None), child])
    }

    fn slide_animation(bone: usize) -> Animation {
        let sampler = AnimationSampler::new(
            vec![0.0, 1.0],
            Keyframes::Translation(vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)]),
            Interpolation::Linear,
        )
        .unwrap();
        Animation::new(
            Some(String::from("slide")),
            vec![sampler],
            vec![AnimationChannel {
                bone,
                path: AnimationPath::Translation,
                sampler: 0,
            }],
        )
    }

    #[test]
    fn test_two_bone_chain_without_channels() {
        let animator = Animator::new(two_bone_chain(), Vec::new());
        let translation = animator.global_transforms()[1].w_axis.truncate();
        assert_eq!(translation, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(animator.global_transforms()[0], Mat4::IDENTITY);
    }

    #[test]
    fn test_linear_channel_at_half_time() {
        let mut animator = Animator::new(two_bone_chain(), vec![slide_animation(0)]);
        animator.update_animation(0.5);
        assert_eq!(animator.animation_time(), 0.5);
        let root = animator.global_transforms()[0].w_axis.truncate();
        assert_eq!(root, Vec3::new(5.0, 0.0, 0.0));
        // The child follows its parent
        let child = animator.global_transforms()[1].w_axis.truncate();
        assert!(child.abs_diff_eq(Vec3::new(5.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn test_time_wraps_into_loop_period() {
        let mut animator = Animator::new(two_bone_chain(), vec![slide_animation(0)]);
        let deltas = [0.3, 0.0, 0.45, 0.7, 0.25, 1.9, 0.016, 3.0];
        let mut total = 0.0;
        for delta in deltas {
            animator.update_animation(delta);
            total += delta;
            let time = animator.animation_time();
            assert!((0.0..1.0).contains(&time), "time {} out of range", time);
        }
        assert!(total > 1.0);

        animator.seek(0.0);
        animator.update_animation(1.0);
        assert_eq!(animator.animation_time(), 0.0);
    }

    #[test]
    fn test_zero_length_animation_pins_time() {
        let sampler = AnimationSampler::new(
            vec![0.0],
            Keyframes::Scale(vec![Vec3::splat(2.0)]),
            Interpolation::Linear,
        )
        .unwrap();
        let animation = Animation::new(
            None,
            vec![sampler],
            vec![AnimationChannel {
                bone: 0,
                path: AnimationPath::Scale,
                sampler: 0,
            }],
        );
        let mut animator = Animator::new(two_bone_chain(), vec![animation]);
        animator.update_animation(0.5);
        assert_eq!(animator.animation_time(), 0.0);
        assert!(animator.local_transforms()[0].is_finite());
    }

    #[test]
    fn test_paused_animation_keeps_time() {
        let mut animator = Animator::new(two_bone_chain(), vec![slide_animation(0)]);
        animator.update_animation(0.25);
        animator.set_playing(false);
        animator.update_animation(0.5);
        assert_eq!(animator.animation_time(), 0.25);
    }

    #[test]
    fn test_final_matrix_applies_inverse_bind() {
        let mut skeleton_bones = vec![Bone::new(0, None)];
        skeleton_bones[0].rest.translation = Vec3::new(0.0, 2.0, 0.0);
        skeleton_bones[0].inverse_bind_matrix =
            Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0));
        let animator = Animator::new(Skeleton::new(skeleton_bones), Vec::new());
        assert_eq!(animator.final_bone_matrices()[0], Mat4::IDENTITY);
    }

    #[test]
    fn test_child_listed_before_parent_follows_parent() {
        let mut child = Bone::new(10, Some(1));
        child.rest.translation = Vec3::new(0.0, 1.0, 0.0);
        let mut root = Bone::new(11, None);
        root.rest.translation = Vec3::new(5.0, 0.0, 0.0);
        let animator = Animator::new(Skeleton::new(vec![child, root]), Vec::new());

        let position = animator.global_transforms()[0].w_axis.truncate();
        assert_eq!(position, Vec3::new(5.0, 1.0, 0.0));
        let skinning = animator.final_bone_matrices()[0].w_axis.truncate();
        assert_eq!(skinning, Vec3::new(5.0, 1.0, 0.0));
    }

    #[test]
    fn test_root_bone_includes_armature_transform() {
        let armature = Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0));
        let mut root = Bone::new(0, None);
        root.rest.translation = Vec3::new(0.0, 1.0, 0.0);
        root.root_transform = armature;
        root.inverse_bind_matrix = Mat4::from_translation(Vec3::new(0.0, -1.0, -5.0));
        let mut animator = Animator::new(Skeleton::new(vec![root]), vec![slide_animation(0)]);

        animator.update_animation(0.5);
        let global = animator.global_transforms()[0].w_axis.truncate();
        assert!(global.abs_diff_eq(Vec3::new(5.0, 0.0, 5.0), 1e-6));
        let expected = Mat4::from_translation(Vec3::new(5.0, -1.0, 0.0));
        assert!(animator.final_bone_matrices()[0].abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_static_model_is_inert() {
        let mut animator = Animator::new(Skeleton::default(), Vec::new());
        assert!(!animator.is_animated());
        animator.update_animation(1.0);
        assert_eq!(animator.animation_time(), 0.0);
        assert!(animator.final_bone_matrices().is_empty());
    }

    #[test]
    fn test_switch_animation_resets_time() {
        let mut animator = Animator::new(
            two_bone_chain(),
            vec![slide_animation(0), slide_animation(1)],
        );
        animator.update_animation(0.5);
        assert!(animator.set_active_animation(1));
        assert_eq!(animator.animation_time(), 0.0);
        assert_eq!(animator.active_index(), 1);
        assert!(!animator.set_active_animation(2));
    }
}
