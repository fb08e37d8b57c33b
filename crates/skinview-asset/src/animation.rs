use std::{
    collections::HashMap,
    error::Error,
    fmt::{self, Display, Formatter},
    ops::{Add, Mul},
};

use glam::{Quat, Vec3, Vec4};
use log::{debug, warn};

use crate::{
    accessor::{
        accessor, check_dimensions, chunk, read_f32, read_normalized, AccessorError, ElementType,
    },
    document::{
        AnimationAsset, AnimationInterpolation, AnimationPath, AnimationSamplerAsset,
        DocumentAsset,
    },
    skeleton::Skeleton,
};

pub type Interpolation = AnimationInterpolation;

/// Values that can be blended between two keyframes.
pub trait Interpolate: Copy {
    fn linear(a: Self, b: Self, t: f32) -> Self;
    fn cubic_spline(vk: Self, bk: Self, vk_1: Self, ak_1: Self, t: f32, td: f32) -> Self;
}

fn hermite<T>(vk: T, bk: T, vk_1: T, ak_1: T, t: f32, td: f32) -> T
where
    T: Mul<f32, Output = T> + Add<T, Output = T>,
{
    let t2 = t * t;
    let t3 = t2 * t;
    let first = vk * (2.0 * t3 - 3.0 * t2 + 1.0);
    let second = bk * (td * (t3 - 2.0 * t2 + t));
    let third = vk_1 * (-2.0 * t3 + 3.0 * t2);
    let forth = ak_1 * (td * (t3 - t2));
    first + second + third + forth
}

impl Interpolate for Vec3 {
    fn linear(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }

    fn cubic_spline(vk: Self, bk: Self, vk_1: Self, ak_1: Self, t: f32, td: f32) -> Self {
        hermite(vk, bk, vk_1, ak_1, t, td)
    }
}

impl Interpolate for Quat {
    fn linear(a: Self, b: Self, t: f32) -> Self {
        a.slerp(b, t).normalize()
    }

    fn cubic_spline(vk: Self, bk: Self, vk_1: Self, ak_1: Self, t: f32, td: f32) -> Self {
        let value = hermite(
            Vec4::from(vk),
            Vec4::from(bk),
            Vec4::from(vk_1),
            Vec4::from(ak_1),
            t,
            td,
        );
        Quat::from_vec4(value).normalize()
    }
}

/// Sampler output, one value per keyframe time. Cubic spline samplers hold
/// (in-tangent, value, out-tangent) triples.
#[derive(Debug, Clone)]
pub enum Keyframes {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

impl Keyframes {
    pub fn path(&self) -> AnimationPath {
        match self {
            Keyframes::Translation(_) => AnimationPath::Translation,
            Keyframes::Rotation(_) => AnimationPath::Rotation,
            Keyframes::Scale(_) => AnimationPath::Scale,
        }
    }

    fn len(&self) -> usize {
        match self {
            Keyframes::Translation(values) | Keyframes::Scale(values) => values.len(),
            Keyframes::Rotation(values) => values.len(),
        }
    }
}

/// Locate the keyframes around `time` with a forward scan. Returns the
/// previous and next keyframe and the blend factor between them.
pub fn find_keyframes(times: &[f32], time: f32) -> Option<(usize, usize, f32)> {
    let last = times.len().checked_sub(1)?;
    let mut prev = 0;
    while prev + 1 < last && time > times[prev + 1] {
        prev += 1;
    }
    let next = (prev + 1).min(last);
    let span = (times[next] - times[prev]).max(f32::EPSILON);
    let factor = ((time - times[prev]) / span).clamp(0.0, 1.0);
    Some((prev, next, factor))
}

pub fn sample<T: Interpolate>(
    times: &[f32],
    values: &[T],
    interpolation: Interpolation,
    time: f32,
) -> Option<T> {
    let (prev, next, factor) = find_keyframes(times, time)?;
    match interpolation {
        Interpolation::Linear => Some(T::linear(*values.get(prev)?, *values.get(next)?, factor)),
        Interpolation::Step => values.get(if factor >= 1.0 { next } else { prev }).copied(),
        Interpolation::CubicSpline => {
            let td = times[next] - times[prev];
            let vk = *values.get(prev * 3 + 1)?;
            let bk = *values.get(prev * 3 + 2)?;
            let ak_1 = *values.get(next * 3)?;
            let vk_1 = *values.get(next * 3 + 1)?;
            Some(T::cubic_spline(vk, bk, vk_1, ak_1, factor, td))
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnimationSampler {
    pub times: Vec<f32>,
    pub keyframes: Keyframes,
    pub interpolation: Interpolation,
}

impl AnimationSampler {
    pub fn new(
        times: Vec<f32>,
        keyframes: Keyframes,
        interpolation: Interpolation,
    ) -> Result<Self, AnimationError> {
        let expected = match interpolation {
            Interpolation::CubicSpline => times.len() * 3,
            _ => times.len(),
        };
        if keyframes.len() != expected {
            return Err(AnimationError::KeyframeCount {
                times: times.len(),
                values: keyframes.len(),
            });
        }
        if times.windows(2).any(|pair| pair[1] < pair[0]) {
            warn!("Keyframe times are not sorted");
        }
        Ok(Self {
            times,
            keyframes,
            interpolation,
        })
    }

    pub fn last_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    pub fn sample_vec3(&self, time: f32) -> Option<Vec3> {
        match &self.keyframes {
            Keyframes::Translation(values) | Keyframes::Scale(values) => {
                sample(&self.times, values, self.interpolation, time)
            }
            Keyframes::Rotation(_) => None,
        }
    }

    pub fn sample_quat(&self, time: f32) -> Option<Quat> {
        match &self.keyframes {
            Keyframes::Rotation(values) => sample(&self.times, values, self.interpolation, time),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnimationChannel {
    pub bone: usize,
    pub path: AnimationPath,
    pub sampler: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Animation {
    pub name: Option<String>,
    pub samplers: Vec<AnimationSampler>,
    pub channels: Vec<AnimationChannel>,
    /// Loop period, the latest keyframe time of every sampler.
    pub max_time: f32,
}

impl Animation {
    pub fn new(
        name: Option<String>,
        samplers: Vec<AnimationSampler>,
        channels: Vec<AnimationChannel>,
    ) -> Self {
        let max_time = samplers
            .iter()
            .map(AnimationSampler::last_time)
            .fold(0.0, f32::max);
        Self {
            name,
            samplers,
            channels,
            max_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnimationError {
    SamplerNotFound(usize),
    KeyframeCount { times: usize, values: usize },
    Accessor(AccessorError),
}

impl Display for AnimationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AnimationError::SamplerNotFound(index) => write!(f, "Sampler #{} not found", index),
            AnimationError::KeyframeCount { times, values } => write!(
                f,
                "Sampler has {} keyframe times but {} values",
                times, values
            ),
            AnimationError::Accessor(error) => Display::fmt(error, f),
        }
    }
}

impl Error for AnimationError {}

impl From<AccessorError> for AnimationError {
    fn from(value: AccessorError) -> Self {
        AnimationError::Accessor(value)
    }
}

fn load_sampler(
    document: &DocumentAsset,
    animation: &AnimationAsset,
    index: usize,
    path: AnimationPath,
) -> Result<AnimationSampler, AnimationError> {
    let sampler = animation
        .samplers
        .get(index)
        .ok_or(AnimationError::SamplerNotFound(index))?;
    let input = accessor(document, sampler.input)?;
    check_dimensions(input, ElementType::Scalar)?;
    let times = read_f32(document, input)?;

    let output = accessor(document, sampler.output)?;
    let keyframes = match path {
        AnimationPath::Translation | AnimationPath::Scale => {
            check_dimensions(output, ElementType::Vec3)?;
            let values = chunk(&read_f32(document, output)?)
                .into_iter()
                .map(Vec3::from_array)
                .collect();
            if path == AnimationPath::Translation {
                Keyframes::Translation(values)
            } else {
                Keyframes::Scale(values)
            }
        }
        AnimationPath::Rotation => {
            check_dimensions(output, ElementType::Vec4)?;
            let values = chunk(&read_normalized(document, output)?)
                .into_iter()
                .map(Quat::from_array)
                .collect();
            Keyframes::Rotation(values)
        }
    };
    AnimationSampler::new(times, keyframes, sampler.interpolation)
}

/// Last keyframe time of a sampler, read from its input alone.
fn sampler_end_time(document: &DocumentAsset, sampler: &AnimationSamplerAsset) -> Option<f32> {
    let read = || -> Result<Vec<f32>, AccessorError> {
        let input = accessor(document, sampler.input)?;
        check_dimensions(input, ElementType::Scalar)?;
        read_f32(document, input)
    };
    match read() {
        Ok(times) => times.into_iter().reduce(f32::max),
        Err(error) => {
            warn!("Unreadable keyframe times in accessor #{}: {}", sampler.input, error);
            None
        }
    }
}

/// Decode one animation, resolving channel targets to bones. Channels that
/// target nodes outside the skeleton are dropped.
pub fn build_animation(
    document: &DocumentAsset,
    animation: &AnimationAsset,
    skeleton: &Skeleton,
) -> Animation {
    let mut samplers = Vec::new();
    let mut sampler_slots: HashMap<usize, Option<usize>> = HashMap::new();
    let mut channels = Vec::new();

    for channel in &animation.channels {
        let Some(bone) = skeleton.bone_index(channel.target_node) else {
            debug!(
                "Ignoring channel targeting node #{}, which is not a joint",
                channel.target_node
            );
            continue;
        };
        let slot = *sampler_slots.entry(channel.sampler).or_insert_with(|| {
            match load_sampler(document, animation, channel.sampler, channel.path) {
                Ok(sampler) => {
                    samplers.push(sampler);
                    Some(samplers.len() - 1)
                }
                Err(error) => {
                    warn!("Dropping animation sampler #{}: {}", channel.sampler, error);
                    None
                }
            }
        });
        let Some(sampler) = slot else {
            continue;
        };
        if samplers[sampler].keyframes.path() != channel.path {
            warn!(
                "Sampler #{} is shared by channels of different paths",
                channel.sampler
            );
            continue;
        }
        channels.push(AnimationChannel {
            bone,
            path: channel.path,
            sampler,
        });
    }

    let mut result = Animation::new(animation.name.clone(), samplers, channels);
    // The loop period covers every sampler, including ones only driving non-joint nodes
    result.max_time = animation
        .samplers
        .iter()
        .filter_map(|sampler| sampler_end_time(document, sampler))
        .fold(result.max_time, f32::max);
    result
}

pub fn build_animations(document: &DocumentAsset, skeleton: &Skeleton) -> Vec<Animation> {
    document
        .animations
        .iter()
        .map(|animation| build_animation(document, animation, skeleton))
        .collect()
}

#[cfg(test)]
mod test {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn test_find_keyframes() {
        let times = [0.0, 1.0, 2.0, 4.0];
        assert_eq!(find_keyframes(&times, 0.5), Some((0, 1, 0.5)));
        assert_eq!(find_keyframes(&times, 3.0), Some((2, 3, 0.5)));
        // Past the end saturates on the last pair
        assert_eq!(find_keyframes(&times, 9.0), Some((2, 3, 1.0)));
        assert_eq!(find_keyframes(&times, -1.0), Some((0, 1, 0.0)));
        assert_eq!(find_keyframes(&[], 1.0), None);
    }

    #[test]
    fn test_zero_length_interval_saturates() {
        let (prev, next, factor) = find_keyframes(&[1.0, 1.0], 1.0).unwrap();
        assert_eq!((prev, next), (0, 1));
        assert!(factor.is_finite());
        let (_, _, factor) = find_keyframes(&[2.0], 5.0).unwrap();
        assert_eq!(factor, 1.0);
    }

    #[test]
    fn test_linear_translation() {
        let values = [Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)];
        let value = sample(&[0.0, 1.0], &values, Interpolation::Linear, 0.5).unwrap();
        assert_eq!(value, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_slerp_identical_rotations() {
        let rotation = Quat::from_rotation_y(0.7);
        for t in [0.0, 0.25, 0.5, 1.0] {
            let value = Quat::linear(rotation, rotation, t);
            assert!(value.abs_diff_eq(rotation, 1e-6));
        }
    }

    #[test]
    fn test_slerp_halfway() {
        let values = [Quat::IDENTITY, Quat::from_rotation_z(FRAC_PI_2)];
        let value = sample(&[0.0, 2.0], &values, Interpolation::Linear, 1.0).unwrap();
        assert!(value.abs_diff_eq(Quat::from_rotation_z(FRAC_PI_2 / 2.0), 1e-5));
    }

    #[test]
    fn test_step_holds_previous() {
        let values = [Vec3::ZERO, Vec3::ONE];
        let times = [0.0, 1.0];
        assert_eq!(
            sample(&times, &values, Interpolation::Step, 0.9),
            Some(Vec3::ZERO)
        );
        assert_eq!(
            sample(&times, &values, Interpolation::Step, 1.0),
            Some(Vec3::ONE)
        );
    }

    #[test]
    fn test_cubic_spline_hits_keyframes() {
        // in-tangent, value, out-tangent per keyframe
        let values = [
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::ONE,
            Vec3::ONE,
            Vec3::splat(4.0),
            Vec3::ZERO,
        ];
        let times = [0.0, 2.0];
        let start = sample(&times, &values, Interpolation::CubicSpline, 0.0).unwrap();
        let end = sample(&times, &values, Interpolation::CubicSpline, 2.0).unwrap();
        assert!(start.abs_diff_eq(Vec3::ZERO, 1e-6));
        assert!(end.abs_diff_eq(Vec3::splat(4.0), 1e-6));
        // Hermite basis at t = 0.5 with interval 2
        let middle = sample(&times, &values, Interpolation::CubicSpline, 1.0).unwrap();
        let expected = 0.125 * 2.0 * 1.0 + 0.5 * 4.0 + (-0.125) * 2.0 * 1.0;
        assert!(middle.abs_diff_eq(Vec3::splat(expected), 1e-5));
    }

    #[test]
    fn test_mismatched_sampler_rejected() {
        let result = AnimationSampler::new(
            vec![0.0, 1.0],
            Keyframes::Translation(vec![Vec3::ZERO]),
            Interpolation::Linear,
        );
        assert_eq!(
            result.unwrap_err(),
            AnimationError::KeyframeCount {
                times: 2,
                values: 1
            }
        );
    }

    #[test]
    fn test_max_time_spans_all_samplers() {
        let short = AnimationSampler::new(
            vec![0.0, 1.0],
            Keyframes::Scale(vec![Vec3::ONE; 2]),
            Interpolation::Linear,
        )
        .unwrap();
        let long = AnimationSampler::new(
            vec![0.0, 2.5],
            Keyframes::Rotation(vec![Quat::IDENTITY; 2]),
            Interpolation::Linear,
        )
        .unwrap();
        let animation = Animation::new(None, vec![short, long], Vec::new());
        assert_eq!(animation.max_time, 2.5);
    }
}
