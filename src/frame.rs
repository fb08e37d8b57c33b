use std::time::Duration;

pub const DEFAULT_MAX_FRAME_DELTA: f32 = 0.1;

/// Bound a raw frame time, in seconds, so a stalled frame does not make the
/// animation jump.
pub fn clamp_frame_delta(raw: f32, max: f32) -> f32 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0.0;
    }
    raw.min(max.max(0.0))
}

/// Per-frame timing handed to everything updated in a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameContext {
    /// Clamped time since the last frame, in seconds
    pub delta: f32,
    /// Unclamped time since the first frame, in seconds
    pub elapsed: f32,
    pub frame_index: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    context: Option<FrameContext>,
}

impl FrameClock {
    /// Advance by the wall time spent since the previous tick. The first tick
    /// has a zero delta.
    pub fn tick(&mut self, since_last: Option<Duration>, max_delta: f32) -> FrameContext {
        let raw = since_last.map(|duration| duration.as_secs_f32()).unwrap_or(0.0);
        let context = match self.context {
            Some(previous) => FrameContext {
                delta: clamp_frame_delta(raw, max_delta),
                elapsed: previous.elapsed + raw,
                frame_index: previous.frame_index + 1,
            },
            None => FrameContext::default(),
        };
        self.context = Some(context);
        context
    }

    pub fn context(&self) -> Option<FrameContext> {
        self.context
    }
}
