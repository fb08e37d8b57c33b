use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

pub const FRAME_TIME_SAMPLES: usize = 60;

#[derive(Debug, Default)]
pub struct PerformanceTracker {
    frame_time: VecDeque<Duration>,
    frame_timestamp: VecDeque<Instant>,
}

impl PerformanceTracker {
    pub fn last_frame_time(&self) -> Option<&Duration> {
        self.frame_time.back()
    }

    pub fn avg_frame_time(&self) -> Option<Duration> {
        let count = self.frame_time.len() as u32;
        if count == 0 {
            return None;
        }
        Some(self.frame_time.iter().sum::<Duration>() / count)
    }

    pub fn add_sample(&mut self, frame_time: Duration, frame_timestamp: Instant) {
        self.frame_time.push_back(frame_time);
        while self.frame_time.len() > FRAME_TIME_SAMPLES {
            self.frame_time.pop_front();
        }

        self.frame_timestamp.push_back(frame_timestamp);
        while self.frame_timestamp.len() > FRAME_TIME_SAMPLES {
            self.frame_timestamp.pop_front();
        }
    }

    pub fn fps(&self) -> Option<f32> {
        let first = self.frame_timestamp.front()?;
        let last = self.frame_timestamp.back()?;
        if first == last {
            return None;
        }
        let intervals = self.frame_timestamp.len() - 1;
        let avg_duration = (*last - *first).as_nanos() as f32 / intervals as f32;
        Some(Duration::from_secs(1).as_nanos() as f32 / avg_duration)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fps_from_timestamps() {
        let mut tracker = PerformanceTracker::default();
        assert!(tracker.fps().is_none());

        let start = Instant::now();
        for frame in 0..11 {
            tracker.add_sample(
                Duration::from_millis(5),
                start + Duration::from_millis(frame * 10),
            );
        }
        let fps = tracker.fps().unwrap();
        assert!((fps - 100.0).abs() < 0.01);
        assert_eq!(tracker.avg_frame_time(), Some(Duration::from_millis(5)));
    }

    #[test]
    fn test_samples_are_bounded() {
        let mut tracker = PerformanceTracker::default();
        let start = Instant::now();
        for frame in 0..(FRAME_TIME_SAMPLES as u64 * 2) {
            tracker.add_sample(
                Duration::from_millis(frame),
                start + Duration::from_millis(frame),
            );
        }
        assert_eq!(tracker.frame_time.len(), FRAME_TIME_SAMPLES);
        assert_eq!(
            tracker.last_frame_time(),
            Some(&Duration::from_millis(FRAME_TIME_SAMPLES as u64 * 2 - 1))
        );
    }
}
