//! Wall-clock to frame-unit conversion.
//!
//! Front-ends call [`FrameClock::tick`] once per display refresh with a
//! monotonic timestamp in milliseconds. Long gaps are clamped so a stalled
//! tab never produces a huge step, and resuming after a pause restarts the
//! clock instead of catching up.

use crate::config::TimingConfig;

/// Converts timestamps into simulation step sizes.
#[derive(Debug, Clone)]
pub struct FrameClock {
    timing: TimingConfig,
    last_ms: Option<f64>,
    paused: bool,
}

impl FrameClock {
    /// Create a running clock with no reference timestamp yet.
    #[must_use]
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            timing,
            last_ms: None,
            paused: false,
        }
    }

    /// Convert a wall-clock delta into frame units.
    ///
    /// Negative deltas count as zero; deltas above the configured maximum
    /// are clamped to it.
    #[must_use]
    pub fn dt_for(&self, elapsed_ms: f32) -> f32 {
        let clamped = elapsed_ms.clamp(0.0, self.timing.max_frame_ms);
        clamped * self.timing.speed / self.timing.frame_ms_baseline
    }

    /// Record a timestamp and return the step size since the previous one.
    ///
    /// Returns `None` while paused and on the first tick after creation or
    /// resume, which only establishes the reference point.
    pub fn tick(&mut self, now_ms: f64) -> Option<f32> {
        if self.paused {
            return None;
        }
        let previous = self.last_ms.replace(now_ms)?;
        Some(self.dt_for((now_ms - previous) as f32))
    }

    /// Stop producing steps.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Start producing steps again, measured from `now_ms`.
    ///
    /// Without a timestamp the next tick only re-establishes the reference.
    pub fn resume(&mut self, now_ms: Option<f64>) {
        self.paused = false;
        self.last_ms = now_ms;
    }

    /// Check if the clock is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Change the speed multiplier. Non-positive or non-finite values are ignored.
    pub fn set_speed(&mut self, speed: f32) {
        if speed.is_finite() && speed > 0.0 {
            self.timing.speed = speed;
        }
    }

    /// Current speed multiplier.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.timing.speed
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(TimingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dt_baseline() {
        let clock = FrameClock::default();
        assert!((clock.dt_for(16.0) - 1.0).abs() < f32::EPSILON);
        assert!((clock.dt_for(8.0) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_dt_clamped() {
        let clock = FrameClock::default();
        assert!((clock.dt_for(500.0) - 2.5).abs() < f32::EPSILON);
        assert!(clock.dt_for(-3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_speed_multiplier() {
        let mut clock = FrameClock::default();
        clock.set_speed(2.0);
        assert!((clock.dt_for(16.0) - 2.0).abs() < f32::EPSILON);
        clock.set_speed(0.0);
        assert!((clock.speed() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_tick_sequence() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.tick(1000.0), None);
        assert_eq!(clock.tick(1016.0), Some(1.0));
    }

    #[test]
    fn test_pause_has_no_catch_up() {
        let mut clock = FrameClock::default();
        clock.tick(0.0);
        clock.tick(16.0);

        clock.pause();
        assert!(clock.is_paused());
        assert_eq!(clock.tick(5000.0), None);

        clock.resume(Some(10_000.0));
        assert_eq!(clock.tick(10_008.0), Some(0.5));
    }

    #[test]
    fn test_resume_without_timestamp_skips_first_tick() {
        let mut clock = FrameClock::default();
        clock.tick(0.0);
        clock.pause();
        clock.resume(None);
        assert_eq!(clock.tick(9_000.0), None);
        assert_eq!(clock.tick(9_016.0), Some(1.0));
    }
}
