use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Frame timing snapshot handed to animations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Time since [`FrameClock::start`], unclamped.
    pub elapsed: Duration,
    /// Time since the previous tick, clamped.
    pub delta: Duration,
    /// Ticks since start. The first tick is frame 0.
    pub frame: u64,
}

impl FrameTime {
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

/// Monotonic frame clock.
///
/// Elapsed time is measured from the last [`start`](Self::start) and is the
/// only input time-driven animations should use. Delta time is clamped so a
/// debugger pause or a minimized window does not produce one huge step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    started: Option<Instant>,
    last: Instant,
    frame: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// A stopped clock with delta clamped to `100µs..=250ms`.
    pub fn new() -> Self {
        Self {
            started: None,
            last: Instant::now(),
            frame: 0,
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
        }
    }

    /// A stopped clock with delta clamped to `dt_min..=dt_max`.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Result<Self> {
        if dt_min > dt_max {
            return Err(Error::InvalidExtent("frame delta clamp needs min <= max"));
        }
        Ok(Self { dt_min, dt_max, ..Self::new() })
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Reset elapsed time and the frame counter to zero.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn start_at(&mut self, now: Instant) {
        self.started = Some(now);
        self.last = now;
        self.frame = 0;
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advance to `now`. A stopped clock starts at `now` first.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let started = match self.started {
            Some(s) => s,
            None => {
                self.start_at(now);
                now
            }
        };

        let raw = now.saturating_duration_since(self.last);
        let delta = if self.frame == 0 { Duration::ZERO } else { raw.clamp(self.dt_min, self.dt_max) };
        self.last = now;

        let time = FrameTime {
            elapsed: now.saturating_duration_since(started),
            delta,
            frame: self.frame,
        };
        self.frame = self.frame.wrapping_add(1);
        time
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_counts_from_start() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new();
        clock.start_at(t0);

        let first = clock.tick_at(t0);
        assert_eq!(first.frame, 0);
        assert_eq!(first.elapsed, Duration::ZERO);

        let second = clock.tick_at(t0 + Duration::from_millis(16));
        assert_eq!(second.frame, 1);
        assert_eq!(second.elapsed, Duration::from_millis(16));
        assert_eq!(second.delta, Duration::from_millis(16));
    }

    #[test]
    fn delta_is_clamped_elapsed_is_not() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new();
        clock.start_at(t0);
        clock.tick_at(t0);

        let stalled = clock.tick_at(t0 + Duration::from_secs(5));
        assert_eq!(stalled.delta, Duration::from_millis(250));
        assert_eq!(stalled.elapsed, Duration::from_secs(5));

        let tight = clock.tick_at(t0 + Duration::from_secs(5));
        assert_eq!(tight.delta, Duration::from_micros(100));
    }

    #[test]
    fn restart_resets_counters() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new();
        clock.tick_at(t0);
        clock.tick_at(t0 + Duration::from_millis(10));

        let t1 = t0 + Duration::from_secs(1);
        clock.start_at(t1);
        let t = clock.tick_at(t1 + Duration::from_millis(5));
        assert_eq!(t.frame, 0);
        assert_eq!(t.elapsed, Duration::from_millis(5));
    }

    #[test]
    fn inverted_delta_clamps_are_rejected() {
        let err = FrameClock::with_clamps(Duration::from_millis(50), Duration::from_millis(10));
        assert!(matches!(err, Err(Error::InvalidExtent(_))));

        let t0 = Instant::now();
        let mut clock = FrameClock::with_clamps(Duration::from_millis(10), Duration::from_millis(10)).unwrap();
        clock.start_at(t0);
        clock.tick_at(t0);
        assert_eq!(clock.tick_at(t0 + Duration::from_secs(1)).delta, Duration::from_millis(10));
    }

    #[test]
    fn stopped_clock_starts_on_first_tick() {
        let mut clock = FrameClock::new();
        assert!(!clock.is_running());
        let t = clock.tick();
        assert!(clock.is_running());
        assert_eq!(t.elapsed, Duration::ZERO);
    }
}
