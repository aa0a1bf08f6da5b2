use std::time::{Duration, Instant};

/// Upper bound, in seconds, on a single frame delta.
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Per-frame delta source with a once-per-second FPS counter.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    total: Duration,
    paused: bool,
    frame_count: u64,
    fps: u32,
    frames_this_second: u32,
    second_elapsed: Duration,
    last_delta: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: None,
            total: Duration::ZERO,
            paused: false,
            frame_count: 0,
            fps: 0,
            frames_this_second: 0,
            second_elapsed: Duration::ZERO,
            last_delta: 0.0,
        }
    }

    /// Advance using the wall clock.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Advance to `now` and return the clamped delta in seconds.
    ///
    /// The first tick after construction, `reset` or `resume` returns zero.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let Some(last) = self.last.replace(now) else {
            self.last_delta = 0.0;
            return 0.0;
        };
        if self.paused {
            self.last_delta = 0.0;
            return 0.0;
        }

        let elapsed = now.saturating_duration_since(last);
        self.total += elapsed;
        self.frame_count += 1;
        self.frames_this_second += 1;
        self.second_elapsed += elapsed;
        if self.second_elapsed >= Duration::from_secs(1) {
            self.fps = self.frames_this_second;
            self.frames_this_second = 0;
            self.second_elapsed -= Duration::from_secs(1);
            tracing::trace!(fps = self.fps, "fps sample");
        }

        self.last_delta = elapsed.as_secs_f32().min(MAX_FRAME_DELTA);
        self.last_delta
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.last = None;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Unclamped running time, excluding paused spans.
    pub fn total_seconds(&self) -> f32 {
        self.total.as_secs_f32()
    }

    pub fn delta_seconds(&self) -> f32 {
        self.last_delta
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames counted during the last completed second.
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// Ring buffer of recent frame durations.
#[derive(Debug)]
pub struct FrameTimer {
    history: Vec<Duration>,
    next: usize,
    filled: bool,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: vec![Duration::ZERO; capacity.max(1)],
            next: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.next] = dt;
        self.next = (self.next + 1) % self.history.len();
        if self.next == 0 {
            self.filled = true;
        }
    }

    fn samples(&self) -> &[Duration] {
        if self.filled {
            &self.history
        } else {
            &self.history[..self.next]
        }
    }

    pub fn count(&self) -> usize {
        self.samples().len()
    }

    pub fn average(&self) -> Duration {
        let samples = self.samples();
        if samples.is_empty() {
            return Duration::ZERO;
        }
        samples.iter().sum::<Duration>() / samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.samples().iter().copied().max().unwrap_or_default()
    }

    pub fn min(&self) -> Duration {
        self.samples().iter().copied().min().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick_at(Instant::now()), 0.0);
        assert_eq!(clock.frame_count(), 0);
    }

    #[test]
    fn delta_is_clamped() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick_at(start);
        let dt = clock.tick_at(start + Duration::from_secs(3));
        assert_eq!(dt, MAX_FRAME_DELTA);
        assert!((clock.total_seconds() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn fps_counts_frames_per_second() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick_at(start);
        for i in 1..=10 {
            clock.tick_at(start + Duration::from_millis(100 * i));
        }
        assert_eq!(clock.fps(), 10);
        assert_eq!(clock.frame_count(), 10);
    }

    #[test]
    fn paused_clock_reports_zero() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick_at(start);
        clock.pause();
        assert_eq!(clock.tick_at(start + Duration::from_millis(50)), 0.0);
        clock.resume();
        assert!(!clock.is_paused());
        // resume restarts the delta baseline
        assert_eq!(clock.tick_at(start + Duration::from_secs(10)), 0.0);
        let dt = clock.tick_at(start + Duration::from_secs(10) + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-4);
    }

    #[test]
    fn reset_clears_counters() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick_at(start);
        clock.tick_at(start + Duration::from_millis(16));
        clock.reset();
        assert_eq!(clock.frame_count(), 0);
        assert_eq!(clock.total_seconds(), 0.0);
    }

    #[test]
    fn frame_timer_tracks_history() {
        let mut timer = FrameTimer::new(3);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), Duration::from_millis(20));
        assert_eq!(timer.max(), Duration::from_millis(30));
        assert_eq!(timer.min(), Duration::from_millis(10));
    }

    #[test]
    fn frame_timer_wraps_around() {
        let mut timer = FrameTimer::new(2);
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(20));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.count(), 2);
        assert_eq!(timer.average(), Duration::from_millis(25));
    }
}
