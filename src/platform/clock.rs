//! Monotonic frame timing

use std::time::{Duration, Instant};

const FPS_WINDOW: usize = 60;

/// Measures raw frame dt and a rolling FPS over the last 60 frames.
/// Clamping is the caller's business (`Settings::clamp_dt`).
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Option<Instant>,
    frame_times: [f32; FPS_WINDOW],
    frame_index: usize,
    filled: bool,
    fps: u32,
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
            frame_times: [0.0; FPS_WINDOW],
            frame_index: 0,
            filled: false,
            fps: 0,
        }
    }

    /// Seconds since the previous tick (0 on the first)
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = self
            .last
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO)
            .as_secs_f32();
        self.last = Some(now);
        self.record(dt);
        dt
    }

    fn record(&mut self, dt: f32) {
        self.frame_times[self.frame_index] = dt;
        self.frame_index = (self.frame_index + 1) % FPS_WINDOW;
        if self.frame_index == 0 {
            self.filled = true;
        }
        let count = if self.filled {
            FPS_WINDOW
        } else {
            self.frame_index
        };
        let elapsed: f32 = self.frame_times[..count].iter().sum();
        if elapsed > 0.0 {
            self.fps = (count as f32 / elapsed).round() as u32;
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick_at(Instant::now()), 0.0);
    }

    #[test]
    fn test_measures_elapsed() {
        let mut clock = FrameClock::new();
        let t0 = Instant::now();
        clock.tick_at(t0);
        let dt = clock.tick_at(t0 + Duration::from_millis(20));
        assert!((dt - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_rolling_fps() {
        let mut clock = FrameClock::new();
        let mut t = Instant::now();
        clock.tick_at(t);
        for _ in 0..120 {
            t += Duration::from_micros(16_667);
            clock.tick_at(t);
        }
        assert_eq!(clock.fps(), 60);
    }
}
