//! Frame timing
//!
//! The host delivers one tick per frame; [`FrameClock`] turns raw deltas into
//! the [`FrameTime`] value every layer and the dispatcher receive.

/// Timing of the frame being processed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Frame number, starting at 1 for the first ticked frame
    pub frame: u64,
    /// Seconds since the previous frame
    pub delta: f32,
    /// Seconds since the clock started
    pub total: f32,
}

impl FrameTime {
    pub fn new(frame: u64, delta: f32, total: f32) -> Self {
        Self { frame, delta, total }
    }

    /// Delta clamped to 100ms so a stalled frame does not explode simulations
    pub fn smooth_delta(&self) -> f32 {
        self.delta.min(0.1)
    }
}

/// Accumulates host ticks into [`FrameTime`] values
#[derive(Debug, Clone)]
pub struct FrameClock {
    current: FrameTime,
    /// Smoothed frames per second, refreshed once per second
    avg_fps: f32,
    fps_frames: u32,
    fps_elapsed: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            current: FrameTime::default(),
            avg_fps: 0.0,
            fps_frames: 0,
            fps_elapsed: 0.0,
        }
    }

    /// Advance by `delta` seconds and return the new frame time
    pub fn tick(&mut self, delta: f32) -> FrameTime {
        let delta = delta.max(0.0);
        self.current = FrameTime {
            frame: self.current.frame + 1,
            delta,
            total: self.current.total + delta,
        };

        self.fps_frames += 1;
        self.fps_elapsed += delta;
        if self.fps_elapsed >= 1.0 {
            self.avg_fps = self.fps_frames as f32 / self.fps_elapsed;
            self.fps_frames = 0;
            self.fps_elapsed = 0.0;
        }

        self.current
    }

    /// The most recent frame time
    pub fn current(&self) -> FrameTime {
        self.current
    }

    pub fn average_fps(&self) -> f32 {
        self.avg_fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
