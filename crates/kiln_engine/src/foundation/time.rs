//! Time management utilities
//!
//! The game loop reads time through [`Clock`] and waits between ticks through
//! [`FramePacer`], so both can be replaced in tests or on other hosts.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is the moment of creation
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock frozen at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Move time forward by a number of seconds
    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Rolling one-second frame counter.
///
/// Driven by raw (unscaled) frame deltas, so the reported value is unaffected
/// by time scale or pausing.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    frames: u32,
    window: f32,
    fps: u32,
}

impl FpsCounter {
    /// Create a counter reporting 0 until the first window closes
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one frame that took `raw_delta` seconds
    pub fn record(&mut self, raw_delta: f32) {
        self.frames += 1;
        self.window += raw_delta;
        if self.window >= 1.0 {
            self.fps = self.frames;
            self.frames = 0;
            self.window = 0.0;
        }
    }

    /// Frames counted in the last completed window
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// Time budget of one frame at `target_fps`, `None` when unlimited
pub fn frame_budget(target_fps: u32) -> Option<Duration> {
    (target_fps > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(target_fps)))
}

/// Waits between game-loop ticks
#[async_trait(?Send)]
pub trait FramePacer {
    /// Resolve when the next tick may run.
    ///
    /// `Some(delay)` asks for at least `delay` to pass; `None` asks for the
    /// next frame the platform offers.
    async fn wait(&mut self, delay: Option<Duration>);
}

/// Pacer built on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait(?Send)]
impl FramePacer for TokioPacer {
    async fn wait(&mut self, delay: Option<Duration>) {
        match delay {
            Some(delay) if !delay.is_zero() => tokio::time::sleep(delay).await,
            _ => tokio::task::yield_now().await,
        }
    }
}
