//! Frame pacing for the synthesis loop.
//!
//! The synthesizer awaits one tick after every rendered frame. The tick is the only suspension
//! point of a local run, so it is also where cancellation and dropped futures take effect.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Interval, MissedTickBehavior};

use crate::foundation::core::Fps;

/// Scheduler tick awaited between frames.
#[async_trait]
pub trait FrameClock: Send {
    /// Suspend until the next frame may be produced.
    async fn tick(&mut self);
}

/// Yields to the runtime once per frame and otherwise runs as fast as rendering allows.
#[derive(Debug, Default)]
pub struct CooperativeClock;

#[async_trait]
impl FrameClock for CooperativeClock {
    async fn tick(&mut self) {
        tokio::task::yield_now().await;
    }
}

/// Emits one tick per frame period. Late ticks push the schedule back instead of bursting.
#[derive(Debug)]
pub struct RealtimeClock {
    interval: Interval,
}

impl RealtimeClock {
    /// Clock ticking at `fps`.
    pub fn new(fps: Fps) -> Self {
        let period = Duration::from_secs_f64(fps.frame_duration_secs());
        let start = tokio::time::Instant::now() + period;
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl FrameClock for RealtimeClock {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// How a local run is paced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pacing {
    /// One cooperative yield per frame.
    #[default]
    Cooperative,
    /// One frame per `1/fps` of wall-clock time.
    Realtime,
}

impl Pacing {
    /// Build the clock for one run. Must be called from within a tokio runtime.
    pub fn clock(self, fps: Fps) -> Box<dyn FrameClock> {
        match self {
            Self::Cooperative => Box::new(CooperativeClock),
            Self::Realtime => Box::new(RealtimeClock::new(fps)),
        }
    }
}
