//! Round Scheduler - best-effort fixed cadence for every execution unit.
//!
//! Each round has the same shape on the coordinator and on grid nodes:
//!
//! 1. record the round start
//! 2. do the round's work
//! 3. sleep for whatever is left of the target interval
//!
//! A round that overruns the interval skips the sleep and the next round
//! starts immediately. There is no catch-up and no skipped round, so drift
//! accumulates.

use std::time::Duration;

use tokio::task;
use tokio::time::{self, Instant};
use tracing::trace;

/// Target length of one round.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Lifecycle of a unit. There is no pause/resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Still taking rounds.
    Running,
    /// Finished; no further rounds.
    Stopped,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// How long to sleep after a round whose work took `elapsed`.
///
/// `max(0, interval - elapsed)`.
#[inline]
pub fn pause_after(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

/// Per-unit round clock.
///
/// The round index starts at 0 and is bumped by [`begin`](Self::begin), so it
/// reads 1 during the first round.
#[derive(Debug)]
pub struct RoundClock {
    interval: Duration,
    round: u64,
    round_start: Option<Instant>,
}

impl RoundClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            round: 0,
            round_start: None,
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Index of the current (or last finished) round.
    #[inline]
    pub fn round(&self) -> u64 {
        self.round
    }

    /// When the current round started.
    pub fn round_start(&self) -> Option<Instant> {
        self.round_start
    }

    /// Start a new round and return its index.
    pub fn begin(&mut self) -> u64 {
        self.round_start = Some(Instant::now());
        self.round += 1;
        self.round
    }

    /// Time spent in the current round so far.
    pub fn elapsed(&self) -> Duration {
        self.round_start
            .map(|start| start.elapsed())
            .unwrap_or_default()
    }

    /// Sleep out the rest of the round.
    ///
    /// Returns the pause taken, zero when the round overran. An overrun still
    /// yields to the scheduler once.
    pub async fn pace(&mut self) -> Duration {
        let elapsed = self.elapsed();
        let pause = pause_after(self.interval, elapsed);
        if pause.is_zero() {
            trace!(round = self.round, ?elapsed, "round overran interval, starting next immediately");
            task::yield_now().await;
        } else {
            time::sleep(pause).await;
        }
        pause
    }
}

impl Default for RoundClock {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}
