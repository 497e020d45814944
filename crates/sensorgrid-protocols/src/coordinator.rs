//! Coordinator - counts rounds, then tells every grid node to stop.
//!
//! The coordinator runs the same paced loop as a grid node but its only
//! work is counting. Once the count reaches the configured number of rounds
//! it fans the termination marker out to every grid node, waits for all
//! sends to complete, reports, and exits.
//!
//! # Lifecycle
//!
//! 1. **Running**: one paced round per interval, `max_iterations` times
//! 2. **Broadcast**: one-shot marker to every grid node, no per-node ack
//! 3. **Stopped**: exit report once every send is confirmed

use std::time::Duration;

use sensorgrid_topology::NodeId;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::report::{emit, Report, ReportSender};
use crate::schedule::{RoundClock, RunState, DEFAULT_INTERVAL};
use crate::termination::TerminationBroadcaster;

/// Configuration for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Rounds to count before broadcasting the marker.
    pub max_iterations: u64,

    /// Target round length.
    pub interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl CoordinatorConfig {
    #[must_use]
    pub fn new(max_iterations: u64) -> Self {
        Self {
            max_iterations,
            ..Default::default()
        }
    }

    /// Set the round interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Final tally for the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorOutcome {
    pub rounds: u64,
    pub delivered: usize,
    pub unreachable: Vec<NodeId>,
}

/// The single coordinating unit.
#[derive(Debug)]
pub struct Coordinator {
    id: NodeId,
    config: CoordinatorConfig,
    clock: RoundClock,
    broadcaster: TerminationBroadcaster,
    reports: ReportSender,
    state: RunState,
}

impl Coordinator {
    /// Create a coordinator.
    ///
    /// Fails if asked to run zero rounds.
    pub fn new(
        id: NodeId,
        config: CoordinatorConfig,
        broadcaster: TerminationBroadcaster,
        reports: ReportSender,
    ) -> Result<Self> {
        if config.max_iterations == 0 {
            return Err(Error::NoRounds);
        }

        debug!(
            coordinator = %id,
            max_iterations = config.max_iterations,
            interval = ?config.interval,
            grid_nodes = broadcaster.len(),
            "created coordinator"
        );

        Ok(Self {
            id,
            clock: RoundClock::new(config.interval),
            config,
            broadcaster,
            reports,
            state: RunState::Running,
        })
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Rounds counted so far.
    pub fn rounds(&self) -> u64 {
        self.clock.round()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Count one paced round. Returns `Stopped` once the budget is spent.
    pub async fn step(&mut self) -> RunState {
        if self.clock.round() >= self.config.max_iterations {
            self.state = RunState::Stopped;
            return self.state;
        }

        let round = self.clock.begin();
        debug!(round, "coordinator round");
        emit(&self.reports, Report::CoordinatorRound { round });
        self.clock.pace().await;

        if round == self.config.max_iterations {
            self.state = RunState::Stopped;
        }
        self.state
    }

    /// Run every round, broadcast the marker, and exit.
    pub async fn run(mut self) -> Result<CoordinatorOutcome> {
        while self.step().await == RunState::Running {}

        let rounds = self.clock.round();
        let Self {
            broadcaster,
            reports,
            ..
        } = self;

        let sent = broadcaster.broadcast().await;
        emit(
            &reports,
            Report::CoordinatorExit {
                rounds,
                delivered: sent.delivered,
            },
        );
        info!(rounds, delivered = sent.delivered, "coordinator exiting");

        Ok(CoordinatorOutcome {
            rounds,
            delivered: sent.delivered,
            unreachable: sent.unreachable,
        })
    }
}
