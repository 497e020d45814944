//! Termination Protocol - one-shot stop marker from the coordinator.
//!
//! Each grid node owns a single-slot inbox fed only by the coordinator. The
//! coordinator fans the marker out to every inbox without waiting for any
//! node to act on it, then waits until all sends have completed. Grid nodes
//! poll their inbox once per round with `try_recv`, so checking never blocks
//! a round.

use futures::future::join_all;
use sensorgrid_topology::{GridTopology, NodeId};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, warn};

/// Byte identifying a genuine termination signal.
pub const TERMINATION_MARKER: u8 = b't';

/// Payload sent from the coordinator to a grid node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationSignal(pub u8);

impl TerminationSignal {
    /// The stop signal.
    pub const STOP: Self = Self(TERMINATION_MARKER);

    #[inline]
    pub fn is_marker(&self) -> bool {
        self.0 == TERMINATION_MARKER
    }
}

/// Result of a non-blocking termination check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStatus {
    /// No marker yet, keep running.
    Pending,
    /// The marker has arrived.
    Received,
    /// The coordinator is gone without sending a marker.
    Orphaned,
}

/// Grid-node side: polls for the marker.
#[derive(Debug)]
pub struct TerminationListener {
    node: NodeId,
    rx: mpsc::Receiver<TerminationSignal>,
    observed: bool,
}

impl TerminationListener {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Check for the marker without waiting.
    ///
    /// Signals that don't carry the marker are discarded. Once the marker has
    /// been seen every later check reports [`TerminationStatus::Received`].
    pub fn check(&mut self) -> TerminationStatus {
        if self.observed {
            return TerminationStatus::Received;
        }
        loop {
            match self.rx.try_recv() {
                Ok(signal) if signal.is_marker() => {
                    self.observed = true;
                    return TerminationStatus::Received;
                }
                Ok(signal) => {
                    debug!(node = %self.node, byte = signal.0, "ignoring non-marker signal");
                }
                Err(TryRecvError::Empty) => return TerminationStatus::Pending,
                Err(TryRecvError::Disconnected) => {
                    warn!(node = %self.node, "coordinator gone without a termination marker");
                    return TerminationStatus::Orphaned;
                }
            }
        }
    }
}

/// What the coordinator's fan-out achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Inboxes the marker was delivered to.
    pub delivered: usize,
    /// Nodes whose inbox was already closed.
    pub unreachable: Vec<NodeId>,
}

/// Coordinator side: holds one sender per grid node.
#[derive(Debug, Default)]
pub struct TerminationBroadcaster {
    targets: Vec<(NodeId, mpsc::Sender<TerminationSignal>)>,
}

impl TerminationBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a linked inbox for `node`.
    pub fn subscribe(&mut self, node: NodeId) -> TerminationListener {
        let (tx, rx) = mpsc::channel(1);
        self.targets.push((node, tx));
        TerminationListener {
            node,
            rx,
            observed: false,
        }
    }

    /// Number of grid nodes that will receive the marker.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Send the marker to every node and wait for all sends to complete.
    ///
    /// Consumes the broadcaster: the marker is one-shot.
    pub async fn broadcast(self) -> BroadcastOutcome {
        let sends = self.targets.iter().map(|(node, tx)| async move {
            (*node, tx.send(TerminationSignal::STOP).await.is_ok())
        });

        let mut outcome = BroadcastOutcome::default();
        for (node, ok) in join_all(sends).await {
            if ok {
                outcome.delivered += 1;
            } else {
                warn!(node = %node, "termination marker undeliverable, node already gone");
                outcome.unreachable.push(node);
            }
        }
        debug!(delivered = outcome.delivered, "termination marker fanned out");
        outcome
    }
}

/// Create the broadcaster and one listener per grid node, indexed by identity.
pub fn channels(topology: &GridTopology) -> (TerminationBroadcaster, Vec<TerminationListener>) {
    let mut broadcaster = TerminationBroadcaster::new();
    let listeners = topology
        .node_ids()
        .map(|id| broadcaster.subscribe(id))
        .collect();
    (broadcaster, listeners)
}
