//! Neighbor Exchange Protocol - per-round value swap with the four neighbors.
//!
//! Every present neighbor pair is joined by two bounded channels, one per
//! direction. In round `r` a node posts `(r, value)` on all of its outbound
//! links at once and then waits on all of its inbound links. It cannot
//! report until every present neighbor has posted round `r`, which gives a
//! barrier scoped to the node's own exchange group rather than the whole
//! grid.
//!
//! # Slot layout
//!
//! Results land in a [`NeighborSnapshot`] in clockwise order from above
//! (up, right, down, left). Absent neighbors keep [`SENTINEL`] and never
//! touch a channel.
//!
//! # Departed neighbors
//!
//! A node that observed the termination marker drops its links. A neighbor
//! still running its lag round then sees the inbound link close: that slot
//! stays at the sentinel for the round and the link is retired.

use futures::future::join_all;
use sensorgrid_topology::{Direction, GridTopology, Neighbors, NodeId, NEIGHBOR_SLOTS};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Slot value for "no neighbor in this direction".
pub const SENTINEL: i32 = -1;

/// Inbound buffer per link.
///
/// A node can be at most one round ahead of a neighbor it exchanges with, so
/// two postings fit: the one the neighbor hasn't consumed yet and ours for
/// the next round.
pub const EXCHANGE_DEPTH: usize = 2;

/// A value posted to one neighbor for one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub round: u64,
    pub value: u8,
}

/// Neighbor values gathered in one round, clockwise from up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NeighborSnapshot([i32; NEIGHBOR_SLOTS]);

impl NeighborSnapshot {
    /// All sentinels.
    pub const EMPTY: Self = Self([SENTINEL; NEIGHBOR_SLOTS]);

    pub fn set(&mut self, direction: Direction, value: u8) {
        self.0[direction.index()] = i32::from(value);
    }

    pub fn get(&self, direction: Direction) -> i32 {
        self.0[direction.index()]
    }

    /// Raw slots in clockwise order.
    pub fn values(&self) -> [i32; NEIGHBOR_SLOTS] {
        self.0
    }

    /// Number of slots holding a real value.
    pub fn present_count(&self) -> usize {
        self.0.iter().filter(|&&v| v != SENTINEL).count()
    }
}

impl Default for NeighborSnapshot {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl std::fmt::Display for NeighborSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [up, right, down, left] = self.0;
        write!(f, "{up},{right},{down},{left}")
    }
}

/// Both halves of the connection to one neighbor.
#[derive(Debug)]
struct Link {
    peer: NodeId,
    outbound: mpsc::Sender<Posting>,
    inbound: mpsc::Receiver<Posting>,
}

/// A node's links to its neighbors, one optional slot per direction.
#[derive(Debug, Default)]
pub struct ExchangeLinks {
    node: NodeId,
    slots: [Option<Link>; NEIGHBOR_SLOTS],
}

impl ExchangeLinks {
    /// Identity of the node owning these links.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Neighbors that are still linked.
    pub fn peers(&self) -> Neighbors {
        let mut slots = [None; NEIGHBOR_SLOTS];
        for (slot, link) in slots.iter_mut().zip(&self.slots) {
            *slot = link.as_ref().map(|l| l.peer);
        }
        Neighbors::new(slots)
    }

    /// Number of live links.
    pub fn active(&self) -> usize {
        self.slots.iter().filter(|l| l.is_some()).count()
    }

    /// Run one round of the exchange.
    ///
    /// Posts `value` to every linked neighbor, then waits until each of them
    /// has posted its own value for `round`.
    pub async fn exchange(&mut self, round: u64, value: u8) -> Result<NeighborSnapshot> {
        let posting = Posting { round, value };
        let node = self.node;

        let posted = join_all(self.slots.iter().map(|slot| async move {
            match slot {
                Some(link) => link.outbound.send(posting).await.is_ok(),
                None => true,
            }
        }))
        .await;
        for (dir, ok) in Direction::ALL.into_iter().zip(posted) {
            if !ok {
                trace!(node = %node, round, direction = %dir, "neighbor gone before our posting");
            }
        }

        let received = join_all(self.slots.iter_mut().map(|slot| async move {
            match slot {
                Some(link) => Some((link.peer, link.inbound.recv().await)),
                None => None,
            }
        }))
        .await;

        let mut snapshot = NeighborSnapshot::EMPTY;
        for (dir, outcome) in Direction::ALL.into_iter().zip(received) {
            match outcome {
                None => {}
                Some((_, Some(p))) if p.round == round => snapshot.set(dir, p.value),
                Some((peer, Some(p))) => {
                    return Err(Error::RoundMismatch {
                        node,
                        peer,
                        expected: round,
                        actual: p.round,
                    });
                }
                Some((peer, None)) => {
                    debug!(node = %node, peer = %peer, round, direction = %dir, "neighbor departed, retiring link");
                    self.slots[dir.index()] = None;
                }
            }
        }

        trace!(node = %node, round, value, %snapshot, "exchange complete");
        Ok(snapshot)
    }
}

/// Build the links for every grid node of `topology`, indexed by identity.
///
/// For each present neighbor pair two channels are created, so every node
/// owns the sending half towards each neighbor and the receiving half from it.
pub fn wire(topology: &GridTopology) -> Vec<ExchangeLinks> {
    let n = topology.placements().len();
    let mut outbound: Vec<[Option<mpsc::Sender<Posting>>; NEIGHBOR_SLOTS]> =
        (0..n).map(|_| Default::default()).collect();
    let mut inbound: Vec<[Option<mpsc::Receiver<Posting>>; NEIGHBOR_SLOTS]> =
        (0..n).map(|_| Default::default()).collect();

    for p in topology.placements() {
        for (dir, peer) in p.neighbors.present() {
            let (tx, rx) = mpsc::channel(EXCHANGE_DEPTH);
            outbound[p.id.index()][dir.index()] = Some(tx);
            // The peer reads it from the slot pointing back at us.
            inbound[peer.index()][dir.opposite().index()] = Some(rx);
        }
    }

    topology
        .placements()
        .iter()
        .map(|p| {
            let mut links = ExchangeLinks {
                node: p.id,
                ..Default::default()
            };
            for (dir, peer) in p.neighbors.present() {
                let tx = outbound[p.id.index()][dir.index()].take();
                let rx = inbound[p.id.index()][dir.index()].take();
                if let (Some(outbound), Some(inbound)) = (tx, rx) {
                    links.slots[dir.index()] = Some(Link {
                        peer,
                        outbound,
                        inbound,
                    });
                }
            }
            links
        })
        .collect()
}
