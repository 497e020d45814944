//! Reports emitted by running units.
//!
//! Units never print directly. They push [`Report`]s into an unbounded
//! channel and whoever owns the receiving end decides how to render them.

use sensorgrid_topology::{GridCoord, NodeId};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::trace;

use crate::exchange::NeighborSnapshot;

/// Sending half every unit writes its reports to.
pub type ReportSender = mpsc::UnboundedSender<Report>;

/// Receiving half drained by the output writer.
pub type ReportReceiver = mpsc::UnboundedReceiver<Report>;

/// Create a report channel.
pub fn report_channel() -> (ReportSender, ReportReceiver) {
    mpsc::unbounded_channel()
}

/// Something a unit has to say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    /// A grid node finished a round.
    Round {
        round: u64,
        node: NodeId,
        coord: GridCoord,
        value: u8,
        neighbors: NeighborSnapshot,
        timestamp_ms: u64,
    },

    /// The coordinator counted a round.
    CoordinatorRound { round: u64 },

    /// A grid node stopped after seeing the termination marker.
    NodeExit {
        node: NodeId,
        coord: GridCoord,
        rounds: u64,
    },

    /// The coordinator delivered the marker everywhere and stopped.
    CoordinatorExit { rounds: u64, delivered: usize },
}

impl Report {
    /// Identity of the grid node this report is about, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::Round { node, .. } | Self::NodeExit { node, .. } => Some(*node),
            Self::CoordinatorRound { .. } | Self::CoordinatorExit { .. } => None,
        }
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Round {
                round,
                node,
                coord,
                value,
                neighbors,
                ..
            } => write!(
                f,
                "[{round}] {node}:({},{})|{value}|{neighbors}",
                coord.row, coord.col
            ),
            Self::CoordinatorRound { round } => write!(f, "coordinator round {round}"),
            Self::NodeExit { node, coord, .. } => write!(f, "node {node} {coord} exiting"),
            Self::CoordinatorExit { rounds, .. } => {
                write!(f, "coordinator exiting after {rounds} rounds")
            }
        }
    }
}

/// Push a report, ignoring a closed output.
pub(crate) fn emit(reports: &ReportSender, report: Report) {
    if let Err(e) = reports.send(report) {
        trace!(report = %e.0, "report output closed, dropping");
    }
}
