//! Grid node - one sensor cell.
//!
//! Each round the node polls for the termination marker, samples a reading,
//! swaps it with its neighbors, reports, and sleeps out the rest of the
//! interval. The poll happens before sampling and never waits, so a node may
//! run one more round after the coordinator has finished if the marker lands
//! just after the check.

use std::time::Duration;

use sensorgrid_topology::{GridCoord, NodeId, NodePlacement};
use tracing::{debug, info};

use crate::error::Result;
use crate::exchange::ExchangeLinks;
use crate::reading::Sampler;
use crate::report::{emit, Report, ReportSender};
use crate::schedule::{RoundClock, RunState};
use crate::termination::{TerminationListener, TerminationStatus};

/// Final tally for one grid node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeOutcome {
    pub node: NodeId,
    pub coord: GridCoord,
    pub rounds: u64,
}

/// A running grid node. Owns everything it touches.
#[derive(Debug)]
pub struct GridNode {
    placement: NodePlacement,
    links: ExchangeLinks,
    termination: TerminationListener,
    sampler: Sampler,
    clock: RoundClock,
    reports: ReportSender,
    state: RunState,
}

impl GridNode {
    pub fn new(
        placement: NodePlacement,
        links: ExchangeLinks,
        termination: TerminationListener,
        sampler: Sampler,
        interval: Duration,
        reports: ReportSender,
    ) -> Self {
        debug_assert_eq!(links.node(), placement.id);
        debug_assert_eq!(termination.node(), placement.id);

        Self {
            placement,
            links,
            termination,
            sampler,
            clock: RoundClock::new(interval),
            reports,
            state: RunState::Running,
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.placement.id
    }

    #[inline]
    pub fn coord(&self) -> GridCoord {
        self.placement.coord
    }

    /// Rounds completed so far.
    pub fn rounds(&self) -> u64 {
        self.clock.round()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Take one round, or stop if the marker has arrived.
    pub async fn step(&mut self) -> Result<RunState> {
        if self.state == RunState::Stopped {
            return Ok(RunState::Stopped);
        }

        match self.termination.check() {
            TerminationStatus::Pending => {}
            TerminationStatus::Received | TerminationStatus::Orphaned => {
                self.state = RunState::Stopped;
                return Ok(self.state);
            }
        }

        let round = self.clock.begin();
        let reading = self.sampler.sample(self.placement.coord);
        let neighbors = self.links.exchange(round, reading.value).await?;

        emit(
            &self.reports,
            Report::Round {
                round,
                node: self.placement.id,
                coord: reading.coord,
                value: reading.value,
                neighbors,
                timestamp_ms: reading.timestamp_ms,
            },
        );

        self.clock.pace().await;
        Ok(self.state)
    }

    /// Run rounds until the marker arrives, then report the exit.
    pub async fn run(mut self) -> Result<NodeOutcome> {
        debug!(node = %self.id(), coord = %self.coord(), neighbors = self.links.active(), "grid node starting");

        while self.step().await? == RunState::Running {}

        let outcome = NodeOutcome {
            node: self.id(),
            coord: self.coord(),
            rounds: self.rounds(),
        };
        emit(
            &self.reports,
            Report::NodeExit {
                node: outcome.node,
                coord: outcome.coord,
                rounds: outcome.rounds,
            },
        );
        info!(node = %outcome.node, coord = %outcome.coord, rounds = outcome.rounds, "grid node exiting");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::wire;
    use crate::reading::MAX_READING;
    use crate::report::{report_channel, ReportReceiver};
    use crate::termination::channels;
    use futures::future::join_all;
    use sensorgrid_topology::GridTopology;

    const INTERVAL: Duration = Duration::from_millis(1000);

    fn build(
        rows: usize,
        cols: usize,
    ) -> (Vec<GridNode>, crate::termination::TerminationBroadcaster, ReportReceiver) {
        build_with(rows, cols, INTERVAL)
    }

    fn build_with(
        rows: usize,
        cols: usize,
        interval: Duration,
    ) -> (Vec<GridNode>, crate::termination::TerminationBroadcaster, ReportReceiver) {
        let topo = GridTopology::from_dimensions(rows, cols, rows * cols + 1).unwrap();
        let links = wire(&topo);
        let (broadcaster, listeners) = channels(&topo);
        let (tx, rx) = report_channel();
        let nodes = topo
            .placements()
            .iter()
            .zip(links)
            .zip(listeners)
            .map(|((p, l), t)| GridNode::new(*p, l, t, Sampler::for_node(9, p.id), interval, tx.clone()))
            .collect();
        (nodes, broadcaster, rx)
    }

    fn drain(rx: &mut ReportReceiver) -> Vec<Report> {
        let mut out = Vec::new();
        while let Ok(r) = rx.try_recv() {
            out.push(r);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn two_by_two_runs_exactly_until_marker() {
        let (mut nodes, broadcaster, mut rx) = build(2, 2);

        for _ in 0..3 {
            let states = join_all(nodes.iter_mut().map(|n| n.step())).await;
            assert!(states.into_iter().all(|s| s == Ok(RunState::Running)));
        }

        let outcome = broadcaster.broadcast().await;
        assert_eq!(outcome.delivered, 4);

        let states = join_all(nodes.iter_mut().map(|n| n.step())).await;
        assert!(states.into_iter().all(|s| s == Ok(RunState::Stopped)));

        let reports = drain(&mut rx);
        assert_eq!(reports.len(), 12);
        for node in 0..4 {
            let rounds: Vec<_> = reports
                .iter()
                .filter_map(|r| match r {
                    Report::Round { node: n, round, neighbors, value, .. } if n.index() == node => {
                        assert_eq!(neighbors.present_count(), 2);
                        assert!(*value <= MAX_READING);
                        Some(*round)
                    }
                    _ => None,
                })
                .collect();
            assert_eq!(rounds, vec![1, 2, 3]);
        }

        for n in &nodes {
            assert_eq!(n.rounds(), 3);
            assert_eq!(n.state(), RunState::Stopped);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn neighbor_values_are_the_posted_ones() {
        let (mut nodes, broadcaster, mut rx) = build(1, 2);
        join_all(nodes.iter_mut().map(|n| n.step())).await;

        let reports = drain(&mut rx);
        let value_of = |id: usize| {
            reports
                .iter()
                .find_map(|r| match r {
                    Report::Round { node, value, .. } if node.index() == id => Some(i32::from(*value)),
                    _ => None,
                })
                .unwrap()
        };
        let snap_of = |id: usize| {
            reports
                .iter()
                .find_map(|r| match r {
                    Report::Round { node, neighbors, .. } if node.index() == id => Some(neighbors.values()),
                    _ => None,
                })
                .unwrap()
        };
        assert_eq!(snap_of(0), [-1, value_of(1), -1, -1]);
        assert_eq!(snap_of(1), [-1, -1, -1, value_of(0)]);
        drop(broadcaster);
    }

    #[tokio::test]
    async fn lone_node_with_zero_interval_lets_others_run() {
        let (nodes, broadcaster, _rx) = build_with(1, 1, Duration::ZERO);
        let node = nodes.into_iter().next().unwrap();

        let running = tokio::spawn(node.run());
        tokio::task::yield_now().await;
        assert_eq!(broadcaster.broadcast().await.delivered, 1);

        let outcome = tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .expect("node never stopped")
            .unwrap()
            .unwrap();
        assert_eq!(outcome.node, NodeId(0));
    }

    #[tokio::test(start_paused = true)]
    async fn run_emits_exit_report() {
        let (nodes, broadcaster, mut rx) = build(1, 1);
        broadcaster.broadcast().await;

        let node = nodes.into_iter().next().unwrap();
        let outcome = node.run().await.unwrap();
        assert_eq!(outcome.rounds, 0);

        let reports = drain(&mut rx);
        assert_eq!(
            reports,
            vec![Report::NodeExit {
                node: NodeId(0),
                coord: GridCoord::ORIGIN,
                rounds: 0
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn lag_round_survives_departed_neighbor() {
        let (mut nodes, broadcaster, mut rx) = build(1, 2);
        join_all(nodes.iter_mut().map(|n| n.step())).await;

        broadcaster.broadcast().await;
        let right = nodes.pop().unwrap();
        let mut left = nodes.pop().unwrap();

        // Right stops and drops its links; left was already past its check
        // and still completes the round it is in.
        let right_outcome = right.run().await.unwrap();
        assert_eq!(right_outcome.rounds, 1);

        let clock_round = left.clock.begin();
        let snap = left.links.exchange(clock_round, 10).await.unwrap();
        assert_eq!(snap.present_count(), 0);

        assert_eq!(left.step().await, Ok(RunState::Stopped));
        drain(&mut rx);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_node_stays_stopped() {
        let (mut nodes, broadcaster, _rx) = build(1, 1);
        broadcaster.broadcast().await;
        let node = &mut nodes[0];
        assert_eq!(node.step().await, Ok(RunState::Stopped));
        assert_eq!(node.step().await, Ok(RunState::Stopped));
        assert_eq!(node.rounds(), 0);
    }
}
