//! Field runtime - wires the topology into running units.

use std::collections::BTreeMap;

use sensorgrid_protocols::{
    exchange, termination, Coordinator, CoordinatorConfig, CoordinatorOutcome, GridNode,
    report_channel, NodeOutcome, ReportSender, Sampler,
};
use sensorgrid_topology::{GridShape, GridTopology, NodeId};
use tokio::io::AsyncWrite;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, FieldConfig};
use crate::error::Result;
use crate::output::write_reports;

/// What a finished unit hands back.
enum UnitOutcome {
    Node(NodeOutcome),
    Coordinator(CoordinatorOutcome),
}

/// Totals for a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSummary {
    pub shape: GridShape,
    /// Rounds each grid node completed
    pub node_rounds: BTreeMap<NodeId, u64>,
    /// Rounds the coordinator counted
    pub coordinator_rounds: u64,
    /// Grid nodes the termination marker was delivered to
    pub delivered: usize,
}

impl FieldSummary {
    fn new(shape: GridShape) -> Self {
        Self {
            shape,
            node_rounds: BTreeMap::new(),
            coordinator_rounds: 0,
            delivered: 0,
        }
    }
}

/// A validated sensor field, ready to run.
#[derive(Debug, Clone)]
pub struct Field {
    config: FieldConfig,
    topology: GridTopology,
}

impl Field {
    /// Validate `config` and build the topology. Nothing runs yet.
    pub fn new(config: FieldConfig) -> std::result::Result<Self, ConfigError> {
        let topology = config.validate()?;
        Ok(Self { config, topology })
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn topology(&self) -> &GridTopology {
        &self.topology
    }

    fn sampler_for(&self, node: NodeId) -> Sampler {
        match self.config.seed {
            Some(seed) => Sampler::for_node(seed, node),
            None => Sampler::from_entropy(),
        }
    }

    /// Spawn one task per grid node plus the coordinator and wait for all of
    /// them.
    ///
    /// Reports go to `reports`. If any unit fails the rest are aborted and the
    /// first error is returned.
    pub async fn run(self, reports: ReportSender) -> Result<FieldSummary> {
        let shape = self.topology.shape();
        info!(
            grid = %shape,
            units = shape.unit_count(),
            max_iterations = self.config.max_iterations,
            interval = ?self.config.interval,
            "starting sensor field"
        );

        let links = exchange::wire(&self.topology);
        let (broadcaster, listeners) = termination::channels(&self.topology);

        let mut units = JoinSet::new();
        for ((placement, links), listener) in self
            .topology
            .placements()
            .iter()
            .zip(links)
            .zip(listeners)
        {
            let node = GridNode::new(
                *placement,
                links,
                listener,
                self.sampler_for(placement.id),
                self.config.interval,
                reports.clone(),
            );
            units.spawn(async move { node.run().await.map(UnitOutcome::Node) });
        }

        let coordinator = Coordinator::new(
            self.topology.coordinator(),
            CoordinatorConfig::new(self.config.max_iterations).with_interval(self.config.interval),
            broadcaster,
            reports,
        )?;
        units.spawn(async move { coordinator.run().await.map(UnitOutcome::Coordinator) });
        debug!(spawned = units.len(), "all execution units spawned");

        let mut summary = FieldSummary::new(shape);
        while let Some(joined) = units.join_next().await {
            let outcome = match joined {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    warn!(error = %e, "execution unit failed, aborting field");
                    units.abort_all();
                    return Err(e.into());
                }
                Err(e) => {
                    warn!(error = %e, "execution unit panicked, aborting field");
                    units.abort_all();
                    return Err(e.into());
                }
            };
            match outcome {
                UnitOutcome::Node(n) => {
                    summary.node_rounds.insert(n.node, n.rounds);
                }
                UnitOutcome::Coordinator(c) => {
                    summary.coordinator_rounds = c.rounds;
                    summary.delivered = c.delivered;
                }
            }
        }

        info!(
            coordinator_rounds = summary.coordinator_rounds,
            delivered = summary.delivered,
            "sensor field finished"
        );
        Ok(summary)
    }

    /// Run the field and stream its reports to `out` in the configured format.
    ///
    /// Returns once every unit has finished and every report is written.
    pub async fn run_to<W>(self, out: W) -> Result<FieldSummary>
    where
        W: AsyncWrite + Unpin,
    {
        let format = self.config.format;
        let (tx, rx) = report_channel();
        let (summary, written) = tokio::join!(self.run(tx), write_reports(rx, format, out));
        let lines = written?;
        debug!(lines, "report stream closed");
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensorgrid_protocols::Report;
    use std::time::Duration;

    fn fast(rows: usize, cols: usize, rounds: u64) -> FieldConfig {
        FieldConfig::new(rows, cols, rounds)
            .with_interval(Duration::from_millis(100))
            .with_seed(7)
    }

    #[test]
    fn invalid_config_builds_nothing() {
        let err = Field::new(fast(2, 2, 3).with_units(4)).unwrap_err();
        assert!(matches!(err, ConfigError::Topology(_)));
    }

    #[test]
    fn topology_is_exposed() {
        let field = Field::new(fast(3, 2, 1)).unwrap();
        assert_eq!(field.topology().placements().len(), 6);
        assert_eq!(field.topology().coordinator(), NodeId(6));
        assert_eq!(field.config().max_iterations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn every_node_stops_after_coordinator() {
        let field = Field::new(fast(3, 3, 4)).unwrap();
        let (tx, mut rx) = report_channel();

        let summary = field.run(tx).await.unwrap();
        assert_eq!(summary.coordinator_rounds, 4);
        assert_eq!(summary.delivered, 9);
        assert_eq!(summary.node_rounds.len(), 9);
        for (node, rounds) in &summary.node_rounds {
            // At most one lag round past the coordinator.
            assert!((4..=5).contains(rounds), "node {node} ran {rounds} rounds");
        }

        let mut exits = 0;
        while let Ok(report) = rx.try_recv() {
            if matches!(report, Report::NodeExit { .. }) {
                exits += 1;
            }
        }
        assert_eq!(exits, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn run_to_streams_text() {
        let field = Field::new(fast(1, 2, 2)).unwrap();
        let mut out = Vec::new();
        let summary = field.run_to(&mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(summary.coordinator_rounds, 2);
        assert_eq!(text.lines().filter(|l| l.starts_with("coordinator round")).count(), 2);
        assert_eq!(text.lines().filter(|l| l.ends_with("exiting")).count(), 2);
        assert!(text.lines().any(|l| l == "coordinator exiting after 2 rounds"));
    }

    #[tokio::test(start_paused = true)]
    async fn single_cell_field_runs() {
        let field = Field::new(fast(1, 1, 2)).unwrap();
        let (tx, _rx) = report_channel();
        let summary = field.run(tx).await.unwrap();
        assert_eq!(summary.coordinator_rounds, 2);
        assert!((2..=3).contains(&summary.node_rounds[&NodeId(0)]));
    }
}
