//! Helpers shared by the end-to-end scenarios under `tests/`.

use std::collections::BTreeMap;
use std::time::Duration;

use sensorgrid_field::{Field, FieldConfig, FieldSummary, Result};
use sensorgrid_protocols::{report_channel, NeighborSnapshot, Report};
use sensorgrid_topology::NodeId;

/// Round length used by scenarios. Time is paused in tests, so only the
/// ordering matters.
pub const SCENARIO_INTERVAL: Duration = Duration::from_millis(1000);

/// A seeded config with the scenario interval.
pub fn scenario(rows: usize, cols: usize, max_iterations: u64) -> FieldConfig {
    FieldConfig::new(rows, cols, max_iterations)
        .with_interval(SCENARIO_INTERVAL)
        .with_seed(0x5e45)
}

/// Everything a run reported, in arrival order.
#[derive(Debug, Default)]
pub struct Transcript {
    pub reports: Vec<Report>,
}

/// One node's view of a single round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundLine {
    pub round: u64,
    pub value: u8,
    pub neighbors: NeighborSnapshot,
}

impl Transcript {
    /// Round lines grouped by node, in round order.
    pub fn rounds_by_node(&self) -> BTreeMap<NodeId, Vec<RoundLine>> {
        let mut out: BTreeMap<NodeId, Vec<RoundLine>> = BTreeMap::new();
        for report in &self.reports {
            if let Report::Round {
                round,
                node,
                value,
                neighbors,
                ..
            } = report
            {
                out.entry(*node).or_default().push(RoundLine {
                    round: *round,
                    value: *value,
                    neighbors: *neighbors,
                });
            }
        }
        out
    }

    /// Value `node` read in `round`, if it reported one.
    pub fn value_at(&self, node: NodeId, round: u64) -> Option<u8> {
        self.reports.iter().find_map(|r| match r {
            Report::Round {
                round: r_round,
                node: r_node,
                value,
                ..
            } if *r_node == node && *r_round == round => Some(*value),
            _ => None,
        })
    }

    /// Number of reports matching `pred`.
    pub fn count(&self, pred: impl Fn(&Report) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(r)).count()
    }
}

/// Run `config` to completion and collect every report.
pub async fn run_scenario(config: FieldConfig) -> Result<(FieldSummary, Transcript)> {
    let field = Field::new(config)?;
    let (tx, mut rx) = report_channel();
    let summary = field.run(tx).await?;

    let mut transcript = Transcript::default();
    while let Some(report) = rx.recv().await {
        transcript.reports.push(report);
    }
    Ok((summary, transcript))
}
