//! Sensor readings.
//!
//! A reading lives for exactly one round: it is sampled, posted to the
//! neighbors, reported, and dropped. Nothing keeps a history.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sensorgrid_topology::{GridCoord, NodeId};
use serde::Serialize;

/// Smallest value a sensor can report.
pub const MIN_READING: u8 = 0;

/// Largest value a sensor can report.
pub const MAX_READING: u8 = 100;

/// One round's sample from one grid node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reading {
    /// Sampled value in `[MIN_READING, MAX_READING]`
    pub value: u8,
    /// Where it was taken
    pub coord: GridCoord,
    /// Wall-clock time of sampling, milliseconds since the Unix epoch
    pub timestamp_ms: u64,
}

/// Per-node source of readings.
#[derive(Debug)]
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    /// Deterministic sampler for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Deterministic sampler for one node of a seeded run.
    ///
    /// Mixes the node identity into the run seed so neighbors don't sample in
    /// lockstep.
    pub fn for_node(seed: u64, node: NodeId) -> Self {
        Self::seeded(seed.wrapping_add(node.index() as u64))
    }

    /// Sampler seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Draw a value uniformly from `[MIN_READING, MAX_READING]`.
    pub fn sample_value(&mut self) -> u8 {
        self.rng.gen_range(MIN_READING..=MAX_READING)
    }

    /// Take a full reading at `coord`.
    pub fn sample(&mut self, coord: GridCoord) -> Reading {
        Reading {
            value: self.sample_value(),
            coord,
            timestamp_ms: now_ms(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
