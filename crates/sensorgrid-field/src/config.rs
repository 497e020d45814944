//! Field configuration and validation.

use std::time::Duration;

use sensorgrid_protocols::DEFAULT_INTERVAL;
use sensorgrid_topology::{GridShape, GridTopology, TopologyError};
use thiserror::Error;

/// How reports are written to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line per report
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Invalid configuration. Fatal before any unit starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Bad grid dimensions or execution-unit count.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// `max_iterations` was zero.
    #[error("max_iterations must be larger than 0")]
    NoIterations,

    /// The round interval was zero.
    #[error("interval must be larger than 0")]
    ZeroInterval,

    /// An environment variable held something unparseable.
    #[error("invalid {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Environment variables read by [`FieldConfig::from_env`].
pub const ENV_ROWS: &str = "SENSORGRID_ROWS";
pub const ENV_COLS: &str = "SENSORGRID_COLS";
pub const ENV_MAX_ITERATIONS: &str = "SENSORGRID_MAX_ITERATIONS";
pub const ENV_UNITS: &str = "SENSORGRID_UNITS";
pub const ENV_INTERVAL_MS: &str = "SENSORGRID_INTERVAL_MS";
pub const ENV_SEED: &str = "SENSORGRID_SEED";

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
    }
}

/// Everything needed to run a sensor field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConfig {
    /// Grid rows
    pub rows: usize,

    /// Grid columns
    pub cols: usize,

    /// Rounds the coordinator counts before stopping the grid
    pub max_iterations: u64,

    /// Execution units supplied by the launcher; `None` means "exactly as
    /// many as the grid needs"
    pub units: Option<usize>,

    /// Target round length
    pub interval: Duration,

    /// Seed for reproducible readings; entropy when `None`
    pub seed: Option<u64>,

    /// Output rendering
    pub format: OutputFormat,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            rows: 2,
            cols: 2,
            max_iterations: 3,
            units: None,
            interval: DEFAULT_INTERVAL,
            seed: None,
            format: OutputFormat::Text,
        }
    }
}

impl FieldConfig {
    /// Config for a `rows × cols` grid running `max_iterations` rounds.
    #[must_use]
    pub fn new(rows: usize, cols: usize, max_iterations: u64) -> Self {
        Self {
            rows,
            cols,
            max_iterations,
            ..Default::default()
        }
    }

    /// Config from `SENSORGRID_*` environment variables, defaults for the rest.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(rows) = parse_var(&lookup, ENV_ROWS)? {
            config.rows = rows;
        }
        if let Some(cols) = parse_var(&lookup, ENV_COLS)? {
            config.cols = cols;
        }
        if let Some(max) = parse_var(&lookup, ENV_MAX_ITERATIONS)? {
            config.max_iterations = max;
        }
        config.units = parse_var(&lookup, ENV_UNITS)?;
        if let Some(ms) = parse_var(&lookup, ENV_INTERVAL_MS)? {
            config.interval = Duration::from_millis(ms);
        }
        config.seed = parse_var(&lookup, ENV_SEED)?;
        Ok(config)
    }

    /// Set the execution-unit count supplied by the launcher.
    #[must_use]
    pub fn with_units(mut self, units: usize) -> Self {
        self.units = Some(units);
        self
    }

    /// Set the round interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Seed the readings.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Validate and build the topology.
    ///
    /// Checks run in the order an operator would fix them: dimensions, rounds,
    /// then the unit count.
    pub fn validate(&self) -> Result<GridTopology, ConfigError> {
        let shape = GridShape::new(self.rows, self.cols)?;
        if self.max_iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        let units = self.units.unwrap_or(shape.unit_count());
        Ok(GridTopology::new(shape, units)?)
    }
}
