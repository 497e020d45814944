//! Sensor Field Runtime
//!
//! Runs a rows × cols grid of sensor nodes plus one coordinator, each as its
//! own task, and streams what they report.
//!
//! # Architecture
//!
//! - **Config**: dimensions, round count, unit count and seed, validated
//!   before anything starts
//! - **Field**: wires neighbor links and termination channels, spawns every
//!   unit, collects their outcomes
//! - **Output**: renders reports as text lines or JSON lines
//!
//! # Usage
//!
//! ```ignore
//! let config = FieldConfig::new(2, 2, 3).with_seed(42);
//! let summary = Field::new(config)?.run_to(tokio::io::stdout()).await?;
//! ```

mod config;
mod error;
mod field;
mod output;

pub use config::{
    ConfigError, FieldConfig, OutputFormat, ENV_COLS, ENV_INTERVAL_MS, ENV_MAX_ITERATIONS, ENV_ROWS,
    ENV_SEED, ENV_UNITS,
};
pub use error::{FieldError, Result};
pub use field::{Field, FieldSummary};
pub use output::{render, write_reports};
