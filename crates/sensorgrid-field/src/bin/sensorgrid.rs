//! Sensor grid launcher
//!
//! Runs one field to completion, reports on stdout and logs on stderr.

use std::time::Duration;

use clap::Parser;
use sensorgrid_field::{Field, FieldConfig, OutputFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "sensorgrid",
    version,
    about = "Run a grid of sensor nodes that exchange readings with their neighbors"
)]
struct Cli {
    /// Grid rows
    #[arg(env = "SENSORGRID_ROWS")]
    rows: usize,

    /// Grid columns
    #[arg(env = "SENSORGRID_COLS")]
    cols: usize,

    /// Rounds the coordinator counts before stopping the grid
    #[arg(env = "SENSORGRID_MAX_ITERATIONS")]
    max_iterations: u64,

    /// Execution units to launch with; must equal rows * cols + 1
    #[arg(long, env = "SENSORGRID_UNITS")]
    units: Option<usize>,

    /// Round length in milliseconds; must be at least 1
    #[arg(long, env = "SENSORGRID_INTERVAL_MS", default_value = "1000")]
    interval_ms: u64,

    /// Seed for reproducible readings
    #[arg(long, env = "SENSORGRID_SEED")]
    seed: Option<u64>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl Cli {
    fn into_config(self) -> FieldConfig {
        let mut config = FieldConfig::new(self.rows, self.cols, self.max_iterations)
            .with_interval(Duration::from_millis(self.interval_ms))
            .with_format(self.format);
        if let Some(units) = self.units {
            config = config.with_units(units);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sensorgrid=info,sensorgrid_field=info,sensorgrid_protocols=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let field = match Field::new(cli.into_config()) {
        Ok(field) => field,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(2);
        }
    };

    let summary = field.run_to(tokio::io::stdout()).await?;
    tracing::info!(
        grid = %summary.shape,
        coordinator_rounds = summary.coordinator_rounds,
        "all units exited"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use sensorgrid_field::{
        ENV_COLS, ENV_INTERVAL_MS, ENV_MAX_ITERATIONS, ENV_ROWS, ENV_SEED, ENV_UNITS,
    };

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn every_setting_has_an_env_fallback() {
        let cmd = Cli::command();
        let env_of = |id: &str| {
            cmd.get_arguments()
                .find(|a| a.get_id() == id)
                .and_then(|a| a.get_env())
                .map(|e| e.to_string_lossy().into_owned())
        };
        assert_eq!(env_of("rows").as_deref(), Some(ENV_ROWS));
        assert_eq!(env_of("cols").as_deref(), Some(ENV_COLS));
        assert_eq!(env_of("max_iterations").as_deref(), Some(ENV_MAX_ITERATIONS));
        assert_eq!(env_of("units").as_deref(), Some(ENV_UNITS));
        assert_eq!(env_of("interval_ms").as_deref(), Some(ENV_INTERVAL_MS));
        assert_eq!(env_of("seed").as_deref(), Some(ENV_SEED));
    }

    #[test]
    fn positionals_build_the_config() {
        let cli = Cli::try_parse_from(["sensorgrid", "3", "4", "7", "--seed", "5", "--format", "json"]).unwrap();
        let config = cli.into_config();
        assert_eq!((config.rows, config.cols, config.max_iterations), (3, 4, 7));
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.interval, Duration::from_millis(1000));
    }
}
