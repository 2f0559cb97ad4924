// Projection entry point.
//
// Run sequence:
// 1. Initialize tracing (stderr)
// 2. Parse CLI flags into a ProjectionConfig
// 3. For each supplied input table: load, consolidate, project, emit

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};

use capuchin::cli::Cli;
use capuchin::config::ProjectionConfig;
use capuchin::engine::{self, ProjectionError};
use capuchin::loader::{Role, SeasonTable};
use capuchin::matrix;
use capuchin::output;

fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let config = cli.to_config().context("invalid projection options")?;
    info!("projecting year {}", config.year);

    if cli.batter_in.is_none() && cli.pitcher_in.is_none() {
        bail!("no input tables; pass --batter-in and/or --pitcher-in");
    }

    if let Some(path) = &cli.batter_in {
        run_table(path, Role::Batting, &config, cli.batter_out.as_deref())?;
    }
    if let Some(path) = &cli.pitcher_in {
        run_table(path, Role::Pitching, &config, cli.pitcher_out.as_deref())?;
    }

    Ok(())
}

/// Load one season table, project it, and emit the forecast.
fn run_table(
    input: &PathBuf,
    expected_role: Role,
    config: &ProjectionConfig,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let table = SeasonTable::from_path(input)
        .with_context(|| format!("failed to load {}", input.display()))?;
    if table.role() != expected_role {
        bail!(
            "{} classified as a {} table, expected {}",
            input.display(),
            table.role(),
            expected_role
        );
    }
    info!(
        "loaded {} table from {}: {} players",
        table.role(),
        input.display(),
        table.players().len()
    );

    let consolidated = matrix::consolidate(&table).context("consolidation failed")?;

    let forecast = match engine::project(&consolidated, config, config.year) {
        Ok(Some(forecast)) => forecast,
        Ok(None) => {
            warn!(
                "{}: no history in the weighted window before {}; nothing to emit",
                input.display(),
                config.year
            );
            return Ok(());
        }
        // The pitching side has a contract but no numeric policy yet; a
        // missing pitching forecast must not sink the batting run.
        Err(ProjectionError::PitchingUnimplemented) => {
            warn!("{}: pitching projection is not implemented yet; skipping", input.display());
            return Ok(());
        }
        Err(e) => return Err(e).context("projection failed"),
    };

    match out {
        Some(path) => {
            output::write_forecast_to_path(&forecast, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("wrote forecast to {}", path.display());
        }
        None => {
            output::write_forecast(&forecast, std::io::stdout().lock())
                .context("failed to write forecast to stdout")?;
        }
    }
    Ok(())
}

/// Initialize tracing to stderr, leaving stdout for forecast emission.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("capuchin=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}
