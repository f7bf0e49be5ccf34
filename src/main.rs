//! Tenderplan command-line entry point

use std::{io, process::ExitCode, time::Instant};

use anyhow::Context;
use humanize_duration::{Truncate, prelude::DurationExt};
use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter, Registry,
    layer::{Layer, SubscriberExt},
    util::{SubscriberInitExt, TryInitError},
};

use tenderplan::{
    config::{Config, LogFormat, LoggingConfig},
    input, pricing,
    receipt::PaymentTotals,
    solvers::backtracking::{BacktrackingSolver, TracingObserver},
};

fn main() -> ExitCode {
    let config = Config::load().unwrap_or_else(|err| err.exit());

    if let Err(err) = init_subscriber(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialise, stderr is all that is left"
        )]
        {
            eprintln!("Logging error: {err}");
        }

        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = ?err, "run failed");

            #[expect(
                clippy::print_stderr,
                reason = "the error must reach the user whatever the log level"
            )]
            {
                eprintln!("Error: {err:#}");
            }

            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    let currency = pricing::currency(&config.currency)?;

    let orders = input::load_orders(&config.orders)
        .with_context(|| format!("loading orders from {}", config.orders.display()))?;

    let instruments = input::load_instruments(&config.instruments).with_context(|| {
        format!(
            "loading payment methods from {}",
            config.instruments.display()
        )
    })?;

    let batch = input::build(&orders, &instruments, &config.points_id, currency)
        .context("invalid input")?;

    info!(
        orders = batch.orders.len(),
        instruments = batch.catalog.len(),
        currency = currency.iso_alpha_code,
        "input loaded"
    );

    let started = Instant::now();

    let report =
        BacktrackingSolver::solve_with_stats(&batch.orders, &batch.catalog, &mut TracingObserver)?;

    let elapsed = started.elapsed();

    info!(
        branches = report.stats.branches,
        leaves = report.stats.leaves,
        dead_ends = report.stats.dead_ends,
        complete = report.solution.is_complete(),
        elapsed = %elapsed.human(Truncate::Nano),
        "search finished"
    );

    let totals = PaymentTotals::from_solution(&report.solution, &batch.catalog)?;
    let out = io::stdout().lock();

    if config.table {
        totals.write_table(out)?;
    } else {
        totals.write_to(out)?;
    }

    Ok(())
}

fn init_subscriber(config: &LoggingConfig) -> Result<(), TryInitError> {
    match config.log_format {
        LogFormat::Compact => init_with_layer(
            config,
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_target(true),
        ),
        LogFormat::Json => init_with_layer(
            config,
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true),
        ),
    }
}

fn init_with_layer<L>(config: &LoggingConfig, fmt_layer: L) -> Result<(), TryInitError>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    let filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_err| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
}
