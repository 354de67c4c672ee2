//! redopctl - offline companion for the Redis operator.
//!
//! Renders the redis.conf artifact, normalizes resource quantities and reports
//! drift between a desired and an observed state, without a cluster.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod document;
mod error;
mod output;

use commands::Cli;
use config::{Config, LogFormat};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error::print_error(&e);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    if let Err(e) = cli.run(config) {
        let code = error::exit_code(&e);
        // The drift report has already been printed.
        if code != error::DRIFT_EXIT_CODE {
            error::print_error(&e);
        }
        std::process::exit(code);
    }

    Ok(())
}

/// Logs go to stderr so that rendered output on stdout stays pipeable.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
