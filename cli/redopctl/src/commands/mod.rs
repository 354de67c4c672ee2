//! CLI commands.

mod diff;
mod normalize;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::output::OutputFormat;

/// redopctl - Render, normalize and diff Redis operator desired state offline.
#[derive(Debug, Parser)]
#[command(name = "redopctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (text or json).
    #[arg(long, global = true, default_value = "text", env = "REDOP_OUTPUT")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render the redis.conf artifact for a desired state.
    Render(render::RenderCommand),

    /// Print the canonical form of a desired state's resources.
    Normalize(normalize::NormalizeCommand),

    /// Compare desired against observed state and report drift.
    Diff(diff::DiffCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub fn run(self, config: Config) -> Result<()> {
        let ctx = CommandContext {
            config,
            format: OutputFormat::from_flag(&self.format),
        };

        match self.command {
            Commands::Render(cmd) => cmd.run(ctx),
            Commands::Normalize(cmd) => cmd.run(ctx),
            Commands::Diff(cmd) => cmd.run(ctx),
            Commands::Version => {
                println!("redopctl {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub config: Config,
    pub format: OutputFormat,
}
