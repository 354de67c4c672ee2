//! Render command.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use redop_reconcile::{DesiredState, SpecHash, SPEC_HASH_ANNOTATION};
use redop_redis_config::{Address, ConfigRenderer};
use serde::Serialize;
use tracing::info;

use crate::document::load_desired;
use crate::output::{print_json, OutputFormat};

use super::CommandContext;

/// Render the redis.conf artifact.
#[derive(Debug, Args)]
pub struct RenderCommand {
    /// Desired state document (TOML, or JSON for .json files).
    #[arg(long, value_name = "PATH")]
    desired: PathBuf,

    /// Current master address (host:port).
    #[arg(long, env = "REDOP_MASTER", value_name = "ADDR")]
    master: Address,
}

#[derive(Debug, Serialize)]
struct RenderOutput<'a> {
    key: &'a str,
    content: &'a str,
    content_hash: String,
    annotations: BTreeMap<&'static str, String>,
}

impl RenderCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let desired: DesiredState = load_desired(&self.desired)?.into();

        let renderer = ConfigRenderer::new(ctx.config.render.clone());
        let artifact = renderer.render(desired.config.iter().flatten(), &self.master);
        let spec_hash = SpecHash::compute(&artifact, &desired.resources);

        info!(
            path = %self.desired.display(),
            master = %self.master,
            spec_hash = %spec_hash,
            "Rendered desired configuration"
        );

        match ctx.format {
            OutputFormat::Json => print_json(&RenderOutput {
                key: artifact.key(),
                content: artifact.content(),
                content_hash: artifact.content_hash(),
                annotations: BTreeMap::from([(SPEC_HASH_ANNOTATION, spec_hash.to_string())]),
            }),
            OutputFormat::Text => print!("{}", artifact.content()),
        }

        Ok(())
    }
}
