//! Diff command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use redop_reconcile::{assess, Assessment, DesiredState, DriftAspect, ObservedState};
use redop_redis_config::{Address, ConfigRenderer};
use redop_resources::ResourceSpec;
use serde::Serialize;
use tabled::Tabled;
use tracing::info;

use crate::document::{load_desired, load_document, ObservedDocument};
use crate::error::CliError;
use crate::output::{
    print_info, print_json, print_success, print_table, print_warning, OutputFormat,
};

use super::CommandContext;

/// Compare desired against observed state.
#[derive(Debug, Args)]
pub struct DiffCommand {
    /// Desired state document (TOML, or JSON for .json files).
    #[arg(long, value_name = "PATH")]
    desired: PathBuf,

    /// Observed state document (TOML, or JSON for .json files).
    #[arg(long, value_name = "PATH")]
    observed: PathBuf,

    /// Current master address (host:port).
    #[arg(long, env = "REDOP_MASTER", value_name = "ADDR")]
    master: Address,

    /// Exit with status 2 when drift is found.
    #[arg(long)]
    exit_code: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
struct AspectRow {
    #[tabled(rename = "Aspect")]
    aspect: &'static str,

    #[tabled(rename = "Status")]
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct DiffOutput<'a> {
    needs_update: bool,
    drifted: Vec<&'static str>,
    spec_hash: &'a str,
    artifact_key: &'a str,
    content: &'a str,
    resources: &'a ResourceSpec,
}

impl DiffCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let desired: DesiredState = load_desired(&self.desired)?.into();
        let observed: ObservedState = load_document::<ObservedDocument>(&self.observed)?.into();

        let renderer = ConfigRenderer::new(ctx.config.render.clone());
        let assessment = assess(&renderer, &desired, &self.master, &observed);

        info!(
            desired = %self.desired.display(),
            observed = %self.observed.display(),
            needs_update = assessment.needs_update(),
            "Assessed drift"
        );

        match ctx.format {
            OutputFormat::Json => print_json(&diff_output(&assessment)),
            OutputFormat::Text => {
                print_table(&aspect_rows(&assessment));
                if assessment.needs_update() {
                    print_warning(&drift_summary(&assessment));
                    if assessment.drift.is_drifted(DriftAspect::Config) {
                        print_info(&format!(
                            "Desired {}:\n{}",
                            assessment.artifact.key(),
                            assessment.artifact.content()
                        ));
                    }
                } else {
                    print_success("Observed state matches; nothing to update.");
                }
            }
        }

        if self.exit_code && assessment.needs_update() {
            return Err(CliError::Drift(drift_summary(&assessment)).into());
        }

        Ok(())
    }
}

fn aspect_rows(assessment: &Assessment) -> Vec<AspectRow> {
    DriftAspect::ALL
        .iter()
        .map(|&aspect| AspectRow {
            aspect: aspect.as_str(),
            status: if assessment.drift.is_drifted(aspect) {
                "drifted"
            } else {
                "in sync"
            },
        })
        .collect()
}

fn drift_summary(assessment: &Assessment) -> String {
    assessment
        .drift
        .drifted()
        .iter()
        .map(DriftAspect::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn diff_output(assessment: &Assessment) -> DiffOutput<'_> {
    DiffOutput {
        needs_update: assessment.needs_update(),
        drifted: assessment.drift.drifted().iter().map(DriftAspect::as_str).collect(),
        spec_hash: assessment.spec_hash.as_str(),
        artifact_key: assessment.artifact.key(),
        content: assessment.artifact.content(),
        resources: &assessment.resources,
    }
}
