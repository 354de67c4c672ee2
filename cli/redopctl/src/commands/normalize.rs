//! Normalize command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use redop_resources::{normalize, ResourceList, ResourceSpec};
use tabled::Tabled;

use crate::document::load_desired;
use crate::output::{print_json, print_table, OutputFormat};

use super::CommandContext;

/// Print the canonical form of a desired state's resources.
#[derive(Debug, Args)]
pub struct NormalizeCommand {
    /// Desired state document (TOML, or JSON for .json files).
    #[arg(long, value_name = "PATH")]
    desired: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
struct QuantityRow {
    #[tabled(rename = "Table")]
    table: &'static str,

    #[tabled(rename = "Resource")]
    resource: String,

    #[tabled(rename = "Written")]
    written: String,

    #[tabled(rename = "Canonical")]
    canonical: String,
}

impl NormalizeCommand {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let doc = load_desired(&self.desired)?;
        let normalized = normalize(&doc.resources);

        match ctx.format {
            OutputFormat::Json => print_json(&normalized),
            OutputFormat::Text => print_table(&quantity_rows(&doc.resources, &normalized)),
        }

        Ok(())
    }
}

fn quantity_rows(written: &ResourceSpec, canonical: &ResourceSpec) -> Vec<QuantityRow> {
    let rows = |table: &'static str, written: &ResourceList, canonical: &ResourceList| {
        written
            .iter()
            .filter_map(|(name, quantity)| {
                canonical.get(name).map(|normalized| QuantityRow {
                    table,
                    resource: name.clone(),
                    written: quantity.to_string(),
                    canonical: normalized.to_string(),
                })
            })
            .collect::<Vec<_>>()
    };

    let mut all = rows("limits", &written.limits, &canonical.limits);
    all.extend(rows("requests", &written.requests, &canonical.requests));
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use redop_resources::{RESOURCE_CPU, RESOURCE_MEMORY};

    #[test]
    fn test_quantity_rows() {
        let spec = ResourceSpec::new()
            .with_limit(RESOURCE_MEMORY, "4096Mi")
            .with_request(RESOURCE_CPU, "1000m");

        let rows = quantity_rows(&spec, &normalize(&spec));

        assert_eq!(
            rows,
            vec![
                QuantityRow {
                    table: "limits",
                    resource: "memory".to_string(),
                    written: "4096Mi".to_string(),
                    canonical: "4Gi".to_string(),
                },
                QuantityRow {
                    table: "requests",
                    resource: "cpu".to_string(),
                    written: "1000m".to_string(),
                    canonical: "1".to_string(),
                },
            ]
        );
    }
}
