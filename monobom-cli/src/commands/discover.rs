//! `monobom discover` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use monobom_aggregator::ProjectDiscoverer;
use monobom_core::types::ProjectDescriptor;

use crate::cli::DiscoverArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `discover` command.
///
/// Walks the configured (or overridden) roots and lists every classified
/// project. An empty result is reported, not treated as an error; only the
/// `run` command makes "no projects" fatal.
pub async fn execute(
    args: DiscoverArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = super::load_aggregator_config(config_path, &args.roots, args.recursive).await?;

    info!(roots = config.roots.len(), "starting discovery");

    let roots = config.roots;
    let projects = tokio::task::spawn_blocking(move || ProjectDiscoverer::new().discover(&roots))
        .await
        .map_err(|e| CliError::Command(format!("discovery task failed: {e}")))?;

    writer.render(&DiscoverReport::new(projects))?;
    Ok(())
}

/// Discovery result listing.
#[derive(Serialize)]
pub struct DiscoverReport {
    pub projects: Vec<ProjectEntry>,
}

#[derive(Serialize)]
pub struct ProjectEntry {
    pub path: String,
    pub ecosystem: String,
}

impl DiscoverReport {
    fn new(projects: Vec<ProjectDescriptor>) -> Self {
        Self {
            projects: projects
                .into_iter()
                .map(|p| ProjectEntry {
                    path: p.path.display().to_string(),
                    ecosystem: p.kind.to_string(),
                })
                .collect(),
        }
    }
}

impl Render for DiscoverReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.projects.is_empty() {
            writeln!(w, "{}", "No sbom-capable projects discovered.".yellow())?;
            return Ok(());
        }

        writeln!(w, "Discovered {} project(s):", self.projects.len())?;
        writeln!(w, "{:<10} Path", "Ecosystem")?;
        writeln!(w, "{}", "-".repeat(60))?;
        for entry in &self.projects {
            writeln!(w, "{:<10} {}", entry.ecosystem.bold(), entry.path)?;
        }

        Ok(())
    }
}
