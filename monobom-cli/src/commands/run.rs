//! `monobom run` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use monobom_aggregator::{AggregatorPipelineBuilder, MergeStrategy, ProcessRunner};
use monobom_core::types::{PipelineFailure, PipelineReport};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// Loads configuration, applies CLI overrides, runs the full pipeline and
/// renders the resulting report. The returned error (if any) reflects the
/// pipeline outcome so `main` can map it to the documented exit codes.
pub async fn execute(
    args: RunArgs,
    config_path: &Path,
    cancel: CancellationToken,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config =
        super::load_aggregator_config(config_path, &args.roots, args.recursive).await?;

    // CLI flags take priority over file and environment values.
    if let Some(output_path) = args.output_path {
        config.output_path = output_path;
    }
    if let Some(strategy) = &args.strategy {
        config.strategy = MergeStrategy::from_str_loose(strategy).ok_or_else(|| {
            CliError::Command(format!(
                "invalid strategy: {strategy} (expected: pairwise, bulk)"
            ))
        })?;
    }
    if let Some(workers) = args.workers {
        config.worker_limit = workers;
    }
    if let Some(timeout) = args.timeout {
        config.generate_timeout_secs = timeout;
    }

    info!(
        roots = config.roots.len(),
        strategy = %config.strategy,
        output = %config.output_path.display(),
        "starting aggregation run"
    );

    let strategy = config.strategy;
    let runner = Arc::new(ProcessRunner::new(cancel.clone()));
    let pipeline = AggregatorPipelineBuilder::new(runner)
        .config(config)
        .cancel_token(cancel)
        .build()?;

    let report = pipeline.run().await?;
    writer.render(&RunReport::new(&report, strategy))?;

    match report.failure {
        None => Ok(()),
        Some(PipelineFailure::NoProjects) => Err(CliError::NoProjects),
        Some(PipelineFailure::NoArtifacts) => Err(CliError::NoArtifacts),
        Some(PipelineFailure::Merge(reason)) => Err(CliError::MergeFailed(reason)),
        Some(PipelineFailure::Cancelled) => Err(CliError::Cancelled),
    }
}

/// Aggregation run report.
#[derive(Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub projects_attempted: usize,
    pub projects_succeeded: usize,
    pub merge_succeeded: bool,
    pub strategy: String,
    pub final_artifact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl RunReport {
    fn new(report: &PipelineReport, strategy: MergeStrategy) -> Self {
        Self {
            run_id: report.run_id.clone(),
            projects_attempted: report.projects_attempted,
            projects_succeeded: report.projects_succeeded,
            merge_succeeded: report.merge_succeeded,
            strategy: strategy.to_string(),
            final_artifact: report
                .final_artifact
                .as_ref()
                .map(|p| p.display().to_string()),
            failure: report.failure.as_ref().map(ToString::to_string),
        }
    }
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Aggregation run {}", self.run_id.bold())?;
        writeln!(
            w,
            "  Projects: {}/{} succeeded",
            self.projects_succeeded, self.projects_attempted
        )?;

        if self.merge_succeeded {
            writeln!(w, "  Merge: {} ({})", "OK".green().bold(), self.strategy)?;
        } else {
            writeln!(w, "  Merge: {} ({})", "FAILED".red().bold(), self.strategy)?;
        }

        if let Some(artifact) = &self.final_artifact {
            writeln!(w, "  Output: {artifact}")?;
        }
        if let Some(failure) = &self.failure {
            writeln!(w, "  Failure: {}", failure.red())?;
        }

        Ok(())
    }
}
