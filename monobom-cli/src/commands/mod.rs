//! Command handlers -- one module per subcommand

pub mod config;
pub mod discover;
pub mod run;

use std::path::Path;

use monobom_aggregator::AggregatorConfig;
use monobom_core::config::MonobomConfig;
use monobom_core::types::RootSpec;

use crate::error::CliError;

/// Load the core configuration and convert it into pipeline configuration,
/// applying the shared `--root`/`--recursive` overrides.
///
/// CLI-provided roots replace the configured ones entirely; partial merging
/// of root lists would make the effective configuration hard to predict.
pub(crate) async fn load_aggregator_config(
    config_path: &Path,
    cli_roots: &[std::path::PathBuf],
    recursive: bool,
) -> Result<AggregatorConfig, CliError> {
    let core = MonobomConfig::load(config_path).await?;
    let mut config = AggregatorConfig::from_core(&core);

    if !cli_roots.is_empty() {
        config.roots = cli_roots
            .iter()
            .map(|path| RootSpec {
                path: path.clone(),
                recursive,
            })
            .collect();
    }

    Ok(config)
}
