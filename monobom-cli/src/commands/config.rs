//! `monobom config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use monobom_core::config::MonobomConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Load and validate the configuration file, reporting any errors.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = match MonobomConfig::load(config_path).await {
        Ok(_) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }
    Ok(())
}

/// Show the effective configuration (file + env overrides + defaults).
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = MonobomConfig::load(config_path).await?;

    let config_toml = match section.as_deref() {
        None => serialize_section(&config),
        Some("general") => serialize_section(&config.general),
        Some("discovery") => serialize_section(&config.discovery),
        Some("generate") => serialize_section(&config.generate),
        Some("merge") => serialize_section(&config.merge),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {other} (expected: general, discovery, generate, merge)"
            )));
        }
    };

    writer.render(&ConfigReport {
        source: config_path.display().to_string(),
        section,
        config_toml,
    })?;

    Ok(())
}

fn serialize_section<T: Serialize>(section: &T) -> String {
    toml::to_string_pretty(section).unwrap_or_else(|e| format!("(serialization error: {e})"))
}

/// Configuration display report.
#[derive(Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Serialized TOML configuration (text rendering only)
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(section) = &self.section {
            let label = format!("[{section}]");
            writeln!(w, "Configuration {} (source: {})", label.bold(), self.source)?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }
        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;
        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path
    pub source: String,
    /// Whether the configuration is valid
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;
        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        Ok(())
    }
}
