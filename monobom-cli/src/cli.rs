//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's
//! derive macros. It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Monobom -- consolidated SBOM aggregation for multi-ecosystem monorepos.
///
/// Use `monobom <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "monobom", version, about, long_about = None)]
pub struct Cli {
    /// Path to the monobom.toml configuration file.
    #[arg(short, long, default_value = "monobom.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full aggregation pipeline: discover, generate, merge, clean up.
    Run(RunArgs),

    /// Discover SBOM-capable projects without generating anything.
    Discover(DiscoverArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Run the aggregation pipeline.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the consolidated SBOM output path.
    #[arg(short = 'o', long)]
    pub output_path: Option<PathBuf>,

    /// Override the merge strategy (pairwise, bulk).
    #[arg(long)]
    pub strategy: Option<String>,

    /// Override the concurrent generator limit.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Override the per-generator timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Replace the configured discovery roots (repeatable).
    #[arg(long = "root", value_name = "PATH")]
    pub roots: Vec<PathBuf>,

    /// Walk the full subtree below each `--root` path.
    #[arg(long, requires = "roots")]
    pub recursive: bool,
}

// ---- discover ----

/// List discovered projects and their ecosystems.
#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Replace the configured discovery roots (repeatable).
    #[arg(long = "root", value_name = "PATH")]
    pub roots: Vec<PathBuf>,

    /// Walk the full subtree below each `--root` path.
    #[arg(long, requires = "roots")]
    pub recursive: bool,
}

// ---- config ----

/// Manage monobom configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, discovery, generate, merge).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::try_parse_from(["monobom", "run"]).expect("should parse 'run'");
        match cli.command {
            Commands::Run(args) => {
                assert!(args.output_path.is_none());
                assert!(args.strategy.is_none());
                assert!(args.workers.is_none());
                assert!(args.roots.is_empty());
                assert!(!args.recursive);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_overrides() {
        let cli = Cli::try_parse_from([
            "monobom", "run", "-o", "out/sbom.json", "--strategy", "bulk", "--workers", "8",
        ])
        .expect("should parse run with overrides");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.output_path, Some(PathBuf::from("out/sbom.json")));
                assert_eq!(args.strategy, Some("bulk".to_owned()));
                assert_eq!(args.workers, Some(8));
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_repeatable_roots() {
        let cli = Cli::try_parse_from([
            "monobom",
            "run",
            "--root",
            "rust",
            "--root",
            "frontend",
            "--recursive",
        ])
        .expect("should parse repeated --root");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(
                    args.roots,
                    vec![PathBuf::from("rust"), PathBuf::from("frontend")]
                );
                assert!(args.recursive);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_recursive_requires_roots() {
        let result = Cli::try_parse_from(["monobom", "run", "--recursive"]);
        assert!(result.is_err(), "--recursive without --root should fail");
    }

    #[test]
    fn test_cli_parse_discover() {
        let cli = Cli::try_parse_from(["monobom", "discover", "--root", "."])
            .expect("should parse 'discover'");
        match cli.command {
            Commands::Discover(args) => {
                assert_eq!(args.roots, vec![PathBuf::from(".")]);
            }
            _ => panic!("expected Discover command"),
        }
    }

    #[test]
    fn test_cli_parse_config_validate() {
        let cli = Cli::try_parse_from(["monobom", "config", "validate"])
            .expect("should parse 'config validate'");
        match cli.command {
            Commands::Config(args) => match args.action {
                ConfigAction::Validate => {}
                _ => panic!("expected Validate action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["monobom", "config", "show", "--section", "merge"])
            .expect("should parse config show with section");
        match cli.command {
            Commands::Config(args) => match args.action {
                ConfigAction::Show { section } => {
                    assert_eq!(section, Some("merge".to_owned()));
                }
                _ => panic!("expected Show action"),
            },
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_parse_custom_config_path() {
        let cli = Cli::try_parse_from(["monobom", "-c", "/etc/monobom.toml", "run"])
            .expect("should parse with custom config path");
        assert_eq!(cli.config, PathBuf::from("/etc/monobom.toml"));
    }

    #[test]
    fn test_cli_parse_output_format_json() {
        let cli = Cli::try_parse_from(["monobom", "--output", "json", "run"])
            .expect("should parse with json output");
        match cli.output {
            OutputFormat::Json => {}
            _ => panic!("expected Json output format"),
        }
    }

    #[test]
    fn test_cli_parse_log_level() {
        let cli = Cli::try_parse_from(["monobom", "--log-level", "debug", "run"])
            .expect("should parse with custom log level");
        assert_eq!(cli.log_level, Some("debug".to_owned()));
    }

    #[test]
    fn test_cli_parse_missing_command_fails() {
        assert!(Cli::try_parse_from(["monobom"]).is_err());
    }

    #[test]
    fn test_cli_verify_command_structure() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_name(), "monobom");

        let subcommands: Vec<_> = cmd.get_subcommands().map(|s| s.get_name()).collect();
        assert!(subcommands.contains(&"run"));
        assert!(subcommands.contains(&"discover"));
        assert!(subcommands.contains(&"config"));
    }
}
