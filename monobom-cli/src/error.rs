//! CLI-specific error types and exit code mapping

use monobom_aggregator::AggregatorError;
use monobom_core::error::MonobomError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes so that
/// scripts can distinguish pipeline outcomes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Discovery found no SBOM-capable project anywhere.
    #[error("no sbom-capable projects discovered")]
    NoProjects,

    /// Generation produced no artifacts, so there is nothing to merge.
    #[error("generation produced no artifacts")]
    NoArtifacts,

    /// The merge stage failed; intermediate artifacts were kept on disk.
    #[error("merge failed: {0}")]
    MergeFailed(String),

    /// The run was interrupted before completing.
    #[error("cancelled")]
    Cancelled,

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from monobom-core.
    #[error("{0}")]
    Core(#[from] MonobomError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                               |
    /// |------|---------------------------------------|
    /// | 0    | Success                               |
    /// | 1    | General / command error               |
    /// | 2    | Configuration error                   |
    /// | 3    | No SBOM-capable project discovered    |
    /// | 4    | Generation produced no artifacts      |
    /// | 5    | Merge failed                          |
    /// | 10   | IO error                              |
    /// | 130  | Cancelled (interrupt)                 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(MonobomError::Config(_)) => 2,
            Self::NoProjects => 3,
            Self::NoArtifacts => 4,
            Self::MergeFailed(_) => 5,
            Self::Io(_) | Self::Core(MonobomError::Io(_)) => 10,
            Self::Cancelled => 130,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<AggregatorError> for CliError {
    fn from(e: AggregatorError) -> Self {
        match e {
            AggregatorError::Config { field, reason } => Self::Config(format!("{field}: {reason}")),
            AggregatorError::Cancelled => Self::Cancelled,
            AggregatorError::MergeTool(_)
            | AggregatorError::MergeInputMissing { .. }
            | AggregatorError::Persist { .. } => Self::MergeFailed(e.to_string()),
            other => Self::Command(other.to_string()),
        }
    }
}
