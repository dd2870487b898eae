#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`AggregatorError`)
//! - [`config`]: Pipeline configuration (`AggregatorConfig`, builder)
//! - [`classify`]: Marker-file classification (`MarkerClassifier`)
//! - [`discover`]: Root walking and project discovery (`ProjectDiscoverer`)
//! - [`runner`]: External tool invocation seam (`ToolRunner` trait, `ProcessRunner`)
//! - [`generate`]: Generator dispatch and fan-out (`GeneratorTable`, `GenerationExecutor`)
//! - [`merge`]: Artifact reduction (`MergeReducer`, `MergeStrategy`)
//! - [`cleanup`]: Intermediate artifact removal (`ArtifactCleaner`)
//! - [`pipeline`]: Main orchestrator (`AggregatorPipeline`, `AggregatorPipelineBuilder`)
//!
//! # Architecture
//!
//! ```text
//! roots --> ProjectDiscoverer --> Vec<ProjectDescriptor>
//!                                        |
//!                                 GenerationExecutor ---- ToolRunner ----> cargo / gradlew / nix
//!                                        |
//!                                 Vec<GenerationOutcome>
//!                                        |
//!                                 MergeReducer ---------- ToolRunner ----> cyclonedx merge
//!                                        |
//!                                 consolidated SBOM --> ArtifactCleaner
//! ```

pub mod classify;
pub mod cleanup;
pub mod config;
pub mod discover;
pub mod error;
pub mod generate;
pub mod merge;
pub mod pipeline;
pub mod runner;

// --- Public API Re-exports ---

// Pipeline (main orchestrator)
pub use pipeline::{AggregatorPipeline, AggregatorPipelineBuilder};

// Configuration
pub use config::{AggregatorConfig, AggregatorConfigBuilder};

// Error
pub use error::AggregatorError;

// Discovery
pub use classify::MarkerClassifier;
pub use discover::ProjectDiscoverer;

// Generation
pub use generate::executor::GenerationExecutor;
pub use generate::{GeneratorSpec, GeneratorTable};

// Merge
pub use merge::{MergeReducer, MergeStats, MergeStrategy};

// Cleanup
pub use cleanup::ArtifactCleaner;

// External tool seam
pub use runner::{ProcessRunner, ToolInvocation, ToolOutput, ToolRunner, ToolStatus};
