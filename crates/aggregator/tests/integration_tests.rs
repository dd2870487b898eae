//! Integration tests for the aggregation pipeline
//!
//! Drives the full discovery -> generation -> merge -> cleanup flow with a
//! scripted `ToolRunner`, so no external process is ever spawned. The fake
//! runner fabricates generator artifacts in each project's working directory
//! and emulates the merge tool by concatenating its input files.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio_util::sync::CancellationToken;

use monobom_aggregator::{
    AggregatorConfig, AggregatorConfigBuilder, AggregatorError, AggregatorPipelineBuilder,
    MergeStrategy, ToolInvocation, ToolOutput, ToolRunner, ToolStatus,
};
use monobom_core::types::{PipelineFailure, RootSpec};

/// Scripted runner emulating both the per-ecosystem generators and the
/// `cyclonedx merge` tool.
struct FakeTools {
    generator_calls: AtomicUsize,
    merge_calls: AtomicUsize,
    /// Per-merge-invocation input counts, for round-shape assertions.
    merge_input_counts: Mutex<Vec<usize>>,
    /// Project directories whose generator should exit non-zero.
    failing_projects: Vec<PathBuf>,
    /// When true every merge invocation exits non-zero.
    failing_merge: bool,
}

impl FakeTools {
    fn new() -> Self {
        Self {
            generator_calls: AtomicUsize::new(0),
            merge_calls: AtomicUsize::new(0),
            merge_input_counts: Mutex::new(Vec::new()),
            failing_projects: Vec::new(),
            failing_merge: false,
        }
    }

    fn with_failing_projects(projects: Vec<PathBuf>) -> Self {
        Self {
            failing_projects: projects,
            ..Self::new()
        }
    }

    fn with_failing_merge() -> Self {
        Self {
            failing_merge: true,
            ..Self::new()
        }
    }

    fn generator_calls(&self) -> usize {
        self.generator_calls.load(Ordering::SeqCst)
    }

    fn merge_calls(&self) -> usize {
        self.merge_calls.load(Ordering::SeqCst)
    }
}

impl ToolRunner for FakeTools {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, AggregatorError> {
        if invocation.program == "cyclonedx" {
            self.merge_calls.fetch_add(1, Ordering::SeqCst);

            if self.failing_merge {
                return Ok(ToolOutput {
                    status: ToolStatus::Exited(2),
                    stderr: "unable to merge documents".to_owned(),
                });
            }

            let output_idx = invocation
                .args
                .iter()
                .position(|a| a == "--output-file")
                .expect("merge invocation carries --output-file")
                + 1;
            let inputs_idx = invocation
                .args
                .iter()
                .position(|a| a == "--input-files")
                .expect("merge invocation carries --input-files")
                + 1;
            let inputs = &invocation.args[inputs_idx..];
            self.merge_input_counts.lock().unwrap().push(inputs.len());

            let mut merged = String::new();
            for input in inputs {
                merged.push_str(&std::fs::read_to_string(input).unwrap());
            }
            std::fs::write(&invocation.args[output_idx], merged).unwrap();

            return Ok(ToolOutput {
                status: ToolStatus::Exited(0),
                stderr: String::new(),
            });
        }

        // Generator: one invocation per project, cwd = project directory.
        self.generator_calls.fetch_add(1, Ordering::SeqCst);
        let cwd = invocation.cwd.clone().expect("generators run in the project dir");

        if self.failing_projects.contains(&cwd) {
            return Ok(ToolOutput {
                status: ToolStatus::Exited(101),
                stderr: "generator blew up".to_owned(),
            });
        }

        let marker = cwd.file_name().unwrap().to_string_lossy().into_owned();
        std::fs::write(cwd.join("bom.json"), format!("<{marker}>")).unwrap();
        Ok(ToolOutput {
            status: ToolStatus::Exited(0),
            stderr: String::new(),
        })
    }
}

/// Creates `count` Cargo-marked project directories under `root`.
fn make_projects(root: &Path, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let dir = root.join(format!("proj{i}"));
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("Cargo.toml"), "[package]").unwrap();
            dir
        })
        .collect()
}

fn config(root: &Path, output: &Path, strategy: MergeStrategy) -> AggregatorConfig {
    AggregatorConfigBuilder::new()
        .roots(vec![RootSpec {
            path: root.to_path_buf(),
            recursive: true,
        }])
        .strategy(strategy)
        .output_path(output)
        .build()
        .unwrap()
}

async fn run_pipeline(
    tools: Arc<FakeTools>,
    config: AggregatorConfig,
) -> monobom_core::types::PipelineReport {
    AggregatorPipelineBuilder::new(tools)
        .config(config)
        .build()
        .unwrap()
        .run()
        .await
        .unwrap()
}

/// One non-recursive root holding a single Cargo project: one generation,
/// zero merge invocations, artifact copied to the output, intermediate
/// removed, overall success.
#[tokio::test]
async fn single_cargo_project_end_to_end() {
    let repo = tempfile::tempdir().unwrap();
    let rust = repo.path().join("rust");
    std::fs::create_dir(&rust).unwrap();
    std::fs::write(rust.join("Cargo.toml"), "[package]").unwrap();
    let output = repo.path().join("proj_sbom.json");

    let tools = Arc::new(FakeTools::new());
    let config = AggregatorConfigBuilder::new()
        .roots(vec![RootSpec {
            path: rust.clone(),
            recursive: false,
        }])
        .output_path(&output)
        .build()
        .unwrap();

    let report = run_pipeline(Arc::clone(&tools), config).await;

    assert!(report.is_success());
    assert_eq!(report.projects_attempted, 1);
    assert_eq!(report.projects_succeeded, 1);
    assert_eq!(report.final_artifact, Some(output.clone()));
    assert_eq!(tools.generator_calls(), 1);
    assert_eq!(tools.merge_calls(), 0);
    // Output content equals the single generated artifact.
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "<rust>");
    // The per-project intermediate was cleaned up after the successful merge.
    assert!(!rust.join("bom.json").exists());
}

#[tokio::test]
async fn pairwise_five_projects_take_four_merge_invocations() {
    let repo = tempfile::tempdir().unwrap();
    let projects = make_projects(repo.path(), 5);
    let output = repo.path().join("sbom.json");

    let tools = Arc::new(FakeTools::new());
    let report = run_pipeline(
        Arc::clone(&tools),
        config(repo.path(), &output, MergeStrategy::Pairwise),
    )
    .await;

    assert!(report.is_success());
    assert_eq!(report.projects_attempted, 5);
    assert_eq!(report.projects_succeeded, 5);
    // 5 -> 3 -> 2 -> 1: four binary merges, each over exactly two inputs.
    assert_eq!(tools.merge_calls(), 4);
    assert!(tools.merge_input_counts.lock().unwrap().iter().all(|&n| n == 2));
    // The merged output contains every project's artifact.
    let merged = std::fs::read_to_string(&output).unwrap();
    for project in &projects {
        let name = project.file_name().unwrap().to_string_lossy();
        assert!(merged.contains(&format!("<{name}>")));
    }
    // All intermediates removed.
    for project in &projects {
        assert!(!project.join("bom.json").exists());
    }
}

#[tokio::test]
async fn bulk_strategy_merges_in_one_invocation() {
    let repo = tempfile::tempdir().unwrap();
    make_projects(repo.path(), 5);
    let output = repo.path().join("sbom.json");

    let tools = Arc::new(FakeTools::new());
    let report = run_pipeline(
        Arc::clone(&tools),
        config(repo.path(), &output, MergeStrategy::Bulk),
    )
    .await;

    assert!(report.is_success());
    assert_eq!(tools.merge_calls(), 1);
    assert_eq!(*tools.merge_input_counts.lock().unwrap(), vec![5]);
    assert!(output.exists());
}

#[tokio::test]
async fn one_failing_generator_does_not_stop_the_run() {
    let repo = tempfile::tempdir().unwrap();
    let projects = make_projects(repo.path(), 3);
    let output = repo.path().join("sbom.json");

    let tools = Arc::new(FakeTools::with_failing_projects(vec![projects[1].clone()]));
    let report = run_pipeline(
        Arc::clone(&tools),
        config(repo.path(), &output, MergeStrategy::Pairwise),
    )
    .await;

    // The failed project is dropped; the survivors still merge.
    assert!(report.is_success());
    assert_eq!(report.projects_attempted, 3);
    assert_eq!(report.projects_succeeded, 2);
    let merged = std::fs::read_to_string(&output).unwrap();
    assert!(merged.contains("<proj0>"));
    assert!(!merged.contains("<proj1>"));
    assert!(merged.contains("<proj2>"));
}

#[tokio::test]
async fn all_generators_failing_is_a_no_artifacts_failure() {
    let repo = tempfile::tempdir().unwrap();
    let projects = make_projects(repo.path(), 2);
    let output = repo.path().join("sbom.json");

    let tools = Arc::new(FakeTools::with_failing_projects(projects));
    let report = run_pipeline(
        Arc::clone(&tools),
        config(repo.path(), &output, MergeStrategy::Pairwise),
    )
    .await;

    assert!(!report.is_success());
    assert_eq!(report.failure, Some(PipelineFailure::NoArtifacts));
    assert_eq!(report.projects_succeeded, 0);
    // No merge was attempted and no output was produced.
    assert_eq!(tools.merge_calls(), 0);
    assert!(!output.exists());
}

#[tokio::test]
async fn merge_failure_preserves_intermediate_artifacts() {
    let repo = tempfile::tempdir().unwrap();
    let projects = make_projects(repo.path(), 3);
    let output = repo.path().join("sbom.json");

    let tools = Arc::new(FakeTools::with_failing_merge());
    let report = run_pipeline(
        Arc::clone(&tools),
        config(repo.path(), &output, MergeStrategy::Bulk),
    )
    .await;

    assert!(!report.is_success());
    assert!(matches!(report.failure, Some(PipelineFailure::Merge(_))));
    assert_eq!(report.projects_succeeded, 3);
    assert!(!output.exists());
    // Intermediates stay on disk for diagnosis.
    for project in &projects {
        assert!(project.join("bom.json").exists());
    }
}

#[tokio::test]
async fn non_directory_root_is_skipped_and_siblings_still_run() {
    let repo = tempfile::tempdir().unwrap();
    let bogus = repo.path().join("not-a-dir");
    std::fs::write(&bogus, "file").unwrap();
    let rust = repo.path().join("rust");
    std::fs::create_dir(&rust).unwrap();
    std::fs::write(rust.join("Cargo.toml"), "[package]").unwrap();
    let output = repo.path().join("sbom.json");

    let tools = Arc::new(FakeTools::new());
    let config = AggregatorConfigBuilder::new()
        .roots(vec![
            RootSpec {
                path: bogus,
                recursive: false,
            },
            RootSpec {
                path: rust,
                recursive: false,
            },
        ])
        .output_path(&output)
        .build()
        .unwrap();

    let report = run_pipeline(tools, config).await;

    assert!(report.is_success());
    assert_eq!(report.projects_attempted, 1);
}

#[tokio::test]
async fn cancelled_run_reports_cancellation_without_merging() {
    let repo = tempfile::tempdir().unwrap();
    make_projects(repo.path(), 2);
    let output = repo.path().join("sbom.json");

    let cancel = CancellationToken::new();
    cancel.cancel();

    let tools = Arc::new(FakeTools::new());
    let report = AggregatorPipelineBuilder::new(Arc::clone(&tools))
        .config(config(repo.path(), &output, MergeStrategy::Pairwise))
        .cancel_token(cancel)
        .build()
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.failure, Some(PipelineFailure::Cancelled));
    assert_eq!(tools.merge_calls(), 0);
    assert!(!output.exists());
}
