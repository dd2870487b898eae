//! 집계 파이프라인 오케스트레이터 -- 전체 실행 흐름 관리
//!
//! [`AggregatorPipeline`]은 탐색, 생성, 병합, 정리 단계를 순서대로
//! 실행하고 [`PipelineReport`]를 생성합니다.
//!
//! # 내부 아키텍처
//!
//! ```text
//! roots --> ProjectDiscoverer --> Vec<ProjectDescriptor>
//!                                        |
//!                                 GenerationExecutor (GeneratorTable, ToolRunner)
//!                                        |
//!                                 Vec<GenerationOutcome>
//!                                        |  (실패 결과 제거)
//!                                 MergeReducer --> 최종 통합 SBOM
//!                                        |
//!                                 ArtifactCleaner (병합 성공 시에만)
//! ```
//!
//! # 단계별 실패 처리
//!
//! - 프로젝트 없음 / 산출물 없음 / 병합 실패 / 취소는 에러가 아니라
//!   [`PipelineReport::failure`]로 보고됩니다. `Err`는 작업 디렉토리 생성
//!   실패 같은 인프라 문제에만 사용됩니다.
//! - 병합 실패 시 프로젝트별 중간 산출물은 진단을 위해 보존됩니다.
//!
//! # 작업 디렉토리
//!
//! 병합 라운드의 중간 파일은 실행마다 새로 만드는 임시 디렉토리
//! (`monobom-` 접두어)에 격리되므로 같은 호스트에서 동시에 실행되는
//! 파이프라인끼리 충돌하지 않습니다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::histogram;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use monobom_core::metrics::MERGE_DURATION_SECONDS;
use monobom_core::types::{PipelineFailure, PipelineReport};

use crate::cleanup::ArtifactCleaner;
use crate::config::AggregatorConfig;
use crate::discover::ProjectDiscoverer;
use crate::error::AggregatorError;
use crate::generate::GeneratorTable;
use crate::generate::executor::GenerationExecutor;
use crate::merge::MergeReducer;
use crate::runner::ToolRunner;

/// 집계 파이프라인 오케스트레이터
///
/// 외부 도구 호출은 [`ToolRunner`] trait을 통해서만 이루어지므로
/// 전체 파이프라인을 프로세스 생성 없이 테스트할 수 있습니다.
///
/// # 재사용
///
/// `run()`은 `&self`를 받으므로 같은 인스턴스로 여러 번 실행할 수
/// 있습니다. 실행마다 새 run id와 새 작업 디렉토리가 생성됩니다.
pub struct AggregatorPipeline<R: ToolRunner> {
    /// 파이프라인 설정
    config: AggregatorConfig,
    /// 외부 도구 실행기
    runner: Arc<R>,
    /// 협조적 취소 토큰
    cancel: CancellationToken,
}

impl<R: ToolRunner> AggregatorPipeline<R> {
    /// 파이프라인을 한 번 실행하고 결과 보고를 반환합니다.
    pub async fn run(&self) -> Result<PipelineReport, AggregatorError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        info!(run_id = %run_id, roots = self.config.roots.len(), "pipeline starting");

        // 1단계: 탐색 (동기 I/O이므로 blocking 풀에서 수행)
        let roots = self.config.roots.clone();
        let projects = tokio::task::spawn_blocking(move || {
            ProjectDiscoverer::new().discover(&roots)
        })
        .await
        .map_err(|e| AggregatorError::Task(format!("discovery task failed: {e}")))?;

        if projects.is_empty() {
            warn!(run_id = %run_id, "no sbom-capable projects discovered");
            return Ok(failed_report(run_id, 0, 0, PipelineFailure::NoProjects));
        }

        if self.cancel.is_cancelled() {
            return Ok(failed_report(run_id, 0, 0, PipelineFailure::Cancelled));
        }

        // 2단계: 프로젝트별 SBOM 생성 (부분 실패 허용)
        let table = GeneratorTable::new(
            self.config.artifact_stem.clone(),
            self.config.ecosystems.iter().copied(),
        );
        let executor = GenerationExecutor::new(
            Arc::clone(&self.runner),
            table,
            self.config.worker_limit,
            Duration::from_secs(self.config.generate_timeout_secs),
            self.cancel.clone(),
        );
        let outcomes = executor.execute(projects).await;

        let attempted = outcomes.len();
        let artifacts: Vec<_> = outcomes
            .iter()
            .filter(|o| o.succeeded)
            .filter_map(|o| o.artifact.clone())
            .collect();
        let succeeded = artifacts.len();
        info!(
            run_id = %run_id,
            attempted,
            succeeded,
            "generation completed"
        );

        if self.cancel.is_cancelled() {
            return Ok(failed_report(
                run_id,
                attempted,
                succeeded,
                PipelineFailure::Cancelled,
            ));
        }

        if artifacts.is_empty() {
            // 병합할 것이 없으면 병합도 정리도 수행하지 않음
            warn!(run_id = %run_id, attempted, "no artifacts produced");
            return Ok(failed_report(
                run_id,
                attempted,
                succeeded,
                PipelineFailure::NoArtifacts,
            ));
        }

        // 3단계: 병합. 중간 파일은 실행 전용 임시 디렉토리에 격리
        let workdir = tempfile::Builder::new()
            .prefix("monobom-")
            .tempdir()
            .map_err(|e| AggregatorError::Io {
                path: std::env::temp_dir().display().to_string(),
                source: e,
            })?;

        let output = self.config.output_path.clone();
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AggregatorError::Io {
                        path: parent.display().to_string(),
                        source: e,
                    })?;
            }
        }

        let reducer = MergeReducer::new(
            Arc::clone(&self.runner),
            self.config.strategy,
            Duration::from_secs(self.config.merge_timeout_secs),
            workdir.path().to_path_buf(),
        );

        let merge_started = Instant::now();
        let merge_result = reducer.reduce(&artifacts, &output).await;
        histogram!(MERGE_DURATION_SECONDS).record(merge_started.elapsed().as_secs_f64());

        match merge_result {
            Err(AggregatorError::Cancelled) => Ok(failed_report(
                run_id,
                attempted,
                succeeded,
                PipelineFailure::Cancelled,
            )),
            Err(e) => {
                // 중간 산출물은 진단을 위해 남겨둠
                warn!(run_id = %run_id, error = %e, "merge failed, keeping intermediate artifacts");
                Ok(failed_report(
                    run_id,
                    attempted,
                    succeeded,
                    PipelineFailure::Merge(e.to_string()),
                ))
            }
            Ok(stats) => {
                // 4단계: 병합이 성공했을 때만 중간 산출물 제거
                ArtifactCleaner::new().cleanup(&artifacts).await;

                info!(
                    run_id = %run_id,
                    attempted,
                    succeeded,
                    merge_invocations = stats.invocations,
                    output = %output.display(),
                    "pipeline completed"
                );
                Ok(PipelineReport {
                    run_id,
                    projects_attempted: attempted,
                    projects_succeeded: succeeded,
                    merge_succeeded: true,
                    final_artifact: Some(output),
                    failure: None,
                })
            }
        }
    }
}

/// 실행을 종료시킨 실패를 담은 보고를 생성합니다.
fn failed_report(
    run_id: String,
    attempted: usize,
    succeeded: usize,
    failure: PipelineFailure,
) -> PipelineReport {
    PipelineReport {
        run_id,
        projects_attempted: attempted,
        projects_succeeded: succeeded,
        merge_succeeded: false,
        final_artifact: None,
        failure: Some(failure),
    }
}

/// [`AggregatorPipeline`] 빌더
///
/// runner는 생성 시점에 주입합니다. 설정과 취소 토큰은 선택이며
/// 기본값은 각각 [`AggregatorConfig::default`]와 새 토큰입니다.
pub struct AggregatorPipelineBuilder<R: ToolRunner> {
    config: AggregatorConfig,
    runner: Arc<R>,
    cancel: CancellationToken,
}

impl<R: ToolRunner> AggregatorPipelineBuilder<R> {
    /// 주어진 runner로 새 빌더를 생성합니다.
    pub fn new(runner: Arc<R>) -> Self {
        Self {
            config: AggregatorConfig::default(),
            runner,
            cancel: CancellationToken::new(),
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    /// 협조적 취소 토큰을 지정합니다.
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 설정을 검증하고 파이프라인을 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `AggregatorError::Config` 반환
    pub fn build(self) -> Result<AggregatorPipeline<R>, AggregatorError> {
        self.config.validate()?;
        Ok(AggregatorPipeline {
            config: self.config,
            runner: self.runner,
            cancel: self.cancel,
        })
    }
}
