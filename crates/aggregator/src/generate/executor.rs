//! 생성 실행기 -- 프로젝트별 외부 생성기 fan-out
//!
//! [`GenerationExecutor`]는 탐색된 프로젝트마다 등록된 외부 생성기를
//! 자식 프로세스로 실행하고, 개별 실패를 허용하면서 결과를
//! [`GenerationOutcome`] 목록으로 집계합니다.
//!
//! # 동시성
//!
//! 호출은 세마포어로 제한된 워커 수만큼 동시에 실행됩니다. 완료 순서는
//! 비결정적이지만 결과는 항상 원래 디스크립터 순서로 재조립됩니다.
//!
//! # 부분 실패 허용
//!
//! 한 프로젝트의 생성기 실패(비정상 종료, 타임아웃, 미등록 생태계,
//! 산출물 미생성)는 그 프로젝트의 결과만 실패로 만들고 형제 프로젝트의
//! 생성은 계속됩니다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use monobom_core::metrics::{
    GENERATE_DURATION_SECONDS, GENERATE_RUNS_TOTAL, LABEL_ECOSYSTEM, LABEL_RESULT,
};
use monobom_core::types::{EcosystemKind, GenerationOutcome, ProjectDescriptor};

use crate::generate::{GeneratorSpec, GeneratorTable};
use crate::runner::{ToolInvocation, ToolRunner};

/// 생성 실행기
///
/// 외부 생성기 호출은 [`ToolRunner`] trait을 통해서만 이루어지므로
/// 테스트에서는 프로세스를 생성하지 않는 mock runner를 사용할 수 있습니다.
pub struct GenerationExecutor<R: ToolRunner> {
    runner: Arc<R>,
    table: GeneratorTable,
    worker_limit: usize,
    timeout: Duration,
    cancel: CancellationToken,
}

impl<R: ToolRunner> GenerationExecutor<R> {
    /// 새 실행기를 생성합니다.
    pub fn new(
        runner: Arc<R>,
        table: GeneratorTable,
        worker_limit: usize,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            runner,
            table,
            worker_limit,
            timeout,
            cancel,
        }
    }

    /// 모든 프로젝트의 생성을 시도하고 결과를 디스크립터 순서로 반환합니다.
    pub async fn execute(&self, projects: Vec<ProjectDescriptor>) -> Vec<GenerationOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.worker_limit));
        let mut handles = Vec::with_capacity(projects.len());

        for project in projects {
            let spec = self.table.lookup(project.kind);
            let runner = Arc::clone(&self.runner);
            let semaphore = Arc::clone(&semaphore);
            let cancel = self.cancel.clone();
            let timeout = self.timeout;

            handles.push(tokio::spawn(async move {
                generate_one(runner, semaphore, cancel, timeout, project, spec).await
            }));
        }

        // 스폰 순서대로 join하여 디스크립터 순서를 복원
        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(error = %e, "generation task panicked or was aborted");
                }
            }
        }
        outcomes
    }
}

/// 프로젝트 하나의 생성을 수행합니다.
async fn generate_one<R: ToolRunner>(
    runner: Arc<R>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    timeout: Duration,
    project: ProjectDescriptor,
    spec: Option<GeneratorSpec>,
) -> GenerationOutcome {
    let kind = project.kind;

    let Some(spec) = spec else {
        warn!(project = %project, "no generator registered for ecosystem");
        record_run(kind, false);
        return GenerationOutcome::failure(
            project,
            format!("no generator registered for ecosystem '{kind}'"),
        );
    };

    let _permit = match Arc::clone(&semaphore).acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            record_run(kind, false);
            return GenerationOutcome::failure(project, "worker pool closed");
        }
    };

    if cancel.is_cancelled() {
        record_run(kind, false);
        return GenerationOutcome::failure(project, "cancelled before generation started");
    }

    let invocation = ToolInvocation {
        program: spec.program,
        args: spec.args,
        cwd: Some(project.path.clone()),
        timeout,
    };

    let started = Instant::now();
    let result = runner.run(&invocation).await;
    histogram!(GENERATE_DURATION_SECONDS, LABEL_ECOSYSTEM => kind.as_str())
        .record(started.elapsed().as_secs_f64());

    match result {
        Err(e) => {
            warn!(project = %project, error = %e, "failed to invoke generator");
            record_run(kind, false);
            GenerationOutcome::failure(project, format!("failed to invoke generator: {e}"))
        }
        Ok(output) if !output.status.is_success() => {
            warn!(project = %project, outcome = %output.describe(), "generator failed");
            record_run(kind, false);
            GenerationOutcome::failure(project, output.describe())
        }
        Ok(_) => {
            let artifact = project.path.join(&spec.artifact);
            // 성공 선언 전에 산출물이 실제로 생성되었는지 확인
            match tokio::fs::metadata(&artifact).await {
                Ok(_) => {
                    info!(project = %project, artifact = %artifact.display(), "generated sbom");
                    record_run(kind, true);
                    GenerationOutcome::success(project, artifact)
                }
                Err(_) => {
                    warn!(
                        project = %project,
                        artifact = %artifact.display(),
                        "generator exited successfully but artifact is missing"
                    );
                    record_run(kind, false);
                    GenerationOutcome::failure(
                        project,
                        format!(
                            "generator exited successfully but artifact {} is missing",
                            artifact.display()
                        ),
                    )
                }
            }
        }
    }
}

fn record_run(kind: EcosystemKind, succeeded: bool) {
    let result = if succeeded { "success" } else { "failure" };
    counter!(GENERATE_RUNS_TOTAL, LABEL_ECOSYSTEM => kind.as_str(), LABEL_RESULT => result)
        .increment(1);
}
