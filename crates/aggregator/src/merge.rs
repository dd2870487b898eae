//! SBOM 병합 -- 산출물 N개를 통합 문서 하나로 축약
//!
//! [`MergeReducer`]는 생성 단계가 남긴 산출물 경로들을 외부 병합 도구
//! (`cyclonedx merge`)로 축약합니다. 두 가지 전략을 하나의 추상화 뒤에
//! 통합합니다.
//!
//! - [`MergeStrategy::Pairwise`]: 이진 병합 프리미티브만 가정하는 토너먼트
//!   축약. 인접 쌍을 병합해 라운드마다 목록을 절반으로 줄입니다. 홀수
//!   꼬리는 다음 라운드로 그대로 넘어갑니다. N개 입력에 대해 정확히 N-1회
//!   호출이 `ceil(log2 N)` 라운드에 걸쳐 일어나며, 한 라운드 안의 쌍
//!   병합은 서로 독립이므로 동시에 실행됩니다. 라운드 자체는 이전 라운드
//!   출력에 의존하므로 순차적입니다.
//! - [`MergeStrategy::Bulk`]: N항 병합 프리미티브를 한 번 호출합니다.
//!
//! 두 전략 모두 중간 결과를 실행 전용 작업 디렉토리에 만들고, 성공했을
//! 때만 결과를 출력 경로로 옮깁니다. 실패 시 출력 경로는 건드리지
//! 않으므로 이전 실행의 통합 SBOM이 오염되지 않습니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, info, warn};

use monobom_core::metrics::{LABEL_STRATEGY, MERGE_INVOCATIONS_TOTAL};

use crate::error::AggregatorError;
use crate::runner::{ToolInvocation, ToolRunner, ToolStatus};

/// 병합 전략
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    /// 이진 병합 프리미티브를 사용하는 토너먼트 축약
    #[default]
    Pairwise,
    /// N항 병합 프리미티브 단일 호출
    Bulk,
}

impl MergeStrategy {
    /// 설정 파일과 메트릭 레이블에 쓰이는 고정 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pairwise => "pairwise",
            Self::Bulk => "bulk",
        }
    }

    /// 느슨한 문자열 매칭으로 전략을 파싱합니다 (대소문자 무시).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pairwise" => Some(Self::Pairwise),
            "bulk" => Some(Self::Bulk),
            _ => None,
        }
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 병합 단계 실행 통계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    /// 외부 병합 도구 호출 수
    pub invocations: usize,
    /// 수행된 라운드 수 (단일 입력 복사는 0)
    pub rounds: usize,
}

/// 병합 축약기
///
/// 외부 병합 도구 호출은 [`ToolRunner`] trait을 통해서만 이루어집니다.
pub struct MergeReducer<R: ToolRunner> {
    runner: Arc<R>,
    strategy: MergeStrategy,
    timeout: Duration,
    /// 라운드 중간 파일용 실행 전용 작업 디렉토리
    workdir: PathBuf,
}

impl<R: ToolRunner> MergeReducer<R> {
    /// 새 축약기를 생성합니다.
    pub fn new(
        runner: Arc<R>,
        strategy: MergeStrategy,
        timeout: Duration,
        workdir: PathBuf,
    ) -> Self {
        Self {
            runner,
            strategy,
            timeout,
            workdir,
        }
    }

    /// 산출물들을 출력 경로의 문서 하나로 축약합니다.
    ///
    /// # 불변 조건
    ///
    /// - 입력은 비어 있을 수 없습니다. 빈 목록은 호출 전에 파이프라인이
    ///   종료 상태로 처리해야 합니다.
    /// - 모든 입력은 호출 시점에 파일시스템에 존재해야 합니다. 사라진
    ///   산출물은 조용히 건너뛰지 않고 병합 전체를 실패시킵니다.
    pub async fn reduce(
        &self,
        artifacts: &[PathBuf],
        output: &Path,
    ) -> Result<MergeStats, AggregatorError> {
        if artifacts.is_empty() {
            return Err(AggregatorError::MergeTool(
                "merge invoked with no inputs".to_owned(),
            ));
        }

        for artifact in artifacts {
            if tokio::fs::metadata(artifact).await.is_err() {
                return Err(AggregatorError::MergeInputMissing {
                    path: artifact.display().to_string(),
                });
            }
        }

        // 입력이 하나면 병합 호출 없이 그대로 출력으로 복사
        if let [single] = artifacts {
            debug!(artifact = %single.display(), "single artifact, copying to output");
            copy_artifact(single, output).await?;
            return Ok(MergeStats {
                invocations: 0,
                rounds: 0,
            });
        }

        let stats = match self.strategy {
            MergeStrategy::Pairwise => self.reduce_pairwise(artifacts, output).await?,
            MergeStrategy::Bulk => self.reduce_bulk(artifacts, output).await?,
        };

        info!(
            strategy = %self.strategy,
            inputs = artifacts.len(),
            invocations = stats.invocations,
            rounds = stats.rounds,
            output = %output.display(),
            "merge completed"
        );
        Ok(stats)
    }

    /// 토너먼트 축약: 라운드마다 인접 쌍을 병합합니다.
    async fn reduce_pairwise(
        &self,
        artifacts: &[PathBuf],
        output: &Path,
    ) -> Result<MergeStats, AggregatorError> {
        let mut current: Vec<PathBuf> = artifacts.to_vec();
        let mut invocations = 0;
        let mut rounds = 0;

        while current.len() > 1 {
            rounds += 1;
            debug!(round = rounds, inputs = current.len(), "starting merge round");

            let mut slots: Vec<Option<PathBuf>> = vec![None; current.len().div_ceil(2)];
            let mut handles = Vec::new();

            for (pair_idx, pair) in current.chunks(2).enumerate() {
                if let [tail] = pair {
                    // 홀수 꼬리는 병합 없이 다음 라운드로 이월
                    slots[pair_idx] = Some(tail.clone());
                    continue;
                }

                let staged = self.workdir.join(format!("round{rounds}_pair{pair_idx}.json"));
                let invocation = merge_invocation(pair, &staged, self.timeout);
                let runner = Arc::clone(&self.runner);
                invocations += 1;
                counter!(MERGE_INVOCATIONS_TOTAL, LABEL_STRATEGY => self.strategy.as_str())
                    .increment(1);

                handles.push((
                    pair_idx,
                    staged,
                    tokio::spawn(async move { runner.run(&invocation).await }),
                ));
            }

            for (pair_idx, staged, handle) in handles {
                let tool_output = handle
                    .await
                    .map_err(|e| AggregatorError::Task(format!("merge task failed: {e}")))??;

                if tool_output.status == ToolStatus::Cancelled {
                    return Err(AggregatorError::Cancelled);
                }
                if !tool_output.status.is_success() {
                    // 어느 라운드의 실패든 최종 산출물을 무효화하므로 전체 중단
                    return Err(AggregatorError::MergeTool(format!(
                        "round {rounds}: {}",
                        tool_output.describe()
                    )));
                }
                if tokio::fs::metadata(&staged).await.is_err() {
                    return Err(AggregatorError::MergeTool(format!(
                        "round {rounds}: merge tool exited successfully but wrote no output"
                    )));
                }
                slots[pair_idx] = Some(staged);
            }

            current = slots.into_iter().flatten().collect();
        }

        persist_artifact(&current[0], output).await?;
        Ok(MergeStats {
            invocations,
            rounds,
        })
    }

    /// N항 병합 프리미티브를 한 번 호출합니다.
    async fn reduce_bulk(
        &self,
        artifacts: &[PathBuf],
        output: &Path,
    ) -> Result<MergeStats, AggregatorError> {
        let staged = self.workdir.join("merged.json");
        let invocation = merge_invocation(artifacts, &staged, self.timeout);
        counter!(MERGE_INVOCATIONS_TOTAL, LABEL_STRATEGY => self.strategy.as_str()).increment(1);

        let tool_output = self.runner.run(&invocation).await?;
        if tool_output.status == ToolStatus::Cancelled {
            return Err(AggregatorError::Cancelled);
        }
        if !tool_output.status.is_success() {
            return Err(AggregatorError::MergeTool(tool_output.describe()));
        }
        if tokio::fs::metadata(&staged).await.is_err() {
            return Err(AggregatorError::MergeTool(
                "merge tool exited successfully but wrote no output".to_owned(),
            ));
        }

        persist_artifact(&staged, output).await?;
        Ok(MergeStats {
            invocations: 1,
            rounds: 1,
        })
    }
}

/// 외부 병합 도구 호출을 구성합니다.
///
/// 이진 병합과 N항 병합은 같은 도구의 입력 개수만 다른 호출입니다.
fn merge_invocation(inputs: &[PathBuf], output: &Path, timeout: Duration) -> ToolInvocation {
    let mut args = vec![
        "merge".to_owned(),
        "--input-format".to_owned(),
        "json".to_owned(),
        "--output-format".to_owned(),
        "json".to_owned(),
        "--output-file".to_owned(),
        output.display().to_string(),
        "--input-files".to_owned(),
    ];
    args.extend(inputs.iter().map(|p| p.display().to_string()));

    ToolInvocation {
        program: "cyclonedx".to_owned(),
        args,
        cwd: None,
        timeout,
    }
}

/// 단일 입력을 출력 경로로 복사합니다.
async fn copy_artifact(source: &Path, output: &Path) -> Result<(), AggregatorError> {
    if let Err(e) = tokio::fs::copy(source, output).await {
        // 부분 복사본을 남기지 않도록 정리 시도
        let _ = tokio::fs::remove_file(output).await;
        return Err(AggregatorError::Persist {
            path: output.display().to_string(),
            reason: e.to_string(),
        });
    }
    Ok(())
}

/// 스테이징된 결과를 출력 경로로 옮깁니다.
///
/// 작업 디렉토리와 출력 경로가 다른 파일시스템에 있을 수 있으므로
/// rename 실패 시 복사로 대체합니다.
async fn persist_artifact(staged: &Path, output: &Path) -> Result<(), AggregatorError> {
    match tokio::fs::rename(staged, output).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            warn!(
                staged = %staged.display(),
                output = %output.display(),
                error = %rename_err,
                "rename failed, falling back to copy"
            );
            copy_artifact(staged, output).await?;
            let _ = tokio::fs::remove_file(staged).await;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::runner::ToolOutput;

    /// `--output-file` 인자에 파일을 만들어 주는 병합 도구 흉내
    struct FakeMergeTool {
        invocations: AtomicUsize,
        /// 라운드 구조 검증용: 호출별 입력 파일 수
        input_counts: Mutex<Vec<usize>>,
        fail: bool,
        write_output: bool,
    }

    impl FakeMergeTool {
        fn new() -> Self {
            Self {
                invocations: AtomicUsize::new(0),
                input_counts: Mutex::new(Vec::new()),
                fail: false,
                write_output: true,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn silent() -> Self {
            Self {
                write_output: false,
                ..Self::new()
            }
        }

        fn count(&self) -> usize {
            self.invocations.load(Ordering::SeqCst)
        }
    }

    impl ToolRunner for FakeMergeTool {
        async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, AggregatorError> {
            self.invocations.fetch_add(1, Ordering::SeqCst);

            let output_idx = invocation
                .args
                .iter()
                .position(|a| a == "--output-file")
                .unwrap()
                + 1;
            let inputs_idx = invocation
                .args
                .iter()
                .position(|a| a == "--input-files")
                .unwrap()
                + 1;
            self.input_counts
                .lock()
                .unwrap()
                .push(invocation.args.len() - inputs_idx);

            if self.fail {
                return Ok(ToolOutput {
                    status: ToolStatus::Exited(2),
                    stderr: "merge conflict".to_owned(),
                });
            }
            if self.write_output {
                std::fs::write(&invocation.args[output_idx], "merged").unwrap();
            }
            Ok(ToolOutput {
                status: ToolStatus::Exited(0),
                stderr: String::new(),
            })
        }
    }

    fn make_artifacts(dir: &Path, n: usize) -> Vec<PathBuf> {
        (0..n)
            .map(|i| {
                let path = dir.join(format!("artifact{i}.json"));
                std::fs::write(&path, format!("{{\"id\":{i}}}")).unwrap();
                path
            })
            .collect()
    }

    fn reducer(
        runner: Arc<FakeMergeTool>,
        strategy: MergeStrategy,
        workdir: &Path,
    ) -> MergeReducer<FakeMergeTool> {
        MergeReducer::new(
            runner,
            strategy,
            Duration::from_secs(5),
            workdir.to_path_buf(),
        )
    }

    #[test]
    fn strategy_parses_loosely() {
        assert_eq!(
            MergeStrategy::from_str_loose("Pairwise"),
            Some(MergeStrategy::Pairwise)
        );
        assert_eq!(
            MergeStrategy::from_str_loose("BULK"),
            Some(MergeStrategy::Bulk)
        );
        assert_eq!(MergeStrategy::from_str_loose("tree"), None);
    }

    #[tokio::test]
    async fn single_input_is_copied_without_merging() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = make_artifacts(dir.path(), 1);
        let output = dir.path().join("sbom.json");

        let tool = Arc::new(FakeMergeTool::new());
        let stats = reducer(Arc::clone(&tool), MergeStrategy::Pairwise, dir.path())
            .reduce(&artifacts, &output)
            .await
            .unwrap();

        assert_eq!(stats, MergeStats { invocations: 0, rounds: 0 });
        assert_eq!(tool.count(), 0);
        // 출력 내용이 입력과 동일
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            std::fs::read_to_string(&artifacts[0]).unwrap()
        );
    }

    #[tokio::test]
    async fn pairwise_five_inputs_take_four_invocations_in_three_rounds() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = make_artifacts(dir.path(), 5);
        let output = dir.path().join("sbom.json");

        let tool = Arc::new(FakeMergeTool::new());
        let stats = reducer(Arc::clone(&tool), MergeStrategy::Pairwise, dir.path())
            .reduce(&artifacts, &output)
            .await
            .unwrap();

        // 5 → 3 → 2 → 1: 라운드별 2+1+1 = 4회 호출
        assert_eq!(stats, MergeStats { invocations: 4, rounds: 3 });
        assert_eq!(tool.count(), 4);
        assert!(output.exists());
        // 모든 호출이 정확히 두 입력을 받음 (이진 프리미티브)
        assert!(tool.input_counts.lock().unwrap().iter().all(|&n| n == 2));
    }

    #[tokio::test]
    async fn pairwise_two_inputs_take_one_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = make_artifacts(dir.path(), 2);
        let output = dir.path().join("sbom.json");

        let tool = Arc::new(FakeMergeTool::new());
        let stats = reducer(Arc::clone(&tool), MergeStrategy::Pairwise, dir.path())
            .reduce(&artifacts, &output)
            .await
            .unwrap();

        assert_eq!(stats, MergeStats { invocations: 1, rounds: 1 });
    }

    #[tokio::test]
    async fn pairwise_eight_inputs_take_seven_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = make_artifacts(dir.path(), 8);
        let output = dir.path().join("sbom.json");

        let tool = Arc::new(FakeMergeTool::new());
        let stats = reducer(Arc::clone(&tool), MergeStrategy::Pairwise, dir.path())
            .reduce(&artifacts, &output)
            .await
            .unwrap();

        assert_eq!(stats, MergeStats { invocations: 7, rounds: 3 });
    }

    #[tokio::test]
    async fn bulk_merges_in_one_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = make_artifacts(dir.path(), 5);
        let output = dir.path().join("sbom.json");

        let tool = Arc::new(FakeMergeTool::new());
        let stats = reducer(Arc::clone(&tool), MergeStrategy::Bulk, dir.path())
            .reduce(&artifacts, &output)
            .await
            .unwrap();

        assert_eq!(stats, MergeStats { invocations: 1, rounds: 1 });
        assert_eq!(tool.count(), 1);
        // 한 번의 호출에 전체 입력 전달
        assert_eq!(*tool.input_counts.lock().unwrap(), vec![5]);
        assert!(output.exists());
    }

    #[tokio::test]
    async fn failing_tool_aborts_and_leaves_output_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = make_artifacts(dir.path(), 3);
        let output = dir.path().join("sbom.json");
        std::fs::write(&output, "stale-but-valid").unwrap();

        let tool = Arc::new(FakeMergeTool::failing());
        let err = reducer(Arc::clone(&tool), MergeStrategy::Pairwise, dir.path())
            .reduce(&artifacts, &output)
            .await
            .unwrap_err();

        assert!(matches!(err, AggregatorError::MergeTool(_)));
        assert!(err.to_string().contains("merge conflict"));
        // 기존 출력은 그대로
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "stale-but-valid");
    }

    #[tokio::test]
    async fn bulk_failure_leaves_output_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = make_artifacts(dir.path(), 3);
        let output = dir.path().join("sbom.json");

        let tool = Arc::new(FakeMergeTool::failing());
        let err = reducer(Arc::clone(&tool), MergeStrategy::Bulk, dir.path())
            .reduce(&artifacts, &output)
            .await
            .unwrap_err();

        assert!(matches!(err, AggregatorError::MergeTool(_)));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn vanished_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifacts = make_artifacts(dir.path(), 2);
        artifacts.push(dir.path().join("vanished.json"));
        let output = dir.path().join("sbom.json");

        let tool = Arc::new(FakeMergeTool::new());
        let err = reducer(Arc::clone(&tool), MergeStrategy::Pairwise, dir.path())
            .reduce(&artifacts, &output)
            .await
            .unwrap_err();

        assert!(matches!(err, AggregatorError::MergeInputMissing { .. }));
        // 존재 검증은 병합 호출보다 먼저 수행됨
        assert_eq!(tool.count(), 0);
    }

    #[tokio::test]
    async fn tool_writing_no_output_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = make_artifacts(dir.path(), 2);
        let output = dir.path().join("sbom.json");

        let tool = Arc::new(FakeMergeTool::silent());
        let err = reducer(Arc::clone(&tool), MergeStrategy::Bulk, dir.path())
            .reduce(&artifacts, &output)
            .await
            .unwrap_err();

        assert!(matches!(err, AggregatorError::MergeTool(_)));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn empty_input_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("sbom.json");

        let tool = Arc::new(FakeMergeTool::new());
        let err = reducer(tool, MergeStrategy::Pairwise, dir.path())
            .reduce(&[], &output)
            .await
            .unwrap_err();

        assert!(matches!(err, AggregatorError::MergeTool(_)));
    }
}
