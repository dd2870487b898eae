//! 집계 파이프라인 에러 타입
//!
//! [`AggregatorError`]는 파이프라인 내부에서 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<AggregatorError> for MonobomError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! 프로젝트 단위의 생성 실패는 에러가 아니라 [`GenerationOutcome`]으로
//! 집계된다는 점에 유의하세요. 여기 정의된 variant는 실행 전체 또는
//! 병합 단계를 중단시키는 상태만 다룹니다.
//!
//! [`GenerationOutcome`]: monobom_core::types::GenerationOutcome

use monobom_core::error::{ConfigError, MonobomError, PipelineError};

/// 집계 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 외부 도구 프로세스 생성 실패
    #[error("failed to spawn '{program}': {reason}")]
    Spawn {
        /// 실행하려던 프로그램
        program: String,
        /// 실패 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 백그라운드 태스크 실패
    #[error("task error: {0}")]
    Task(String),

    /// 병합 도구 실패 (비정상 종료, 타임아웃, 출력 미생성)
    #[error("merge tool failed: {0}")]
    MergeTool(String),

    /// 병합 입력 산출물이 호출 시점에 존재하지 않음
    #[error("merge input missing: {path}")]
    MergeInputMissing {
        /// 사라진 산출물 경로
        path: String,
    },

    /// 병합 결과를 출력 경로로 옮기지 못함
    #[error("failed to persist merge result to {path}: {reason}")]
    Persist {
        /// 출력 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 협조적 취소로 중단됨
    #[error("cancelled")]
    Cancelled,
}

impl From<AggregatorError> for MonobomError {
    fn from(err: AggregatorError) -> Self {
        match err {
            AggregatorError::Config { field, reason } => {
                MonobomError::Config(ConfigError::InvalidValue { field, reason })
            }
            AggregatorError::Spawn { program, reason } => MonobomError::Pipeline(
                PipelineError::Generation(format!("failed to spawn '{program}': {reason}")),
            ),
            AggregatorError::Io { path, source } => MonobomError::Pipeline(PipelineError::Task(
                format!("io error: {path}: {source}"),
            )),
            AggregatorError::Task(msg) => MonobomError::Pipeline(PipelineError::Task(msg)),
            AggregatorError::MergeTool(msg) => MonobomError::Pipeline(PipelineError::Merge(msg)),
            AggregatorError::MergeInputMissing { path } => MonobomError::Pipeline(
                PipelineError::Merge(format!("input artifact missing: {path}")),
            ),
            AggregatorError::Persist { path, reason } => MonobomError::Pipeline(
                PipelineError::Merge(format!("failed to persist result to {path}: {reason}")),
            ),
            AggregatorError::Cancelled => MonobomError::Pipeline(PipelineError::Cancelled),
        }
    }
}
