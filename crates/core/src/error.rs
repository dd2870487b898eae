//! 에러 타입 — 도메인별 에러 정의

/// Monobom 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum MonobomError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
///
/// 집계 파이프라인 각 단계에서 발생하는 에러의 상위 분류입니다.
/// 단계별 상세 에러는 `monobom-aggregator`의 도메인 에러가 담당하며,
/// `From` 변환을 통해 이 타입으로 전파됩니다.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 프로젝트 탐색 실패
    #[error("discovery failed: {0}")]
    Discovery(String),

    /// SBOM 생성 실패
    #[error("generation failed: {0}")]
    Generation(String),

    /// SBOM 병합 실패
    #[error("merge failed: {0}")]
    Merge(String),

    /// 병합할 산출물이 하나도 없음
    #[error("no artifacts produced, nothing to merge")]
    NoArtifacts,

    /// 협조적 취소로 중단됨
    #[error("pipeline cancelled")]
    Cancelled,

    /// 백그라운드 태스크 실패
    #[error("task failed: {0}")]
    Task(String),
}
