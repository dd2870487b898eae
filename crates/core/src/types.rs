//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 탐색, 생성, 병합 단계가 주고받는 데이터 구조를 정의합니다.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// 빌드 생태계 종류
///
/// 마커 파일의 존재로 판별되는 닫힌 분류입니다.
/// 새 생태계를 추가하려면 variant와 분류 테이블 항목을 함께 추가합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EcosystemKind {
    /// Cargo 기반 Rust 프로젝트 (`Cargo.toml`)
    Cargo,
    /// Gradle 기반 JVM 프로젝트 (`build.gradle.kts` / `build.gradle`)
    Gradle,
    /// Nix flake 기반 시스템 패키징 (`flake.nix`)
    Nix,
}

impl EcosystemKind {
    /// 설정 파일과 메트릭 레이블에 쓰이는 고정 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cargo => "cargo",
            Self::Gradle => "gradle",
            Self::Nix => "nix",
        }
    }

    /// 느슨한 문자열 매칭으로 생태계를 파싱합니다 (대소문자 무시).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cargo" | "rust" => Some(Self::Cargo),
            "gradle" | "jvm" => Some(Self::Gradle),
            "nix" => Some(Self::Nix),
            _ => None,
        }
    }
}

impl fmt::Display for EcosystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 탐색 루트 지정
///
/// 설정 입력으로만 생성되며 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSpec {
    /// 탐색 시작 디렉토리
    pub path: PathBuf,
    /// true이면 하위 트리 전체를 탐색, false이면 루트 디렉토리만 검사
    pub recursive: bool,
}

/// 분류된 프로젝트 디스크립터
///
/// 탐색 단계에서 생성되어 생성 단계에서 한 번 소비됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    /// 프로젝트 디렉토리
    pub path: PathBuf,
    /// 판별된 생태계
    pub kind: EcosystemKind,
}

impl fmt::Display for ProjectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path.display(), self.kind)
    }
}

/// 프로젝트별 SBOM 생성 결과
///
/// 실패한 결과는 `artifact`를 갖지 않으며 병합 전에 걸러집니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutcome {
    /// 생성 대상 프로젝트
    pub project: ProjectDescriptor,
    /// 생성된 산출물 경로 (성공 시에만 Some)
    pub artifact: Option<PathBuf>,
    /// 생성 성공 여부
    pub succeeded: bool,
    /// 실패 진단 텍스트 (생성기 stderr, 타임아웃 등)
    pub diagnostic: Option<String>,
}

impl GenerationOutcome {
    /// 성공 결과를 생성합니다.
    pub fn success(project: ProjectDescriptor, artifact: PathBuf) -> Self {
        Self {
            project,
            artifact: Some(artifact),
            succeeded: true,
            diagnostic: None,
        }
    }

    /// 실패 결과를 생성합니다. 산출물은 갖지 않습니다.
    pub fn failure(project: ProjectDescriptor, diagnostic: impl Into<String>) -> Self {
        Self {
            project,
            artifact: None,
            succeeded: false,
            diagnostic: Some(diagnostic.into()),
        }
    }
}

/// 파이프라인 실패 분류
///
/// 프로젝트 단위 실패(생성 실패)는 여기 속하지 않습니다.
/// 실행 전체를 종료시키는 상태만 분류합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineFailure {
    /// 어떤 루트에서도 SBOM 생성 가능한 프로젝트를 찾지 못함
    NoProjects,
    /// 생성 단계 이후 산출물이 하나도 남지 않음
    NoArtifacts,
    /// 병합 실패 (사유 포함). 중간 산출물은 진단을 위해 보존됩니다.
    Merge(String),
    /// 협조적 취소로 중단됨
    Cancelled,
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoProjects => write!(f, "no sbom-capable projects discovered"),
            Self::NoArtifacts => write!(f, "no artifacts produced"),
            Self::Merge(reason) => write!(f, "merge failed: {reason}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// 파이프라인 실행 결과 보고
///
/// 호출자에게 반환되는 최종 값이며 프로세스 종료 코드를 결정합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// 실행 식별자 (UUID v4)
    pub run_id: String,
    /// 생성을 시도한 프로젝트 수
    pub projects_attempted: usize,
    /// 생성에 성공한 프로젝트 수
    pub projects_succeeded: usize,
    /// 병합 성공 여부
    pub merge_succeeded: bool,
    /// 최종 통합 SBOM 경로 (성공 시에만 Some)
    pub final_artifact: Option<PathBuf>,
    /// 실행 전체를 종료시킨 실패 (성공 시 None)
    pub failure: Option<PipelineFailure>,
}

impl PipelineReport {
    /// 전체 성공 여부: 프로젝트 1개 이상 발견, 생성 1개 이상 성공, 병합 성공.
    pub fn is_success(&self) -> bool {
        self.failure.is_none() && self.merge_succeeded && self.final_artifact.is_some()
    }
}
