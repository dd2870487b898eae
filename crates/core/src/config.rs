//! 설정 관리 — monobom.toml 파싱 및 런타임 설정
//!
//! [`MonobomConfig`]는 파이프라인 전 단계의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, CLI 크레이트에서 적용)
//! 2. 환경변수 (`MONOBOM_MERGE_STRATEGY=bulk` 형식)
//! 3. 설정 파일 (`monobom.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), monobom_core::error::MonobomError> {
//! use monobom_core::config::MonobomConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = MonobomConfig::load("monobom.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = MonobomConfig::parse("[merge]\nstrategy = \"bulk\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, MonobomError};
use crate::types::RootSpec;

/// Monobom 통합 설정
///
/// `monobom.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonobomConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 프로젝트 탐색 설정
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// SBOM 생성 설정
    #[serde(default)]
    pub generate: GenerateConfig,
    /// SBOM 병합 설정
    #[serde(default)]
    pub merge: MergeConfig,
}

impl MonobomConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, MonobomError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, MonobomError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MonobomError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                MonobomError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, MonobomError> {
        toml::from_str(toml_str).map_err(|e| {
            MonobomError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `MONOBOM_{SECTION}_{FIELD}`
    /// 예: `MONOBOM_MERGE_STRATEGY=bulk`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "MONOBOM_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "MONOBOM_GENERAL_LOG_FORMAT");

        // Generate
        override_usize(
            &mut self.generate.worker_limit,
            "MONOBOM_GENERATE_WORKER_LIMIT",
        );
        override_u64(
            &mut self.generate.timeout_secs,
            "MONOBOM_GENERATE_TIMEOUT_SECS",
        );
        override_string(
            &mut self.generate.artifact_stem,
            "MONOBOM_GENERATE_ARTIFACT_STEM",
        );
        override_csv(&mut self.generate.ecosystems, "MONOBOM_GENERATE_ECOSYSTEMS");

        // Merge
        override_string(&mut self.merge.strategy, "MONOBOM_MERGE_STRATEGY");
        override_string(&mut self.merge.output_path, "MONOBOM_MERGE_OUTPUT_PATH");
        override_u64(&mut self.merge.timeout_secs, "MONOBOM_MERGE_TIMEOUT_SECS");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), MonobomError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // 탐색 루트 검증
        if self.discovery.roots.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "discovery.roots".to_owned(),
                reason: "at least one root is required".to_owned(),
            }
            .into());
        }
        for root in &self.discovery.roots {
            if root.path.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "discovery.roots".to_owned(),
                    reason: "root path must not be empty".to_owned(),
                }
                .into());
            }
        }

        // worker_limit 검증
        if self.generate.worker_limit == 0 || self.generate.worker_limit > MAX_WORKER_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "generate.worker_limit".to_owned(),
                reason: format!("must be 1-{MAX_WORKER_LIMIT}"),
            }
            .into());
        }

        // 타임아웃 검증
        if self.generate.timeout_secs == 0 || self.generate.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "generate.timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_TIMEOUT_SECS}"),
            }
            .into());
        }
        if self.merge.timeout_secs == 0 || self.merge.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "merge.timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_TIMEOUT_SECS}"),
            }
            .into());
        }

        // artifact_stem 검증: 중간 산출물 파일명이므로 경로 구분자를 가질 수 없음
        if self.generate.artifact_stem.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "generate.artifact_stem".to_owned(),
                reason: "artifact stem must not be empty".to_owned(),
            }
            .into());
        }
        if self.generate.artifact_stem.contains(['/', '\\'])
            || self.generate.artifact_stem == ".."
        {
            return Err(ConfigError::InvalidValue {
                field: "generate.artifact_stem".to_owned(),
                reason: "artifact stem must be a bare file name".to_owned(),
            }
            .into());
        }

        // 생태계 목록 검증
        if self.generate.ecosystems.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "generate.ecosystems".to_owned(),
                reason: "at least one ecosystem must be enabled".to_owned(),
            }
            .into());
        }
        let valid_ecosystems = ["cargo", "gradle", "nix"];
        for eco in &self.generate.ecosystems {
            if !valid_ecosystems.contains(&eco.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "generate.ecosystems".to_owned(),
                    reason: format!("unknown ecosystem '{eco}'"),
                }
                .into());
            }
        }

        // merge.strategy 검증
        let valid_strategies = ["pairwise", "bulk"];
        if !valid_strategies.contains(&self.merge.strategy.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "merge.strategy".to_owned(),
                reason: format!("must be one of: {}", valid_strategies.join(", ")),
            }
            .into());
        }

        // 출력 경로 검증
        if self.merge.output_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "merge.output_path".to_owned(),
                reason: "output path must not be empty".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 설정 상한값 상수
const MAX_WORKER_LIMIT: usize = 64;
const MAX_TIMEOUT_SECS: u64 = 3600; // 1 hour

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 프로젝트 탐색 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// 탐색 루트 목록 (순서 유지)
    pub roots: Vec<RootEntry>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            roots: vec![RootEntry {
                path: ".".to_owned(),
                recursive: false,
            }],
        }
    }
}

/// 탐색 루트 한 항목
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootEntry {
    /// 탐색 시작 디렉토리
    pub path: String,
    /// 하위 트리 전체 탐색 여부
    #[serde(default)]
    pub recursive: bool,
}

impl RootEntry {
    /// 도메인 타입 [`RootSpec`]으로 변환합니다.
    pub fn to_spec(&self) -> RootSpec {
        RootSpec {
            path: self.path.clone().into(),
            recursive: self.recursive,
        }
    }
}

/// SBOM 생성 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// 동시 생성기 실행 상한
    pub worker_limit: usize,
    /// 생성기 호출당 타임아웃 (초)
    pub timeout_secs: u64,
    /// 프로젝트별 중간 산출물 파일명 (확장자 제외)
    pub artifact_stem: String,
    /// 활성화된 생태계 목록 (cargo, gradle, nix)
    pub ecosystems: Vec<String>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            worker_limit: 4,
            timeout_secs: 600, // 10 minutes; gradle cold starts are slow
            artifact_stem: "bom".to_owned(),
            ecosystems: vec!["cargo".to_owned(), "gradle".to_owned(), "nix".to_owned()],
        }
    }
}

/// SBOM 병합 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// 병합 전략 (pairwise, bulk)
    pub strategy: String,
    /// 최종 통합 SBOM 출력 경로
    pub output_path: String,
    /// 병합 호출당 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            strategy: "pairwise".to_owned(),
            output_path: "sbom.json".to_owned(),
            timeout_secs: 300, // 5 minutes
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
