//! 집계 파이프라인 설정
//!
//! [`AggregatorConfig`]는 core의 [`MonobomConfig`]에서 파이프라인 실행에
//! 필요한 값을 도메인 타입으로 변환해 담습니다.
//!
//! # 사용 예시
//!
//! ```
//! use monobom_aggregator::AggregatorConfigBuilder;
//! use monobom_core::types::RootSpec;
//!
//! let config = AggregatorConfigBuilder::new()
//!     .roots(vec![RootSpec {
//!         path: "rust".into(),
//!         recursive: false,
//!     }])
//!     .worker_limit(8)
//!     .build()
//!     .unwrap();
//! ```

use std::path::PathBuf;

use tracing::warn;

use monobom_core::config::MonobomConfig;
use monobom_core::types::{EcosystemKind, RootSpec};

use crate::error::AggregatorError;
use crate::merge::MergeStrategy;

/// 집계 파이프라인 설정
///
/// core 설정의 문자열 필드(전략, 생태계)를 파싱된 도메인 타입으로 담습니다.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// 탐색 루트 (순서 유지)
    pub roots: Vec<RootSpec>,
    /// 동시 생성기 실행 상한
    pub worker_limit: usize,
    /// 생성기 호출당 타임아웃 (초)
    pub generate_timeout_secs: u64,
    /// 프로젝트별 중간 산출물 파일명 (확장자 제외)
    pub artifact_stem: String,
    /// 활성화된 생태계 목록
    pub ecosystems: Vec<EcosystemKind>,
    /// 병합 전략
    pub strategy: MergeStrategy,
    /// 최종 통합 SBOM 출력 경로
    pub output_path: PathBuf,
    /// 병합 호출당 타임아웃 (초)
    pub merge_timeout_secs: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::from_core(&MonobomConfig::default())
    }
}

/// 설정 상한값 상수
const MAX_WORKER_LIMIT: usize = 64;
const MAX_TIMEOUT_SECS: u64 = 3600;

impl AggregatorConfig {
    /// core의 [`MonobomConfig`]에서 파이프라인 설정을 생성합니다.
    ///
    /// 알 수 없는 생태계/전략 문자열은 경고 후 무시하거나 기본값으로
    /// 대체합니다. core의 `validate()`를 통과한 설정이라면 발생하지
    /// 않습니다.
    pub fn from_core(core: &MonobomConfig) -> Self {
        let mut ecosystems = Vec::new();
        for name in &core.generate.ecosystems {
            match EcosystemKind::from_str_loose(name) {
                Some(kind) => ecosystems.push(kind),
                None => warn!(ecosystem = %name, "unknown ecosystem in config, ignoring"),
            }
        }

        let strategy = MergeStrategy::from_str_loose(&core.merge.strategy).unwrap_or_else(|| {
            warn!(
                strategy = %core.merge.strategy,
                "unknown merge strategy in config, falling back to pairwise"
            );
            MergeStrategy::default()
        });

        Self {
            roots: core.discovery.roots.iter().map(|r| r.to_spec()).collect(),
            worker_limit: core.generate.worker_limit,
            generate_timeout_secs: core.generate.timeout_secs,
            artifact_stem: core.generate.artifact_stem.clone(),
            ecosystems,
            strategy,
            output_path: PathBuf::from(&core.merge.output_path),
            merge_timeout_secs: core.merge.timeout_secs,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), AggregatorError> {
        if self.roots.is_empty() {
            return Err(AggregatorError::Config {
                field: "roots".to_owned(),
                reason: "at least one root is required".to_owned(),
            });
        }

        if self.worker_limit == 0 || self.worker_limit > MAX_WORKER_LIMIT {
            return Err(AggregatorError::Config {
                field: "worker_limit".to_owned(),
                reason: format!("must be 1-{MAX_WORKER_LIMIT}"),
            });
        }

        if self.generate_timeout_secs == 0 || self.generate_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(AggregatorError::Config {
                field: "generate_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_TIMEOUT_SECS}"),
            });
        }

        if self.merge_timeout_secs == 0 || self.merge_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(AggregatorError::Config {
                field: "merge_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_TIMEOUT_SECS}"),
            });
        }

        if self.artifact_stem.is_empty()
            || self.artifact_stem.contains(['/', '\\'])
            || self.artifact_stem == ".."
        {
            return Err(AggregatorError::Config {
                field: "artifact_stem".to_owned(),
                reason: "must be a non-empty bare file name".to_owned(),
            });
        }

        if self.ecosystems.is_empty() {
            return Err(AggregatorError::Config {
                field: "ecosystems".to_owned(),
                reason: "at least one ecosystem must be enabled".to_owned(),
            });
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(AggregatorError::Config {
                field: "output_path".to_owned(),
                reason: "output path must not be empty".to_owned(),
            });
        }

        Ok(())
    }
}

/// [`AggregatorConfig`] 빌더
///
/// 유연한 설정 구성 및 빌드 시 유효성 검증을 제공합니다.
#[derive(Default)]
pub struct AggregatorConfigBuilder {
    config: AggregatorConfig,
}

impl AggregatorConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 탐색 루트를 설정합니다.
    pub fn roots(mut self, roots: Vec<RootSpec>) -> Self {
        self.config.roots = roots;
        self
    }

    /// 동시 생성기 실행 상한을 설정합니다.
    pub fn worker_limit(mut self, limit: usize) -> Self {
        self.config.worker_limit = limit;
        self
    }

    /// 생성기 호출당 타임아웃(초)을 설정합니다.
    pub fn generate_timeout_secs(mut self, secs: u64) -> Self {
        self.config.generate_timeout_secs = secs;
        self
    }

    /// 중간 산출물 파일명을 설정합니다.
    pub fn artifact_stem(mut self, stem: impl Into<String>) -> Self {
        self.config.artifact_stem = stem.into();
        self
    }

    /// 활성화할 생태계 목록을 설정합니다.
    pub fn ecosystems(mut self, ecosystems: Vec<EcosystemKind>) -> Self {
        self.config.ecosystems = ecosystems;
        self
    }

    /// 병합 전략을 설정합니다.
    pub fn strategy(mut self, strategy: MergeStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// 최종 출력 경로를 설정합니다.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    /// 병합 호출당 타임아웃(초)을 설정합니다.
    pub fn merge_timeout_secs(mut self, secs: u64) -> Self {
        self.config.merge_timeout_secs = secs;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `AggregatorError::Config` 반환
    pub fn build(self) -> Result<AggregatorConfig, AggregatorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        AggregatorConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_parses_domain_types() {
        let core = MonobomConfig::parse(
            r#"
[[discovery.roots]]
path = "rust"
recursive = true

[generate]
worker_limit = 8
ecosystems = ["cargo", "gradle"]

[merge]
strategy = "bulk"
output_path = "out/sbom.json"
"#,
        )
        .unwrap();
        let config = AggregatorConfig::from_core(&core);

        assert_eq!(config.roots.len(), 1);
        assert!(config.roots[0].recursive);
        assert_eq!(config.worker_limit, 8);
        assert_eq!(
            config.ecosystems,
            vec![EcosystemKind::Cargo, EcosystemKind::Gradle]
        );
        assert_eq!(config.strategy, MergeStrategy::Bulk);
        assert_eq!(config.output_path, PathBuf::from("out/sbom.json"));
    }

    #[test]
    fn from_core_falls_back_on_unknown_strategy() {
        let mut core = MonobomConfig::default();
        core.merge.strategy = "unknown".to_owned();
        let config = AggregatorConfig::from_core(&core);
        assert_eq!(config.strategy, MergeStrategy::Pairwise);
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = AggregatorConfig::default();
        config.worker_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_roots() {
        let mut config = AggregatorConfig::default();
        config.roots.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_artifact_stem_with_separator() {
        let mut config = AggregatorConfig::default();
        config.artifact_stem = "a/b".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_ecosystems() {
        let mut config = AggregatorConfig::default();
        config.ecosystems.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_applies_setters_and_validates() {
        let config = AggregatorConfigBuilder::new()
            .worker_limit(2)
            .generate_timeout_secs(60)
            .artifact_stem("sub_bom")
            .strategy(MergeStrategy::Bulk)
            .output_path("proj_sbom.json")
            .merge_timeout_secs(120)
            .build()
            .unwrap();

        assert_eq!(config.worker_limit, 2);
        assert_eq!(config.artifact_stem, "sub_bom");
        assert_eq!(config.strategy, MergeStrategy::Bulk);
        assert_eq!(config.output_path, PathBuf::from("proj_sbom.json"));
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = AggregatorConfigBuilder::new().worker_limit(0).build();
        assert!(result.is_err());
    }
}
