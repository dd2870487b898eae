//! SBOM 생성 디스패치 -- 생태계별 외부 생성기 계약
//!
//! [`GeneratorTable`]은 [`EcosystemKind`]를 외부 생성기 호출 계약
//! (명령, 인자, 기대 산출물 경로)으로 매핑합니다. 파이프라인의 나머지는
//! 이 계약에만 의존하며 구체 명령줄을 알지 못합니다.
//!
//! # 생성기 계약
//!
//! | 생태계 | 명령 | 산출물 (프로젝트 기준 상대 경로) |
//! |--------|------|----------------------------------|
//! | cargo  | `cargo cyclonedx --override-filename <stem> --format json --top-level` | `<stem>.json` |
//! | gradle | `./gradlew cyclonedxBom` | `build/reports/bom.json` |
//! | nix    | `nix build .#sbom --out-link <stem>.json` | `<stem>.json` |
//!
//! 모든 생성기는 프로젝트 디렉토리를 작업 디렉토리로 하여 실행됩니다.

pub mod executor;

use std::collections::HashSet;
use std::path::PathBuf;

use monobom_core::types::EcosystemKind;

/// 생태계 하나의 외부 생성기 호출 계약
#[derive(Debug, Clone)]
pub struct GeneratorSpec {
    /// 실행할 프로그램
    pub program: String,
    /// 인자 목록
    pub args: Vec<String>,
    /// 기대 산출물 경로 (프로젝트 디렉토리 기준 상대 경로)
    pub artifact: PathBuf,
}

/// 생태계 → 생성기 계약 디스패치 테이블
///
/// 산출물 파일명(stem)은 파이프라인 실행 단위 설정으로 주입되며,
/// 프로세스 전역 고정 이름을 사용하지 않습니다.
pub struct GeneratorTable {
    artifact_stem: String,
    enabled: HashSet<EcosystemKind>,
}

impl GeneratorTable {
    /// 주어진 산출물 stem과 활성 생태계 집합으로 테이블을 생성합니다.
    pub fn new(
        artifact_stem: impl Into<String>,
        enabled: impl IntoIterator<Item = EcosystemKind>,
    ) -> Self {
        Self {
            artifact_stem: artifact_stem.into(),
            enabled: enabled.into_iter().collect(),
        }
    }

    /// 생태계의 생성기 계약을 조회합니다.
    ///
    /// 비활성화된 생태계는 `None`을 반환합니다. 호출자는 이를 해당
    /// 프로젝트만의 설정 오류로 처리하며 배치 전체를 중단하지 않습니다.
    pub fn lookup(&self, kind: EcosystemKind) -> Option<GeneratorSpec> {
        if !self.enabled.contains(&kind) {
            return None;
        }

        let stem = &self.artifact_stem;
        Some(match kind {
            EcosystemKind::Cargo => GeneratorSpec {
                program: "cargo".to_owned(),
                args: vec![
                    "cyclonedx".to_owned(),
                    "--override-filename".to_owned(),
                    stem.clone(),
                    "--format".to_owned(),
                    "json".to_owned(),
                    "--top-level".to_owned(),
                ],
                artifact: PathBuf::from(format!("{stem}.json")),
            },
            EcosystemKind::Gradle => GeneratorSpec {
                program: "./gradlew".to_owned(),
                args: vec!["cyclonedxBom".to_owned()],
                artifact: PathBuf::from("build/reports/bom.json"),
            },
            EcosystemKind::Nix => GeneratorSpec {
                program: "nix".to_owned(),
                args: vec![
                    "build".to_owned(),
                    ".#sbom".to_owned(),
                    "--out-link".to_owned(),
                    format!("{stem}.json"),
                ],
                artifact: PathBuf::from(format!("{stem}.json")),
            },
        })
    }
}
