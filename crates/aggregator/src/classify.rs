//! 프로젝트 분류기 -- 마커 파일 기반 생태계 판별
//!
//! [`MarkerClassifier`]는 디렉토리 목록에서 알려진 마커 파일을 찾아
//! 해당 디렉토리의 빌드 생태계를 판별합니다.
//!
//! # 우선순위
//!
//! 테이블은 우선순위 순으로 정렬되어 있으며 첫 매칭이 승리합니다.
//! 한 디렉토리에 `Cargo.toml`과 `build.gradle`이 함께 있으면
//! `Cargo`로 분류됩니다.
//!
//! # 확장
//!
//! 새 생태계를 지원하려면 [`EcosystemKind`] variant와 테이블 항목을
//! 함께 추가합니다. 제어 흐름 변경은 필요하지 않습니다.

use std::collections::HashSet;
use std::path::Path;

use monobom_core::types::EcosystemKind;

/// 마커 파일 분류기
///
/// 우선순위 순 마커 파일명 테이블을 기반으로 디렉토리를 분류합니다.
/// 순수 조회만 수행하며 파일시스템 접근은 [`classify_dir`](Self::classify_dir)
/// 편의 메서드에만 있습니다.
pub struct MarkerClassifier {
    /// (마커 파일명, 생태계) 우선순위 순 테이블
    markers: Vec<(String, EcosystemKind)>,
}

impl MarkerClassifier {
    /// 기본 마커 테이블로 분류기를 생성합니다.
    pub fn new() -> Self {
        Self {
            markers: vec![
                ("Cargo.toml".to_owned(), EcosystemKind::Cargo),
                ("build.gradle.kts".to_owned(), EcosystemKind::Gradle),
                ("build.gradle".to_owned(), EcosystemKind::Gradle),
                ("flake.nix".to_owned(), EcosystemKind::Nix),
            ],
        }
    }

    /// 마커 테이블을 반환합니다 (우선순위 순).
    pub fn markers(&self) -> &[(String, EcosystemKind)] {
        &self.markers
    }

    /// 이미 얻어둔 디렉토리 목록에서 생태계를 판별합니다.
    ///
    /// 매칭되는 마커가 없으면 `None`을 반환합니다. SBOM 생성이 불가능한
    /// 디렉토리는 정상적인 경우이며 에러가 아닙니다.
    pub fn classify<'a>(
        &self,
        file_names: impl IntoIterator<Item = &'a str>,
    ) -> Option<EcosystemKind> {
        let names: HashSet<&str> = file_names.into_iter().collect();
        self.markers
            .iter()
            .find(|(marker, _)| names.contains(marker.as_str()))
            .map(|(_, kind)| *kind)
    }

    /// 디렉토리를 읽어 생태계를 판별합니다.
    ///
    /// 일반 파일만 마커 후보로 취급합니다. 마커와 같은 이름의
    /// 하위 디렉토리는 무시됩니다.
    pub fn classify_dir(&self, dir: &Path) -> std::io::Result<Option<EcosystemKind>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Ok(name) = entry.file_name().into_string() {
                    names.push(name);
                }
            }
        }
        Ok(self.classify(names.iter().map(String::as_str)))
    }
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self::new()
    }
}
