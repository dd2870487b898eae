//! 프로젝트 탐색 -- 설정된 루트에서 SBOM 생성 가능한 프로젝트 수집
//!
//! [`ProjectDiscoverer`]는 각 [`RootSpec`]을 순회하며 방문한 디렉토리를
//! [`MarkerClassifier`]로 분류하고, 매칭된 [`ProjectDescriptor`] 목록을
//! 결정적 순서(루트 순서, 그다음 파일명 정렬 순 탐색 순서)로 반환합니다.
//!
//! # 동작 규칙
//!
//! - 디렉토리가 아닌 루트는 경고 후 건너뜁니다. 다른 루트의 탐색은
//!   계속됩니다.
//! - `recursive` 루트는 하위 트리 전체를 독립적으로 분류합니다. 매칭된
//!   프로젝트의 하위 디렉토리도 별도의 프로젝트일 수 있으므로 가지치기를
//!   하지 않습니다.
//! - 비재귀 루트는 루트 디렉토리 자체만 검사합니다.
//! - 매칭이 하나도 없는 결과는 에러가 아닙니다. 치명 여부는 호출자가
//!   결정합니다.
//!
//! 동기 I/O를 수행하므로 비동기 문맥에서는 `tokio::task::spawn_blocking`
//! 내에서 호출해야 합니다.

use std::collections::HashSet;
use std::path::PathBuf;

use metrics::counter;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use monobom_core::metrics::{
    DISCOVERY_PROJECTS_TOTAL, DISCOVERY_ROOTS_SKIPPED_TOTAL, LABEL_ECOSYSTEM,
};
use monobom_core::types::{EcosystemKind, ProjectDescriptor, RootSpec};

use crate::classify::MarkerClassifier;

/// 프로젝트 탐색기
pub struct ProjectDiscoverer {
    classifier: MarkerClassifier,
}

impl ProjectDiscoverer {
    /// 기본 분류기로 탐색기를 생성합니다.
    pub fn new() -> Self {
        Self {
            classifier: MarkerClassifier::new(),
        }
    }

    /// 분류기를 지정하여 탐색기를 생성합니다.
    pub fn with_classifier(classifier: MarkerClassifier) -> Self {
        Self { classifier }
    }

    /// 모든 루트를 탐색하여 분류된 프로젝트의 합집합을 반환합니다.
    ///
    /// 루트가 겹쳐 같은 디렉토리가 두 번 매칭되어도 디스크립터는 한 번만
    /// 포함됩니다.
    pub fn discover(&self, roots: &[RootSpec]) -> Vec<ProjectDescriptor> {
        let mut projects = Vec::new();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for root in roots {
            if !root.path.is_dir() {
                warn!(path = %root.path.display(), "configured root is not a directory, skipping");
                counter!(DISCOVERY_ROOTS_SKIPPED_TOTAL).increment(1);
                continue;
            }

            if root.recursive {
                self.walk_subtree(root, &mut projects, &mut seen);
            } else {
                self.inspect_single(root, &mut projects, &mut seen);
            }
        }

        info!(count = projects.len(), "discovery completed");
        projects
    }

    /// 비재귀 루트: 루트 디렉토리 자체만 분류합니다.
    fn inspect_single(
        &self,
        root: &RootSpec,
        projects: &mut Vec<ProjectDescriptor>,
        seen: &mut HashSet<PathBuf>,
    ) {
        match self.classifier.classify_dir(&root.path) {
            Ok(Some(kind)) => {
                record(root.path.clone(), kind, projects, seen);
            }
            Ok(None) => {
                info!(
                    path = %root.path.display(),
                    "no known marker file in non-recursive root"
                );
            }
            Err(e) => {
                warn!(path = %root.path.display(), error = %e, "failed to read root directory, skipping");
            }
        }
    }

    /// 재귀 루트: 하위 트리의 모든 디렉토리를 독립적으로 분류합니다.
    fn walk_subtree(
        &self,
        root: &RootSpec,
        projects: &mut Vec<ProjectDescriptor>,
        seen: &mut HashSet<PathBuf>,
    ) {
        // sort_by_file_name으로 탐색 순서를 결정적으로 고정
        for entry in WalkDir::new(&root.path)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(root = %root.path.display(), error = %e, "walk error, skipping entry");
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            match self.classifier.classify_dir(entry.path()) {
                Ok(Some(kind)) => {
                    record(entry.path().to_path_buf(), kind, projects, seen);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "failed to read directory, skipping");
                }
            }
        }
    }
}

/// 중복을 거르고 디스크립터를 추가합니다.
fn record(
    path: PathBuf,
    kind: EcosystemKind,
    projects: &mut Vec<ProjectDescriptor>,
    seen: &mut HashSet<PathBuf>,
) {
    if !seen.insert(path.clone()) {
        debug!(path = %path.display(), "directory already matched by an earlier root");
        return;
    }
    debug!(path = %path.display(), kind = %kind, "classified project");
    counter!(DISCOVERY_PROJECTS_TOTAL, LABEL_ECOSYSTEM => kind.as_str()).increment(1);
    projects.push(ProjectDescriptor { path, kind });
}

impl Default for ProjectDiscoverer {
    fn default() -> Self {
        Self::new()
    }
}
