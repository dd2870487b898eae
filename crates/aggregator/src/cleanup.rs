//! 산출물 정리 -- 병합 성공 후 중간 산출물 제거
//!
//! [`ArtifactCleaner`]는 병합이 성공한 뒤에만 호출되어 프로젝트별 중간
//! 산출물을 제거합니다. 병합 실패 시에는 호출되지 않으며, 중간 산출물은
//! 진단을 위해 그대로 남습니다.
//!
//! 이미 제거된 파일은 정상 종료 상태로 간주합니다. 그 외의 삭제 실패도
//! 에러로 표면화하지 않습니다. 정리는 최선 노력(best-effort)입니다.

use std::path::PathBuf;

use metrics::counter;
use tracing::debug;

use monobom_core::metrics::CLEANUP_REMOVED_TOTAL;

/// 중간 산출물 정리기
pub struct ArtifactCleaner;

impl ArtifactCleaner {
    /// 새 정리기를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 나열된 중간 산출물을 제거합니다.
    pub async fn cleanup(&self, paths: &[PathBuf]) {
        for path in paths {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {
                    counter!(CLEANUP_REMOVED_TOTAL).increment(1);
                    debug!(path = %path.display(), "removed intermediate artifact");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    // 이미 제거된 상태는 허용되는 종료 상태
                }
                Err(e) => {
                    debug!(
                        path = %path.display(),
                        error = %e,
                        "failed to remove intermediate artifact, ignoring"
                    );
                }
            }
        }
    }
}

impl Default for ArtifactCleaner {
    fn default() -> Self {
        Self::new()
    }
}
