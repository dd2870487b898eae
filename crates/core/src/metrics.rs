//! 메트릭 상수 — 이름과 레이블 키 중앙 정의
//!
//! 모든 메트릭 이름을 한곳에서 정의합니다. 각 모듈은 이 상수를 사용하여
//! `metrics::counter!()`, `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `monobom_`
//! - 단계명: `discovery_`, `generate_`, `merge_`, `cleanup_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(monobom_core::metrics::GENERATE_RUNS_TOTAL,
//!     monobom_core::metrics::LABEL_RESULT => "success")
//!     .increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 생태계 레이블 키 (cargo, gradle, nix)
pub const LABEL_ECOSYSTEM: &str = "ecosystem";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 병합 전략 레이블 키 (pairwise, bulk)
pub const LABEL_STRATEGY: &str = "strategy";

// ─── Discovery 메트릭 ──────────────────────────────────────────────

/// Discovery: 분류된 프로젝트 수 (counter, label: ecosystem)
pub const DISCOVERY_PROJECTS_TOTAL: &str = "monobom_discovery_projects_total";

/// Discovery: 디렉토리가 아니어서 건너뛴 루트 수 (counter)
pub const DISCOVERY_ROOTS_SKIPPED_TOTAL: &str = "monobom_discovery_roots_skipped_total";

// ─── Generate 메트릭 ───────────────────────────────────────────────

/// Generate: 생성기 실행 수 (counter, labels: ecosystem, result)
pub const GENERATE_RUNS_TOTAL: &str = "monobom_generate_runs_total";

/// Generate: 생성기 실행 시간 (histogram, 초)
pub const GENERATE_DURATION_SECONDS: &str = "monobom_generate_duration_seconds";

// ─── Merge 메트릭 ──────────────────────────────────────────────────

/// Merge: 외부 병합 도구 호출 수 (counter, label: strategy)
pub const MERGE_INVOCATIONS_TOTAL: &str = "monobom_merge_invocations_total";

/// Merge: 병합 단계 전체 소요 시간 (histogram, 초)
pub const MERGE_DURATION_SECONDS: &str = "monobom_merge_duration_seconds";

// ─── Cleanup 메트릭 ────────────────────────────────────────────────

/// Cleanup: 제거된 중간 산출물 수 (counter)
pub const CLEANUP_REMOVED_TOTAL: &str = "monobom_cleanup_removed_total";
