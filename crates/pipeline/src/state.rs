//! Mutable state threaded through every phase of one run.

use std::collections::BTreeSet;
use tokensync_core::{AppId, ContentUnitId, PackageId, ResultAggregate};

/// Counters collected during a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub licenses: usize,
    pub packages_described: usize,
    pub apps_owned: usize,
    pub tokens_granted: usize,
    pub tokens_denied: usize,
    pub tokens_nonzero: usize,
    pub apps_described: usize,
    pub keys_requested: usize,
    pub keys_ok: usize,
    pub keys_denied: usize,
    pub keys_failed: usize,
    pub chunks_failed: usize,
}

/// Pipeline-owned state for one run.
///
/// Skip sets only ever grow. Anything that lands in them is stripped from
/// the result by [`PipelineState::finalize`], however late it was skipped.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub result: ResultAggregate,
    pub stats: SyncStats,
    skip_packages: BTreeSet<PackageId>,
    skip_apps: BTreeSet<AppId>,
    partial_failure: bool,
}

impl PipelineState {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            result: ResultAggregate::new(identity),
            ..Self::default()
        }
    }

    /// Returns true if the package was not already skip-listed.
    pub fn skip_package(&mut self, package: PackageId) -> bool {
        self.skip_packages.insert(package)
    }

    pub fn is_package_skipped(&self, package: PackageId) -> bool {
        self.skip_packages.contains(&package)
    }

    /// Returns true if the application was not already skip-listed.
    pub fn skip_app(&mut self, app: AppId) -> bool {
        self.skip_apps.insert(app)
    }

    pub fn is_app_skipped(&self, app: AppId) -> bool {
        self.skip_apps.contains(&app)
    }

    pub fn skipped_packages(&self) -> &BTreeSet<PackageId> {
        &self.skip_packages
    }

    pub fn skipped_apps(&self) -> &BTreeSet<AppId> {
        &self.skip_apps
    }

    /// Raise the run-wide "some request failed" flag.
    pub fn mark_partial_failure(&mut self) {
        self.partial_failure = true;
    }

    /// Record a chunk abandoned after its retries ran out.
    pub fn record_chunk_failure(&mut self) {
        self.stats.chunks_failed += 1;
        self.mark_partial_failure();
    }

    pub fn partial_failure(&self) -> bool {
        self.partial_failure
    }

    /// Remove skip-listed and explicitly excluded applications from the
    /// result, including their default content unit.
    pub fn finalize(&mut self, excluded: &BTreeSet<AppId>) {
        let apps: Vec<AppId> = self.skip_apps.union(excluded).copied().collect();
        let mut removed = 0usize;
        for app in apps {
            if self.result.remove_app(app) {
                removed += 1;
            }
            if self.result.remove_content_key(ContentUnitId::from(app)) {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!(removed, "Stripped skip-listed entries from result");
        }
    }

    pub fn into_outcome(self) -> SyncOutcome {
        SyncOutcome {
            result: self.result,
            stats: self.stats,
            skipped_packages: self.skip_packages,
            skipped_apps: self.skip_apps,
            partial_failure: self.partial_failure,
        }
    }
}

/// What a finished run hands to the caller.
#[derive(Debug)]
pub struct SyncOutcome {
    pub result: ResultAggregate,
    pub stats: SyncStats,
    pub skipped_packages: BTreeSet<PackageId>,
    pub skipped_apps: BTreeSet<AppId>,
    /// Set when any request failed for good; the result is then incomplete.
    pub partial_failure: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_sets_report_first_insert() {
        let mut state = PipelineState::new("acct");
        assert!(state.skip_package(PackageId::new(3)));
        assert!(!state.skip_package(PackageId::new(3)));
        assert!(state.is_package_skipped(PackageId::new(3)));
        assert!(state.skip_app(AppId::new(20)));
        assert!(state.is_app_skipped(AppId::new(20)));
    }

    #[test]
    fn chunk_failure_raises_flag() {
        let mut state = PipelineState::new("acct");
        assert!(!state.partial_failure());
        state.record_chunk_failure();
        assert!(state.partial_failure());
        assert_eq!(state.stats.chunks_failed, 1);
    }

    #[test]
    fn finalize_strips_late_skips_and_exclusions() {
        let mut state = PipelineState::new("acct");
        state.result.insert_app(AppId::new(10), 7);
        state.result.insert_app(AppId::new(20), 9);
        state.result.insert_app(AppId::new(30), 1);
        state.result.extend_content_keys([
            (ContentUnitId::new(20), "aa".to_string()),
            (ContentUnitId::new(21), "bb".to_string()),
        ]);

        state.skip_app(AppId::new(20));
        state.finalize(&BTreeSet::from([AppId::new(30)]));

        let outcome = state.into_outcome();
        assert_eq!(outcome.result.apps.len(), 1);
        assert!(outcome.result.apps.contains_key(&AppId::new(10)));
        assert!(!outcome.result.content_keys.contains_key(&ContentUnitId::new(20)));
        assert!(outcome.result.content_keys.contains_key(&ContentUnitId::new(21)));
    }
}
