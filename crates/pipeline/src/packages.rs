//! Package resolution.
//!
//! Describes every licensed package in chunks and derives the set of
//! applications the account owns, filtering skip-listed ones on the way.

use crate::context::SyncContext;
use crate::state::PipelineState;
use std::collections::BTreeSet;
use tokensync_core::{AppId, PackageRequest};
use tracing::instrument;

/// Resolve the owned-application set.
///
/// A chunk whose call exhausts its retries is logged, recorded as a partial
/// failure and skipped; its applications are simply missing.
#[instrument(skip_all, fields(packages = requests.len()))]
pub async fn resolve_packages(
    ctx: &SyncContext,
    state: &mut PipelineState,
    requests: &[PackageRequest],
) -> BTreeSet<AppId> {
    let excluded = &ctx.config.skip_apps;
    let mut owned = BTreeSet::new();

    for (chunk_index, chunk) in requests.chunks(ctx.batch_size()).enumerate() {
        let packages = match ctx
            .retry
            .run(&ctx.connection, "describe_packages", || {
                ctx.session.describe_packages(chunk)
            })
            .await
        {
            Ok(packages) => packages,
            Err(e) => {
                tracing::warn!(
                    chunk = chunk_index,
                    size = chunk.len(),
                    attempts = ctx.retry.attempts(),
                    error = %e,
                    "Describing packages failed, skipping chunk"
                );
                state.record_chunk_failure();
                continue;
            }
        };

        state.stats.packages_described += packages.len();

        for package in packages {
            let package_skipped = state.is_package_skipped(package.package_id);
            for app in package.app_ids {
                if package_skipped || excluded.contains(&app) {
                    state.skip_app(app);
                } else {
                    owned.insert(app);
                }
            }
        }

        tracing::debug!(chunk = chunk_index, owned = owned.len(), "Described packages");
    }

    for app in excluded {
        state.result.remove_app(*app);
    }
    let skipped: Vec<AppId> = state.skipped_apps().iter().copied().collect();
    for app in &skipped {
        state.result.remove_app(*app);
        owned.remove(app);
    }

    state.stats.apps_owned = owned.len();
    tracing::info!(
        owned = owned.len(),
        skipped = skipped.len(),
        "Resolved owned applications"
    );

    owned
}
