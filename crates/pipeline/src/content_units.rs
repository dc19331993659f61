//! Content-unit discovery and decryption-key fan-out.
//!
//! Applications are described in chunks. Each chunk yields a deduplicated
//! candidate list, and every candidate gets one decryption-key request with
//! a bounded number in flight. Keys are staged in a concurrent map and only
//! merged into `ContentKeys` once the whole chunk has finished.

use crate::context::SyncContext;
use crate::state::PipelineState;
use dashmap::DashMap;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::HashSet;
use std::sync::Arc;
use tokensync_core::config::SyncConfig;
use tokensync_core::{AppId, AppRequest, ContentUnitId};
use tokensync_session::AppInfo;
use tokio::sync::Semaphore;
use tracing::instrument;

/// A content unit to request, and the application to request it through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub unit: ContentUnitId,
    pub app: AppId,
}

impl Candidate {
    pub fn new(unit: ContentUnitId, app: AppId) -> Self {
        Self { unit, app }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyOutcome {
    Stored,
    Denied,
    Failed,
}

/// Discover content units for every requested application and fetch their keys.
#[instrument(skip_all, fields(apps = requests.len()))]
pub async fn resolve_content_units(
    ctx: &SyncContext,
    state: &mut PipelineState,
    requests: &[AppRequest],
) {
    for (chunk_index, chunk) in requests.chunks(ctx.batch_size()).enumerate() {
        if !ctx.connection.is_connected() {
            tracing::info!(chunk = chunk_index, "Session lost, waiting for reconnect");
            ctx.connection.wait_reconnected().await;
        }

        let infos = match ctx
            .retry
            .run(&ctx.connection, "describe_applications", || {
                ctx.session.describe_applications(chunk)
            })
            .await
        {
            Ok(infos) => infos,
            Err(e) => {
                tracing::warn!(
                    chunk = chunk_index,
                    size = chunk.len(),
                    attempts = ctx.retry.attempts(),
                    error = %e,
                    "Describing applications failed, skipping chunk"
                );
                state.record_chunk_failure();
                continue;
            }
        };

        state.stats.apps_described += infos.len();

        let candidates = collect_candidates(chunk, &infos, &ctx.config, state);
        tracing::debug!(
            chunk = chunk_index,
            candidates = candidates.len(),
            "Collected content units"
        );

        fetch_keys(ctx, state, candidates).await;
    }

    tracing::info!(
        requested = state.stats.keys_requested,
        ok = state.stats.keys_ok,
        denied = state.stats.keys_denied,
        failed = state.stats.keys_failed,
        "Fetched decryption keys"
    );
}

/// Build the deduplicated candidate list for one chunk.
///
/// Every application in the chunk is its own default content unit. Declared
/// units are dropped when they are borrowed from an excluded source
/// application, are not numeric, belong to a skip-listed DLC, or already
/// have a key.
pub fn collect_candidates(
    chunk: &[AppRequest],
    infos: &[AppInfo],
    config: &SyncConfig,
    state: &PipelineState,
) -> Vec<Candidate> {
    let mut seen: HashSet<ContentUnitId> = HashSet::new();
    let mut candidates = Vec::new();

    for request in chunk {
        let unit = ContentUnitId::from(request.app_id);
        if state.result.has_content_key(unit) {
            continue;
        }
        if seen.insert(unit) {
            candidates.push(Candidate::new(unit, request.app_id));
        }
    }

    for info in infos {
        for decl in &info.content_units {
            if decl
                .source_app
                .is_some_and(|source| config.excluded_source_apps.contains(&source))
            {
                continue;
            }
            let Ok(unit) = ContentUnitId::parse(&decl.id) else {
                continue;
            };
            if decl
                .dlc_app
                .is_some_and(|dlc| state.is_app_skipped(dlc) || config.skip_apps.contains(&dlc))
            {
                continue;
            }
            if state.result.has_content_key(unit) {
                continue;
            }
            if seen.insert(unit) {
                candidates.push(Candidate::new(unit, info.app_id));
            }
        }
    }

    candidates
}

async fn fetch_keys(ctx: &SyncContext, state: &mut PipelineState, candidates: Vec<Candidate>) {
    if candidates.is_empty() {
        return;
    }

    let semaphore = Arc::new(Semaphore::new(ctx.config.key_fetch_concurrency.max(1)));
    let staged: Arc<DashMap<ContentUnitId, String>> = Arc::new(DashMap::new());
    let timeout = ctx.config.key_timeout();
    state.stats.keys_requested += candidates.len();

    let mut tasks = FuturesUnordered::new();
    for candidate in candidates {
        let session = ctx.session.clone();
        let sem = semaphore.clone();
        let staged = staged.clone();

        tasks.push(tokio::spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return KeyOutcome::Failed;
            };

            match tokio::time::timeout(
                timeout,
                session.get_decryption_key(candidate.unit, candidate.app),
            )
            .await
            {
                Ok(Ok(response)) if response.is_ok() && !response.key.is_empty() => {
                    staged.insert(candidate.unit, response.key.to_hex());
                    KeyOutcome::Stored
                }
                Ok(Ok(response)) => {
                    tracing::debug!(
                        unit = %candidate.unit,
                        app = %candidate.app,
                        result = ?response.result,
                        "Decryption key not granted"
                    );
                    KeyOutcome::Denied
                }
                Ok(Err(e)) => {
                    tracing::debug!(unit = %candidate.unit, error = %e, "Decryption key request failed");
                    KeyOutcome::Failed
                }
                Err(_) => {
                    tracing::debug!(unit = %candidate.unit, "Decryption key request timed out");
                    KeyOutcome::Failed
                }
            }
        }));
    }

    let mut failed = 0usize;
    while let Some(joined) = tasks.next().await {
        match joined {
            Ok(KeyOutcome::Stored) => state.stats.keys_ok += 1,
            Ok(KeyOutcome::Denied) => state.stats.keys_denied += 1,
            Ok(KeyOutcome::Failed) => failed += 1,
            Err(e) => {
                tracing::debug!(error = %e, "Decryption key task aborted");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        tracing::warn!(failed, "Some decryption key requests failed");
        state.stats.keys_failed += failed;
        state.mark_partial_failure();
    }

    let keys: Vec<(ContentUnitId, String)> = match Arc::try_unwrap(staged) {
        Ok(map) => map.into_iter().collect(),
        Err(shared) => shared
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect(),
    };
    state.result.extend_content_keys(keys);
}
