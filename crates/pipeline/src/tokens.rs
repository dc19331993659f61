//! Application access tokens.

use crate::context::SyncContext;
use crate::state::PipelineState;
use std::collections::BTreeSet;
use tokensync_core::{AppId, AppRequest};
use tracing::instrument;

/// Fetch access tokens for the owned applications.
///
/// Non-zero tokens are written to `Apps`. Every granted application, zero
/// token or not, becomes an entry of the returned request list; denied
/// applications and those in failed chunks do not.
#[instrument(skip_all, fields(apps = apps.len()))]
pub async fn fetch_access_tokens(
    ctx: &SyncContext,
    state: &mut PipelineState,
    apps: &BTreeSet<AppId>,
) -> Vec<AppRequest> {
    let ids: Vec<AppId> = apps.iter().copied().collect();
    let mut requests = Vec::with_capacity(ids.len());

    for (chunk_index, chunk) in ids.chunks(ctx.batch_size()).enumerate() {
        let tokens = match ctx
            .retry
            .run(&ctx.connection, "get_access_tokens", || {
                ctx.session.get_access_tokens(chunk)
            })
            .await
        {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(
                    chunk = chunk_index,
                    size = chunk.len(),
                    attempts = ctx.retry.attempts(),
                    error = %e,
                    "Fetching access tokens failed, skipping chunk"
                );
                state.record_chunk_failure();
                continue;
            }
        };

        state.stats.tokens_denied += tokens.denied.len();

        for (app, token) in tokens.granted {
            state.stats.tokens_granted += 1;
            if token != 0 {
                state.stats.tokens_nonzero += 1;
                state.result.insert_app(app, token);
            }
            requests.push(AppRequest::new(app, Some(token)));
        }
    }

    tracing::info!(
        granted = state.stats.tokens_granted,
        denied = state.stats.tokens_denied,
        nonzero = state.stats.tokens_nonzero,
        "Fetched access tokens"
    );

    requests
}
