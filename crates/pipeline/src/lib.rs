//! Bulk synchronization pipeline for tokensync.
//!
//! One run walks the catalog hierarchy strictly forward:
//! - License classification (no remote calls)
//! - Package resolution into the owned-application set
//! - Access-token fetch for owned applications
//! - Content-unit discovery and decryption-key fan-out
//!
//! Remote failures never abort a run. A chunk that exhausts its retries is
//! dropped and the run-wide partial-failure flag is raised instead.

pub mod content_units;
pub mod context;
pub mod error;
pub mod licenses;
pub mod packages;
pub mod retry;
pub mod state;
pub mod tokens;

pub use content_units::{Candidate, collect_candidates, resolve_content_units};
pub use context::SyncContext;
pub use error::{PipelineError, PipelineResult};
pub use licenses::classify_licenses;
pub use packages::resolve_packages;
pub use retry::RetryPolicy;
pub use state::{PipelineState, SyncOutcome, SyncStats};
pub use tokens::fetch_access_tokens;

use std::sync::Arc;
use tokensync_core::config::SyncConfig;
use tokensync_session::CatalogSession;

/// A configured sync pipeline bound to one session.
pub struct Pipeline {
    ctx: SyncContext,
}

impl Pipeline {
    pub fn new(session: Arc<dyn CatalogSession>, config: SyncConfig) -> PipelineResult<Self> {
        config.validate().map_err(PipelineError::Config)?;
        Ok(Self {
            ctx: SyncContext::new(session, config),
        })
    }

    /// Run every phase once and return whatever was collected.
    ///
    /// Never fails: an error escaping a phase is logged and recorded as a
    /// partial failure, and the outcome still carries everything gathered
    /// up to that point.
    pub async fn run(&self) -> SyncOutcome {
        tracing::info!(backend = self.ctx.session.backend_name(), "Starting sync run");

        let mut state = PipelineState::new(String::new());
        if let Err(e) = self.run_phases(&mut state).await {
            tracing::error!(error = %e, "Sync run aborted early");
            state.mark_partial_failure();
        }
        state.finalize(&self.ctx.config.skip_apps);

        let outcome = state.into_outcome();
        tracing::info!(
            subs = outcome.result.subs.len(),
            apps = outcome.result.apps.len(),
            content_keys = outcome.result.content_keys.len(),
            partial_failure = outcome.partial_failure,
            "Sync run finished"
        );
        outcome
    }

    async fn run_phases(&self, state: &mut PipelineState) -> PipelineResult<()> {
        let ctx = &self.ctx;

        let snapshot = ctx
            .retry
            .run(&ctx.connection, "snapshot", || ctx.session.snapshot())
            .await?;
        state.result.identity = snapshot.identity;
        tracing::info!(licenses = snapshot.licenses.len(), "Loaded license grants");

        let package_requests = classify_licenses(&snapshot.licenses, &ctx.config, state);
        let owned = resolve_packages(ctx, state, &package_requests).await;
        let app_requests = fetch_access_tokens(ctx, state, &owned).await;

        if ctx.config.skip_decryption_keys {
            tracing::info!("Skipping decryption keys as configured");
        } else {
            resolve_content_units(ctx, state, &app_requests).await;
        }

        Ok(())
    }
}
