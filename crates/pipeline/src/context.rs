//! Read-only inputs shared by every phase.

use crate::retry::RetryPolicy;
use std::sync::Arc;
use tokensync_core::config::SyncConfig;
use tokensync_session::{CatalogSession, ConnectionWatch};

pub struct SyncContext {
    pub session: Arc<dyn CatalogSession>,
    pub connection: ConnectionWatch,
    pub config: SyncConfig,
    pub retry: RetryPolicy,
}

impl SyncContext {
    pub fn new(session: Arc<dyn CatalogSession>, config: SyncConfig) -> Self {
        Self {
            connection: session.connection(),
            retry: RetryPolicy::from_config(&config),
            session,
            config,
        }
    }

    /// Units per batch call.
    pub fn batch_size(&self) -> usize {
        self.config.batch_size.clamp(1, tokensync_core::MAX_BATCH_SIZE)
    }
}
