//! Remote catalog session boundary for tokensync.
//!
//! This crate provides:
//! - The `CatalogSession` trait consumed by the sync pipeline
//! - Connectivity monitoring with a reconnect signal callers can await
//! - Backends: an HTTP gateway client and an offline JSON catalog

pub mod backends;
pub mod connection;
pub mod error;
pub mod traits;
pub mod types;

pub use backends::{fixture::Catalog, fixture::FixtureSession, http::HttpSession};
pub use connection::{ConnectionMonitor, ConnectionState, ConnectionWatch};
pub use error::{SessionError, SessionResult};
pub use traits::CatalogSession;
pub use types::{
    AccessTokens, AppInfo, ContentUnitDecl, DecryptionKeyResponse, KeyResult, PackageInfo,
    SessionSnapshot,
};

use std::sync::Arc;
use std::time::Duration;
use tokensync_core::config::SessionConfig;

/// Create a session from configuration.
pub async fn from_config(config: &SessionConfig) -> SessionResult<Arc<dyn CatalogSession>> {
    config.validate().map_err(SessionError::Config)?;

    match config {
        SessionConfig::Http {
            base_url,
            token,
            request_timeout_secs,
            probe_interval_secs,
        } => {
            let session = HttpSession::new(
                base_url,
                token.clone(),
                Duration::from_secs(*request_timeout_secs),
                Duration::from_secs(*probe_interval_secs),
            )?;
            Ok(Arc::new(session))
        }
        SessionConfig::Fixture { path } => {
            let session = FixtureSession::load(path).await?;
            Ok(Arc::new(session))
        }
    }
}
