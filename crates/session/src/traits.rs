//! Session trait definitions.

use crate::connection::ConnectionWatch;
use crate::error::SessionResult;
use crate::types::{AccessTokens, AppInfo, DecryptionKeyResponse, PackageInfo, SessionSnapshot};
use async_trait::async_trait;
use tokensync_core::{AppId, AppRequest, ContentUnitId, PackageRequest};

/// An authenticated session against the remote catalog service.
///
/// Batch operations accept at most [`tokensync_core::MAX_BATCH_SIZE`] units;
/// callers are responsible for chunking. Implementations never retry on their
/// own, and none of these calls carry a timeout of their own beyond what the
/// transport enforces.
#[async_trait]
pub trait CatalogSession: Send + Sync + 'static {
    /// Human-readable backend name for logs.
    fn backend_name(&self) -> &'static str;

    /// Observe connectivity of the underlying session.
    fn connection(&self) -> ConnectionWatch;

    fn is_connected(&self) -> bool {
        self.connection().is_connected()
    }

    /// Identity of the logged-in account and its license grants.
    async fn snapshot(&self) -> SessionResult<SessionSnapshot>;

    /// Describe packages. Unknown packages are omitted from the reply.
    async fn describe_packages(
        &self,
        packages: &[PackageRequest],
    ) -> SessionResult<Vec<PackageInfo>>;

    /// Request access tokens for applications.
    async fn get_access_tokens(&self, apps: &[AppId]) -> SessionResult<AccessTokens>;

    /// Describe applications. Unknown applications are omitted from the reply.
    async fn describe_applications(&self, apps: &[AppRequest]) -> SessionResult<Vec<AppInfo>>;

    /// Request the decryption key of one content unit through its owning application.
    async fn get_decryption_key(
        &self,
        unit: ContentUnitId,
        app: AppId,
    ) -> SessionResult<DecryptionKeyResponse>;
}
