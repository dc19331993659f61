//! Offline catalog backend.
//!
//! Answers every operation from a JSON catalog document. The session is
//! always connected.

use crate::connection::{ConnectionMonitor, ConnectionWatch};
use crate::error::{SessionError, SessionResult};
use crate::traits::CatalogSession;
use crate::types::{
    AccessTokens, AppInfo, DecryptionKeyResponse, PackageInfo, SessionSnapshot,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tokensync_core::{
    AppId, AppRequest, ContentUnitId, DecryptionKey, LicenseGrant, PackageId, PackageRequest,
};
use tracing::instrument;

/// Catalog document read by [`FixtureSession`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub licenses: Vec<LicenseGrant>,
    #[serde(default)]
    pub packages: Vec<PackageInfo>,
    /// Tokens handed out by "get access tokens". Apps not listed get zero.
    #[serde(default)]
    pub access_tokens: BTreeMap<AppId, u64>,
    #[serde(default)]
    pub denied_apps: BTreeSet<AppId>,
    #[serde(default)]
    pub apps: Vec<AppInfo>,
    /// Content unit → hex key. Units not listed are denied.
    #[serde(default)]
    pub decryption_keys: BTreeMap<ContentUnitId, String>,
}

/// Session backed by an in-memory [`Catalog`].
pub struct FixtureSession {
    identity: String,
    licenses: Vec<LicenseGrant>,
    packages: HashMap<PackageId, PackageInfo>,
    access_tokens: BTreeMap<AppId, u64>,
    denied_apps: BTreeSet<AppId>,
    apps: HashMap<AppId, AppInfo>,
    keys: HashMap<ContentUnitId, DecryptionKey>,
    monitor: ConnectionMonitor,
}

impl FixtureSession {
    /// Load a catalog document from disk.
    pub async fn load(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let catalog: Catalog = serde_json::from_str(&raw).map_err(|e| {
            SessionError::Config(format!("invalid catalog {}: {e}", path.display()))
        })?;
        Self::from_catalog(catalog)
    }

    /// Build a session from a catalog already in memory.
    pub fn from_catalog(catalog: Catalog) -> SessionResult<Self> {
        let mut keys = HashMap::with_capacity(catalog.decryption_keys.len());
        for (unit, hex) in catalog.decryption_keys {
            let key = DecryptionKey::from_hex(&hex).map_err(|e| {
                SessionError::Config(format!("content unit {unit}: {e}"))
            })?;
            keys.insert(unit, key);
        }

        Ok(Self {
            identity: catalog.identity,
            licenses: catalog.licenses,
            packages: catalog
                .packages
                .into_iter()
                .map(|p| (p.package_id, p))
                .collect(),
            access_tokens: catalog.access_tokens,
            denied_apps: catalog.denied_apps,
            apps: catalog.apps.into_iter().map(|a| (a.app_id, a)).collect(),
            keys,
            monitor: ConnectionMonitor::connected(),
        })
    }
}

#[async_trait]
impl CatalogSession for FixtureSession {
    fn backend_name(&self) -> &'static str {
        "fixture"
    }

    fn connection(&self) -> ConnectionWatch {
        self.monitor.watch()
    }

    async fn snapshot(&self) -> SessionResult<SessionSnapshot> {
        Ok(SessionSnapshot {
            identity: self.identity.clone(),
            licenses: self.licenses.clone(),
        })
    }

    #[instrument(skip_all, fields(count = packages.len()))]
    async fn describe_packages(
        &self,
        packages: &[PackageRequest],
    ) -> SessionResult<Vec<PackageInfo>> {
        Ok(packages
            .iter()
            .filter_map(|req| self.packages.get(&req.package_id).cloned())
            .collect())
    }

    #[instrument(skip_all, fields(count = apps.len()))]
    async fn get_access_tokens(&self, apps: &[AppId]) -> SessionResult<AccessTokens> {
        let mut tokens = AccessTokens::default();
        for app in apps {
            if self.denied_apps.contains(app) {
                tokens.denied.push(*app);
            } else {
                let token = self.access_tokens.get(app).copied().unwrap_or(0);
                tokens.granted.insert(*app, token);
            }
        }
        Ok(tokens)
    }

    #[instrument(skip_all, fields(count = apps.len()))]
    async fn describe_applications(&self, apps: &[AppRequest]) -> SessionResult<Vec<AppInfo>> {
        Ok(apps
            .iter()
            .filter_map(|req| self.apps.get(&req.app_id).cloned())
            .collect())
    }

    async fn get_decryption_key(
        &self,
        unit: ContentUnitId,
        _app: AppId,
    ) -> SessionResult<DecryptionKeyResponse> {
        Ok(match self.keys.get(&unit) {
            Some(key) => DecryptionKeyResponse::ok(key.clone()),
            None => DecryptionKeyResponse::denied(),
        })
    }
}
