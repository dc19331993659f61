//! Values exchanged with the remote catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokensync_core::{AppId, ContentUnitId, DecryptionKey, LicenseGrant, PackageId};

/// Who the session is logged in as, and what it owns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub identity: String,
    #[serde(default)]
    pub licenses: Vec<LicenseGrant>,
}

/// One package returned by "describe packages".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub package_id: PackageId,
    #[serde(default)]
    pub app_ids: Vec<AppId>,
    #[serde(default)]
    pub content_unit_ids: Vec<ContentUnitId>,
}

/// Reply to "get access tokens".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokens {
    /// Application → token. A zero token is still a grant.
    #[serde(default)]
    pub granted: BTreeMap<AppId, u64>,
    #[serde(default)]
    pub denied: Vec<AppId>,
}

/// One application returned by "describe applications".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub app_id: AppId,
    #[serde(default)]
    pub content_units: Vec<ContentUnitDecl>,
}

/// A content unit as declared by its owning application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUnitDecl {
    /// Raw identifier. Declarations also carry non-numeric bookkeeping
    /// entries, so this is not parsed until the pipeline filters it.
    pub id: String,
    /// Application this unit is borrowed from, if it is a cross-reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_app: Option<AppId>,
    /// DLC application that owns this unit, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dlc_app: Option<AppId>,
}

impl ContentUnitDecl {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_app: None,
            dlc_app: None,
        }
    }

    pub fn with_source_app(mut self, app: AppId) -> Self {
        self.source_app = Some(app);
        self
    }

    pub fn with_dlc_app(mut self, app: AppId) -> Self {
        self.dlc_app = Some(app);
        self
    }
}

/// Result code of a decryption-key request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyResult {
    Ok,
    AccessDenied,
    Fail,
    #[serde(other)]
    Other,
}

/// Reply to "get decryption key".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptionKeyResponse {
    pub result: KeyResult,
    pub key: DecryptionKey,
}

impl DecryptionKeyResponse {
    pub fn ok(key: DecryptionKey) -> Self {
        Self {
            result: KeyResult::Ok,
            key,
        }
    }

    pub fn denied() -> Self {
        Self {
            result: KeyResult::AccessDenied,
            key: DecryptionKey::from_bytes(Vec::new()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result == KeyResult::Ok
    }
}
