//! The result aggregate produced by one sync run.
//!
//! On the wire every map is keyed by the decimal identifier and every value
//! is a string: access tokens in decimal, decryption keys in lowercase hex.

use crate::ids::{AppId, ContentUnitId, PackageId};
use crate::key::DecryptionKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flattened catalog data submitted at the end of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultAggregate {
    /// Schema version of this document.
    pub version: u32,
    /// Identity of the process/account that produced the data.
    pub identity: String,
    /// Package id → access token.
    pub subs: BTreeMap<PackageId, String>,
    /// Application id → access token.
    pub apps: BTreeMap<AppId, String>,
    /// Content-unit id → hex decryption key.
    pub content_keys: BTreeMap<ContentUnitId, String>,
}

impl ResultAggregate {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            version: crate::RESULT_SCHEMA_VERSION,
            identity: identity.into(),
            ..Self::default()
        }
    }

    pub fn insert_sub(&mut self, package: PackageId, token: u64) {
        self.subs.insert(package, token.to_string());
    }

    pub fn insert_app(&mut self, app: AppId, token: u64) {
        self.apps.insert(app, token.to_string());
    }

    /// Remove an application, returning whether it was present.
    pub fn remove_app(&mut self, app: AppId) -> bool {
        self.apps.remove(&app).is_some()
    }

    pub fn has_content_key(&self, unit: ContentUnitId) -> bool {
        self.content_keys.contains_key(&unit)
    }

    pub fn insert_content_key(&mut self, unit: ContentUnitId, key: &DecryptionKey) {
        self.content_keys.insert(unit, key.to_hex());
    }

    /// Merge already hex-encoded keys, e.g. a staged fan-out batch.
    pub fn extend_content_keys(&mut self, keys: impl IntoIterator<Item = (ContentUnitId, String)>) {
        self.content_keys.extend(keys);
    }

    /// Remove a content key, returning whether it was present.
    pub fn remove_content_key(&mut self, unit: ContentUnitId) -> bool {
        self.content_keys.remove(&unit).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty() && self.apps.is_empty() && self.content_keys.is_empty()
    }

    /// Serialize as the JSON document expected by the submission endpoint.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(|e| crate::Error::Serialization(e.to_string()))
    }

    /// Serialize as indented JSON for local dumps.
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| crate::Error::Serialization(e.to_string()))
    }
}
