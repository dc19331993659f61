//! Batch request units sent to the remote catalog.

use crate::ids::{AppId, PackageId};
use serde::{Deserialize, Serialize};

/// One package in a "describe packages" batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRequest {
    pub package_id: PackageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<u64>,
}

impl PackageRequest {
    pub fn new(package_id: PackageId, access_token: Option<u64>) -> Self {
        Self {
            package_id,
            access_token: access_token.filter(|t| *t != 0),
        }
    }
}

/// One application in a "describe applications" batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRequest {
    pub app_id: AppId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<u64>,
}

impl AppRequest {
    pub fn new(app_id: AppId, access_token: Option<u64>) -> Self {
        Self {
            app_id,
            access_token: access_token.filter(|t| *t != 0),
        }
    }
}
