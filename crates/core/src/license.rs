//! License grants.

use crate::ids::PackageId;
use serde::{Deserialize, Serialize};

/// How a license was obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Granted automatically to every account (free packages, demos, tools).
    AutoGrant,
    /// Granted without payment by the publisher.
    Complimentary,
    /// Bought.
    Purchase,
    /// Any tag this client does not know about.
    #[default]
    #[serde(other)]
    Other,
}

/// A caller's entitlement to a package.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseGrant {
    pub package_id: PackageId,
    /// Package access token. Zero means the license carries no token.
    #[serde(default)]
    pub access_token: u64,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl LicenseGrant {
    pub fn new(package_id: PackageId, access_token: u64, payment_method: PaymentMethod) -> Self {
        Self {
            package_id,
            access_token,
            payment_method,
        }
    }

    /// The access token, if the grant carries one.
    pub fn token(&self) -> Option<u64> {
        (self.access_token != 0).then_some(self.access_token)
    }

    pub fn is_auto_grant(&self) -> bool {
        self.payment_method == PaymentMethod::AutoGrant
    }
}
