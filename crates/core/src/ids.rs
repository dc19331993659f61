//! Numeric catalog identifiers.
//!
//! The remote catalog addresses every level of the hierarchy with an unsigned
//! 32-bit number. Each level gets its own newtype so package, application and
//! content-unit ids cannot be mixed up by accident.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw identifier.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw identifier.
            pub const fn get(self) -> u32 {
                self.0
            }

            /// Parse a decimal identifier.
            pub fn parse(s: &str) -> crate::Result<Self> {
                s.trim()
                    .parse::<u32>()
                    .map(Self)
                    .map_err(|e| crate::Error::InvalidId(format!("{} {s:?}: {e}", $label)))
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = crate::Error;

            fn from_str(s: &str) -> crate::Result<Self> {
                Self::parse(s)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a package (a bundle of applications granted by a license).
    PackageId,
    "package id"
);

numeric_id!(
    /// Identifier of an application.
    AppId,
    "app id"
);

numeric_id!(
    /// Identifier of a content unit (a downloadable, separately encrypted unit).
    ContentUnitId,
    "content unit id"
);

impl From<AppId> for ContentUnitId {
    /// Every application is also its own default content unit.
    fn from(app: AppId) -> Self {
        Self(app.0)
    }
}
