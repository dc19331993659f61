//! Core domain types and shared logic for tokensync.
//!
//! This crate defines the data model used across all other crates:
//! - Numeric catalog identifiers (packages, applications, content units)
//! - License grants and batch request units
//! - Decryption keys
//! - The result aggregate submitted at the end of a run
//! - Configuration for the sync pipeline, session backends and submission

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod error;
pub mod ids;
pub mod key;
pub mod license;

pub use aggregate::ResultAggregate;
pub use batch::{AppRequest, PackageRequest};
pub use error::{Error, Result};
pub use ids::{AppId, ContentUnitId, PackageId};
pub use key::DecryptionKey;
pub use license::{LicenseGrant, PaymentMethod};

/// Maximum number of units the remote service accepts in one batch call.
pub const MAX_BATCH_SIZE: usize = 200;

/// Default number of decryption-key requests allowed in flight at once.
pub const DEFAULT_KEY_FETCH_CONCURRENCY: usize = 200;

/// Schema version stamped on every result aggregate.
pub const RESULT_SCHEMA_VERSION: u32 = 2;

/// Applications whose content units are shared redistributables or engine runtimes.
///
/// Content units derived from these applications are never requested.
pub const DEFAULT_EXCLUDED_SOURCE_APPS: [u32; 2] = [228980, 1391110];
