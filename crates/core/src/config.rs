//! Configuration types shared across crates.

use crate::ids::AppId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for a sync run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub submit: SubmitConfig,
}

impl AppConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.sync.validate()?;
        self.session.validate()?;
        self.submit.validate()
    }
}

/// Pipeline behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Skip packages whose license was auto-granted (default: true).
    #[serde(default = "default_skip_auto_grant")]
    pub skip_auto_grant: bool,
    /// Do not request content-unit decryption keys at all (default: false).
    #[serde(default)]
    pub skip_decryption_keys: bool,
    /// Applications that must never appear in the result.
    #[serde(default)]
    pub skip_apps: BTreeSet<AppId>,
    /// Units per batch call. The remote service rejects more than 200.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Maximum decryption-key requests in flight at once.
    #[serde(default = "default_key_fetch_concurrency")]
    pub key_fetch_concurrency: usize,
    /// Timeout for one batch call, in seconds.
    #[serde(default = "default_batch_timeout_secs")]
    pub batch_timeout_secs: u64,
    /// Timeout for one decryption-key call, in seconds.
    #[serde(default = "default_key_timeout_secs")]
    pub key_timeout_secs: u64,
    /// Content units derived from these applications are never requested.
    #[serde(default = "default_excluded_source_apps")]
    pub excluded_source_apps: Vec<AppId>,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_skip_auto_grant() -> bool {
    true
}

fn default_batch_size() -> usize {
    crate::MAX_BATCH_SIZE
}

fn default_key_fetch_concurrency() -> usize {
    crate::DEFAULT_KEY_FETCH_CONCURRENCY
}

fn default_batch_timeout_secs() -> u64 {
    60
}

fn default_key_timeout_secs() -> u64 {
    10
}

fn default_excluded_source_apps() -> Vec<AppId> {
    crate::DEFAULT_EXCLUDED_SOURCE_APPS
        .iter()
        .copied()
        .map(AppId::new)
        .collect()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            skip_auto_grant: default_skip_auto_grant(),
            skip_decryption_keys: false,
            skip_apps: BTreeSet::new(),
            batch_size: default_batch_size(),
            key_fetch_concurrency: default_key_fetch_concurrency(),
            batch_timeout_secs: default_batch_timeout_secs(),
            key_timeout_secs: default_key_timeout_secs(),
            excluded_source_apps: default_excluded_source_apps(),
            retry: RetryConfig::default(),
        }
    }
}

impl SyncConfig {
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }

    pub fn key_timeout(&self) -> Duration {
        Duration::from_secs(self.key_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 || self.batch_size > crate::MAX_BATCH_SIZE {
            return Err(format!(
                "sync.batch_size must be between 1 and {}, got {}",
                crate::MAX_BATCH_SIZE,
                self.batch_size
            ));
        }
        if self.key_fetch_concurrency == 0 {
            return Err("sync.key_fetch_concurrency must be at least 1".to_string());
        }
        if self.batch_timeout_secs == 0 || self.key_timeout_secs == 0 {
            return Err("sync timeouts must be at least 1 second".to_string());
        }
        if self.excluded_source_apps.len() != 2 {
            return Err(format!(
                "sync.excluded_source_apps must list exactly 2 applications, got {}",
                self.excluded_source_apps.len()
            ));
        }
        self.retry.validate()
    }
}

/// Retry behaviour for batch calls.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts per batch call, including the first.
    #[serde(default = "default_retry_attempts")]
    pub attempts: u32,
    /// Lower bound of the randomized delay between attempts.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    /// Upper bound of the randomized delay between attempts.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_min_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    1200
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_retry_attempts(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.attempts == 0 {
            return Err("sync.retry.attempts must be at least 1".to_string());
        }
        if self.min_delay_ms > self.max_delay_ms {
            return Err(format!(
                "sync.retry.min_delay_ms ({}) exceeds max_delay_ms ({})",
                self.min_delay_ms, self.max_delay_ms
            ));
        }
        Ok(())
    }
}

/// Session backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SessionConfig {
    /// JSON gateway in front of the remote catalog service.
    Http {
        /// Gateway base URL (e.g., "http://127.0.0.1:27080").
        base_url: String,
        /// Bearer token for the gateway, if it requires one.
        /// WARNING: Prefer TOKENSYNC_SESSION__TOKEN over storing it in a file.
        token: Option<String>,
        /// Per-request HTTP timeout in seconds.
        #[serde(default = "default_request_timeout_secs")]
        request_timeout_secs: u64,
        /// Interval between health probes while disconnected, in seconds.
        #[serde(default = "default_probe_interval_secs")]
        probe_interval_secs: u64,
    },
    /// Offline catalog loaded from a JSON file.
    Fixture {
        /// Path to the catalog document.
        path: PathBuf,
    },
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_probe_interval_secs() -> u64 {
    5
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            SessionConfig::Http {
                base_url,
                request_timeout_secs,
                probe_interval_secs,
                ..
            } => {
                if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                    return Err(format!(
                        "session.base_url must start with http:// or https://, got {base_url:?}"
                    ));
                }
                if *request_timeout_secs == 0 || *probe_interval_secs == 0 {
                    return Err("session timeouts must be at least 1 second".to_string());
                }
                Ok(())
            }
            SessionConfig::Fixture { path } => {
                if path.as_os_str().is_empty() {
                    return Err("session.path must not be empty".to_string());
                }
                Ok(())
            }
        }
    }
}

/// Result submission configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitConfig {
    /// Endpoint receiving the result document. No submission when unset.
    pub url: Option<String>,
    /// HTTP timeout for the submission, in seconds.
    #[serde(default = "default_submit_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_submit_timeout_secs() -> u64 {
    30
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_submit_timeout_secs(),
        }
    }
}

impl SubmitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        match &self.url {
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                return Err(format!(
                    "submit.url must start with http:// or https://, got {url:?}"
                ));
            }
            _ => {}
        }
        if self.timeout_secs == 0 {
            return Err("submit.timeout_secs must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_remote_limits() {
        let sync = SyncConfig::default();
        assert!(sync.skip_auto_grant);
        assert!(!sync.skip_decryption_keys);
        assert_eq!(sync.batch_size, 200);
        assert_eq!(sync.key_fetch_concurrency, 200);
        assert_eq!(sync.retry.attempts, 3);
        assert_eq!(sync.retry.min_delay_ms, 200);
        assert_eq!(sync.retry.max_delay_ms, 1200);
        assert_eq!(sync.excluded_source_apps.len(), 2);
        assert!(sync.validate().is_ok());
    }

    #[test]
    fn batch_size_above_remote_limit_is_rejected() {
        let sync = SyncConfig {
            batch_size: 201,
            ..SyncConfig::default()
        };
        assert!(sync.validate().unwrap_err().contains("batch_size"));
    }

    #[test]
    fn inverted_retry_delays_are_rejected() {
        let retry = RetryConfig {
            attempts: 3,
            min_delay_ms: 500,
            max_delay_ms: 100,
        };
        assert!(retry.validate().is_err());
    }

    #[test]
    fn parses_toml_with_fixture_session() {
        let config: AppConfig = toml::from_str(
            r#"
            [sync]
            skip_apps = [10, 20]
            skip_decryption_keys = true

            [session]
            type = "fixture"
            path = "catalog.json"

            [submit]
            url = "https://example.com/submit"
            "#,
        )
        .unwrap();

        assert!(config.sync.skip_apps.contains(&AppId::new(20)));
        assert!(config.sync.skip_decryption_keys);
        assert!(config.sync.skip_auto_grant);
        assert!(matches!(config.session, SessionConfig::Fixture { .. }));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn http_session_requires_scheme() {
        let session = SessionConfig::Http {
            base_url: "localhost:8080".to_string(),
            token: None,
            request_timeout_secs: 30,
            probe_interval_secs: 5,
        };
        assert!(session.validate().is_err());
    }

    #[test]
    fn submit_url_requires_scheme() {
        let submit = SubmitConfig {
            url: Some("example.com".to_string()),
            ..SubmitConfig::default()
        };
        assert!(submit.validate().is_err());
        assert!(SubmitConfig::default().validate().is_ok());
    }
}
