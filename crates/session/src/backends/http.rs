//! JSON gateway backend.
//!
//! The remote catalog protocol is spoken by a gateway process that keeps the
//! actual session alive; this backend talks plain JSON to it. A connect-level
//! failure marks the session disconnected and starts a single background
//! health probe that marks it connected again once the gateway answers.

use crate::connection::{ConnectionMonitor, ConnectionWatch};
use crate::error::{SessionError, SessionResult};
use crate::traits::CatalogSession;
use crate::types::{
    AccessTokens, AppInfo, DecryptionKeyResponse, KeyResult, PackageInfo, SessionSnapshot,
};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokensync_core::{AppId, AppRequest, ContentUnitId, DecryptionKey, PackageRequest};
use tracing::instrument;

/// Session backed by an HTTP gateway.
pub struct HttpSession {
    http: reqwest::Client,
    base_url: Url,
    health_url: Url,
    token: Option<String>,
    request_timeout: Duration,
    probe_interval: Duration,
    monitor: ConnectionMonitor,
    probing: Arc<AtomicBool>,
}

impl HttpSession {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        request_timeout: Duration,
        probe_interval: Duration,
    ) -> SessionResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SessionError::Config(format!("invalid gateway URL {base_url:?}: {e}")))?;
        let health_url = base_url
            .join("/v1/health")
            .map_err(|e| SessionError::Config(format!("failed to build health URL: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SessionError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            health_url,
            token,
            request_timeout,
            probe_interval,
            monitor: ConnectionMonitor::connected(),
            probing: Arc::new(AtomicBool::new(false)),
        })
    }

    fn url(&self, path: &str) -> SessionResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| SessionError::Config(format!("failed to build gateway URL: {e}")))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> SessionResult<T> {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let response = req.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(SessionError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| SessionError::Decode(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> SessionError {
        if err.is_connect() {
            self.connection_lost();
            SessionError::Disconnected(err.to_string())
        } else if err.is_timeout() {
            SessionError::Timeout(self.request_timeout)
        } else {
            SessionError::Transport(err.to_string())
        }
    }

    fn connection_lost(&self) {
        if self.monitor.mark_disconnected() {
            tracing::warn!(gateway = %self.base_url, "Lost connection to catalog gateway");
        }
        if self.probing.swap(true, Ordering::SeqCst) {
            return;
        }

        let http = self.http.clone();
        let url = self.health_url.clone();
        let interval = self.probe_interval;
        let monitor = self.monitor.clone();
        let probing = self.probing.clone();

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match http.get(url.clone()).send().await {
                    Ok(resp) if resp.status().is_success() => {
                        if monitor.mark_connected() {
                            tracing::info!("Reconnected to catalog gateway");
                        }
                        break;
                    }
                    Ok(resp) => {
                        tracing::debug!(status = %resp.status(), "Gateway not healthy yet");
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Gateway still unreachable");
                    }
                }
            }
            probing.store(false, Ordering::SeqCst);
        });
    }
}

#[derive(Serialize)]
struct DescribePackagesRequest<'a> {
    packages: &'a [PackageRequest],
}

#[derive(Deserialize)]
struct DescribePackagesResponse {
    packages: Vec<PackageInfo>,
}

#[derive(Serialize)]
struct AccessTokensRequest<'a> {
    app_ids: &'a [AppId],
}

#[derive(Serialize)]
struct DescribeAppsRequest<'a> {
    apps: &'a [AppRequest],
}

#[derive(Deserialize)]
struct DescribeAppsResponse {
    apps: Vec<AppInfo>,
}

#[derive(Serialize)]
struct DecryptionKeyRequest {
    content_unit_id: ContentUnitId,
    app_id: AppId,
}

#[derive(Deserialize)]
struct DecryptionKeyReply {
    result: KeyResult,
    #[serde(default)]
    key: String,
}

#[async_trait]
impl CatalogSession for HttpSession {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    fn connection(&self) -> ConnectionWatch {
        self.monitor.watch()
    }

    async fn snapshot(&self) -> SessionResult<SessionSnapshot> {
        let url = self.url("/v1/session")?;
        self.send_json(self.http.get(url)).await
    }

    #[instrument(skip_all, fields(count = packages.len()))]
    async fn describe_packages(
        &self,
        packages: &[PackageRequest],
    ) -> SessionResult<Vec<PackageInfo>> {
        let url = self.url("/v1/packages/describe")?;
        let response: DescribePackagesResponse = self
            .send_json(
                self.http
                    .post(url)
                    .json(&DescribePackagesRequest { packages }),
            )
            .await?;
        Ok(response.packages)
    }

    #[instrument(skip_all, fields(count = apps.len()))]
    async fn get_access_tokens(&self, apps: &[AppId]) -> SessionResult<AccessTokens> {
        let url = self.url("/v1/apps/access-tokens")?;
        self.send_json(self.http.post(url).json(&AccessTokensRequest { app_ids: apps }))
            .await
    }

    #[instrument(skip_all, fields(count = apps.len()))]
    async fn describe_applications(&self, apps: &[AppRequest]) -> SessionResult<Vec<AppInfo>> {
        let url = self.url("/v1/apps/describe")?;
        let response: DescribeAppsResponse = self
            .send_json(self.http.post(url).json(&DescribeAppsRequest { apps }))
            .await?;
        Ok(response.apps)
    }

    async fn get_decryption_key(
        &self,
        unit: ContentUnitId,
        app: AppId,
    ) -> SessionResult<DecryptionKeyResponse> {
        let url = self.url("/v1/content-units/key")?;
        let reply: DecryptionKeyReply = self
            .send_json(self.http.post(url).json(&DecryptionKeyRequest {
                content_unit_id: unit,
                app_id: app,
            }))
            .await?;
        let key = DecryptionKey::from_hex(&reply.key)
            .map_err(|e| SessionError::Decode(format!("content unit {unit}: {e}")))?;
        Ok(DecryptionKeyResponse {
            result: reply.result,
            key,
        })
    }
}
