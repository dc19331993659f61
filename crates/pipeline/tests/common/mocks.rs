use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokensync_core::{AppId, AppRequest, ContentUnitId, PackageId, PackageRequest};
use tokensync_session::{
    AccessTokens, AppInfo, Catalog, CatalogSession, ConnectionMonitor, ConnectionState,
    ConnectionWatch, DecryptionKeyResponse, FixtureSession, PackageInfo, SessionError,
    SessionResult, SessionSnapshot,
};
use tokio::time::Duration;

/// Session over an in-memory catalog with failure injection and call counters.
///
/// Answers come from a [`FixtureSession`]; everything else is instrumentation.
#[allow(dead_code)]
pub struct MockSession {
    inner: FixtureSession,
    monitor: ConnectionMonitor,

    pub snapshot_calls: AtomicUsize,
    pub describe_packages_calls: AtomicUsize,
    pub access_token_calls: AtomicUsize,
    pub describe_apps_calls: AtomicUsize,
    pub describe_apps_while_disconnected: AtomicUsize,
    pub key_calls: AtomicUsize,
    pub max_keys_in_flight: AtomicUsize,
    keys_in_flight: AtomicUsize,
    key_requests: Mutex<Vec<(ContentUnitId, AppId)>>,
    describe_app_requests: Mutex<Vec<AppId>>,
    token_requests: Mutex<Vec<AppId>>,

    fail_snapshot: bool,
    failing_packages: HashSet<PackageId>,
    failing_apps: HashSet<AppId>,
    failing_token_apps: HashSet<AppId>,
    hanging_units: HashSet<ContentUnitId>,
    key_delay: Duration,
    disconnect_after_describe_apps: Option<usize>,
    reconnect_delay: Duration,
}

#[allow(dead_code)]
impl MockSession {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: FixtureSession::from_catalog(catalog).unwrap(),
            monitor: ConnectionMonitor::connected(),
            snapshot_calls: AtomicUsize::new(0),
            describe_packages_calls: AtomicUsize::new(0),
            access_token_calls: AtomicUsize::new(0),
            describe_apps_calls: AtomicUsize::new(0),
            describe_apps_while_disconnected: AtomicUsize::new(0),
            key_calls: AtomicUsize::new(0),
            max_keys_in_flight: AtomicUsize::new(0),
            keys_in_flight: AtomicUsize::new(0),
            key_requests: Mutex::new(Vec::new()),
            describe_app_requests: Mutex::new(Vec::new()),
            token_requests: Mutex::new(Vec::new()),
            fail_snapshot: false,
            failing_packages: HashSet::new(),
            failing_apps: HashSet::new(),
            failing_token_apps: HashSet::new(),
            hanging_units: HashSet::new(),
            key_delay: Duration::ZERO,
            disconnect_after_describe_apps: None,
            reconnect_delay: Duration::from_millis(50),
        }
    }

    pub fn fail_snapshot(mut self) -> Self {
        self.fail_snapshot = true;
        self
    }

    /// Any describe-packages chunk containing this package fails.
    pub fn fail_package(mut self, package: u32) -> Self {
        self.failing_packages.insert(PackageId::new(package));
        self
    }

    /// Any describe-applications chunk containing this application fails.
    pub fn fail_app(mut self, app: u32) -> Self {
        self.failing_apps.insert(AppId::new(app));
        self
    }

    /// Any get-access-tokens chunk containing this application fails.
    pub fn fail_token_app(mut self, app: u32) -> Self {
        self.failing_token_apps.insert(AppId::new(app));
        self
    }

    /// Key requests for this unit never answer.
    pub fn hang_unit(mut self, unit: u32) -> Self {
        self.hanging_units.insert(ContentUnitId::new(unit));
        self
    }

    pub fn key_delay(mut self, delay: Duration) -> Self {
        self.key_delay = delay;
        self
    }

    /// Drop the connection right after the n-th describe-applications call
    /// and restore it after `reconnect_delay`.
    pub fn disconnect_after_describe_apps(mut self, n: usize, reconnect_delay: Duration) -> Self {
        self.disconnect_after_describe_apps = Some(n);
        self.reconnect_delay = reconnect_delay;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn key_requests(&self) -> Vec<(ContentUnitId, AppId)> {
        self.key_requests.lock().unwrap().clone()
    }

    pub fn key_requests_for(&self, unit: u32) -> usize {
        self.key_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u.get() == unit)
            .count()
    }

    pub fn describe_app_requests(&self) -> Vec<AppId> {
        self.describe_app_requests.lock().unwrap().clone()
    }

    pub fn token_requests(&self) -> Vec<AppId> {
        self.token_requests.lock().unwrap().clone()
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSession for MockSession {
    fn backend_name(&self) -> &'static str {
        "mock"
    }

    fn connection(&self) -> ConnectionWatch {
        self.monitor.watch()
    }

    async fn snapshot(&self) -> SessionResult<SessionSnapshot> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_snapshot {
            return Err(SessionError::Transport("snapshot unavailable".to_string()));
        }
        self.inner.snapshot().await
    }

    async fn describe_packages(
        &self,
        packages: &[PackageRequest],
    ) -> SessionResult<Vec<PackageInfo>> {
        self.describe_packages_calls.fetch_add(1, Ordering::SeqCst);
        if packages
            .iter()
            .any(|p| self.failing_packages.contains(&p.package_id))
        {
            return Err(SessionError::Remote {
                status: 500,
                body: "injected".to_string(),
            });
        }
        self.inner.describe_packages(packages).await
    }

    async fn get_access_tokens(&self, apps: &[AppId]) -> SessionResult<AccessTokens> {
        self.access_token_calls.fetch_add(1, Ordering::SeqCst);
        self.token_requests.lock().unwrap().extend_from_slice(apps);
        if apps.iter().any(|a| self.failing_token_apps.contains(a)) {
            return Err(SessionError::Transport("injected".to_string()));
        }
        self.inner.get_access_tokens(apps).await
    }

    async fn describe_applications(&self, apps: &[AppRequest]) -> SessionResult<Vec<AppInfo>> {
        let call = self.describe_apps_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.describe_app_requests
            .lock()
            .unwrap()
            .extend(apps.iter().map(|a| a.app_id));
        if self.monitor.state() == ConnectionState::Disconnected {
            self.describe_apps_while_disconnected
                .fetch_add(1, Ordering::SeqCst);
        }
        if apps.iter().any(|a| self.failing_apps.contains(&a.app_id)) {
            return Err(SessionError::Remote {
                status: 503,
                body: "injected".to_string(),
            });
        }

        let infos = self.inner.describe_applications(apps).await;

        if self.disconnect_after_describe_apps == Some(call) {
            self.monitor.mark_disconnected();
            let monitor = self.monitor.clone();
            let delay = self.reconnect_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                monitor.mark_connected();
            });
        }

        infos
    }

    async fn get_decryption_key(
        &self,
        unit: ContentUnitId,
        app: AppId,
    ) -> SessionResult<DecryptionKeyResponse> {
        self.key_calls.fetch_add(1, Ordering::SeqCst);
        self.key_requests.lock().unwrap().push((unit, app));

        let now = self.keys_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_keys_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.hanging_units.contains(&unit) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        } else if !self.key_delay.is_zero() {
            tokio::time::sleep(self.key_delay).await;
        }

        let response = self.inner.get_decryption_key(unit, app).await;
        self.keys_in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}
