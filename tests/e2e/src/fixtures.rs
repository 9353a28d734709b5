//! Test fixtures and data factories
//!
//! A simulated origin with its deployment, worker registrations, caches and
//! persisted `localStorage`, plus page loads on top of it.

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use spin::Mutex;

use shell_recovery::{
    BrowserPage, DevCleanup, ErrorSignal, RecoveryConfig, RecoveryError, RecoveryModule, RecoveryOutcome,
    RecoveryPlatform, SharedStorage, StorageError, WebStorage,
};
use shell_worker::{
    CacheStorage, ClientId, Clients, FetchOutcome, ManualClock, Network, NetworkError, OfflineWorker,
    Request, Response, ScriptedNetwork, ServiceWorkerContainer, SharedCacheStorage, SharedClients,
    SharedContainer, WorkerConfig, WorkerError,
};

/// Origin of the simulated app
pub const ORIGIN: &str = "https://app.test";

/// Markup every shell response contains
pub const SHELL_MARKER: &str = r#"<div id="root"></div>"#;

/// Entry chunk referenced by the shell
pub const ENTRY_CHUNK: &str = "/assets/index-4f1c.js";

/// JSON asset fetched at runtime
pub const MENU_JSON: &str = "/api/menu.json";

/// Start of the simulated clock (ms)
pub const START_MS: u64 = 1_700_000_000_000;

/// Deployed asset bodies
pub struct AssetFixtures;

impl AssetFixtures {
    /// App shell document
    pub fn shell() -> String {
        String::from(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>Kitchen</title>
    <link rel="manifest" href="/manifest.json">
</head>
<body>
    <div id="root"></div>
    <script type="module" src="/assets/index-4f1c.js"></script>
</body>
</html>"#,
        )
    }

    /// Web-app manifest
    pub fn manifest(name: &str, start_url: &str) -> String {
        alloc::format!(
            r#"{{"name":"{}","start_url":"{}","display":"standalone","icons":[{{"src":"/icons/icon-192.png","sizes":"192x192"}}]}}"#,
            name, start_url
        )
    }

    /// Menu API response
    pub fn menu() -> String {
        String::from(r#"[{"id":1,"name":"Ramen","price":1200},{"id":2,"name":"Gyoza","price":600}]"#)
    }

    /// Fake binary asset of `len` bytes
    pub fn binary(seed: u8, len: usize) -> Vec<u8> {
        (0..len).map(|i| seed.wrapping_add(i as u8)).collect()
    }
}

/// Route every file of the current deployment on `net`
pub fn serve_deployment(net: &ScriptedNetwork) {
    let html = |body: String| {
        Response::ok_with_body(body).with_header("Content-Type", "text/html; charset=utf-8")
    };
    let json = |body: String| Response::ok_with_body(body).with_header("Content-Type", "application/json");

    net.route("/", html(AssetFixtures::shell()));
    net.route("/index.html", html(AssetFixtures::shell()));
    net.route("/manifest.json", json(AssetFixtures::manifest("Kitchen", "/")));
    net.route(
        "/manifest-kitchen.json",
        json(AssetFixtures::manifest("Kitchen Display", "/kitchen")),
    );
    net.route(
        "/sounds/notification.mp3",
        Response::ok_with_body(AssetFixtures::binary(3, 2048)).with_header("Content-Type", "audio/mpeg"),
    );
    net.route(
        "/icons/icon-192.png",
        Response::ok_with_body(AssetFixtures::binary(7, 512)).with_header("Content-Type", "image/png"),
    );
    net.route(
        "/icons/icon-512.png",
        Response::ok_with_body(AssetFixtures::binary(11, 1024)).with_header("Content-Type", "image/png"),
    );
    net.route(
        ENTRY_CHUNK,
        Response::ok_with_body("import('./Feed-3f2a.js')")
            .with_header("Content-Type", "text/javascript"),
    );
    net.route(MENU_JSON, json(AssetFixtures::menu()));
}

/// One origin as seen by the browser
pub struct App {
    pub net: Arc<ScriptedNetwork>,
    pub clock: Arc<ManualClock>,
    pub caches: SharedCacheStorage,
    pub clients: SharedClients,
    pub container: SharedContainer,
    local_snapshot: Mutex<Option<String>>,
}

impl App {
    /// Fresh origin with the deployment online and nothing installed
    pub fn new() -> Self {
        let net = Arc::new(ScriptedNetwork::new());
        serve_deployment(net.as_ref());
        Self {
            net,
            clock: Arc::new(ManualClock::new(START_MS)),
            caches: CacheStorage::new().shared(),
            clients: Clients::new().shared(),
            container: ServiceWorkerContainer::new(ORIGIN).shared(),
            local_snapshot: Mutex::new(None),
        }
    }

    /// Default worker configuration at `version`
    pub fn worker_config(&self, version: &str) -> WorkerConfig {
        let mut config = WorkerConfig::for_origin(ORIGIN);
        config.version = version.to_string();
        config
    }

    /// Create (but do not install) a worker for `config`
    pub fn spawn_worker(&self, config: WorkerConfig) -> Result<Arc<OfflineWorker>, WorkerError> {
        let worker = OfflineWorker::new(
            config,
            self.caches.clone(),
            self.net.clone(),
            self.clock.clone(),
            self.clients.clone(),
        )?;
        Ok(Arc::new(worker))
    }

    /// Register `version` at scope `/`. It installs, skips waiting and
    /// replaces any older worker there.
    pub fn deploy(&self, version: &str) -> Result<Arc<OfflineWorker>, WorkerError> {
        self.deploy_with(self.worker_config(version))
    }

    /// Register a worker for `config` at scope `/`
    pub fn deploy_with(&self, config: WorkerConfig) -> Result<Arc<OfflineWorker>, WorkerError> {
        let worker = self.spawn_worker(config)?;
        self.container
            .write()
            .register("/sw.js", Some("/"), worker.clone())?;
        Ok(worker)
    }

    /// Worker controlling `url`, if any
    pub fn controller(&self, url: &str) -> Option<Arc<OfflineWorker>> {
        self.container.read().controller(url)
    }

    /// Page-side fetch: through the controlling worker, else straight to the network
    pub fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let outcome = self
            .controller(&request.url)
            .map(|worker| worker.handle_fetch(request));
        match outcome {
            Some(FetchOutcome::Responded { response, .. }) => Ok(response),
            Some(FetchOutcome::Failed(e)) => Err(e),
            Some(FetchOutcome::Passthrough) | None => self.net.fetch(request),
        }
    }

    pub fn go_offline(&self) {
        self.net.set_online(false);
    }

    pub fn go_online(&self) {
        self.net.set_online(true);
    }

    /// Overwrite the persisted `localStorage` snapshot
    pub fn set_local_snapshot(&self, json: &str) {
        *self.local_snapshot.lock() = Some(json.to_string());
    }

    /// Open `url` in a new tab (fresh session storage) with production settings
    pub fn open_page(&self, url: &str) -> Result<Page, RecoveryError> {
        self.open_page_with(url, RecoveryConfig::production())
    }

    /// Open `url` in a new tab with `config`
    pub fn open_page_with(&self, url: &str, config: RecoveryConfig) -> Result<Page, RecoveryError> {
        let client = self.clients.write().add(url);
        self.load(client, url, config, WebStorage::session().shared())
    }

    /// Reload `page` in the same tab: session storage carries over
    pub fn reload(&self, page: Page) -> Result<Page, RecoveryError> {
        self.persist(&page)?;
        let url = page.browser.current_url();
        let config = page.recovery.config().clone();
        self.load(page.client, &url, config, page.session)
    }

    /// Close `page`, persisting its `localStorage`. Its window goes away.
    pub fn close(&self, page: Page) -> Result<(), RecoveryError> {
        self.persist(&page)?;
        self.clients.write().remove(page.client);
        Ok(())
    }

    fn persist(&self, page: &Page) -> Result<(), StorageError> {
        let json = page.local.read().to_json()?;
        *self.local_snapshot.lock() = Some(json);
        Ok(())
    }

    fn restore_local(&self) -> WebStorage {
        match self.local_snapshot.lock().as_deref() {
            Some(json) => WebStorage::from_json(json).unwrap_or_else(|e| {
                log::warn!("[e2e] discarding localStorage snapshot: {}", e);
                WebStorage::local()
            }),
            None => WebStorage::local(),
        }
    }

    fn load(
        &self,
        client: ClientId,
        url: &str,
        config: RecoveryConfig,
        session: SharedStorage,
    ) -> Result<Page, RecoveryError> {
        let browser = Arc::new(BrowserPage::new(url, self.container.clone(), self.caches.clone()));
        let local = self.restore_local().shared();
        let recovery = RecoveryModule::new(
            config,
            local.clone(),
            session.clone(),
            self.clock.clone(),
            browser.clone(),
        )?;
        let startup = recovery.on_page_load();
        Ok(Page {
            client,
            browser,
            recovery,
            local,
            session,
            startup,
        })
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// One loaded document
pub struct Page {
    pub client: ClientId,
    pub browser: Arc<BrowserPage>,
    pub recovery: RecoveryModule,
    pub local: SharedStorage,
    pub session: SharedStorage,
    /// What the start-up hook did on this load
    pub startup: DevCleanup,
}

impl Page {
    /// Report an error the page did not handle
    pub fn report(&self, signal: &ErrorSignal) -> RecoveryOutcome {
        self.recovery.handle_error(signal)
    }

    /// Current document URL
    pub fn url(&self) -> String {
        self.browser.current_url()
    }
}

/// Every generation name currently in `caches`
pub fn generation_names(caches: &SharedCacheStorage) -> Vec<String> {
    caches.read().keys()
}

/// Seed `names` as generations holding a single stale entry
pub fn seed_generations(caches: &SharedCacheStorage, names: &[&str]) {
    let stale = Response::ok_with_body("stale");
    let mut caches = caches.write();
    for name in names {
        if let Err(e) = caches.put(name, "/", &stale, 0) {
            log::warn!("[e2e] could not seed {}: {}", name, e);
        }
    }
}

/// The default precache manifest
pub fn default_manifest() -> Vec<String> {
    vec![
        "/".to_string(),
        "/index.html".to_string(),
        "/manifest.json".to_string(),
        "/manifest-kitchen.json".to_string(),
        "/sounds/notification.mp3".to_string(),
        "/icons/icon-192.png".to_string(),
        "/icons/icon-512.png".to_string(),
    ]
}
