//! Authenticated request gateway and the fetch state machine built on it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use tokio::sync::watch;
use url::Url;

use crate::error::GatewayError;
use crate::notify::{Notification, NotificationSink};
use crate::session::{SessionStore, AUTH_TOKEN};

/// Shown when a failed response carries no `message`
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// Method, JSON body and extra headers of one call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: Vec::new(),
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Sends API calls with the session's bearer token attached.
///
/// No retry, no deduplication, no caching: each call is one request.
#[derive(Clone)]
pub struct Gateway {
    client: reqwest::Client,
    base_url: String,
    store: Arc<dyn SessionStore>,
    sink: Option<Arc<dyn NotificationSink>>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl Gateway {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        store: Arc<dyn SessionStore>,
        sink: Option<Arc<dyn NotificationSink>>,
    ) -> Result<Self, GatewayError> {
        // validate once up front; paths are appended verbatim later
        Url::parse(base_url)?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            sink,
        })
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/api/superadmin/schools`
    pub fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        let url = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        Ok(Url::parse(&url)?)
    }

    /// Perform one call. Failures are surfaced both as the returned error
    /// and as a single error notification.
    pub async fn execute(&self, path: &str, options: &RequestOptions) -> Result<Value, GatewayError> {
        let result = self.send(path, options).await;
        if let Err(e) = &result {
            self.report(path, options, e);
        }
        result
    }

    /// Log a failed call and raise its error notification
    fn report(&self, path: &str, options: &RequestOptions, error: &GatewayError) {
        tracing::warn!("{} {} failed: {} ({})", options.method, path, error, error.error_code());
        self.notify(Notification::error(error.message()));
    }

    fn notify(&self, notification: Notification) {
        match &self.sink {
            Some(sink) => sink.notify(notification),
            None => tracing::debug!("No notification sink registered"),
        }
    }

    /// Defaults first, then caller headers; a caller header replaces a default
    fn headers(&self, options: &RequestOptions) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.store.get(AUTH_TOKEN).filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| GatewayError::InvalidHeader(format!("Authorization: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        for (name, value) in &options.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| GatewayError::InvalidHeader(format!("{}: {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| GatewayError::InvalidHeader(format!("{}: {}", name, e)))?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }

    async fn send(&self, path: &str, options: &RequestOptions) -> Result<Value, GatewayError> {
        let url = self.endpoint(path)?;
        tracing::debug!("{} {}", options.method, url);

        let mut request = self
            .client
            .request(options.method.clone(), url)
            .headers(self.headers(options)?);

        // json() leaves an explicit Content-Type in place
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let parsed = if text.trim().is_empty() {
            Ok(Value::Null)
        } else {
            serde_json::from_str::<Value>(&text)
        };

        if !status.is_success() {
            let message = parsed
                .as_ref()
                .ok()
                .and_then(|body| body.get("message"))
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .unwrap_or(GENERIC_FAILURE);
            return Err(GatewayError::from_status(status.as_u16(), message));
        }

        parsed.map_err(|e| GatewayError::InvalidResponse(format!("Response is not valid JSON: {}", e)))
    }
}

/// Lifecycle of one fetch: `Idle -> Loading -> Success | Failed`
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Success(Value),
    Failed(String),
}

/// The `{data, loading, error}` triple consumed by views
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchView {
    pub data: Option<Value>,
    pub loading: bool,
    pub error: Option<String>,
}

impl FetchState {
    pub fn is_settled(&self) -> bool {
        matches!(self, FetchState::Success(_) | FetchState::Failed(_))
    }

    pub fn view(&self) -> FetchView {
        match self {
            FetchState::Idle => FetchView::default(),
            FetchState::Loading => FetchView {
                loading: true,
                ..FetchView::default()
            },
            FetchState::Success(data) => FetchView {
                data: Some(data.clone()),
                ..FetchView::default()
            },
            FetchState::Failed(error) => FetchView {
                error: Some(error.clone()),
                ..FetchView::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FetchKey {
    path: String,
    method: Method,
    body: Option<Value>,
    enabled: bool,
}

/// Data owned by one view, re-fetched whenever its request key changes.
///
/// Results of a superseded key, or arriving after the resource is dropped,
/// are discarded without a notification. The request itself is not
/// aborted. Switching to a disabled key returns the resource to `Idle`. Must be used from
/// within a Tokio runtime.
#[derive(Debug)]
pub struct Resource {
    gateway: Gateway,
    key: Option<FetchKey>,
    generation: Arc<AtomicU64>,
    alive: Arc<AtomicBool>,
    state: Arc<watch::Sender<FetchState>>,
}

impl Resource {
    pub fn new(gateway: Gateway) -> Self {
        let (state, _) = watch::channel(FetchState::Idle);
        Self {
            gateway,
            key: None,
            generation: Arc::new(AtomicU64::new(0)),
            alive: Arc::new(AtomicBool::new(true)),
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> FetchView {
        self.state.borrow().view()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    /// Align the resource with the current request key.
    ///
    /// Returns `true` when a new request was started. An unchanged key, or
    /// `enabled == false`, starts nothing.
    pub fn sync(&mut self, path: &str, options: &RequestOptions, enabled: bool) -> bool {
        let key = FetchKey {
            path: path.to_string(),
            method: options.method.clone(),
            body: options.body.clone(),
            enabled,
        };
        if self.key.as_ref() == Some(&key) {
            return false;
        }
        self.key = Some(key);

        // any in-flight result now belongs to a stale key
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if !enabled {
            tracing::debug!("Fetch of {} deferred until enabled", path);
            self.state.send_replace(FetchState::Idle);
            return false;
        }

        self.state.send_replace(FetchState::Loading);

        let gateway = self.gateway.clone();
        let current = Arc::clone(&self.generation);
        let alive = Arc::clone(&self.alive);
        let state = Arc::clone(&self.state);
        let path = path.to_string();
        let options = options.clone();

        tokio::spawn(async move {
            let result = gateway.send(&path, &options).await;

            // stale results are dropped silently, notification included
            if !alive.load(Ordering::SeqCst) || current.load(Ordering::SeqCst) != generation {
                tracing::debug!("Discarding stale result for {}", path);
                return;
            }
            if let Err(e) = &result {
                gateway.report(&path, &options, e);
            }

            state.send_replace(match result {
                Ok(data) => FetchState::Success(data),
                Err(e) => FetchState::Failed(e.message().to_string()),
            });
        });

        true
    }

    /// Wait until the current request settles (returns immediately if idle)
    // the binding drops the watch::Ref before rx goes out of scope
    #[allow(clippy::let_and_return)]
    pub async fn settled(&self) -> FetchState {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(|state| !matches!(state, FetchState::Loading)).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }
}

impl Drop for Resource {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
