//! HTTP request model and transports.
//!
//! The client builds transport-agnostic [`HttpRequest`] values and hands them
//! to an [`HttpTransport`]. Transports report completions through a callback
//! that may run on any thread; the client only queues them and resolves
//! everything during `tick()`.

use crate::error::{ClientError, ErrorCode, NakamaError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// How a request authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpAuth {
    /// Basic auth with the server key as user name and an empty password.
    ServerKey(String),
    /// Bearer auth with a session token.
    Bearer(String),
    /// No `Authorization` header.
    None,
}

impl HttpAuth {
    pub fn header_value(&self) -> Option<String> {
        match self {
            HttpAuth::ServerKey(key) => Some(format!("Basic {}", STANDARD.encode(format!("{key}:")))),
            HttpAuth::Bearer(token) => Some(format!("Bearer {token}")),
            HttpAuth::None => None,
        }
    }
}

/// A single REST call, independent of the HTTP library that executes it.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Unencoded path segments, e.g. `["v2", "group", "<id>", "join"]`.
    pub segments: Vec<String>,
    /// Query pairs in order; list parameters repeat their key.
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
    pub auth: HttpAuth,
}

impl HttpRequest {
    pub fn new<S: AsRef<str>>(method: HttpMethod, segments: &[S]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|s| s.as_ref().to_string()).collect(),
            query: Vec::new(),
            body: None,
            auth: HttpAuth::None,
        }
    }

    pub fn with_auth(mut self, auth: HttpAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Serializes `body` as the JSON request body.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, NakamaError> {
        let body = serde_json::to_string(body).map_err(|e| {
            NakamaError::new(ErrorCode::SerializationError, format!("failed to serialize request body: {e}"))
        })?;
        self.body = Some(body);
        Ok(self)
    }

    /// Unencoded path for logging, e.g. `/v2/account`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Values of every query pair named `key`.
    pub fn query_values(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Resolves the request against `base`, percent-encoding each segment.
    pub fn url(&self, base: &Url) -> Result<Url, ClientError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("base URL cannot hold a path: {base}")))?
            .clear()
            .extend(&self.segments);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// A request that produced no HTTP response.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Request cancelled")]
    Cancelled,
}

/// Invoked exactly once per request that was not cancelled.
pub type CompletionFn = Box<dyn FnOnce(Result<HttpResponse, TransportError>) + Send + 'static>;

/// Executes HTTP requests on behalf of a [`crate::Client`].
pub trait HttpTransport: Send + Sync {
    /// Starts `request` and eventually calls `on_complete`, possibly from
    /// another thread. Must not block.
    fn send(&self, request: HttpRequest, on_complete: CompletionFn);

    /// Aborts every in-flight request. Aborted requests may never call their
    /// completion.
    fn cancel_all(&self);
}

/// [`HttpTransport`] backed by `reqwest` and a tokio runtime.
///
/// Safe to share across threads: in-flight requests are tracked in a
/// concurrent map so `cancel_all` can abort them from anywhere.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
    runtime: Handle,
    in_flight: Arc<DashMap<u64, AbortHandle>>,
    next_id: AtomicU64,
}

impl ReqwestTransport {
    /// Creates a transport that spawns requests on `runtime`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Server root, e.g. `http://127.0.0.1:7350`
    /// * `runtime` - Runtime the requests run on
    /// * `timeout` - Optional HTTP-level timeout
    pub fn new(base_url: &str, runtime: Handle, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            runtime,
            in_flight: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: HttpRequest, on_complete: CompletionFn) {
        let url = match request.url(&self.base_url) {
            Ok(url) => url,
            Err(e) => {
                on_complete(Err(TransportError::Connection(e.to_string())));
                return;
            }
        };

        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(value) = request.auth.header_value() {
            builder = builder.header(reqwest::header::AUTHORIZATION, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let in_flight = self.in_flight.clone();
        // Held until the abort handle is registered, so the task's own
        // removal always comes after the insert.
        let (registered, gate) = oneshot::channel::<()>();
        let task = self.runtime.spawn(async move {
            let _ = gate.await;
            let result = match builder.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    match response.text().await {
                        Ok(body) => Ok(HttpResponse { status, body }),
                        Err(e) => Err(TransportError::Connection(format!("failed to read body: {e}"))),
                    }
                }
                Err(e) => Err(TransportError::Connection(e.to_string())),
            };
            in_flight.remove(&id);
            on_complete(result);
        });

        self.in_flight.insert(id, task.abort_handle());
        let _ = registered.send(());
    }

    fn cancel_all(&self) {
        let count = self.in_flight.len();
        self.in_flight.retain(|_, handle| {
            handle.abort();
            false
        });
        if count > 0 {
            warn!("🔌 Cancelled {} in-flight HTTP requests", count);
        } else {
            debug!("No in-flight HTTP requests to cancel");
        }
    }
}
