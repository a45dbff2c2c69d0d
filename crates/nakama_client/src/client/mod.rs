//! # HTTP Client
//!
//! [`Client`] issues REST calls and correlates their completions with the
//! callbacks supplied at call time.
//!
//! Every operation follows the same shape: build an [`HttpRequest`], register
//! the optional success and error callbacks under a fresh handle, hand the
//! request to the transport and return the handle. Nothing is delivered until
//! the application calls [`Client::tick`], which drains the completion queue
//! and runs callbacks on the calling thread.
//!
//! ```rust,ignore
//! let mut client = Client::with_reqwest(ClientConfig::default(), Handle::current())?;
//! client.authenticate_device("device-id", None, true, &HashMap::new(),
//!     Some(Box::new(|session| println!("user {}", session.user_id()))),
//!     Some(Box::new(|err| eprintln!("auth failed: {err}"))));
//! loop {
//!     client.tick();
//!     std::thread::sleep(Duration::from_millis(50));
//! }
//! ```

mod auth;
mod leaderboard;
mod social;
mod storage;

pub use auth::AuthMethod;

use crate::config::ClientConfig;
use crate::dispatch::{reply_registries, DefaultErrorCallback, Dispatcher, Slot};
use crate::error::{ClientError, ErrorCode, NakamaError};
use crate::handle::RequestHandle;
use crate::http::{HttpAuth, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
use crate::registry::Callback;
use crate::session::Session;
use crate::types::*;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

reply_registries! {
    /// One registry per result shape returned by the REST API.
    pub struct HttpReplies, kind HttpReplyKind {
        empty: Empty => (),
        session: Session => Session,
        account: Account => Account,
        users: Users => Users,
        friends: Friends => FriendList,
        group: Group => Group,
        groups: Groups => GroupList,
        group_users: GroupUsers => GroupUserList,
        user_groups: UserGroups => UserGroupList,
        record: Record => LeaderboardRecord,
        records: Records => LeaderboardRecordList,
        tournaments: Tournaments => TournamentList,
        matches: Matches => MatchList,
        notifications: Notifications => NotificationList,
        channel_messages: ChannelMessages => ChannelMessageList,
        storage_list: StorageList => StorageObjectList,
        storage_objects: StorageObjects => StorageObjects,
        storage_acks: StorageAcks => StorageObjectAcks,
        rpc: Rpc => Rpc,
    }
}

/// Error callback shape shared by every HTTP operation.
pub type ErrorCallback = Callback<NakamaError>;

/// Terminal event for one request, queued until the next `tick()`.
#[derive(Debug)]
enum Completion {
    Response {
        handle: RequestHandle,
        result: Result<HttpResponse, TransportError>,
    },
    Local {
        handle: RequestHandle,
        error: NakamaError,
    },
}

/// REST client for one server.
///
/// Owns its transport, its handle counter and its registries. All methods take
/// `&mut self` and are meant to be called from the thread that also calls
/// [`Client::tick`].
pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    dispatcher: Dispatcher<HttpReplies, NakamaError>,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
}

impl Client {
    /// Creates a client that sends requests through `transport`.
    pub fn new(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let (completions_tx, completions_rx) = unbounded_channel();
        info!(
            "📡 Nakama client for {} (timeout: {:?})",
            config.http_base_url(),
            config.request_timeout()
        );
        Self {
            dispatcher: Dispatcher::new(config.request_timeout()),
            config,
            transport,
            completions_tx,
            completions_rx,
        }
    }

    /// Creates a client backed by [`ReqwestTransport`] on `runtime`.
    pub fn with_reqwest(config: ClientConfig, runtime: tokio::runtime::Handle) -> Result<Self, ClientError> {
        config.validate().map_err(ClientError::Config)?;
        let transport = ReqwestTransport::new(&config.http_base_url(), runtime, config.request_timeout())?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Installs the callback used for errors whose request registered no
    /// error callback of its own. `None` removes it.
    pub fn set_error_callback(&mut self, callback: Option<DefaultErrorCallback<NakamaError>>) {
        self.dispatcher.set_default_error(callback);
    }

    /// Number of requests still waiting for a completion.
    pub fn pending_requests(&self) -> usize {
        self.dispatcher.pending()
    }

    /// Number of callbacks currently stored across every registry.
    pub fn registered_callbacks(&self) -> usize {
        self.dispatcher.registered()
    }

    /// Drains queued completions and runs their callbacks on this thread,
    /// then fails requests that exceeded the request timeout.
    ///
    /// Call this periodically, nominally every `tick_interval_ms`.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Same as [`Client::tick`] with timeouts measured against `now`.
    pub fn tick_at(&mut self, now: Instant) {
        while let Ok(completion) = self.completions_rx.try_recv() {
            match completion {
                Completion::Response { handle, result } => self.complete(handle, result),
                Completion::Local { handle, error } => self.dispatcher.dispatch_error(handle, error),
            }
        }
        self.dispatcher.expire(now);
    }

    /// Cancels in-flight requests and abandons their callbacks.
    ///
    /// No callback fires for abandoned requests, not even an error. Completions
    /// that were already queued are discarded too.
    pub fn disconnect(&mut self) {
        self.transport.cancel_all();
        while self.completions_rx.try_recv().is_ok() {}
        let abandoned = self.dispatcher.abandon_all();
        if abandoned > 0 {
            warn!("🔌 Disconnected with {} pending requests abandoned", abandoned);
        } else {
            info!("🔌 Disconnected");
        }
    }

    fn complete(&mut self, handle: RequestHandle, result: Result<HttpResponse, TransportError>) {
        match result {
            Ok(response) if (200..300).contains(&response.status) => {
                let payload = if response.body.trim().is_empty() {
                    Ok(Value::Object(Default::default()))
                } else {
                    serde_json::from_str::<Value>(&response.body)
                };
                match payload {
                    Ok(payload) => self.dispatcher.dispatch_success(handle, payload),
                    Err(e) => self.dispatcher.dispatch_error(
                        handle,
                        NakamaError::new(ErrorCode::InternalError, format!("response is not JSON: {e}"))
                            .with_context("body", response.body),
                    ),
                }
            }
            Ok(response) => {
                let error = NakamaError::from_response_body(response.status, &response.body);
                debug!(handle = %handle, status = response.status, "Request failed: {}", error);
                self.dispatcher.dispatch_error(handle, error);
            }
            Err(TransportError::Cancelled) => {
                self.dispatcher
                    .dispatch_error(handle, NakamaError::new(ErrorCode::CancelledByUser, "request cancelled"));
            }
            Err(TransportError::Connection(reason)) => {
                self.dispatcher
                    .dispatch_error(handle, NakamaError::new(ErrorCode::ConnectionError, reason));
            }
        }
    }

    /// Registers the callbacks and starts `request`. A request that could not
    /// be built is reported through the error path on the next tick.
    fn send<T>(
        &mut self,
        request: Result<HttpRequest, NakamaError>,
        on_success: Option<Callback<T>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle
    where
        HttpReplies: Slot<T>,
    {
        let handle = self.dispatcher.issue(on_success, on_error);
        match request {
            Ok(request) => {
                debug!(handle = %handle, "➡️ {} {}", request.method, request.path());
                let completions = self.completions_tx.clone();
                self.transport.send(
                    request,
                    Box::new(move |result| {
                        // The receiver only disappears with the client itself.
                        let _ = completions.send(Completion::Response { handle, result });
                    }),
                );
            }
            Err(error) => {
                warn!(handle = %handle, "❌ Request not sent: {}", error);
                let _ = self.completions_tx.send(Completion::Local { handle, error });
            }
        }
        handle
    }

    /// Request authenticated with the server key.
    fn server_key_request(&self, method: HttpMethod, segments: &[&str]) -> HttpRequest {
        HttpRequest::new(method, segments).with_auth(HttpAuth::ServerKey(self.config.server_key.clone()))
    }

    /// Request authenticated with the session token. Expired sessions are
    /// rejected locally.
    fn session_request(
        &self,
        session: &Session,
        method: HttpMethod,
        segments: &[&str],
    ) -> Result<HttpRequest, NakamaError> {
        if session.auth_token().is_empty() {
            return Err(NakamaError::new(ErrorCode::InvalidSession, "session has no auth token"));
        }
        if session.is_expired() {
            return Err(NakamaError::new(ErrorCode::InvalidSession, "session has expired")
                .with_context("expire_time", session.expire_time().to_rfc3339()));
        }
        Ok(HttpRequest::new(method, segments).with_auth(HttpAuth::Bearer(session.auth_token().to_string())))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.http_base_url())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.transport.cancel_all();
    }
}
