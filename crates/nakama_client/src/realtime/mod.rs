//! # Realtime Client
//!
//! [`RtClient`] speaks the JSON envelope protocol over a socket. Requests are
//! sent as `{"<op>": {...}, "cid": "<handle>"}` and the server echoes the
//! `cid` on the reply. Frames without a `cid` are server-pushed events and go
//! to the installed [`RtClientListener`].
//!
//! Like the HTTP client, nothing is delivered until [`RtClient::tick`] runs:
//! transport events are queued and processed on the ticking thread, which
//! also drives the heartbeat and request timeouts.
//!
//! ## Disconnects
//!
//! - An explicit [`RtClient::disconnect`] abandons pending requests without
//!   calling them.
//! - A close the client did not ask for fails every pending request with
//!   [`RtErrorCode::Disconnected`].
//! - If nothing arrives from the server for two heartbeat intervals the
//!   connection is dropped with [`DisconnectInfo::HEARTBEAT_FAILURE`].

mod listener;
mod operations;
mod transport;

pub use listener::RtClientListener;
pub use transport::{RtTransport, TransportEvent, WebSocketTransport};

use crate::config::ClientConfig;
use crate::dispatch::{reply_registries, DefaultErrorCallback, Dispatcher, Slot};
use crate::error::{ClientError, RtError, RtErrorCode};
use crate::handle::RequestHandle;
use crate::registry::Callback;
use crate::session::Session;
use crate::types::realtime::*;
use crate::types::Rpc;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{debug, error, info, warn};
use url::Url;

reply_registries! {
    /// One registry per result shape returned over the socket.
    pub struct RtReplies, kind RtReplyKind {
        empty: Empty => (),
        channel: Channel => Channel,
        channel_message_ack: ChannelMessageAck => ChannelMessageAck,
        rt_match: Match => RtMatch,
        matchmaker_ticket: MatchmakerTicket => MatchmakerTicket,
        status: Status => Status,
        rpc: Rpc => Rpc,
        party: Party => Party,
        party_join_request: PartyJoinRequest => PartyJoinRequest,
        party_matchmaker_ticket: PartyMatchmakerTicket => PartyMatchmakerTicket,
    }
}

/// Error callback shape shared by every realtime operation.
pub type RtErrorCallback = Callback<RtError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

struct PendingConnect {
    on_connected: Option<Callback<()>>,
    on_error: Option<RtErrorCallback>,
    started: Instant,
}

/// Socket client for one server.
pub struct RtClient {
    config: ClientConfig,
    transport: Arc<dyn RtTransport>,
    dispatcher: Dispatcher<RtReplies, RtError>,
    listener: Option<Box<dyn RtClientListener>>,
    events: Option<UnboundedReceiver<TransportEvent>>,
    local_errors: VecDeque<(RequestHandle, RtError)>,
    pending_connect: Option<PendingConnect>,
    state: ConnectionState,
    last_received: Instant,
    last_ping: Instant,
}

impl RtClient {
    pub fn new(config: ClientConfig, transport: Arc<dyn RtTransport>) -> Self {
        let now = Instant::now();
        Self {
            dispatcher: Dispatcher::new(config.request_timeout()),
            config,
            transport,
            listener: None,
            events: None,
            local_errors: VecDeque::new(),
            pending_connect: None,
            state: ConnectionState::Disconnected,
            last_received: now,
            last_ping: now,
        }
    }

    /// Creates a client backed by [`WebSocketTransport`] on `runtime`.
    pub fn with_websocket(config: ClientConfig, runtime: tokio::runtime::Handle) -> Result<Self, ClientError> {
        config.validate().map_err(ClientError::Config)?;
        Ok(Self::new(config, Arc::new(WebSocketTransport::new(runtime))))
    }

    pub fn set_listener(&mut self, listener: Option<Box<dyn RtClientListener>>) {
        self.listener = listener;
    }

    /// Installs the callback used for request errors nobody registered a
    /// callback for.
    pub fn set_error_callback(&mut self, callback: Option<DefaultErrorCallback<RtError>>) {
        self.dispatcher.set_default_error(callback);
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn pending_requests(&self) -> usize {
        self.dispatcher.pending()
    }

    pub fn registered_callbacks(&self) -> usize {
        self.dispatcher.registered()
    }

    /// `ws(s)://host:port/ws?lang=en&status=<bool>&token=<token>`
    pub fn socket_url(&self, session: &Session, appear_online: bool) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.config.ws_base_url())?;
        url.query_pairs_mut()
            .append_pair("lang", "en")
            .append_pair("status", if appear_online { "true" } else { "false" })
            .append_pair("token", session.auth_token());
        Ok(url)
    }

    /// Opens the socket with the session's token.
    ///
    /// `on_connected` or `on_error` runs during a later `tick()`. An existing
    /// connection is replaced and its pending requests fail with
    /// `Disconnected` on that same tick. A handshake still unfinished after
    /// the request timeout fails with `ConnectError`.
    ///
    /// # Arguments
    ///
    /// * `session` - Session whose auth token authorizes the socket
    /// * `appear_online` - Whether followers see this user come online
    pub fn connect(
        &mut self,
        session: &Session,
        appear_online: bool,
        on_connected: Option<Callback<()>>,
        on_error: Option<RtErrorCallback>,
    ) {
        if self.state != ConnectionState::Disconnected {
            warn!("🔌 Reconnecting, dropping the current connection");
            self.transport.disconnect();
            for handle in self.dispatcher.pending_handles() {
                self.local_errors
                    .push_back((handle, RtError::new(RtErrorCode::Disconnected, "connection replaced")));
            }
        }

        let (events_tx, events_rx) = unbounded_channel();
        self.events = Some(events_rx);
        self.pending_connect = Some(PendingConnect {
            on_connected,
            on_error,
            started: Instant::now(),
        });
        self.state = ConnectionState::Connecting;

        let url = if session.auth_token().is_empty() {
            Err("session has no auth token".to_string())
        } else if session.is_expired() {
            Err("session has expired".to_string())
        } else {
            self.socket_url(session, appear_online).map_err(|e| e.to_string())
        };

        match url {
            Ok(url) => {
                info!("📡 Connecting to {}:{}", self.config.host, self.config.port);
                self.transport.connect(url.as_str(), events_tx);
            }
            Err(reason) => {
                let _ = events_tx.send(TransportEvent::Error(reason));
            }
        }
    }

    /// Closes the socket and abandons every pending request without calling
    /// it. The listener still sees `on_disconnect` if a connection was open.
    pub fn disconnect(&mut self) {
        self.transport.disconnect();
        self.events = None;
        self.pending_connect = None;
        self.local_errors.clear();
        let abandoned = self.dispatcher.abandon_all();
        let was_connected = self.state == ConnectionState::Connected;
        self.state = ConnectionState::Disconnected;

        if abandoned > 0 {
            warn!("🔌 Realtime disconnected with {} pending requests abandoned", abandoned);
        } else {
            info!("🔌 Realtime disconnected");
        }
        if was_connected {
            if let Some(listener) = self.listener.as_mut() {
                listener.on_disconnect(DisconnectInfo {
                    code: DisconnectInfo::NORMAL_CLOSURE,
                    reason: "disconnected by client".to_string(),
                    remote: false,
                });
            }
        }
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Processes queued transport events, sends a heartbeat when one is due
    /// and expires timed out requests, all against the clock value `now`.
    pub fn tick_at(&mut self, now: Instant) {
        while let Some(event) = self.events.as_mut().and_then(|rx| rx.try_recv().ok()) {
            self.handle_event(event, now);
        }
        while let Some((handle, error)) = self.local_errors.pop_front() {
            self.dispatcher.dispatch_error(handle, error);
        }
        self.connect_deadline(now);
        self.heartbeat(now);
        self.dispatcher.expire(now);
    }

    fn handle_event(&mut self, event: TransportEvent, now: Instant) {
        match event {
            TransportEvent::Connected => {
                info!("✅ Realtime connected");
                self.state = ConnectionState::Connected;
                self.last_received = now;
                self.last_ping = now;
                if let Some(PendingConnect { on_connected: Some(callback), .. }) = self.pending_connect.take() {
                    callback(());
                }
                if let Some(listener) = self.listener.as_mut() {
                    listener.on_connect();
                }
            }
            TransportEvent::Message(text) => {
                self.last_received = now;
                self.handle_message(&text);
            }
            TransportEvent::Error(reason) if self.state == ConnectionState::Connected => {
                self.emit_error(RtError::new(RtErrorCode::TransportError, reason));
            }
            TransportEvent::Error(reason) => {
                error!("❌ Realtime connection failed: {}", reason);
                self.state = ConnectionState::Disconnected;
                self.connect_failed(RtError::new(RtErrorCode::ConnectError, reason));
            }
            TransportEvent::Closed(info) => self.closed(info),
        }
    }

    fn connect_deadline(&mut self, now: Instant) {
        if self.state != ConnectionState::Connecting {
            return;
        }
        let (Some(timeout), Some(pending)) = (self.config.request_timeout(), self.pending_connect.as_ref()) else {
            return;
        };
        if now.saturating_duration_since(pending.started) < timeout {
            return;
        }

        warn!("⏰ Realtime handshake did not finish within {:?}", timeout);
        self.transport.disconnect();
        self.events = None;
        self.state = ConnectionState::Disconnected;
        self.connect_failed(RtError::new(
            RtErrorCode::ConnectError,
            format!("connect timed out after {} ms", timeout.as_millis()),
        ));
    }

    fn connect_failed(&mut self, error: RtError) {
        match self.pending_connect.take() {
            Some(PendingConnect { on_error: Some(callback), .. }) => callback(error),
            _ => self.emit_error(error),
        }
    }

    /// Handles a close the client did not initiate.
    fn closed(&mut self, info: DisconnectInfo) {
        let was_connecting = self.state == ConnectionState::Connecting;
        self.state = ConnectionState::Disconnected;
        warn!("🔌 Realtime connection closed: {} {}", info.code, info.reason);

        let reason = if info.reason.is_empty() {
            format!("connection closed with code {}", info.code)
        } else {
            info.reason.clone()
        };
        self.dispatcher
            .fail_all(|| RtError::new(RtErrorCode::Disconnected, reason.clone()));

        if was_connecting {
            self.connect_failed(RtError::new(RtErrorCode::ConnectError, reason));
        }
        if let Some(listener) = self.listener.as_mut() {
            listener.on_disconnect(info);
        }
    }

    fn heartbeat(&mut self, now: Instant) {
        let Some(interval) = self.config.heartbeat_interval() else {
            return;
        };
        if self.state != ConnectionState::Connected {
            return;
        }

        if now.saturating_duration_since(self.last_received) >= interval * 2 {
            warn!("⏰ No message from the server for {:?}, dropping the connection", interval * 2);
            self.transport.disconnect();
            self.events = None;
            self.closed(DisconnectInfo {
                code: DisconnectInfo::HEARTBEAT_FAILURE,
                reason: "heartbeat failure".to_string(),
                remote: false,
            });
            return;
        }

        if now.saturating_duration_since(self.last_ping) >= interval {
            self.last_ping = now;
            if !self.transport.send(r#"{"ping":{}}"#.to_string()) {
                debug!("Heartbeat ping not sent");
            }
        }
    }

    fn handle_message(&mut self, text: &str) {
        let mut envelope = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            _ => {
                self.emit_error(RtError::new(
                    RtErrorCode::TransportError,
                    format!("unable to parse message as JSON: {text}"),
                ));
                return;
            }
        };

        let cid = envelope
            .remove("cid")
            .and_then(|cid| match cid {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|cid| !cid.is_empty());

        match cid {
            Some(cid) => match RequestHandle::from_cid(&cid) {
                Some(handle) => self.complete(handle, envelope),
                None => warn!("Reply with an unusable cid {:?}", cid),
            },
            None => self.dispatch_event(envelope),
        }
    }

    fn complete(&mut self, handle: RequestHandle, mut envelope: Map<String, Value>) {
        if let Some(error) = envelope.remove("error") {
            let error = RtError::from_json(&error);
            debug!(handle = %handle, "Request failed: {}", error);
            self.dispatcher.dispatch_error(handle, error);
            return;
        }
        let payload = envelope
            .into_iter()
            .next()
            .map(|(_, payload)| payload)
            .unwrap_or_else(|| Value::Object(Map::new()));
        self.dispatcher.dispatch_success(handle, payload);
    }

    fn dispatch_event(&mut self, envelope: Map<String, Value>) {
        let Some((name, payload)) = envelope.into_iter().next() else {
            debug!("Dropping empty envelope");
            return;
        };

        match name.as_str() {
            "pong" => {}
            // Replies that lost their cid.
            "channel" | "channel_message_ack" | "match" | "matchmaker_ticket" | "status" | "rpc" => {
                debug!("Dropping {} reply without a cid", name);
            }
            "error" => self.emit_error(RtError::from_json(&payload)),
            "channel_message" => self.notify(&name, payload, |l, v| l.on_channel_message(v)),
            "channel_presence_event" => self.notify(&name, payload, |l, v| l.on_channel_presence(v)),
            "match_data" => self.notify(&name, payload, |l, v| l.on_match_data(v)),
            "match_presence_event" => self.notify(&name, payload, |l, v| l.on_match_presence(v)),
            "matchmaker_matched" => self.notify(&name, payload, |l, v| l.on_matchmaker_matched(v)),
            "notifications" => self.notify(&name, payload, |l, v| l.on_notifications(v)),
            "status_presence_event" => self.notify(&name, payload, |l, v| l.on_status_presence(v)),
            "stream_data" => self.notify(&name, payload, |l, v| l.on_stream_data(v)),
            "stream_presence_event" => self.notify(&name, payload, |l, v| l.on_stream_presence(v)),
            "party" => self.notify(&name, payload, |l, v| l.on_party(v)),
            "party_close" => self.notify(&name, payload, |l, v| l.on_party_close(v)),
            "party_data" => self.notify(&name, payload, |l, v| l.on_party_data(v)),
            "party_join_request" => self.notify(&name, payload, |l, v| l.on_party_join_request(v)),
            "party_leader" => self.notify(&name, payload, |l, v| l.on_party_leader(v)),
            "party_matchmaker_ticket" => self.notify(&name, payload, |l, v| l.on_party_matchmaker_ticket(v)),
            "party_presence_event" => self.notify(&name, payload, |l, v| l.on_party_presence(v)),
            other => self.emit_error(RtError::new(
                RtErrorCode::TransportError,
                format!("unknown message: {other}"),
            )),
        }
    }

    /// Decodes an event and hands it to the listener.
    fn notify<T: DeserializeOwned>(
        &mut self,
        name: &str,
        payload: Value,
        deliver: impl FnOnce(&mut dyn RtClientListener, T),
    ) {
        let Some(listener) = self.listener.as_mut() else {
            debug!("No listener for {} event", name);
            return;
        };
        match serde_json::from_value::<T>(payload) {
            Ok(event) => deliver(listener.as_mut(), event),
            Err(e) => listener.on_error(RtError::new(
                RtErrorCode::TransportError,
                format!("failed to decode {name}: {e}"),
            )),
        }
    }

    fn emit_error(&mut self, error: RtError) {
        match self.listener.as_mut() {
            Some(listener) => listener.on_error(error),
            None => warn!("❌ Realtime error not handled: {}", error),
        }
    }

    /// Registers the callbacks and sends `op` with a cid, or reports why it
    /// could not be sent on the next tick.
    ///
    /// Requests without callbacks still carry a cid so their reply is told
    /// apart from server events. The returned handle stays
    /// [`RequestHandle::NONE`] for them.
    fn request<T>(
        &mut self,
        op: &str,
        payload: Result<Value, RtError>,
        on_success: Option<Callback<T>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle
    where
        RtReplies: Slot<T>,
    {
        let handle = self.dispatcher.issue(on_success, on_error);
        let cid = if handle.is_none() { self.dispatcher.allocate() } else { handle };
        self.send_envelope(op, payload, handle, Some(cid));
        handle
    }

    /// Sends `op`, tagged with `cid` when given. Local failures are queued
    /// against `handle`.
    fn send_envelope(
        &mut self,
        op: &str,
        payload: Result<Value, RtError>,
        handle: RequestHandle,
        cid: Option<RequestHandle>,
    ) {
        let payload = match payload {
            Ok(payload) => payload,
            Err(error) => {
                self.local_errors.push_back((handle, error));
                return;
            }
        };
        if self.state != ConnectionState::Connected {
            self.local_errors.push_back((
                handle,
                RtError::new(RtErrorCode::ConnectError, format!("cannot send {op}: not connected")),
            ));
            return;
        }

        let text = envelope(op, payload, cid);
        if self.transport.send(text) {
            debug!(cid = ?cid.map(RequestHandle::as_cid), "➡️ {}", op);
        } else {
            self.local_errors.push_back((
                handle,
                RtError::new(RtErrorCode::TransportError, format!("failed to send {op}")),
            ));
        }
    }
}

/// `{"<op>": payload, "cid": "<cid>"}`, without `cid` for match and party data.
fn envelope(op: &str, payload: Value, cid: Option<RequestHandle>) -> String {
    let mut map = Map::new();
    map.insert(op.to_string(), payload);
    if let Some(cid) = cid {
        map.insert("cid".to_string(), Value::String(cid.as_cid()));
    }
    Value::Object(map).to_string()
}

impl std::fmt::Debug for RtClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtClient")
            .field("url", &self.config.ws_base_url())
            .field("state", &self.state)
            .field("dispatcher", &self.dispatcher)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl Drop for RtClient {
    fn drop(&mut self) {
        if self.state != ConnectionState::Disconnected {
            self.transport.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_carries_cid_only_when_given() {
        let with_cid: Value = serde_json::from_str(&envelope("match_create", json!({}), Some(RequestHandle(7)))).unwrap();
        assert_eq!(with_cid, json!({ "match_create": {}, "cid": "7" }));

        let without: Value = serde_json::from_str(&envelope("match_data_send", json!({ "op_code": "1" }), None)).unwrap();
        assert!(without.get("cid").is_none());
    }
}
