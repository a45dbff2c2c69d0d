#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use nakama_client::http::{CompletionFn, HttpRequest, HttpResponse, HttpTransport};
use nakama_client::realtime::{RtTransport, TransportEvent};
use nakama_client::types::realtime::DisconnectInfo;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

/// Builds an unsigned JWT carrying `claims`.
pub fn make_token(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

pub fn future_exp() -> i64 {
    chrono::Utc::now().timestamp() + 3600
}

pub fn live_token(user_id: &str) -> String {
    make_token(json!({ "uid": user_id, "usn": "player", "exp": future_exp() }))
}

/// Records requests and lets the test decide when and how each completes.
#[derive(Default)]
pub struct MockHttpTransport {
    pending: Mutex<Vec<(HttpRequest, CompletionFn)>>,
    sent: Mutex<Vec<HttpRequest>>,
    cancels: AtomicUsize,
}

impl MockHttpTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_sent(&self) -> HttpRequest {
        self.sent().last().cloned().expect("no request was sent")
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Completes the oldest pending request with `status` and `body`.
    pub fn respond(&self, status: u16, body: &str) -> HttpRequest {
        let (request, complete) = self.pending.lock().unwrap().remove(0);
        complete(Ok(HttpResponse { status, body: body.to_string() }));
        request
    }

    /// Completes the pending request at `index`.
    pub fn respond_at(&self, index: usize, status: u16, body: &str) -> HttpRequest {
        let (request, complete) = self.pending.lock().unwrap().remove(index);
        complete(Ok(HttpResponse { status, body: body.to_string() }));
        request
    }
}

impl HttpTransport for MockHttpTransport {
    fn send(&self, request: HttpRequest, on_complete: CompletionFn) {
        self.sent.lock().unwrap().push(request.clone());
        self.pending.lock().unwrap().push((request, on_complete));
    }

    fn cancel_all(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.pending.lock().unwrap().clear();
    }
}

/// Socket stand-in: records frames and injects server traffic.
#[derive(Default)]
pub struct MockRtTransport {
    events: Mutex<Option<UnboundedSender<TransportEvent>>>,
    url: Mutex<Option<String>>,
    sent: Mutex<Vec<String>>,
    connected: AtomicBool,
}

impl MockRtTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn url(&self) -> Option<String> {
        self.url.lock().unwrap().clone()
    }

    fn emit(&self, event: TransportEvent) {
        if let Some(events) = self.events.lock().unwrap().as_ref() {
            let _ = events.send(event);
        }
    }

    pub fn accept(&self) {
        self.connected.store(true, Ordering::SeqCst);
        self.emit(TransportEvent::Connected);
    }

    pub fn refuse(&self, reason: &str) {
        self.emit(TransportEvent::Error(reason.to_string()));
    }

    pub fn push(&self, frame: Value) {
        self.emit(TransportEvent::Message(frame.to_string()));
    }

    pub fn push_raw(&self, text: &str) {
        self.emit(TransportEvent::Message(text.to_string()));
    }

    pub fn close_from_server(&self, code: u16, reason: &str) {
        self.connected.store(false, Ordering::SeqCst);
        self.emit(TransportEvent::Closed(DisconnectInfo {
            code,
            reason: reason.to_string(),
            remote: true,
        }));
    }

    pub fn sent(&self) -> Vec<Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|text| serde_json::from_str(text).unwrap())
            .collect()
    }

    pub fn last_sent(&self) -> Value {
        self.sent().last().cloned().expect("no frame was sent")
    }

    pub fn last_cid(&self) -> String {
        self.last_sent()["cid"].as_str().expect("frame has no cid").to_string()
    }
}

impl RtTransport for MockRtTransport {
    fn connect(&self, url: &str, events: UnboundedSender<TransportEvent>) {
        *self.url.lock().unwrap() = Some(url.to_string());
        *self.events.lock().unwrap() = Some(events);
    }

    fn send(&self, text: String) -> bool {
        if !self.connected.load(Ordering::SeqCst) {
            return false;
        }
        self.sent.lock().unwrap().push(text);
        true
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        *self.events.lock().unwrap() = None;
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Shared log that callbacks append to.
#[derive(Default, Clone)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}
