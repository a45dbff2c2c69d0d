mod common;

use common::{live_token, make_token, Log, MockRtTransport};
use nakama_client::types::realtime::{ChannelType, DisconnectInfo, MatchData};
use nakama_client::types::ChannelMessage;
use nakama_client::{ClientConfig, ConnectionState, RtClient, RtClientListener, RtError, RtErrorCode, Session};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Writes every listener call into a shared log.
struct Recorder(Log);

impl RtClientListener for Recorder {
    fn on_connect(&mut self) {
        self.0.push("connect");
    }

    fn on_disconnect(&mut self, info: DisconnectInfo) {
        self.0.push(format!("disconnect {} remote={}", info.code, info.remote));
    }

    fn on_error(&mut self, error: RtError) {
        self.0.push(format!("error {:?}: {}", error.code, error.message));
    }

    fn on_channel_message(&mut self, message: ChannelMessage) {
        self.0.push(format!("message {} {}", message.channel_id, message.content));
    }

    fn on_match_data(&mut self, data: MatchData) {
        self.0.push(format!("match_data {} {:?}", data.op_code, data.data));
    }
}

fn session() -> Session {
    Session::restore(&live_token("user-1"), "").unwrap()
}

/// Connected client plus the transport and listener log behind it.
fn connected(start: Instant) -> (RtClient, Arc<MockRtTransport>, Log) {
    let transport = MockRtTransport::new();
    let mut client = RtClient::new(ClientConfig::default(), transport.clone());
    let log = Log::default();
    client.set_listener(Some(Box::new(Recorder(log.clone()))));
    client.connect(&session(), true, None, None);
    transport.accept();
    client.tick_at(start);
    assert!(client.is_connected());
    (client, transport, log)
}

#[test]
fn test_connect_url_and_callbacks() {
    let transport = MockRtTransport::new();
    let mut client = RtClient::new(ClientConfig::default(), transport.clone());
    let log = Log::default();
    client.set_listener(Some(Box::new(Recorder(log.clone()))));

    let connected = log.clone();
    let session = session();
    client.connect(&session, false, Some(Box::new(move |_| connected.push("on_connected"))), None);
    assert_eq!(client.state(), ConnectionState::Connecting);

    let url = transport.url().expect("transport was not asked to connect");
    assert!(url.starts_with("ws://127.0.0.1:7350/ws?"), "unexpected url {url}");
    assert!(url.contains("lang=en"));
    assert!(url.contains("status=false"));
    assert!(url.contains(&format!("token={}", session.auth_token())));

    transport.accept();
    assert_eq!(log.len(), 0);
    client.tick();

    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(log.entries(), vec!["on_connected", "connect"]);
}

#[test]
fn test_refused_connection_reaches_connect_error_callback() {
    let transport = MockRtTransport::new();
    let mut client = RtClient::new(ClientConfig::default(), transport.clone());
    let errors: Arc<Mutex<Vec<RtErrorCode>>> = Arc::default();

    let sink = errors.clone();
    client.connect(&session(), true, None, Some(Box::new(move |err| sink.lock().unwrap().push(err.code))));
    transport.refuse("connection refused");
    client.tick();

    assert_eq!(*errors.lock().unwrap(), vec![RtErrorCode::ConnectError]);
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[test]
fn test_expired_session_never_opens_socket() {
    let transport = MockRtTransport::new();
    let mut client = RtClient::new(ClientConfig::default(), transport.clone());
    let errors = Log::default();
    let expired = Session::restore(&make_token(json!({ "uid": "user-1", "exp": 1_000 })), "").unwrap();

    let sink = errors.clone();
    client.connect(&expired, true, None, Some(Box::new(move |err| sink.push(err.message))));
    client.tick();

    assert!(transport.url().is_none());
    assert_eq!(errors.entries(), vec!["session has expired".to_string()]);
}

#[test]
fn test_join_chat_reply_is_matched_by_cid() {
    let (mut client, transport, _log) = connected(Instant::now());
    let joined: Arc<Mutex<Option<String>>> = Arc::default();

    let slot = joined.clone();
    let handle = client.join_chat(
        "lobby",
        ChannelType::Room,
        Some(false),
        Some(false),
        Some(Box::new(move |channel| *slot.lock().unwrap() = Some(channel.id))),
        None,
    );

    let frame = transport.last_sent();
    assert_eq!(frame["channel_join"]["target"], "lobby");
    assert_eq!(frame["channel_join"]["type"], 1);
    assert_eq!(frame["cid"], handle.as_cid());
    assert_eq!(client.registered_callbacks(), 1);

    transport.push(json!({ "cid": transport.last_cid(), "channel": { "id": "2...lobby", "room_name": "lobby" } }));
    client.tick();

    assert_eq!(joined.lock().unwrap().as_deref(), Some("2...lobby"));
    assert_eq!(client.registered_callbacks(), 0);
}

#[test]
fn test_requests_without_callbacks_still_carry_cid() {
    let (mut client, transport, log) = connected(Instant::now());

    let join = client.join_chat("lobby", ChannelType::Room, None, None, None, None);
    let joined = transport.last_sent();
    let status = client.update_status("busy", None, None);
    let updated = transport.last_sent();

    assert!(join.is_none() && status.is_none());
    assert_eq!(client.registered_callbacks(), 0);
    let join_cid = joined["cid"].as_str().expect("channel_join sent without cid").to_string();
    let status_cid = updated["cid"].as_str().expect("status_update sent without cid").to_string();
    assert_ne!(join_cid, status_cid);

    transport.push(json!({ "cid": join_cid, "channel": { "id": "2...lobby", "room_name": "lobby" } }));
    transport.push(json!({ "cid": status_cid }));
    transport.push(json!({ "channel": { "id": "2...lobby" } }));
    transport.push(json!({}));
    client.tick();

    assert_eq!(log.entries(), vec!["connect"]);
    assert_eq!(client.pending_requests(), 0);
}

#[test]
fn test_error_reply_maps_code() {
    let (mut client, transport, _log) = connected(Instant::now());
    let errors: Arc<Mutex<Vec<(RtErrorCode, String)>>> = Arc::default();

    let sink = errors.clone();
    client.write_chat_message("missing", "{}", None, Some(Box::new(move |err| {
        sink.lock().unwrap().push((err.code, err.message))
    })));
    transport.push(json!({ "cid": transport.last_cid(), "error": { "code": 3, "message": "Invalid channel" } }));
    client.tick();

    assert_eq!(*errors.lock().unwrap(), vec![(RtErrorCode::BadInput, "Invalid channel".to_string())]);
}

#[test]
fn test_server_events_reach_listener() {
    let (mut client, transport, log) = connected(Instant::now());

    transport.push(json!({ "channel_message": { "channel_id": "c1", "content": "{\"hi\":1}" } }));
    transport.push(json!({ "match_data": { "match_id": "m1", "op_code": "7", "data": "AQI=" } }));
    transport.push(json!({ "pong": {} }));
    transport.push(json!({ "error": { "code": 4, "message": "Match not found" } }));
    transport.push(json!({ "party_teleport": {} }));
    transport.push_raw("not json");
    client.tick();

    assert_eq!(
        log.entries()[1..],
        [
            "message c1 {\"hi\":1}".to_string(),
            "match_data 7 [1, 2]".to_string(),
            "error MatchNotFound: Match not found".to_string(),
            "error TransportError: unknown message: party_teleport".to_string(),
            "error TransportError: unable to parse message as JSON: not json".to_string(),
        ]
    );
}

#[test]
fn test_send_match_data_is_fire_and_forget() {
    let (mut client, transport, _log) = connected(Instant::now());

    client.send_match_data("m1", 42, b"hello", &[], true);
    let frame = transport.last_sent();
    assert!(frame.get("cid").is_none());
    assert_eq!(frame["match_data_send"]["op_code"], "42");
    assert_eq!(frame["match_data_send"]["data"], "aGVsbG8=");
    assert_eq!(client.registered_callbacks(), 0);
}

#[test]
fn test_server_close_fails_pending_requests() {
    let (mut client, transport, log) = connected(Instant::now());
    let errors: Arc<Mutex<Vec<RtErrorCode>>> = Arc::default();

    let sink = errors.clone();
    client.create_match(None, Some(Box::new(move |err| sink.lock().unwrap().push(err.code))));
    assert_eq!(client.pending_requests(), 1);

    transport.close_from_server(1001, "going away");
    client.tick();

    assert_eq!(*errors.lock().unwrap(), vec![RtErrorCode::Disconnected]);
    assert_eq!(client.pending_requests(), 0);
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(log.entries().last().map(String::as_str), Some("disconnect 1001 remote=true"));
}

#[test]
fn test_reconnect_fails_pending_requests_on_tick() {
    let (mut client, transport, _log) = connected(Instant::now());
    let calls = Log::default();

    let sink = calls.clone();
    client.create_match(None, Some(Box::new(move |err| sink.push(format!("{:?}", err.code)))));
    client.connect(&session(), true, None, None);
    assert_eq!(client.state(), ConnectionState::Connecting);
    assert_eq!(calls.len(), 0);

    transport.accept();
    client.tick();

    assert_eq!(calls.entries(), vec!["Disconnected"]);
    assert_eq!(client.pending_requests(), 0);
    assert!(client.is_connected());
}

#[test]
fn test_stalled_handshake_times_out() {
    let transport = MockRtTransport::new();
    let mut client = RtClient::new(ClientConfig::default(), transport.clone());
    let errors = Log::default();

    let sink = errors.clone();
    client.connect(&session(), true, None, Some(Box::new(move |err| {
        sink.push(format!("{:?}: {}", err.code, err.message))
    })));
    let start = Instant::now();

    client.tick_at(start + Duration::from_secs(10));
    assert_eq!(client.state(), ConnectionState::Connecting);
    assert_eq!(errors.len(), 0);

    client.tick_at(start + Duration::from_secs(31));
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(errors.entries(), vec!["ConnectError: connect timed out after 30000 ms"]);

    // A late accept from the abandoned handshake changes nothing.
    transport.accept();
    client.tick_at(start + Duration::from_secs(32));
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_explicit_disconnect_abandons_requests() {
    let (mut client, _transport, log) = connected(Instant::now());
    let calls = Log::default();

    let ok = calls.clone();
    let err = calls.clone();
    client.rpc(
        "echo",
        Some("{}"),
        Some(Box::new(move |_| ok.push("success"))),
        Some(Box::new(move |_| err.push("error"))),
    );
    client.disconnect();
    client.tick();

    assert_eq!(calls.len(), 0);
    assert_eq!(client.registered_callbacks(), 0);
    assert_eq!(log.entries().last().map(String::as_str), Some("disconnect 1000 remote=false"));
}

#[test]
fn test_send_while_disconnected_reports_connect_error() {
    let transport = MockRtTransport::new();
    let mut client = RtClient::new(ClientConfig::default(), transport.clone());
    let errors: Arc<Mutex<Vec<RtErrorCode>>> = Arc::default();

    let sink = errors.clone();
    let handle = client.follow_users(&["user-2".to_string()], None, Some(Box::new(move |err| {
        sink.lock().unwrap().push(err.code)
    })));
    assert!(!handle.is_none());
    assert!(errors.lock().unwrap().is_empty());

    client.tick();
    assert_eq!(*errors.lock().unwrap(), vec![RtErrorCode::ConnectError]);
    assert!(transport.sent().is_empty());
}

#[test]
fn test_heartbeat_ping_and_failure() {
    let start = Instant::now();
    let (mut client, transport, log) = connected(start);

    client.tick_at(start + Duration::from_millis(1_000));
    assert!(transport.sent().is_empty());

    client.tick_at(start + Duration::from_millis(3_000));
    assert_eq!(transport.sent(), vec![json!({ "ping": {} })]);

    client.tick_at(start + Duration::from_millis(6_000));
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert_eq!(log.entries().last().map(String::as_str), Some("disconnect 4000 remote=false"));
}

#[test]
fn test_incoming_traffic_keeps_connection_alive() {
    let start = Instant::now();
    let (mut client, transport, _log) = connected(start);

    client.tick_at(start + Duration::from_millis(3_000));
    transport.push(json!({ "pong": {} }));
    client.tick_at(start + Duration::from_millis(4_000));
    client.tick_at(start + Duration::from_millis(6_500));

    assert!(client.is_connected());
}
