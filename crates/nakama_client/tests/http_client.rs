mod common;

use common::{live_token, make_token, Log, MockHttpTransport};
use nakama_client::http::{HttpAuth, HttpMethod};
use nakama_client::types::{FriendState, StorageObjectWrite, StoragePermissionRead};
use nakama_client::{Client, ClientConfig, ErrorCode, RequestHandle, Session};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn client(transport: &Arc<MockHttpTransport>) -> Client {
    Client::new(ClientConfig::default(), transport.clone())
}

fn session() -> Session {
    Session::restore(&live_token("user-1"), "").unwrap()
}

fn body(request: &nakama_client::http::HttpRequest) -> Value {
    serde_json::from_str(request.body.as_deref().unwrap()).unwrap()
}

#[test]
fn test_device_authentication_success() {
    let transport = MockHttpTransport::new();
    let mut client = client(&transport);
    let token = live_token("user-1");
    let received: Arc<Mutex<Option<Session>>> = Arc::default();
    let errors = Log::default();

    let slot = received.clone();
    let error_log = errors.clone();
    let handle = client.authenticate_device(
        "device-123",
        Some("alice"),
        true,
        &HashMap::new(),
        Some(Box::new(move |session| *slot.lock().unwrap() = Some(session))),
        Some(Box::new(move |err| error_log.push(err.to_string()))),
    );
    assert!(!handle.is_none());
    assert_eq!(client.registered_callbacks(), 2);

    let request = transport.last_sent();
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.path(), "/v2/account/authenticate/device");
    assert_eq!(request.query_values("create"), vec!["true"]);
    assert_eq!(request.query_values("username"), vec!["alice"]);
    assert_eq!(request.auth, HttpAuth::ServerKey("defaultkey".to_string()));
    assert_eq!(body(&request), json!({ "id": "device-123" }));

    transport.respond(200, &json!({ "token": token, "created": true }).to_string());
    assert!(received.lock().unwrap().is_none(), "callbacks only run inside tick");
    client.tick();

    let session = received.lock().unwrap().take().expect("success callback did not run");
    assert_eq!(session.auth_token(), token);
    assert_eq!(session.user_id(), "user-1");
    assert!(session.is_created());
    assert_eq!(errors.len(), 0);
    assert_eq!(client.registered_callbacks(), 0);
    assert_eq!(client.pending_requests(), 0);
}

#[test]
fn test_server_error_reaches_error_callback_once() {
    let transport = MockHttpTransport::new();
    let mut client = client(&transport);
    let errors: Arc<Mutex<Vec<(ErrorCode, String)>>> = Arc::default();
    let successes = Log::default();

    let sink = errors.clone();
    let ok = successes.clone();
    client.authenticate_email(
        "a@example.com",
        "short",
        None,
        false,
        &HashMap::new(),
        Some(Box::new(move |_| ok.push("session"))),
        Some(Box::new(move |err| sink.lock().unwrap().push((err.code, err.message)))),
    );

    transport.respond(400, r#"{"code":3,"message":"Bad Input"}"#);
    client.tick();
    client.tick();

    assert_eq!(*errors.lock().unwrap(), vec![(ErrorCode::InvalidArgument, "Bad Input".to_string())]);
    assert_eq!(successes.len(), 0);
    assert_eq!(client.registered_callbacks(), 0);
}

#[test]
fn test_unparseable_error_body_is_internal_error() {
    let transport = MockHttpTransport::new();
    let mut client = client(&transport);
    let errors: Arc<Mutex<Vec<ErrorCode>>> = Arc::default();

    let sink = errors.clone();
    client.get_account(&session(), None, Some(Box::new(move |err| sink.lock().unwrap().push(err.code))));
    transport.respond(502, "<html>bad gateway</html>");
    client.tick();

    assert_eq!(*errors.lock().unwrap(), vec![ErrorCode::InternalError]);
}

#[test]
fn test_fire_and_forget_registers_nothing() {
    let transport = MockHttpTransport::new();
    let mut client = client(&transport);
    let log = Log::default();

    let ok = log.clone();
    client.get_account(&session(), Some(Box::new(move |account| ok.push(account.wallet))), None);
    assert_eq!(client.registered_callbacks(), 1);

    let handle = client.delete_notifications(&session(), &["n1".to_string()], None, None);
    assert_eq!(handle, RequestHandle::NONE);
    assert_eq!(client.registered_callbacks(), 1);
    assert_eq!(transport.pending(), 2);

    let forgotten = transport.respond_at(1, 200, "");
    assert_eq!(forgotten.query_values("ids"), vec!["n1"]);
    transport.respond(200, r#"{"wallet":"{\"coins\":5}","user":{"id":"user-1"}}"#);
    client.tick();

    assert_eq!(log.entries(), vec![r#"{"coins":5}"#.to_string()]);
    assert_eq!(client.registered_callbacks(), 0);
}

#[test]
fn test_fire_and_forget_errors_use_default_callback() {
    let transport = MockHttpTransport::new();
    let mut client = client(&transport);
    let defaults = Log::default();

    let sink = defaults.clone();
    client.set_error_callback(Some(Box::new(move |err| sink.push(format!("{:?}", err.code)))));
    client.join_group(&session(), "group-1", None, None);
    transport.respond(404, r#"{"code":5,"message":"Group not found."}"#);
    client.tick();

    assert_eq!(defaults.entries(), vec!["NotFound".to_string()]);
}

#[test]
fn test_disconnect_abandons_pending_requests() {
    let transport = MockHttpTransport::new();
    let mut client = client(&transport);
    let log = Log::default();

    let ok = log.clone();
    let err = log.clone();
    client.list_friends(
        &session(),
        Some(10),
        Some(FriendState::Friend),
        None,
        Some(Box::new(move |_| ok.push("success"))),
        Some(Box::new(move |_| err.push("error"))),
    );
    assert_eq!(client.pending_requests(), 1);

    client.disconnect();
    assert_eq!(transport.cancels(), 1);
    assert_eq!(client.pending_requests(), 0);
    assert_eq!(client.registered_callbacks(), 0);

    client.tick();
    assert_eq!(log.len(), 0);
}

#[test]
fn test_completion_queued_before_disconnect_is_dropped() {
    let transport = MockHttpTransport::new();
    let mut client = client(&transport);
    let log = Log::default();

    let ok = log.clone();
    client.get_account(&session(), Some(Box::new(move |_| ok.push("account"))), None);
    transport.respond(200, r#"{"user":{"id":"user-1"}}"#);
    client.disconnect();
    client.tick();

    assert_eq!(log.len(), 0);
}

#[test]
fn test_request_timeout_fires_once_and_drops_late_response() {
    let transport = MockHttpTransport::new();
    let mut config = ClientConfig::default();
    config.request_timeout_ms = 1_000;
    let mut client = Client::new(config, transport.clone());
    let log = Log::default();

    let ok = log.clone();
    let err = log.clone();
    let start = Instant::now();
    client.get_users(
        &session(),
        &["user-2".to_string()],
        &[],
        &[],
        Some(Box::new(move |_| ok.push("success"))),
        Some(Box::new(move |e| err.push(format!("{:?}", e.code)))),
    );

    client.tick_at(start + Duration::from_millis(500));
    assert_eq!(log.len(), 0);

    client.tick_at(start + Duration::from_millis(1_500));
    assert_eq!(log.entries(), vec!["DeadlineExceeded".to_string()]);

    transport.respond(200, r#"{"users":[]}"#);
    client.tick_at(start + Duration::from_millis(2_000));
    assert_eq!(log.len(), 1);
    assert_eq!(client.registered_callbacks(), 0);
}

#[test]
fn test_expired_session_is_rejected_locally() {
    let transport = MockHttpTransport::new();
    let mut client = client(&transport);
    let expired = Session::restore(&make_token(json!({ "uid": "user-1", "exp": 1_000 })), "").unwrap();
    let errors: Arc<Mutex<Vec<ErrorCode>>> = Arc::default();

    let sink = errors.clone();
    let handle = client.get_account(&expired, None, Some(Box::new(move |err| sink.lock().unwrap().push(err.code))));
    assert!(!handle.is_none());
    assert!(transport.sent().is_empty());
    assert!(errors.lock().unwrap().is_empty());

    client.tick();
    assert_eq!(*errors.lock().unwrap(), vec![ErrorCode::InvalidSession]);
}

#[test]
fn test_list_and_id_parameters_are_encoded() {
    let transport = MockHttpTransport::new();
    let mut client = client(&transport);
    let session = session();

    client.get_users(&session, &["a".to_string(), "b".to_string()], &["carol".to_string()], &[], None, None);
    let request = transport.last_sent();
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(request.path(), "/v2/user");
    assert_eq!(request.query_values("ids"), vec!["a", "b"]);
    assert_eq!(request.query_values("usernames"), vec!["carol"]);
    assert!(request.query_values("facebook_ids").is_empty());
    assert_eq!(request.auth, HttpAuth::Bearer(session.auth_token().to_string()));

    client.kick_group_users(&session, "g 1", &["u1".to_string()], None, None);
    let request = transport.last_sent();
    assert_eq!(request.segments, vec!["v2", "group", "g 1", "kick"]);
    assert_eq!(request.query_values("user_ids"), vec!["u1"]);
}

#[test]
fn test_storage_write_body_keeps_absent_fields_absent() {
    let transport = MockHttpTransport::new();
    let mut client = client(&transport);

    let objects = vec![StorageObjectWrite {
        collection: "saves".to_string(),
        key: "slot1".to_string(),
        value: r#"{"level":3}"#.to_string(),
        version: Some(String::new()),
        permission_read: Some(StoragePermissionRead::OwnerRead),
        permission_write: None,
    }];
    client.write_storage_objects(&session(), &objects, None, None);

    let request = transport.last_sent();
    assert_eq!(request.method, HttpMethod::Put);
    assert_eq!(request.path(), "/v2/storage");
    let sent = body(&request);
    let object = &sent["objects"][0];
    assert_eq!(object["version"], "");
    assert_eq!(object["permission_read"], 1);
    assert!(object.get("permission_write").is_none());
}

#[test]
fn test_rpc_with_http_key_needs_no_session() {
    let transport = MockHttpTransport::new();
    let mut client = client(&transport);
    let log = Log::default();

    let ok = log.clone();
    client.rpc_with_http_key(
        "http-key",
        "echo",
        Some(r#"{"hello":"world"}"#),
        Some(Box::new(move |rpc| ok.push(rpc.payload.unwrap_or_default()))),
        None,
    );

    let request = transport.last_sent();
    assert_eq!(request.auth, HttpAuth::None);
    assert_eq!(request.query_values("http_key"), vec!["http-key"]);
    assert_eq!(body(&request), Value::String(r#"{"hello":"world"}"#.to_string()));

    transport.respond(200, r#"{"id":"echo","payload":"{\"hello\":\"world\"}"}"#);
    client.tick();
    assert_eq!(log.entries(), vec![r#"{"hello":"world"}"#.to_string()]);
}

#[test]
fn test_steam_link_wraps_account() {
    let transport = MockHttpTransport::new();
    let mut client = client(&transport);

    client.link_steam(&session(), "steam-token", true, None, None);
    let request = transport.last_sent();
    assert_eq!(request.path(), "/v2/account/link/steam");
    assert_eq!(body(&request), json!({ "account": { "token": "steam-token" }, "sync": true }));

    client.link_facebook(&session(), "fb-token", false, None, None);
    let request = transport.last_sent();
    assert_eq!(request.query_values("sync"), vec!["false"]);
    assert_eq!(body(&request), json!({ "token": "fb-token" }));
}

#[test]
fn test_refresh_and_logout_use_the_right_auth() {
    let transport = MockHttpTransport::new();
    let mut client = client(&transport);
    let refresh = make_token(json!({ "uid": "user-1", "exp": common::future_exp() + 3600 }));
    let session = Session::restore(&live_token("user-1"), &refresh).unwrap();

    client.authenticate_refresh(&session, &HashMap::new(), None, None);
    let request = transport.last_sent();
    assert_eq!(request.path(), "/v2/account/session/refresh");
    assert_eq!(request.auth, HttpAuth::ServerKey("defaultkey".to_string()));
    assert_eq!(body(&request), json!({ "token": refresh }));

    client.session_logout(&session, None, None);
    let request = transport.last_sent();
    assert_eq!(request.path(), "/v2/session/logout");
    assert_eq!(request.auth, HttpAuth::Bearer(session.auth_token().to_string()));
    assert_eq!(body(&request)["refresh_token"], refresh);
}

#[test]
fn test_malformed_success_body_routes_internal_error() {
    let transport = MockHttpTransport::new();
    let mut client = client(&transport);
    let errors: Arc<Mutex<Vec<ErrorCode>>> = Arc::default();
    let log = Log::default();

    let sink = errors.clone();
    let ok = log.clone();
    client.authenticate_custom(
        "custom-id",
        None,
        true,
        &HashMap::new(),
        Some(Box::new(move |_| ok.push("session"))),
        Some(Box::new(move |err| sink.lock().unwrap().push(err.code))),
    );
    transport.respond(200, r#"{"token":"not-a-jwt"}"#);
    client.tick();

    assert_eq!(*errors.lock().unwrap(), vec![ErrorCode::InternalError]);
    assert_eq!(log.len(), 0);
    assert_eq!(client.registered_callbacks(), 0);
}
