//! Storage, matches, notifications, chat history and RPC.

use super::{Client, ErrorCallback};
use crate::handle::RequestHandle;
use crate::http::{HttpAuth, HttpMethod, HttpRequest};
use crate::registry::Callback;
use crate::session::Session;
use crate::types::*;

impl Client {
    /// Lists objects in `collection`, optionally restricted to one owner.
    #[allow(clippy::too_many_arguments)]
    pub fn list_storage_objects(
        &mut self,
        session: &Session,
        collection: &str,
        user_id: Option<&str>,
        limit: Option<i32>,
        cursor: Option<&str>,
        on_success: Option<Callback<StorageObjectList>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_opt(&mut query, "user_id", user_id);
        push_opt(&mut query, "limit", limit);
        push_opt(&mut query, "cursor", cursor);
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "storage", collection])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn list_users_storage_objects(
        &mut self,
        session: &Session,
        collection: &str,
        user_id: &str,
        limit: Option<i32>,
        cursor: Option<&str>,
        on_success: Option<Callback<StorageObjectList>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_opt(&mut query, "limit", limit);
        push_opt(&mut query, "cursor", cursor);
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "storage", collection, user_id])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    pub fn write_storage_objects(
        &mut self,
        session: &Session,
        objects: &[StorageObjectWrite],
        on_success: Option<Callback<StorageObjectAcks>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self
            .session_request(session, HttpMethod::Put, &["v2", "storage"])
            .and_then(|r| r.with_json(&WriteStorageObjectsBody { objects }));
        self.send(request, on_success, on_error)
    }

    pub fn read_storage_objects(
        &mut self,
        session: &Session,
        object_ids: &[ReadStorageObjectId],
        on_success: Option<Callback<StorageObjects>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self
            .session_request(session, HttpMethod::Post, &["v2", "storage"])
            .and_then(|r| r.with_json(&ReadStorageObjectsBody { object_ids }));
        self.send(request, on_success, on_error)
    }

    pub fn delete_storage_objects(
        &mut self,
        session: &Session,
        object_ids: &[DeleteStorageObjectId],
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self
            .session_request(session, HttpMethod::Put, &["v2", "storage", "delete"])
            .and_then(|r| r.with_json(&DeleteStorageObjectsBody { object_ids }));
        self.send(request, on_success, on_error)
    }

    /// Lists running matches that satisfy `filter`.
    pub fn list_matches(
        &mut self,
        session: &Session,
        filter: &MatchFilter,
        on_success: Option<Callback<MatchList>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_opt(&mut query, "limit", filter.limit);
        push_opt(&mut query, "authoritative", filter.authoritative);
        push_opt(&mut query, "label", filter.label.as_deref());
        push_opt(&mut query, "min_size", filter.min_size);
        push_opt(&mut query, "max_size", filter.max_size);
        push_opt(&mut query, "query", filter.query.as_deref());
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "match"])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    pub fn list_notifications(
        &mut self,
        session: &Session,
        limit: Option<i32>,
        cacheable_cursor: Option<&str>,
        on_success: Option<Callback<NotificationList>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_opt(&mut query, "limit", limit);
        push_opt(&mut query, "cacheable_cursor", cacheable_cursor);
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "notification"])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    pub fn delete_notifications(
        &mut self,
        session: &Session,
        notification_ids: &[String],
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_repeated(&mut query, "ids", notification_ids);
        let request = self
            .session_request(session, HttpMethod::Delete, &["v2", "notification"])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    /// Pages through the persisted history of a chat channel.
    #[allow(clippy::too_many_arguments)]
    pub fn list_channel_messages(
        &mut self,
        session: &Session,
        channel_id: &str,
        limit: Option<i32>,
        cursor: Option<&str>,
        forward: Option<bool>,
        on_success: Option<Callback<ChannelMessageList>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_opt(&mut query, "limit", limit);
        push_opt(&mut query, "forward", forward);
        push_opt(&mut query, "cursor", cursor);
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "channel", channel_id])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    /// Calls a server function as the session's user. The payload is sent as
    /// a JSON string.
    pub fn rpc(
        &mut self,
        session: &Session,
        id: &str,
        payload: Option<&str>,
        on_success: Option<Callback<Rpc>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self
            .session_request(session, HttpMethod::Post, &["v2", "rpc", id])
            .and_then(|r| r.with_json(payload.unwrap_or_default()));
        self.send(request, on_success, on_error)
    }

    /// Calls a server function without a session, authorized by the
    /// server's runtime HTTP key.
    pub fn rpc_with_http_key(
        &mut self,
        http_key: &str,
        id: &str,
        payload: Option<&str>,
        on_success: Option<Callback<Rpc>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = HttpRequest::new(HttpMethod::Post, &["v2", "rpc", id])
            .with_auth(HttpAuth::None)
            .with_query(vec![("http_key".to_string(), http_key.to_string())])
            .with_json(payload.unwrap_or_default());
        self.send(request, on_success, on_error)
    }
}
