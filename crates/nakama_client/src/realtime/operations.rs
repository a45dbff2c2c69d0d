//! Socket operations: chat, matches, matchmaking, status, RPC and parties.

use super::{RtClient, RtErrorCallback};
use crate::error::{RtError, RtErrorCode};
use crate::handle::RequestHandle;
use crate::registry::Callback;
use crate::types::realtime::*;
use crate::types::Rpc;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;

fn to_payload<T: Serialize>(value: &T) -> Result<Value, RtError> {
    serde_json::to_value(value)
        .map_err(|e| RtError::new(RtErrorCode::TransportError, format!("failed to serialize payload: {e}")))
}

/// Matchmaker fields, plus `party_id` for party tickets.
fn matchmaker_payload(query: &MatchmakerQuery, party_id: Option<&str>) -> Result<Value, RtError> {
    let mut payload = to_payload(query)?;
    if let (Some(party_id), Value::Object(map)) = (party_id, &mut payload) {
        map.insert("party_id".to_string(), Value::String(party_id.to_string()));
    }
    Ok(payload)
}

impl RtClient {
    /// Joins a room, group or direct message channel.
    ///
    /// # Arguments
    ///
    /// * `target` - Room name, group id or user id depending on `channel_type`
    /// * `persistence` - Whether messages are stored for history
    /// * `hidden` - Whether the join is hidden from other members
    pub fn join_chat(
        &mut self,
        target: &str,
        channel_type: ChannelType,
        persistence: Option<bool>,
        hidden: Option<bool>,
        on_success: Option<Callback<Channel>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        let mut payload = json!({ "target": target, "type": i32::from(channel_type) });
        if let Some(persistence) = persistence {
            payload["persistence"] = json!(persistence);
        }
        if let Some(hidden) = hidden {
            payload["hidden"] = json!(hidden);
        }
        self.request("channel_join", Ok(payload), on_success, on_error)
    }

    pub fn leave_chat(
        &mut self,
        channel_id: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        self.request("channel_leave", Ok(json!({ "channel_id": channel_id })), on_success, on_error)
    }

    /// Sends a message. `content` must be a JSON object encoded as a string.
    pub fn write_chat_message(
        &mut self,
        channel_id: &str,
        content: &str,
        on_success: Option<Callback<ChannelMessageAck>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        let payload = json!({ "channel_id": channel_id, "content": content });
        self.request("channel_message_send", Ok(payload), on_success, on_error)
    }

    pub fn update_chat_message(
        &mut self,
        channel_id: &str,
        message_id: &str,
        content: &str,
        on_success: Option<Callback<ChannelMessageAck>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        let payload = json!({ "channel_id": channel_id, "message_id": message_id, "content": content });
        self.request("channel_message_update", Ok(payload), on_success, on_error)
    }

    pub fn remove_chat_message(
        &mut self,
        channel_id: &str,
        message_id: &str,
        on_success: Option<Callback<ChannelMessageAck>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        let payload = json!({ "channel_id": channel_id, "message_id": message_id });
        self.request("channel_message_remove", Ok(payload), on_success, on_error)
    }

    /// Creates a relayed match owned by nobody.
    pub fn create_match(
        &mut self,
        on_success: Option<Callback<RtMatch>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        self.request("match_create", Ok(json!({})), on_success, on_error)
    }

    pub fn join_match(
        &mut self,
        match_id: &str,
        metadata: &HashMap<String, String>,
        on_success: Option<Callback<RtMatch>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        let mut payload = json!({ "match_id": match_id });
        if !metadata.is_empty() {
            payload["metadata"] = json!(metadata);
        }
        self.request("match_join", Ok(payload), on_success, on_error)
    }

    /// Joins the match named by a matchmaker token.
    pub fn join_match_by_token(
        &mut self,
        token: &str,
        on_success: Option<Callback<RtMatch>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        self.request("match_join", Ok(json!({ "token": token })), on_success, on_error)
    }

    pub fn leave_match(
        &mut self,
        match_id: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        self.request("match_leave", Ok(json!({ "match_id": match_id })), on_success, on_error)
    }

    /// Sends match state. Nothing is acknowledged; an empty `presences`
    /// broadcasts to the whole match.
    pub fn send_match_data(
        &mut self,
        match_id: &str,
        op_code: i64,
        data: &[u8],
        presences: &[UserPresence],
        reliable: bool,
    ) {
        let presences: Vec<Value> = presences
            .iter()
            .map(|p| json!({ "user_id": p.user_id, "session_id": p.session_id, "username": p.username }))
            .collect();
        let mut payload = json!({
            "match_id": match_id,
            "op_code": op_code.to_string(),
            "data": STANDARD.encode(data),
            "reliable": reliable,
        });
        if !presences.is_empty() {
            payload["presences"] = Value::Array(presences);
        }
        self.send_envelope("match_data_send", Ok(payload), RequestHandle::NONE, None);
    }

    /// Asks the matchmaker for opponents. The ticket identifies the request
    /// until it is matched or removed.
    pub fn add_matchmaker(
        &mut self,
        query: &MatchmakerQuery,
        on_success: Option<Callback<MatchmakerTicket>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        self.request("matchmaker_add", matchmaker_payload(query, None), on_success, on_error)
    }

    pub fn remove_matchmaker(
        &mut self,
        ticket: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        self.request("matchmaker_remove", Ok(json!({ "ticket": ticket })), on_success, on_error)
    }

    /// Subscribes to status updates of `user_ids`. The reply lists the ones
    /// currently online.
    pub fn follow_users(
        &mut self,
        user_ids: &[String],
        on_success: Option<Callback<Status>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        self.request("status_follow", Ok(json!({ "user_ids": user_ids })), on_success, on_error)
    }

    pub fn unfollow_users(
        &mut self,
        user_ids: &[String],
        on_success: Option<Callback<()>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        self.request("status_unfollow", Ok(json!({ "user_ids": user_ids })), on_success, on_error)
    }

    pub fn update_status(
        &mut self,
        status: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        self.request("status_update", Ok(json!({ "status": status })), on_success, on_error)
    }

    pub fn rpc(
        &mut self,
        id: &str,
        payload: Option<&str>,
        on_success: Option<Callback<Rpc>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        let mut body = json!({ "id": id });
        if let Some(payload) = payload {
            body["payload"] = json!(payload);
        }
        self.request("rpc", Ok(body), on_success, on_error)
    }

    pub fn create_party(
        &mut self,
        open: bool,
        max_size: i32,
        on_success: Option<Callback<Party>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        self.request("party_create", Ok(json!({ "open": open, "max_size": max_size })), on_success, on_error)
    }

    pub fn join_party(
        &mut self,
        party_id: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        self.request("party_join", Ok(json!({ "party_id": party_id })), on_success, on_error)
    }

    pub fn leave_party(
        &mut self,
        party_id: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        self.request("party_leave", Ok(json!({ "party_id": party_id })), on_success, on_error)
    }

    /// Ends the party for every member. Leader only.
    pub fn close_party(
        &mut self,
        party_id: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        self.request("party_close", Ok(json!({ "party_id": party_id })), on_success, on_error)
    }

    pub fn promote_party_member(
        &mut self,
        party_id: &str,
        presence: &UserPresence,
        on_success: Option<Callback<()>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        let payload = Self::party_presence_payload(party_id, presence);
        self.request("party_promote", Ok(payload), on_success, on_error)
    }

    /// Accepts a join request on a closed party.
    pub fn accept_party_member(
        &mut self,
        party_id: &str,
        presence: &UserPresence,
        on_success: Option<Callback<()>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        let payload = Self::party_presence_payload(party_id, presence);
        self.request("party_accept", Ok(payload), on_success, on_error)
    }

    /// Kicks a member, or rejects a pending join request.
    pub fn remove_party_member(
        &mut self,
        party_id: &str,
        presence: &UserPresence,
        on_success: Option<Callback<()>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        let payload = Self::party_presence_payload(party_id, presence);
        self.request("party_remove", Ok(payload), on_success, on_error)
    }

    fn party_presence_payload(party_id: &str, presence: &UserPresence) -> Value {
        let presence = json!({
            "user_id": presence.user_id,
            "persistence": presence.persistence,
            "session_id": presence.session_id,
            "username": presence.username,
        });
        json!({ "party_id": party_id, "presence": presence })
    }

    pub fn list_party_join_requests(
        &mut self,
        party_id: &str,
        on_success: Option<Callback<PartyJoinRequest>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        self.request("party_join_request_list", Ok(json!({ "party_id": party_id })), on_success, on_error)
    }

    pub fn add_matchmaker_party(
        &mut self,
        party_id: &str,
        query: &MatchmakerQuery,
        on_success: Option<Callback<PartyMatchmakerTicket>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        let payload = matchmaker_payload(query, Some(party_id));
        self.request("party_matchmaker_add", payload, on_success, on_error)
    }

    pub fn remove_matchmaker_party(
        &mut self,
        party_id: &str,
        ticket: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<RtErrorCallback>,
    ) -> RequestHandle {
        let payload = json!({ "party_id": party_id, "ticket": ticket });
        self.request("party_matchmaker_remove", Ok(payload), on_success, on_error)
    }

    /// Sends data to every party member. Nothing is acknowledged.
    pub fn send_party_data(&mut self, party_id: &str, op_code: i64, data: &[u8]) {
        let payload = json!({
            "party_id": party_id,
            "op_code": op_code.to_string(),
            "data": STANDARD.encode(data),
        });
        self.send_envelope("party_data_send", Ok(payload), RequestHandle::NONE, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matchmaker_payload_adds_party_id() {
        let query = MatchmakerQuery {
            min_count: Some(2),
            max_count: Some(4),
            query: Some("*".to_string()),
            ..Default::default()
        };
        let solo = matchmaker_payload(&query, None).unwrap();
        assert_eq!(solo, json!({ "min_count": 2, "max_count": 4, "query": "*" }));

        let party = matchmaker_payload(&query, Some("p1")).unwrap();
        assert_eq!(party["party_id"], "p1");
        assert_eq!(party["min_count"], 2);
    }
}
