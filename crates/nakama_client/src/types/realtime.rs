//! Payloads carried over the realtime socket.

use super::int_enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

int_enum! {
    pub enum ChannelType {
        Unspecified = 0,
        Room = 1,
        DirectMessage = 2,
        Group = 3,
    }
}

/// A user's presence on a channel, match, party or stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPresence {
    pub user_id: String,
    pub session_id: String,
    pub username: String,
    pub persistence: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub id: String,
    pub presences: Vec<UserPresence>,
    #[serde(rename = "self")]
    pub self_presence: UserPresence,
    pub room_name: Option<String>,
    pub group_id: Option<String>,
    pub user_id_one: Option<String>,
    pub user_id_two: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMessageAck {
    pub channel_id: String,
    pub message_id: String,
    pub code: i32,
    pub username: String,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub persistent: bool,
    pub room_name: Option<String>,
    pub group_id: Option<String>,
    pub user_id_one: Option<String>,
    pub user_id_two: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelPresenceEvent {
    pub channel_id: String,
    pub joins: Vec<UserPresence>,
    pub leaves: Vec<UserPresence>,
    pub room_name: Option<String>,
    pub group_id: Option<String>,
    pub user_id_one: Option<String>,
    pub user_id_two: Option<String>,
}

/// A match joined or created over the socket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RtMatch {
    pub match_id: String,
    pub authoritative: bool,
    pub label: Option<String>,
    pub size: i32,
    pub presences: Vec<UserPresence>,
    #[serde(rename = "self")]
    pub self_presence: UserPresence,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchData {
    pub match_id: String,
    pub presence: UserPresence,
    #[serde(with = "super::int64")]
    pub op_code: i64,
    #[serde(with = "super::base64_bytes")]
    pub data: Vec<u8>,
    pub reliable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPresenceEvent {
    pub match_id: String,
    pub joins: Vec<UserPresence>,
    pub leaves: Vec<UserPresence>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakerTicket {
    pub ticket: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakerUser {
    pub presence: UserPresence,
    pub party_id: Option<String>,
    pub string_properties: HashMap<String, String>,
    pub numeric_properties: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakerMatched {
    pub ticket: String,
    pub match_id: Option<String>,
    pub token: Option<String>,
    pub users: Vec<MatchmakerUser>,
    #[serde(rename = "self")]
    pub self_user: MatchmakerUser,
}

/// Matchmaking criteria shared by solo and party tickets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchmakerQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_multiple: Option<i32>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub string_properties: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub numeric_properties: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    pub presences: Vec<UserPresence>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusPresenceEvent {
    pub joins: Vec<UserPresence>,
    pub leaves: Vec<UserPresence>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stream {
    pub mode: i32,
    pub subject: String,
    pub subcontext: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamData {
    pub stream: Stream,
    pub sender: Option<UserPresence>,
    pub data: String,
    pub reliable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamPresenceEvent {
    pub stream: Stream,
    pub joins: Vec<UserPresence>,
    pub leaves: Vec<UserPresence>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Party {
    pub party_id: String,
    pub open: bool,
    pub max_size: i32,
    #[serde(rename = "self")]
    pub self_presence: UserPresence,
    pub leader: UserPresence,
    pub presences: Vec<UserPresence>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyClose {
    pub party_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyData {
    pub party_id: String,
    pub presence: UserPresence,
    #[serde(with = "super::int64")]
    pub op_code: i64,
    #[serde(with = "super::base64_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyJoinRequest {
    pub party_id: String,
    pub presences: Vec<UserPresence>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyLeader {
    pub party_id: String,
    pub presence: UserPresence,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyMatchmakerTicket {
    pub party_id: String,
    pub ticket: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyPresenceEvent {
    pub party_id: String,
    pub joins: Vec<UserPresence>,
    pub leaves: Vec<UserPresence>,
}

/// Close details reported when the socket goes away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectInfo {
    pub code: u16,
    pub reason: String,
    /// True when the server initiated the close.
    pub remote: bool,
}

impl DisconnectInfo {
    pub const NORMAL_CLOSURE: u16 = 1000;
    pub const GOING_AWAY: u16 = 1001;
    pub const ABNORMAL_CLOSURE: u16 = 1006;
    pub const HEARTBEAT_FAILURE: u16 = 4000;
    pub const TRANSPORT_ERROR: u16 = 4001;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_self_field() {
        let body = r#"{"id":"2...lobby","presences":[],"self":{"user_id":"u","session_id":"s","username":"n"},"room_name":"lobby"}"#;
        let channel: Channel = serde_json::from_str(body).unwrap();
        assert_eq!(channel.self_presence.user_id, "u");
        assert_eq!(channel.room_name.as_deref(), Some("lobby"));
    }

    #[test]
    fn test_match_data_decodes_base64() {
        let body = r#"{"match_id":"m","op_code":"5","data":"AQID","presence":{"user_id":"u"}}"#;
        let data: MatchData = serde_json::from_str(body).unwrap();
        assert_eq!(data.op_code, 5);
        assert_eq!(data.data, vec![1, 2, 3]);
        assert!(!data.reliable);
    }

    #[test]
    fn test_matchmaker_query_skips_empty() {
        let query = MatchmakerQuery {
            min_count: Some(2),
            max_count: Some(4),
            query: Some("*".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["min_count"], 2);
        assert!(json.get("string_properties").is_none());
        assert!(json.get("count_multiple").is_none());
    }
}
