//! Notifications, chat history, match listings and RPC payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    pub id: String,
    pub subject: String,
    /// JSON object encoded as a string.
    pub content: String,
    pub code: i32,
    pub sender_id: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub persistent: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub cacheable_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMessage {
    pub channel_id: String,
    pub message_id: String,
    pub code: i32,
    pub sender_id: String,
    pub username: String,
    pub content: String,
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
pub struct ChannelMessageList {
    pub messages: Vec<ChannelMessage>,
    pub next_cursor: Option<String>,
    pub prev_cursor: Option<String>,
    pub cacheable_cursor: Option<String>,
}

/// A running match as listed over HTTP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSummary {
    pub match_id: String,
    pub authoritative: bool,
    pub label: Option<String>,
    pub size: i32,
    pub tick_rate: i32,
    pub handler_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchList {
    pub matches: Vec<MatchSummary>,
}

/// Filters for listing matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchFilter {
    pub min_size: Option<i32>,
    pub max_size: Option<i32>,
    pub limit: Option<i32>,
    pub label: Option<String>,
    pub query: Option<String>,
    pub authoritative: Option<bool>,
}

/// Result of a server function call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rpc {
    pub id: String,
    pub payload: Option<String>,
    pub http_key: Option<String>,
}
