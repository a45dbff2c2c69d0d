//! Accounts and users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Public profile of a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub lang_tag: Option<String>,
    pub location: Option<String>,
    pub timezone: Option<String>,
    /// Arbitrary JSON stored by server code.
    pub metadata: Option<String>,
    pub facebook_id: Option<String>,
    pub facebook_instant_game_id: Option<String>,
    pub google_id: Option<String>,
    pub gamecenter_id: Option<String>,
    pub steam_id: Option<String>,
    pub apple_id: Option<String>,
    pub online: bool,
    pub edge_count: i32,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountDevice {
    pub id: String,
    pub vars: HashMap<String, String>,
}

/// The authenticated user's own account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub user: User,
    /// Wallet as a JSON object string.
    pub wallet: String,
    pub email: Option<String>,
    pub devices: Vec<AccountDevice>,
    pub custom_id: Option<String>,
    pub verify_time: Option<DateTime<Utc>>,
    pub disable_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Users {
    pub users: Vec<User>,
}

/// Fields to change on the current account. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Game Center identity verification fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameCenterCredentials {
    pub player_id: String,
    pub bundle_id: String,
    #[serde(with = "super::int64")]
    pub timestamp_seconds: i64,
    pub salt: String,
    pub signature: String,
    pub public_key_url: String,
}
