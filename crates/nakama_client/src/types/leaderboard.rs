//! Leaderboards and tournaments.

use super::int_enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

int_enum! {
    /// How a submitted score combines with the stored one.
    pub enum LeaderboardOperator {
        NoOverride = 0,
        Best = 1,
        Set = 2,
        Increment = 3,
        Decrement = 4,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardRecord {
    pub leaderboard_id: String,
    pub owner_id: String,
    pub username: Option<String>,
    #[serde(with = "super::int64")]
    pub score: i64,
    #[serde(with = "super::int64")]
    pub subscore: i64,
    pub num_score: i32,
    pub max_num_score: u32,
    pub metadata: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub expiry_time: Option<DateTime<Utc>>,
    #[serde(with = "super::int64")]
    pub rank: i64,
}

/// Page of records. Also returned for tournaments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardRecordList {
    pub records: Vec<LeaderboardRecord>,
    pub owner_records: Vec<LeaderboardRecord>,
    pub next_cursor: Option<String>,
    pub prev_cursor: Option<String>,
    #[serde(with = "super::int64::option", skip_serializing_if = "Option::is_none")]
    pub rank_count: Option<i64>,
}

pub type TournamentRecordList = LeaderboardRecordList;

/// Score submission for a leaderboard or tournament.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordWrite {
    #[serde(with = "super::int64")]
    pub score: i64,
    #[serde(default, with = "super::int64::option", skip_serializing_if = "Option::is_none")]
    pub subscore: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<LeaderboardOperator>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tournament {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: u32,
    pub sort_order: u32,
    pub size: u32,
    pub max_size: u32,
    pub max_num_score: u32,
    pub can_enter: bool,
    pub end_active: u32,
    pub next_reset: u32,
    pub metadata: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: u32,
    pub start_active: u32,
    pub operator: LeaderboardOperator,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentList {
    pub tournaments: Vec<Tournament>,
    pub cursor: Option<String>,
}

/// Filters for listing tournaments. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TournamentFilter {
    pub category_start: Option<u32>,
    pub category_end: Option<u32>,
    pub start_time: Option<u32>,
    pub end_time: Option<u32>,
    pub limit: Option<i32>,
    pub cursor: Option<String>,
}
