//! Leaderboards and tournaments.

use super::{Client, ErrorCallback};
use crate::handle::RequestHandle;
use crate::http::HttpMethod;
use crate::registry::Callback;
use crate::session::Session;
use crate::types::*;

impl Client {
    /// Lists records of a leaderboard, optionally with the records of
    /// `owner_ids` alongside.
    #[allow(clippy::too_many_arguments)]
    pub fn list_leaderboard_records(
        &mut self,
        session: &Session,
        leaderboard_id: &str,
        owner_ids: &[String],
        limit: Option<i32>,
        cursor: Option<&str>,
        on_success: Option<Callback<LeaderboardRecordList>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_repeated(&mut query, "owner_ids", owner_ids);
        push_opt(&mut query, "limit", limit);
        push_opt(&mut query, "cursor", cursor);
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "leaderboard", leaderboard_id])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    /// Lists the records ranked around `owner_id`.
    pub fn list_leaderboard_records_around_owner(
        &mut self,
        session: &Session,
        leaderboard_id: &str,
        owner_id: &str,
        limit: Option<i32>,
        on_success: Option<Callback<LeaderboardRecordList>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_opt(&mut query, "limit", limit);
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "leaderboard", leaderboard_id, "owner", owner_id])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    pub fn write_leaderboard_record(
        &mut self,
        session: &Session,
        leaderboard_id: &str,
        record: &RecordWrite,
        on_success: Option<Callback<LeaderboardRecord>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self
            .session_request(session, HttpMethod::Post, &["v2", "leaderboard", leaderboard_id])
            .and_then(|r| r.with_json(record));
        self.send(request, on_success, on_error)
    }

    /// Deletes the caller's own record.
    pub fn delete_leaderboard_record(
        &mut self,
        session: &Session,
        leaderboard_id: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self.session_request(session, HttpMethod::Delete, &["v2", "leaderboard", leaderboard_id]);
        self.send(request, on_success, on_error)
    }

    pub fn write_tournament_record(
        &mut self,
        session: &Session,
        tournament_id: &str,
        record: &RecordWrite,
        on_success: Option<Callback<LeaderboardRecord>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self
            .session_request(session, HttpMethod::Put, &["v2", "tournament", tournament_id])
            .and_then(|r| r.with_json(record));
        self.send(request, on_success, on_error)
    }

    pub fn list_tournaments(
        &mut self,
        session: &Session,
        filter: &TournamentFilter,
        on_success: Option<Callback<TournamentList>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_opt(&mut query, "category_start", filter.category_start);
        push_opt(&mut query, "category_end", filter.category_end);
        push_opt(&mut query, "start_time", filter.start_time);
        push_opt(&mut query, "end_time", filter.end_time);
        push_opt(&mut query, "limit", filter.limit);
        push_opt(&mut query, "cursor", filter.cursor.as_deref());
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "tournament"])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn list_tournament_records(
        &mut self,
        session: &Session,
        tournament_id: &str,
        owner_ids: &[String],
        limit: Option<i32>,
        cursor: Option<&str>,
        on_success: Option<Callback<TournamentRecordList>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_repeated(&mut query, "owner_ids", owner_ids);
        push_opt(&mut query, "limit", limit);
        push_opt(&mut query, "cursor", cursor);
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "tournament", tournament_id])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    pub fn list_tournament_records_around_owner(
        &mut self,
        session: &Session,
        tournament_id: &str,
        owner_id: &str,
        limit: Option<i32>,
        on_success: Option<Callback<TournamentRecordList>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_opt(&mut query, "limit", limit);
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "tournament", tournament_id, "owner", owner_id])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    pub fn join_tournament(
        &mut self,
        session: &Session,
        tournament_id: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self.session_request(session, HttpMethod::Post, &["v2", "tournament", tournament_id, "join"]);
        self.send(request, on_success, on_error)
    }
}
