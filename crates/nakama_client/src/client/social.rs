//! Account, users, friends and groups.

use super::{Client, ErrorCallback};
use crate::handle::RequestHandle;
use crate::http::HttpMethod;
use crate::registry::Callback;
use crate::session::Session;
use crate::types::*;

impl Client {
    pub fn get_account(
        &mut self,
        session: &Session,
        on_success: Option<Callback<Account>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self.session_request(session, HttpMethod::Get, &["v2", "account"]);
        self.send(request, on_success, on_error)
    }

    /// Updates the fields of `update` that are `Some`.
    pub fn update_account(
        &mut self,
        session: &Session,
        update: &AccountUpdate,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self
            .session_request(session, HttpMethod::Put, &["v2", "account"])
            .and_then(|r| r.with_json(update));
        self.send(request, on_success, on_error)
    }

    /// Fetches users by any mix of ids, usernames and Facebook ids.
    pub fn get_users(
        &mut self,
        session: &Session,
        ids: &[String],
        usernames: &[String],
        facebook_ids: &[String],
        on_success: Option<Callback<Users>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_repeated(&mut query, "ids", ids);
        push_repeated(&mut query, "usernames", usernames);
        push_repeated(&mut query, "facebook_ids", facebook_ids);
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "user"])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    pub fn add_friends(
        &mut self,
        session: &Session,
        ids: &[String],
        usernames: &[String],
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.friend_action(session, HttpMethod::Post, &["v2", "friend"], ids, usernames, on_success, on_error)
    }

    pub fn delete_friends(
        &mut self,
        session: &Session,
        ids: &[String],
        usernames: &[String],
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.friend_action(session, HttpMethod::Delete, &["v2", "friend"], ids, usernames, on_success, on_error)
    }

    pub fn block_friends(
        &mut self,
        session: &Session,
        ids: &[String],
        usernames: &[String],
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.friend_action(session, HttpMethod::Post, &["v2", "friend", "block"], ids, usernames, on_success, on_error)
    }

    #[allow(clippy::too_many_arguments)]
    fn friend_action(
        &mut self,
        session: &Session,
        method: HttpMethod,
        segments: &[&str],
        ids: &[String],
        usernames: &[String],
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_repeated(&mut query, "ids", ids);
        push_repeated(&mut query, "usernames", usernames);
        let request = self
            .session_request(session, method, segments)
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    pub fn list_friends(
        &mut self,
        session: &Session,
        limit: Option<i32>,
        state: Option<FriendState>,
        cursor: Option<&str>,
        on_success: Option<Callback<FriendList>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_opt(&mut query, "limit", limit);
        push_opt(&mut query, "state", state.map(i32::from));
        push_opt(&mut query, "cursor", cursor);
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "friend"])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    pub fn create_group(
        &mut self,
        session: &Session,
        group: &GroupCreate,
        on_success: Option<Callback<Group>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self
            .session_request(session, HttpMethod::Post, &["v2", "group"])
            .and_then(|r| r.with_json(group));
        self.send(request, on_success, on_error)
    }

    pub fn delete_group(
        &mut self,
        session: &Session,
        group_id: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self.session_request(session, HttpMethod::Delete, &["v2", "group", group_id]);
        self.send(request, on_success, on_error)
    }

    pub fn update_group(
        &mut self,
        session: &Session,
        group_id: &str,
        update: &GroupUpdate,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self
            .session_request(session, HttpMethod::Put, &["v2", "group", group_id])
            .and_then(|r| r.with_json(update));
        self.send(request, on_success, on_error)
    }

    pub fn add_group_users(
        &mut self,
        session: &Session,
        group_id: &str,
        user_ids: &[String],
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.group_members_action(session, group_id, "add", user_ids, on_success, on_error)
    }

    pub fn kick_group_users(
        &mut self,
        session: &Session,
        group_id: &str,
        user_ids: &[String],
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.group_members_action(session, group_id, "kick", user_ids, on_success, on_error)
    }

    pub fn promote_group_users(
        &mut self,
        session: &Session,
        group_id: &str,
        user_ids: &[String],
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.group_members_action(session, group_id, "promote", user_ids, on_success, on_error)
    }

    pub fn demote_group_users(
        &mut self,
        session: &Session,
        group_id: &str,
        user_ids: &[String],
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.group_members_action(session, group_id, "demote", user_ids, on_success, on_error)
    }

    fn group_members_action(
        &mut self,
        session: &Session,
        group_id: &str,
        action: &str,
        user_ids: &[String],
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_repeated(&mut query, "user_ids", user_ids);
        let request = self
            .session_request(session, HttpMethod::Post, &["v2", "group", group_id, action])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    pub fn join_group(
        &mut self,
        session: &Session,
        group_id: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self.session_request(session, HttpMethod::Post, &["v2", "group", group_id, "join"]);
        self.send(request, on_success, on_error)
    }

    pub fn leave_group(
        &mut self,
        session: &Session,
        group_id: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self.session_request(session, HttpMethod::Post, &["v2", "group", group_id, "leave"]);
        self.send(request, on_success, on_error)
    }

    /// Searches groups by name. `name` accepts a trailing `%` wildcard.
    pub fn list_groups(
        &mut self,
        session: &Session,
        name: Option<&str>,
        limit: Option<i32>,
        cursor: Option<&str>,
        on_success: Option<Callback<GroupList>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_opt(&mut query, "name", name);
        push_opt(&mut query, "limit", limit);
        push_opt(&mut query, "cursor", cursor);
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "group"])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn list_group_users(
        &mut self,
        session: &Session,
        group_id: &str,
        limit: Option<i32>,
        state: Option<GroupRole>,
        cursor: Option<&str>,
        on_success: Option<Callback<GroupUserList>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_opt(&mut query, "limit", limit);
        push_opt(&mut query, "state", state.map(i32::from));
        push_opt(&mut query, "cursor", cursor);
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "group", group_id, "user"])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }

    /// Lists the groups `user_id` belongs to.
    #[allow(clippy::too_many_arguments)]
    pub fn list_user_groups(
        &mut self,
        session: &Session,
        user_id: &str,
        limit: Option<i32>,
        state: Option<GroupRole>,
        cursor: Option<&str>,
        on_success: Option<Callback<UserGroupList>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut query = Vec::new();
        push_opt(&mut query, "limit", limit);
        push_opt(&mut query, "state", state.map(i32::from));
        push_opt(&mut query, "cursor", cursor);
        let request = self
            .session_request(session, HttpMethod::Get, &["v2", "user", user_id, "group"])
            .map(|r| r.with_query(query));
        self.send(request, on_success, on_error)
    }
}
