//! Authentication, session lifecycle and account linking.

use super::{Client, ErrorCallback};
use crate::error::NakamaError;
use crate::handle::RequestHandle;
use crate::http::{HttpMethod, HttpRequest};
use crate::registry::Callback;
use crate::session::Session;
use crate::types::GameCenterCredentials;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Credentials accepted by the authenticate, link and unlink endpoints.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMethod {
    Device { id: String },
    Email { email: String, password: String },
    Custom { id: String },
    Facebook { token: String, import_friends: bool },
    Google { token: String },
    GameCenter(GameCenterCredentials),
    Steam { token: String, import_friends: bool },
    Apple { token: String },
}

impl AuthMethod {
    fn endpoint(&self) -> &'static str {
        match self {
            AuthMethod::Device { .. } => "device",
            AuthMethod::Email { .. } => "email",
            AuthMethod::Custom { .. } => "custom",
            AuthMethod::Facebook { .. } => "facebook",
            AuthMethod::Google { .. } => "google",
            AuthMethod::GameCenter(_) => "gamecenter",
            AuthMethod::Steam { .. } => "steam",
            AuthMethod::Apple { .. } => "apple",
        }
    }

    /// The account object for the request body.
    fn account(&self) -> Map<String, Value> {
        let value = match self {
            AuthMethod::Device { id } | AuthMethod::Custom { id } => json!({ "id": id }),
            AuthMethod::Email { email, password } => {
                json!({ "email": email, "password": password })
            }
            AuthMethod::Facebook { token, .. }
            | AuthMethod::Google { token }
            | AuthMethod::Steam { token, .. }
            | AuthMethod::Apple { token } => json!({ "token": token }),
            AuthMethod::GameCenter(credentials) => json!({
                "player_id": credentials.player_id,
                "bundle_id": credentials.bundle_id,
                "timestamp_seconds": credentials.timestamp_seconds.to_string(),
                "salt": credentials.salt,
                "signature": credentials.signature,
                "public_key_url": credentials.public_key_url,
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn import_friends(&self) -> Option<bool> {
        match self {
            AuthMethod::Facebook { import_friends, .. }
            | AuthMethod::Steam { import_friends, .. } => Some(*import_friends),
            _ => None,
        }
    }
}

impl Client {
    /// Authenticates with any supported method.
    ///
    /// # Arguments
    ///
    /// * `method` - Credentials to authenticate with
    /// * `username` - Username to assign when the account is created
    /// * `create` - Create the account if it does not exist
    /// * `vars` - Session variables embedded in the token
    ///
    /// # Returns
    ///
    /// The request handle, or [`RequestHandle::NONE`] when no callback was given.
    pub fn authenticate(
        &mut self,
        method: AuthMethod,
        username: Option<&str>,
        create: bool,
        vars: &HashMap<String, String>,
        on_success: Option<Callback<Session>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut body = method.account();
        if !vars.is_empty() {
            body.insert("vars".to_string(), json!(vars));
        }

        let mut query = vec![("create".to_string(), create.to_string())];
        if let Some(username) = username {
            query.push(("username".to_string(), username.to_string()));
        }
        if let Some(sync) = method.import_friends() {
            query.push(("sync".to_string(), sync.to_string()));
        }

        let request = self
            .server_key_request(
                HttpMethod::Post,
                &["v2", "account", "authenticate", method.endpoint()],
            )
            .with_query(query)
            .with_json(&body);
        self.send(request, on_success, on_error)
    }

    pub fn authenticate_device(
        &mut self,
        id: &str,
        username: Option<&str>,
        create: bool,
        vars: &HashMap<String, String>,
        on_success: Option<Callback<Session>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Device { id: id.to_string() };
        self.authenticate(method, username, create, vars, on_success, on_error)
    }

    pub fn authenticate_email(
        &mut self,
        email: &str,
        password: &str,
        username: Option<&str>,
        create: bool,
        vars: &HashMap<String, String>,
        on_success: Option<Callback<Session>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Email {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.authenticate(method, username, create, vars, on_success, on_error)
    }

    pub fn authenticate_custom(
        &mut self,
        id: &str,
        username: Option<&str>,
        create: bool,
        vars: &HashMap<String, String>,
        on_success: Option<Callback<Session>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Custom { id: id.to_string() };
        self.authenticate(method, username, create, vars, on_success, on_error)
    }

    pub fn authenticate_facebook(
        &mut self,
        access_token: &str,
        username: Option<&str>,
        create: bool,
        import_friends: bool,
        vars: &HashMap<String, String>,
        on_success: Option<Callback<Session>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Facebook {
            token: access_token.to_string(),
            import_friends,
        };
        self.authenticate(method, username, create, vars, on_success, on_error)
    }

    pub fn authenticate_google(
        &mut self,
        access_token: &str,
        username: Option<&str>,
        create: bool,
        vars: &HashMap<String, String>,
        on_success: Option<Callback<Session>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Google {
            token: access_token.to_string(),
        };
        self.authenticate(method, username, create, vars, on_success, on_error)
    }

    pub fn authenticate_game_center(
        &mut self,
        credentials: GameCenterCredentials,
        username: Option<&str>,
        create: bool,
        vars: &HashMap<String, String>,
        on_success: Option<Callback<Session>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::GameCenter(credentials);
        self.authenticate(method, username, create, vars, on_success, on_error)
    }

    pub fn authenticate_steam(
        &mut self,
        token: &str,
        username: Option<&str>,
        create: bool,
        import_friends: bool,
        vars: &HashMap<String, String>,
        on_success: Option<Callback<Session>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Steam {
            token: token.to_string(),
            import_friends,
        };
        self.authenticate(method, username, create, vars, on_success, on_error)
    }

    pub fn authenticate_apple(
        &mut self,
        token: &str,
        username: Option<&str>,
        create: bool,
        vars: &HashMap<String, String>,
        on_success: Option<Callback<Session>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Apple { token: token.to_string() };
        self.authenticate(method, username, create, vars, on_success, on_error)
    }

    /// Exchanges the session's refresh token for a new session.
    pub fn authenticate_refresh(
        &mut self,
        session: &Session,
        vars: &HashMap<String, String>,
        on_success: Option<Callback<Session>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let mut body = json!({ "token": session.refresh_token() });
        if !vars.is_empty() {
            body["vars"] = json!(vars);
        }
        let request = self
            .server_key_request(HttpMethod::Post, &["v2", "account", "session", "refresh"])
            .with_json(&body);
        self.send(request, on_success, on_error)
    }

    /// Invalidates both tokens of `session` on the server.
    pub fn session_logout(
        &mut self,
        session: &Session,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let body = json!({
            "token": session.auth_token(),
            "refresh_token": session.refresh_token(),
        });
        let request = self
            .session_request(session, HttpMethod::Post, &["v2", "session", "logout"])
            .and_then(|r| r.with_json(&body));
        self.send(request, on_success, on_error)
    }

    /// Links another identity to the session's account.
    pub fn link(
        &mut self,
        session: &Session,
        method: AuthMethod,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self.link_request(session, "link", &method);
        self.send(request, on_success, on_error)
    }

    /// Removes an identity from the session's account.
    pub fn unlink(
        &mut self,
        session: &Session,
        method: AuthMethod,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let request = self.link_request(session, "unlink", &method);
        self.send(request, on_success, on_error)
    }

    fn link_request(
        &self,
        session: &Session,
        action: &str,
        method: &AuthMethod,
    ) -> Result<HttpRequest, NakamaError> {
        let path = ["v2", "account", action, method.endpoint()];
        let request = self.session_request(session, HttpMethod::Post, &path)?;
        match method {
            // Steam linking wraps the account and carries the import flag in the body.
            AuthMethod::Steam { import_friends, .. } if action == "link" => {
                request.with_json(&json!({
                    "account": method.account(),
                    "sync": import_friends,
                }))
            }
            _ => {
                let query = method
                    .import_friends()
                    .filter(|_| action == "link")
                    .map(|sync| vec![("sync".to_string(), sync.to_string())])
                    .unwrap_or_default();
                request.with_query(query).with_json(&method.account())
            }
        }
    }

    pub fn link_device(
        &mut self,
        session: &Session,
        id: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.link(session, AuthMethod::Device { id: id.to_string() }, on_success, on_error)
    }

    pub fn unlink_device(
        &mut self,
        session: &Session,
        id: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.unlink(session, AuthMethod::Device { id: id.to_string() }, on_success, on_error)
    }

    pub fn link_email(
        &mut self,
        session: &Session,
        email: &str,
        password: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Email { email: email.to_string(), password: password.to_string() };
        self.link(session, method, on_success, on_error)
    }

    pub fn unlink_email(
        &mut self,
        session: &Session,
        email: &str,
        password: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Email { email: email.to_string(), password: password.to_string() };
        self.unlink(session, method, on_success, on_error)
    }

    pub fn link_custom(
        &mut self,
        session: &Session,
        id: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.link(session, AuthMethod::Custom { id: id.to_string() }, on_success, on_error)
    }

    pub fn unlink_custom(
        &mut self,
        session: &Session,
        id: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.unlink(session, AuthMethod::Custom { id: id.to_string() }, on_success, on_error)
    }

    pub fn link_facebook(
        &mut self,
        session: &Session,
        access_token: &str,
        import_friends: bool,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Facebook { token: access_token.to_string(), import_friends };
        self.link(session, method, on_success, on_error)
    }

    pub fn unlink_facebook(
        &mut self,
        session: &Session,
        access_token: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Facebook {
            token: access_token.to_string(),
            import_friends: false,
        };
        self.unlink(session, method, on_success, on_error)
    }

    pub fn link_google(
        &mut self,
        session: &Session,
        access_token: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Google { token: access_token.to_string() };
        self.link(session, method, on_success, on_error)
    }

    pub fn unlink_google(
        &mut self,
        session: &Session,
        access_token: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Google { token: access_token.to_string() };
        self.unlink(session, method, on_success, on_error)
    }

    pub fn link_game_center(
        &mut self,
        session: &Session,
        credentials: GameCenterCredentials,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.link(session, AuthMethod::GameCenter(credentials), on_success, on_error)
    }

    pub fn unlink_game_center(
        &mut self,
        session: &Session,
        credentials: GameCenterCredentials,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.unlink(session, AuthMethod::GameCenter(credentials), on_success, on_error)
    }

    pub fn link_steam(
        &mut self,
        session: &Session,
        token: &str,
        import_friends: bool,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Steam { token: token.to_string(), import_friends };
        self.link(session, method, on_success, on_error)
    }

    pub fn unlink_steam(
        &mut self,
        session: &Session,
        token: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let method = AuthMethod::Steam { token: token.to_string(), import_friends: false };
        self.unlink(session, method, on_success, on_error)
    }

    pub fn link_apple(
        &mut self,
        session: &Session,
        token: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.link(session, AuthMethod::Apple { token: token.to_string() }, on_success, on_error)
    }

    pub fn unlink_apple(
        &mut self,
        session: &Session,
        token: &str,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        self.unlink(session, AuthMethod::Apple { token: token.to_string() }, on_success, on_error)
    }

    /// Adds the Facebook friends of `access_token`'s owner as friends.
    /// `reset` replaces the previously imported set.
    pub fn import_facebook_friends(
        &mut self,
        session: &Session,
        access_token: &str,
        reset: Option<bool>,
        on_success: Option<Callback<()>>,
        on_error: Option<ErrorCallback>,
    ) -> RequestHandle {
        let query = reset
            .map(|reset| vec![("reset".to_string(), reset.to_string())])
            .unwrap_or_default();
        let request = self
            .session_request(session, HttpMethod::Post, &["v2", "friend", "facebook"])
            .map(|r| r.with_query(query))
            .and_then(|r| r.with_json(&json!({ "token": access_token })));
        self.send(request, on_success, on_error)
    }
}
