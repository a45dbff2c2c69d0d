//! Authenticated sessions.
//!
//! A [`Session`] is produced by the authenticate calls (or restored from
//! stored tokens) and is owned by the application. Every authenticated
//! operation borrows it explicitly; the client never keeps one of its own.

use crate::error::ClientError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// Body returned by `/v2/account/authenticate/*` and session refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub created: bool,
}

/// Claims carried in the token payload.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    uid: String,
    #[serde(default)]
    usn: String,
    #[serde(default)]
    vrs: HashMap<String, String>,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct RefreshClaims {
    exp: i64,
}

/// Server-issued credentials plus the identity decoded from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    auth_token: String,
    refresh_token: String,
    created: bool,
    user_id: String,
    username: String,
    vars: HashMap<String, String>,
    create_time: DateTime<Utc>,
    expire_time: DateTime<Utc>,
    refresh_expire_time: Option<DateTime<Utc>>,
}

impl Session {
    /// Builds a session from raw tokens.
    ///
    /// # Arguments
    ///
    /// * `auth_token` - The JWT returned by the server
    /// * `refresh_token` - The refresh JWT, may be empty
    /// * `created` - Whether the account was created by this authentication
    ///
    /// # Returns
    ///
    /// The decoded session, or [`ClientError::InvalidToken`] if the auth token
    /// payload cannot be decoded.
    pub fn new(auth_token: &str, refresh_token: &str, created: bool) -> Result<Self, ClientError> {
        let claims: TokenClaims = decode_claims(auth_token)?;
        let refresh_expire_time = if refresh_token.is_empty() {
            None
        } else {
            let refresh: RefreshClaims = decode_claims(refresh_token)?;
            Some(unix_time(refresh.exp)?)
        };

        Ok(Self {
            auth_token: auth_token.to_string(),
            refresh_token: refresh_token.to_string(),
            created,
            user_id: claims.uid,
            username: claims.usn,
            vars: claims.vrs,
            create_time: Utc::now(),
            expire_time: unix_time(claims.exp)?,
            refresh_expire_time,
        })
    }

    pub fn from_auth_response(response: AuthResponse) -> Result<Self, ClientError> {
        Self::new(&response.token, &response.refresh_token, response.created)
    }

    /// Restores a session from previously stored tokens. The result is never
    /// marked as created.
    pub fn restore(auth_token: &str, refresh_token: &str) -> Result<Self, ClientError> {
        Self::new(auth_token, refresh_token, false)
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    pub fn expire_time(&self) -> DateTime<Utc> {
        self.expire_time
    }

    pub fn refresh_expire_time(&self) -> Option<DateTime<Utc>> {
        self.refresh_expire_time
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expire_time
    }

    /// Without a refresh token the session cannot be refreshed, which counts
    /// as expired.
    pub fn is_refresh_expired(&self) -> bool {
        self.is_refresh_expired_at(Utc::now())
    }

    pub fn is_refresh_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.refresh_expire_time {
            Some(expire) => now >= expire,
            None => true,
        }
    }
}

fn decode_claims<T: for<'de> Deserialize<'de>>(token: &str) -> Result<T, ClientError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| ClientError::InvalidToken("token is not a JWT".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ClientError::InvalidToken(format!("payload is not base64: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::InvalidToken(format!("payload is not valid claims: {e}")))
}

fn unix_time(seconds: i64) -> Result<DateTime<Utc>, ClientError> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| ClientError::InvalidToken(format!("expiry {seconds} out of range")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Builds an unsigned token carrying `claims`.
    pub(crate) fn make_token(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_session_decodes_claims() {
        let token = make_token(json!({
            "uid": "user-1",
            "usn": "alice",
            "vrs": { "k1": "v1", "k2": "v2" },
            "exp": 2_000_000_000i64
        }));
        let refresh = make_token(json!({ "uid": "user-1", "exp": 2_100_000_000i64 }));
        let session = Session::new(&token, &refresh, true).unwrap();

        assert_eq!(session.auth_token(), token);
        assert_eq!(session.user_id(), "user-1");
        assert_eq!(session.username(), "alice");
        assert_eq!(session.variable("k2"), Some("v2"));
        assert!(session.is_created());
        assert_eq!(session.expire_time().timestamp(), 2_000_000_000);
        assert_eq!(session.refresh_expire_time().map(|t| t.timestamp()), Some(2_100_000_000));
    }

    #[test]
    fn test_session_expiry_boundary() {
        let token = make_token(json!({ "uid": "u", "usn": "n", "exp": 1_000 }));
        let session = Session::restore(&token, "").unwrap();
        let expire = session.expire_time();

        assert!(!session.is_created());
        assert!(!session.is_expired_at(expire - chrono::Duration::seconds(1)));
        assert!(session.is_expired_at(expire));
        assert!(session.is_refresh_expired());
    }

    #[test]
    fn test_session_rejects_garbage() {
        assert!(matches!(Session::restore("not-a-jwt", ""), Err(ClientError::InvalidToken(_))));
        assert!(matches!(Session::restore("a.!!!.c", ""), Err(ClientError::InvalidToken(_))));
    }
}
