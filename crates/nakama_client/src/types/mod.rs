//! # Wire Types
//!
//! Serde representations of every entity exchanged with the server. Field
//! names follow the server's JSON. Optional data is modelled with `Option`
//! so an absent field is never confused with an empty one; outgoing requests
//! skip `None` fields entirely.
//!
//! ## Key Types
//!
//! - [`Account`], [`User`] - identity and profile data
//! - [`FriendList`], [`Group`], [`GroupUserList`] - the social graph
//! - [`LeaderboardRecordList`], [`TournamentList`] - competitive data
//! - [`StorageObjectWrite`], [`StorageObjects`] - cloud storage
//! - [`realtime`] - payloads carried over the socket

pub mod account;
pub mod leaderboard;
pub mod messaging;
pub mod realtime;
pub mod social;
pub mod storage;

pub use account::*;
pub use leaderboard::*;
pub use messaging::*;
pub use social::*;
pub use storage::*;

/// Declares a C-like enum carried as an integer on the wire. The first
/// variant is the default used when the server omits the field.
macro_rules! int_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $first:ident = $first_value:expr
            $(, $variant:ident = $value:expr)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "i32", into = "i32")]
        pub enum $name {
            $first = $first_value,
            $($variant = $value),*
        }

        impl TryFrom<i32> for $name {
            type Error = String;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                match value {
                    v if v == $first_value => Ok(Self::$first),
                    $(v if v == $value => Ok(Self::$variant),)*
                    other => Err(format!("invalid {} value {}", stringify!($name), other)),
                }
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> i32 {
                value as i32
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$first
            }
        }
    };
}
pub(crate) use int_enum;

/// Int64 values the gateway encodes as JSON strings. Accepts either a string
/// or a number and always writes a string.
pub mod int64 {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.serialize_str(&v.to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
            match Option::<super::Raw>::deserialize(deserializer)? {
                Some(super::Raw::Number(n)) => Ok(Some(n)),
                Some(super::Raw::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }
}

/// Binary payloads carried as base64 strings.
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}

/// Appends one `key=value` pair per item, which is how list parameters are
/// sent in query strings.
pub(crate) fn push_repeated(query: &mut Vec<(String, String)>, key: &str, values: &[String]) {
    query.extend(values.iter().map(|v| (key.to_string(), v.clone())));
}

pub(crate) fn push_opt<T: ToString>(query: &mut Vec<(String, String)>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        query.push((key.to_string(), value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Scored {
        #[serde(with = "int64")]
        score: i64,
        #[serde(default, with = "int64::option", skip_serializing_if = "Option::is_none")]
        rank: Option<i64>,
        #[serde(default, with = "base64_bytes")]
        data: Vec<u8>,
    }

    #[test]
    fn test_int64_accepts_string_and_number() {
        let a: Scored = serde_json::from_str(r#"{"score":"42","rank":7}"#).unwrap();
        let b: Scored = serde_json::from_str(r#"{"score":42}"#).unwrap();
        assert_eq!(a.score, 42);
        assert_eq!(a.rank, Some(7));
        assert_eq!(b.rank, None);
        assert!(b.data.is_empty());
    }

    #[test]
    fn test_int64_writes_string_and_skips_absent() {
        let value = Scored { score: -5, rank: None, data: b"hi".to_vec() };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["score"], "-5");
        assert!(json.get("rank").is_none());
        assert_eq!(json["data"], "aGk=");
    }

    #[test]
    fn test_push_repeated() {
        let mut query = Vec::new();
        push_repeated(&mut query, "ids", &["a".to_string(), "b".to_string()]);
        push_opt(&mut query, "limit", Some(10));
        push_opt::<i32>(&mut query, "cursor", None);
        assert_eq!(
            query,
            vec![
                ("ids".to_string(), "a".to_string()),
                ("ids".to_string(), "b".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }
}
