//! Storage engine objects.

use super::int_enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

int_enum! {
    pub enum StoragePermissionRead {
        NoRead = 0,
        OwnerRead = 1,
        PublicRead = 2,
    }
}

int_enum! {
    pub enum StoragePermissionWrite {
        NoWrite = 0,
        OwnerWrite = 1,
    }
}

/// A stored object as returned by reads and listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageObject {
    pub collection: String,
    pub key: String,
    pub user_id: String,
    /// JSON object encoded as a string.
    pub value: String,
    pub version: String,
    pub permission_read: StoragePermissionRead,
    pub permission_write: StoragePermissionWrite,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageObjectList {
    pub objects: Vec<StorageObject>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageObjects {
    pub objects: Vec<StorageObject>,
}

/// An object to write.
///
/// `version` enables conditional writes: `Some("*")` only creates, a concrete
/// version only overwrites a matching object, and `None` writes unconditionally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageObjectWrite {
    pub collection: String,
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_read: Option<StoragePermissionRead>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_write: Option<StoragePermissionWrite>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageObjectAck {
    pub collection: String,
    pub key: String,
    pub version: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageObjectAcks {
    pub acks: Vec<StorageObjectAck>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadStorageObjectId {
    pub collection: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteStorageObjectId {
    pub collection: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct WriteStorageObjectsBody<'a> {
    pub objects: &'a [StorageObjectWrite],
}

#[derive(Serialize)]
pub(crate) struct ReadStorageObjectsBody<'a> {
    pub object_ids: &'a [ReadStorageObjectId],
}

#[derive(Serialize)]
pub(crate) struct DeleteStorageObjectsBody<'a> {
    pub object_ids: &'a [DeleteStorageObjectId],
}
