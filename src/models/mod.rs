use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of a drive entry. `Folder` orders after `File` so a descending sort
/// puts folders first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

/// One listed object, projected onto the virtual directory tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub created_at: Option<DateTime<Utc>>,
    pub prefix: String,
    pub size: i64,
    pub content_type: String,
    pub owner: String,
    pub original_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Store-generated reference id of the record
    pub ref_id: String,
    /// External identity (chat user id)
    pub id: String,
    pub username: String,
    pub avatar: String,
    pub exp: i64,
    pub verified: bool,
    pub discriminator: String,
    pub coins: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct NewProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub discriminator: String,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
}
