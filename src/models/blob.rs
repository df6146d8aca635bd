//! Represents a blob row as persisted by the local store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::metadata::{BlobMetadata, ContentSettings};

/// A single blob within a container.
///
/// Stores metadata only; the payload lives on disk.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Blob {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Foreign key linking to the parent container.
    pub container_id: Uuid,

    /// Blob key (slash-delimited, no leading slash).
    pub key: String,

    /// Content type (MIME type), if one was recorded.
    pub content_type: Option<String>,

    /// Size in bytes.
    pub size_bytes: i64,

    /// Hex MD5 of the payload.
    pub etag: Option<String>,

    /// Base64 MD5 of the payload, as Azure reports `Content-MD5`.
    pub content_md5: Option<String>,

    /// Timestamp when the blob was last written or refreshed.
    pub last_modified: DateTime<Utc>,

    /// Soft-delete marker.
    pub is_deleted: bool,
}

impl Blob {
    pub fn metadata(&self) -> BlobMetadata {
        BlobMetadata {
            size: u64::try_from(self.size_bytes).ok(),
            last_modified: Some(self.last_modified),
            etag: self.etag.clone(),
            content_settings: Some(ContentSettings {
                content_type: self.content_type.clone(),
                content_md5: self.content_md5.clone(),
            }),
        }
    }
}
