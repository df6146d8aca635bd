//! Backend-reported metadata, with every field the store may omit optional.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::BlobAddress;

/// Metadata as reported by a `BlobBackend`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BlobMetadata {
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    pub content_settings: Option<ContentSettings>,
}

/// Content properties nested under a blob's metadata.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ContentSettings {
    pub content_type: Option<String>,
    pub content_md5: Option<String>,
}

impl BlobMetadata {
    /// `content_settings.content_md5`, tolerating a missing parent.
    pub fn content_md5(&self) -> Option<&str> {
        self.content_settings
            .as_ref()
            .and_then(|settings| settings.content_md5.as_deref())
    }
}

/// Result of the combined file-or-directory probe.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    File,
    Dir,
    Absent,
}

/// One direct child returned by a listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    pub address: BlobAddress,
    pub kind: ObjectKind,
}
