//! Represents a container, the top-level namespace for blobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A blob container in the local store.
///
/// Containers are the first segment of every `az://` address. They must
/// exist before blobs can be written beneath them.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Container {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Container name (3-63 lowercase letters, digits and hyphens).
    pub name: String,

    /// When this container was created.
    pub created_at: DateTime<Utc>,
}
