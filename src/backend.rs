//! The capability set a path class needs from its storage service.

use async_trait::async_trait;
use std::path::Path;

use crate::{
    address::BlobAddress,
    errors::BlobResult,
    models::metadata::{BlobMetadata, ListEntry, ObjectKind},
};

/// Network-facing half of a cloud path.
///
/// Each storage provider supplies one implementation. Path values hold it
/// behind an `Arc` and never outlive-manage it; errors returned here reach
/// the caller unmodified.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// True if a blob, or a directory-like key prefix, exists at `addr`.
    async fn exists(&self, addr: &BlobAddress) -> BlobResult<bool>;

    /// Combined probe answering "file", "dir" or "absent" in one round trip.
    async fn is_file_or_dir(&self, addr: &BlobAddress) -> BlobResult<ObjectKind>;

    async fn get_metadata(&self, addr: &BlobAddress) -> BlobResult<BlobMetadata>;

    /// Upload a local file to `addr`, replacing whatever is there.
    async fn upload_file(&self, local: &Path, addr: &BlobAddress) -> BlobResult<()>;

    /// Move `src` to `dst`. With `src == dst` this refreshes the blob's
    /// modification time, if the service supports that.
    async fn move_file(&self, src: &BlobAddress, dst: &BlobAddress) -> BlobResult<()>;

    async fn download_file(&self, addr: &BlobAddress, local: &Path) -> BlobResult<()>;

    /// Direct children of `addr`, with sub-directories inferred from `/`.
    async fn list(&self, addr: &BlobAddress) -> BlobResult<Vec<ListEntry>>;

    async fn delete(&self, addr: &BlobAddress) -> BlobResult<()>;
}
