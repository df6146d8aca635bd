//! Filesystem-style paths over object storage.
//!
//! A `CloudPath` pairs a `BlobAddress` with a shared `BlobBackend` and
//! emulates path semantics on top of it. Paths are immutable values; every
//! remote effect goes through the backend and nothing is cached between
//! calls.

mod azure;

pub use azure::AzureBlobPath;

use async_trait::async_trait;
use std::{fmt, path::Path, sync::Arc};
use tokio::fs;
use tracing::{debug, warn};

use crate::{
    address::BlobAddress,
    backend::BlobBackend,
    errors::BlobResult,
    models::{metadata::ObjectKind, stat::StatResult},
};

/// The contract every provider's path class shares.
///
/// Implementors supply the scheme, the address, the backend and a way to
/// build sibling paths; everything else is provided in terms of those.
#[async_trait]
pub trait CloudPath: fmt::Debug + fmt::Display + Send + Sync {
    /// URI scheme including `://`, e.g. `az://`.
    fn cloud_prefix(&self) -> &'static str;

    fn address(&self) -> &BlobAddress;

    fn backend(&self) -> &Arc<dyn BlobBackend>;

    /// A path of the same provider and backend at another address.
    fn with_address(&self, address: BlobAddress) -> Box<dyn CloudPath>;

    /// Top-level namespace of the path.
    fn drive(&self) -> &str {
        self.address().container()
    }

    fn as_uri(&self) -> String {
        format!("{}{}", self.cloud_prefix(), self.address())
    }

    /// Final path component.
    fn name(&self) -> &str {
        self.address().name()
    }

    /// Final component without its last suffix.
    fn stem(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(pos) if pos > 0 => &name[..pos],
            _ => name,
        }
    }

    /// Last `.ext` of the final component, or `""`.
    fn suffix(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(pos) if pos > 0 => &name[pos..],
            _ => "",
        }
    }

    fn join(&self, segment: &str) -> Box<dyn CloudPath> {
        self.with_address(self.address().join(segment))
    }

    fn parent(&self) -> Box<dyn CloudPath> {
        self.with_address(self.address().parent())
    }

    /// Object storage has no empty directories, so this never fails and
    /// never touches the backend, whatever the flags say.
    fn mkdir(&self, parents: bool, exist_ok: bool) {
        debug!(
            "mkdir {} is a no-op (parents={}, exist_ok={})",
            self, parents, exist_ok
        );
    }

    async fn exists(&self) -> BlobResult<bool> {
        self.backend().exists(self.address()).await
    }

    async fn is_dir(&self) -> BlobResult<bool> {
        Ok(self.backend().is_file_or_dir(self.address()).await? == ObjectKind::Dir)
    }

    async fn is_file(&self) -> BlobResult<bool> {
        Ok(self.backend().is_file_or_dir(self.address()).await? == ObjectKind::File)
    }

    /// Refresh the blob's modification time, creating an empty blob if
    /// nothing is there yet.
    async fn touch(&self) -> BlobResult<()> {
        let backend = self.backend();
        if backend.exists(self.address()).await? {
            backend.move_file(self.address(), self.address()).await
        } else {
            upload_staged(&**backend, self.address(), &[]).await
        }
    }

    /// Filesystem-shaped metadata; re-queries the backend on every call.
    async fn stat(&self) -> BlobResult<StatResult> {
        let meta = self.backend().get_metadata(self.address()).await?;
        Ok(StatResult::from_metadata(self.cloud_prefix(), &meta))
    }

    async fn etag(&self) -> BlobResult<Option<String>> {
        Ok(self.backend().get_metadata(self.address()).await?.etag)
    }

    /// Content hash reported under the blob's content settings.
    async fn checksum(&self) -> BlobResult<Option<String>> {
        let meta = self.backend().get_metadata(self.address()).await?;
        Ok(meta.content_md5().map(str::to_owned))
    }

    /// Direct children, files and inferred directories alike.
    async fn iterdir(&self) -> BlobResult<Vec<Box<dyn CloudPath>>> {
        let entries = self.backend().list(self.address()).await?;
        Ok(entries
            .into_iter()
            .map(|entry| self.with_address(entry.address))
            .collect())
    }

    async fn unlink(&self, missing_ok: bool) -> BlobResult<()> {
        match self.backend().delete(self.address()).await {
            Err(err) if missing_ok && err.is_not_found() => Ok(()),
            other => other,
        }
    }

    /// Move this blob to `target`, returning the new location.
    async fn rename(&self, target: &dyn CloudPath) -> BlobResult<Box<dyn CloudPath>> {
        self.backend()
            .move_file(self.address(), target.address())
            .await?;
        Ok(target.with_address(target.address().clone()))
    }

    async fn upload_from(&self, local: &Path) -> BlobResult<()> {
        self.backend().upload_file(local, self.address()).await
    }

    async fn download_to(&self, local: &Path) -> BlobResult<()> {
        self.backend().download_file(self.address(), local).await
    }

    async fn read_bytes(&self) -> BlobResult<Vec<u8>> {
        let staging = tempfile::tempdir()?;
        let local = staging.path().join("download");
        let read = match self.backend().download_file(self.address(), &local).await {
            Ok(()) => fs::read(&local).await.map_err(Into::into),
            Err(err) => Err(err),
        };
        release_staging(staging, self.address());
        read
    }

    async fn write_bytes(&self, data: &[u8]) -> BlobResult<()> {
        upload_staged(&**self.backend(), self.address(), data).await
    }
}

/// Write `data` to a scratch file and upload it to `addr`.
///
/// The scratch directory is removed on every exit path. A cleanup failure
/// is logged and never replaces the upload's own result.
async fn upload_staged(
    backend: &dyn BlobBackend,
    addr: &BlobAddress,
    data: &[u8],
) -> BlobResult<()> {
    let staging = tempfile::tempdir()?;
    let local = staging.path().join("staged");
    let uploaded = match fs::write(&local, data).await {
        Ok(()) => backend.upload_file(&local, addr).await,
        Err(err) => Err(err.into()),
    };
    release_staging(staging, addr);
    uploaded
}

fn release_staging(staging: tempfile::TempDir, addr: &BlobAddress) {
    let dir = staging.path().to_path_buf();
    if let Err(err) = staging.close() {
        warn!(
            "failed to remove staging directory {} for {}: {}",
            dir.display(),
            addr,
            err
        );
    }
}
