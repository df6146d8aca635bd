//! src/services/local_store.rs
//!
//! LocalBlobStore: an emulated blob service backed by SQLite for metadata
//! and local disk for payloads. Payloads are sharded beneath
//! `base_path/{container}/{shard}/{shard}/{md5(key)}` so that blob keys
//! never turn into real directories.

use crate::{
    address::BlobAddress,
    backend::BlobBackend,
    errors::{BlobError, BlobResult},
    models::{
        blob::Blob,
        container::Container,
        metadata::{BlobMetadata, ListEntry, ObjectKind},
    },
};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt, pin_mut};
use md5::Context;
use sqlx::SqlitePool;
use std::{
    collections::BTreeMap,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use uuid::Uuid;

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

const MAX_BLOB_KEY_LEN: usize = 1024;
const CONTAINER_NAME_MIN_LEN: usize = 3;
const CONTAINER_NAME_MAX_LEN: usize = 63;
const DELIMITER: &str = "/";
const SHARD_DEPTH: usize = 2;

const BLOB_COLUMNS: &str = "id, container_id, key, content_type, size_bytes, etag, \
                            content_md5, last_modified, is_deleted";

/// LocalBlobStore provides the `BlobBackend` capabilities on one machine:
/// - Upload a blob (streams bytes to disk and upserts metadata in SQLite)
/// - Look up / stat blobs (reads metadata from SQLite)
/// - List direct children, inferring directories from `/` in keys
/// - Move and delete blobs (soft-delete in SQLite, payload removed from disk)
#[derive(Clone)]
pub struct LocalBlobStore {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,

    /// Base directory on disk where blob payloads are stored.
    pub base_path: PathBuf,
}

impl LocalBlobStore {
    /// Create a store over an existing pool, keeping payloads under `base_path`.
    pub fn new(db: Arc<SqlitePool>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            db,
            base_path: base_path.into(),
        }
    }

    /// Apply the embedded schema. Safe to run repeatedly.
    pub async fn migrate(&self) -> BlobResult<()> {
        let statements = SCHEMA
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        debug!("running {} schema statements", statements.len());
        for stmt in statements {
            sqlx::query(stmt).execute(&*self.db).await?;
        }
        Ok(())
    }

    /// Reject keys the store cannot hold as a single blob.
    fn ensure_key_safe(&self, key: &str) -> BlobResult<()> {
        if key.is_empty() || key.len() > MAX_BLOB_KEY_LEN {
            return Err(BlobError::InvalidBlobName(key.to_string()));
        }
        if key.starts_with('/') || key.ends_with('/') {
            return Err(BlobError::InvalidBlobName(key.to_string()));
        }
        if key.bytes().any(|b| b.is_ascii_control() || b == b'\\') {
            return Err(BlobError::InvalidBlobName(key.to_string()));
        }
        Ok(())
    }

    /// Validate container name format.
    ///
    /// Follows Azure's rules:
    /// - 3–63 characters
    /// - lowercase letters, digits and hyphens only
    /// - must start and end with a letter or digit
    /// - no consecutive hyphens
    fn ensure_container_name_safe(&self, name: &str) -> BlobResult<()> {
        let invalid = |reason: &str| BlobError::InvalidContainerName {
            name: name.to_string(),
            reason: reason.into(),
        };

        let len = name.len();
        if !(CONTAINER_NAME_MIN_LEN..=CONTAINER_NAME_MAX_LEN).contains(&len) {
            return Err(invalid("must be between 3 and 63 characters"));
        }
        if !name
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-'))
        {
            return Err(invalid(
                "allowed characters are lowercase letters, digits, and hyphens",
            ));
        }
        if name.starts_with('-') || name.ends_with('-') {
            return Err(invalid("must start and end with a lowercase letter or digit"));
        }
        if name.contains("--") {
            return Err(invalid("cannot contain consecutive hyphens"));
        }
        Ok(())
    }

    fn container_root(&self, container: &str) -> PathBuf {
        self.base_path.join(container)
    }

    /// Two-level shard directories plus the payload file name for a key.
    fn blob_path(&self, container: &str, key: &str) -> PathBuf {
        let digest = format!("{:x}", md5::compute(format!("{}/{}", container, key)));
        let mut path = self.container_root(container);
        path.push(&digest[0..2]);
        path.push(&digest[2..4]);
        path.push(&digest);
        path
    }

    async fn fetch_container(&self, name: &str) -> BlobResult<Container> {
        sqlx::query_as::<_, Container>(
            "SELECT id, name, created_at FROM containers WHERE name = ?",
        )
        .bind(name)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => BlobError::ContainerNotFound(name.to_string()),
            other => BlobError::Sqlx(other),
        })
    }

    async fn find_container(&self, name: &str) -> BlobResult<Option<Container>> {
        match self.fetch_container(name).await {
            Ok(container) => Ok(Some(container)),
            Err(BlobError::ContainerNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn find_blob(&self, container: &Container, key: &str) -> BlobResult<Option<Blob>> {
        let query = format!(
            "SELECT {} FROM blobs WHERE key = ? AND container_id = ? AND is_deleted = 0",
            BLOB_COLUMNS
        );
        let blob = sqlx::query_as::<_, Blob>(&query)
            .bind(key)
            .bind(container.id)
            .fetch_optional(&*self.db)
            .await?;
        Ok(blob)
    }

    /// Fetch a live blob, or `BlobNotFound`.
    async fn fetch_blob(&self, addr: &BlobAddress) -> BlobResult<(Container, Blob)> {
        let container = self.fetch_container(addr.container()).await?;
        match self.find_blob(&container, addr.blob()).await? {
            Some(blob) => Ok((container, blob)),
            None => Err(BlobError::BlobNotFound {
                container: addr.container().to_string(),
                blob: addr.blob().to_string(),
            }),
        }
    }

    /// True if any live blob key starts with `prefix`.
    async fn has_children(&self, container: &Container, prefix: &str) -> BlobResult<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(
                 SELECT 1 FROM blobs
                 WHERE container_id = ? AND is_deleted = 0
                   AND substr(key, 1, length(?)) = ?
             )",
        )
        .bind(container.id)
        .bind(prefix)
        .bind(prefix)
        .fetch_one(&*self.db)
        .await?;
        Ok(found != 0)
    }

    /// Write a blob from a byte stream and record its metadata.
    ///
    /// The payload is spooled beside its shard slot and renamed into place
    /// only once the whole stream has landed, so a reader never sees a
    /// partial blob. Uploading to an existing key overwrites it.
    pub async fn upload_blob_stream<S>(
        &self,
        addr: &BlobAddress,
        content_type: Option<String>,
        stream: S,
    ) -> BlobResult<Blob>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        self.ensure_key_safe(addr.blob())?;
        let container = self.fetch_container(addr.container()).await?;

        let payload = self.blob_path(&container.name, addr.blob());
        let spool = spool_path(&payload)?;
        if let Some(shard) = spool.parent() {
            fs::create_dir_all(shard).await?;
        }

        let written = match spool_stream(&spool, stream).await {
            Ok(written) => fs::rename(&spool, &payload).await.map(|()| written),
            Err(err) => Err(err),
        };
        let (size, digest) = match written {
            Ok(written) => written,
            Err(err) => {
                discard(&spool).await;
                return Err(err.into());
            }
        };

        let etag = format!("{:x}", digest);
        let content_md5 = general_purpose::STANDARD.encode(digest.0);

        let query = format!(
            r#"
            INSERT INTO blobs (
                id, container_id, key, content_type, size_bytes,
                etag, content_md5, last_modified, is_deleted
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0)
            ON CONFLICT(container_id, key) DO UPDATE SET
                content_type = excluded.content_type,
                size_bytes = excluded.size_bytes,
                etag = excluded.etag,
                content_md5 = excluded.content_md5,
                last_modified = excluded.last_modified,
                is_deleted = 0
            RETURNING {}
            "#,
            BLOB_COLUMNS
        );
        let recorded = sqlx::query_as::<_, Blob>(&query)
            .bind(Uuid::new_v4())
            .bind(container.id)
            .bind(addr.blob())
            .bind(content_type)
            .bind(size)
            .bind(&etag)
            .bind(&content_md5)
            .bind(Utc::now())
            .fetch_one(&*self.db)
            .await;

        match recorded {
            Ok(blob) => {
                debug!("stored {} ({} bytes, etag {})", addr, size, etag);
                Ok(blob)
            }
            Err(err) => {
                discard(&payload).await;
                Err(BlobError::Sqlx(err))
            }
        }
    }

    /// Create a container and initialize its directory.
    pub async fn create_container(&self, name: &str) -> BlobResult<Container> {
        self.ensure_container_name_safe(name)?;
        fs::create_dir_all(self.container_root(name)).await?;

        let container = Container {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        match sqlx::query("INSERT INTO containers (id, name, created_at) VALUES (?, ?, ?)")
            .bind(container.id)
            .bind(&container.name)
            .bind(container.created_at)
            .execute(&*self.db)
            .await
        {
            Ok(_) => {
                debug!("created container {}", name);
                Ok(container)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(BlobError::ContainerAlreadyExists(name.to_string()))
            }
            Err(err) => Err(BlobError::Sqlx(err)),
        }
    }

    /// Delete a container, its blob rows and its payload directory.
    pub async fn delete_container(&self, name: &str) -> BlobResult<()> {
        let container = self.fetch_container(name).await?;

        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM blobs WHERE container_id = ?")
            .bind(container.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM containers WHERE id = ?")
            .bind(container.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        let root = self.container_root(name);
        if let Err(err) = fs::remove_dir_all(&root).await {
            if err.kind() != ErrorKind::NotFound {
                debug!(
                    "failed to remove container directory {} after delete: {}",
                    root.display(),
                    err
                );
            }
        }
        Ok(())
    }

    /// Remove a payload file and any shard directories it leaves empty.
    ///
    /// Runs after the metadata row is already gone, so a failure here only
    /// strands bytes on disk. It is logged rather than reported.
    async fn remove_payload(&self, container: &str, key: &str) {
        let payload = self.blob_path(container, key);
        match fs::remove_file(&payload).await {
            Ok(()) => debug!("removed payload {}", payload.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("payload {} already missing", payload.display());
            }
            Err(err) => {
                warn!(
                    "left orphaned payload {} for {}/{}: {}",
                    payload.display(),
                    container,
                    key,
                    err
                );
                return;
            }
        }
        self.release_shards(&payload).await;
    }

    /// Drop the two shard directories above `payload` once they are empty.
    async fn release_shards(&self, payload: &Path) {
        for shard in payload.ancestors().skip(1).take(SHARD_DEPTH) {
            if let Err(err) = fs::remove_dir(shard).await {
                if !matches!(err.kind(), ErrorKind::DirectoryNotEmpty | ErrorKind::NotFound) {
                    debug!("kept shard directory {}: {}", shard.display(), err);
                }
                break;
            }
        }
    }

    /// Point `src`'s payload and metadata at `dst` in one transaction.
    ///
    /// The source payload is parked under a spool name beside the
    /// destination while the metadata commits, so an existing destination
    /// payload stays intact until the move is known to succeed.
    async fn relocate(
        &self,
        src: &BlobAddress,
        src_blob: &Blob,
        dst: &BlobAddress,
    ) -> BlobResult<()> {
        self.ensure_key_safe(dst.blob())?;
        let dst_container = self.fetch_container(dst.container()).await?;

        let from = self.blob_path(src.container(), src.blob());
        let to = self.blob_path(&dst_container.name, dst.blob());
        let parked = spool_path(&to)?;
        if let Some(shard) = parked.parent() {
            fs::create_dir_all(shard).await?;
        }
        fs::rename(&from, &parked).await?;

        let committed = async {
            let mut tx = self.db.begin().await?;
            sqlx::query(
                r#"
                INSERT INTO blobs (
                    id, container_id, key, content_type, size_bytes,
                    etag, content_md5, last_modified, is_deleted
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0)
                ON CONFLICT(container_id, key) DO UPDATE SET
                    content_type = excluded.content_type,
                    size_bytes = excluded.size_bytes,
                    etag = excluded.etag,
                    content_md5 = excluded.content_md5,
                    last_modified = excluded.last_modified,
                    is_deleted = 0
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(dst_container.id)
            .bind(dst.blob())
            .bind(&src_blob.content_type)
            .bind(src_blob.size_bytes)
            .bind(&src_blob.etag)
            .bind(&src_blob.content_md5)
            .bind(Utc::now().max(src_blob.last_modified))
            .execute(&mut *tx)
            .await?;
            sqlx::query("UPDATE blobs SET is_deleted = 1 WHERE id = ?")
                .bind(src_blob.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok::<(), BlobError>(())
        }
        .await;

        if let Err(err) = committed {
            if let Err(restore) = fs::rename(&parked, &from).await {
                warn!(
                    "could not restore payload of {} from {}: {}",
                    src,
                    parked.display(),
                    restore
                );
            }
            return Err(err);
        }

        if let Err(err) = fs::rename(&parked, &to).await {
            warn!(
                "moved {} to {} but its payload is still parked at {}: {}",
                src,
                dst,
                parked.display(),
                err
            );
            return Err(BlobError::Io(err));
        }
        self.release_shards(&from).await;
        Ok(())
    }
}

#[async_trait]
impl BlobBackend for LocalBlobStore {
    async fn exists(&self, addr: &BlobAddress) -> BlobResult<bool> {
        Ok(self.is_file_or_dir(addr).await? != ObjectKind::Absent)
    }

    async fn is_file_or_dir(&self, addr: &BlobAddress) -> BlobResult<ObjectKind> {
        let Some(container) = self.find_container(addr.container()).await? else {
            return Ok(ObjectKind::Absent);
        };
        if addr.is_container_root() {
            return Ok(ObjectKind::Dir);
        }
        if self.find_blob(&container, addr.blob()).await?.is_some() {
            return Ok(ObjectKind::File);
        }
        if self.has_children(&container, &addr.child_prefix()).await? {
            return Ok(ObjectKind::Dir);
        }
        Ok(ObjectKind::Absent)
    }

    async fn get_metadata(&self, addr: &BlobAddress) -> BlobResult<BlobMetadata> {
        let (_, blob) = self.fetch_blob(addr).await?;
        Ok(blob.metadata())
    }

    async fn upload_file(&self, local: &Path, addr: &BlobAddress) -> BlobResult<()> {
        let file = File::open(local).await?;
        self.upload_blob_stream(addr, None, ReaderStream::new(file))
            .await?;
        Ok(())
    }

    async fn move_file(&self, src: &BlobAddress, dst: &BlobAddress) -> BlobResult<()> {
        let (_, blob) = self.fetch_blob(src).await?;

        if src == dst {
            let refreshed = Utc::now().max(blob.last_modified);
            sqlx::query("UPDATE blobs SET last_modified = ? WHERE id = ?")
                .bind(refreshed)
                .bind(blob.id)
                .execute(&*self.db)
                .await?;
            debug!("refreshed last_modified of {}", src);
            return Ok(());
        }

        self.relocate(src, &blob, dst).await?;
        debug!("moved {} to {}", src, dst);
        Ok(())
    }

    async fn download_file(&self, addr: &BlobAddress, local: &Path) -> BlobResult<()> {
        let (container, _) = self.fetch_blob(addr).await?;
        let payload = self.blob_path(&container.name, addr.blob());
        if let Some(parent) = local.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::copy(&payload, local).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                BlobError::BlobNotFound {
                    container: addr.container().to_string(),
                    blob: addr.blob().to_string(),
                }
            } else {
                BlobError::Io(err)
            }
        })?;
        debug!("downloaded {} to {}", addr, local.display());
        Ok(())
    }

    async fn list(&self, addr: &BlobAddress) -> BlobResult<Vec<ListEntry>> {
        let container = self.fetch_container(addr.container()).await?;
        let prefix = addr.child_prefix();

        let query = format!(
            "SELECT {} FROM blobs
             WHERE container_id = ? AND is_deleted = 0
               AND substr(key, 1, length(?)) = ?
             ORDER BY key ASC",
            BLOB_COLUMNS
        );
        let rows: Vec<Blob> = sqlx::query_as::<_, Blob>(&query)
            .bind(container.id)
            .bind(&prefix)
            .bind(&prefix)
            .fetch_all(&*self.db)
            .await?;

        let mut children = BTreeMap::new();
        for blob in rows {
            match compute_common_prefix(&blob.key, &prefix, DELIMITER) {
                Some(dir) => {
                    children.insert(rollup_key(dir), ObjectKind::Dir);
                }
                None => {
                    children.entry(blob.key).or_insert(ObjectKind::File);
                }
            }
        }

        Ok(children
            .into_iter()
            .map(|(key, kind)| ListEntry {
                address: BlobAddress::new(container.name.clone(), key),
                kind,
            })
            .collect())
    }

    async fn delete(&self, addr: &BlobAddress) -> BlobResult<()> {
        let (container, blob) = self.fetch_blob(addr).await?;

        sqlx::query("UPDATE blobs SET is_deleted = 1 WHERE id = ?")
            .bind(blob.id)
            .execute(&*self.db)
            .await?;
        debug!("deleted {}", addr);

        self.remove_payload(&container.name, addr.blob()).await;
        Ok(())
    }
}

/// Scratch name in the same shard directory as `payload`, so the final
/// rename never crosses a filesystem.
fn spool_path(payload: &Path) -> io::Result<PathBuf> {
    let shard = payload
        .parent()
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "payload path has no shard"))?;
    Ok(shard.join(format!(".spool-{}", Uuid::new_v4())))
}

/// Drain `stream` into a fresh file at `spool`, returning its length and MD5.
async fn spool_stream<S>(spool: &Path, stream: S) -> io::Result<(i64, md5::Digest)>
where
    S: Stream<Item = io::Result<Bytes>> + Send,
{
    let mut file = File::create(spool).await?;
    let mut hasher = Context::new();
    let mut size: i64 = 0;
    pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        hasher.consume(&chunk);
        size += chunk.len() as i64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok((size, hasher.compute()))
}

/// Best-effort removal of a file nobody will reference.
async fn discard(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        if err.kind() != ErrorKind::NotFound {
            warn!("failed to discard {}: {}", path.display(), err);
        }
    }
}

/// Display key for a rolled-up directory.
///
/// Drops the one trailing delimiter, unless that would leave an empty
/// segment at the end. Then the rollup keeps it, so `a//b` under `a/`
/// lists as `a//` and never as `a` itself.
fn rollup_key(dir: String) -> String {
    match dir.strip_suffix(DELIMITER) {
        Some(trimmed) if !trimmed.is_empty() && !trimmed.ends_with(DELIMITER) => {
            trimmed.to_string()
        }
        _ => dir,
    }
}

/// Compute the "common prefix" a key rolls up into under `prefix`.
///
/// Returns Some(prefix) if the key sits below a deeper delimiter, otherwise
/// None (the key is a direct child).
fn compute_common_prefix(key: &str, prefix: &str, delimiter: &str) -> Option<String> {
    let after_prefix = key.strip_prefix(prefix)?;
    after_prefix.find(delimiter).map(|pos| {
        let mut combined = String::from(prefix);
        combined.push_str(&after_prefix[..pos + delimiter.len()]);
        combined
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::TempDir;

    async fn store() -> (LocalBlobStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = LocalBlobStore::new(Arc::new(pool), dir.path().join("blobs"));
        store.migrate().await.unwrap();
        store.create_container("mycontainer").await.unwrap();
        (store, dir)
    }

    async fn put(store: &LocalBlobStore, key: &str, data: &'static [u8]) -> Blob {
        let addr = BlobAddress::new("mycontainer", key);
        let stream = futures::stream::iter(vec![Ok(Bytes::from_static(data))]);
        store.upload_blob_stream(&addr, None, stream).await.unwrap()
    }

    #[tokio::test]
    async fn upload_records_md5_and_size() {
        let (store, _dir) = store().await;
        let blob = put(&store, "folder/file.txt", b"hello").await;

        assert_eq!(blob.size_bytes, 5);
        assert_eq!(blob.etag.as_deref(), Some("5d41402abc4b2a76b9719d911017c592"));
        assert_eq!(blob.content_md5.as_deref(), Some("XUFAKrxLKna5cZ2REBfFkg=="));

        let meta = store
            .get_metadata(&BlobAddress::new("mycontainer", "folder/file.txt"))
            .await
            .unwrap();
        assert_eq!(meta.size, Some(5));
        assert_eq!(meta.content_md5(), Some("XUFAKrxLKna5cZ2REBfFkg=="));
    }

    #[tokio::test]
    async fn directories_are_inferred_from_prefixes() {
        let (store, _dir) = store().await;
        put(&store, "folder/x", b"x").await;

        let folder = BlobAddress::new("mycontainer", "folder");
        assert_eq!(store.is_file_or_dir(&folder).await.unwrap(), ObjectKind::Dir);
        assert_eq!(
            store
                .is_file_or_dir(&BlobAddress::new("mycontainer", "folder/x"))
                .await
                .unwrap(),
            ObjectKind::File
        );
        assert_eq!(
            store
                .is_file_or_dir(&BlobAddress::new("mycontainer", "fold"))
                .await
                .unwrap(),
            ObjectKind::Absent
        );
        assert_eq!(
            store
                .is_file_or_dir(&BlobAddress::new("mycontainer", ""))
                .await
                .unwrap(),
            ObjectKind::Dir
        );
        assert!(!store.exists(&BlobAddress::new("nocontainer", "folder")).await.unwrap());
    }

    #[tokio::test]
    async fn list_rolls_up_nested_keys() {
        let (store, _dir) = store().await;
        put(&store, "a.txt", b"a").await;
        put(&store, "dir/b.txt", b"b").await;
        put(&store, "dir/sub/c.txt", b"c").await;

        let root = store.list(&BlobAddress::new("mycontainer", "")).await.unwrap();
        let names: Vec<_> = root
            .iter()
            .map(|e| (e.address.blob(), e.kind))
            .collect();
        assert_eq!(names, vec![("a.txt", ObjectKind::File), ("dir", ObjectKind::Dir)]);

        let dir = store.list(&BlobAddress::new("mycontainer", "dir")).await.unwrap();
        let names: Vec<_> = dir
            .iter()
            .map(|e| (e.address.blob(), e.kind))
            .collect();
        assert_eq!(
            names,
            vec![("dir/b.txt", ObjectKind::File), ("dir/sub", ObjectKind::Dir)]
        );
    }

    #[tokio::test]
    async fn empty_segments_never_list_a_directory_as_its_own_child() {
        let (store, _dir) = store().await;
        put(&store, "a//b", b"b").await;

        let listed = store.list(&BlobAddress::new("mycontainer", "a")).await.unwrap();
        let names: Vec<_> = listed.iter().map(|e| (e.address.blob(), e.kind)).collect();
        assert_eq!(names, vec![("a//", ObjectKind::Dir)]);

        let rollup = &listed[0].address;
        assert_eq!(store.is_file_or_dir(rollup).await.unwrap(), ObjectKind::Dir);
        let below = store.list(rollup).await.unwrap();
        let names: Vec<_> = below.iter().map(|e| (e.address.blob(), e.kind)).collect();
        assert_eq!(names, vec![("a//b", ObjectKind::File)]);
    }

    #[tokio::test]
    async fn move_onto_itself_refreshes_timestamp() {
        let (store, _dir) = store().await;
        let before = put(&store, "file.txt", b"data").await;
        let addr = BlobAddress::new("mycontainer", "file.txt");

        store.move_file(&addr, &addr).await.unwrap();

        let after = store.get_metadata(&addr).await.unwrap();
        assert!(after.last_modified.unwrap() >= before.last_modified);
        assert_eq!(after.etag, before.etag);
    }

    #[tokio::test]
    async fn move_relocates_payload() {
        let (store, dir) = store().await;
        put(&store, "old.txt", b"payload").await;
        let src = BlobAddress::new("mycontainer", "old.txt");
        let dst = BlobAddress::new("mycontainer", "new/name.txt");

        store.move_file(&src, &dst).await.unwrap();

        assert!(!store.exists(&src).await.unwrap());
        let local = dir.path().join("out.txt");
        store.download_file(&dst, &local).await.unwrap();
        assert_eq!(fs::read(&local).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn failed_move_keeps_source_and_destination_payloads() {
        let (store, dir) = store().await;
        put(&store, "x", b"source").await;
        put(&store, "y", b"destination").await;
        sqlx::query(
            "CREATE TRIGGER fail_moves BEFORE UPDATE OF is_deleted ON blobs
             BEGIN SELECT RAISE(ABORT, 'injected'); END",
        )
        .execute(&*store.db)
        .await
        .unwrap();

        let src = BlobAddress::new("mycontainer", "x");
        let dst = BlobAddress::new("mycontainer", "y");
        assert!(store.move_file(&src, &dst).await.is_err());

        let local = dir.path().join("x.out");
        store.download_file(&src, &local).await.unwrap();
        assert_eq!(fs::read(&local).await.unwrap(), b"source");
        let local = dir.path().join("y.out");
        store.download_file(&dst, &local).await.unwrap();
        assert_eq!(fs::read(&local).await.unwrap(), b"destination");
        assert_eq!(store.is_file_or_dir(&dst).await.unwrap(), ObjectKind::File);
    }

    #[tokio::test]
    async fn delete_reports_success_once_the_row_is_gone() {
        let (store, _dir) = store().await;
        put(&store, "stuck.txt", b"x").await;
        let addr = BlobAddress::new("mycontainer", "stuck.txt");
        let payload = store.blob_path("mycontainer", "stuck.txt");
        fs::remove_file(&payload).await.unwrap();
        fs::create_dir_all(payload.join("occupied")).await.unwrap();

        store.delete(&addr).await.unwrap();

        assert!(!store.exists(&addr).await.unwrap());
        assert!(payload.exists());
    }

    #[tokio::test]
    async fn delete_soft_deletes_and_removes_payload() {
        let (store, _dir) = store().await;
        put(&store, "gone.txt", b"bye").await;
        let addr = BlobAddress::new("mycontainer", "gone.txt");
        let payload = store.blob_path("mycontainer", "gone.txt");
        assert!(payload.exists());

        store.delete(&addr).await.unwrap();

        assert!(!payload.exists());
        assert!(!store.exists(&addr).await.unwrap());
        let err = store.delete(&addr).await.unwrap_err();
        assert!(matches!(err, BlobError::BlobNotFound { .. }));
    }

    #[tokio::test]
    async fn upload_requires_container() {
        let (store, _dir) = store().await;
        let addr = BlobAddress::new("missing", "file.txt");
        let stream = futures::stream::iter(vec![Ok(Bytes::from_static(b"x"))]);
        let err = store.upload_blob_stream(&addr, None, stream).await.unwrap_err();
        assert!(matches!(err, BlobError::ContainerNotFound(name) if name == "missing"));
    }

    #[tokio::test]
    async fn container_names_are_validated() {
        let (store, _dir) = store().await;
        for bad in ["ab", "Upper", "-lead", "trail-", "dou--ble", "under_score"] {
            let err = store.create_container(bad).await.unwrap_err();
            assert!(matches!(err, BlobError::InvalidContainerName { .. }), "{}", bad);
        }
        let err = store.create_container("mycontainer").await.unwrap_err();
        assert!(matches!(err, BlobError::ContainerAlreadyExists(_)));
    }

    #[tokio::test]
    async fn delete_container_drops_blobs() {
        let (store, _dir) = store().await;
        put(&store, "a/b", b"x").await;

        store.delete_container("mycontainer").await.unwrap();

        assert!(!store.exists(&BlobAddress::new("mycontainer", "a")).await.unwrap());
        assert!(!store.container_root("mycontainer").exists());
    }

    #[test]
    fn common_prefix_only_for_nested_keys() {
        assert_eq!(compute_common_prefix("dir/a", "", "/"), Some("dir/".into()));
        assert_eq!(compute_common_prefix("dir/a", "dir/", "/"), None);
        assert_eq!(compute_common_prefix("other/a", "dir/", "/"), None);
    }
}
