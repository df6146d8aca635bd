//! Readiness check for the local store.
//!
//! Runs the same probes a service readiness endpoint would:
//! 1. A lightweight query against SQLite (`SELECT 1`).
//! 2. A write/read/delete round trip under the store's `base_path`.

use anyhow::{Result, bail};
use blobpath::LocalBlobStore;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::fs;
use uuid::Uuid;

#[derive(Serialize, Debug)]
pub struct ReadyReport {
    pub status: String,
    pub checks: BTreeMap<&'static str, CheckStatus>,
}

#[derive(Serialize, Debug)]
pub struct CheckStatus {
    pub ok: bool,
    pub error: Option<String>,
}

impl ReadyReport {
    pub fn is_ok(&self) -> bool {
        self.checks.values().all(|check| check.ok)
    }
}

/// Print the readiness report as JSON; fails if any check failed.
pub async fn check(store: &LocalBlobStore) -> Result<()> {
    let report = readiness(store).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_ok() {
        bail!("local store is not ready");
    }
    Ok(())
}

pub async fn readiness(store: &LocalBlobStore) -> ReadyReport {
    let sqlite_check = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&*store.db)
        .await
    {
        Ok(1) => CheckStatus { ok: true, error: None },
        Ok(v) => CheckStatus {
            ok: false,
            error: Some(format!("unexpected result: {}", v)),
        },
        Err(e) => CheckStatus {
            ok: false,
            error: Some(format!("error: {}", e)),
        },
    };

    let tmp_path = store.base_path.join(format!(".readyz-{}", Uuid::new_v4()));
    let disk_check = match fs::write(&tmp_path, b"readyz").await {
        Ok(_) => match fs::read(&tmp_path).await {
            Ok(bytes) if bytes == b"readyz" => match fs::remove_file(&tmp_path).await {
                Ok(_) => CheckStatus { ok: true, error: None },
                Err(e) => CheckStatus {
                    ok: true,
                    error: Some(format!("could not remove tmp file: {}", e)),
                },
            },
            Ok(_) => {
                let _ = fs::remove_file(&tmp_path).await;
                CheckStatus {
                    ok: false,
                    error: Some("file content mismatch".to_string()),
                }
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp_path).await;
                CheckStatus {
                    ok: false,
                    error: Some(format!("could not read tmp file: {}", e)),
                }
            }
        },
        Err(e) => CheckStatus {
            ok: false,
            error: Some(format!("could not write tmp file: {}", e)),
        },
    };

    let mut checks = BTreeMap::new();
    checks.insert("sqlite", sqlite_check);
    checks.insert("disk", disk_check);

    let status = if checks.values().all(|c| c.ok) { "ok" } else { "error" };
    ReadyReport {
        status: status.into(),
        checks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;

    #[tokio::test]
    async fn ready_when_db_and_disk_work() {
        let dir = tempfile::tempdir().unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = LocalBlobStore::new(Arc::new(pool), dir.path());

        let report = readiness(&store).await;
        assert!(report.is_ok());
        assert_eq!(report.status, "ok");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn disk_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = LocalBlobStore::new(Arc::new(pool), dir.path().join("missing"));

        let report = readiness(&store).await;
        assert!(!report.is_ok());
        assert!(report.checks["sqlite"].ok);
        assert!(!report.checks["disk"].ok);
    }
}
