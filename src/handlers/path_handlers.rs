//! Command handlers for path operations.
//! Each handler resolves its URI through the registry and prints a
//! plain-text or JSON result to stdout.

use anyhow::{Context, Result};
use blobpath::{LocalBlobStore, PathRegistry};
use std::path::Path;

use crate::config::Command;
use crate::handlers::health_handlers;

/// Dispatch one CLI command.
pub async fn run(
    command: Command,
    registry: &PathRegistry,
    store: &LocalBlobStore,
) -> Result<()> {
    match command {
        Command::Exists { uri } => exists(registry, &uri).await,
        Command::Stat { uri } => stat(registry, &uri).await,
        Command::Touch { uri } => touch(registry, &uri).await,
        Command::Ls { uri } => list(registry, &uri).await,
        Command::Rm { uri, missing_ok } => remove(registry, &uri, missing_ok).await,
        Command::Mv { src, dst } => rename(registry, &src, &dst).await,
        Command::Put { local, uri } => upload(registry, &local, &uri).await,
        Command::Get { uri, local } => download(registry, &uri, &local).await,
        Command::Mkcontainer { name } => {
            store.create_container(&name).await?;
            println!("created container {}", name);
            Ok(())
        }
        Command::Check => health_handlers::check(store).await,
    }
}

/// `exists` prints `file`, `dir` or `absent`.
async fn exists(registry: &PathRegistry, uri: &str) -> Result<()> {
    let path = registry.resolve(uri)?;
    let kind = if path.is_file().await? {
        "file"
    } else if path.is_dir().await? {
        "dir"
    } else {
        "absent"
    };
    println!("{}", kind);
    Ok(())
}

async fn stat(registry: &PathRegistry, uri: &str) -> Result<()> {
    let path = registry.resolve(uri)?;
    let st = path.stat().await?;
    println!("{}", serde_json::to_string_pretty(&st)?);
    Ok(())
}

async fn touch(registry: &PathRegistry, uri: &str) -> Result<()> {
    let path = registry.resolve(uri)?;
    path.touch().await?;
    tracing::info!("touched {}", path);
    Ok(())
}

/// `ls` prints one child per line, directories with a trailing `/`.
async fn list(registry: &PathRegistry, uri: &str) -> Result<()> {
    let path = registry.resolve(uri)?;
    for child in path.iterdir().await? {
        if child.is_dir().await? {
            println!("{}/", child);
        } else {
            println!("{}", child);
        }
    }
    Ok(())
}

async fn remove(registry: &PathRegistry, uri: &str, missing_ok: bool) -> Result<()> {
    let path = registry.resolve(uri)?;
    path.unlink(missing_ok).await?;
    Ok(())
}

async fn rename(registry: &PathRegistry, src: &str, dst: &str) -> Result<()> {
    let source = registry.resolve(src)?;
    let target = registry.resolve(dst)?;
    let moved = source.rename(&*target).await?;
    println!("{}", moved);
    Ok(())
}

async fn upload(registry: &PathRegistry, local: &Path, uri: &str) -> Result<()> {
    let path = registry.resolve(uri)?;
    path.upload_from(local)
        .await
        .with_context(|| format!("uploading {} to {}", local.display(), uri))?;
    Ok(())
}

async fn download(registry: &PathRegistry, uri: &str, local: &Path) -> Result<()> {
    let path = registry.resolve(uri)?;
    path.download_to(local)
        .await
        .with_context(|| format!("downloading {} to {}", uri, local.display()))?;
    Ok(())
}
