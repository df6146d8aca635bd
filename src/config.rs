use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{env, path::PathBuf};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub storage_dir: String,
    pub database_url: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Filesystem-style access to blob containers")]
pub struct Args {
    /// Directory where blob payloads are stored (overrides BLOBPATH_STORAGE_DIR)
    #[arg(long, global = true)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides BLOBPATH_DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print whether a file or directory exists at the URI
    Exists { uri: String },
    /// Print the synthesized stat record as JSON
    Stat { uri: String },
    /// Create an empty blob, or refresh an existing one's timestamp
    Touch { uri: String },
    /// List direct children
    Ls { uri: String },
    /// Delete a blob
    Rm {
        uri: String,
        /// Succeed when nothing is there
        #[arg(long)]
        missing_ok: bool,
    },
    /// Move a blob
    Mv { src: String, dst: String },
    /// Upload a local file
    Put { local: PathBuf, uri: String },
    /// Download a blob to a local file
    Get { uri: String, local: PathBuf },
    /// Create a container
    Mkcontainer { name: String },
    /// Check database and disk readiness
    Check,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the command to run.
    pub fn from_env_and_args() -> Result<(Self, Command)> {
        let args = Args::parse();
        let cfg = Self::merge(&args, |key| match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading {}", key)),
        })?;
        Ok((cfg, args.command))
    }

    /// CLI values win over the environment, which wins over defaults.
    pub fn merge<F>(args: &Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<Option<String>>,
    {
        let env_storage = lookup("BLOBPATH_STORAGE_DIR")?.unwrap_or_else(|| "./data/blobs".into());
        let env_db = lookup("BLOBPATH_DATABASE_URL")?
            .unwrap_or_else(|| "sqlite://./data/meta/blobpath.db".into());

        Ok(Self {
            storage_dir: args.storage_dir.clone().unwrap_or(env_storage),
            database_url: args.database_url.clone().unwrap_or(env_db),
        })
    }

    /// Local file SQLite will open for `database_url`.
    pub fn database_path(&self) -> &str {
        self.database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:")
            .trim_start_matches("file:")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Result<Option<String>> {
        Ok(None)
    }

    #[test]
    fn defaults_apply_without_env_or_flags() {
        let args = Args::try_parse_from(["blobpath", "check"]).unwrap();
        let cfg = AppConfig::merge(&args, no_env).unwrap();
        assert_eq!(cfg.storage_dir, "./data/blobs");
        assert_eq!(cfg.database_url, "sqlite://./data/meta/blobpath.db");
        assert_eq!(cfg.database_path(), "./data/meta/blobpath.db");
        assert_eq!(args.command, Command::Check);
    }

    #[test]
    fn flags_override_env() {
        let args = Args::try_parse_from([
            "blobpath",
            "stat",
            "az://c/k",
            "--storage-dir",
            "/srv/blobs",
        ])
        .unwrap();
        let cfg = AppConfig::merge(&args, |key| {
            Ok(match key {
                "BLOBPATH_STORAGE_DIR" => Some("/env/blobs".into()),
                "BLOBPATH_DATABASE_URL" => Some("sqlite:///env/meta.db".into()),
                _ => None,
            })
        })
        .unwrap();
        assert_eq!(cfg.storage_dir, "/srv/blobs");
        assert_eq!(cfg.database_url, "sqlite:///env/meta.db");
        assert_eq!(
            args.command,
            Command::Stat {
                uri: "az://c/k".into()
            }
        );
    }
}
