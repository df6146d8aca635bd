//! Data records for the blob path layer.
//!
//! `container` and `blob` map to the local store's SQLite tables via
//! `sqlx::FromRow`. `metadata` and `stat` are what the path layer hands
//! back to callers.

pub mod blob;
pub mod container;
pub mod metadata;
pub mod stat;
