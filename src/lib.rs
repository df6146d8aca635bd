//! Filesystem-style paths over blob storage.
//!
//! `az://container/folder/file.txt` becomes a value you can probe, stat,
//! touch, list and move like a local path, while a `BlobBackend` does the
//! actual storage work.
//!
//! ```rust,ignore
//! use blobpath::{CloudPath, PathRegistry};
//!
//! let registry = PathRegistry::with_backend(backend);
//! let path = registry.resolve("az://mycontainer/folder/file.txt")?;
//! path.touch().await?;
//! assert!(path.is_file().await?);
//! ```

pub mod address;
pub mod backend;
pub mod errors;
pub mod models;
pub mod path;
pub mod registry;
pub mod services;

pub use address::BlobAddress;
pub use backend::BlobBackend;
pub use errors::{BlobError, BlobResult};
pub use models::{
    metadata::{BlobMetadata, ContentSettings, ListEntry, ObjectKind},
    stat::StatResult,
};
pub use path::{AzureBlobPath, CloudPath};
pub use registry::{PathFactory, PathRegistry};
pub use services::local_store::LocalBlobStore;
