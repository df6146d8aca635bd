//! Concrete `BlobBackend` implementations.

pub mod local_store;
