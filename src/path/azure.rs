//! `az://` paths over Azure-style blob storage.

use std::{fmt, sync::Arc};

use super::CloudPath;
use crate::{
    address::BlobAddress,
    backend::BlobBackend,
    errors::{BlobError, BlobResult},
};

/// A path into a blob container: `az://{container}/{blob}`.
///
/// Cheap to clone. Holds no handles or connections, only the address and
/// a shared reference to the backend.
#[derive(Clone)]
pub struct AzureBlobPath {
    address: BlobAddress,
    backend: Arc<dyn BlobBackend>,
}

impl AzureBlobPath {
    pub const PREFIX: &'static str = "az://";

    /// Parse an `az://` URI. No I/O happens here.
    pub fn new(uri: &str, backend: Arc<dyn BlobBackend>) -> BlobResult<Self> {
        let address =
            BlobAddress::parse_uri(uri, Self::PREFIX).ok_or_else(|| BlobError::WrongPrefix {
                uri: uri.to_string(),
                prefix: Self::PREFIX,
            })?;
        Ok(Self::from_address(address, backend))
    }

    pub fn from_address(address: BlobAddress, backend: Arc<dyn BlobBackend>) -> Self {
        Self { address, backend }
    }

    pub fn container(&self) -> &str {
        self.address.container()
    }

    /// Blob key within the container, without a leading slash.
    pub fn blob(&self) -> &str {
        self.address.blob()
    }
}

impl CloudPath for AzureBlobPath {
    fn cloud_prefix(&self) -> &'static str {
        Self::PREFIX
    }

    fn address(&self) -> &BlobAddress {
        &self.address
    }

    fn backend(&self) -> &Arc<dyn BlobBackend> {
        &self.backend
    }

    fn with_address(&self, address: BlobAddress) -> Box<dyn CloudPath> {
        Box::new(Self::from_address(address, self.backend.clone()))
    }

    fn drive(&self) -> &str {
        self.container()
    }
}

impl PartialEq for AzureBlobPath {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for AzureBlobPath {}

impl fmt::Debug for AzureBlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureBlobPath")
            .field("container", &self.address.container())
            .field("blob", &self.address.blob())
            .finish()
    }
}

impl fmt::Display for AzureBlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.address)
    }
}
