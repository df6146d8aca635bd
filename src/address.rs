//! Container/blob addressing for object-storage URIs.

use std::fmt;

/// Where an object lives: a container plus a slash-delimited blob key.
///
/// Parsing is total. Degenerate input yields empty parts rather than an
/// error, so constructing a path never fails eagerly.
///
/// Fields are private so every address goes through `new`, which keeps the
/// key free of a leading `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobAddress {
    container: String,
    blob: String,
}

impl BlobAddress {
    pub fn new(container: impl Into<String>, blob: impl Into<String>) -> Self {
        let blob = blob.into();
        Self {
            container: container.into(),
            blob: blob.trim_start_matches('/').to_string(),
        }
    }

    /// First path segment (the bucket-equivalent namespace).
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Everything after the container, never with a leading `/`.
    pub fn blob(&self) -> &str {
        &self.blob
    }

    /// Parse a path whose scheme prefix has already been stripped,
    /// e.g. `mycontainer/folder/file.txt`.
    pub fn parse(no_prefix: &str) -> Self {
        match no_prefix.split_once('/') {
            Some((container, rest)) => Self::new(container, rest),
            None => Self::new(no_prefix, ""),
        }
    }

    /// Parse a full URI, stripping `prefix` first. Returns `None` when the
    /// URI does not start with `prefix`.
    pub fn parse_uri(uri: &str, prefix: &str) -> Option<Self> {
        uri.strip_prefix(prefix).map(Self::parse)
    }

    /// The container itself, with no blob key.
    pub fn is_container_root(&self) -> bool {
        self.blob.is_empty()
    }

    /// Append one or more `/`-separated segments to the blob key.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            return self.clone();
        }
        if self.container.is_empty() {
            return Self::parse(segment);
        }
        let base = self.blob.trim_end_matches('/');
        let blob = if base.is_empty() {
            segment.to_string()
        } else {
            format!("{}/{}", base, segment)
        };
        Self::new(self.container.clone(), blob)
    }

    /// The address one level up. The container root is its own parent.
    pub fn parent(&self) -> Self {
        let trimmed = self.blob.trim_end_matches('/');
        match trimmed.rsplit_once('/') {
            Some((head, _)) => Self::new(self.container.clone(), head),
            None => Self::new(self.container.clone(), ""),
        }
    }

    /// Final key segment; the container name for a container root.
    pub fn name(&self) -> &str {
        let trimmed = self.blob.trim_end_matches('/');
        if trimmed.is_empty() {
            return &self.container;
        }
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    /// Key prefix under which children of this address live.
    ///
    /// A key that already ends in `/` is its own prefix, so a listed
    /// rollup such as `a//` lists the keys below it rather than `a`.
    pub fn child_prefix(&self) -> String {
        if self.blob.is_empty() || self.blob.ends_with('/') {
            self.blob.clone()
        } else {
            format!("{}/", self.blob)
        }
    }
}

/// Renders `container/blob`, without a scheme prefix.
impl fmt::Display for BlobAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.blob.is_empty() {
            write!(f, "{}", self.container)
        } else {
            write!(f, "{}/{}", self.container, self.blob)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_slash() {
        let addr = BlobAddress::parse("container/a/b/c");
        assert_eq!(addr.container, "container");
        assert_eq!(addr.blob, "a/b/c");
    }

    #[test]
    fn strips_leading_slash_from_key() {
        let addr = BlobAddress::parse("container//a/b");
        assert_eq!(addr.container, "container");
        assert_eq!(addr.blob, "a/b");
    }

    #[test]
    fn degenerate_input_is_accepted() {
        let addr = BlobAddress::parse("");
        assert_eq!(addr.container, "");
        assert_eq!(addr.blob, "");

        let addr = BlobAddress::parse("only-container");
        assert_eq!(addr.container, "only-container");
        assert!(addr.is_container_root());
    }

    #[test]
    fn uri_round_trip() {
        let addr = BlobAddress::parse_uri("az://container/a/b/c", "az://").unwrap();
        assert_eq!(format!("az://{}", addr), "az://container/a/b/c");
        assert!(BlobAddress::parse_uri("s3://bucket/key", "az://").is_none());
    }

    #[test]
    fn join_and_parent() {
        let root = BlobAddress::parse("mycontainer");
        let file = root.join("folder").join("file.txt");
        assert_eq!(file.blob, "folder/file.txt");
        assert_eq!(file.parent().blob, "folder");
        assert_eq!(file.parent().parent(), root);
        assert_eq!(root.parent(), root);
        assert_eq!(file.name(), "file.txt");
        assert_eq!(root.name(), "mycontainer");
        assert_eq!(file.parent().child_prefix(), "folder/");
        assert_eq!(root.child_prefix(), "");
    }

    #[test]
    fn constructors_normalize_the_key() {
        let addr = BlobAddress::new("container", "//a/b");
        assert_eq!(addr.container(), "container");
        assert_eq!(addr.blob(), "a/b");
        assert_eq!(addr.to_string(), "container/a/b");
    }

    #[test]
    fn child_prefix_keeps_an_existing_trailing_slash() {
        assert_eq!(BlobAddress::new("c", "a").child_prefix(), "a/");
        assert_eq!(BlobAddress::new("c", "a//").child_prefix(), "a//");
        assert_eq!(BlobAddress::new("c", "a/").child_prefix(), "a/");
    }
}
