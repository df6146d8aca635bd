//! The filesystem-shaped metadata record synthesized from blob metadata.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::metadata::BlobMetadata;

/// Mirrors the conventional `(mode, ino, dev, nlink, uid, gid, size,
/// atime, mtime, ctime)` stat tuple, in that field order.
///
/// `None` means the object store cannot supply the field. Only `st_size`
/// falls back to a real value (0) when the backend omits it.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct StatResult {
    pub st_mode: Option<u32>,
    pub st_ino: Option<u64>,
    /// The provider's URI scheme, e.g. `az://`.
    pub st_dev: &'static str,
    pub st_nlink: Option<u64>,
    pub st_uid: Option<u32>,
    pub st_gid: Option<u32>,
    pub st_size: u64,
    pub st_atime: Option<f64>,
    /// Seconds since the Unix epoch, with sub-second precision.
    pub st_mtime: Option<f64>,
    pub st_ctime: Option<f64>,
}

impl StatResult {
    pub fn from_metadata(dev: &'static str, meta: &BlobMetadata) -> Self {
        Self {
            st_mode: None,
            st_ino: None,
            st_dev: dev,
            st_nlink: None,
            st_uid: None,
            st_gid: None,
            st_size: meta.size.unwrap_or(0),
            st_atime: None,
            st_mtime: meta.last_modified.as_ref().map(epoch_seconds),
            st_ctime: None,
        }
    }
}

pub fn epoch_seconds(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_nanos()) / 1_000_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unsupported_fields_stay_unavailable() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let meta = BlobMetadata {
            size: Some(42),
            last_modified: Some(t),
            ..Default::default()
        };

        let st = StatResult::from_metadata("az://", &meta);
        assert_eq!(st.st_size, 42);
        assert_eq!(st.st_mtime, Some(t.timestamp() as f64));
        assert_eq!(st.st_dev, "az://");
        assert!(st.st_mode.is_none());
        assert!(st.st_ino.is_none());
        assert!(st.st_nlink.is_none());
        assert!(st.st_uid.is_none());
        assert!(st.st_gid.is_none());
        assert!(st.st_atime.is_none());
        assert!(st.st_ctime.is_none());
    }

    #[test]
    fn missing_size_defaults_to_zero() {
        let st = StatResult::from_metadata("az://", &BlobMetadata::default());
        assert_eq!(st.st_size, 0);
        assert!(st.st_mtime.is_none());
    }
}
