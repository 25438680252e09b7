//! Content stores for downloaded menu sources.
//!
//! A store takes the raw bytes of a menu source under a key derived from
//! its checksum and answers with a locator (a filesystem path or a URL).
//!
//! ```text
//! {download_dir}/
//! ├── 00000012-9f86d081.html
//! ├── 00000013-2c26b46b.pdf
//! └── 00000014-fcde2b2e.jpg
//! ```

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;

use crate::error::Result;

pub use local::LocalContentStore;
#[cfg(feature = "s3")]
pub use s3::S3ContentStore;

/// Extension used when the content type is missing or unknown.
const FALLBACK_EXTENSION: &str = "bin";

/// Trait for content store backends.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Write `bytes` under `key`, replacing any previous content.
    ///
    /// Returns the locator of the written object.
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String>;
}

/// File extension for a media type, without the leading dot.
///
/// Common menu formats map to fixed extensions; everything else goes
/// through the MIME registry and falls back to `bin`.
pub fn extension_for(media_type: Option<&str>) -> &'static str {
    let Some(media_type) = media_type else {
        return FALLBACK_EXTENSION;
    };

    match media_type {
        "text/html" => "html",
        "application/pdf" => "pdf",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.first().copied())
            .unwrap_or(FALLBACK_EXTENSION),
    }
}

/// Storage key for a downloaded source: `{source_id}-{digest[..8]}.{ext}`.
pub fn object_key(source_id: &str, checksum: &str, media_type: Option<&str>) -> String {
    let prefix = checksum.get(..8).unwrap_or(checksum);
    format!("{}-{}.{}", source_id, prefix, extension_for(media_type))
}
