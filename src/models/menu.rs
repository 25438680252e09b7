// src/models/menu.rs

//! Menu sources: discovered candidates, catalog work items and download results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural kind of a menu source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceKind {
    /// A downloadable document such as a PDF
    Document,
    /// A picture of the menu
    Image,
    /// An HTML page
    Page,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Document => "document",
            SourceKind::Image => "image",
            SourceKind::Page => "page",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A URL that probably leads to a menu.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MenuSourceCandidate {
    /// Absolute URL without fragment
    pub url: String,
    pub kind: SourceKind,
}

/// An HTML menu source that has no dishes yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuPage {
    pub menu_id: String,
    pub restaurant_id: String,
    pub url: String,
}

/// A menu source whose content has not been downloaded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDownload {
    pub menu_id: String,
    pub url: String,
}

/// Outcome of one successful download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub source_id: String,

    /// Hex SHA-256 digest of the downloaded bytes
    pub checksum: String,

    /// Where the content store put the bytes (path or URL)
    pub locator: String,
}
