//! EPUB writing.
//!
//! A [`Book`] is rendered by one of two pure renderers, [`v2`] or [`v3`],
//! selected by [`Version`]. Each produces the generated files of its
//! package format (package document, navigation, container); the shared
//! packaging step in `epub` writes those together with the book's resources
//! into the ZIP container.
//!
//! # Example
//!
//! ```no_run
//! use folio::{Book, Version};
//!
//! let mut book = Book::new();
//! book.set_title("My Book");
//! book.add_xhtml("ch1.xhtml", "<html>...</html>", None);
//!
//! let epub2 = book.serialize_version(Version::V2)?;
//! let epub3 = book.serialize_version(Version::V3)?;
//! # Ok::<(), folio::Error>(())
//! ```

use std::fmt;

use crate::error::Error;

mod epub;
pub mod v2;
pub mod v3;

pub use epub::{ManifestItem, WriterConfig, manifest_items, write_epub};

/// Internal directory holding the book's resources and package files.
pub const CONTENT_DIR: &str = "OPS";

/// A file generated from the book model rather than supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Full path inside the archive.
    pub path: String,
    pub contents: String,
}

impl GeneratedFile {
    fn new(path: impl Into<String>, contents: String) -> Self {
        Self {
            path: path.into(),
            contents,
        }
    }
}

/// EPUB package version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// EPUB 2.0.1: OPF 2.0 package with an NCX table of contents.
    #[default]
    V2,
    /// EPUB 3: OPF 3.0 package with an XHTML navigation document.
    V3,
}

impl TryFrom<u8> for Version {
    type Error = Error;

    fn try_from(version: u8) -> Result<Self, Self::Error> {
        match version {
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V2 => f.write_str("2.0"),
            Self::V3 => f.write_str("3.0"),
        }
    }
}
