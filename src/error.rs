//! Error types for folio operations.

use thiserror::Error;

/// Errors that can occur while building or writing a book.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Unrecognized image data: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid relator role: {0}")]
    InvalidRole(String),

    #[error("{0} has already been set")]
    AlreadySet(&'static str),

    #[error("Cannot set {requested}: book already belongs to a {existing}")]
    ConflictingCollection {
        existing: &'static str,
        requested: &'static str,
    },

    #[error("Malformed value: {0}")]
    Format(String),

    #[error("Too many arguments: {0}")]
    TooManyArguments(String),

    #[error("EPUB version {0} is unsupported")]
    UnsupportedVersion(u8),

    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
