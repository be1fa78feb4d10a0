//! Core data model for building an ebook.
//!
//! This module contains:
//! - The [`Book`] aggregate and its operations
//! - Manifest identifiers and their allocator
//! - Resource records (images, documents, stylesheets, scripts, fonts)
//! - The metadata registry and MARC relator vocabulary
//! - The table of contents tree

pub(crate) mod book;
mod ids;
pub mod metadata;
pub mod nav;
pub mod relators;
mod resource;

pub use book::Book;
pub use ids::{Id, IdAllocator};
pub use metadata::{Collection, CollectionType, Kind, MetadataEntry, Qualifier, Rendering};
pub use nav::NavPoint;
pub use resource::{Document, Font, FontFormat, Image, ImageType, Script, Stylesheet};
