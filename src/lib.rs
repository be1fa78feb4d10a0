//! # folio
//!
//! Build EPUB ebooks from an in-memory model and write them as either
//! EPUB 2 or EPUB 3.
//!
//! ## Features
//!
//! - One [`Book`] model, two package formats ([`Version::V2`], [`Version::V3`])
//! - Stable manifest identifiers and a deterministic reading order
//! - Hierarchical table of contents, written as NCX or as an XHTML nav document
//! - Dublin Core metadata with MARC relator roles, series and set membership
//! - Images, stylesheets, scripts and fonts, added from memory or from disk
//!
//! The output is not validated; running a checker such as EPUBCheck over
//! the result is advisable.
//!
//! ## Quick Start
//!
//! ```no_run
//! use folio::{Book, Version};
//!
//! let mut book = Book::new();
//! book.set_title("My Book");
//! book.add_author("Me");
//! book.add_language("en");
//!
//! let cover = book.add_image_file("source/cover.jpg", "images/cover.jpg")?;
//! book.set_cover_image(&cover);
//!
//! // Files are listed in the spine by order, not by the order they are added
//! book.add_xhtml_file("source/cover.xhtml", "xhtml/cover.xhtml", Some(1))?;
//! book.add_xhtml_file("source/ch1.xhtml", "xhtml/ch1.xhtml", Some(10))?;
//!
//! let ch1 = book.add_navpoint("Chapter 1", "xhtml/ch1.xhtml", 10);
//! for i in 1..=3 {
//!     ch1.add_navpoint(format!("Section {i}"), format!("xhtml/ch1.xhtml#s{i}"), i);
//! }
//!
//! book.set_version(Version::V3);
//! book.write("my-book.epub")?;
//! # Ok::<(), folio::Error>(())
//! ```

pub mod error;
pub mod export;
pub mod model;
pub(crate) mod util;

pub use error::{Error, Result};
pub use export::{Version, WriterConfig};
pub use model::{Book, Id, NavPoint};
