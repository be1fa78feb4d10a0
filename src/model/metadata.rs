//! Descriptive metadata: the ordered registry of Dublin Core statements
//! written to the package document.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Element a metadata entry renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Identifier,
    Title,
    Language,
    Creator,
    Contributor,
    Publisher,
    Description,
    Subject,
    Date,
    Rights,
    /// Last modification timestamp (`dcterms:modified`).
    Modified,
    /// A name/content `<meta>` element, only meaningful to EPUB 2 readers.
    Meta,
}

impl Kind {
    /// Qualified element name.
    pub fn element(self) -> &'static str {
        match self {
            Self::Identifier => "dc:identifier",
            Self::Title => "dc:title",
            Self::Language => "dc:language",
            Self::Creator => "dc:creator",
            Self::Contributor => "dc:contributor",
            Self::Publisher => "dc:publisher",
            Self::Description => "dc:description",
            Self::Subject => "dc:subject",
            Self::Date => "dc:date",
            Self::Rights => "dc:rights",
            Self::Modified => "dcterms:modified",
            Self::Meta => "meta",
        }
    }
}

/// How a qualifier key is prefixed in each package version.
///
/// EPUB 2 writes qualifiers as namespaced attributes on the element itself
/// (`opf:role="aut"`); EPUB 3 writes them as separate `<meta refines>`
/// statements whose `property` uses its own prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rendering {
    pub v2: &'static str,
    pub v3: &'static str,
}

impl Rendering {
    /// No prefix in either version.
    pub const PLAIN: Rendering = Rendering { v2: "", v3: "" };
    /// `opf:` attribute in EPUB 2, bare property in EPUB 3.
    pub const OPF: Rendering = Rendering { v2: "opf:", v3: "" };
}

/// A key/value refinement attached to a metadata entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qualifier {
    pub key: String,
    pub rendering: Rendering,
    pub value: String,
    /// Controlled vocabulary of `value`, e.g. `marc:relators`.
    pub scheme: Option<String>,
}

impl Qualifier {
    pub fn new(key: impl Into<String>, rendering: Rendering, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            rendering,
            value: value.into(),
            scheme: None,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub kind: Kind,
    /// Text content. Entries without one render as empty elements.
    pub value: Option<String>,
    pub qualifiers: Vec<Qualifier>,
}

impl MetadataEntry {
    pub fn new(kind: Kind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: Some(value.into()),
            qualifiers: Vec::new(),
        }
    }

    pub fn empty(kind: Kind) -> Self {
        Self {
            kind,
            value: None,
            qualifiers: Vec::new(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// Value of the first qualifier named `key`.
    pub fn qualifier(&self, key: &str) -> Option<&str> {
        self.qualifiers
            .iter()
            .find(|q| q.key == key)
            .map(|q| q.value.as_str())
    }
}

/// Kind of collection a book belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionType {
    Series,
    Set,
}

impl CollectionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Series => "series",
            Self::Set => "set",
        }
    }
}

/// Series or set membership of a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub collection_type: CollectionType,
    pub name: String,
}

static ENTRY_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)*$").expect("valid entry number pattern"));

/// Validate a position within a series or set, such as `2` or `1.2.3`.
///
/// Surrounding whitespace is ignored; the trimmed value is returned.
pub fn parse_entry_number(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if ENTRY_NUMBER.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(Error::Format(format!(
            "entry number {value:?} is not a dotted decimal number"
        )))
    }
}
