//! Manifest item identifiers.

use std::collections::HashMap;
use std::fmt;

/// Identifier of an item that has been added to a book.
///
/// Identifiers are unique within a [`Book`](crate::Book) and are used as
/// the `id` of the item in the package manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(String);

impl Id {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Per-class counter producing `img1`, `img2`, `xhtml1`, ...
///
/// Each class starts at zero and is incremented before use, so the first
/// identifier of a class ends in `1`. Identifiers are never handed out twice.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last: HashMap<String, u32>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next identifier for `class`.
    pub fn next_id(&mut self, class: &str) -> Id {
        let last = self.last.entry(class.to_string()).or_insert(0);
        *last += 1;
        Id(format!("{class}{last}"))
    }
}
