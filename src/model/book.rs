use std::io::{Seek, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::export::{self, Version, WriterConfig};
use crate::util::{decode_text, format_timestamp};

use super::metadata::{
    Collection, CollectionType, Kind, MetadataEntry, Qualifier, Rendering, parse_entry_number,
};
use super::nav::NavPoint;
use super::relators::{self, is_relator};
use super::resource::{
    Document, Font, FontFormat, Image, ImageType, Script, Stylesheet, spine_order,
};
use super::{Id, IdAllocator};

/// Anchor of the unique identifier in the package document.
pub(crate) const BOOK_ID: &str = "BookId";

/// An ebook under construction.
///
/// Resources, metadata and table of contents entries are appended through
/// the `add_*`/`set_*` methods and never removed. Serialization only borrows
/// the book, so it can be written any number of times and in either EPUB
/// version.
///
/// # Example
///
/// ```no_run
/// use folio::Book;
///
/// let mut book = Book::new();
/// book.set_title("My Book");
/// book.add_author("Me");
/// book.add_language("en");
///
/// book.add_xhtml("text/ch1.xhtml", "<html>...</html>", Some(10));
/// book.add_navpoint("Chapter 1", "text/ch1.xhtml", 10);
///
/// book.write("my-book.epub")?;
/// # Ok::<(), folio::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Book {
    version: Version,
    config: WriterConfig,
    uuid: Uuid,
    metadata: Vec<MetadataEntry>,
    title: String,
    authors: Vec<String>,
    artists: Vec<String>,
    collection: Option<Collection>,
    entry_number: Option<String>,
    cover_image: Option<Id>,
    images: Vec<Image>,
    stylesheets: Vec<Stylesheet>,
    scripts: Vec<Script>,
    fonts: Vec<Font>,
    documents: Vec<Document>,
    navpoints: Vec<NavPoint>,
    ids: IdAllocator,
}

impl Default for Book {
    fn default() -> Self {
        Self::new()
    }
}

impl Book {
    /// Create an empty EPUB 2 book with a random UUID.
    pub fn new() -> Self {
        let uuid = Uuid::new_v4();
        let identifier = MetadataEntry::new(Kind::Identifier, uuid.urn().to_string())
            .with_qualifier(Qualifier::new("id", Rendering::PLAIN, BOOK_ID));

        Self {
            version: Version::default(),
            config: WriterConfig::default(),
            uuid,
            metadata: vec![identifier],
            title: String::new(),
            authors: Vec::new(),
            artists: Vec::new(),
            collection: None,
            entry_number: None,
            cover_image: None,
            images: Vec::new(),
            stylesheets: Vec::new(),
            scripts: Vec::new(),
            fonts: Vec::new(),
            documents: Vec::new(),
            navpoints: Vec::new(),
            ids: IdAllocator::new(),
        }
    }

    // ------------------------------------------------------------------
    // Version and writer settings
    // ------------------------------------------------------------------

    /// EPUB version written by [`serialize`](Self::serialize) and
    /// [`write`](Self::write).
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn with_config(mut self, config: WriterConfig) -> Self {
        self.config = config;
        self
    }

    /// Whether EPUB 2 style doctypes are rewritten when writing EPUB 3.
    pub fn set_fix_legacy_markup(&mut self, fix: bool) {
        self.config.fix_legacy_markup = fix;
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// The book's UUID, without the `urn:uuid:` prefix.
    pub fn uuid(&self) -> String {
        self.uuid.hyphenated().to_string()
    }

    /// The unique identifier as written to the package (`urn:uuid:...`).
    pub fn identifier(&self) -> String {
        self.uuid.urn().to_string()
    }

    /// Replace the generated UUID.
    ///
    /// Readers use the identifier to recognize a book, so revisions of the
    /// same book should keep the same UUID.
    pub fn set_uuid(&mut self, uuid: &str) -> Result<()> {
        let uuid = Uuid::parse_str(uuid.trim())?;
        self.uuid = uuid;
        let urn = uuid.urn().to_string();
        if let Some(entry) = self
            .metadata
            .iter_mut()
            .find(|m| m.kind == Kind::Identifier && m.qualifier("id") == Some(BOOK_ID))
        {
            entry.value = Some(urn);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    /// All metadata statements in the order they will be written.
    pub fn metadata(&self) -> &[MetadataEntry] {
        &self.metadata
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        match self.metadata.iter_mut().find(|m| m.kind == Kind::Title) {
            Some(entry) => entry.value = Some(self.title.clone()),
            None => self
                .metadata
                .push(MetadataEntry::new(Kind::Title, self.title.clone())),
        }
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    pub fn artists(&self) -> &[String] {
        &self.artists
    }

    /// Add an author (`dc:creator` with the `aut` role).
    pub fn add_author(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.authors.push(name.clone());
        self.push_agent(Kind::Creator, name, relators::AUTHOR);
    }

    /// Add an artist (`dc:creator` with the `art` role).
    pub fn add_artist(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.artists.push(name.clone());
        self.push_agent(Kind::Creator, name, relators::ARTIST);
    }

    /// Add a creator with a MARC relator role such as `aut`, `ill` or `trl`.
    pub fn add_creator(&mut self, name: impl Into<String>, role: &str) -> Result<()> {
        check_role(role)?;
        self.push_agent(Kind::Creator, name.into(), role);
        Ok(())
    }

    /// Add a contributor with a MARC relator role.
    pub fn add_contributor(&mut self, name: impl Into<String>, role: &str) -> Result<()> {
        check_role(role)?;
        self.push_agent(Kind::Contributor, name.into(), role);
        Ok(())
    }

    fn push_agent(&mut self, kind: Kind, name: String, role: &str) {
        self.metadata.push(
            MetadataEntry::new(kind, name)
                .with_qualifier(Qualifier::new("role", Rendering::OPF, role).with_scheme("marc:relators")),
        );
    }

    /// Add a language as an RFC 3066 code (`en`, `fr-CA`).
    pub fn add_language(&mut self, language: impl Into<String>) {
        self.metadata.push(MetadataEntry::new(Kind::Language, language));
    }

    pub fn add_publisher(&mut self, publisher: impl Into<String>) {
        self.metadata
            .push(MetadataEntry::new(Kind::Publisher, publisher));
    }

    pub fn add_description(&mut self, description: impl Into<String>) {
        self.metadata
            .push(MetadataEntry::new(Kind::Description, description));
    }

    pub fn add_subject(&mut self, subject: impl Into<String>) {
        self.metadata.push(MetadataEntry::new(Kind::Subject, subject));
    }

    pub fn add_rights(&mut self, rights: impl Into<String>) {
        self.metadata.push(MetadataEntry::new(Kind::Rights, rights));
    }

    /// Add a publication date, e.g. `2019` or `2019-06-01`.
    pub fn add_date(&mut self, date: impl Into<String>) {
        self.metadata.push(MetadataEntry::new(Kind::Date, date));
    }

    /// Add a secondary identifier such as an ISBN.
    pub fn add_identifier(&mut self, identifier: impl Into<String>) {
        self.metadata
            .push(MetadataEntry::new(Kind::Identifier, identifier));
    }

    /// Record the last modification time. When unset, EPUB 3 output gets
    /// the time of writing.
    pub fn set_modified(&mut self, modified: DateTime<Utc>) {
        let value = format_timestamp(modified);
        match self.metadata.iter_mut().find(|m| m.kind == Kind::Modified) {
            Some(entry) => entry.value = Some(value),
            None => self.metadata.push(MetadataEntry::new(Kind::Modified, value)),
        }
    }

    /// Add a `<meta name=".." content=".."/>` statement (EPUB 2 only).
    pub fn add_meta(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.metadata.push(meta_entry(name.into(), content.into()));
    }

    // ------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------

    pub fn collection(&self) -> Option<&Collection> {
        self.collection.as_ref()
    }

    /// Name of the series this book belongs to.
    pub fn series(&self) -> Option<&str> {
        self.collection_named(CollectionType::Series)
    }

    /// Name of the set this book belongs to.
    pub fn set(&self) -> Option<&str> {
        self.collection_named(CollectionType::Set)
    }

    fn collection_named(&self, collection_type: CollectionType) -> Option<&str> {
        self.collection
            .as_ref()
            .filter(|c| c.collection_type == collection_type)
            .map(|c| c.name.as_str())
    }

    /// Mark the book as part of a series. Can only be done once, and not
    /// for a book that is already part of a set.
    pub fn set_series(&mut self, name: impl Into<String>) -> Result<()> {
        self.set_collection(CollectionType::Series, name.into())
    }

    /// Mark the book as part of a set. Can only be done once, and not for a
    /// book that is already part of a series.
    pub fn set_set(&mut self, name: impl Into<String>) -> Result<()> {
        self.set_collection(CollectionType::Set, name.into())
    }

    fn set_collection(&mut self, collection_type: CollectionType, name: String) -> Result<()> {
        if let Some(existing) = &self.collection {
            if existing.collection_type == collection_type {
                return Err(Error::AlreadySet(collection_type.as_str()));
            }
            return Err(Error::ConflictingCollection {
                existing: existing.collection_type.as_str(),
                requested: collection_type.as_str(),
            });
        }
        self.collection = Some(Collection {
            collection_type,
            name,
        });
        Ok(())
    }

    pub fn entry_number(&self) -> Option<&str> {
        self.entry_number.as_deref()
    }

    /// Position of the book within its series or set, like `3` or `1.2`.
    pub fn set_entry_number(&mut self, entry: &str) -> Result<()> {
        self.entry_number = Some(parse_entry_number(entry)?);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cover
    // ------------------------------------------------------------------

    pub fn cover_image(&self) -> Option<&Id> {
        self.cover_image.as_ref()
    }

    /// Mark an image as the cover shown on the reader's bookshelf.
    ///
    /// Readers generally don't show it when the book is opened; add an
    /// XHTML page referencing the image at the start of the spine for that.
    pub fn set_cover_image(&mut self, id: &Id) {
        let entry = meta_entry("cover".to_string(), id.to_string());
        match self
            .metadata
            .iter_mut()
            .find(|m| m.kind == Kind::Meta && m.qualifier("name") == Some("cover"))
        {
            Some(existing) => *existing = entry,
            None => self.metadata.push(entry),
        }
        self.cover_image = Some(id.clone());
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    /// Add an image at `path` within the book.
    ///
    /// The type is detected from the data, but some readers go by file
    /// extension so the two should agree.
    pub fn add_image(&mut self, path: impl Into<String>, data: Vec<u8>) -> Result<Id> {
        let image_type = ImageType::sniff(&data)?;
        let id = self.ids.next_id("img");
        let path = path.into();
        tracing::debug!(%id, %path, image_type = image_type.subtype(), "added image");
        self.images.push(Image {
            id: id.clone(),
            path,
            data,
            image_type,
        });
        Ok(id)
    }

    /// Add the image file at `source` under the name `dest` in the book.
    pub fn add_image_file(&mut self, source: impl AsRef<Path>, dest: impl Into<String>) -> Result<Id> {
        let data = std::fs::read(source)?;
        self.add_image(dest, data)
    }

    pub fn add_stylesheet(&mut self, path: impl Into<String>, contents: impl Into<String>) -> Id {
        let id = self.ids.next_id("css");
        self.stylesheets.push(Stylesheet {
            id: id.clone(),
            path: path.into(),
            contents: contents.into(),
        });
        id
    }

    pub fn add_stylesheet_file(
        &mut self,
        source: impl AsRef<Path>,
        dest: impl Into<String>,
    ) -> Result<Id> {
        let contents = read_text(source.as_ref())?;
        Ok(self.add_stylesheet(dest, contents))
    }

    pub fn add_script(&mut self, path: impl Into<String>, contents: impl Into<String>) -> Id {
        let id = self.ids.next_id("js");
        self.scripts.push(Script {
            id: id.clone(),
            path: path.into(),
            contents: contents.into(),
        });
        id
    }

    pub fn add_script_file(&mut self, source: impl AsRef<Path>, dest: impl Into<String>) -> Result<Id> {
        let contents = read_text(source.as_ref())?;
        Ok(self.add_script(dest, contents))
    }

    /// Add a font. The path must end in `.otf`, `.ttf`, `.woff` or `.woff2`.
    pub fn add_font(&mut self, path: impl Into<String>, data: Vec<u8>) -> Result<Id> {
        let path = path.into();
        let format = FontFormat::from_path(&path)
            .ok_or_else(|| Error::UnsupportedFormat(format!("font file {path}")))?;
        let id = self.ids.next_id("font");
        self.fonts.push(Font {
            id: id.clone(),
            path,
            data,
            format,
        });
        Ok(id)
    }

    pub fn add_font_file(&mut self, source: impl AsRef<Path>, dest: impl Into<String>) -> Result<Id> {
        let data = std::fs::read(source)?;
        self.add_font(dest, data)
    }

    /// Add an XHTML content document.
    ///
    /// Documents appear in the spine in the order they were added unless an
    /// explicit `order` is given. Documents without one sort as order 0, and
    /// documents with equal orders keep the order they were added in.
    pub fn add_xhtml(
        &mut self,
        path: impl Into<String>,
        contents: impl Into<String>,
        order: Option<i32>,
    ) -> Id {
        let id = self.ids.next_id("xhtml");
        let insertion_index = self.documents.len();
        self.documents.push(Document {
            id: id.clone(),
            path: path.into(),
            contents: contents.into(),
            order: order.unwrap_or(0),
            insertion_index,
        });
        id
    }

    pub fn add_xhtml_file(
        &mut self,
        source: impl AsRef<Path>,
        dest: impl Into<String>,
        order: Option<i32>,
    ) -> Result<Id> {
        let contents = read_text(source.as_ref())?;
        Ok(self.add_xhtml(dest, contents, order))
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn stylesheets(&self) -> &[Stylesheet] {
        &self.stylesheets
    }

    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    pub fn fonts(&self) -> &[Font] {
        &self.fonts
    }

    /// Content documents in the order they were added.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Content documents in reading order.
    pub fn spine(&self) -> Vec<&Document> {
        spine_order(&self.documents)
    }

    // ------------------------------------------------------------------
    // Table of contents
    // ------------------------------------------------------------------

    /// Add a top-level table of contents entry and return it for nesting.
    ///
    /// `target` is the book-relative URI the entry points to. Entries are
    /// sorted by `order` when written, so they may be added in any order
    /// and the numbers may have gaps. Table of contents order and spine
    /// order are independent.
    pub fn add_navpoint(
        &mut self,
        label: impl Into<String>,
        target: impl Into<String>,
        order: i32,
    ) -> &mut NavPoint {
        self.navpoints.push(NavPoint::new(label, target, order));
        let last = self.navpoints.len() - 1;
        &mut self.navpoints[last]
    }

    pub fn navpoints(&self) -> &[NavPoint] {
        &self.navpoints
    }

    /// Targets of table of contents entries that name no content document.
    ///
    /// Such entries are written anyway; this is for callers that want to
    /// check their book before handing it to a validator.
    pub fn dangling_navpoints(&self) -> Vec<&str> {
        fn walk<'a>(points: &'a [NavPoint], documents: &[Document], out: &mut Vec<&'a str>) {
            for point in points {
                let path = point.target_path();
                if !documents.iter().any(|d| d.path == path) {
                    out.push(&point.target);
                }
                walk(&point.children, documents, out);
            }
        }

        let mut dangling = Vec::new();
        walk(&self.navpoints, &self.documents, &mut dangling);
        dangling
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Build the EPUB in the book's configured version.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        self.serialize_version(self.version)
    }

    /// Build the EPUB in a specific version, regardless of the book's own.
    pub fn serialize_version(&self, version: Version) -> Result<Vec<u8>> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        export::write_epub(self, version, &mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Write the EPUB to any seekable destination.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        export::write_epub(self, self.version, writer)
    }

    /// Write the EPUB to a file, replacing it if it exists.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.serialize()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

fn check_role(role: &str) -> Result<()> {
    if is_relator(role) {
        Ok(())
    } else {
        Err(Error::InvalidRole(role.to_string()))
    }
}

fn meta_entry(name: String, content: String) -> MetadataEntry {
    MetadataEntry::empty(Kind::Meta)
        .with_qualifier(Qualifier::new("name", Rendering::PLAIN, name))
        .with_qualifier(Qualifier::new("content", Rendering::PLAIN, content))
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(decode_text(&bytes).into_owned())
}
