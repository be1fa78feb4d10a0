//! ZIP packaging shared by both EPUB versions.

use std::borrow::Cow;
use std::io::{Seek, Write};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;
use crate::model::Book;
use crate::util::escape_xml;

use super::{CONTENT_DIR, GeneratedFile, Version, v2, v3};

pub(crate) const MIMETYPE: &[u8] = b"application/epub+zip";
pub(crate) const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";

/// Configuration for EPUB output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Deflate level for every entry except `mimetype` (0-9, default 9).
    pub compression_level: i64,
    /// Rewrite EPUB 2 style `<!DOCTYPE>` declarations in content documents
    /// to `<!DOCTYPE html>` when writing EPUB 3. Default is true.
    pub fix_legacy_markup: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression_level: 9,
            fix_legacy_markup: true,
        }
    }
}

impl WriterConfig {
    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = level.clamp(0, 9);
        self
    }

    pub fn with_fix_legacy_markup(mut self, fix: bool) -> Self {
        self.fix_legacy_markup = fix;
        self
    }
}

/// One `<item>` of the package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    /// Path relative to the package document.
    pub href: String,
    pub media_type: String,
    /// EPUB 3 `properties` attribute.
    pub properties: Option<&'static str>,
}

impl ManifestItem {
    fn new(id: &str, href: &str, media_type: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            href: href.to_string(),
            media_type: media_type.into(),
            properties: None,
        }
    }

    pub(crate) fn to_xml(&self) -> String {
        let properties = match self.properties {
            Some(p) => format!(" properties=\"{p}\""),
            None => String::new(),
        };
        format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{}/>\n",
            escape_xml(&self.id),
            escape_xml(&self.href),
            escape_xml(&self.media_type),
            properties
        )
    }
}

/// Manifest entries for every resource in the book: images, content
/// documents, stylesheets, scripts, then fonts, each in insertion order.
///
/// The generated navigation file is not included; each version adds its own.
/// OPF 2.0 has no `properties` attribute, so the cover image is only flagged
/// for [`Version::V3`].
pub fn manifest_items(book: &Book, version: Version) -> Vec<ManifestItem> {
    let mut items = Vec::new();

    for image in book.images() {
        let mut item = ManifestItem::new(
            image.id.as_str(),
            &image.path,
            image.image_type.media_type(),
        );
        if version == Version::V3 && book.cover_image() == Some(&image.id) {
            item.properties = Some("cover-image");
        }
        items.push(item);
    }
    for doc in book.documents() {
        items.push(ManifestItem::new(doc.id.as_str(), &doc.path, XHTML_MEDIA_TYPE));
    }
    for css in book.stylesheets() {
        items.push(ManifestItem::new(css.id.as_str(), &css.path, "text/css"));
    }
    for js in book.scripts() {
        items.push(ManifestItem::new(
            js.id.as_str(),
            &js.path,
            "application/javascript",
        ));
    }
    for font in book.fonts() {
        items.push(ManifestItem::new(
            font.id.as_str(),
            &font.path,
            font.format.media_type(),
        ));
    }

    items
}

/// `META-INF/container.xml` listing one rootfile per package document.
pub(crate) fn container_xml<'a>(package_paths: impl IntoIterator<Item = &'a str>) -> GeneratedFile {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
"#,
    );
    for path in package_paths {
        xml.push_str(&format!(
            "    <rootfile full-path=\"{}\" media-type=\"application/oebps-package+xml\"/>\n",
            escape_xml(path)
        ));
    }
    xml.push_str("  </rootfiles>\n</container>\n");
    GeneratedFile::new("META-INF/container.xml", xml)
}

/// Write `book` as an EPUB of the given version.
///
/// Entries are written as: `mimetype` (stored, so readers can identify the
/// file from its first bytes), the book's resources, then the generated
/// package files. On error the output is incomplete and should be discarded.
pub fn write_epub<W: Write + Seek>(book: &Book, version: Version, writer: W) -> Result<()> {
    let config = book.config();
    let mut zip = ZipWriter::new(writer);

    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(config.compression_level));

    // 1. Write mimetype (must be first, uncompressed)
    zip.start_file("mimetype", stored)?;
    zip.write_all(MIMETYPE)?;

    for target in book.dangling_navpoints() {
        tracing::warn!(target, "table of contents entry points at no content document");
    }

    // 2. Write resources
    let mut entries = 1;
    let mut put = |zip: &mut ZipWriter<W>, path: &str, data: &[u8]| -> Result<()> {
        let full_path = format!("{CONTENT_DIR}/{path}");
        zip.start_file(full_path.as_str(), deflated)?;
        zip.write_all(data)?;
        tracing::debug!(path = %full_path, bytes = data.len(), "wrote entry");
        entries += 1;
        Ok(())
    };

    for image in book.images() {
        put(&mut zip, &image.path, &image.data)?;
    }
    for doc in book.documents() {
        let contents = if version == Version::V3 && config.fix_legacy_markup {
            v3::fix_legacy_markup(&doc.contents)
        } else {
            Cow::Borrowed(doc.contents.as_str())
        };
        put(&mut zip, &doc.path, contents.as_bytes())?;
    }
    for css in book.stylesheets() {
        put(&mut zip, &css.path, css.contents.as_bytes())?;
    }
    for js in book.scripts() {
        put(&mut zip, &js.path, js.contents.as_bytes())?;
    }
    for font in book.fonts() {
        put(&mut zip, &font.path, &font.data)?;
    }

    // 3. Write package files
    let generated = match version {
        Version::V2 => v2::render(book),
        Version::V3 => v3::render(book, chrono::Utc::now()),
    };
    for file in &generated {
        zip.start_file(file.path.as_str(), deflated)?;
        zip.write_all(file.contents.as_bytes())?;
        tracing::debug!(path = %file.path, bytes = file.contents.len(), "wrote entry");
    }

    zip.finish()?;
    tracing::info!(
        %version,
        entries = entries + generated.len(),
        title = book.title(),
        "wrote epub"
    );
    Ok(())
}
