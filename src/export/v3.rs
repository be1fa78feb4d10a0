//! EPUB 3 rendering: OPF 3.0 package document with metadata refinements,
//! XHTML navigation document and container.

use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::model::book::BOOK_ID;
use crate::model::{Book, Kind, MetadataEntry, NavPoint, nav};
use crate::util::{escape_xml, format_timestamp};

use super::epub::{XHTML_MEDIA_TYPE, container_xml, manifest_items};
use super::{CONTENT_DIR, GeneratedFile, Version};

/// Name of the navigation document inside the content directory.
pub const NAV_NAME: &str = "__toc.xhtml";

/// Package documents ("renditions") written to the container. There is
/// always exactly one.
pub fn rendition_names() -> &'static [&'static str] {
    &["book.opf"]
}

/// Render the generated files of an EPUB 3 book: navigation document,
/// container and package document, in the order they are written.
///
/// `now` is used for `dcterms:modified` when the book has no modification
/// time of its own.
pub fn render(book: &Book, now: DateTime<Utc>) -> Vec<GeneratedFile> {
    let renditions: Vec<String> = rendition_names()
        .iter()
        .map(|name| format!("{CONTENT_DIR}/{name}"))
        .collect();

    let mut files = vec![
        GeneratedFile::new(format!("{CONTENT_DIR}/{NAV_NAME}"), nav_document(book)),
        container_xml(renditions.iter().map(String::as_str)),
    ];
    for path in renditions {
        files.push(GeneratedFile::new(path, package_document(book, now)));
    }
    files
}

/// The OPF 3.0 package document.
pub fn package_document(book: &Book, now: DateTime<Utc>) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
    );
    write_metadata(&mut opf, book, now);
    opf.push_str("  </metadata>\n");

    // Manifest
    opf.push_str("  <manifest>\n");
    for item in manifest_items(book, Version::V3) {
        opf.push_str(&item.to_xml());
    }
    opf.push_str(&format!(
        "    <item id=\"nav\" href=\"{NAV_NAME}\" media-type=\"{XHTML_MEDIA_TYPE}\" properties=\"nav\"/>\n"
    ));
    opf.push_str("  </manifest>\n");

    // Spine
    opf.push_str("  <spine>\n");
    for doc in book.spine() {
        opf.push_str(&format!("    <itemref idref=\"{}\"/>\n", escape_xml(doc.id.as_str())));
    }
    opf.push_str("  </spine>\n");

    opf.push_str("</package>\n");
    opf
}

fn write_metadata(opf: &mut String, book: &Book, now: DateTime<Utc>) {
    let mut has_modified = false;

    for (i, entry) in book.metadata().iter().enumerate() {
        // anchors are numbered by registry position, so they are stable
        // across writes of an unchanged book
        let anchor = format!("id{}", i + 1);
        match entry.kind {
            // name/content metas (the cover) are EPUB 2 only
            Kind::Meta => {}
            Kind::Identifier if entry.qualifier("id") == Some(BOOK_ID) => {
                opf.push_str(&format!(
                    "    <dc:identifier id=\"{BOOK_ID}\">{}</dc:identifier>\n",
                    escape_xml(entry.value.as_deref().unwrap_or_default())
                ));
            }
            Kind::Identifier => {
                opf.push_str(&format!(
                    "    <dc:identifier>{}</dc:identifier>\n",
                    escape_xml(entry.value.as_deref().unwrap_or_default())
                ));
            }
            Kind::Modified => {
                has_modified = true;
                opf.push_str(&format!(
                    "    <meta property=\"dcterms:modified\">{}</meta>\n",
                    escape_xml(entry.value.as_deref().unwrap_or_default())
                ));
            }
            _ => write_refined(opf, entry, &anchor),
        }
    }

    if !has_modified {
        opf.push_str(&format!(
            "    <meta property=\"dcterms:modified\">{}</meta>\n",
            format_timestamp(now)
        ));
    }

    if let Some(collection) = book.collection() {
        opf.push_str(&format!(
            "    <meta property=\"belongs-to-collection\" id=\"seriesinfo\">{}</meta>\n",
            escape_xml(&collection.name)
        ));
        opf.push_str(&format!(
            "    <meta refines=\"#seriesinfo\" property=\"collection-type\">{}</meta>\n",
            collection.collection_type.as_str()
        ));
        if let Some(entry) = book.entry_number() {
            opf.push_str(&format!(
                "    <meta refines=\"#seriesinfo\" property=\"group-position\">{entry}</meta>\n"
            ));
        }
    }
}

/// An anchored element followed by one `<meta refines>` per qualifier.
fn write_refined(opf: &mut String, entry: &MetadataEntry, anchor: &str) {
    let element = entry.kind.element();
    match entry.value.as_deref().filter(|v| !v.is_empty()) {
        Some(value) => opf.push_str(&format!(
            "    <{element} id=\"{anchor}\">{}</{element}>\n",
            escape_xml(value)
        )),
        None => opf.push_str(&format!("    <{element} id=\"{anchor}\"/>\n")),
    }

    for q in &entry.qualifiers {
        let scheme = match &q.scheme {
            Some(scheme) => format!(" scheme=\"{}\"", escape_xml(scheme)),
            None => String::new(),
        };
        opf.push_str(&format!(
            "    <meta refines=\"#{anchor}\" property=\"{}{}\"{scheme}>{}</meta>\n",
            q.rendering.v3,
            q.key,
            escape_xml(&q.value)
        ));
    }
}

/// The XHTML navigation document holding the table of contents.
pub fn nav_document(book: &Book) -> String {
    let mut doc = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
  <title>{}</title>
</head>
<body>
  <nav epub:type="toc" id="toc">
    <h1>Table of Contents</h1>
"#,
        escape_xml(book.title())
    );
    write_nav_list(&mut doc, book.navpoints(), 2);
    doc.push_str("  </nav>\n</body>\n</html>\n");
    doc
}

/// Nested `<ol>` of entries, each level sorted by order.
fn write_nav_list(doc: &mut String, points: &[NavPoint], indent: usize) {
    let indent_str = "  ".repeat(indent);

    doc.push_str(&format!("{indent_str}<ol>\n"));
    for point in nav::sorted(points) {
        doc.push_str(&format!(
            "{indent_str}  <li>\n{indent_str}    <a href=\"{}\">{}</a>\n",
            escape_xml(&point.target),
            point.label
        ));
        if !point.children.is_empty() {
            write_nav_list(doc, &point.children, indent + 2);
        }
        doc.push_str(&format!("{indent_str}  </li>\n"));
    }
    doc.push_str(&format!("{indent_str}</ol>\n"));
}

static LEGACY_DOCTYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(<\?xml[^>]*>\s*<!DOCTYPE)\b[^>]*>").expect("valid doctype pattern")
});

/// Make EPUB 2 content documents acceptable to EPUB 3.
///
/// EPUB 2 XHTML carries a full XHTML 1.1 doctype
/// (`<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" ...>`) which EPUB 3
/// rejects in favour of `<!DOCTYPE html>`. Only a doctype directly after the
/// XML declaration is touched.
pub fn fix_legacy_markup(contents: &str) -> Cow<'_, str> {
    LEGACY_DOCTYPE.replace(contents, "${1} html>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Id;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
    }

    #[test]
    fn test_refinements_replace_inline_attributes() {
        let mut book = Book::new();
        book.set_title("Title");
        book.add_author("Jane Austen");

        let opf = package_document(&book, fixed_now());
        assert!(opf.contains("<dc:title id=\"id2\">Title</dc:title>"));
        assert!(opf.contains("<dc:creator id=\"id3\">Jane Austen</dc:creator>"));
        assert!(opf.contains(
            "<meta refines=\"#id3\" property=\"role\" scheme=\"marc:relators\">aut</meta>"
        ));
        assert!(!opf.contains("opf:role"));
    }

    #[test]
    fn test_identifier_has_no_refinements() {
        let mut book = Book::new();
        book.set_uuid("443ed275-966f-4099-8bee-5a6e1e474bb4").unwrap();
        book.add_identifier("urn:isbn:9780000000000");

        let opf = package_document(&book, fixed_now());
        assert!(opf.contains(
            "<dc:identifier id=\"BookId\">urn:uuid:443ed275-966f-4099-8bee-5a6e1e474bb4</dc:identifier>"
        ));
        assert!(opf.contains("<dc:identifier>urn:isbn:9780000000000</dc:identifier>"));
        assert!(!opf.contains("refines=\"#id1\""));
    }

    #[test]
    fn test_modified_is_synthesized_once() {
        let book = Book::new();
        let opf = package_document(&book, fixed_now());
        assert_eq!(opf.matches("dcterms:modified").count(), 1);
        assert!(opf.contains("<meta property=\"dcterms:modified\">2024-05-06T07:08:09Z</meta>"));
    }

    #[test]
    fn test_explicit_modified_wins() {
        let mut book = Book::new();
        book.set_modified(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap());
        let opf = package_document(&book, fixed_now());
        assert_eq!(opf.matches("dcterms:modified").count(), 1);
        assert!(opf.contains(">2000-01-01T00:00:00Z</meta>"));
    }

    #[test]
    fn test_cover_meta_is_skipped_and_flagged_in_manifest() {
        let mut book = Book::new();
        book.add_xhtml("cover.xhtml", "", None);
        book.set_cover_image(&Id::from("img1"));
        let opf = package_document(&book, fixed_now());
        assert!(!opf.contains("name=\"cover\""));
        assert!(opf.contains(
            "<item id=\"nav\" href=\"__toc.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>"
        ));
        assert!(opf.contains("<spine>\n    <itemref idref=\"xhtml1\"/>\n  </spine>"));
    }

    #[test]
    fn test_empty_value_is_self_closing() {
        let mut book = Book::new();
        book.set_title("");
        let opf = package_document(&book, fixed_now());
        assert!(opf.contains("    <dc:title id=\"id2\"/>\n"));
        assert!(!opf.contains("</dc:title>"));
    }

    #[test]
    fn test_collection_block() {
        let mut book = Book::new();
        book.set_series("The Series").unwrap();
        book.set_entry_number("2.1").unwrap();
        let opf = package_document(&book, fixed_now());
        assert!(opf.contains(
            "<meta property=\"belongs-to-collection\" id=\"seriesinfo\">The Series</meta>\n    \
             <meta refines=\"#seriesinfo\" property=\"collection-type\">series</meta>\n    \
             <meta refines=\"#seriesinfo\" property=\"group-position\">2.1</meta>"
        ));
    }

    #[test]
    fn test_entry_number_without_collection_is_not_written() {
        let mut book = Book::new();
        book.set_entry_number("4").unwrap();
        let opf = package_document(&book, fixed_now());
        assert!(!opf.contains("group-position"));
        assert!(!opf.contains("belongs-to-collection"));
    }

    #[test]
    fn test_nav_document_is_sorted_and_nested() {
        let mut book = Book::new();
        book.add_navpoint("Second", "2.xhtml", 2);
        let first = book.add_navpoint("First", "1.xhtml", 1);
        first.add_navpoint("First B", "1.xhtml#b", 9);
        first.add_navpoint("First A", "1.xhtml#a", 3);

        let doc = nav_document(&book);
        let hrefs: Vec<_> = doc
            .lines()
            .filter_map(|l| l.trim().strip_prefix("<a href=\""))
            .filter_map(|l| l.split('"').next())
            .collect();
        assert_eq!(hrefs, vec!["1.xhtml", "1.xhtml#a", "1.xhtml#b", "2.xhtml"]);
        assert_eq!(doc.matches("<ol>").count(), 2);
        assert!(doc.contains("<nav epub:type=\"toc\" id=\"toc\">"));
        assert!(!doc.contains("playOrder"));
    }

    #[test]
    fn test_fix_legacy_markup_rewrites_doctype() {
        let legacy = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
            <!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.1//EN\" \"http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd\">\n\
            <html xmlns=\"http://www.w3.org/1999/xhtml\"><body/></html>";
        assert_eq!(
            fix_legacy_markup(legacy),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!DOCTYPE html>\n\
             <html xmlns=\"http://www.w3.org/1999/xhtml\"><body/></html>"
        );
    }

    #[test]
    fn test_fix_legacy_markup_leaves_other_documents_alone() {
        let modern = "<?xml version=\"1.0\"?>\n<!DOCTYPE html>\n<html/>";
        assert_eq!(fix_legacy_markup(modern), modern);

        let no_declaration = "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.1//EN\" \"x.dtd\">\n<html/>";
        assert!(matches!(fix_legacy_markup(no_declaration), Cow::Borrowed(_)));

        assert_eq!(fix_legacy_markup("<p>text</p>"), "<p>text</p>");
    }

    #[test]
    fn test_render_paths() {
        let book = Book::new();
        let files = render(&book, fixed_now());
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["OPS/__toc.xhtml", "META-INF/container.xml", "OPS/book.opf"]);
        assert!(files[1].contents.contains("full-path=\"OPS/book.opf\""));
    }
}
