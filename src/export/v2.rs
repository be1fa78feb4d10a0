//! EPUB 2 rendering: OPF 2.0 package document, NCX and container.

use crate::model::{Book, Kind, MetadataEntry, NavPoint, nav};
use crate::util::escape_xml;

use super::epub::{container_xml, manifest_items};
use super::{CONTENT_DIR, GeneratedFile, Version};

/// Name of the package document inside the content directory.
pub const PACKAGE_NAME: &str = "content.opf";
/// Name of the NCX table of contents inside the content directory.
pub const NCX_NAME: &str = "toc.ncx";

/// Render the generated files of an EPUB 2 book: package document, NCX and
/// container, in the order they are written.
pub fn render(book: &Book) -> Vec<GeneratedFile> {
    let package_path = format!("{CONTENT_DIR}/{PACKAGE_NAME}");
    vec![
        GeneratedFile::new(package_path.clone(), package_document(book)),
        GeneratedFile::new(format!("{CONTENT_DIR}/{NCX_NAME}"), ncx(book)),
        container_xml([package_path.as_str()]),
    ]
}

/// The OPF 2.0 package document.
pub fn package_document(book: &Book) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
"#,
    );
    for entry in book.metadata() {
        opf.push_str(&metadata_element(entry));
    }
    opf.push_str("  </metadata>\n");

    // Manifest
    opf.push_str("  <manifest>\n");
    opf.push_str(&format!(
        "    <item id=\"ncx\" href=\"{NCX_NAME}\" media-type=\"application/x-dtbncx+xml\"/>\n"
    ));
    for item in manifest_items(book, Version::V2) {
        opf.push_str(&item.to_xml());
    }
    opf.push_str("  </manifest>\n");

    // Spine
    opf.push_str("  <spine toc=\"ncx\">\n");
    for doc in book.spine() {
        opf.push_str(&format!("    <itemref idref=\"{}\"/>\n", escape_xml(doc.id.as_str())));
    }
    opf.push_str("  </spine>\n");

    opf.push_str("</package>\n");
    opf
}

/// A metadata statement with its qualifiers as inline attributes.
fn metadata_element(entry: &MetadataEntry) -> String {
    // OPF 2.0 has no dcterms:modified; it records the event on dc:date.
    let (element, mut attrs) = match entry.kind {
        Kind::Modified => ("dc:date", String::from(" opf:event=\"modification\"")),
        kind => (kind.element(), String::new()),
    };
    for q in &entry.qualifiers {
        attrs.push_str(&format!(
            " {}{}=\"{}\"",
            q.rendering.v2,
            q.key,
            escape_xml(&q.value)
        ));
    }

    match entry.value.as_deref().filter(|v| !v.is_empty()) {
        Some(value) => format!(
            "    <{element}{attrs}>{}</{element}>\n",
            escape_xml(value)
        ),
        None => format!("    <{element}{attrs}/>\n"),
    }
}

/// The NCX table of contents.
pub fn ncx(book: &Book) -> String {
    let mut ncx = String::new();

    ncx.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{}"/>
    <meta name="dtb:depth" content="{}"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{}</text>
  </docTitle>
"#,
        escape_xml(&book.identifier()),
        depth(book.navpoints()).max(1),
        escape_xml(book.title())
    ));

    if !book.authors().is_empty() {
        ncx.push_str("  <docAuthor>\n");
        for author in book.authors() {
            ncx.push_str(&format!("    <text>{}</text>\n", escape_xml(author)));
        }
        ncx.push_str("  </docAuthor>\n");
    }

    ncx.push_str("  <navMap>\n");
    write_nav_points(&mut ncx, book.navpoints(), 1, "navpointid", 2);
    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn depth(points: &[NavPoint]) -> usize {
    points
        .iter()
        .map(|p| 1 + depth(&p.children))
        .max()
        .unwrap_or(0)
}

/// Write `points` as navPoint elements starting at `play_order`, returning
/// the play order for whatever follows them.
///
/// Siblings are sorted by their order. Each entry takes the next number and
/// its children are numbered before its next sibling, so the numbers follow
/// document order with no gaps.
fn write_nav_points(
    ncx: &mut String,
    points: &[NavPoint],
    play_order: usize,
    base_id: &str,
    indent: usize,
) -> usize {
    let indent_str = "  ".repeat(indent);
    let mut next = play_order;

    for (i, point) in nav::sorted(points).into_iter().enumerate() {
        let id = format!("{base_id}_{i}");
        ncx.push_str(&format!(
            "{indent_str}<navPoint id=\"{id}\" playOrder=\"{next}\">\n"
        ));
        ncx.push_str(&format!(
            "{indent_str}  <navLabel>\n{indent_str}    <text>{}</text>\n{indent_str}  </navLabel>\n",
            point.label
        ));
        ncx.push_str(&format!(
            "{indent_str}  <content src=\"{}\"/>\n",
            escape_xml(&point.target)
        ));

        next = write_nav_points(ncx, &point.children, next + 1, &id, indent + 1);

        ncx.push_str(&format!("{indent_str}</navPoint>\n"));
    }

    next
}
