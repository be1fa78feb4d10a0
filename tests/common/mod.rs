//! Helpers for reading back the EPUB files written in tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

pub type Archive = ZipArchive<Cursor<Vec<u8>>>;

pub fn open(bytes: Vec<u8>) -> Archive {
    ZipArchive::new(Cursor::new(bytes)).expect("output should be a valid zip archive")
}

/// Entry names in the order they were written.
pub fn entry_names(archive: &mut Archive) -> Vec<String> {
    (0..archive.len())
        .map(|i| archive.by_index_raw(i).unwrap().name().to_string())
        .collect()
}

pub fn read_entry(archive: &mut Archive, name: &str) -> String {
    let mut file = archive
        .by_name(name)
        .unwrap_or_else(|_| panic!("missing entry {name}"));
    let mut contents = String::new();
    file.read_to_string(&mut contents).unwrap();
    contents
}

/// Attributes of every element named `name` (qualified, e.g. `dc:creator`).
pub fn elements(xml: &str, name: &str) -> Vec<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut found = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == name.as_bytes() => {
                let attrs = e
                    .attributes()
                    .flatten()
                    .map(|attr| {
                        (
                            String::from_utf8(attr.key.as_ref().to_vec()).unwrap(),
                            String::from_utf8(attr.value.to_vec()).unwrap(),
                        )
                    })
                    .collect();
                found.push(attrs);
            }
            Ok(Event::Eof) => break,
            Err(e) => panic!("malformed XML: {e}\n{xml}"),
            _ => {}
        }
    }
    found
}

/// Values of attribute `attr` on every element named `name`.
pub fn attribute_values(xml: &str, name: &str, attr: &str) -> Vec<String> {
    elements(xml, name)
        .into_iter()
        .filter_map(|mut attrs| attrs.remove(attr))
        .collect()
}

/// Text content of every element named `name`.
pub fn texts(xml: &str, name: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut found = Vec::new();
    let mut inside = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == name.as_bytes() => {
                inside = true;
                found.push(String::new());
            }
            Ok(Event::End(e)) if e.name().as_ref() == name.as_bytes() => inside = false,
            Ok(Event::Text(t)) if inside => {
                if let Some(last) = found.last_mut() {
                    last.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => panic!("malformed XML: {e}\n{xml}"),
            _ => {}
        }
    }
    found
}

/// A tiny valid PNG.
pub fn png() -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::RgbImage::new(4, 3)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// A tiny valid GIF.
pub fn gif() -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::RgbaImage::new(2, 2)
        .write_to(&mut out, image::ImageFormat::Gif)
        .unwrap();
    out.into_inner()
}

pub const LEGACY_XHTML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Chapter</title></head>
<body><p>Text</p></body>
</html>
"#;
