//! Resource records held by a [`Book`](crate::Book).

use std::io::Cursor;
use std::path::Path;

use image::error::{ImageFormatHint, UnsupportedError, UnsupportedErrorKind};
use image::{ImageError, ImageFormat, ImageReader};

use super::Id;

/// Raster image types accepted in a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageType {
    /// Detect the image type from the data itself, ignoring any file name.
    ///
    /// The header must also decode, so truncated or corrupt images are
    /// rejected along with unknown formats.
    pub fn sniff(data: &[u8]) -> Result<Self, ImageError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(ImageError::IoError)?;

        let image_type = match reader.format() {
            Some(ImageFormat::Png) => Self::Png,
            Some(ImageFormat::Jpeg) => Self::Jpeg,
            Some(ImageFormat::Gif) => Self::Gif,
            Some(ImageFormat::WebP) => Self::Webp,
            Some(other) => return Err(unsupported(ImageFormatHint::Exact(other))),
            None => return Err(unsupported(ImageFormatHint::Unknown)),
        };

        reader.into_dimensions()?;
        Ok(image_type)
    }

    /// Media subtype, as in `image/<subtype>`.
    pub fn subtype(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    pub fn media_type(self) -> String {
        format!("image/{}", self.subtype())
    }
}

fn unsupported(hint: ImageFormatHint) -> ImageError {
    ImageError::Unsupported(UnsupportedError::from_format_and_kind(
        hint.clone(),
        UnsupportedErrorKind::Format(hint),
    ))
}

/// Font container formats, recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFormat {
    OpenType,
    TrueType,
    Woff,
    Woff2,
}

impl FontFormat {
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())?
            .to_lowercase();

        match ext.as_str() {
            "otf" => Some(Self::OpenType),
            "ttf" => Some(Self::TrueType),
            "woff" => Some(Self::Woff),
            "woff2" => Some(Self::Woff2),
            _ => None,
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::OpenType => "application/vnd.ms-opentype",
            Self::TrueType => "application/font-sfnt",
            Self::Woff => "application/font-woff",
            Self::Woff2 => "font/woff2",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    pub id: Id,
    pub path: String,
    pub data: Vec<u8>,
    pub image_type: ImageType,
}

#[derive(Debug, Clone)]
pub struct Stylesheet {
    pub id: Id,
    pub path: String,
    pub contents: String,
}

#[derive(Debug, Clone)]
pub struct Script {
    pub id: Id,
    pub path: String,
    pub contents: String,
}

#[derive(Debug, Clone)]
pub struct Font {
    pub id: Id,
    pub path: String,
    pub data: Vec<u8>,
    pub format: FontFormat,
}

/// An XHTML content document. Every document is part of the spine.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Id,
    pub path: String,
    pub contents: String,
    /// Explicit spine position; documents added without one get 0.
    pub order: i32,
    /// Position among all documents at the time it was added.
    pub insertion_index: usize,
}

/// Documents in reading order: by explicit order, then by insertion.
pub fn spine_order(documents: &[Document]) -> Vec<&Document> {
    let mut sorted: Vec<&Document> = documents.iter().collect();
    sorted.sort_by_key(|d| (d.order, d.insertion_index));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image::RgbImage::new(2, 2)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_sniff_png() {
        assert_eq!(ImageType::sniff(&png_bytes()).unwrap(), ImageType::Png);
        assert_eq!(ImageType::Png.media_type(), "image/png");
    }

    #[test]
    fn test_sniff_rejects_text() {
        assert!(ImageType::sniff(b"definitely not an image").is_err());
        assert!(ImageType::sniff(b"").is_err());
    }

    #[test]
    fn test_sniff_rejects_truncated_png() {
        let png = png_bytes();
        assert!(ImageType::sniff(&png[..12]).is_err());
    }

    #[test]
    fn test_font_format_from_path() {
        assert_eq!(FontFormat::from_path("fonts/a.otf"), Some(FontFormat::OpenType));
        assert_eq!(FontFormat::from_path("fonts/A.TTF"), Some(FontFormat::TrueType));
        assert_eq!(FontFormat::from_path("b.woff2"), Some(FontFormat::Woff2));
        assert_eq!(FontFormat::from_path("b.pfb"), None);
        assert_eq!(FontFormat::from_path("otf"), None);
    }

    #[test]
    fn test_spine_order_is_stable() {
        let doc = |n: usize, order: i32| Document {
            id: Id::from(format!("xhtml{}", n + 1).as_str()),
            path: format!("{n}.xhtml"),
            contents: String::new(),
            order,
            insertion_index: n,
        };
        let docs = vec![doc(0, 5), doc(1, 1), doc(2, 5)];
        let ids: Vec<_> = spine_order(&docs).iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["xhtml2", "xhtml1", "xhtml3"]);
    }
}
