//! `data:` URI header parsing.

use lazy_static::lazy_static;
use regex::Regex;

use super::extension::{extension_from_mime_subtype, ImageExtension};

lazy_static! {
    static ref BASE64_MIME: Regex =
        Regex::new(r"(?i)^data:([a-z]+)/([a-z0-9.\-+]+);base64,").expect("static regex");
}

/// MIME type/subtype pair taken from a base64 `data:` URI header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUriMime {
    pub media_type: String,
    pub subtype: String,
}

/// Parses the MIME type of a `data:<type>/<subtype>;base64,` URI.
///
/// Returns `None` for anything else (no `;base64,` marker, missing subtype,
/// characters outside the accepted set).
pub fn parse_base64_mime(url: &str) -> Option<DataUriMime> {
    let caps = BASE64_MIME.captures(url)?;
    Some(DataUriMime {
        media_type: caps.get(1)?.as_str().to_string(),
        subtype: caps.get(2)?.as_str().to_string(),
    })
}

/// Extension for a `data:` URI used by the resolver.
///
/// Only an exact lowercase `image` media type is trusted; the subtype is
/// lowercased before lookup. Everything else falls back to `png`.
pub fn extension_for_data_uri(url: &str) -> ImageExtension {
    match parse_base64_mime(url) {
        Some(mime) if mime.media_type == "image" => {
            extension_from_mime_subtype(&mime.subtype.to_lowercase())
        }
        _ => ImageExtension::Png,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_and_subtype() {
        let mime = parse_base64_mime("data:image/svg+xml;base64,PHN2Zz4=").unwrap();
        assert_eq!(mime.media_type, "image");
        assert_eq!(mime.subtype, "svg+xml");
    }

    #[test]
    fn requires_base64_marker() {
        assert_eq!(parse_base64_mime("data:image/png,rawbytes"), None);
        assert_eq!(parse_base64_mime("data:;base64,AAAA"), None);
    }

    #[test]
    fn subtype_is_lowercased() {
        assert_eq!(extension_for_data_uri("data:image/JPEG;base64,AAAA"), ImageExtension::Jpg);
        assert_eq!(extension_for_data_uri("data:image/x-icon;base64,AAAA"), ImageExtension::Ico);
        assert_eq!(extension_for_data_uri("data:image/tiff;base64,AAAA"), ImageExtension::Tiff);
    }

    #[test]
    fn non_image_or_malformed_defaults_to_png() {
        assert_eq!(extension_for_data_uri("data:text/plain;base64,AAAA"), ImageExtension::Png);
        assert_eq!(extension_for_data_uri("data:IMAGE/gif;base64,AAAA"), ImageExtension::Png);
        assert_eq!(extension_for_data_uri("data:image/heic;base64,AAAA"), ImageExtension::Png);
        assert_eq!(extension_for_data_uri("data:garbage"), ImageExtension::Png);
    }
}
