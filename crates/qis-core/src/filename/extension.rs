//! Image extension inference from URL text or `data:` MIME types.
//!
//! Everything here is a lossy guess: no request is made to learn the real
//! content type, and anything unrecognised becomes `png`.

use std::fmt;

/// Extension tokens the saver knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageExtension {
    Jpg,
    #[default]
    Png,
    Gif,
    Webp,
    Svg,
    Bmp,
    Avif,
    Ico,
    Tiff,
}

impl ImageExtension {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageExtension::Jpg => "jpg",
            ImageExtension::Png => "png",
            ImageExtension::Gif => "gif",
            ImageExtension::Webp => "webp",
            ImageExtension::Svg => "svg",
            ImageExtension::Bmp => "bmp",
            ImageExtension::Avif => "avif",
            ImageExtension::Ico => "ico",
            ImageExtension::Tiff => "tiff",
        }
    }
}

impl fmt::Display for ImageExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `data:` prefixes, checked in order.
const DATA_URI_RULES: &[(&str, ImageExtension)] = &[
    ("data:image/jpeg", ImageExtension::Jpg),
    ("data:image/png", ImageExtension::Png),
    ("data:image/gif", ImageExtension::Gif),
    ("data:image/webp", ImageExtension::Webp),
    ("data:image/svg+xml", ImageExtension::Svg),
    ("data:image/bmp", ImageExtension::Bmp),
    ("data:image/avif", ImageExtension::Avif),
];

/// Substring markers for plain URLs, checked in order against the lowercased URL.
const URL_MARKER_RULES: &[(&[&str], ImageExtension)] = &[
    (&[".jpg", ".jpeg"], ImageExtension::Jpg),
    (&[".png"], ImageExtension::Png),
    (&[".gif"], ImageExtension::Gif),
    (&[".webp"], ImageExtension::Webp),
    (&[".svg"], ImageExtension::Svg),
    (&[".bmp"], ImageExtension::Bmp),
    (&[".avif"], ImageExtension::Avif),
    (&[".ico"], ImageExtension::Ico),
    (&[".tiff", ".tif"], ImageExtension::Tiff),
];

/// MIME subtypes (lowercase) of `image/*` that map to a known extension.
const MIME_SUBTYPES: &[(&str, ImageExtension)] = &[
    ("jpeg", ImageExtension::Jpg),
    ("jpg", ImageExtension::Jpg),
    ("png", ImageExtension::Png),
    ("gif", ImageExtension::Gif),
    ("webp", ImageExtension::Webp),
    ("svg+xml", ImageExtension::Svg),
    ("bmp", ImageExtension::Bmp),
    ("x-icon", ImageExtension::Ico),
    ("tiff", ImageExtension::Tiff),
    ("avif", ImageExtension::Avif),
];

/// Guesses the most plausible image extension for `url`.
///
/// `data:` URLs are matched by MIME prefix; anything else by case-insensitive
/// substring markers, so query noise such as `?v=2` does not matter. The first
/// matching rule wins and `png` is the fallback.
pub fn guess_extension(url: &str) -> ImageExtension {
    if url.starts_with("data:") {
        return DATA_URI_RULES
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix))
            .map(|(_, ext)| *ext)
            .unwrap_or_default();
    }

    let lower = url.to_lowercase();
    URL_MARKER_RULES
        .iter()
        .find(|(markers, _)| markers.iter().any(|m| lower.contains(m)))
        .map(|(_, ext)| *ext)
        .unwrap_or_default()
}

/// Maps an `image/<subtype>` subtype to its extension, `png` when unknown.
pub fn extension_from_mime_subtype(subtype: &str) -> ImageExtension {
    MIME_SUBTYPES
        .iter()
        .find(|(s, _)| *s == subtype)
        .map(|(_, ext)| *ext)
        .unwrap_or_default()
}
