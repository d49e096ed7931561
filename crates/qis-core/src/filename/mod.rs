//! Image URL modeling and filename derivation.
//!
//! Turns whatever `src` a page hands us (absolute URL, relative path, or
//! `data:` URI) into a local filename that carries an image extension. None
//! of this can fail: the last resort is `image<millis>.png`.

mod data_uri;
mod extension;
mod path;
mod percent;
mod sanitize;

pub use data_uri::{extension_for_data_uri, parse_base64_mime, DataUriMime};
pub use extension::{extension_from_mime_subtype, guess_extension, ImageExtension};
pub use path::{decode_segment, filename_from_raw, filename_from_url_path};
pub use percent::{percent_decode, percent_decode_bytes, PercentDecodeError};
pub use sanitize::{is_safe_filename, sanitize_filename};

use std::time::{SystemTime, UNIX_EPOCH};

/// Stem used when a name has to be synthesized.
const DEFAULT_STEM: &str = "image";

/// Milliseconds since the Unix epoch (0 if the clock is before it).
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Derives a local filename for an image URL using the current time.
///
/// # Examples
///
/// - `resolve_filename("https://x.com/a/b/c.jpg?x=1")` → `"c.jpg"`
/// - `resolve_filename("https://x.com/a/b/c")` → `"c.png"`
/// - `resolve_filename("https://x.com/a/b/")` → `"image1718000000000.png"`
pub fn resolve_filename(url: &str) -> String {
    resolve_filename_at(url, now_millis())
}

/// Same as [`resolve_filename`] with an explicit timestamp for synthesized names.
pub fn resolve_filename_at(url: &str, now_millis: u128) -> String {
    if url.starts_with("data:") {
        return synthesized(now_millis, extension_for_data_uri(url));
    }

    match filename_from_url_path(url) {
        Some(name) if name.is_empty() => synthesized(now_millis, guess_extension(url)),
        Some(name) if !name.contains('.') => format!("{}.{}", name, guess_extension(url)),
        Some(name) => name,
        None => {
            tracing::debug!("not an absolute URL, splitting raw text: {:?}", url);
            filename_from_raw(url)
                .unwrap_or_else(|| synthesized(now_millis, ImageExtension::Png))
        }
    }
}

fn synthesized(now_millis: u128, ext: ImageExtension) -> String {
    format!("{DEFAULT_STEM}{now_millis}.{ext}")
}
