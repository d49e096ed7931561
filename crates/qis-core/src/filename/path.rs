//! Filename extraction from URL path.

use super::percent::percent_decode;

/// Extracts the text after the final `/` of a parsed URL's path.
///
/// Returns `None` when `url` does not parse as an absolute URL. The segment
/// may be empty (`https://x.com/a/`). It is decoded via [`decode_segment`] and
/// cut at the first `?` and `#`.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let path = parsed.path();
    let segment = match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    };
    let decoded = decode_segment(segment);
    Some(strip_query_and_fragment(&decoded).to_string())
}

/// Last `/`-separated piece of a string that is not a parseable URL.
///
/// Only a trailing `?...` is removed. Returns `None` when nothing is left.
pub fn filename_from_raw(url: &str) -> Option<String> {
    let last = url.rsplit('/').next().unwrap_or(url);
    let name = match last.find('?') {
        Some(idx) => &last[..idx],
        None => last,
    };
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Decodes a path segment unless doing so would change an already-correct name.
///
/// The segment is decoded once and then again. Only when the second pass is a
/// no-op is the decoded form used; otherwise (a decode error, or a
/// double-encoded value that keeps changing) the raw segment is kept.
pub fn decode_segment(segment: &str) -> String {
    let once = match percent_decode(segment) {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!("keeping raw filename segment {:?}: {}", segment, e);
            return segment.to_string();
        }
    };
    match percent_decode(&once) {
        Ok(twice) if twice == once => once,
        Ok(_) => segment.to_string(),
        Err(e) => {
            tracing::debug!("keeping raw filename segment {:?}: {}", segment, e);
            segment.to_string()
        }
    }
}

fn strip_query_and_fragment(name: &str) -> &str {
    let name = name.split('?').next().unwrap_or(name);
    name.split('#').next().unwrap_or(name)
}
