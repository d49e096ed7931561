//! Strict percent-decoding for URL path segments and `data:` payloads.

/// Why a percent-encoded string could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PercentDecodeError {
    /// `%` at this byte offset is not followed by two hex digits.
    #[error("malformed percent escape at byte {0}")]
    Malformed(usize),
    /// The decoded bytes are not valid UTF-8.
    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8,
}

/// Decodes every `%XX` escape and requires the result to be valid UTF-8.
///
/// Unlike a lenient decoder, a stray `%` or a broken multi-byte sequence is an
/// error; callers use that to tell "already decoded" names apart.
pub fn percent_decode(input: &str) -> Result<String, PercentDecodeError> {
    let bytes = percent_decode_bytes(input)?;
    String::from_utf8(bytes).map_err(|_| PercentDecodeError::InvalidUtf8)
}

/// Decodes `%XX` escapes into raw bytes without any UTF-8 requirement.
pub fn percent_decode_bytes(input: &str) -> Result<Vec<u8>, PercentDecodeError> {
    let raw = input.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let high = raw.get(i + 1).copied().and_then(hex_digit);
            let low = raw.get(i + 2).copied().and_then(hex_digit);
            match (high, low) {
                (Some(h), Some(l)) => out.push(h << 4 | l),
                _ => return Err(PercentDecodeError::Malformed(i)),
            }
            i += 3;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    Ok(out)
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_utf8_sequences() {
        assert_eq!(percent_decode("caf%C3%A9.jpg").unwrap(), "café.jpg");
        assert_eq!(percent_decode("a%20b").unwrap(), "a b");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(percent_decode("photo.png").unwrap(), "photo.png");
        assert_eq!(percent_decode("写真.png").unwrap(), "写真.png");
    }

    #[test]
    fn stray_percent_is_malformed() {
        assert_eq!(percent_decode("100%.jpg"), Err(PercentDecodeError::Malformed(3)));
        assert_eq!(percent_decode("end%4"), Err(PercentDecodeError::Malformed(3)));
    }

    #[test]
    fn broken_utf8_is_rejected() {
        assert_eq!(percent_decode("%C3.jpg"), Err(PercentDecodeError::InvalidUtf8));
    }

    #[test]
    fn bytes_variant_allows_binary() {
        assert_eq!(percent_decode_bytes("%FF%00").unwrap(), vec![0xFF, 0x00]);
    }
}
