//! Filename sanitization for names that end up on a real filesystem.

/// Characters Windows refuses in a filename (plus both separators).
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest name we hand to the filesystem, in bytes.
const NAME_MAX: usize = 255;

/// Sanitizes a candidate filename so both Windows and Linux accept it.
///
/// - Replaces each `< > : " / \ | ? *` and control character with its own `_`
/// - Collapses runs of whitespace into one space
/// - Trims surrounding whitespace and dots
/// - Limits length to 255 bytes
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_space = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
            continue;
        }
        prev_space = false;
        if FORBIDDEN.contains(&c) || c.is_control() {
            out.push('_');
        } else {
            out.push(c);
        }
    }

    let trimmed = out.trim_matches(|c| c == ' ' || c == '.');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}

/// True when `name` can be used as-is: non-empty, not `.`/`..`, no forbidden
/// or control characters, within the length limit.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name.len() <= NAME_MAX
        && !name.chars().any(|c| FORBIDDEN.contains(&c) || c.is_control())
}
