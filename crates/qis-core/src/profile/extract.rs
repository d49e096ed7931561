//! Profile path extraction from a downloaded file's full path.
//!
//! Rules are tried in order and the first that yields a path wins.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WINDOWS_USERS_DIR: Regex =
        Regex::new(r"(?i)^([A-Z]:\\Users\\[^\\]+)").expect("static regex");
    static ref WINDOWS_DOWNLOADS_PARENT: Regex =
        Regex::new(r"(?i)^([A-Z]:.+)\\Downloads").expect("static regex");
    static ref POSIX_HOME: Regex =
        Regex::new(r"^(/home/[^/]+|/Users/[^/]+|/root)(?:/|$)").expect("static regex");
}

/// One named extraction rule.
pub struct ProfileRule {
    pub name: &'static str,
    pub extract: fn(&str) -> Option<String>,
}

/// Extraction rules in priority order.
pub const PROFILE_RULES: &[ProfileRule] = &[
    ProfileRule {
        name: "users-dir",
        extract: users_dir,
    },
    ProfileRule {
        name: "downloads-parent",
        extract: downloads_parent,
    },
    ProfileRule {
        name: "first-three-segments",
        extract: first_three_segments,
    },
    ProfileRule {
        name: "posix-home",
        extract: posix_home,
    },
];

/// Derives the user's profile directory from `full_path`, if any rule matches.
pub fn extract_profile_path(full_path: &str) -> Option<String> {
    PROFILE_RULES.iter().find_map(|rule| {
        let found = (rule.extract)(full_path)?;
        tracing::debug!("profile path rule {} matched: {}", rule.name, found);
        Some(found)
    })
}

/// `C:\Users\<name>` at the start of the path.
fn users_dir(path: &str) -> Option<String> {
    capture(&WINDOWS_USERS_DIR, path)
}

/// Everything before the last `\Downloads` on a drive-letter path.
fn downloads_parent(path: &str) -> Option<String> {
    capture(&WINDOWS_DOWNLOADS_PARENT, path)
}

/// First three backslash-separated segments, when there are at least three.
fn first_three_segments(path: &str) -> Option<String> {
    let parts: Vec<&str> = path.split('\\').collect();
    if parts.len() >= 3 {
        Some(parts[..3].join("\\"))
    } else {
        None
    }
}

/// `/home/<name>`, `/Users/<name>` or `/root` on Unix-like systems.
fn posix_home(path: &str) -> Option<String> {
    capture(&POSIX_HOME, path)
}

fn capture(re: &Regex, path: &str) -> Option<String> {
    re.captures(path)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_dir_rule() {
        assert_eq!(
            users_dir(r"C:\Users\alex\Downloads\profile_detect.tmp").as_deref(),
            Some(r"C:\Users\alex")
        );
        assert_eq!(
            users_dir(r"d:\users\Kim Lee\Desktop\x.tmp").as_deref(),
            Some(r"d:\users\Kim Lee")
        );
        assert_eq!(users_dir(r"E:\Data\Downloads\x.tmp"), None);
    }

    #[test]
    fn downloads_parent_rule() {
        assert_eq!(
            downloads_parent(r"E:\Profiles\alex\Downloads\profile_detect.tmp").as_deref(),
            Some(r"E:\Profiles\alex")
        );
        assert_eq!(downloads_parent(r"E:\Data\Pictures\x.tmp"), None);
    }

    #[test]
    fn first_three_segments_rule() {
        assert_eq!(
            first_three_segments(r"E:\Data\Pictures\x.tmp").as_deref(),
            Some(r"E:\Data\Pictures")
        );
        assert_eq!(first_three_segments(r"E:\x.tmp"), None);
        assert_eq!(first_three_segments("/home/alex/Downloads/x.tmp"), None);
    }

    #[test]
    fn posix_home_rule() {
        assert_eq!(
            posix_home("/home/alex/Downloads/profile_detect.tmp").as_deref(),
            Some("/home/alex")
        );
        assert_eq!(posix_home("/Users/kim/Downloads/x").as_deref(), Some("/Users/kim"));
        assert_eq!(posix_home("/root/Downloads/x").as_deref(), Some("/root"));
        assert_eq!(posix_home("/rootless/x"), None);
        assert_eq!(posix_home("/tmp/x"), None);
    }

    #[test]
    fn rules_apply_in_order() {
        // Matches both users-dir and downloads-parent; users-dir wins.
        assert_eq!(
            extract_profile_path(r"C:\Users\alex\Downloads\f.tmp").as_deref(),
            Some(r"C:\Users\alex")
        );
        // Greedy prefix: the last "\Downloads" decides.
        assert_eq!(
            extract_profile_path(r"F:\Downloads\old\Downloads\f.tmp").as_deref(),
            Some(r"F:\Downloads\old")
        );
        assert_eq!(
            extract_profile_path(r"\\server\share\f.tmp").as_deref(),
            Some(r"\\server")
        );
        assert_eq!(extract_profile_path("/tmp/qis/f.tmp"), None);
        assert_eq!(extract_profile_path("f.tmp"), None);
    }
}
