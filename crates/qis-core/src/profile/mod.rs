//! Best-effort detection of the user's profile directory.
//!
//! The detected path is stored for later use and shown in diagnostics; no
//! save decision depends on it.

mod detector;
mod extract;
mod state;

pub use detector::{
    DetectionOutcome, ProfileDetector, DEFAULT_SETTLE_DELAY, PROBE_FILENAME, PROBE_FILE_URL,
};
pub use extract::{extract_profile_path, ProfileRule, PROFILE_RULES};
pub use state::ProfileState;
