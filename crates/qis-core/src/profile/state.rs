//! Profile detection state machine.

use std::fmt;

/// Where profile path detection stands in this process.
///
/// `Idle` → `Detecting` → `Detected` (terminal) or back to `Idle` on a miss.
/// Starts as `Idle`, or directly `Detected` when a stored path is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProfileState {
    /// Nothing running; eligible for a probe.
    #[default]
    Idle,
    /// A probe download is in flight.
    Detecting,
    /// A path is known. Further detection is a no-op.
    Detected { path: String },
}

impl ProfileState {
    pub fn is_detecting(&self) -> bool {
        matches!(self, ProfileState::Detecting)
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            ProfileState::Detected { path } => Some(path),
            _ => None,
        }
    }

    /// Moves `Idle` to `Detecting`. Returns `false` (and changes nothing)
    /// from any other state.
    pub(super) fn try_begin(&mut self) -> bool {
        match self {
            ProfileState::Idle => {
                *self = ProfileState::Detecting;
                true
            }
            ProfileState::Detecting | ProfileState::Detected { .. } => false,
        }
    }

    /// Ends a probe. A found path makes the state terminal; otherwise the
    /// detector is idle again. A state that is already `Detected` is kept.
    pub(super) fn finish(&mut self, found: Option<String>) {
        if matches!(self, ProfileState::Detected { .. }) {
            return;
        }
        *self = match found {
            Some(path) => ProfileState::Detected { path },
            None => ProfileState::Idle,
        };
    }

    /// Adopts a path loaded from storage unless one is already known.
    /// Returns whether the state changed.
    pub(super) fn adopt(&mut self, path: String) -> bool {
        if matches!(self, ProfileState::Detected { .. }) {
            return false;
        }
        *self = ProfileState::Detected { path };
        true
    }
}

impl fmt::Display for ProfileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileState::Idle => f.write_str("idle"),
            ProfileState::Detecting => f.write_str("detecting"),
            ProfileState::Detected { path } => write!(f, "detected ({path})"),
        }
    }
}
