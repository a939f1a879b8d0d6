//! Result of a single detector read.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tri-state answer to "is the target live right now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiveState {
    /// The target is broadcasting.
    Live,
    /// The target is not broadcasting.
    NotLive,
    /// No usable evidence this time. Callers must not read this as `NotLive`.
    Unknown,
}

impl LiveState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "LIVE",
            Self::NotLive => "NOT_LIVE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Whether the read carries information (`Live` or `NotLive`).
    pub fn is_definite(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for LiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detector read: the state plus the room id that was used, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveRead {
    pub state: LiveState,
    /// Room id the status query ran against (fresh or cached).
    pub room_id: Option<String>,
    /// Name of the strategy that settled the state.
    #[serde(skip)]
    pub source: Option<&'static str>,
}

impl LiveRead {
    pub fn new(state: LiveState, room_id: Option<String>, source: &'static str) -> Self {
        Self {
            state,
            room_id,
            source: Some(source),
        }
    }

    pub fn unknown(room_id: Option<String>) -> Self {
        Self {
            state: LiveState::Unknown,
            room_id,
            source: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.state == LiveState::Live
    }
}
