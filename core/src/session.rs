use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::null_as_default;

/// Backend session ids are GUIDs: 36 chars, hyphens at fixed offsets.
pub const SESSION_ID_LEN: usize = 36;

const HYPHEN_OFFSETS: [usize; 4] = [8, 13, 18, 23];

pub fn is_valid_session_id(value: &str) -> bool {
    SessionId::parse(value).is_ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(value: &str) -> Result<Self, SessionIdError> {
        if value.len() != SESSION_ID_LEN {
            return Err(SessionIdError::InvalidLength {
                expected: SESSION_ID_LEN,
                found: value.len(),
            });
        }
        for (idx, ch) in value.chars().enumerate() {
            if HYPHEN_OFFSETS.contains(&idx) {
                if ch != '-' {
                    return Err(SessionIdError::InvalidCharacter { ch, index: idx });
                }
            } else if !ch.is_ascii_hexdigit() {
                return Err(SessionIdError::InvalidCharacter { ch, index: idx });
            }
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for SessionId {
    type Err = SessionIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIdError {
    InvalidLength { expected: usize, found: usize },
    InvalidCharacter { ch: char, index: usize },
}

impl fmt::Display for SessionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionIdError::InvalidLength { expected, found } => {
                write!(f, "session id must be {expected} chars, got {found}")
            }
            SessionIdError::InvalidCharacter { ch, index } => {
                write!(f, "invalid character '{ch}' at position {index}")
            }
        }
    }
}

impl std::error::Error for SessionIdError {}

/// Lobby REST shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionData {
    pub id: String,
    pub description: Option<String>,
    pub board_id: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub player_ids: Vec<String>,
}

impl SessionData {
    pub fn has_started(&self) -> bool {
        self.start_time.is_some()
    }

    /// The first joined player hosts the lobby.
    pub fn host_id(&self) -> Option<&str> {
        self.player_ids.first().map(String::as_str)
    }
}
