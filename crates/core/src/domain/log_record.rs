// Log stream records and notifications

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One classified syslog line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Category tag passed to the classifier (always "log" for syslog sessions)
    pub category: String,
    /// Named captures of the matching pattern
    pub fields: BTreeMap<String, String>,
    /// The raw line as received
    pub line: String,
    /// Host receive time, epoch ms
    pub received_at_ms: i64,
}

impl LogRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Notification published to every subscriber of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Log(LogRecord),
    /// Terminal; published exactly once per session
    Close,
}

/// Log stream session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Created,
    Streaming,
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Created => write!(f, "CREATED"),
            SessionState::Streaming => write!(f, "STREAMING"),
            SessionState::Closed => write!(f, "CLOSED"),
        }
    }
}
