// Device Identifier (UDID / hardware serial)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

/// Legacy UDID: 40 lowercase hex characters
static LEGACY_UDID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{40}$").expect("legacy udid regex must compile"));

/// Newer hardware: 8 + '-' + 16 uppercase alphanumerics
static HYPHENATED_UDID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z0-9]{8}-[A-Z0-9]{16}$").expect("hyphenated udid regex must compile")
});

/// Opaque token naming one physical device.
///
/// Only obtainable through [`DeviceId::parse`], so holding one proves the
/// lexical grammar was checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Pure predicate over arbitrary strings
    pub fn is_valid(token: &str) -> bool {
        LEGACY_UDID_RE.is_match(token) || HYPHENATED_UDID_RE.is_match(token)
    }

    /// Validate and wrap a token
    ///
    /// # Errors
    /// - AppError::InvalidIdentifier if the token matches neither shape
    pub fn parse(token: impl AsRef<str>) -> Result<Self, AppError> {
        let token = token.as_ref();
        if Self::is_valid(token) {
            Ok(Self(token.to_string()))
        } else {
            Err(AppError::InvalidIdentifier(token.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the `XXXXXXXX-XXXXXXXXXXXXXXXX` shape
    pub fn is_hyphenated(&self) -> bool {
        self.0.contains('-')
    }

    /// Recovery-mode chip id argument (`0x` + lowercased suffix after the hyphen).
    ///
    /// Returns `None` for 40-hex identifiers, which carry no such suffix.
    pub fn ecid_hex(&self) -> Option<String> {
        self.0
            .split_once('-')
            .map(|(_, suffix)| format!("0x{}", suffix.to_lowercase()))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DeviceId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(AppError::InvalidIdentifier(value))
        }
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl std::str::FromStr for DeviceId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
