// Per-operation request options

use serde::{Deserialize, Serialize};

/// `ideviceinfo` query modifiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyQuery {
    /// Only the basic value set (`-s`)
    pub simple: bool,
    /// Restrict to one domain (`-q DOMAIN`)
    pub domain: Option<String>,
}

impl PropertyQuery {
    pub fn domain(domain: impl Into<String>) -> Self {
        Self {
            simple: false,
            domain: Some(domain.into()),
        }
    }

    pub(crate) fn push_args(&self, args: &mut Vec<String>) {
        if self.simple {
            args.push("-s".to_string());
        }
        if let Some(domain) = self.domain.as_deref().filter(|d| !d.is_empty()) {
            args.push("-q".to_string());
            args.push(domain.to_string());
        }
    }
}

/// Which installed applications `ideviceinstaller` lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageScope {
    #[default]
    User,
    System,
    All,
}

impl PackageScope {
    /// Extra `-o` option selecting the scope; user scope is the tool default
    pub fn list_option(&self) -> Option<&'static str> {
        match self {
            PackageScope::User => None,
            PackageScope::System => Some("list_system"),
            PackageScope::All => Some("list_all"),
        }
    }
}

impl std::fmt::Display for PackageScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageScope::User => write!(f, "user"),
            PackageScope::System => write!(f, "system"),
            PackageScope::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for PackageScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(PackageScope::User),
            "system" => Ok(PackageScope::System),
            "all" => Ok(PackageScope::All),
            other => Err(format!("unknown package scope: {other}")),
        }
    }
}

/// `idevicediagnostics` sub-command and key filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsRequest {
    pub command: String,
    pub key: Option<String>,
}

impl Default for DiagnosticsRequest {
    fn default() -> Self {
        Self {
            command: "diagnostics".to_string(),
            key: Some("All".to_string()),
        }
    }
}

impl DiagnosticsRequest {
    pub fn new(command: impl Into<String>, key: Option<String>) -> Self {
        Self {
            command: command.into(),
            key,
        }
    }
}
