// Regex line classifier
// reason: named-capture regexes loaded from YAML, so formats can change without a rebuild
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use imobile_core::port::{Classification, LineClassifier};
use imobile_core::{AppError, Result};

/// Built-in patterns for `idevicesyslog` output
const SYSLOG_PATTERNS: &str = include_str!("../patterns/syslog.yml");

/// Field holding the name of the pattern that matched
pub const PATTERN_FIELD: &str = "pattern";

#[derive(Debug, Deserialize)]
struct PatternFile {
    patterns: Vec<PatternEntry>,
}

#[derive(Debug, Deserialize)]
struct PatternEntry {
    name: String,
    regex: String,
    #[serde(default)]
    categories: Vec<String>,
}

#[derive(Debug)]
struct Pattern {
    name: String,
    regex: Regex,
    categories: Vec<String>,
}

impl Pattern {
    fn applies_to(&self, category: &str) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| c == category)
    }

    fn capture(&self, line: &str) -> Option<BTreeMap<String, String>> {
        let caps = self.regex.captures(line)?;
        let mut fields: BTreeMap<String, String> = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect();
        fields.insert(PATTERN_FIELD.to_string(), self.name.clone());
        Some(fields)
    }
}

/// Ordered list of named-capture patterns; first match wins
#[derive(Debug)]
pub struct PatternClassifier {
    patterns: Vec<Pattern>,
}

impl PatternClassifier {
    /// Classifier for the default `idevicesyslog` line formats
    ///
    /// # Errors
    /// - AppError::Config if the bundled pattern file is invalid
    pub fn idevicesyslog() -> Result<Self> {
        Self::from_yaml_str(SYSLOG_PATTERNS)
    }

    /// Parse a pattern document (`patterns: [{name, regex, categories}]`)
    ///
    /// # Errors
    /// - AppError::Config for invalid YAML, an empty list or a bad regex
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: PatternFile = serde_yaml::from_str(yaml)
            .map_err(|e| AppError::Config(format!("invalid pattern file: {e}")))?;
        if file.patterns.is_empty() {
            return Err(AppError::Config("pattern file has no patterns".to_string()));
        }

        let patterns = file
            .patterns
            .into_iter()
            .map(|entry| {
                let regex = Regex::new(&entry.regex).map_err(|e| {
                    AppError::Config(format!("pattern '{}' has an invalid regex: {e}", entry.name))
                })?;
                Ok(Pattern {
                    name: entry.name,
                    regex,
                    categories: entry.categories,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(count = patterns.len(), "Loaded log line patterns");
        Ok(Self { patterns })
    }

    /// Load a pattern document from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&yaml)
    }

    pub fn pattern_names(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.name.as_str()).collect()
    }
}

impl LineClassifier for PatternClassifier {
    fn classify(&self, line: &str, category: &str) -> Classification {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Classification::NoMatch;
        }
        self.patterns
            .iter()
            .filter(|p| p.applies_to(category))
            .find_map(|p| p.capture(line))
            .map_or(Classification::NoMatch, Classification::Matched)
    }
}
