// Line Classifier Port
// Raw text line -> structured record, or no match. Never an error.

use std::collections::BTreeMap;

/// Result of classifying one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Matched(BTreeMap<String, String>),
    NoMatch,
}

impl Classification {
    pub fn into_fields(self) -> Option<BTreeMap<String, String>> {
        match self {
            Classification::Matched(fields) => Some(fields),
            Classification::NoMatch => None,
        }
    }
}

/// Opaque line classifier injected into log stream sessions
///
/// Implementations:
/// - PatternClassifier: regex patterns loaded from YAML pattern data
/// - mocks::PrefixClassifier: matches lines by prefix
pub trait LineClassifier: Send + Sync {
    /// Classify `line` under `category` (e.g. "log")
    fn classify(&self, line: &str, category: &str) -> Classification;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Matches lines starting with a prefix; captures the remainder as `message`
    pub struct PrefixClassifier {
        prefix: String,
    }

    impl PrefixClassifier {
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
            }
        }
    }

    impl LineClassifier for PrefixClassifier {
        fn classify(&self, line: &str, category: &str) -> Classification {
            match line.strip_prefix(self.prefix.as_str()) {
                Some(rest) => {
                    let mut fields = BTreeMap::new();
                    fields.insert("message".to_string(), rest.trim().to_string());
                    fields.insert("category".to_string(), category.to_string());
                    Classification::Matched(fields)
                }
                None => Classification::NoMatch,
            }
        }
    }
}
