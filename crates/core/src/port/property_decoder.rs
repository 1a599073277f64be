// Property Decoder Port
// Bytes -> property tree. The parser itself is an adapter (plist crate).

use crate::domain::{DecodeError, PropertyValue};

/// Structured-output decoder
///
/// Must not mutate or retain its input.
pub trait PropertyDecoder: Send + Sync {
    /// Decode one XML or binary property-list document
    ///
    /// # Errors
    /// - DecodeError::Malformed if the bytes are not a property list
    fn decode(&self, document: &[u8]) -> Result<PropertyValue, DecodeError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock decoder: maps exact documents to canned trees
    #[derive(Default)]
    pub struct CannedDecoder {
        documents: Mutex<HashMap<Vec<u8>, PropertyValue>>,
    }

    impl CannedDecoder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(self, document: impl AsRef<[u8]>, value: PropertyValue) -> Self {
            self.documents
                .lock()
                .unwrap()
                .insert(document.as_ref().to_vec(), value);
            self
        }
    }

    impl PropertyDecoder for CannedDecoder {
        fn decode(&self, document: &[u8]) -> Result<PropertyValue, DecodeError> {
            self.documents
                .lock()
                .unwrap()
                .get(document)
                .cloned()
                .ok_or_else(|| {
                    DecodeError::Malformed(format!(
                        "no canned document for {:?}",
                        String::from_utf8_lossy(document)
                    ))
                })
        }
    }
}
