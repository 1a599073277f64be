// Property-list decoder
// reason: the plist crate sniffs XML vs binary and parses both
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::time::SystemTime;

use imobile_core::domain::{DecodeError, PropertyValue};
use imobile_core::port::PropertyDecoder;

/// Decodes `ideviceinfo -x` / `ideviceinstaller -o xml` style documents
#[derive(Debug, Clone, Copy, Default)]
pub struct PlistDecoder;

impl PlistDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl PropertyDecoder for PlistDecoder {
    fn decode(&self, document: &[u8]) -> Result<PropertyValue, DecodeError> {
        let value = plist::Value::from_reader(Cursor::new(document))
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;
        Ok(convert(value))
    }
}

fn convert(value: plist::Value) -> PropertyValue {
    match value {
        plist::Value::Boolean(b) => PropertyValue::Boolean(b),
        plist::Value::Integer(i) => match (i.as_signed(), i.as_unsigned()) {
            (Some(signed), _) => PropertyValue::Integer(signed),
            (None, Some(unsigned)) => PropertyValue::Real(unsigned as f64),
            (None, None) => PropertyValue::String(format!("{i:?}")),
        },
        plist::Value::Real(r) => PropertyValue::Real(r),
        plist::Value::String(s) => PropertyValue::String(s),
        plist::Value::Date(date) => {
            let at: DateTime<Utc> = SystemTime::from(date).into();
            PropertyValue::Date(at.to_rfc3339_opts(SecondsFormat::Secs, true))
        }
        plist::Value::Data(bytes) => PropertyValue::Data(bytes),
        plist::Value::Array(items) => {
            PropertyValue::Array(items.into_iter().map(convert).collect())
        }
        plist::Value::Dictionary(dict) => PropertyValue::Dictionary(
            dict.into_iter()
                .map(|(key, value)| (key, convert(value)))
                .collect::<BTreeMap<_, _>>(),
        ),
        // Keyed-archiver references only show up in NSKeyedArchiver payloads
        plist::Value::Uid(uid) => PropertyValue::Integer(uid.get() as i64),
        #[allow(unreachable_patterns)]
        other => PropertyValue::String(format!("{other:?}")),
    }
}
