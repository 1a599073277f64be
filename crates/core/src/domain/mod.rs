// Domain Layer - Pure device-facing types and derivations

pub mod device_info;
pub mod error;
pub mod identifier;
pub mod log_record;
pub mod property;
pub mod request;

// Re-exports
pub use device_info::{Points, ScreenDetails, StorageDetails};
pub use error::DecodeError;
pub use identifier::DeviceId;
pub use log_record::{LogEvent, LogRecord, SessionState};
pub use property::{DeviceProperties, PropertyValue};
pub use request::{DiagnosticsRequest, PackageScope, PropertyQuery};
