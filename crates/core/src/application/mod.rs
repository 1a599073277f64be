// Application Layer - Device use cases

pub mod device_client;
pub mod log_stream;

// Re-exports
pub use device_client::DeviceClient;
pub use log_stream::LogStreamSession;
