// imobile Core - Domain Logic, Ports & Device Services
// NO process, plist or regex-pattern adapters here: those are injected through ports

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{DeviceClient, LogStreamSession};
pub use config::{ClientConfig, ToolPaths};
pub use domain::DeviceId;
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
