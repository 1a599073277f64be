// imobile Infrastructure - System Adapters
// Implements: ProcessRunner, StreamSpawner, PropertyDecoder, LineClassifier

pub mod config_loader;
pub mod pattern_classifier;
pub mod plist_decoder;
mod signal;
pub mod subprocess_runner;
pub mod subprocess_spawner;
pub mod telemetry;

use std::sync::Arc;

use imobile_core::port::time_provider::SystemTimeProvider;
use imobile_core::{ClientConfig, DeviceClient, Result};

pub use config_loader::{default_config_path, load_config};
pub use pattern_classifier::PatternClassifier;
pub use plist_decoder::PlistDecoder;
pub use subprocess_runner::SubprocessRunner;
pub use subprocess_spawner::SubprocessSpawner;
pub use telemetry::init_tracing;

/// Device client wired to the real tools on this host
///
/// # Errors
/// - AppError::Config if the configured bounds are invalid
pub fn system_client(config: &ClientConfig) -> Result<DeviceClient> {
    DeviceClient::from_config(
        Arc::new(SubprocessRunner::new()),
        Arc::new(PlistDecoder::new()),
        Arc::new(SubprocessSpawner::new()),
        Arc::new(SystemTimeProvider),
        config,
    )
}
