// Port Layer - Interfaces for external dependencies

pub mod line_classifier;
pub mod process_runner;
pub mod property_decoder;
pub mod stream_spawner;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use line_classifier::{Classification, LineClassifier};
pub use process_runner::{
    KillSignal, OutputEncoding, ProcessError, ProcessFailure, ProcessOutput, ProcessRunner,
    RunOptions,
};
pub use property_decoder::PropertyDecoder;
pub use stream_spawner::{StreamSpawner, StreamingProcess};
pub use time_provider::TimeProvider;
