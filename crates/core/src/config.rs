// Client Configuration
// Loaded by infra (config crate); core only defines the shape and defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::port::process_runner::{DEFAULT_MAX_BUFFER, DEFAULT_TIMEOUT};
use crate::port::{KillSignal, OutputEncoding, RunOptions};

/// Program name (or absolute path) for every external tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub device_id: String,
    pub device_info: String,
    pub installer: String,
    pub diagnostics: String,
    pub enter_recovery: String,
    pub recovery: String,
    pub name: String,
    pub crash_report: String,
    pub syslog: String,
    pub mktemp: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            device_id: "idevice_id".to_string(),
            device_info: "ideviceinfo".to_string(),
            installer: "ideviceinstaller".to_string(),
            diagnostics: "idevicediagnostics".to_string(),
            enter_recovery: "ideviceenterrecovery".to_string(),
            recovery: "irecovery".to_string(),
            name: "idevicename".to_string(),
            crash_report: "idevicecrashreport".to_string(),
            syslog: "idevicesyslog".to_string(),
            mktemp: "mktemp".to_string(),
        }
    }
}

/// Top-level client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub tools: ToolPaths,
    pub timeout_ms: u64,
    pub max_buffer: usize,
    /// Signal name, e.g. "SIGTERM"
    pub kill_signal: String,
    pub encoding: OutputEncoding,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tools: ToolPaths::default(),
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            max_buffer: DEFAULT_MAX_BUFFER,
            kill_signal: KillSignal::Term.to_string(),
            encoding: OutputEncoding::Utf8,
        }
    }
}

impl ClientConfig {
    /// Default bounds applied to every request/response operation
    ///
    /// # Errors
    /// - AppError::Config for an unknown signal name or a zero timeout/buffer
    pub fn run_options(&self) -> Result<RunOptions> {
        if self.timeout_ms == 0 {
            return Err(AppError::Config("timeout_ms must be positive".to_string()));
        }
        if self.max_buffer == 0 {
            return Err(AppError::Config("max_buffer must be positive".to_string()));
        }
        let kill_signal: KillSignal = self.kill_signal.parse().map_err(AppError::Config)?;
        Ok(RunOptions {
            encoding: self.encoding,
            timeout: Duration::from_millis(self.timeout_ms),
            max_buffer: self.max_buffer,
            kill_signal,
            cwd: None,
            env: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_options() {
        let options = ClientConfig::default().run_options().unwrap();
        assert_eq!(options, RunOptions::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"timeout_ms": 500, "tools": {"syslog": "/opt/bin/idevicesyslog"}}"#)
                .unwrap();
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.tools.syslog, "/opt/bin/idevicesyslog");
        assert_eq!(config.tools.device_info, "ideviceinfo");
        assert_eq!(config.max_buffer, DEFAULT_MAX_BUFFER);
    }

    #[test]
    fn test_rejects_unknown_signal() {
        let config = ClientConfig {
            kill_signal: "SIGUSR9".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.run_options(), Err(AppError::Config(_))));
    }
}
