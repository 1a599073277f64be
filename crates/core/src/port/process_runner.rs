// Process Runner Port
// Bounded, one-shot execution of an external tool

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default wall-clock limit per call (30s)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default per-stream capture limit (256 MiB)
pub const DEFAULT_MAX_BUFFER: usize = 256 * 1024 * 1024;

/// Text decoding applied to captured output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputEncoding {
    /// Invalid sequences are replaced with U+FFFD
    #[default]
    Utf8,
    /// One byte per char
    Latin1,
}

impl OutputEncoding {
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            OutputEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            OutputEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

/// Signal delivered when a call is terminated for timeout or overflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillSignal {
    #[default]
    #[serde(rename = "SIGTERM")]
    Term,
    #[serde(rename = "SIGKILL")]
    Kill,
    #[serde(rename = "SIGINT")]
    Int,
    #[serde(rename = "SIGHUP")]
    Hup,
    #[serde(rename = "SIGQUIT")]
    Quit,
}

impl fmt::Display for KillSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KillSignal::Term => "SIGTERM",
            KillSignal::Kill => "SIGKILL",
            KillSignal::Int => "SIGINT",
            KillSignal::Hup => "SIGHUP",
            KillSignal::Quit => "SIGQUIT",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for KillSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().trim_start_matches("SIG") {
            "TERM" => Ok(KillSignal::Term),
            "KILL" => Ok(KillSignal::Kill),
            "INT" => Ok(KillSignal::Int),
            "HUP" => Ok(KillSignal::Hup),
            "QUIT" => Ok(KillSignal::Quit),
            _ => Err(format!("unsupported kill signal: {s}")),
        }
    }
}

/// Resource bounds and environment for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub encoding: OutputEncoding,
    /// Wall-clock budget for the whole call, termination grace included
    pub timeout: Duration,
    /// Max bytes captured from either stream
    pub max_buffer: usize,
    pub kill_signal: KillSignal,
    /// Working directory override (None = inherited)
    pub cwd: Option<PathBuf>,
    /// Full environment replacement (None = inherited)
    pub env: Option<HashMap<String, String>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            encoding: OutputEncoding::Utf8,
            timeout: DEFAULT_TIMEOUT,
            max_buffer: DEFAULT_MAX_BUFFER,
            kill_signal: KillSignal::Term,
            cwd: None,
            env: None,
        }
    }
}

impl RunOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_buffer(mut self, max_buffer: usize) -> Self {
        self.max_buffer = max_buffer;
        self
    }

    pub fn with_kill_signal(mut self, kill_signal: KillSignal) -> Self {
        self.kill_signal = kill_signal;
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }
}

/// Captured output of a successful call
///
/// `stdout` is the text decoded per [`OutputEncoding`]; the undecoded bytes
/// are kept for binary documents such as binary property lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    stdout_bytes: Vec<u8>,
}

impl ProcessOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        let stdout = stdout.into();
        Self {
            stdout_bytes: stdout.as_bytes().to_vec(),
            stdout,
            stderr: stderr.into(),
        }
    }

    /// Replace the raw stdout bytes (text fields are left as decoded)
    pub fn with_stdout_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.stdout_bytes = bytes;
        self
    }

    /// stdout exactly as the process wrote it
    pub fn stdout_bytes(&self) -> &[u8] {
        &self.stdout_bytes
    }
}

/// Why a call failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessFailure {
    #[error("spawn failed: {0}")]
    Spawn(String),

    #[error("exited with status {}", .code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    ExitStatus { code: Option<i32> },

    #[error("terminated by signal {0}")]
    Signaled(i32),

    #[error("timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("output exceeded {limit} bytes")]
    MaxBufferExceeded { limit: usize },

    #[error("io error: {0}")]
    Io(String),
}

/// Failed invocation, carrying whatever output was captured
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{program}: {failure}")]
pub struct ProcessError {
    pub program: String,
    pub failure: ProcessFailure,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessError {
    pub fn new(program: impl Into<String>, failure: ProcessFailure) -> Self {
        Self {
            program: program.into(),
            failure,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self.stderr = stderr.into();
        self
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.failure, ProcessFailure::Timeout { .. })
    }
}

/// Process Runner trait
///
/// Implementations:
/// - SubprocessRunner: tokio child process with nix signal delivery
/// - mocks::RecordingRunner: scripted responses for tests
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` to completion within `options`' bounds
    ///
    /// # Errors
    /// - ProcessFailure::Spawn if the program cannot be started
    /// - ProcessFailure::ExitStatus / Signaled on abnormal exit
    /// - ProcessFailure::Timeout / MaxBufferExceeded after forced termination
    async fn run(
        &self,
        program: &str,
        args: &[String],
        options: &RunOptions,
    ) -> Result<ProcessOutput, ProcessError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// One recorded call
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCall {
        pub program: String,
        pub args: Vec<String>,
        pub options: RunOptions,
    }

    /// Mock runner: replays queued responses in order, records every call.
    /// An empty queue answers with empty successful output.
    #[derive(Clone, Default)]
    pub struct RecordingRunner {
        responses: Arc<Mutex<VecDeque<Result<ProcessOutput, ProcessError>>>>,
        calls: Arc<Mutex<Vec<RecordedCall>>>,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_stdout(&self, stdout: impl Into<String>) -> &Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(ProcessOutput::new(stdout, "")));
            self
        }

        /// Queue raw stdout; the text field gets the lossy UTF-8 rendering
        pub fn push_stdout_bytes(&self, bytes: impl Into<Vec<u8>>) -> &Self {
            let bytes = bytes.into();
            let text = OutputEncoding::Utf8.decode(&bytes);
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(ProcessOutput::new(text, "").with_stdout_bytes(bytes)));
            self
        }

        pub fn push_error(&self, error: ProcessError) -> &Self {
            self.responses.lock().unwrap().push_back(Err(error));
            self
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ProcessRunner for RecordingRunner {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            options: &RunOptions,
        ) -> Result<ProcessOutput, ProcessError> {
            self.calls.lock().unwrap().push(RecordedCall {
                program: program.to_string(),
                args: args.to_vec(),
                options: options.clone(),
            });
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ProcessOutput::default()))
        }
    }
}
