// Streaming subprocess spawner
// reason: tokio child with piped stdout, read chunk by chunk until EOF
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info, warn};

use imobile_core::port::{
    KillSignal, ProcessError, ProcessFailure, StreamSpawner, StreamingProcess,
};

use crate::signal::send_signal;
use crate::subprocess_runner::DEFAULT_GRACE_PERIOD;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Spawns long-lived children (e.g. `idevicesyslog`) with piped stdout.
/// No timeout and no output cap; the consumer decides when to stop.
pub struct SubprocessSpawner {
    grace_period: Duration,
}

impl SubprocessSpawner {
    pub fn new() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }
}

impl Default for SubprocessSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSpawner for SubprocessSpawner {
    fn spawn(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<Box<dyn StreamingProcess>, ProcessError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProcessError::new(program, ProcessFailure::Spawn(e.to_string())))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ProcessError::new(program, ProcessFailure::Spawn("stdout not captured".to_string()))
        })?;

        debug!(program = %program, pid = ?child.id(), "Streaming process spawned");

        Ok(Box::new(ChildStream {
            program: program.to_string(),
            child,
            stdout: Some(stdout),
            buf: vec![0u8; READ_CHUNK_SIZE],
            terminated: false,
            grace_period: self.grace_period,
        }))
    }
}

/// One spawned child and its stdout pipe
struct ChildStream {
    program: String,
    child: Child,
    stdout: Option<ChildStdout>,
    buf: Vec<u8>,
    terminated: bool,
    grace_period: Duration,
}

impl ChildStream {
    fn io_error(&self, e: std::io::Error) -> ProcessError {
        ProcessError::new(&self.program, ProcessFailure::Io(e.to_string()))
    }
}

#[async_trait]
impl StreamingProcess for ChildStream {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ProcessError> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };
        match stdout.read(&mut self.buf).await {
            Ok(0) => {
                self.stdout = None;
                Ok(None)
            }
            Ok(n) => Ok(Some(self.buf[..n].to_vec())),
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn terminate(&mut self) -> Result<(), ProcessError> {
        if self.terminated {
            return Ok(());
        }
        self.terminated = true;
        self.stdout = None;

        if let Some(status) = self.child.try_wait().map_err(|e| self.io_error(e))? {
            debug!(program = %self.program, status = %status, "Streaming process already exited");
            return Ok(());
        }

        send_signal(&mut self.child, KillSignal::Term);
        let waited = tokio::time::timeout(self.grace_period, self.child.wait()).await;
        match waited {
            Ok(Ok(status)) => {
                info!(program = %self.program, status = %status, "Streaming process terminated");
                Ok(())
            }
            Ok(Err(e)) => Err(self.io_error(e)),
            Err(_) => {
                warn!(program = %self.program, "Streaming process ignored SIGTERM, sending SIGKILL");
                self.child.kill().await.map_err(|e| self.io_error(e))
            }
        }
    }
}
