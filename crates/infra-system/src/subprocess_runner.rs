// Subprocess runner implementation
// reason: tokio for async process management, nix for signal delivery
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::time::Instant as TokioInstant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{info, warn};

use imobile_core::port::{
    ProcessError, ProcessFailure, ProcessOutput, ProcessRunner, RunOptions,
};

use crate::signal::send_signal;

/// Time a terminated process gets to exit before SIGKILL (2s).
/// Taken out of the call's timeout, never added to it.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Read size per pipe poll
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// How a run ended, before output decoding
enum Outcome {
    Exited(ExitStatus),
    TimedOut,
    Overflow,
    Io(std::io::Error),
}

enum CaptureError {
    Overflow,
    Io(std::io::Error),
}

/// Subprocess runner
/// Spawns one child per call, captures both pipes under a byte cap and
/// enforces the wall-clock timeout.
pub struct SubprocessRunner {
    grace_period: Duration,
}

impl SubprocessRunner {
    /// Create a new subprocess runner
    ///
    /// # Example
    /// ```ignore
    /// let runner = SubprocessRunner::new();
    /// let output = runner.run("idevice_id", &["-l".into()], &RunOptions::default()).await?;
    /// ```
    pub fn new() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Override the SIGTERM -> SIGKILL escalation delay
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    fn build_command(program: &str, args: &[String], options: &RunOptions) -> Command {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &options.cwd {
            command.current_dir(cwd);
        }
        if let Some(env) = &options.env {
            command.env_clear().envs(env);
        }
        command
    }

    /// Grace reserved at the end of a `timeout` budget; at most half of it
    fn reserved_grace(&self, timeout: Duration) -> Duration {
        self.grace_period.min(timeout / 2)
    }

    /// Drive the child to completion, `soft_deadline` or overflow.
    /// Captured bytes stay in the buffers whatever the outcome.
    async fn supervise(
        child: &mut Child,
        stdout_buf: &mut Vec<u8>,
        stderr_buf: &mut Vec<u8>,
        options: &RunOptions,
        soft_deadline: TokioInstant,
    ) -> Outcome {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = options.max_buffer;

        let run = async {
            let captured = tokio::try_join!(
                read_capped(stdout, stdout_buf, limit),
                read_capped(stderr, stderr_buf, limit),
            );
            match captured {
                Ok(_) => match child.wait().await {
                    Ok(status) => Outcome::Exited(status),
                    Err(e) => Outcome::Io(e),
                },
                Err(CaptureError::Overflow) => Outcome::Overflow,
                Err(CaptureError::Io(e)) => Outcome::Io(e),
            }
        };

        tokio::select! {
            outcome = run => outcome,
            _ = tokio::time::sleep_until(soft_deadline) => Outcome::TimedOut,
        }
    }

    /// Deliver `kill_signal`, then SIGKILL if the child outlives the grace
    /// period or reaches `deadline`, whichever comes first
    async fn terminate(
        &self,
        program: &str,
        child: &mut Child,
        options: &RunOptions,
        deadline: TokioInstant,
    ) {
        if let Ok(Some(_)) = child.try_wait() {
            return;
        }

        info!(program = %program, pid = ?child.id(), signal = %options.kill_signal, "Terminating process");
        send_signal(child, options.kill_signal);

        let escalate_at = (TokioInstant::now() + self.grace_period).min(deadline);
        if tokio::time::timeout_at(escalate_at, child.wait())
            .await
            .is_err()
        {
            warn!(program = %program, pid = ?child.id(), "Process did not exit after signal, sending SIGKILL");
            if let Err(e) = child.kill().await {
                warn!(program = %program, error = %e, "SIGKILL failed");
            }
        }
    }
}

impl Default for SubprocessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for SubprocessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        options: &RunOptions,
    ) -> Result<ProcessOutput, ProcessError> {
        let started = Instant::now();
        let deadline = TokioInstant::from_std(started) + options.timeout;
        let soft_deadline = deadline - self.reserved_grace(options.timeout);

        info!(
            program = %program,
            args = ?args,
            timeout_ms = options.timeout.as_millis() as u64,
            "Starting subprocess"
        );

        let mut child = Self::build_command(program, args, options)
            .spawn()
            .map_err(|e| ProcessError::new(program, ProcessFailure::Spawn(e.to_string())))?;

        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        let outcome = Self::supervise(
            &mut child,
            &mut stdout_buf,
            &mut stderr_buf,
            options,
            soft_deadline,
        )
        .await;

        let failure = match outcome {
            Outcome::Exited(status) if status.success() => None,
            Outcome::Exited(status) => Some(exit_failure(status)),
            Outcome::TimedOut => {
                self.terminate(program, &mut child, options, deadline).await;
                Some(ProcessFailure::Timeout {
                    after: options.timeout,
                })
            }
            Outcome::Overflow => {
                self.terminate(program, &mut child, options, deadline).await;
                Some(ProcessFailure::MaxBufferExceeded {
                    limit: options.max_buffer,
                })
            }
            Outcome::Io(e) => {
                self.terminate(program, &mut child, options, deadline).await;
                Some(ProcessFailure::Io(e.to_string()))
            }
        };

        let stdout = options.encoding.decode(&stdout_buf);
        let stderr = options.encoding.decode(&stderr_buf);
        let duration_ms = started.elapsed().as_millis() as u64;

        match failure {
            None => {
                info!(
                    program = %program,
                    duration_ms = duration_ms,
                    stdout_bytes = stdout_buf.len(),
                    "Subprocess completed"
                );
                Ok(ProcessOutput::new(stdout, stderr).with_stdout_bytes(stdout_buf))
            }
            Some(failure) => {
                warn!(
                    program = %program,
                    duration_ms = duration_ms,
                    failure = %failure,
                    "Subprocess failed"
                );
                Err(ProcessError::new(program, failure).with_output(stdout, stderr))
            }
        }
    }
}

/// Read `reader` to EOF into `buf`, failing once more than `limit` bytes arrive.
/// On overflow `buf` holds exactly `limit` bytes.
async fn read_capped<R>(
    reader: Option<R>,
    buf: &mut Vec<u8>,
    limit: usize,
) -> Result<(), CaptureError>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(());
    };
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut chunk).await.map_err(CaptureError::Io)?;
        if n == 0 {
            return Ok(());
        }
        let room = limit.saturating_sub(buf.len());
        if n > room {
            buf.extend_from_slice(&chunk[..room]);
            return Err(CaptureError::Overflow);
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn exit_failure(status: ExitStatus) -> ProcessFailure {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ProcessFailure::Signaled(signal);
        }
    }
    ProcessFailure::ExitStatus {
        code: status.code(),
    }
}
