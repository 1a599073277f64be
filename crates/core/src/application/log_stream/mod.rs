// Log Stream Session
// One long-lived `idevicesyslog` process per device, republished as LogEvents.
//
// Lifecycle: Created -> Streaming -> Closed. Closing always terminates the
// owned process before `Close` is published.
//
// Best-effort by intent: lines the classifier cannot match are dropped and
// never end the session.

mod close;
mod framing;
mod registry;

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{DeviceId, LogEvent, LogRecord, SessionState};
use crate::error::{AppError, Result};
use crate::port::{Classification, LineClassifier, StreamSpawner, StreamingProcess, TimeProvider};

use close::{close_channel, CloseSender, CloseToken};
use framing::{split_keeping_terminators, Utf8ChunkDecoder};
use registry::SubscriberRegistry;

/// Category tag handed to the classifier with every line
pub const LOG_CATEGORY: &str = "log";

/// Why the pump stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    EndOfStream,
    ReadError,
    Requested,
}

/// Live syslog capture for one device
pub struct LogStreamSession {
    device: DeviceId,
    process: Option<Box<dyn StreamingProcess>>,
    classifier: Arc<dyn LineClassifier>,
    time_provider: Arc<dyn TimeProvider>,
    registry: Arc<SubscriberRegistry>,
    state: Arc<watch::Sender<SessionState>>,
    close_tx: CloseSender,
    close_token: Option<CloseToken>,
    pump: Option<JoinHandle<()>>,
}

impl LogStreamSession {
    /// Spawn the stream process for `device`. The session starts in
    /// `Created`; register subscribers, then call [`start`](Self::start).
    ///
    /// # Errors
    /// - AppError::Process if the program cannot be spawned
    pub fn spawn(
        device: DeviceId,
        spawner: &dyn StreamSpawner,
        program: &str,
        classifier: Arc<dyn LineClassifier>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Result<Self> {
        let args = vec!["-u".to_string(), device.to_string()];
        let process = spawner.spawn(program, &args)?;

        info!(
            device = %device,
            program = %program,
            pid = ?process.id(),
            "Log stream process spawned"
        );

        let (close_tx, close_token) = close_channel();
        let (state, _) = watch::channel(SessionState::Created);

        Ok(Self {
            device,
            process: Some(process),
            classifier,
            time_provider,
            registry: Arc::new(SubscriberRegistry::default()),
            state: Arc::new(state),
            close_tx,
            close_token: Some(close_token),
            pump: None,
        })
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Register a subscriber; events are delivered in order.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<LogEvent> {
        self.registry.subscribe()
    }

    /// Live subscribers (dropped receivers are pruned on the next publish)
    pub fn subscriber_count(&self) -> usize {
        self.registry.subscriber_count()
    }

    /// Begin consuming the process output (`Created -> Streaming`).
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    /// - AppError::InvalidState if the session was already started or closed
    pub fn start(&mut self) -> Result<()> {
        if self.state() != SessionState::Created {
            return Err(AppError::InvalidState(format!(
                "cannot start log stream in state {}",
                self.state()
            )));
        }
        let (Some(process), Some(close_token)) = (self.process.take(), self.close_token.take())
        else {
            return Err(AppError::InvalidState(
                "log stream process already taken".to_string(),
            ));
        };

        self.state.send_replace(SessionState::Streaming);
        info!(device = %self.device, "Log stream started");

        let pump = Pump {
            device: self.device.clone(),
            process,
            classifier: self.classifier.clone(),
            time_provider: self.time_provider.clone(),
            registry: self.registry.clone(),
            state: self.state.clone(),
        };
        self.pump = Some(tokio::spawn(pump.run(close_token)));
        Ok(())
    }

    /// Terminate the process and publish `Close` (no-op once closed).
    pub async fn close(&mut self) {
        match self.state() {
            SessionState::Closed => {}
            SessionState::Created => {
                if let Some(mut process) = self.process.take() {
                    terminate(&self.device, process.as_mut()).await;
                }
                self.registry.publish_close();
                self.state.send_replace(SessionState::Closed);
                info!(device = %self.device, "Log stream closed before start");
            }
            SessionState::Streaming => {
                self.close_tx.request();
                self.wait_closed().await;
            }
        }
    }

    /// Resolve once the session reached `Closed`
    pub async fn wait_closed(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state == SessionState::Closed).await;
    }
}

impl Drop for LogStreamSession {
    fn drop(&mut self) {
        // A streaming pump observes the dropped CloseSender and shuts down on its own.
        if self.state() == SessionState::Created {
            self.registry.publish_close();
        }
    }
}

/// Background task state
struct Pump {
    device: DeviceId,
    process: Box<dyn StreamingProcess>,
    classifier: Arc<dyn LineClassifier>,
    time_provider: Arc<dyn TimeProvider>,
    registry: Arc<SubscriberRegistry>,
    state: Arc<watch::Sender<SessionState>>,
}

impl Pump {
    async fn run(mut self, mut close_token: CloseToken) {
        let mut decoder = Utf8ChunkDecoder::default();
        let mut published = 0usize;

        let reason = loop {
            tokio::select! {
                _ = close_token.wait() => break CloseReason::Requested,
                chunk = self.process.next_chunk() => match chunk {
                    Ok(Some(bytes)) => {
                        let text = decoder.push(&bytes);
                        published += self.dispatch(&text);
                    }
                    Ok(None) => break CloseReason::EndOfStream,
                    Err(e) => {
                        warn!(device = %self.device, error = %e, "Log stream read failed");
                        break CloseReason::ReadError;
                    }
                },
            }
        };

        if reason != CloseReason::Requested {
            let rest = decoder.finish();
            if !rest.is_empty() {
                published += self.dispatch(&rest);
            }
        }

        terminate(&self.device, self.process.as_mut()).await;
        self.registry.publish_close();
        self.state.send_replace(SessionState::Closed);

        info!(
            device = %self.device,
            reason = ?reason,
            records = published,
            "Log stream closed"
        );
    }

    /// Classify every token of one decoded chunk; returns records published
    fn dispatch(&self, text: &str) -> usize {
        let mut published = 0;
        for token in split_keeping_terminators(text) {
            match self.classifier.classify(token, LOG_CATEGORY) {
                Classification::Matched(fields) => {
                    self.registry.publish_log(LogRecord {
                        category: LOG_CATEGORY.to_string(),
                        fields,
                        line: token.to_string(),
                        received_at_ms: self.time_provider.now_millis(),
                    });
                    published += 1;
                }
                Classification::NoMatch => {
                    if !token.trim().is_empty() {
                        debug!(device = %self.device, line = %token, "Unclassified log line dropped");
                    }
                }
            }
        }
        published
    }
}

async fn terminate(device: &DeviceId, process: &mut dyn StreamingProcess) {
    if let Err(e) = process.terminate().await {
        warn!(device = %device, error = %e, "Failed to terminate log stream process");
    }
}
