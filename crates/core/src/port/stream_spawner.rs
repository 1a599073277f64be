// Stream Spawner Port
// Long-lived processes whose stdout is consumed incrementally (no timeout, no cap)

use async_trait::async_trait;

use super::process_runner::ProcessError;

/// A running process with an open stdout stream
#[async_trait]
pub trait StreamingProcess: Send {
    /// OS process id, if still known
    fn id(&self) -> Option<u32>;

    /// Next chunk of stdout. `Ok(None)` signals end-of-data.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ProcessError>;

    /// Terminate the process and reap it. Idempotent.
    async fn terminate(&mut self) -> Result<(), ProcessError>;
}

/// Spawns streaming processes
///
/// Implementations:
/// - SubprocessSpawner: tokio child with piped stdout
/// - mocks::ScriptedSpawner: replays fixed chunks for tests
pub trait StreamSpawner: Send + Sync {
    /// Start `program` with piped stdout
    ///
    /// # Errors
    /// - ProcessFailure::Spawn if the program cannot be started
    fn spawn(&self, program: &str, args: &[String])
        -> Result<Box<dyn StreamingProcess>, ProcessError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Observable state shared between a ScriptedProcess and the test
    #[derive(Debug, Default)]
    pub struct ProcessTracker {
        terminated: AtomicBool,
        terminate_calls: AtomicUsize,
        spawned_with: Mutex<Option<(String, Vec<String>)>>,
    }

    impl ProcessTracker {
        pub fn is_terminated(&self) -> bool {
            self.terminated.load(Ordering::SeqCst)
        }

        pub fn terminate_calls(&self) -> usize {
            self.terminate_calls.load(Ordering::SeqCst)
        }

        pub fn spawned_with(&self) -> Option<(String, Vec<String>)> {
            self.spawned_with.lock().unwrap().clone()
        }
    }

    /// Mock process: yields its chunks, then either EOF or (when `hold_open`)
    /// waits until terminated.
    pub struct ScriptedProcess {
        chunks: VecDeque<Vec<u8>>,
        hold_open: bool,
        tracker: Arc<ProcessTracker>,
    }

    #[async_trait]
    impl StreamingProcess for ScriptedProcess {
        fn id(&self) -> Option<u32> {
            if self.tracker.is_terminated() {
                None
            } else {
                Some(4242)
            }
        }

        async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ProcessError> {
            if let Some(chunk) = self.chunks.pop_front() {
                return Ok(Some(chunk));
            }
            if self.hold_open {
                std::future::pending::<()>().await;
            }
            Ok(None)
        }

        async fn terminate(&mut self) -> Result<(), ProcessError> {
            self.tracker.terminate_calls.fetch_add(1, Ordering::SeqCst);
            self.tracker.terminated.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Mock spawner handing out one ScriptedProcess
    pub struct ScriptedSpawner {
        chunks: Mutex<Option<Vec<Vec<u8>>>>,
        hold_open: bool,
        tracker: Arc<ProcessTracker>,
        spawn_count: AtomicUsize,
    }

    impl ScriptedSpawner {
        /// Process that emits `chunks` then reaches end-of-data
        pub fn new(chunks: Vec<Vec<u8>>) -> Self {
            Self {
                chunks: Mutex::new(Some(chunks)),
                hold_open: false,
                tracker: Arc::new(ProcessTracker::default()),
                spawn_count: AtomicUsize::new(0),
            }
        }

        /// Process that emits `chunks` then stays open until terminated
        pub fn held_open(chunks: Vec<Vec<u8>>) -> Self {
            Self {
                hold_open: true,
                ..Self::new(chunks)
            }
        }

        pub fn tracker(&self) -> Arc<ProcessTracker> {
            self.tracker.clone()
        }

        pub fn spawn_count(&self) -> usize {
            self.spawn_count.load(Ordering::SeqCst)
        }
    }

    impl StreamSpawner for ScriptedSpawner {
        fn spawn(
            &self,
            program: &str,
            args: &[String],
        ) -> Result<Box<dyn StreamingProcess>, ProcessError> {
            self.spawn_count.fetch_add(1, Ordering::SeqCst);
            *self.tracker.spawned_with.lock().unwrap() = Some((program.to_string(), args.to_vec()));
            let chunks = self.chunks.lock().unwrap().take().unwrap_or_default();
            Ok(Box::new(ScriptedProcess {
                chunks: chunks.into(),
                hold_open: self.hold_open,
                tracker: self.tracker.clone(),
            }))
        }
    }
}
