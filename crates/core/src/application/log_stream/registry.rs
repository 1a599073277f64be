// Subscriber Registry
// Explicit fan-out list; Close is delivered at most once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::domain::{LogEvent, LogRecord};

#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<LogEvent>>>,
    closed: AtomicBool,
}

impl SubscriberRegistry {
    /// Register a subscriber. After close it only ever sees `Close`.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<LogEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.lock();
        if self.closed.load(Ordering::SeqCst) {
            let _ = tx.send(LogEvent::Close);
        } else {
            subscribers.push(tx);
        }
        rx
    }

    pub fn publish_log(&self, record: LogRecord) {
        self.lock()
            .retain(|tx| tx.send(LogEvent::Log(record.clone())).is_ok());
    }

    /// Publish the terminal notification. Returns false if already closed.
    pub fn publish_close(&self) -> bool {
        let mut subscribers = self.lock();
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        for tx in subscribers.drain(..) {
            let _ = tx.send(LogEvent::Close);
        }
        true
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<LogEvent>>> {
        // A panicking subscriber send cannot leave the list inconsistent
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
