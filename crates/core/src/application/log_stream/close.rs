// Session Close Token

use tokio::sync::watch;

/// Close request observed by the pump task
pub(crate) struct CloseToken {
    rx: watch::Receiver<bool>,
}

impl CloseToken {
    /// Wait for a close request. Also resolves when the sender is dropped,
    /// so dropping the session handle closes the stream.
    pub async fn wait(&mut self) {
        if *self.rx.borrow() {
            return;
        }
        let _ = self.rx.changed().await;
    }
}

/// Close request sender, owned by the session handle
pub(crate) struct CloseSender {
    tx: watch::Sender<bool>,
}

impl CloseSender {
    pub fn request(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a close channel
pub(crate) fn close_channel() -> (CloseSender, CloseToken) {
    let (tx, rx) = watch::channel(false);
    (CloseSender { tx }, CloseToken { rx })
}
