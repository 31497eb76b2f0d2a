//! Queues shared between the engine and the front end.
//!
//! Both are unbounded FIFOs created once at startup and handed to whoever
//! needs them; nothing here is global.

use minechat_core::DisplayEvent;
use tokio::sync::mpsc;

/// Producer side of the display-event queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Display {
    tx: mpsc::UnboundedSender<DisplayEvent>,
}

impl Display {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DisplayEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn publish(&self, event: DisplayEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("display closed; event dropped");
        }
    }
}

/// The outbound message queue.
///
/// Owned by the supervisor, above any single epoch, so messages that were
/// queued but not yet dequeued survive a reconnect.
#[derive(Debug)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl Outbox {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// A handle for enqueueing messages, e.g. from the input surface.
    pub fn sender(&self) -> mpsc::UnboundedSender<String> {
        self.tx.clone()
    }

    pub(crate) fn split(&mut self) -> (&mpsc::UnboundedSender<String>, &mut mpsc::UnboundedReceiver<String>) {
        (&self.tx, &mut self.rx)
    }
}

impl Default for Outbox {
    fn default() -> Self {
        Self::new()
    }
}
