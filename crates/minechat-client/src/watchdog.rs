//! Inactivity watchdog.
//!
//! Detects half-open sockets that neither side has closed: if no liveness
//! signal arrives within the window, the connection is declared dead.

use minechat_core::{ChatError, Liveness, LivenessLabel};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;

/// Producer side of the liveness channel.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    tx: mpsc::UnboundedSender<Liveness>,
}

impl Heartbeat {
    pub fn beat(&self, label: LivenessLabel) {
        // The watchdog only goes away when the epoch is being torn down.
        let _ = self.tx.send(Liveness::now(label));
    }
}

/// Single consumer of liveness signals.
#[derive(Debug)]
pub struct Watchdog {
    pub(crate) rx: mpsc::UnboundedReceiver<Liveness>,
    window: Duration,
}

/// Create a fresh heartbeat/watchdog pair for one epoch.
pub fn channel(window: Duration) -> (Heartbeat, Watchdog) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Heartbeat { tx }, Watchdog { rx, window })
}

impl Watchdog {
    /// Wait for signals until one is late. Only ever returns an error, and
    /// only once.
    pub async fn run(mut self) -> Result<(), ChatError> {
        loop {
            match time::timeout(self.window, self.rx.recv()).await {
                Ok(Some(signal)) => {
                    tracing::debug!(
                        at = signal.unix_secs(),
                        label = %signal.label,
                        "connection alive: {}",
                        signal.label
                    );
                }
                Ok(None) => {
                    // Every producer is gone; nothing can arrive in time.
                    time::sleep(self.window).await;
                    return Err(self.expired());
                }
                Err(_) => return Err(self.expired()),
            }
        }
    }

    fn expired(&self) -> ChatError {
        tracing::warn!(window = ?self.window, "timeout elapsed without a liveness signal");
        ChatError::WatchdogTimeout(self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn steady_signals_never_time_out() {
        let window = Duration::from_secs(20);
        let (heartbeat, watchdog) = channel(window);
        let task = tokio::spawn(watchdog.run());

        for _ in 0..50 {
            time::sleep(Duration::from_secs(19)).await;
            heartbeat.beat(LivenessLabel::Ping);
        }
        assert!(!task.is_finished());
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn silence_times_out_exactly_once() {
        let window = Duration::from_secs(20);
        let (heartbeat, watchdog) = channel(window);
        heartbeat.beat(LivenessLabel::AuthorizationDone);

        let start = Instant::now();
        let err = watchdog.run().await.unwrap_err();
        assert!(matches!(err, ChatError::WatchdogTimeout(w) if w == window));
        let elapsed = start.elapsed();
        assert!(elapsed >= window && elapsed < window + Duration::from_secs(1));
        drop(heartbeat);
    }

    #[tokio::test(start_paused = true)]
    async fn each_signal_resets_the_deadline() {
        let window = Duration::from_secs(10);
        let (heartbeat, watchdog) = channel(window);
        let start = Instant::now();
        let task = tokio::spawn(watchdog.run());

        time::sleep(Duration::from_secs(8)).await;
        heartbeat.beat(LivenessLabel::MessageReceived);
        time::sleep(Duration::from_secs(8)).await;
        heartbeat.beat(LivenessLabel::MessageSent);

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ChatError::WatchdogTimeout(_)));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(26) && elapsed < Duration::from_secs(27));
    }
}
