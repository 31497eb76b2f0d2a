//! Connection supervisor: runs one epoch at a time, forever.
//!
//! An epoch is the read pump, the send pump, the watchdog and the keep-alive
//! pulse joined as one unit. The first member to fail cancels the others;
//! their sockets are closed before the supervisor decides whether to back off
//! and retry or to give up.

use crate::channel::{Display, Outbox};
use crate::config::ClientConfig;
use crate::history::History;
use crate::pump::{ReadPump, SendPump, keep_alive};
use crate::watchdog;
use minechat_core::{ChatError, ConnectionState, DisplayEvent, UNKNOWN_NICKNAME};
use std::fmt;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::Instrument;

/// Where the supervisor is in its retry cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Backoff,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
            LinkState::Backoff => "backoff",
        };
        f.write_str(s)
    }
}

pub struct Supervisor {
    config: ClientConfig,
    display: Display,
    history: History,
    outbox: Outbox,
    link: watch::Sender<LinkState>,
}

impl Supervisor {
    pub fn new(config: ClientConfig, display: Display, history: History) -> Self {
        let (link, _) = watch::channel(LinkState::Disconnected);
        Self {
            config,
            display,
            history,
            outbox: Outbox::new(),
            link,
        }
    }

    /// Handle for queueing outbound messages. Queued messages outlive
    /// reconnects.
    pub fn outbox(&self) -> mpsc::UnboundedSender<String> {
        self.outbox.sender()
    }

    pub fn link_state(&self) -> watch::Receiver<LinkState> {
        self.link.subscribe()
    }

    /// Reconnect until a fatal error. Only returns with that error.
    pub async fn run(mut self) -> Result<(), ChatError> {
        let mut epoch: u64 = 0;
        loop {
            epoch += 1;
            self.link.send_replace(LinkState::Connecting);
            tracing::info!(epoch, host = %self.config.host, "connecting");

            let span = tracing::info_span!("epoch", epoch);
            let Err(err) = self.run_epoch().instrument(span).await else {
                continue;
            };

            if err.is_fatal() {
                tracing::error!(epoch, err = %err, "giving up");
                self.link.send_replace(LinkState::Disconnected);
                return Err(err);
            }

            tracing::warn!(epoch, err = %err, backoff = ?self.config.timeouts.backoff, "reconnecting");
            self.link.send_replace(LinkState::Backoff);
            self.reset_observers();
            tokio::time::sleep(self.config.timeouts.backoff).await;
        }
    }

    async fn run_epoch(&mut self) -> Result<(), ChatError> {
        let timeouts = self.config.timeouts;
        let (heartbeat, watchdog) = watchdog::channel(timeouts.watchdog);
        let (authorized_tx, authorized_rx) = oneshot::channel();
        let (outbox_tx, outbox_rx) = self.outbox.split();

        let read = ReadPump {
            endpoint: self.config.read_endpoint(),
            read_timeout: timeouts.read,
            display: self.display.clone(),
            history: self.history.clone(),
            heartbeat: heartbeat.clone(),
        };
        let send = SendPump {
            endpoint: self.config.write_endpoint(),
            token: self.config.token.clone(),
            display: self.display.clone(),
            history: self.history.clone(),
            heartbeat,
            link: &self.link,
        };

        tokio::try_join!(
            read.run(authorized_rx),
            send.run(outbox_rx, authorized_tx),
            watchdog.run(),
            keep_alive(outbox_tx.clone(), timeouts.keep_alive, self.link.subscribe()),
        )?;
        Ok(())
    }

    fn reset_observers(&self) {
        self.display
            .publish(DisplayEvent::ReadConnectionChanged(ConnectionState::Initiated));
        self.display
            .publish(DisplayEvent::SendConnectionChanged(ConnectionState::Initiated));
        self.display
            .publish(DisplayEvent::NicknameChanged(UNKNOWN_NICKNAME.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn failed_attempts_leave_no_pulses_behind() {
        // Accepts every connection and never says a word.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                held.push(stream);
            }
        });

        let config = ClientConfig {
            host: "127.0.0.1".into(),
            read_port: port,
            write_port: port,
            token: "abc123".into(),
            timeouts: Timeouts {
                read: Duration::from_secs(5),
                watchdog: Duration::from_millis(300),
                keep_alive: Duration::from_millis(50),
                backoff: Duration::from_millis(10),
            },
        };
        let (display, _events) = Display::channel();
        let (history, _writer) = History::open("/nonexistent/never-written.log");
        let mut supervisor = Supervisor::new(config, display, history);
        supervisor.outbox().send("kept".into()).unwrap();

        for _ in 0..3 {
            let err = supervisor.run_epoch().await.unwrap_err();
            assert!(matches!(err, ChatError::WatchdogTimeout(_)), "{err}");
        }

        let (_, queued) = supervisor.outbox.split();
        assert_eq!(queued.try_recv().unwrap(), "kept");
        assert!(queued.try_recv().is_err());
    }
}
