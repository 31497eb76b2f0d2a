//! The long-running loops of one epoch: read pump, send pump, keep-alive.

use crate::channel::Display;
use crate::handshake;
use crate::history::History;
use crate::session::{Endpoint, Session, with_session};
use crate::supervisor::LinkState;
use crate::watchdog::Heartbeat;
use minechat_core::{ChatError, ConnectionState, DisplayEvent, LivenessLabel};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, MissedTickBehavior};

/// Pulls broadcast lines off the read stream.
pub struct ReadPump {
    pub endpoint: Endpoint,
    pub read_timeout: Duration,
    pub display: Display,
    pub history: History,
    pub heartbeat: Heartbeat,
}

impl ReadPump {
    /// Wait for the send pump to authorise, then read until the connection
    /// fails. Never returns `Ok`.
    pub async fn run(self, authorized: oneshot::Receiver<()>) -> Result<(), ChatError> {
        if authorized.await.is_err() {
            // The send pump failed first; its error is already tearing the
            // epoch down.
            return std::future::pending().await;
        }

        let ReadPump {
            endpoint,
            read_timeout,
            display,
            history,
            heartbeat,
        } = self;
        display.publish(DisplayEvent::ReadConnectionChanged(ConnectionState::Initiated));

        let events = display.clone();
        let result = with_session(&endpoint, move |session| {
            Box::pin(pump_lines(session, read_timeout, events, history, heartbeat))
        })
        .await;

        if let Err(e) = &result {
            tracing::error!(peer = %endpoint, err = %e, "read stream failed");
            display.publish(DisplayEvent::ReadConnectionChanged(ConnectionState::Closed));
        }
        result
    }
}

async fn pump_lines(
    session: &mut Session,
    read_timeout: Duration,
    display: Display,
    history: History,
    heartbeat: Heartbeat,
) -> Result<(), ChatError> {
    display.publish(DisplayEvent::ReadConnectionChanged(ConnectionState::Established));
    loop {
        let line = time::timeout(read_timeout, session.read_line())
            .await
            .map_err(|_| ChatError::ReadTimeout(read_timeout))??;
        heartbeat.beat(LivenessLabel::MessageReceived);
        history.append(line.as_str());
        display.publish(DisplayEvent::Message(line));
    }
}

/// Authorises on the write stream, then drains the outbox.
pub struct SendPump<'a> {
    pub endpoint: Endpoint,
    pub token: String,
    pub display: Display,
    pub history: History,
    pub heartbeat: Heartbeat,
    pub link: &'a watch::Sender<LinkState>,
}

impl SendPump<'_> {
    /// Never returns `Ok`. `InvalidToken` comes back untouched so the
    /// supervisor can tell it apart from transport failures.
    pub async fn run(
        self,
        outbox: &mut mpsc::UnboundedReceiver<String>,
        authorized: oneshot::Sender<()>,
    ) -> Result<(), ChatError> {
        let result = self.pump(outbox, authorized).await;
        if let Err(e) = &result {
            if !e.is_fatal() {
                tracing::error!(peer = %self.endpoint, err = %e, "send stream failed");
            }
            self.display
                .publish(DisplayEvent::SendConnectionChanged(ConnectionState::Closed));
        }
        result
    }

    async fn pump(
        &self,
        outbox: &mut mpsc::UnboundedReceiver<String>,
        authorized: oneshot::Sender<()>,
    ) -> Result<(), ChatError> {
        self.display
            .publish(DisplayEvent::SendConnectionChanged(ConnectionState::Initiated));

        let token = self.token.clone();
        let display = self.display.clone();
        let credentials = with_session(&self.endpoint, move |session| {
            Box::pin(async move {
                display.publish(DisplayEvent::SendConnectionChanged(
                    ConnectionState::Established,
                ));
                handshake::authorise(session, &token).await
            })
        })
        .await?;

        self.link.send_replace(LinkState::Connected);
        self.display
            .publish(DisplayEvent::NicknameChanged(credentials.nickname.clone()));
        let greeting = format!("Authorization done. User {}", credentials.nickname);
        self.history.append(greeting.as_str());
        self.display.publish(DisplayEvent::Message(greeting));
        self.heartbeat.beat(LivenessLabel::AuthorizationDone);
        let _ = authorized.send(());

        loop {
            let message = outbox.recv().await.ok_or(ChatError::QueueClosed)?;
            let message = message.trim().to_string();
            let label = if message.is_empty() {
                LivenessLabel::Ping
            } else {
                self.display.publish(DisplayEvent::Message(message.clone()));
                self.history.append(message.as_str());
                LivenessLabel::MessageSent
            };
            submit(&self.endpoint, message).await?;
            self.heartbeat.beat(label);
        }
    }
}

/// Deliver one message over its own connection.
pub async fn submit(endpoint: &Endpoint, message: String) -> Result<(), ChatError> {
    with_session(endpoint, move |session| {
        Box::pin(async move {
            session.write_line(&message).await?;
            tracing::debug!(%message, "submitted");
            Ok(())
        })
    })
    .await
}

/// Push an empty message into the outbox every `period`, starting once the
/// link reports `Connected`.
///
/// The outbox outlives the epoch, so nothing may be queued before
/// authorisation.
pub async fn keep_alive(
    outbox: mpsc::UnboundedSender<String>,
    period: Duration,
    mut link: watch::Receiver<LinkState>,
) -> Result<(), ChatError> {
    if link
        .wait_for(|state| *state == LinkState::Connected)
        .await
        .is_err()
    {
        // The supervisor owns the sender and outlives every epoch.
        return std::future::pending().await;
    }

    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        outbox.send(String::new()).map_err(|_| ChatError::QueueClosed)?;
    }
}
