//! Events flowing out of the connection engine.

use crate::ConnectionState;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Which of the two independent streams an event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRole {
    Read,
    Send,
}

/// Something for the front end to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    /// A chat line, inbound or outbound.
    Message(String),
    NicknameChanged(String),
    ReadConnectionChanged(ConnectionState),
    SendConnectionChanged(ConnectionState),
}

impl DisplayEvent {
    pub fn connection(role: StreamRole, state: ConnectionState) -> Self {
        match role {
            StreamRole::Read => DisplayEvent::ReadConnectionChanged(state),
            StreamRole::Send => DisplayEvent::SendConnectionChanged(state),
        }
    }
}

/// What happened to prove the connection is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessLabel {
    MessageSent,
    MessageReceived,
    AuthorizationDone,
    Ping,
}

impl fmt::Display for LivenessLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LivenessLabel::MessageSent => "message sent",
            LivenessLabel::MessageReceived => "message received",
            LivenessLabel::AuthorizationDone => "authorization done",
            LivenessLabel::Ping => "ping",
        };
        f.write_str(s)
    }
}

/// A timestamped liveness signal, consumed only by the watchdog.
#[derive(Debug, Clone, Copy)]
pub struct Liveness {
    pub label: LivenessLabel,
    pub at: SystemTime,
}

impl Liveness {
    pub fn now(label: LivenessLabel) -> Self {
        Self {
            label,
            at: SystemTime::now(),
        }
    }

    /// Whole seconds since the Unix epoch at which the signal was raised.
    pub fn unix_secs(&self) -> u64 {
        self.at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_read_naturally() {
        assert_eq!(LivenessLabel::AuthorizationDone.to_string(), "authorization done");
        assert_eq!(LivenessLabel::Ping.to_string(), "ping");
    }

    #[test]
    fn liveness_is_stamped_when_raised() {
        let before = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let signal = Liveness::now(LivenessLabel::MessageSent);
        let after = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        assert!((before..=after).contains(&signal.unix_secs()));

        let ancient = Liveness {
            label: LivenessLabel::Ping,
            at: UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000),
        };
        assert_eq!(ancient.unix_secs(), 1_700_000_000);
    }

    #[test]
    fn connection_event_by_role() {
        assert_eq!(
            DisplayEvent::connection(StreamRole::Send, ConnectionState::Established),
            DisplayEvent::SendConnectionChanged(ConnectionState::Established)
        );
    }
}
