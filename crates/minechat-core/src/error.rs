//! Error taxonomy shared by every component below the supervisor.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Whether the supervisor may retry after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Tear the epoch down, back off, reconnect.
    Recoverable,
    /// Stop the whole program; reconnecting cannot help.
    Fatal,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("connection error: {0}")]
    Connection(#[from] io::Error),
    #[error("connection closed by peer")]
    ConnectionClosed,
    #[error("no data received within {0:?}")]
    ReadTimeout(Duration),
    #[error("no liveness signal within {0:?}")]
    WatchdogTimeout(Duration),
    #[error("the token was rejected by the server")]
    InvalidToken,
    #[error("malformed credential response: {0}")]
    MalformedCredentials(String),
    #[error("registration of {0:?} was rejected by the server")]
    RegistrationRejected(String),
    #[error("credential file {}: {source}", path.display())]
    CredentialStore {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("outbound message queue closed")]
    QueueClosed,
}

impl ChatError {
    pub fn severity(&self) -> Severity {
        match self {
            ChatError::Connection(_)
            | ChatError::ConnectionClosed
            | ChatError::ReadTimeout(_)
            | ChatError::WatchdogTimeout(_) => Severity::Recoverable,
            ChatError::InvalidToken
            | ChatError::MalformedCredentials(_)
            | ChatError::RegistrationRejected(_)
            | ChatError::CredentialStore { .. }
            | ChatError::QueueClosed => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}
