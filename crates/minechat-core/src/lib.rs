//! Core types for the minechat client.
//!
//! This crate holds the protocol primitives and carries no I/O: the line
//! codec, account credentials, the events handed to a front end, and the
//! error taxonomy the connection supervisor inspects.

pub mod codec;
mod credentials;
mod error;
mod event;

pub use credentials::Credentials;
pub use error::{ChatError, Severity};
pub use event::{DisplayEvent, Liveness, LivenessLabel, StreamRole};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Nickname shown while no authenticated session exists.
pub const UNKNOWN_NICKNAME: &str = "unknown";

/// Lifecycle state of one stream (read or send).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Connection attempt in progress.
    Initiated,
    /// Socket open and usable.
    Established,
    /// Socket gone; a reconnect will follow.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Initiated => "initiated",
            ConnectionState::Established => "established",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}
