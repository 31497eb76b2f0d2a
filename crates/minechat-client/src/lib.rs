//! Self-healing chat client for minechat-style servers.
//!
//! Two independent TCP streams against one host: the read stream carries the
//! broadcast, the write stream takes an authenticated handshake followed by
//! one connection per outbound message. A [`Supervisor`] keeps both alive,
//! tearing everything down and reconnecting whenever either side or the
//! inactivity watchdog reports a failure.

mod channel;
mod config;
mod credentials;
pub mod handshake;
pub mod history;
mod pump;
mod session;
mod supervisor;
pub mod watchdog;

pub use channel::{Display, Outbox};
pub use config::{ClientConfig, ConfigError, Timeouts};
pub use credentials::{CredentialStore, register_account};
pub use history::{History, HistoryWriter};
pub use pump::{ReadPump, SendPump, keep_alive, submit};
pub use session::{Endpoint, Session, with_session};
pub use supervisor::{LinkState, Supervisor};
pub use watchdog::{Heartbeat, Watchdog};

pub use minechat_core::{ChatError, ConnectionState, Credentials, DisplayEvent, Severity};
