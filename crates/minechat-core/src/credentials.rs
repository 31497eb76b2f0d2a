//! Account credentials.

use serde::{Deserialize, Serialize};

/// A registered account: the nickname the server assigned and the token
/// used to log in as it.
///
/// Serialized form is the credential file: `{"nickname": ..., "token": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub nickname: String,
    #[serde(alias = "account_hash")]
    pub token: String,
}

impl Credentials {
    pub fn new(nickname: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            token: token.into(),
        }
    }
}
