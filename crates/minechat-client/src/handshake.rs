//! Login and registration exchanges on the write stream.
//!
//! Both are strict half-duplex request/response: send one line, block on
//! exactly one reply line.

use crate::session::Session;
use minechat_core::codec::{self, Reply, ReplyError};
use minechat_core::{ChatError, Credentials};
use tokio::io::{AsyncRead, AsyncWrite};

/// Log in with `token`.
///
/// Returns the account on success. A falsy reply is [`ChatError::InvalidToken`];
/// a reply that is not a credentials document is
/// [`ChatError::MalformedCredentials`]. Both are fatal.
pub async fn authorise<R, W>(session: &mut Session<R, W>, token: &str) -> Result<Credentials, ChatError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let prompt = session.read_line().await?;
    tracing::debug!(%prompt, "login prompt");

    session.write_line(token).await?;
    tracing::debug!("token sent");

    let response = session.read_line().await?;
    match parse(&response)?.into_credentials(token) {
        Some(credentials) => {
            tracing::info!(nickname = %credentials.nickname, "authorised");
            Ok(credentials)
        }
        None => {
            tracing::error!("the token is invalid; check it or register again");
            Err(ChatError::InvalidToken)
        }
    }
}

/// Register a new account under `nickname`.
///
/// An empty first answer selects the registration branch on the server.
pub async fn register<R, W>(
    session: &mut Session<R, W>,
    nickname: &str,
) -> Result<Credentials, ChatError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    session.read_line().await?;
    session.write_line("").await?;

    session.read_line().await?;
    session.write_line(nickname).await?;

    let response = session.read_line().await?;
    match parse(&response)?.into_credentials("") {
        Some(credentials) if !credentials.token.is_empty() => {
            tracing::info!(nickname = %credentials.nickname, "registered");
            Ok(credentials)
        }
        _ => {
            tracing::error!(%nickname, "server did not issue a token");
            Err(ChatError::RegistrationRejected(nickname.to_string()))
        }
    }
}

fn parse(response: &str) -> Result<Reply, ChatError> {
    codec::parse_reply(response).map_err(|e: ReplyError| {
        tracing::error!(%response, err = %e, "unexpected handshake reply");
        ChatError::MalformedCredentials(response.to_string())
    })
}
