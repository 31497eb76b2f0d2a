//! Credential file storage and the registration entry point.

use crate::handshake;
use crate::session::{Endpoint, with_session};
use minechat_core::{ChatError, Credentials};
use std::io;
use std::path::{Path, PathBuf};

/// JSON file holding `{"nickname": ..., "token": ...}`.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load stored credentials, or `None` if the file does not exist.
    pub async fn load(&self) -> Result<Option<Credentials>, ChatError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.error(e)),
        };
        let credentials = serde_json::from_slice(&raw)
            .map_err(|e| self.error(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        Ok(Some(credentials))
    }

    pub async fn save(&self, credentials: &Credentials) -> Result<(), ChatError> {
        let json = serde_json::to_vec(credentials)
            .map_err(|e| self.error(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| self.error(e))?;
        tracing::info!(path = %self.path.display(), "nickname and token saved");
        Ok(())
    }

    fn error(&self, source: io::Error) -> ChatError {
        ChatError::CredentialStore {
            path: self.path.clone(),
            source,
        }
    }
}

/// Register `nickname` against the write stream and persist the result.
///
/// Nothing is written when the server refuses the registration.
pub async fn register_account(
    endpoint: &Endpoint,
    nickname: &str,
    store: &CredentialStore,
) -> Result<Credentials, ChatError> {
    let nickname = nickname.to_string();
    let credentials = with_session(endpoint, move |session| {
        Box::pin(async move { handshake::register(session, &nickname).await })
    })
    .await?;
    store.save(&credentials).await?;
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        store.save(&Credentials::new("Max", "abc123")).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"{"nickname":"Max","token":"abc123"}"#);
        assert_eq!(
            store.load().await.unwrap(),
            Some(Credentials::new("Max", "abc123"))
        );
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(
            store.load().await,
            Err(ChatError::CredentialStore { .. })
        ));
    }

    async fn registration_server(listener: TcpListener, reply: &'static [u8]) {
        let (stream, _) = listener.accept().await.unwrap();
        let (r, mut w) = stream.into_split();
        let mut r = BufReader::new(r);
        let mut line = String::new();
        w.write_all(b"Hello\n").await.unwrap();
        r.read_line(&mut line).await.unwrap();
        w.write_all(b"Nickname?\n").await.unwrap();
        r.read_line(&mut line).await.unwrap();
        w.write_all(reply).await.unwrap();
    }

    #[tokio::test]
    async fn registration_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = Endpoint::new("127.0.0.1", listener.local_addr().unwrap().port());
        tokio::spawn(registration_server(
            listener,
            b"{\"nickname\": \"Max\", \"account_hash\": \"abc123\"}\n",
        ));

        let creds = register_account(&endpoint, "Max", &store).await.unwrap();
        assert_eq!(creds, Credentials::new("Max", "abc123"));
        assert_eq!(store.load().await.unwrap(), Some(creds));
    }

    #[tokio::test]
    async fn rejected_registration_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = Endpoint::new("127.0.0.1", listener.local_addr().unwrap().port());
        tokio::spawn(registration_server(listener, b"null\n"));

        let err = register_account(&endpoint, "Max", &store).await.unwrap_err();
        assert!(matches!(err, ChatError::RegistrationRejected(_)));
        assert!(!store.path().exists());
    }
}
