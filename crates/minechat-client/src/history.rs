//! Append-only chat history file.
//!
//! Appends are fire-and-forget: callers push into an unbounded channel and a
//! single writer task owns the file. Write failures are logged, never
//! reported back.

use chrono::{DateTime, Local};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

const STAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Handle for appending to the history file. Cheap to clone.
#[derive(Debug, Clone)]
pub struct History {
    tx: mpsc::UnboundedSender<(String, DateTime<Local>)>,
}

/// The task that owns the history file. Runs until every [`History`]
/// handle is dropped.
#[derive(Debug)]
pub struct HistoryWriter {
    path: PathBuf,
    rx: mpsc::UnboundedReceiver<(String, DateTime<Local>)>,
}

impl History {
    pub fn open(path: impl Into<PathBuf>) -> (Self, HistoryWriter) {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = HistoryWriter {
            path: path.into(),
            rx,
        };
        (Self { tx }, writer)
    }

    pub fn append(&self, line: impl Into<String>) {
        self.append_at(line, Local::now());
    }

    pub fn append_at(&self, line: impl Into<String>, at: DateTime<Local>) {
        if self.tx.send((line.into(), at)).is_err() {
            tracing::trace!("history writer gone; entry dropped");
        }
    }
}

impl HistoryWriter {
    pub async fn run(mut self) {
        while let Some((line, at)) = self.rx.recv().await {
            if let Err(e) = self.write(&format_entry(&line, at)).await {
                tracing::warn!(path = %self.path.display(), err = %e, "history append failed");
            }
        }
    }

    async fn write(&self, entry: &str) -> io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await
    }
}

/// `[dd.mm.YYYY HH:MM:SS] line\n`
pub fn format_entry(line: &str, at: DateTime<Local>) -> String {
    format!("[{}] {}\n", at.format(STAMP_FORMAT), line.trim_end())
}

/// Read the whole history file to seed the display. A missing file yields
/// `None`.
pub async fn load(path: &Path) -> io::Result<Option<String>> {
    match tokio::fs::read(path).await {
        Ok(raw) => {
            let text = minechat_core::codec::decode_line(&raw);
            let text = text.trim();
            Ok((!text.is_empty()).then(|| text.to_string()))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn entry_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_entry("hi\n", at), "[09.03.2024 07:05:01] hi\n");
    }

    #[tokio::test]
    async fn appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.log");
        std::fs::write(&path, "[01.01.2024 00:00:00] old\n").unwrap();

        let (history, writer) = History::open(&path);
        let task = tokio::spawn(writer.run());
        let at = Local.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        history.append_at("A", at);
        history.append_at("B", at);
        drop(history);
        task.await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "[01.01.2024 00:00:00] old\n[09.03.2024 12:00:00] A\n[09.03.2024 12:00:00] B\n"
        );
    }

    #[tokio::test]
    async fn load_seeds_from_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.log");
        assert_eq!(load(&path).await.unwrap(), None);

        std::fs::write(&path, "[x] one\n[y] two\n").unwrap();
        assert_eq!(load(&path).await.unwrap().as_deref(), Some("[x] one\n[y] two"));
    }
}
