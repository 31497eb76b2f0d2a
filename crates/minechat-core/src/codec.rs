//! Newline-delimited text codec.
//!
//! Every unit on the wire is one UTF-8 line terminated by `\n`. Handshake
//! replies are single-line JSON documents.

use crate::Credentials;
use serde::Deserialize;

/// Replace characters that would break line framing.
///
/// Newlines become a single space, tabs become four spaces.
pub fn sanitize(text: &str) -> String {
    text.replace('\n', " ").replace('\t', "    ")
}

/// Encode one outbound unit: sanitized text plus the terminating `\n`.
pub fn encode_line(text: &str) -> Vec<u8> {
    let mut out = sanitize(text).into_bytes();
    out.push(b'\n');
    out
}

/// Decode one received line.
///
/// Invalid UTF-8 sequences are dropped rather than replaced. The trailing
/// `\n` and an optional `\r` are stripped.
pub fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    raw.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Outcome of parsing a handshake reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The server accepted and described the account.
    Account {
        nickname: String,
        token: Option<String>,
    },
    /// The server answered with a falsy document (`null`, `{}`, `""`, ...).
    Rejected,
}

/// Error decoding a handshake reply.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReplyError {
    #[error("reply is not JSON: {0}")]
    NotJson(String),
    #[error("reply has unexpected shape: {0}")]
    Shape(String),
}

#[derive(Deserialize)]
struct AccountReply {
    nickname: String,
    #[serde(default, alias = "account_hash")]
    token: Option<String>,
}

/// Parse the server's JSON reply to a token or a registration request.
pub fn parse_reply(line: &str) -> Result<Reply, ReplyError> {
    let value: serde_json::Value =
        serde_json::from_str(line.trim()).map_err(|e| ReplyError::NotJson(e.to_string()))?;

    if is_falsy(&value) {
        return Ok(Reply::Rejected);
    }

    let reply: AccountReply =
        serde_json::from_value(value).map_err(|e| ReplyError::Shape(e.to_string()))?;
    Ok(Reply::Account {
        nickname: reply.nickname,
        token: reply.token,
    })
}

impl Reply {
    /// Turn an accepted reply into credentials, keeping `sent_token` when
    /// the server did not echo one back.
    pub fn into_credentials(self, sent_token: &str) -> Option<Credentials> {
        match self {
            Reply::Account { nickname, token } => Some(Credentials::new(
                nickname,
                token.unwrap_or_else(|| sent_token.to_string()),
            )),
            Reply::Rejected => None,
        }
    }
}

fn is_falsy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_flattens_newlines_and_tabs() {
        assert_eq!(sanitize("a\nb\tc"), "a b    c");
        assert_eq!(sanitize("plain"), "plain");
    }

    #[test]
    fn encode_appends_single_newline() {
        assert_eq!(encode_line("hi\nthere"), b"hi there\n");
        assert_eq!(encode_line(""), b"\n");
    }

    #[test]
    fn decode_strips_terminator() {
        assert_eq!(decode_line(b"Hello\r\n"), "Hello");
        assert_eq!(decode_line(b"Hello\n"), "Hello");
        assert_eq!(decode_line(b"no newline"), "no newline");
    }

    #[test]
    fn decode_drops_invalid_utf8() {
        assert_eq!(decode_line(b"ok\xff\xfe!\n"), "ok!");
        assert_eq!(decode_line("привет\n".as_bytes()), "привет");
    }

    #[test]
    fn reply_with_nickname_only() {
        let reply = parse_reply("{\"nickname\": \"Max\"}\n").unwrap();
        assert_eq!(
            reply,
            Reply::Account {
                nickname: "Max".into(),
                token: None
            }
        );
        let creds = reply.into_credentials("abc123").unwrap();
        assert_eq!(creds.nickname, "Max");
        assert_eq!(creds.token, "abc123");
    }

    #[test]
    fn reply_accepts_account_hash_alias() {
        let reply = parse_reply(r#"{"nickname": "Max", "account_hash": "f00d"}"#).unwrap();
        let creds = reply.into_credentials("ignored").unwrap();
        assert_eq!(creds.token, "f00d");
    }

    #[test]
    fn falsy_replies_are_rejections() {
        for line in ["null", "{}", "false", "\"\"", "[]", "0"] {
            assert_eq!(parse_reply(line).unwrap(), Reply::Rejected, "{line}");
        }
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(parse_reply("Hello"), Err(ReplyError::NotJson(_))));
        assert!(matches!(parse_reply("true"), Err(ReplyError::Shape(_))));
        assert!(matches!(
            parse_reply(r#"{"name": "x"}"#),
            Err(ReplyError::Shape(_))
        ));
    }
}
