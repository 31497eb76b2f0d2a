//! Line-based terminal front end.
//!
//! Chat lines go to stdout, status changes to stderr. Each line typed on
//! stdin is queued for sending; `/status` prints the supervisor state.

use minechat_client::{DisplayEvent, LinkState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

const STATUS_COMMAND: &str = "/status";

/// Where a rendered event belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Chat(String),
    Status(String),
}

pub fn render(event: &DisplayEvent) -> Rendered {
    match event {
        DisplayEvent::Message(text) => Rendered::Chat(text.clone()),
        DisplayEvent::NicknameChanged(nickname) => Rendered::Status(format!("* nickname: {nickname}")),
        DisplayEvent::ReadConnectionChanged(state) => {
            Rendered::Status(format!("* read stream: {state}"))
        }
        DisplayEvent::SendConnectionChanged(state) => {
            Rendered::Status(format!("* send stream: {state}"))
        }
    }
}

/// What to do with one line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Send(String),
    Status,
    Ignore,
}

pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Input::Ignore
    } else if trimmed == STATUS_COMMAND {
        Input::Status
    } else {
        Input::Send(line.to_string())
    }
}

/// Run until stdin closes or the display channel ends.
pub async fn run(
    mut events: mpsc::UnboundedReceiver<DisplayEvent>,
    outbox: mpsc::UnboundedSender<String>,
    link: watch::Receiver<LinkState>,
) -> anyhow::Result<()> {
    let output = async {
        while let Some(event) = events.recv().await {
            match render(&event) {
                Rendered::Chat(text) => println!("{text}"),
                Rendered::Status(text) => eprintln!("{text}"),
            }
        }
    };

    let input = async {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match parse_input(&line) {
                Input::Send(text) => outbox.send(text)?,
                Input::Status => eprintln!("* link: {}", *link.borrow()),
                Input::Ignore => {}
            }
        }
        anyhow::Ok(())
    };

    tokio::select! {
        () = output => Ok(()),
        res = input => res,
    }
}
