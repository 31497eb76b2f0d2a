//! Chat client.
//!
//! Run:
//!   minechat --host minechat.dvmn.org --token <hash>
//!
//! Without `--token` the token is taken from the credentials file written by
//! `minechat-register`.

use anyhow::Context;
use clap::Parser;
use minechat::console;
use minechat::settings::{ChatArgs, ChatSettings};
use minechat_client::{
    ChatError, ConfigError, CredentialStore, Display, DisplayEvent, History, Supervisor, history,
};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    minechat::init_logging();

    match run(ChatArgs::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if matches!(err.downcast_ref::<ChatError>(), Some(ChatError::InvalidToken)) => {
            eprintln!("Invalid token: the server rejected it. Check it or register again.");
            ExitCode::from(2)
        }
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: ChatArgs) -> anyhow::Result<()> {
    let settings = ChatSettings::resolve(args)?;

    let token = match settings.token.clone() {
        Some(token) => token,
        None => CredentialStore::new(&settings.credentials)
            .load()
            .await?
            .map(|credentials| credentials.token)
            .ok_or(ConfigError::MissingToken)?,
    };
    let config = settings.client_config(token);
    config.validate()?;

    let (display, events) = Display::channel();
    if let Some(past) = history::load(&settings.history)
        .await
        .with_context(|| format!("reading history {}", settings.history.display()))?
    {
        display.publish(DisplayEvent::Message(past));
    }

    let (history, writer) = History::open(&settings.history);
    tokio::spawn(writer.run());

    tracing::info!(
        host = %config.host,
        read_port = config.read_port,
        write_port = config.write_port,
        "starting"
    );
    let supervisor = Supervisor::new(config, display, history);
    let outbox = supervisor.outbox();
    let link = supervisor.link_state();

    tokio::select! {
        res = supervisor.run() => Ok(res?),
        res = console::run(events, outbox, link) => {
            tracing::info!("input closed; exiting");
            res
        }
    }
}
