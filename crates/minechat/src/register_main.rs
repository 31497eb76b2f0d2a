//! Account registration.
//!
//! Run:
//!   minechat-register --nickname Max
//!
//! Saves `{"nickname": ..., "token": ...}` to the credentials file.

use anyhow::{Context, bail};
use clap::Parser;
use minechat::settings::RegisterArgs;
use minechat_client::{CredentialStore, Endpoint, register_account};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    minechat::init_logging();

    let args = RegisterArgs::parse();
    let nickname = args.nickname.trim();
    if nickname.is_empty() {
        bail!("nickname can't be blank");
    }

    let endpoint = Endpoint::new(args.host.clone(), args.port);
    let store = CredentialStore::new(&args.credentials);
    let credentials = register_account(&endpoint, nickname, &store)
        .await
        .with_context(|| format!("registering {nickname:?} at {endpoint}"))?;

    println!(
        "Registered as {}. Credentials saved to {}",
        credentials.nickname,
        store.path().display()
    );
    Ok(())
}
