//! examarchive TUI: drill down faculty → module → subject and read the
//! segmented questions of every archived test.

mod app;
mod screens;
mod widgets;

use std::fs::OpenOptions;
use std::sync::Mutex;

use color_eyre::eyre::Result;
use examarchive_client::{ArchiveClient, ClientOptions};
use examarchive_shared::{AppConfig, config_dir, load_config};
use examarchive_storage::Storage;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing()?;

    let config = load_config()?;
    let client = connect(&config).await?;
    app::run(&config, client).await
}

/// The terminal is taken over by the UI, so logs go to a file next to the
/// config.
fn init_tracing() -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("tui.log"))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("examarchive=info"));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Build the API client, reusing the token saved by `examarchive login`
/// when it was issued by the configured API.
async fn connect(config: &AppConfig) -> Result<ArchiveClient> {
    let client = ArchiveClient::new(&ClientOptions::from(&config.api))?;

    let db_path = config.db_path()?;
    if !db_path.exists() {
        return Ok(client);
    }
    let storage = Storage::open_readonly(&db_path).await?;
    match storage.load_session().await? {
        Some(session)
            if session.base_url.trim_end_matches('/')
                == client.base_url().as_str().trim_end_matches('/') =>
        {
            debug!(base_url = %session.base_url, "using stored session");
            Ok(client.with_token(session.token))
        }
        _ => Ok(client),
    }
}
