pub mod config;
pub mod conversation;
pub mod history;
pub mod logging;
pub mod model;
pub mod providers;
pub mod repl;
pub mod templates;
pub mod transport;

use anyhow::{Context, Result};
use reqwest::Client;
use std::io;
use tracing::info;

use config::{Config, StartupOptions};
use conversation::Conversation;
use providers::azure::AzureChatTransport;
use repl::run_repl;
use templates::Templates;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let options = StartupOptions::from_env();
    let cfg = Config::load(&options).context("Failed to load configuration")?;
    let templates = Templates::load(&options.resource_dir)
        .context("Failed to load message templates")?;

    let client = Client::builder()
        .build()
        .context("Failed to initialize HTTP client")?;
    let transport = AzureChatTransport::new(client, &cfg.endpoint)?;
    info!(
        config_source = options.source.as_str(),
        resource_dir = %options.resource_dir.display(),
        api_url = %transport.api_url(),
        deployment = %cfg.endpoint.deployment,
        history_length = cfg.history_length,
        max_tokens = cfg.generation.max_tokens,
        "loaded runtime configuration"
    );

    let mut conversation = Conversation::new(
        templates.system_message,
        cfg.history_length,
        cfg.generation,
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    run_repl(
        stdin.lock(),
        stdout.lock(),
        &templates.messages,
        &mut conversation,
        &transport,
    )
    .await
}
