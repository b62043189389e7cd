use anyhow::{Context, Result};

use crate::config::Config;
use crate::session::SessionId;
use crate::webhook::WebhookClient;

/// One round trip outside the TUI; prints the normalized reply to stdout
pub async fn send_once(config: &Config, message: &str) -> Result<()> {
    if message.trim().is_empty() {
        eprintln!("Nothing to send: the message is empty.");
        return Ok(());
    }

    let client = WebhookClient::new(config.webhook_url.clone(), SessionId::generate())?;
    let reply = client.send_message(message).await;
    println!("{}", reply);

    Ok(())
}

/// Print the effective configuration
pub fn show_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config)
        .context("Failed to serialize config")?;

    let path = config.config_path();
    let origin = if path.exists() { "loaded from" } else { "defaults; not yet saved to" };
    println!("# {} {}", origin, path.display());
    println!("# log file: {}", config.log_path().display());
    println!();
    print!("{}", rendered);

    Ok(())
}

/// Write the effective configuration to disk so it can be edited
pub fn init_config(config: &Config) -> Result<()> {
    let path = config.config_path();
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    config.save()?;
    println!("Wrote {}", path.display());
    Ok(())
}
