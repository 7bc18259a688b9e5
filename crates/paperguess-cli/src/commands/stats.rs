//! The `paperguess stats` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use paperguess_client::config::{create_source, load_config_from};
use paperguess_core::badge::CacheBadge;

pub async fn execute(
    watch: bool,
    server: Option<String>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(url) = server {
        config.server_url = url;
    }
    let source = create_source(&config)?;

    if !watch {
        let stats = source.cache_stats().await?;
        match format.as_str() {
            "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
            _ => {
                let warming = if stats.is_warming { " (warming)" } else { "" };
                println!("{} papers cached{warming}", stats.cached_papers);
            }
        }
        return Ok(());
    }

    let interval = Duration::from_secs(config.cache_poll_secs.max(1));
    let badge = CacheBadge::spawn(Arc::clone(&source), interval);
    eprintln!(
        "Watching {} every {}s, Ctrl-C to stop",
        config.server_url,
        interval.as_secs()
    );

    let mut last = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                if let Some(text) = badge.label() {
                    if last.as_ref() != Some(&text) {
                        println!("{text}");
                        last = Some(text);
                    }
                }
            }
        }
    }
    Ok(())
}
