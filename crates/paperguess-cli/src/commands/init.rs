//! The `paperguess init` command.

use std::path::Path;

use anyhow::Result;

use paperguess_client::config::SAMPLE_CONFIG;

pub fn execute() -> Result<()> {
    let path = Path::new("paperguess.toml");
    if path.exists() {
        println!("paperguess.toml already exists, skipping.");
        return Ok(());
    }
    std::fs::write(path, SAMPLE_CONFIG)?;
    println!("Created paperguess.toml");

    println!("\nNext steps:");
    println!("  1. Point server_url at your paper server");
    println!("  2. Run: paperguess stats");
    println!("  3. Run: paperguess play");

    Ok(())
}
