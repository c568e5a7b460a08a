use anyhow::Result;
use colored::Colorize;

use crate::config::Config;

/// Store the API base URL
pub fn set_url(url: String) -> Result<()> {
    let mut config = Config::load().unwrap_or_default();
    config.api_url = Some(url);
    config.save()?;

    println!("{} API URL set to {}", "✓".green().bold(), config.api_url());
    println!(
        "  Config saved to {}",
        Config::path()?.display().to_string().dimmed()
    );
    Ok(())
}

/// Print the effective API base URL
pub fn show() -> Result<()> {
    let config = Config::load()?;
    println!("api_url = {}", config.api_url());
    Ok(())
}
