//! Inspect or create the config file.

use std::path::Path;

use anyhow::bail;
use webprep_common::config::AppConfig;

use super::config_location;

pub fn show(config: &AppConfig, explicit: Option<&Path>) -> anyhow::Result<()> {
    let path = config_location(explicit);
    let status = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("# {}{status}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);

    if let Err(e) = config.validate() {
        println!();
        println!("[WARN] {e}");
    }
    Ok(())
}

pub fn init(explicit: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = config_location(explicit);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    AppConfig::default().save_to(&path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
