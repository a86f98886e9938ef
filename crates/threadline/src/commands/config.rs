//! `threadline config`.

use anyhow::Context;
use threadline_tui::EngineConfig;

pub fn show(config: &EngineConfig) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{json}");
    Ok(())
}
