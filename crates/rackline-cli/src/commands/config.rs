//! `rackline config check` command.

use anyhow::{Context, Result};
use rackline_core::RacklineConfig;
use std::path::Path;

/// Load and validate a configuration file, returning a short summary.
pub fn check(path: &Path) -> Result<Vec<String>> {
    let config = RacklineConfig::from_file(path)
        .with_context(|| format!("Invalid configuration {}", path.display()))?;

    let changelog = &config.changelog;
    let mut summary = vec![format!(
        "changelog: {} (backend {:?}, retention {})",
        if changelog.enabled { "enabled" } else { "disabled" },
        changelog.storage.backend,
        match changelog.retention_days {
            Some(days) if days > 0 => format!("{days} days"),
            _ => "forever".to_string(),
        }
    )];
    summary.push(format!(
        "webhooks: {} ({} defined)",
        if config.webhooks.enabled { "enabled" } else { "disabled" },
        config.webhooks.definitions.len()
    ));
    for webhook in &config.webhooks.definitions {
        let types: Vec<String> = webhook.entity_types.iter().map(|t| t.to_string()).collect();
        summary.push(format!(
            "  {} -> {} {} [{}]",
            webhook.name,
            webhook.http_method,
            webhook.payload_url,
            types.join(", ")
        ));
    }
    Ok(summary)
}

pub fn run_check(path: &Path) -> Result<()> {
    println!("Checking {}...", path.display());
    for line in check(path)? {
        println!("{line}");
    }
    println!("Configuration OK");
    Ok(())
}
