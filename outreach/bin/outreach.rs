#![deny(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

use std::path::PathBuf;

#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

const CONFIG_PATHS: [&str; 2] = ["./outreach.config.ron", "/etc/outreach/outreach.config.ron"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = find_config_file()?;
    let content = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read config from {}: {e}", path.display()))?;
    let controller: outreach::controller::Outreach = ron::from_str(&content)?;

    controller.run().await
}

/// Locate the configuration file: the `OUTREACH_CONFIG` environment
/// variable first, then the current directory, then the system-wide path
fn find_config_file() -> anyhow::Result<PathBuf> {
    if let Ok(env_path) = std::env::var("OUTREACH_CONFIG") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!(
            "OUTREACH_CONFIG points to non-existent file: {}",
            path.display()
        );
    }

    if let Some(path) = CONFIG_PATHS.iter().map(PathBuf::from).find(|p| p.exists()) {
        return Ok(path);
    }

    let tried = CONFIG_PATHS
        .iter()
        .map(|p| format!("  - {p}"))
        .collect::<Vec<_>>()
        .join("\n");

    anyhow::bail!(
        "No configuration file found. Tried:\n  - OUTREACH_CONFIG environment variable\n{tried}"
    )
}
