//! Init command: write a starter configuration file.

use std::path::PathBuf;

use miette::Result;
use tracing::info;

use crate::config::{self, FileConfig};

/// Create the default configuration file and data directory.
pub fn run(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = config::resolve_path(config_path);

    if path.exists() && !force {
        return Err(miette::miette!(
            "configuration already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }

    let config = FileConfig::default();
    config
        .save(&path)
        .map_err(|e| miette::miette!("failed to write configuration: {}", e))?;

    std::fs::create_dir_all(&config.storage.data_dir)
        .map_err(|e| miette::miette!("failed to create data directory: {}", e))?;

    info!(path = %path.display(), "configuration initialized");
    println!("Configuration written to {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set repository.path to the work tree commits should land in");
    println!("  2. Adjust commits.min_per_day / commits.max_per_day to taste");
    println!("  3. Start the daemon with: tempo daemon");

    Ok(())
}
