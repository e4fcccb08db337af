use std::path::Path;

use anyhow::{bail, Context, Result};

use marquee_core::AppConfig;

/// Write a default configuration file, refusing to clobber one unless forced
pub fn run(path: Option<&Path>, force: bool) -> Result<()> {
    let target = path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);

    if target.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            target.display()
        );
    }

    let config = AppConfig::default();
    let saved = match path {
        Some(path) => config.save_to(path),
        None => config.save(),
    };
    saved.with_context(|| format!("Failed to write {}", target.display()))?;

    println!("Wrote default configuration to {}", target.display());
    Ok(())
}
