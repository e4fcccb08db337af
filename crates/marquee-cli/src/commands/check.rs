use std::path::Path;

use anyhow::{Context, Result};

use marquee_core::Scene;

pub fn run(path: &Path) -> Result<()> {
    let scene = Scene::load(path)
        .with_context(|| format!("Failed to load scene {}", path.display()))?;
    let warnings = scene.warnings();

    if warnings.is_empty() {
        println!("{} widget(s), no warnings.", scene.widgets.len());
        return Ok(());
    }

    println!("Warnings ({}):\n", warnings.len());
    for (id, warning) in &warnings {
        println!("  {}: {}", id, warning);
    }

    Ok(())
}
