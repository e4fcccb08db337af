use std::path::Path;

use anyhow::{Context, Result};

use marquee_core::{AppConfig, Scene, TimelineHandle};

pub fn run(config: &AppConfig, path: &Path) -> Result<()> {
    let scene = Scene::load(path)
        .with_context(|| format!("Failed to load scene {}", path.display()))?;

    if scene.widgets.is_empty() {
        println!("Scene has no widgets.");
        return Ok(());
    }

    for entry in &scene.widgets {
        let widget = entry.to_widget(config);
        let events = widget.sync_events();
        let waits = widget.waiting_for();

        println!("  {}", entry.id);
        if events.is_empty() {
            println!("    Emits: (none)");
        } else {
            for event in &events {
                println!("    Emits {} at ~{}", event.name, event.tick);
            }
        }
        if !waits.is_empty() {
            let waits: Vec<&str> = waits.iter().map(String::as_str).collect();
            println!("    Waits for: {}", waits.join(", "));
        }
        println!();
    }

    Ok(())
}
