use std::path::Path;

use anyhow::{Context, Result};

use marquee_core::{AppConfig, Scene};

pub fn run(config: &AppConfig, path: &Path, frames: Option<usize>) -> Result<()> {
    let scene = Scene::load(path)
        .with_context(|| format!("Failed to load scene {}", path.display()))?;

    if scene.widgets.is_empty() {
        println!("Scene has no widgets.");
        return Ok(());
    }

    let mut coordinator = scene.coordinator(config);
    let summary = coordinator.resolve_timelines();

    println!(
        "Resolved {} widget(s) in {} iteration(s)",
        summary.computed.len(),
        summary.iterations
    );
    if !summary.forced.is_empty() {
        println!("  Cycles broken at: {}", summary.forced.join(", "));
    }
    println!();

    for (id, widget) in coordinator.widgets() {
        let Some(timeline) = widget.timeline() else {
            println!("  {} - (not resolved)", id);
            continue;
        };

        let period = timeline
            .period()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let last = timeline
            .last()
            .map(|p| format!("({}, {})", p.x, p.y))
            .unwrap_or_else(|| "-".to_string());

        println!("  {} - {} frames", id, timeline.len());
        println!("    Period: {}  Loop start: {}", period, timeline.loop_start());
        println!(
            "    Pauses: {}  Terminals: {}",
            timeline.pause_count(),
            timeline.terminal_count()
        );
        println!("    Final position: {}", last);

        if let Some(n) = frames {
            for (tick, position) in timeline.positions().iter().take(n).enumerate() {
                let mut flags = Vec::new();
                if position.pause {
                    flags.push("pause");
                }
                if position.pause_end {
                    flags.push("pause_end");
                }
                if position.terminal {
                    flags.push("terminal");
                }
                if position.reset {
                    flags.push("reset");
                }
                let segment = position
                    .segment_name
                    .as_deref()
                    .map(|s| format!(" <{}>", s))
                    .unwrap_or_default();
                println!(
                    "      {:>5}: ({}, {}){} {}",
                    tick,
                    position.x,
                    position.y,
                    segment,
                    flags.join(" ")
                );
            }
        }
        println!();
    }

    Ok(())
}
