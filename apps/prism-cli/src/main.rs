use anyhow::Result;
use clap::{Parser, Subcommand};
use prism_ecs::Registry;
use prism_input::CameraInput;
use prism_render::{FrameOrchestrator, NoOverlay, RecordingBackend};
use prism_scene::{SceneAssets, SceneBuilder, SceneDescription};
use prism_tools::SceneInspector;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "prism-cli", about = "Headless tools for prism scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Populate a scene and list its entities
    Inspect {
        /// YAML scene description; the demo scene when omitted
        #[arg(long)]
        scene: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Render frames through the recording backend and print the transcript
    Render {
        /// YAML scene description; the demo scene when omitted
        #[arg(long)]
        scene: Option<PathBuf>,
        /// Number of frames to run
        #[arg(short, long, default_value_t = 1)]
        frames: u32,
        #[arg(long, default_value_t = 1280)]
        width: u32,
        #[arg(long, default_value_t = 720)]
        height: u32,
    },
}

/// Fixed step used for headless frames.
const FRAME_DT: f32 = 1.0 / 60.0;

fn load_scene(path: Option<&Path>) -> Result<SceneDescription> {
    Ok(match path {
        Some(path) => SceneDescription::load(path)?,
        None => SceneDescription::demo(),
    })
}

fn populate(
    backend: &mut RecordingBackend,
    description: &SceneDescription,
    aspect_ratio: f32,
) -> Result<Registry> {
    let mut registry = Registry::new();
    let assets = SceneAssets::load(backend)?;
    SceneBuilder::new(&mut registry, &assets)
        .with_aspect_ratio(aspect_ratio)
        .populate(description)?;
    Ok(registry)
}

fn inspect(description: &SceneDescription, json: bool) -> Result<String> {
    let mut backend = RecordingBackend::new(1, 1);
    let registry = populate(&mut backend, description, 16.0 / 9.0)?;
    let summary = SceneInspector::summary(&registry);
    let entities = SceneInspector::inspect_all(&registry);

    if json {
        let value = serde_json::json!({
            "scene": description.name,
            "summary": summary,
            "entities": entities,
        });
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    let mut out = format!("{}\n{summary}\n", description.name);
    for info in entities {
        out.push_str(&format!("  {info}\n"));
    }
    Ok(out)
}

fn render(description: &SceneDescription, frames: u32, width: u32, height: u32) -> Result<String> {
    let mut orchestrator = FrameOrchestrator::new(width, height)?;
    let mut backend = RecordingBackend::new(width, height);
    let mut registry = populate(&mut backend, description, width as f32 / height as f32)?;
    backend.clear_calls();

    let idle = CameraInput::default();
    let mut out = String::new();
    for _ in 0..frames {
        let stats = orchestrator.run_frame(
            &mut registry,
            &mut backend,
            &mut NoOverlay,
            &idle,
            FRAME_DT,
        )?;
        tracing::debug!(
            frame = stats.frame_index,
            draws = stats.draws,
            lights = stats.lights,
            "frame rendered"
        );
        out.push_str(&backend.render_text());
        backend.clear_calls();
    }
    Ok(out)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("prism-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", prism_common::crate_info());
            println!("ecs: {}", prism_ecs::crate_info());
            println!("input: {}", prism_input::crate_info());
            println!("render: {}", prism_render::crate_info());
            println!("scene: {}", prism_scene::crate_info());
            println!("tools: {}", prism_tools::crate_info());
        }
        Commands::Inspect { scene, json } => {
            let description = load_scene(scene.as_deref())?;
            println!("{}", inspect(&description, json)?.trim_end());
        }
        Commands::Render {
            scene,
            frames,
            width,
            height,
        } => {
            let description = load_scene(scene.as_deref())?;
            print!("{}", render(&description, frames, width, height)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inspect_demo_lists_every_entity() {
        let text = inspect(&SceneDescription::demo(), false).unwrap();
        assert!(text.starts_with("demo\nScene: entities=8 camera=#1"));
        assert_eq!(text.lines().filter(|l| l.starts_with("  Entity")).count(), 8);
    }

    #[test]
    fn inspect_json_is_parseable() {
        let text = inspect(&SceneDescription::demo(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["summary"]["entity_count"], 8);
        assert_eq!(value["entities"].as_array().unwrap().len(), 8);
    }

    #[test]
    fn render_prints_one_block_per_frame() {
        let text = render(&SceneDescription::demo(), 2, 320, 240).unwrap();
        assert_eq!(text.matches("=== Frame").count(), 2);
        assert_eq!(text.matches("Presented").count(), 2);
        assert!(text.contains("Lights: 3"));
    }

    #[test]
    fn render_rejects_zero_extent() {
        assert!(render(&SceneDescription::demo(), 1, 0, 240).is_err());
    }
}
