use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use softrast::{load_obj, Rasterizer, RenderConfig};

/// Render a textured OBJ scene to a PNG without a GPU.
#[derive(Parser)]
#[command(name = "softrast", version)]
struct Args {
    /// OBJ file to render (textures are resolved next to it)
    scene: PathBuf,

    /// RON render configuration; defaults are used for missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output PNG path
    #[arg(long, short, default_value = "render.png")]
    output: PathBuf,

    /// Override the configured target width
    #[arg(long)]
    width: Option<u32>,

    /// Override the configured target height
    #[arg(long)]
    height: Option<u32>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if let Some(width) = args.width {
        config.target_width = width;
    }
    if let Some(height) = args.height {
        config.target_height = height;
    }

    let scene = load_obj(&args.scene)
        .with_context(|| format!("loading scene {}", args.scene.display()))?;
    let mut rasterizer = Rasterizer::from_config(scene, &config)?;

    let start = Instant::now();
    let stats = rasterizer.rasterize_scene();
    let elapsed = start.elapsed();

    rasterizer
        .save_png(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "{}x{}: {} triangles ({} culled), {} fragments in {:.2?} -> {}",
        config.target_width,
        config.target_height,
        stats.triangles,
        stats.culled,
        stats.fragments,
        elapsed,
        args.output.display()
    );

    Ok(())
}
