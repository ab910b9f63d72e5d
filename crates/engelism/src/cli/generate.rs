//! The `engelism generate` command: one protocol for one camera combination.

use anyhow::Context;
use clap::Args;
use engelism_core::{build_prompt, Config, Engine, ImageInput, Library, ShotSelection};
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the `generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Reference photograph of the building
    #[arg(short, long)]
    pub image: PathBuf,

    /// Camera angle key from the catalog
    #[arg(long)]
    pub angle: String,

    /// Shot scale key from the catalog
    #[arg(long)]
    pub scale: String,

    /// Lens key from the catalog
    #[arg(long)]
    pub lens: String,

    /// Aspect ratio
    #[arg(long, default_value = "16:9")]
    pub ratio: String,

    /// Write the protocol to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Catalog file (defaults to general.library_path)
    #[arg(long)]
    pub library: Option<PathBuf>,
}

pub async fn execute(args: GenerateArgs, config: Config) -> anyhow::Result<()> {
    if !args.image.exists() {
        anyhow::bail!(
            "Reference image not found: {}\n\n  Hint: Check the file path and try again.",
            args.image.display()
        );
    }

    let library_path = args.library.clone().unwrap_or_else(|| config.library_path());
    let library = Library::load(&library_path)?;
    let selection = selection_from(&args, &library)?;

    let env = Engine::load_env(&config)?;
    let engine = Engine::new(&config, &env)?;

    let image = ImageInput::from_path(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    let prompt = build_prompt(&selection, &library);

    tracing::info!(
        "Generating protocol: {} / {} / {} / {}",
        selection.angle,
        selection.scale,
        selection.lens,
        selection.aspect_ratio
    );
    let protocol = engine.generate_protocol(prompt, Arc::new(image)).await?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &protocol)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Protocol written to {}", path.display());
        }
        None => println!("{protocol}"),
    }
    Ok(())
}

/// Check every key against the catalog before spending a provider call.
fn selection_from(args: &GenerateArgs, library: &Library) -> anyhow::Result<ShotSelection> {
    library.camera_angles.require("camera angle", &args.angle)?;
    library.shot_scales.require("shot scale", &args.scale)?;
    library.lenses.require("lens", &args.lens)?;
    if !library.aspect_ratios.is_empty() {
        library.aspect_ratios.require("aspect ratio", &args.ratio)?;
    }

    Ok(ShotSelection {
        angle: args.angle.clone(),
        scale: args.scale.clone(),
        lens: args.lens.clone(),
        aspect_ratio: args.ratio.clone(),
    })
}
