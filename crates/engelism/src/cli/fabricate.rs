//! The `engelism fabricate` command: batch generation over the whole catalog.

use anyhow::Context;
use clap::Args;
use console::Style;
use engelism_core::batch::{Progress, Task, TaskOutcome};
use engelism_core::config::MAX_CONCURRENCY;
use engelism_core::{
    BatchOutcome, BatchReport, Config, Engine, FabricateOptions, FabricationConfig, ImageInput,
    Library, ProviderConfig, TaskError,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arguments for the `fabricate` command.
#[derive(Args, Debug)]
pub struct FabricateArgs {
    /// Batch config saved by the UI (defaults to general.batch_config)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Concurrent provider calls, clamped to 1..=10 (defaults to batch.concurrency)
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Artifact directory (defaults to general.output_dir)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Catalog file (defaults to general.library_path)
    #[arg(long)]
    pub library: Option<PathBuf>,
}

pub async fn execute(args: FabricateArgs, config: Config) -> anyhow::Result<()> {
    let config_path = args.config.clone().unwrap_or_else(|| config.batch_config_path());
    if !config_path.exists() {
        anyhow::bail!(
            "Config not found: {}\n\n  Hint: Open the Engelism UI, upload an image, select settings, \
             and click \"Save Config\" first.",
            config_path.display()
        );
    }
    let fabrication = FabricationConfig::load(&config_path)?;

    let image_path = fabrication.reference_image_path(&config_path);
    if !image_path.exists() {
        anyhow::bail!(
            "Reference image not found: {}\n\n  Hint: Click \"Save Config\" in the UI to save the reference image.",
            image_path.display()
        );
    }

    let concurrency = clamp_concurrency(args.concurrency.unwrap_or(config.batch.concurrency));

    let env = Engine::load_env(&config)?;
    let engine = Engine::new(&config, &env)?;

    let library_path = args.library.clone().unwrap_or_else(|| config.library_path());
    let library = Library::load(&library_path)?;
    let axes = (library.camera_angles.len(), library.shot_scales.len());

    let image = ImageInput::from_path(&image_path)
        .await
        .with_context(|| format!("Failed to read {}", image_path.display()))?;

    let mut options = FabricateOptions::from_config(&config);
    options.concurrency = concurrency;
    if let Some(dir) = &args.output_dir {
        options.output_dir = dir.clone();
    }

    let fabricator = engine.fabricator(library, fabrication.clone(), Arc::new(image), options);
    let tasks = fabricator.plan()?;

    for line in banner(&fabrication, concurrency, engine.provider_config(), tasks.len(), axes) {
        println!("{line}");
    }

    let progress = create_progress_bar(tasks.len() as u64);
    let bar = progress.clone();
    let report = fabricator
        .run(tasks, move |position, task, outcome| {
            let line = progress_line(position, task, outcome);
            bar.suspend(|| println!("{line}"));
            bar.inc(1);
        })
        .await?;
    progress.finish_and_clear();

    print_summary(&report, fabricator.output_dir());
    Ok(())
}

/// Clamp a requested worker count to the supported range.
fn clamp_concurrency(requested: usize) -> usize {
    requested.clamp(1, MAX_CONCURRENCY)
}

fn banner(
    fabrication: &FabricationConfig,
    concurrency: usize,
    provider: &ProviderConfig,
    combinations: usize,
    (angles, scales): (usize, usize),
) -> Vec<String> {
    vec![
        String::new(),
        "╔══ ENGELISM FABRICATION ══╗".to_string(),
        format!("  Lens: {}", fabrication.lens),
        format!("  Aspect Ratio: {}", fabrication.aspect_ratio),
        format!("  Image: {}", fabrication.reference_image),
        format!("  Concurrency: {concurrency}"),
        format!("  Provider: {} ({})", provider.provider_id, provider.model),
        format!("  Combinations: {combinations} ({angles} angles × {scales} scales)"),
        "╚═════════════════════════╝".to_string(),
        String::new(),
    ]
}

fn progress_line(position: Progress, task: &Task, outcome: &TaskOutcome<PathBuf>) -> String {
    let counter = format!("[{}/{}]", position.done, position.total);
    match outcome {
        TaskOutcome::Succeeded(_) => {
            let ok = Style::new().for_stdout().green();
            format!("  {counter} {} {}", ok.apply_to("✓"), task.label)
        }
        TaskOutcome::Failed(error) => {
            let fail = Style::new().for_stdout().red();
            format!("  {counter} {} {}: {error}", fail.apply_to("✗"), task.label)
        }
    }
}

/// Failed label, prefixed with the HTTP status when there was one.
fn failure_tag(label: &str, error: &TaskError) -> String {
    match error.status {
        Some(status) => format!("[{status}] {label}"),
        None => label.to_string(),
    }
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("##-");
    pb.set_style(style);
    pb
}

fn print_summary(report: &BatchReport, output_dir: &Path) {
    println!();
    println!(
        "══ Done: {} success, {} failed ══",
        report.success_count, report.failure_count
    );
    println!("Output: {}", output_dir.display());

    if report.failure_count > 0 {
        let dim = Style::new().for_stdout().dim();
        for outcome in &report.outcomes {
            if let BatchOutcome::Failed { label, error } = outcome {
                println!("  {} {}", failure_tag(label, error), dim.apply_to(error));
            }
        }
    }
}
