//! Batch-compose every narration/caption pair.

use std::io::Write;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use shortform_common::config::AppConfig;
use shortform_render_engine::fonts::SystemFontLocator;
use shortform_render_engine::probe::FfprobeProbe;
use shortform_render_engine::renderer::{FfmpegRenderer, ProgressCallback, RenderProgress, Renderer};
use shortform_render_engine::{run_batch, BatchSummary};

/// Command-line values that take precedence over the config file.
pub struct RunOverrides {
    pub stories_dir: Option<PathBuf>,
    pub backgrounds_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub no_enhance: bool,
}

pub fn run(mut config: AppConfig, overrides: RunOverrides, json: bool) -> anyhow::Result<()> {
    if let Some(dir) = overrides.stories_dir {
        config.paths.stories_dir = dir;
    }
    if let Some(dir) = overrides.backgrounds_dir {
        config.paths.backgrounds_dir = dir;
    }
    if let Some(dir) = overrides.output_dir {
        config.paths.output_dir = dir;
    }
    if overrides.no_enhance {
        config.enhance.enabled = false;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    let show_progress = !json;
    let progress_cb: ProgressCallback = Box::new(move |p: RenderProgress| {
        if !show_progress {
            return;
        }
        print!(
            "\r  {}: {:.1}% ({:.1}s encoded, ETA: {:.0}s)  ",
            p.pass,
            p.progress * 100.0,
            p.out_time_secs,
            p.eta_secs,
        );
        let _ = std::io::stdout().flush();
        if p.complete {
            println!();
        }
    });
    let renderer = FfmpegRenderer::new(config.encoding.clone()).with_progress(progress_cb);
    if !renderer.is_available() {
        anyhow::bail!("ffmpeg was not found on PATH");
    }

    tracing::debug!(seed = ?overrides.seed, "Background selection seeded");
    let rng = match overrides.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let fonts = SystemFontLocator::new(config.paths.fonts_dir.clone());

    if !json {
        println!("Composing shorts");
        println!("  Stories:     {}", config.paths.stories_dir.display());
        println!("  Backgrounds: {}", config.paths.backgrounds_dir.display());
        println!("  Output:      {}", config.paths.output_dir.display());
    }

    let summary = run_batch(&config, renderer, FfprobeProbe::new(), rng, &fonts)
        .map_err(|e| anyhow::anyhow!("Batch aborted: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if !summary.failed.is_empty() {
        anyhow::bail!("{} of {} jobs failed", summary.failed.len(), summary.total());
    }
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!(
        "Finished {} jobs in {:.1}s",
        summary.total(),
        (summary.finished_at - summary.started_at).num_milliseconds() as f64 / 1000.0
    );
    for outcome in &summary.succeeded {
        println!(
            "  [OK]   {} -> {} ({:.1}s, {} cues{})",
            outcome.id,
            outcome.output_path.display(),
            outcome.duration_secs,
            outcome.caption_cues,
            if outcome.enhanced { ", enhanced" } else { "" }
        );
        for warning in &outcome.warnings {
            println!("         warning: {warning}");
        }
    }
    for failed in &summary.failed {
        println!("  [FAIL] {} at {}: {}", failed.id, failed.stage, failed.message);
    }
}
