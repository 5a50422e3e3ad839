//! Retime a single caption file.

use std::path::PathBuf;

use shortform_captions::pipeline::{process_file, CaptionTransform};
use shortform_common::config::{AppConfig, CaptionConfig, CaptionGranularity};

pub fn run(
    config: &AppConfig,
    input: PathBuf,
    output: Option<PathBuf>,
    buffer: Option<f64>,
    granularity: Option<CaptionGranularity>,
) -> anyhow::Result<()> {
    let mut captions = CaptionConfig {
        buffer_secs: buffer.unwrap_or(config.captions.buffer_secs),
        ..config.captions.clone()
    };
    if let Some(granularity) = granularity {
        captions.granularity = granularity;
    }
    if !captions.buffer_secs.is_finite() || captions.buffer_secs < 0.0 {
        anyhow::bail!("--buffer must be a non-negative number of seconds");
    }

    let transform = CaptionTransform::from_config(&captions);
    let target = output.unwrap_or_else(|| input.clone());
    let stats = process_file(&input, &target, &transform)
        .map_err(|e| anyhow::anyhow!("Failed to process {}: {e}", input.display()))?;

    println!(
        "Wrote {} cues ({} source cues) to {}",
        stats.output_cues,
        stats.source_cues,
        target.display()
    );
    Ok(())
}
