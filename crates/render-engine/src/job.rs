//! Render job model: requests, stages, outcomes.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use shortform_common::config::StyleConfig;
use shortform_common::error::ShortformError;

use crate::fonts::FontChoice;

/// Suffix appended to the base id of every finished video.
pub const OUTPUT_SUFFIX: &str = "_short";

/// Container extension of finished videos.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// One content item to compose, before a background is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    /// Base identifier shared by the narration and caption files.
    pub id: String,
    pub narration_path: PathBuf,
    pub caption_path: PathBuf,
    pub output_path: PathBuf,
}

impl JobRequest {
    /// Request writing to `<output_dir>/<id>_short.mp4`.
    pub fn new(
        id: impl Into<String>,
        narration_path: impl Into<PathBuf>,
        caption_path: impl Into<PathBuf>,
        output_dir: &Path,
    ) -> Self {
        let id = id.into();
        Self {
            output_path: output_dir.join(output_file_name(&id)),
            id,
            narration_path: narration_path.into(),
            caption_path: caption_path.into(),
        }
    }
}

/// The fully resolved unit of work handed to the renderer.
#[derive(Debug, Clone)]
pub struct RenderJob<'a> {
    pub id: &'a str,
    pub narration_path: &'a Path,
    /// Staged, retimed caption file.
    pub caption_path: &'a Path,
    pub background_path: &'a Path,
    pub style: &'a StyleConfig,
    pub output_path: &'a Path,
}

/// Orchestrator states. `Failed` is reachable from every other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStage {
    SelectingBackground,
    StagingCaptions,
    Composing,
    Enhancing,
    Done,
    Failed,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobStage::SelectingBackground => "SELECTING_BACKGROUND",
            JobStage::StagingCaptions => "STAGING_CAPTIONS",
            JobStage::Composing => "COMPOSING",
            JobStage::Enhancing => "ENHANCING",
            JobStage::Done => "DONE",
            JobStage::Failed => "FAILED",
        })
    }
}

/// Conditions recovered inside a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobWarning {
    /// No candidate font was available; the default was substituted.
    FontFallback { font: String },

    /// The enhancement pass failed; the composed video was kept.
    EnhancementSkipped { message: String },

    /// A temporary file could not be removed.
    ResourceCleanup { path: PathBuf, message: String },
}

impl fmt::Display for JobWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobWarning::FontFallback { font } => {
                write!(f, "no configured font available, using {font}")
            }
            JobWarning::EnhancementSkipped { message } => {
                write!(f, "enhancement skipped: {message}")
            }
            JobWarning::ResourceCleanup { path, message } => {
                write!(f, "could not remove {}: {message}", path.display())
            }
        }
    }
}

/// A completed job.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub id: String,
    pub output_path: PathBuf,
    pub background_path: PathBuf,
    pub font: FontChoice,
    /// Whether the enhancement pass was applied to the final file.
    pub enhanced: bool,
    pub duration_secs: f64,
    /// Cues burned into the video after retiming.
    pub caption_cues: usize,
    pub warnings: Vec<JobWarning>,
}

/// A job that reached `FAILED`.
#[derive(Debug, thiserror::Error)]
#[error("job {job_id} failed during {stage}: {error}")]
pub struct JobFailure {
    pub job_id: String,
    /// Stage that was active when the job failed.
    pub stage: JobStage,
    #[source]
    pub error: ShortformError,
    /// Recovered conditions seen before the failure (cleanup included).
    pub warnings: Vec<JobWarning>,
}

/// `<id>_short.mp4`
pub fn output_file_name(id: &str) -> String {
    format!("{id}{OUTPUT_SUFFIX}.{OUTPUT_EXTENSION}")
}

/// Sibling path the enhancement pass writes to: `<stem>_enhanced.<ext>`.
pub fn enhanced_output_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{stem}_enhanced.{}", ext.to_string_lossy()),
        None => format!("{stem}_enhanced"),
    };
    output.with_file_name(name)
}
