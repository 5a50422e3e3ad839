//! Sequential batch composition over a stories directory.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use shortform_common::config::AppConfig;
use shortform_common::error::ShortformResult;

use crate::fonts::{available_fonts, FontLocator};
use crate::job::{JobFailure, JobOutcome, JobRequest, JobStage};
use crate::orchestrator::Orchestrator;
use crate::pool::BackgroundPool;
use crate::probe::MediaProbe;
use crate::renderer::Renderer;
use crate::sources::discover_pairs;

/// Result of a batch run. Individual job failures land in `failed`;
/// only run-level failures make [`run_batch`] return `Err`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub succeeded: Vec<JobOutcome>,
    pub failed: Vec<FailedJob>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Enough context to re-run a failed job.
#[derive(Debug, Clone, Serialize)]
pub struct FailedJob {
    pub id: String,
    pub stage: JobStage,
    pub message: String,
}

impl From<JobFailure> for FailedJob {
    fn from(failure: JobFailure) -> Self {
        Self {
            message: failure.error.to_string(),
            id: failure.job_id,
            stage: failure.stage,
        }
    }
}

/// Compose every complete narration/caption pair.
///
/// The background pool and stories directory are checked before anything
/// is written; either failing aborts the run. Jobs then run one after
/// another, each releasing its temporary files before the next starts.
pub fn run_batch<R, P, G, L>(
    config: &AppConfig,
    renderer: R,
    probe: P,
    rng: G,
    fonts: &L,
) -> ShortformResult<BatchSummary>
where
    R: Renderer,
    P: MediaProbe,
    G: Rng,
    L: FontLocator,
{
    let started_at = Utc::now();

    let pool = BackgroundPool::from_dir(&config.paths.backgrounds_dir)?;
    let pairs = discover_pairs(&config.paths.stories_dir)?;
    tracing::info!(
        jobs = pairs.len(),
        backgrounds = pool.len(),
        "Batch starting"
    );

    let font_list = available_fonts(&config.style, fonts);
    let output_dir = &config.paths.output_dir;
    if !pairs.is_empty() {
        std::fs::create_dir_all(output_dir)?;
    }

    let mut orchestrator = Orchestrator::new(config, pool, font_list, renderer, probe, rng);
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for pair in pairs {
        let request = JobRequest::new(pair.id, pair.audio_path, pair.caption_path, output_dir);
        match orchestrator.run(&request) {
            Ok(outcome) => succeeded.push(outcome),
            Err(failure) => {
                tracing::error!(
                    job = %failure.job_id,
                    stage = %failure.stage,
                    error = %failure.error,
                    "Job skipped"
                );
                failed.push(FailedJob::from(failure));
            }
        }
    }

    let summary = BatchSummary {
        started_at,
        finished_at: Utc::now(),
        succeeded,
        failed,
    };
    tracing::info!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        elapsed_ms = (summary.finished_at - summary.started_at).num_milliseconds(),
        "Batch finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shortform_common::error::ShortformError;

    #[test]
    fn test_failed_job_from_failure() {
        let failure = JobFailure {
            job_id: "s1".to_string(),
            stage: JobStage::StagingCaptions,
            error: ShortformError::malformed_cue(2, "bad timecode"),
            warnings: Vec::new(),
        };
        let failed = FailedJob::from(failure);
        assert_eq!(failed.id, "s1");
        assert_eq!(failed.stage, JobStage::StagingCaptions);
        assert_eq!(failed.message, "Malformed caption cue at line 2: bad timecode");
    }

    #[test]
    fn test_summary_serializes() {
        let now = Utc::now();
        let summary = BatchSummary {
            started_at: now,
            finished_at: now,
            succeeded: Vec::new(),
            failed: vec![FailedJob {
                id: "x".to_string(),
                stage: JobStage::Composing,
                message: "boom".to_string(),
            }],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["failed"][0]["stage"], "COMPOSING");
        assert_eq!(summary.total(), 1);
        assert!(!summary.all_succeeded());
    }
}
