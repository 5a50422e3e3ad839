//! Render orchestrator.
//!
//! Drives one job through
//! `SELECTING_BACKGROUND → STAGING_CAPTIONS → COMPOSING → ENHANCING → DONE`,
//! with `FAILED` reachable from every state. The orchestrator is the only
//! place that writes or deletes files for a job.

use std::path::Path;

use rand::Rng;
use shortform_captions::pipeline::CaptionTransform;
use shortform_common::config::AppConfig;
use shortform_common::error::ShortformError;

use crate::filter_graph::{build_composition_graph, build_enhancement_graph, CaptionBurn};
use crate::fonts::{resolve_font, FontChoice, FontResolution};
use crate::job::{
    enhanced_output_path, JobFailure, JobOutcome, JobRequest, JobStage, JobWarning, RenderJob,
};
use crate::pool::BackgroundPool;
use crate::probe::MediaProbe;
use crate::renderer::{RenderPass, RenderRequest, Renderer};
use crate::staging::StagedCaptions;

/// Runs render jobs one at a time against a fixed configuration.
pub struct Orchestrator<'c, R, P, G> {
    config: &'c AppConfig,
    pool: BackgroundPool,
    fonts: Vec<FontChoice>,
    renderer: R,
    probe: P,
    rng: G,
}

impl<'c, R, P, G> Orchestrator<'c, R, P, G>
where
    R: Renderer,
    P: MediaProbe,
    G: Rng,
{
    /// `fonts` is the ordered availability list; an empty list selects
    /// the default font for every job.
    pub fn new(
        config: &'c AppConfig,
        pool: BackgroundPool,
        fonts: Vec<FontChoice>,
        renderer: R,
        probe: P,
        rng: G,
    ) -> Self {
        Self {
            config,
            pool,
            fonts,
            renderer,
            probe,
            rng,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Run one job to `DONE` or `FAILED`.
    ///
    /// The staged caption file is released before this returns, on every
    /// path. A composition failure leaves no output file behind.
    pub fn run(&mut self, request: &JobRequest) -> Result<JobOutcome, JobFailure> {
        let span = tracing::info_span!("job", job = %request.id);
        let _guard = span.enter();
        let config = self.config;

        let mut warnings = Vec::new();
        let fail = |stage: JobStage, error: ShortformError, warnings: Vec<JobWarning>| {
            tracing::error!(%stage, error = %error, "Job failed");
            JobFailure {
                job_id: request.id.clone(),
                stage,
                error,
                warnings,
            }
        };

        tracing::info!(stage = %JobStage::SelectingBackground, "Stage started");
        let background = match self.pool.select(&mut self.rng) {
            Ok(path) => path.to_path_buf(),
            Err(e) => return Err(fail(JobStage::SelectingBackground, e, warnings)),
        };
        tracing::debug!(background = %background.display(), "Background selected");

        tracing::info!(stage = %JobStage::StagingCaptions, "Stage started");
        let transform = CaptionTransform::from_config(&config.captions);
        let staged = match StagedCaptions::stage(
            &request.caption_path,
            &config.staging_dir(),
            &request.id,
            &transform,
        ) {
            Ok(staged) => staged,
            Err(e) => return Err(fail(JobStage::StagingCaptions, e, warnings)),
        };
        let font = match resolve_font(&self.fonts) {
            FontResolution::Available(font) => font,
            FontResolution::Fallback(font) => {
                tracing::warn!(font = %font.family(), "No configured font available, using default");
                warnings.push(JobWarning::FontFallback {
                    font: font.family().to_string(),
                });
                font
            }
        };

        let job = RenderJob {
            id: &request.id,
            narration_path: &request.narration_path,
            caption_path: staged.path(),
            background_path: &background,
            style: &config.style,
            output_path: &request.output_path,
        };
        let result = self.compose_and_enhance(&job, &font, &mut warnings);
        let caption_cues = staged.stats().output_cues;

        if let Some(warning) = staged.release() {
            warnings.push(warning);
        }

        match result {
            Ok((enhanced, duration_secs)) => {
                tracing::info!(
                    stage = %JobStage::Done,
                    output = %request.output_path.display(),
                    enhanced,
                    "Job finished"
                );
                Ok(JobOutcome {
                    id: request.id.clone(),
                    output_path: request.output_path.clone(),
                    background_path: background,
                    font,
                    enhanced,
                    duration_secs,
                    caption_cues,
                    warnings,
                })
            }
            Err((stage, error)) => Err(fail(stage, error, warnings)),
        }
    }

    /// Composition followed by the optional enhancement pass. Returns
    /// whether enhancement was applied and the output duration.
    fn compose_and_enhance(
        &mut self,
        job: &RenderJob<'_>,
        font: &FontChoice,
        warnings: &mut Vec<JobWarning>,
    ) -> Result<(bool, f64), (JobStage, ShortformError)> {
        tracing::info!(stage = %JobStage::Composing, "Stage started");
        let duration_secs = self
            .compose(job, font)
            .map_err(|e| (JobStage::Composing, e))?;

        if !self.config.enhance.enabled {
            return Ok((false, duration_secs));
        }

        tracing::info!(stage = %JobStage::Enhancing, "Stage started");
        match self.enhance(job.output_path, duration_secs) {
            Ok(()) => Ok((true, duration_secs)),
            Err(e) => {
                tracing::warn!(error = %e, "Enhancement failed, keeping composed output");
                warnings.push(JobWarning::EnhancementSkipped {
                    message: e.to_string(),
                });
                Ok((false, duration_secs))
            }
        }
    }

    fn compose(
        &mut self,
        job: &RenderJob<'_>,
        font: &FontChoice,
    ) -> Result<f64, ShortformError> {
        let duration_secs = self.probe.duration_secs(job.narration_path)?;

        if let Some(parent) = job.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let graph = build_composition_graph(
            job.style,
            &self.config.video,
            Some(CaptionBurn {
                path: job.caption_path,
                font,
            }),
        );
        let request = RenderRequest {
            pass: RenderPass::Compose {
                background: job.background_path.to_path_buf(),
                narration: job.narration_path.to_path_buf(),
            },
            graph,
            output_path: job.output_path.to_path_buf(),
            duration_secs,
        };

        if let Err(e) = self.renderer.render(&request) {
            discard_partial(job.output_path);
            return Err(match e {
                ShortformError::Composition { .. } => e,
                other => ShortformError::composition(other.to_string()),
            });
        }
        if !job.output_path.is_file() {
            return Err(ShortformError::composition(format!(
                "{} reported success but wrote no output",
                self.renderer.name()
            )));
        }
        Ok(duration_secs)
    }

    /// Enhance `output` through a sibling file, replacing it only on
    /// success. On failure `output` is left as composed.
    fn enhance(&mut self, output: &Path, duration_secs: f64) -> Result<(), ShortformError> {
        let enhanced = enhanced_output_path(output);
        let request = RenderRequest {
            pass: RenderPass::Enhance {
                source: output.to_path_buf(),
            },
            graph: build_enhancement_graph(&self.config.enhance),
            output_path: enhanced.clone(),
            duration_secs,
        };

        let result = self.renderer.render(&request).and_then(|()| {
            if enhanced.is_file() {
                std::fs::rename(&enhanced, output).map_err(ShortformError::from)
            } else {
                Err(ShortformError::enhancement(format!(
                    "{} reported success but wrote no output",
                    self.renderer.name()
                )))
            }
        });

        result.map_err(|e| {
            discard_partial(&enhanced);
            match e {
                ShortformError::Enhancement { .. } => e,
                other => ShortformError::enhancement(other.to_string()),
            }
        })
    }
}

fn discard_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
    }
}
