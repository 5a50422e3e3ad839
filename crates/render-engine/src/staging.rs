//! Job-scoped caption staging.
//!
//! The source caption file is never modified. Each job works on its own
//! temporary copy, which is removed when the job releases it or, at the
//! latest, when the guard is dropped.

use std::path::{Path, PathBuf};

use shortform_captions::pipeline::{process_file_in_place, CaptionTransform, ProcessedCaptions};
use shortform_common::error::ShortformResult;
use tempfile::TempPath;

use crate::job::JobWarning;

/// Temporary, retimed copy of a job's caption file.
#[derive(Debug)]
pub struct StagedCaptions {
    temp: Option<TempPath>,
    location: PathBuf,
    stats: ProcessedCaptions,
}

impl StagedCaptions {
    /// Copy `source` into `staging_dir` and apply `transform` to the copy.
    ///
    /// If retiming fails the copy is removed before the error returns.
    pub fn stage(
        source: &Path,
        staging_dir: &Path,
        job_id: &str,
        transform: &CaptionTransform,
    ) -> ShortformResult<Self> {
        std::fs::create_dir_all(staging_dir)?;
        let temp = tempfile::Builder::new()
            .prefix(&format!("{job_id}_"))
            .suffix(".srt")
            .tempfile_in(staging_dir)?
            .into_temp_path();
        let location = temp.to_path_buf();
        let mut staged = Self {
            temp: Some(temp),
            location,
            stats: ProcessedCaptions {
                source_cues: 0,
                output_cues: 0,
            },
        };

        std::fs::copy(source, staged.path())?;
        staged.stats = process_file_in_place(staged.path(), transform)?;
        tracing::debug!(
            job = %job_id,
            path = %staged.path().display(),
            cues = staged.stats.output_cues,
            "Captions staged"
        );
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.location
    }

    pub fn stats(&self) -> ProcessedCaptions {
        self.stats
    }

    /// Remove the staged file, reporting a failure as a warning.
    pub fn release(mut self) -> Option<JobWarning> {
        self.remove()
    }

    fn remove(&mut self) -> Option<JobWarning> {
        let temp = self.temp.take()?;
        match temp.close() {
            Ok(()) => None,
            // Already gone counts as released.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(
                    path = %self.location.display(),
                    error = %e,
                    "Failed to remove staged captions"
                );
                Some(JobWarning::ResourceCleanup {
                    path: self.location.clone(),
                    message: e.to_string(),
                })
            }
        }
    }
}

impl Drop for StagedCaptions {
    fn drop(&mut self) {
        let _ = self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shortform_common::error::ShortformError;

    const SOURCE: &str = "1\n00:00:01,000 --> 00:00:03,000\nhello world\n";

    #[test]
    fn test_stage_retimes_copy_and_leaves_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("story_subs.srt");
        std::fs::write(&source, SOURCE).unwrap();
        let staging = dir.path().join("staging");

        let staged =
            StagedCaptions::stage(&source, &staging, "story", &CaptionTransform::default())
                .unwrap();
        assert!(staged.path().starts_with(&staging));
        assert_eq!(staged.stats().output_cues, 2);
        let retimed = std::fs::read_to_string(staged.path()).unwrap();
        assert!(retimed.contains("00:00:00,800 --> 00:00:02,200\nhello"));
        assert_eq!(std::fs::read_to_string(&source).unwrap(), SOURCE);

        let path = staged.path().to_path_buf();
        assert!(staged.release().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_malformed_source_leaves_no_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("bad_subs.srt");
        std::fs::write(&source, "1\n00:00:01,000\n").unwrap();
        let staging = dir.path().join("staging");

        let err = StagedCaptions::stage(&source, &staging, "bad", &CaptionTransform::default())
            .unwrap_err();
        assert!(matches!(err, ShortformError::MalformedCue { .. }));
        assert_eq!(std::fs::read_dir(&staging).unwrap().count(), 0);
    }

    #[test]
    fn test_drop_removes_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("story_subs.srt");
        std::fs::write(&source, SOURCE).unwrap();

        let path = {
            let staged = StagedCaptions::stage(
                &source,
                dir.path(),
                "story",
                &CaptionTransform::default(),
            )
            .unwrap();
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_release_after_external_removal_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("story_subs.srt");
        std::fs::write(&source, SOURCE).unwrap();

        let staged =
            StagedCaptions::stage(&source, dir.path(), "story", &CaptionTransform::default())
                .unwrap();
        std::fs::remove_file(staged.path()).unwrap();
        assert!(staged.release().is_none());
    }

    #[test]
    fn test_release_failure_becomes_cleanup_warning() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("story_subs.srt");
        std::fs::write(&source, SOURCE).unwrap();

        let staged =
            StagedCaptions::stage(&source, dir.path(), "story", &CaptionTransform::default())
                .unwrap();
        let path = staged.path().to_path_buf();
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        match staged.release() {
            Some(JobWarning::ResourceCleanup { path: reported, message }) => {
                assert_eq!(reported, path);
                assert!(!message.is_empty());
            }
            other => panic!("expected a cleanup warning, got {other:?}"),
        }
        assert!(path.is_dir());
    }
}
