//! Caption file processing: parse, retime, and rewrite in place.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use shortform_common::config::{BufferStage, CaptionConfig, CaptionGranularity};
use shortform_common::error::{ShortformError, ShortformResult};

use crate::buffer::buffer_all;
use crate::cue::Cue;
use crate::redistribute::{redistribute_words, renumber};
use crate::srt::{generate_srt, parse_srt};

/// The timing transforms applied to a caption file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionTransform {
    pub granularity: CaptionGranularity,
    pub buffer: Duration,
    pub buffer_stage: BufferStage,
}

impl CaptionTransform {
    pub fn from_config(config: &CaptionConfig) -> Self {
        Self {
            granularity: config.granularity,
            buffer: config.buffer(),
            buffer_stage: config.buffer_stage,
        }
    }

    /// Apply the transforms. The buffer is applied exactly once.
    pub fn apply(&self, cues: &[Cue]) -> Vec<Cue> {
        match (self.granularity, self.buffer_stage) {
            (CaptionGranularity::Word, BufferStage::After) => {
                buffer_all(&redistribute_words(cues), self.buffer)
            }
            (CaptionGranularity::Word, BufferStage::Before) => {
                redistribute_words(&buffer_all(cues, self.buffer))
            }
            (CaptionGranularity::Cue, _) => {
                let mut out = buffer_all(cues, self.buffer);
                renumber(&mut out);
                out
            }
        }
    }
}

impl Default for CaptionTransform {
    fn default() -> Self {
        Self::from_config(&CaptionConfig::default())
    }
}

/// Summary of one processed caption file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessedCaptions {
    pub source_cues: usize,
    pub output_cues: usize,
}

/// Transform caption content held in memory.
pub fn process_content(
    content: &str,
    transform: &CaptionTransform,
) -> ShortformResult<(String, ProcessedCaptions)> {
    let cues = parse_srt(content)?;
    let out = transform.apply(&cues);
    let stats = ProcessedCaptions {
        source_cues: cues.len(),
        output_cues: out.len(),
    };
    Ok((generate_srt(&out), stats))
}

/// Rewrite the caption file at `path` with the transforms applied.
///
/// The new content is written to a sibling temporary file and renamed
/// over the original, so a failure leaves the original untouched.
pub fn process_file_in_place(
    path: &Path,
    transform: &CaptionTransform,
) -> ShortformResult<ProcessedCaptions> {
    process_file(path, path, transform)
}

/// Read captions from `input`, transform them, and write to `output`.
pub fn process_file(
    input: &Path,
    output: &Path,
    transform: &CaptionTransform,
) -> ShortformResult<ProcessedCaptions> {
    if !input.exists() {
        return Err(ShortformError::FileNotFound {
            path: input.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(input)?;
    let (rewritten, stats) = process_content(&content, transform)?;
    write_atomically(output, &rewritten)?;

    tracing::debug!(
        input = %input.display(),
        output = %output.display(),
        source_cues = stats.source_cues,
        output_cues = stats.output_cues,
        "Captions processed"
    );
    Ok(stats)
}

fn write_atomically(path: &Path, content: &str) -> ShortformResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.flush()?;
    temp.persist(path).map_err(|e| ShortformError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = "1\n00:00:01,000 --> 00:00:03,000\nhello world\n";

    #[test]
    fn test_word_then_buffer_matches_reference_example() {
        let (srt, stats) = process_content(HELLO, &CaptionTransform::default()).unwrap();
        assert_eq!(
            srt,
            "1\n00:00:00,800 --> 00:00:02,200\nhello\n\n2\n00:00:01,800 --> 00:00:03,200\nworld\n\n"
        );
        assert_eq!(stats.source_cues, 1);
        assert_eq!(stats.output_cues, 2);
    }

    #[test]
    fn test_buffer_before_redistribution_splits_widened_span() {
        let transform = CaptionTransform {
            buffer_stage: BufferStage::Before,
            ..CaptionTransform::default()
        };
        let (srt, _) = process_content(HELLO, &transform).unwrap();
        assert_eq!(
            srt,
            "1\n00:00:00,800 --> 00:00:02,000\nhello\n\n2\n00:00:02,000 --> 00:00:03,200\nworld\n\n"
        );
    }

    #[test]
    fn test_cue_granularity_keeps_text_and_renumbers() {
        let transform = CaptionTransform {
            granularity: CaptionGranularity::Cue,
            buffer: Duration::from_millis(500),
            buffer_stage: BufferStage::After,
        };
        let content = "4\n00:00:00,200 --> 00:00:01,000\nkeep me whole\n";
        let (srt, _) = process_content(content, &transform).unwrap();
        assert_eq!(srt, "1\n00:00:00,000 --> 00:00:01,500\nkeep me whole\n\n");
    }

    #[test]
    fn test_process_file_in_place_rewrites_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story_subs.srt");
        std::fs::write(&path, HELLO).unwrap();

        let stats = process_file_in_place(&path, &CaptionTransform::default()).unwrap();
        assert_eq!(stats.output_cues, 2);

        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("00:00:01,800 --> 00:00:03,200\nworld"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_malformed_file_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.srt");
        let broken = "1\nnot a timecode\ntext\n";
        std::fs::write(&path, broken).unwrap();

        let err = process_file_in_place(&path, &CaptionTransform::default()).unwrap_err();
        assert!(matches!(err, ShortformError::MalformedCue { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = process_file_in_place(
            Path::new("/no/such/captions.srt"),
            &CaptionTransform::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ShortformError::FileNotFound { .. }));
    }
}
