//! Media duration probing.

use std::path::Path;
use std::process::Command;

use shortform_common::error::{ShortformError, ShortformResult};

/// Reads the playable length of a media file.
pub trait MediaProbe {
    fn duration_secs(&self, path: &Path) -> ShortformResult<f64>;
}

impl<P: MediaProbe + ?Sized> MediaProbe for &P {
    fn duration_secs(&self, path: &Path) -> ShortformResult<f64> {
        (**self).duration_secs(path)
    }
}

/// Probes through the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    binary: String,
}

impl FfprobeProbe {
    pub fn new() -> Self {
        Self {
            binary: "ffprobe".to_string(),
        }
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaProbe for FfprobeProbe {
    fn duration_secs(&self, path: &Path) -> ShortformResult<f64> {
        let failure = |message: String| ShortformError::Probe {
            path: path.to_path_buf(),
            message,
        };

        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .map_err(|e| failure(format!("failed to start {}: {e}", self.binary)))?;

        if !output.status.success() {
            return Err(failure(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            failure(format!(
                "unexpected duration output {:?}",
                String::from_utf8_lossy(&output.stdout).trim()
            ))
        })
    }
}

fn parse_duration(raw: &str) -> Option<f64> {
    let secs = raw.lines().next()?.trim().parse::<f64>().ok()?;
    (secs.is_finite() && secs > 0.0).then_some(secs)
}
