//! Error types shared across Shortform crates.

use std::path::PathBuf;

/// Top-level error type for Shortform operations.
#[derive(Debug, thiserror::Error)]
pub enum ShortformError {
    #[error("Malformed caption cue at line {line}: {message}")]
    MalformedCue { line: usize, message: String },

    #[error("No background clips available in {dir}")]
    EmptyPool { dir: PathBuf },

    #[error("Composition failed: {message}")]
    Composition { message: String },

    #[error("Enhancement failed: {message}")]
    Enhancement { message: String },

    #[error("Media probe failed for {path}: {message}")]
    Probe { path: PathBuf, message: String },

    #[error("Source directory missing: {path}")]
    SourceDirMissing { path: PathBuf },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ShortformError.
pub type ShortformResult<T> = Result<T, ShortformError>;

impl ShortformError {
    pub fn malformed_cue(line: usize, msg: impl Into<String>) -> Self {
        Self::MalformedCue {
            line,
            message: msg.into(),
        }
    }

    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition {
            message: msg.into(),
        }
    }

    pub fn enhancement(msg: impl Into<String>) -> Self {
        Self::Enhancement {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error aborts the whole run rather than a single job.
    pub fn is_run_level(&self) -> bool {
        matches!(self, Self::EmptyPool { .. } | Self::SourceDirMissing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_level_classification() {
        assert!(ShortformError::EmptyPool {
            dir: PathBuf::from("bg")
        }
        .is_run_level());
        assert!(ShortformError::SourceDirMissing {
            path: PathBuf::from("stories")
        }
        .is_run_level());
        assert!(!ShortformError::composition("ffmpeg exited 1").is_run_level());
        assert!(!ShortformError::malformed_cue(3, "bad timecode").is_run_level());
    }

    #[test]
    fn test_malformed_cue_message_names_line() {
        let err = ShortformError::malformed_cue(12, "missing text");
        assert_eq!(
            err.to_string(),
            "Malformed caption cue at line 12: missing text"
        );
    }
}
