//! Background clip pool.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use shortform_common::error::{ShortformError, ShortformResult};

/// Container extensions accepted as background clips.
pub const CLIP_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm"];

/// Candidate background clips, in a stable order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundPool {
    dir: PathBuf,
    clips: Vec<PathBuf>,
}

impl BackgroundPool {
    pub fn new(dir: impl Into<PathBuf>, clips: Vec<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            clips,
        }
    }

    /// Scan `dir` for clips.
    ///
    /// A missing directory and a directory with no usable clips are both
    /// run-level failures.
    pub fn from_dir(dir: &Path) -> ShortformResult<Self> {
        if !dir.is_dir() {
            return Err(ShortformError::SourceDirMissing {
                path: dir.to_path_buf(),
            });
        }

        let mut clips = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_clip(&path) {
                clips.push(path);
            }
        }
        clips.sort();

        if clips.is_empty() {
            return Err(ShortformError::EmptyPool {
                dir: dir.to_path_buf(),
            });
        }

        tracing::debug!(dir = %dir.display(), clips = clips.len(), "Background pool loaded");
        Ok(Self::new(dir, clips))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn clips(&self) -> &[PathBuf] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Pick a clip uniformly at random.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> ShortformResult<&Path> {
        self.clips
            .choose(rng)
            .map(PathBuf::as_path)
            .ok_or_else(|| ShortformError::EmptyPool {
                dir: self.dir.clone(),
            })
    }
}

fn is_clip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            CLIP_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_from_dir_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp4", "a.MOV", "notes.txt", "c.webm"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.mp4")).unwrap();

        let pool = BackgroundPool::from_dir(dir.path()).unwrap();
        let names: Vec<_> = pool
            .clips()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.MOV", "b.mp4", "c.webm"]);
    }

    #[test]
    fn test_empty_dir_is_empty_pool() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.md"), b"").unwrap();
        let err = BackgroundPool::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ShortformError::EmptyPool { .. }));
    }

    #[test]
    fn test_missing_dir_is_reported() {
        let err = BackgroundPool::from_dir(Path::new("/no/such/backgrounds")).unwrap_err();
        assert!(matches!(err, ShortformError::SourceDirMissing { .. }));
    }

    #[test]
    fn test_select_from_empty_pool_fails() {
        let pool = BackgroundPool::new("bg", Vec::new());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            pool.select(&mut rng),
            Err(ShortformError::EmptyPool { .. })
        ));
    }

    #[test]
    fn test_select_is_deterministic_for_seed() {
        let clips: Vec<PathBuf> = (0..8).map(|i| PathBuf::from(format!("{i}.mp4"))).collect();
        let pool = BackgroundPool::new("bg", clips);

        let picks = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..5)
                .map(|_| pool.select(&mut rng).unwrap().to_path_buf())
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(7), picks(7));
        assert!(picks(7).iter().all(|p| pool.clips().contains(p)));
    }
}
