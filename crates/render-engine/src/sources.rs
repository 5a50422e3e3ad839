//! Narration/caption pairing by file naming convention.
//!
//! A content item `<id>` is complete when the stories directory holds
//! both `<id>_tts.mp3` and `<id>_subs.srt`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use shortform_common::error::{ShortformError, ShortformResult};

const NARRATION_SUFFIX: &str = "_tts.mp3";
const CAPTION_SUFFIX: &str = "_subs.srt";

const KNOWN_EXTENSIONS: &[&str] = &[".mp3", ".txt", ".srt"];
const KNOWN_ROLES: &[&str] = &["_tts", "_cleaned", "_subs"];

/// A matched narration track and caption file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationPair {
    pub id: String,
    pub audio_path: PathBuf,
    pub caption_path: PathBuf,
}

/// Base identifier of a story file: `abc_tts.mp3` → `abc`.
pub fn base_id(file_name: &str) -> &str {
    let mut name = file_name;
    if let Some(stripped) = KNOWN_EXTENSIONS
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
    {
        name = stripped;
    }
    if let Some(stripped) = KNOWN_ROLES.iter().find_map(|role| name.strip_suffix(role)) {
        name = stripped;
    }
    name
}

/// Find all complete pairs in `dir`, ordered by id.
pub fn discover_pairs(dir: &Path) -> ShortformResult<Vec<NarrationPair>> {
    if !dir.is_dir() {
        return Err(ShortformError::SourceDirMissing {
            path: dir.to_path_buf(),
        });
    }

    let mut audio: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut captions: BTreeMap<String, PathBuf> = BTreeMap::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let id = base_id(name).to_string();
        if id.is_empty() {
            continue;
        }
        if name.ends_with(NARRATION_SUFFIX) {
            audio.insert(id, path);
        } else if name.ends_with(CAPTION_SUFFIX) {
            captions.insert(id, path);
        }
    }

    let pairs: Vec<NarrationPair> = audio
        .into_iter()
        .filter_map(|(id, audio_path)| match captions.remove(&id) {
            Some(caption_path) => Some(NarrationPair {
                id,
                audio_path,
                caption_path,
            }),
            None => {
                tracing::debug!(id = %id, "Narration without captions, skipping");
                None
            }
        })
        .collect();

    for id in captions.keys() {
        tracing::debug!(id = %id, "Captions without narration, skipping");
    }
    Ok(pairs)
}
