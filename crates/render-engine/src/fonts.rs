//! Caption font discovery and resolution.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use shortform_common::config::StyleConfig;

/// Font substituted when no candidate is available.
pub const DEFAULT_FONT: &str = "Arial";

/// A font the subtitle renderer can use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FontChoice {
    /// Installed system font, referenced by family name.
    System { family: String },

    /// Font file shipped next to the project, loaded through the
    /// subtitle filter's font directory.
    Local { family: String, path: PathBuf },
}

impl FontChoice {
    pub fn system(family: impl Into<String>) -> Self {
        Self::System {
            family: family.into(),
        }
    }

    /// Family name passed as `FontName`.
    pub fn family(&self) -> &str {
        match self {
            FontChoice::System { family } | FontChoice::Local { family, .. } => family,
        }
    }

    /// Directory the renderer must scan for a local font file.
    pub fn fonts_dir(&self) -> Option<&Path> {
        match self {
            FontChoice::System { .. } => None,
            FontChoice::Local { path, .. } => path.parent(),
        }
    }
}

/// Result of picking a font from the availability list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontResolution {
    Available(FontChoice),
    Fallback(FontChoice),
}

impl FontResolution {
    pub fn into_choice(self) -> FontChoice {
        match self {
            FontResolution::Available(choice) | FontResolution::Fallback(choice) => choice,
        }
    }
}

/// Pick the first available font, or the default when none is.
pub fn resolve_font(available: &[FontChoice]) -> FontResolution {
    match available.first() {
        Some(choice) => FontResolution::Available(choice.clone()),
        None => FontResolution::Fallback(FontChoice::system(DEFAULT_FONT)),
    }
}

/// Looks up whether a named font can be used.
pub trait FontLocator {
    fn locate(&self, name: &str) -> Option<FontChoice>;
}

/// Checks fontconfig first, then `<fonts_dir>/<name>.ttf`.
#[derive(Debug, Clone)]
pub struct SystemFontLocator {
    fonts_dir: PathBuf,
}

impl SystemFontLocator {
    pub fn new(fonts_dir: impl Into<PathBuf>) -> Self {
        Self {
            fonts_dir: fonts_dir.into(),
        }
    }

    fn fontconfig_match(&self, name: &str) -> Option<FontChoice> {
        let output = Command::new("fc-match")
            .args(["-f", "%{family}|%{file}"])
            .arg(name)
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }

        let raw = String::from_utf8(output.stdout).ok()?;
        let (families, file) = raw.trim().split_once('|')?;
        // fc-match always answers with its closest font; only accept it
        // when it actually is the requested family.
        if !family_matches(families, name) || !Path::new(file).exists() {
            return None;
        }
        Some(FontChoice::system(name))
    }

    fn local_file(&self, name: &str) -> Option<FontChoice> {
        let path = self.fonts_dir.join(format!("{name}.ttf"));
        if !path.is_file() {
            return None;
        }
        let path = path.canonicalize().unwrap_or(path);
        Some(FontChoice::Local {
            family: name.to_string(),
            path,
        })
    }
}

impl FontLocator for SystemFontLocator {
    fn locate(&self, name: &str) -> Option<FontChoice> {
        self.fontconfig_match(name)
            .or_else(|| self.local_file(name))
    }
}

/// Weight and slant suffixes that still name the same family.
const STYLE_SUFFIXES: &[&str] = &[
    "regular",
    "bold",
    "italic",
    "oblique",
    "bolditalic",
    "boldoblique",
    "light",
    "medium",
    "semibold",
    "extrabold",
    "black",
    "thin",
];

fn family_matches(families: &str, requested: &str) -> bool {
    let normalize = |s: &str| {
        s.chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect::<String>()
    };
    let wanted = normalize(requested);
    families.split(',').any(|family| {
        let family = normalize(family);
        !family.is_empty()
            && wanted
                .strip_prefix(family.as_str())
                .is_some_and(|rest| rest.is_empty() || STYLE_SUFFIXES.contains(&rest))
    })
}

/// Ordered list of usable fonts for a style: primary first, then fallbacks.
pub fn available_fonts(style: &StyleConfig, locator: &impl FontLocator) -> Vec<FontChoice> {
    std::iter::once(&style.font_primary)
        .chain(style.font_fallback.iter())
        .filter_map(|name| {
            let found = locator.locate(name);
            tracing::debug!(font = %name, available = found.is_some(), "Font candidate checked");
            found
        })
        .collect()
}
