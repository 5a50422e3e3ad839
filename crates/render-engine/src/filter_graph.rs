//! Filter-graph construction.
//!
//! Builds the ordered chain of visual transforms handed to the renderer.
//! The builders are pure: the same style, frame settings and caption
//! path always yield the same graph.

use std::fmt;
use std::path::Path;

use shortform_common::config::{EnhanceConfig, StyleConfig, VideoConfig};

use crate::fonts::FontChoice;

/// Input pad the chain reads from.
pub const VIDEO_INPUT_LABEL: &str = "0:v";

/// Output pad mapped into the encoded file.
pub const VIDEO_OUTPUT_LABEL: &str = "outv";

/// Fixed position of each stage in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageKind {
    ScalePad,
    Blur,
    ColorAdjust,
    Vignette,
    Captions,
    FrameRate,
    PixelFormat,
}

impl StageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::ScalePad => "scale_pad",
            StageKind::Blur => "blur",
            StageKind::ColorAdjust => "color_adjust",
            StageKind::Vignette => "vignette",
            StageKind::Captions => "captions",
            StageKind::FrameRate => "frame_rate",
            StageKind::PixelFormat => "pixel_format",
        }
    }
}

/// One renderer filter invocation, e.g. `eq=saturation=1.2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub name: &'static str,
    /// Already-escaped argument string; empty for argument-less filters.
    pub args: String,
}

impl Filter {
    fn new(name: &'static str, args: impl Into<String>) -> Self {
        Self {
            name,
            args: args.into(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            f.write_str(self.name)
        } else {
            write!(f, "{}={}", self.name, self.args)
        }
    }
}

/// A stage groups the filters that implement one transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStage {
    pub kind: StageKind,
    pub filters: Vec<Filter>,
}

/// Ordered, linear filter chain from [`VIDEO_INPUT_LABEL`] to
/// [`VIDEO_OUTPUT_LABEL`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterGraph {
    stages: Vec<FilterStage>,
}

impl FilterGraph {
    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|stage| stage.kind).collect()
    }

    pub fn stage(&self, kind: StageKind) -> Option<&FilterStage> {
        self.stages.iter().find(|stage| stage.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Render as a `-filter_complex` description.
    pub fn to_filter_complex(&self) -> String {
        let chain = self
            .stages
            .iter()
            .flat_map(|stage| stage.filters.iter())
            .map(Filter::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let chain = if chain.is_empty() {
            "null".to_string()
        } else {
            chain
        };
        format!("[{VIDEO_INPUT_LABEL}]{chain}[{VIDEO_OUTPUT_LABEL}]")
    }

    fn push(&mut self, kind: StageKind, filters: Vec<Filter>) {
        debug_assert!(
            self.stages.last().map_or(true, |last| last.kind < kind),
            "stages must be pushed in chain order"
        );
        self.stages.push(FilterStage { kind, filters });
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_filter_complex())
    }
}

/// Caption file and font burned into the video.
#[derive(Debug, Clone, Copy)]
pub struct CaptionBurn<'a> {
    /// Retimed and buffered caption file.
    pub path: &'a Path,
    pub font: &'a FontChoice,
}

/// Build the primary composition chain.
///
/// Order: scale/pad, blur, colour adjustment, vignette, captions, frame
/// rate, pixel format. Optional effects are skipped when disabled; the
/// scale, frame-rate and pixel-format stages are always present.
pub fn build_composition_graph(
    style: &StyleConfig,
    video: &VideoConfig,
    captions: Option<CaptionBurn<'_>>,
) -> FilterGraph {
    let mut graph = FilterGraph::default();
    let effects = &style.effects;

    graph.push(
        StageKind::ScalePad,
        vec![
            Filter::new(
                "scale",
                format!(
                    "w={w}:h={h}:force_original_aspect_ratio=decrease",
                    w = video.width,
                    h = video.height
                ),
            ),
            Filter::new(
                "pad",
                format!(
                    "w={w}:h={h}:x=(ow-iw)/2:y=(oh-ih)/2:color=black",
                    w = video.width,
                    h = video.height
                ),
            ),
            Filter::new("setsar", "1"),
        ],
    );

    if effects.blur {
        graph.push(
            StageKind::Blur,
            vec![Filter::new(
                "boxblur",
                format!("{}:{}", effects.blur_luma_radius, effects.blur_luma_power),
            )],
        );
    }

    if effects.adjusts_color() {
        graph.push(
            StageKind::ColorAdjust,
            vec![eq_filter(effects.saturation, effects.contrast)],
        );
    }

    if effects.vignette {
        graph.push(
            StageKind::Vignette,
            vec![Filter::new(
                "vignette",
                format!("angle={:.6}", effects.vignette_angle),
            )],
        );
    }

    if let Some(burn) = captions {
        graph.push(StageKind::Captions, vec![subtitles_filter(style, burn)]);
    }

    graph.push(
        StageKind::FrameRate,
        vec![Filter::new("fps", video.fps.to_string())],
    );
    graph.push(
        StageKind::PixelFormat,
        vec![Filter::new("format", "yuv420p")],
    );

    graph
}

/// Build the touch-up chain applied to an already composed video.
pub fn build_enhancement_graph(enhance: &EnhanceConfig) -> FilterGraph {
    let mut graph = FilterGraph::default();
    graph.push(
        StageKind::ColorAdjust,
        vec![eq_filter(enhance.saturation, enhance.contrast)],
    );
    graph.push(
        StageKind::PixelFormat,
        vec![Filter::new("format", "yuv420p")],
    );
    graph
}

fn eq_filter(saturation: f64, contrast: f64) -> Filter {
    Filter::new(
        "eq",
        format!("saturation={saturation}:contrast={contrast}"),
    )
}

fn subtitles_filter(style: &StyleConfig, burn: CaptionBurn<'_>) -> Filter {
    let mut args = format!(
        "filename={}:force_style={}",
        escape_filter_value(&burn.path.to_string_lossy()),
        escape_filter_value(&subtitle_force_style(style, burn.font)),
    );
    if let Some(dir) = burn.font.fonts_dir() {
        args.push_str(&format!(
            ":fontsdir={}",
            escape_filter_value(&dir.to_string_lossy())
        ));
    }
    Filter::new("subtitles", args)
}

/// Style override string for the subtitle renderer.
pub fn subtitle_force_style(style: &StyleConfig, font: &FontChoice) -> String {
    let border_style = if style.boxed { 3 } else { 1 };
    [
        format!("FontName={}", font.family()),
        format!("FontSize={}", style.font_size),
        format!("PrimaryColour={}", style.font_color.to_ass(1.0)),
        format!("Bold={}", if style.bold { 1 } else { 0 }),
        format!("OutlineColour={}", style.outline_color.to_ass(1.0)),
        format!("Outline={}", style.outline_width),
        format!("Alignment={}", style.text_align.ass_alignment()),
        format!("MarginV={}", style.margin_v),
        format!("MarginL={}", style.margin_h),
        format!("MarginR={}", style.margin_h),
        format!("BorderStyle={border_style}"),
        format!(
            "BackColour={}",
            style.background_color.to_ass(style.background_opacity)
        ),
    ]
    .join(",")
}

/// Escape a value for use as a filter option inside a filter graph.
///
/// Two quoting levels apply: the option parser treats `\`, `'` and `:`
/// specially, and the graph parser splits on `,;[]`. The value is first
/// backslash-escaped for the option level, then wrapped in single quotes
/// for the graph level, with embedded quotes closed and reopened.
pub fn escape_filter_value(raw: &str) -> String {
    let mut option_level = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        if matches!(c, '\\' | '\'' | ':') {
            option_level.push('\\');
        }
        option_level.push(c);
    }

    let mut quoted = String::with_capacity(option_level.len() + 2);
    quoted.push('\'');
    for c in option_level.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}
