//! External renderer invocation.
//!
//! The orchestrator describes each pass as a [`RenderRequest`]; a
//! [`Renderer`] turns it into output media. [`FfmpegRenderer`] is the
//! production backend.

use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use shortform_common::config::EncodingConfig;
use shortform_common::error::{ShortformError, ShortformResult};

use crate::filter_graph::{FilterGraph, VIDEO_OUTPUT_LABEL};

/// What a render pass consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderPass {
    /// Loop `background` under the filter chain and mux `narration`.
    Compose { background: PathBuf, narration: PathBuf },

    /// Re-encode an already composed video through the filter chain.
    Enhance { source: PathBuf },
}

impl RenderPass {
    pub fn kind(&self) -> PassKind {
        match self {
            RenderPass::Compose { .. } => PassKind::Compose,
            RenderPass::Enhance { .. } => PassKind::Enhance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Compose,
    Enhance,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PassKind::Compose => "compose",
            PassKind::Enhance => "enhance",
        })
    }
}

/// One invocation of the renderer.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub pass: RenderPass,
    pub graph: FilterGraph,
    pub output_path: PathBuf,

    /// Length of the output; equals the narration length for composition.
    pub duration_secs: f64,
}

impl RenderRequest {
    /// Error matching this request's pass.
    pub fn failure(&self, message: impl Into<String>) -> ShortformError {
        match self.pass.kind() {
            PassKind::Compose => ShortformError::composition(message),
            PassKind::Enhance => ShortformError::enhancement(message),
        }
    }
}

/// Progress callback for a running pass.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send>;

/// Progress report for a running pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderProgress {
    pub pass: PassKind,

    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Media time encoded so far.
    pub out_time_secs: f64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    pub complete: bool,
}

/// Trait for render backends.
pub trait Renderer {
    /// Execute one pass, producing `request.output_path`.
    fn render(&mut self, request: &RenderRequest) -> ShortformResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn render(&mut self, request: &RenderRequest) -> ShortformResult<()> {
        (**self).render(request)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Renders through the `ffmpeg` binary.
pub struct FfmpegRenderer {
    binary: String,
    encoding: EncodingConfig,
    progress: Option<ProgressCallback>,
}

impl FfmpegRenderer {
    pub fn new(encoding: EncodingConfig) -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            encoding,
            progress: None,
        }
    }

    /// Use a specific ffmpeg executable.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    fn run(&self, request: &RenderRequest, args: &[String]) -> ShortformResult<()> {
        let pass = request.pass.kind();
        tracing::debug!(%pass, args = ?args, "Running ffmpeg");

        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| request.failure(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            %pass,
            pid = child.id(),
            output = %request.output_path.display(),
            duration_secs = request.duration_secs,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| request.failure("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| request.failure("Failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks once the stderr pipe fills, so drain it on its own thread.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut state = ProgressState::default();
        loop {
            line.clear();
            let bytes = match reader.read_line(&mut line) {
                Ok(bytes) => bytes,
                Err(e) => {
                    // Reap the child and the drain thread before bailing out.
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = stderr_task.join();
                    return Err(request.failure(format!("Failed reading ffmpeg progress: {e}")));
                }
            };
            if bytes == 0 {
                break;
            }

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            state.update(key, value);
            if key == "progress" {
                if let Some(cb) = &self.progress {
                    cb(progress_report(
                        pass,
                        &state,
                        request.duration_secs,
                        start.elapsed().as_secs_f64(),
                    ));
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| request.failure(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(request.failure(format!(
                "ffmpeg {pass} pass failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        tracing::info!(
            %pass,
            elapsed_secs = start.elapsed().as_secs_f64(),
            output = %request.output_path.display(),
            "ffmpeg pass finished"
        );
        Ok(())
    }
}

impl Renderer for FfmpegRenderer {
    fn render(&mut self, request: &RenderRequest) -> ShortformResult<()> {
        let args = ffmpeg_args(request, &self.encoding);
        self.run(request, &args)
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Full ffmpeg argument list for a request.
pub fn ffmpeg_args(request: &RenderRequest, encoding: &EncodingConfig) -> Vec<String> {
    let mut args: Vec<String> = [
        "-y",
        "-hide_banner",
        "-loglevel",
        "error",
        "-nostats",
        "-progress",
        "pipe:1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let map_video = format!("[{VIDEO_OUTPUT_LABEL}]");
    match &request.pass {
        RenderPass::Compose {
            background,
            narration,
        } => {
            args.extend(["-stream_loop".to_string(), "-1".to_string()]);
            push_input(&mut args, background);
            push_input(&mut args, narration);
            args.extend([
                "-filter_complex".to_string(),
                request.graph.to_filter_complex(),
                "-map".to_string(),
                map_video,
                "-map".to_string(),
                "1:a".to_string(),
                "-t".to_string(),
                format_secs(request.duration_secs),
            ]);
            args.extend(video_codec_args(encoding));
            args.extend([
                "-c:a".to_string(),
                encoding.audio_codec.clone(),
                "-b:a".to_string(),
                format!("{}k", encoding.audio_bitrate_kbps),
                "-ar".to_string(),
                encoding.audio_sample_rate.to_string(),
                "-ac".to_string(),
                encoding.audio_channels.to_string(),
                "-shortest".to_string(),
            ]);
        }
        RenderPass::Enhance { source } => {
            push_input(&mut args, source);
            args.extend([
                "-filter_complex".to_string(),
                request.graph.to_filter_complex(),
                "-map".to_string(),
                map_video,
                "-map".to_string(),
                "0:a?".to_string(),
            ]);
            args.extend(video_codec_args(encoding));
            args.extend(["-c:a".to_string(), "copy".to_string()]);
        }
    }

    args.push(request.output_path.to_string_lossy().into_owned());
    args
}

fn push_input(args: &mut Vec<String>, path: &Path) {
    args.push("-i".to_string());
    args.push(path.to_string_lossy().into_owned());
}

fn video_codec_args(encoding: &EncodingConfig) -> Vec<String> {
    vec![
        "-c:v".to_string(),
        encoding.video_codec.clone(),
        "-crf".to_string(),
        encoding.crf.to_string(),
        "-preset".to_string(),
        encoding.preset.clone(),
        "-profile:v".to_string(),
        encoding.profile.clone(),
        "-level".to_string(),
        encoding.level.clone(),
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]
}

fn format_secs(secs: f64) -> String {
    format!("{:.3}", secs.max(0.0))
}

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both keys.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    pass: PassKind,
    state: &ProgressState,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> RenderProgress {
    let progress = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    RenderProgress {
        pass,
        progress: if state.complete { 1.0 } else { progress },
        out_time_secs: state.out_time_secs,
        eta_secs,
        complete: state.complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_graph::build_enhancement_graph;
    use shortform_common::config::EnhanceConfig;

    fn compose_request() -> RenderRequest {
        RenderRequest {
            pass: RenderPass::Compose {
                background: PathBuf::from("bg/loop.mp4"),
                narration: PathBuf::from("stories/a_tts.mp3"),
            },
            graph: build_enhancement_graph(&EnhanceConfig::default()),
            output_path: PathBuf::from("out/a_short.mp4"),
            duration_secs: 42.5,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_compose_args_loop_background_and_trim_to_narration() {
        let args = ffmpeg_args(&compose_request(), &EncodingConfig::default());

        let loop_pos = args.iter().position(|a| a == "-stream_loop").unwrap();
        assert_eq!(args[loop_pos + 1], "-1");
        assert_eq!(args[loop_pos + 2], "-i");
        assert_eq!(args[loop_pos + 3], "bg/loop.mp4");
        assert_eq!(args[loop_pos + 5], "stories/a_tts.mp3");

        assert_eq!(value_after(&args, "-t"), Some("42.500"));
        assert_eq!(value_after(&args, "-c:v"), Some("libx264"));
        assert_eq!(value_after(&args, "-crf"), Some("18"));
        assert_eq!(value_after(&args, "-b:a"), Some("192k"));
        assert_eq!(value_after(&args, "-ar"), Some("44100"));
        assert!(args.contains(&"-shortest".to_string()));
        assert!(args.contains(&"1:a".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("out/a_short.mp4"));
    }

    #[test]
    fn test_enhance_args_copy_audio() {
        let request = RenderRequest {
            pass: RenderPass::Enhance {
                source: PathBuf::from("out/a_short.mp4"),
            },
            output_path: PathBuf::from("out/a_short_enhanced.mp4"),
            ..compose_request()
        };
        let args = ffmpeg_args(&request, &EncodingConfig::default());

        assert!(!args.contains(&"-stream_loop".to_string()));
        assert_eq!(value_after(&args, "-i"), Some("out/a_short.mp4"));
        assert_eq!(value_after(&args, "-c:a"), Some("copy"));
        assert!(args.contains(&"0:a?".to_string()));
        assert_eq!(
            value_after(&args, "-filter_complex"),
            Some("[0:v]eq=saturation=1.05:contrast=1.02,format=yuv420p[outv]")
        );
    }

    #[test]
    fn test_failure_matches_pass() {
        let compose = compose_request();
        assert!(matches!(
            compose.failure("boom"),
            ShortformError::Composition { .. }
        ));

        let enhance = RenderRequest {
            pass: RenderPass::Enhance {
                source: PathBuf::from("x.mp4"),
            },
            ..compose
        };
        assert!(matches!(
            enhance.failure("boom"),
            ShortformError::Enhancement { .. }
        ));
    }

    #[test]
    fn test_progress_report_clamps_and_completes() {
        let mut state = ProgressState::default();
        state.update("out_time_us", "5000000");
        let report = progress_report(PassKind::Compose, &state, 10.0, 2.0);
        assert!((report.progress - 0.5).abs() < 1e-9);
        assert!((report.eta_secs - 2.0).abs() < 1e-9);
        assert!(!report.complete);

        state.update("out_time_ms", "20000000");
        state.update("progress", "end");
        let report = progress_report(PassKind::Compose, &state, 10.0, 4.0);
        assert_eq!(report.progress, 1.0);
        assert!(report.complete);
    }

    #[test]
    fn test_missing_binary_is_composition_failure() {
        let mut renderer =
            FfmpegRenderer::new(EncodingConfig::default()).with_binary("shortform-no-such-ffmpeg");
        assert!(!renderer.is_available());
        let err = renderer.render(&compose_request()).unwrap_err();
        assert!(matches!(err, ShortformError::Composition { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_progress_stops_the_process() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        // Emits bytes that are not UTF-8 on the progress pipe, then hangs.
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-ffmpeg");
        std::fs::write(&script, "#!/bin/sh\nprintf '\\377\\376\\n'\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut renderer = FfmpegRenderer::new(EncodingConfig::default())
            .with_binary(script.to_string_lossy());
        let start = Instant::now();
        let err = renderer.render(&compose_request()).unwrap_err();

        assert!(matches!(err, ShortformError::Composition { .. }));
        assert!(err.to_string().contains("progress"));
        assert!(start.elapsed() < Duration::from_secs(20));
    }
}
