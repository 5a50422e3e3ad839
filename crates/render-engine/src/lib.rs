//! Shortform Render Engine
//!
//! Turns a narration track and its caption file into a vertical short by
//! looping a background clip underneath word-by-word captions. Rendering
//! itself is delegated to an external renderer (ffmpeg); this crate
//! decides what to ask it for and owns every temporary artifact.
//!
//! # Pipeline Architecture
//!
//! ```text
//! backgrounds/*.mp4 ──► random pick ──┐
//!                                     │
//! <id>_subs.srt ──► stage copy ──► per-word retime ──► buffer ──┐
//!                                     │                         │
//!                                     ▼                         ▼
//!                  scale/pad ─► blur ─► eq ─► vignette ─► subtitles ─► fps ─► format
//!                                                                           │
//! <id>_tts.mp3 ──────────────────────────────────────────────► Compose (ffmpeg)
//!                                                                           │
//!                                                                           ▼
//!                                                               Enhance (optional)
//!                                                                           │
//!                                                                           ▼
//!                                                              <id>_short.mp4
//! ```

pub mod batch;
pub mod filter_graph;
pub mod fonts;
pub mod job;
pub mod orchestrator;
pub mod pool;
pub mod probe;
pub mod renderer;
pub mod sources;
pub mod staging;

pub use batch::*;
pub use job::*;
pub use orchestrator::*;
