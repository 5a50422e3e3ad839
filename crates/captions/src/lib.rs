//! Shortform Captions
//!
//! Timing transforms for sequential caption files:
//! - **Cue parsing:** numbered `HH:MM:SS,mmm --> HH:MM:SS,mmm` blocks into [`Cue`]s
//! - **Word redistribution:** one cue per word, splitting each span evenly
//! - **Display buffering:** widen every cue by a fixed safety margin
//! - **In-place processing:** rewrite a caption file with the transforms applied

pub mod buffer;
pub mod cue;
pub mod pipeline;
pub mod redistribute;
pub mod srt;

pub use buffer::*;
pub use cue::*;
pub use pipeline::*;
pub use redistribute::*;
pub use srt::*;
