//! Display buffering.
//!
//! Widens a cue by a fixed margin on both sides so captions do not vanish
//! before the narration catches up. Start times clamp at zero. Buffering
//! compounds: apply it exactly once per cue.

use std::time::Duration;

use crate::cue::Cue;

/// Widen one cue by `buffer` on each side.
pub fn apply_buffer(cue: &Cue, buffer: Duration) -> Cue {
    Cue {
        index: cue.index,
        start: cue.start.saturating_sub(buffer),
        end: cue.end + buffer,
        text: cue.text.clone(),
    }
}

/// Widen every cue by `buffer`.
pub fn buffer_all(cues: &[Cue], buffer: Duration) -> Vec<Cue> {
    cues.iter().map(|cue| apply_buffer(cue, buffer)).collect()
}
