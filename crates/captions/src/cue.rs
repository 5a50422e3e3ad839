//! Caption cue model and timecode conversion.

use std::time::Duration;

/// A single timed caption unit.
///
/// The same shape is used for authored cues, per-word cues produced by
/// redistribution, and buffered cues: only the timing rules differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// One-based position in the caption file.
    pub index: u32,

    /// When the cue appears.
    pub start: Duration,

    /// When the cue disappears.
    pub end: Duration,

    /// Displayed text. Multi-line cues keep their line breaks.
    pub text: String,
}

impl Cue {
    pub fn new(index: u32, start: Duration, end: Duration, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            text: text.into(),
        }
    }

    /// Displayed span of the cue.
    pub fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }

    /// Whitespace-delimited words across all text lines.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.text.split_whitespace()
    }

    pub fn word_count(&self) -> usize {
        self.words().count()
    }
}

/// Parse an `HH:MM:SS,mmm` timecode.
///
/// Hours may use more than two digits; minutes and seconds must be two
/// digits below 60 and milliseconds exactly three digits. Timecodes whose
/// millisecond total does not fit in a `u64` are rejected.
pub fn parse_timecode(s: &str) -> Option<Duration> {
    let (hms, millis) = s.trim().split_once(',')?;
    if millis.len() != 3 || !millis.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut parts = hms.split(':');
    let hours = parts.next()?;
    let minutes = parts.next()?;
    let seconds = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let hours: u64 = digits(hours, 1..=usize::MAX)?;
    let minutes: u64 = digits(minutes, 2..=2)?;
    let seconds: u64 = digits(seconds, 2..=2)?;
    let millis: u64 = millis.parse().ok()?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }

    let total = hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(millis)?;
    Some(Duration::from_millis(total))
}

fn digits(s: &str, len: std::ops::RangeInclusive<usize>) -> Option<u64> {
    if !len.contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Format a duration as an `HH:MM:SS,mmm` timecode.
///
/// Sub-millisecond remainders are truncated.
pub fn format_timecode(time: Duration) -> String {
    let total_ms = time.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}
