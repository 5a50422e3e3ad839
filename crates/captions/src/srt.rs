//! Reading and writing sequential caption files.
//!
//! A file is a list of blocks separated by blank lines. Each block holds
//! an integer index line, a `start --> end` timecode line, and one or more
//! text lines.

use shortform_common::error::{ShortformError, ShortformResult};

use crate::cue::{format_timecode, parse_timecode, Cue};

/// Parse caption file content into cues, in file order.
///
/// Trailing blank lines, CRLF line endings, a leading byte-order mark and
/// a missing final separator are all accepted.
pub fn parse_srt(content: &str) -> ShortformResult<Vec<Cue>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut cues = Vec::new();
    let mut block: Vec<(usize, &str)> = Vec::new();

    for (i, raw) in content.lines().enumerate() {
        let line = raw.trim_end();
        if line.trim().is_empty() {
            if !block.is_empty() {
                cues.push(parse_block(&block)?);
                block.clear();
            }
            continue;
        }
        block.push((i + 1, line));
    }

    if !block.is_empty() {
        cues.push(parse_block(&block)?);
    }

    Ok(cues)
}

fn parse_block(block: &[(usize, &str)]) -> ShortformResult<Cue> {
    let (first_line, _) = block[0];
    if block.len() < 3 {
        return Err(ShortformError::malformed_cue(
            first_line,
            format!(
                "expected index, timecode and text lines, found {} line(s)",
                block.len()
            ),
        ));
    }

    let (index_line, index_raw) = block[0];
    let index: u32 = index_raw
        .trim()
        .parse()
        .ok()
        .filter(|index| *index >= 1)
        .ok_or_else(|| {
            ShortformError::malformed_cue(
                index_line,
                format!("invalid cue index '{}'", index_raw.trim()),
            )
        })?;

    let (time_line, time_raw) = block[1];
    let (start_raw, end_raw) = time_raw.split_once("-->").ok_or_else(|| {
        ShortformError::malformed_cue(time_line, "timecode line is missing '-->'")
    })?;
    let start = parse_timecode(start_raw).ok_or_else(|| {
        ShortformError::malformed_cue(
            time_line,
            format!("unparseable start timecode '{}'", start_raw.trim()),
        )
    })?;
    // Anything after the end timecode (position hints) is ignored.
    let end_token = end_raw.split_whitespace().next().unwrap_or_default();
    let end = parse_timecode(end_token).ok_or_else(|| {
        ShortformError::malformed_cue(
            time_line,
            format!("unparseable end timecode '{}'", end_raw.trim()),
        )
    })?;
    if end <= start {
        return Err(ShortformError::malformed_cue(
            time_line,
            format!(
                "cue ends at {} which is not after its start {}",
                format_timecode(end),
                format_timecode(start)
            ),
        ));
    }

    let text = block[2..]
        .iter()
        .map(|(_, line)| line.trim())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Cue {
        index,
        start,
        end,
        text,
    })
}

/// Generate caption file content from cues.
pub fn generate_srt(cues: &[Cue]) -> String {
    let mut output = String::new();

    for cue in cues {
        output.push_str(&format!("{}\n", cue.index));
        output.push_str(&format!(
            "{} --> {}\n",
            format_timecode(cue.start),
            format_timecode(cue.end),
        ));
        output.push_str(&cue.text);
        output.push_str("\n\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_basic_file() {
        let content = "1\n00:00:01,000 --> 00:00:03,000\nhello world\n\n2\n00:00:03,500 --> 00:00:05,000\nsecond cue\n";
        let cues = parse_srt(content).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(
            cues[0],
            Cue::new(
                1,
                Duration::from_secs(1),
                Duration::from_secs(3),
                "hello world"
            )
        );
        assert_eq!(cues[1].index, 2);
        assert_eq!(cues[1].start, Duration::from_millis(3500));
    }

    #[test]
    fn test_parse_tolerates_missing_final_separator_and_trailing_blanks() {
        let no_separator = "1\n00:00:00,000 --> 00:00:01,000\nlast";
        assert_eq!(parse_srt(no_separator).unwrap().len(), 1);

        let trailing = "1\n00:00:00,000 --> 00:00:01,000\nlast\n\n\n\n";
        assert_eq!(parse_srt(trailing).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_handles_crlf_and_bom() {
        let content = "\u{feff}1\r\n00:00:00,000 --> 00:00:01,000\r\nwindows line\r\n\r\n";
        let cues = parse_srt(content).unwrap();
        assert_eq!(cues[0].text, "windows line");
    }

    #[test]
    fn test_parse_keeps_multiline_text() {
        let content = "1\n00:00:00,000 --> 00:00:02,000\nline one\nline two\n";
        let cues = parse_srt(content).unwrap();
        assert_eq!(cues[0].text, "line one\nline two");
        assert_eq!(cues[0].word_count(), 4);
    }

    #[test]
    fn test_parse_ignores_position_hints() {
        let content = "1\n00:00:00,000 --> 00:00:02,000 X1:10 X2:20\ntext\n";
        let cues = parse_srt(content).unwrap();
        assert_eq!(cues[0].end, Duration::from_secs(2));
    }

    #[test]
    fn test_parse_rejects_block_without_text() {
        let content = "1\n00:00:00,000 --> 00:00:01,000\n\n2\n00:00:01,000 --> 00:00:02,000\nok\n";
        let err = parse_srt(content).unwrap_err();
        assert!(matches!(err, ShortformError::MalformedCue { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_bad_timecode() {
        let content = "1\n00:00:00.000 --> 00:00:01,000\ntext\n";
        let err = parse_srt(content).unwrap_err();
        assert!(matches!(err, ShortformError::MalformedCue { line: 2, .. }));

        let content = "1\n00:00:00,000 --> 99999999999999999:00:00,000\ntext\n";
        let err = parse_srt(content).unwrap_err();
        assert!(matches!(err, ShortformError::MalformedCue { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_bad_index_and_inverted_span() {
        let bad_index = "one\n00:00:00,000 --> 00:00:01,000\ntext\n";
        assert!(matches!(
            parse_srt(bad_index),
            Err(ShortformError::MalformedCue { line: 1, .. })
        ));

        let inverted = "1\n00:00:02,000 --> 00:00:01,000\ntext\n";
        assert!(matches!(
            parse_srt(inverted),
            Err(ShortformError::MalformedCue { line: 2, .. })
        ));
    }

    #[test]
    fn test_empty_content_has_no_cues() {
        assert!(parse_srt("").unwrap().is_empty());
        assert!(parse_srt("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_srt_generation() {
        let cues = vec![
            Cue::new(
                1,
                Duration::ZERO,
                Duration::from_millis(2500),
                "Hello world",
            ),
            Cue::new(
                2,
                Duration::from_secs(3),
                Duration::from_secs(5),
                "This is a test",
            ),
        ];

        let srt = generate_srt(&cues);
        assert!(srt.contains("1\n00:00:00,000 --> 00:00:02,500\nHello world\n\n"));
        assert!(srt.contains("2\n00:00:03,000 --> 00:00:05,000\nThis is a test\n\n"));
        assert_eq!(parse_srt(&srt).unwrap(), cues);
    }
}
