//! Word-timing redistribution.
//!
//! Each cue is split into one cue per whitespace-delimited word. The
//! cue's span is divided into equal, contiguous slices so the word cues
//! cover `[start, end]` exactly. Indices are reassigned from a running
//! counter that carries across cues, producing a single renumbered file.

use std::time::Duration;

use crate::cue::Cue;

/// Splits cues into word cues while numbering them sequentially.
#[derive(Debug, Clone)]
pub struct WordRedistributor {
    next_index: u32,
}

impl Default for WordRedistributor {
    fn default() -> Self {
        Self::new()
    }
}

impl WordRedistributor {
    /// Start numbering at 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first_index: u32) -> Self {
        Self {
            next_index: first_index,
        }
    }

    /// Index the next emitted cue will receive.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Split one cue. Cues with no words produce nothing.
    pub fn split(&mut self, cue: &Cue) -> Vec<Cue> {
        let words: Vec<&str> = cue.words().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let count = words.len() as u128;
        let span_ns = cue.duration().as_nanos();
        let offset = |i: u128| Duration::from_nanos((span_ns * i / count) as u64);

        words
            .iter()
            .enumerate()
            .map(|(i, word)| {
                let i = i as u128;
                let index = self.next_index;
                self.next_index += 1;
                Cue {
                    index,
                    start: cue.start + offset(i),
                    end: cue.start + offset(i + 1),
                    text: (*word).to_string(),
                }
            })
            .collect()
    }
}

/// Split every cue into word cues numbered from 1.
pub fn redistribute_words(cues: &[Cue]) -> Vec<Cue> {
    let mut redistributor = WordRedistributor::new();
    cues.iter()
        .flat_map(|cue| redistributor.split(cue))
        .collect()
}

/// Renumber cues from 1 in their current order.
pub fn renumber(cues: &mut [Cue]) {
    for (i, cue) in cues.iter_mut().enumerate() {
        cue.index = i as u32 + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cue(index: u32, start_ms: u64, end_ms: u64, text: &str) -> Cue {
        Cue::new(
            index,
            Duration::from_millis(start_ms),
            Duration::from_millis(end_ms),
            text,
        )
    }

    #[test]
    fn test_two_words_split_evenly() {
        let words = redistribute_words(&[cue(1, 1000, 3000, "hello world")]);
        assert_eq!(
            words,
            vec![cue(1, 1000, 2000, "hello"), cue(2, 2000, 3000, "world")]
        );
    }

    #[test]
    fn test_single_word_passes_through_with_new_index() {
        let mut redistributor = WordRedistributor::starting_at(7);
        let out = redistributor.split(&cue(3, 500, 900, "solo"));
        assert_eq!(out, vec![cue(7, 500, 900, "solo")]);
        assert_eq!(redistributor.next_index(), 8);
    }

    #[test]
    fn test_counter_carries_across_cues() {
        let cues = vec![
            cue(1, 0, 3000, "one two three"),
            cue(2, 3000, 4000, "four"),
            cue(3, 4000, 6000, "five six"),
        ];
        let words = redistribute_words(&cues);
        let indices: Vec<u32> = words.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(words[3].text, "four");
    }

    #[test]
    fn test_zero_word_cue_is_dropped() {
        let cues = vec![
            cue(1, 0, 1000, "   "),
            cue(2, 1000, 2000, "kept"),
        ];
        let words = redistribute_words(&cues);
        assert_eq!(words, vec![cue(1, 1000, 2000, "kept")]);
    }

    #[test]
    fn test_uneven_split_still_covers_span_exactly() {
        let out = redistribute_words(&[cue(1, 0, 1000, "a b c")]);
        assert_eq!(out[0].start, Duration::ZERO);
        assert_eq!(out[2].end, Duration::from_secs(1));
        assert_eq!(out[0].end, out[1].start);
        assert_eq!(out[1].end, out[2].start);
    }

    #[test]
    fn test_renumber() {
        let mut cues = vec![cue(9, 0, 1, "a"), cue(4, 1, 2, "b")];
        renumber(&mut cues);
        assert_eq!(cues[0].index, 1);
        assert_eq!(cues[1].index, 2);
    }

    fn arb_cues() -> impl Strategy<Value = Vec<Cue>> {
        prop::collection::vec(
            (
                1u64..10_000,
                prop::collection::vec("[a-z]{1,6}", 0..8),
            ),
            0..12,
        )
        .prop_map(|specs| {
            let mut start = 0u64;
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (len_ms, words))| {
                    let c = cue(i as u32 + 1, start, start + len_ms, &words.join(" "));
                    start += len_ms;
                    c
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_word_cues_partition_each_span(source in arb_cues()) {
            let mut redistributor = WordRedistributor::new();
            for original in &source {
                let words = redistributor.split(original);
                prop_assert_eq!(words.len(), original.word_count());
                if words.is_empty() {
                    continue;
                }

                prop_assert_eq!(words[0].start, original.start);
                prop_assert_eq!(words[words.len() - 1].end, original.end);
                for pair in words.windows(2) {
                    prop_assert_eq!(pair[0].end, pair[1].start);
                }

                let total: Duration = words.iter().map(Cue::duration).sum();
                prop_assert_eq!(total, original.duration());

                let slice = original.duration().as_nanos() / words.len() as u128;
                for word in &words {
                    let d = word.duration().as_nanos();
                    prop_assert!(d == slice || d == slice + 1);
                }
            }
        }

        #[test]
        fn prop_indices_are_contiguous_from_one(source in arb_cues()) {
            let words = redistribute_words(&source);
            for (i, word) in words.iter().enumerate() {
                prop_assert_eq!(word.index, i as u32 + 1);
                prop_assert!(!word.text.trim().is_empty());
                prop_assert_eq!(word.word_count(), 1);
            }
        }
    }
}
