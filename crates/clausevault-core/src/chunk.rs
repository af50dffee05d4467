//! Sentence-boundary text chunker with an overlap window.
//!
//! Splits whitespace-normalized text into [`ChunkSpan`]s that aim for a
//! configurable `target_words` size. Splitting occurs on sentence-terminator
//! boundaries to preserve semantic coherence, and a trailing overlap window
//! carries cross-boundary context into the next chunk.
//!
//! # Algorithm
//!
//! 1. Normalize whitespace (collapse runs to single spaces, trim).
//! 2. Split into sentences at `.`, `!`, or `?` followed by a space.
//! 3. Accumulate sentences into a buffer while its word count stays under
//!    `target_words`.
//! 4. When the next sentence would exceed `target_words` and the buffer is
//!    non-empty, emit the buffer as a chunk with its character span, seed the
//!    next buffer with the trailing one or two sentences that fit inside
//!    `overlap_words`, and roll the character cursor back by exactly the
//!    overlap's character length so spans stay consistent.
//! 5. Always emit the final, possibly under-sized, buffer.
//!
//! A single sentence longer than `target_words` is emitted whole; the target
//! is a soft goal, not a hard cap. Identical input and parameters always
//! yield identical chunk boundaries, which is what makes re-embedding
//! addressable by the same ordinals. Empty or whitespace-only input yields
//! an empty sequence.

/// One emitted segment. `start_char` and `end_char` are character offsets
/// into the normalized text, with `text == normalized[start_char..end_char]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    pub text: String,
    pub start_char: usize,
    pub end_char: usize,
    pub word_count: usize,
}

/// Collapse all whitespace runs to single spaces and trim the ends.
///
/// The normalized form is the offset space for every chunk span, so it must
/// be applied identically wherever offsets are interpreted.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split normalized text at sentence terminators followed by a space.
///
/// The terminator stays with its sentence, and rejoining the returned
/// sentences with single spaces reproduces the input exactly.
fn split_sentences(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if (b == b'.' || b == b'!' || b == b'?') && i + 1 < bytes.len() && bytes[i + 1] == b' ' {
            sentences.push(&text[start..=i]);
            start = i + 2;
            i += 2;
        } else {
            i += 1;
        }
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

fn words_of(s: &str) -> usize {
    s.split_whitespace().count()
}

fn chars_of(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` into overlapping, bounded segments.
///
/// Returns chunks in document order with monotonically non-decreasing spans,
/// except for the deliberate backward adjustment introduced by the overlap
/// window.
pub fn chunk_text(text: &str, target_words: usize, overlap_words: usize) -> Vec<ChunkSpan> {
    let normalized = normalize_whitespace(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    let sentences = split_sentences(&normalized);

    let mut chunks: Vec<ChunkSpan> = Vec::new();
    let mut buf: Vec<&str> = Vec::new();
    let mut buf_words = 0usize;
    let mut cursor = 0usize;

    for sentence in sentences {
        let words = words_of(sentence);

        if buf_words + words > target_words && !buf.is_empty() {
            let chunk_text = buf.join(" ");
            let end = cursor + chars_of(&chunk_text);
            chunks.push(ChunkSpan {
                text: chunk_text,
                start_char: cursor,
                end_char: end,
                word_count: buf_words,
            });

            let overlap = overlap_tail(&buf, overlap_words);
            if overlap.is_empty() {
                // No overlap carried; the next chunk starts past the
                // joining space.
                cursor = end + 1;
                buf_words = 0;
                buf = Vec::new();
            } else {
                let overlap_chars: usize =
                    overlap.iter().map(|s| chars_of(s)).sum::<usize>() + overlap.len() - 1;
                cursor = end - overlap_chars;
                buf_words = overlap.iter().map(|s| words_of(s)).sum();
                buf = overlap;
            }
        }

        buf.push(sentence);
        buf_words += words;
    }

    if !buf.is_empty() {
        let chunk_text = buf.join(" ");
        let end = cursor + chars_of(&chunk_text);
        chunks.push(ChunkSpan {
            text: chunk_text,
            start_char: cursor,
            end_char: end,
            word_count: buf_words,
        });
    }

    chunks
}

/// Pick the trailing sentences (at most two) whose combined word count fits
/// inside `overlap_words`.
fn overlap_tail<'a>(buf: &[&'a str], overlap_words: usize) -> Vec<&'a str> {
    let mut overlap: Vec<&'a str> = Vec::new();
    let mut acc = 0usize;
    for &sentence in buf.iter().rev().take(2) {
        let w = words_of(sentence);
        if acc + w > overlap_words {
            break;
        }
        overlap.insert(0, sentence);
        acc += w;
    }
    overlap
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_slice(s: &str, start: usize, end: usize) -> String {
        s.chars().skip(start).take(end - start).collect()
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(chunk_text("", 500, 50).is_empty());
        assert!(chunk_text("   \n\t  ", 500, 50).is_empty());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_text("Hello, world!", 500, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello, world!");
        assert_eq!(chunks[0].start_char, 0);
        assert_eq!(chunks[0].end_char, 13);
        assert_eq!(chunks[0].word_count, 2);
    }

    #[test]
    fn test_whitespace_normalized_before_chunking() {
        let chunks = chunk_text("First   sentence.\n\nSecond\tsentence.", 500, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "First sentence. Second sentence.");
    }

    #[test]
    fn test_overlap_scenario_three_sentences() {
        let chunks = chunk_text("Sentence one. Sentence two. Sentence three.", 4, 2);
        assert!(chunks.len() >= 2, "expected at least two chunks");
        assert_eq!(chunks[0].text, "Sentence one. Sentence two.");
        assert!(
            chunks[1].text.starts_with("Sentence two."),
            "second chunk must begin with the overlapping tail of the first: {:?}",
            chunks[1].text
        );
    }

    #[test]
    fn test_spans_index_the_normalized_text() {
        let text = "Alpha bravo charlie. Delta echo foxtrot golf. Hotel india juliet. Kilo lima.";
        let normalized = normalize_whitespace(text);
        let chunks = chunk_text(text, 6, 3);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert_eq!(
                c.text,
                char_slice(&normalized, c.start_char, c.end_char),
                "span does not slice back to chunk text"
            );
        }
    }

    #[test]
    fn test_coverage_reconstructs_cleaned_text() {
        let text = "One two three. Four five six. Seven eight nine. Ten eleven twelve.";
        let normalized = normalize_whitespace(text);
        let chunks = chunk_text(text, 6, 3);
        assert!(chunks.len() > 1);

        // Discounting overlap, consecutive spans tile the normalized text.
        let mut rebuilt = chunks[0].text.clone();
        for pair in chunks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.start_char < prev.end_char {
                let skip = prev.end_char - next.start_char;
                let fresh: String = next.text.chars().skip(skip).collect();
                rebuilt.push_str(&fresh);
            } else {
                rebuilt.push(' ');
                rebuilt.push_str(&next.text);
            }
        }
        assert_eq!(rebuilt, normalized);
    }

    #[test]
    fn test_oversized_sentence_emitted_whole() {
        let long = "alpha bravo charlie delta echo foxtrot golf hotel india juliet.";
        let text = format!("Short one. {} Tail two.", long);
        let chunks = chunk_text(&text, 4, 2);
        assert!(
            chunks.iter().any(|c| c.text.contains("alpha bravo")
                && c.text.contains("juliet.")),
            "oversized sentence must not be split: {:?}",
            chunks.iter().map(|c| &c.text).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta gamma. Delta epsilon zeta. Eta theta iota. Kappa lambda mu.";
        let a = chunk_text(text, 6, 3);
        let b = chunk_text(text, 6, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_overlap_has_no_backward_adjustment() {
        let text = "One two three. Four five six. Seven eight nine.";
        let chunks = chunk_text(text, 3, 0);
        for pair in chunks.windows(2) {
            assert!(pair[1].start_char > pair[0].end_char - 1);
        }
    }

    #[test]
    fn test_no_terminator_single_sentence() {
        let chunks = chunk_text("no terminators here just words", 2, 1);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "no terminators here just words");
    }

    #[test]
    fn test_word_counts_match_text() {
        let text = "One two three. Four five six. Seven eight nine. Ten eleven twelve.";
        for c in chunk_text(text, 6, 3) {
            assert_eq!(c.word_count, c.text.split_whitespace().count());
        }
    }
}
