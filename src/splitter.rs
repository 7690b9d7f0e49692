//! Text chunking with a fixed character window and exact overlap.
//!
//! A chunk covers at most `chunk_size` characters. When a window has to be
//! cut short of the end of the text, the cut lands on the best separator
//! available inside the window, preferring paragraph breaks, then sentence
//! ends, then plain spaces, and falling back to a hard cut. The next window
//! starts exactly `chunk_overlap` characters before the previous cut, so
//! consecutive chunks share that many characters verbatim and the original
//! text can be rebuilt by dropping the overlap prefix of every chunk after
//! the first.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ingest::SourceDocument;
use crate::types::BotError;

/// A contiguous piece of one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk text itself.
    pub text: String,
    /// Source identifier inherited from the document.
    pub source: String,
    /// Position of this chunk within its document, starting at 0.
    pub ordinal: usize,
    /// Provenance inherited from the document.
    pub metadata: serde_json::Value,
}

/// Splits every document into overlapping chunks.
///
/// Documents are processed in order and each document restarts its chunk
/// ordinals at 0, so the output order is reproducible for identical input.
pub fn split_documents(
    documents: &[SourceDocument],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Chunk>, BotError> {
    check_window(chunk_size, chunk_overlap)?;

    let mut chunks = Vec::new();
    for document in documents {
        let pieces = split_text(&document.text, chunk_size, chunk_overlap)?;
        debug!(source = %document.source, pieces = pieces.len(), "split document");
        for (ordinal, text) in pieces.into_iter().enumerate() {
            chunks.push(Chunk {
                text,
                source: document.source.clone(),
                ordinal,
                metadata: document.metadata.clone(),
            });
        }
    }
    Ok(chunks)
}

/// Splits one text into overlapping pieces of at most `chunk_size` chars.
pub fn split_text(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<String>, BotError> {
    check_window(chunk_size, chunk_overlap)?;

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    // Byte offset of every char boundary, so cuts can slice the original.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(at, _)| at)
        .chain(std::iter::once(text.len()))
        .collect();

    let mut pieces = Vec::new();
    let mut start = 0;
    loop {
        let window_end = (start + chunk_size).min(total);
        let end = if window_end == total {
            total
        } else {
            // Cutting at or before start + overlap would stall the walk.
            cut_position(&chars, start + chunk_overlap, window_end)
        };
        pieces.push(text[offsets[start]..offsets[end]].to_string());
        if end == total {
            break;
        }
        start = end - chunk_overlap;
    }
    Ok(pieces)
}

fn check_window(chunk_size: usize, chunk_overlap: usize) -> Result<(), BotError> {
    if chunk_size == 0 {
        return Err(BotError::Config("chunk_size must be positive".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(BotError::Config(format!(
            "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Picks the cut for a window that cannot reach the end of the text.
///
/// Returns a position in `(floor, limit]`: the rightmost paragraph break if
/// one exists, otherwise the rightmost sentence end, otherwise the rightmost
/// space, otherwise `limit`. Separators stay with the chunk they close.
fn cut_position(chars: &[char], floor: usize, limit: usize) -> usize {
    rightmost(chars, floor, limit, paragraph_break)
        .or_else(|| rightmost(chars, floor, limit, sentence_end))
        .or_else(|| rightmost(chars, floor, limit, space))
        .unwrap_or(limit)
}

fn rightmost(
    chars: &[char],
    floor: usize,
    limit: usize,
    separator: fn(&[char], usize) -> bool,
) -> Option<usize> {
    (floor + 1..=limit).rev().find(|&at| separator(chars, at))
}

fn paragraph_break(chars: &[char], at: usize) -> bool {
    at >= 2 && chars[at - 1] == '\n' && chars[at - 2] == '\n'
}

fn sentence_end(chars: &[char], at: usize) -> bool {
    at >= 2
        && matches!(chars[at - 2], '.' | '!' | '?')
        && matches!(chars[at - 1], ' ' | '\n')
}

fn space(chars: &[char], at: usize) -> bool {
    chars[at - 1] == ' '
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let pieces = split_text("fits in one window", 100, 20).expect("valid window");
        assert_eq!(pieces, vec!["fits in one window".to_string()]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        let pieces = split_text("", 100, 20).expect("valid window");
        assert!(pieces.is_empty());
    }

    #[test]
    fn cuts_prefer_paragraph_breaks() {
        let pieces = split_text("alpha beta\n\ngamma delta", 14, 4).expect("valid window");
        assert_eq!(pieces, vec!["alpha beta\n\n", "ta\n\ngamma ", "mma delta"]);
    }

    #[test]
    fn cuts_prefer_sentence_ends_over_spaces() {
        let pieces =
            split_text("First sentence here. Second sentence words.", 30, 5).expect("valid window");
        assert_eq!(
            pieces,
            vec!["First sentence here. ", "ere. Second sentence words."]
        );
    }

    #[test]
    fn separator_free_text_is_hard_cut() {
        let pieces = split_text("abcdefghij", 4, 1).expect("valid window");
        assert_eq!(pieces, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let pieces = split_text("héllo wörld çafé", 7, 2).expect("valid window");
        assert_eq!(pieces, vec!["héllo ", "o wörld", "ld çafé"]);
    }

    #[test]
    fn consecutive_chunks_share_the_overlap() {
        let pieces = split_text("one two three four five six seven", 12, 4).expect("valid window");
        for pair in pieces.windows(2) {
            let tail: String = pair[0]
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            let head: String = pair[1].chars().take(4).collect();
            assert_eq!(tail, head, "overlap mismatch in {pair:?}");
        }
    }

    #[test]
    fn zero_size_window_is_rejected() {
        assert!(split_text("text", 0, 0).is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_window() {
        assert!(split_text("text", 10, 10).is_err());
        assert!(split_text("text", 10, 12).is_err());
    }

    #[test]
    fn documents_keep_provenance_and_ordinals() {
        let documents = vec![
            SourceDocument::web("https://example.test/a", "aaaa bbbb cccc dddd"),
            SourceDocument::web("https://example.test/b", "short"),
        ];
        let chunks = split_documents(&documents, 10, 2).expect("valid window");

        assert!(chunks.len() > 2, "first document should split");
        assert_eq!(chunks[0].ordinal, 0);
        assert_eq!(chunks[1].ordinal, 1);
        assert_eq!(chunks[0].source, "https://example.test/a");

        let last = chunks.last().expect("chunks present");
        assert_eq!(last.source, "https://example.test/b");
        assert_eq!(last.ordinal, 0, "ordinals restart per document");
        assert_eq!(last.metadata["origin"], "web");
    }

    #[test]
    fn rebuilding_from_chunks_restores_the_text() {
        let text = "Support hours are 9am to 6pm.\n\nFor account issues, open the app. \
                    Then pick Help, then Chat. Charges are listed on the pricing page.";
        let overlap = 8;
        let pieces = split_text(text, 24, overlap).expect("valid window");
        assert!(pieces.len() > 2, "text should need several windows");

        let mut rebuilt = pieces[0].clone();
        for piece in &pieces[1..] {
            rebuilt.extend(piece.chars().skip(overlap));
        }
        assert_eq!(rebuilt, text);
    }
}
