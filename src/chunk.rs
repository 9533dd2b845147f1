//! Fixed-size, overlapping text chunker.
//!
//! Starting at offset 0, each chunk takes the next `size` characters, then
//! the window advances by `size - overlap`. Iteration stops once the window
//! start passes the end of the text, so the last chunk may be shorter than
//! `size`. Offsets count Unicode scalar values, never bytes, so a chunk
//! boundary cannot split a multi-byte character.

use crate::error::{PipelineError, PipelineResult};
use crate::models::Chunk;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

fn validate(size: usize, overlap: usize) -> PipelineResult<()> {
    if size == 0 {
        return Err(PipelineError::InvalidConfiguration(
            "chunk size must be > 0".to_string(),
        ));
    }
    if overlap >= size {
        return Err(PipelineError::InvalidConfiguration(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, size
        )));
    }
    Ok(())
}

/// Character windows `(start_char, byte_range)` covering `text`.
fn windows(
    text: &str,
    size: usize,
    overlap: usize,
) -> PipelineResult<Vec<(usize, std::ops::Range<usize>)>> {
    validate(size, overlap)?;

    // Byte offset of every character boundary, including the end of text.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = bounds.len() - 1;
    let step = size - overlap;

    let mut out = Vec::with_capacity(len.div_ceil(step));
    let mut start = 0;
    while start < len {
        let end = (start + size).min(len);
        out.push((start, bounds[start]..bounds[end]));
        start += step;
    }
    Ok(out)
}

/// Split `text` into overlapping segments of at most `size` characters.
///
/// Empty input yields no chunks. Fails with
/// [`PipelineError::InvalidConfiguration`] when `size == 0` or
/// `overlap >= size`.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> PipelineResult<Vec<String>> {
    Ok(windows(text, size, overlap)?
        .into_iter()
        .map(|(_, range)| text[range].to_string())
        .collect())
}

/// Split a document's extracted text into [`Chunk`]s carrying provenance.
/// Ordinals are contiguous from 0 in text order.
pub fn chunk_document(
    source: &str,
    text: &str,
    size: usize,
    overlap: usize,
) -> PipelineResult<Vec<Chunk>> {
    Ok(windows(text, size, overlap)?
        .into_iter()
        .enumerate()
        .map(|(ordinal, (start, range))| Chunk {
            source: source.to_string(),
            ordinal,
            start,
            text: text[range].to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> String {
        (0..len)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect()
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let chunks = chunk_text("", 1000, 200).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("Hello, world!", 1000, 200).unwrap();
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn test_2400_chars_gives_three_chunks() {
        let text = sample(2400);
        let chunks = chunk_text(&text, 1000, 200).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1000);
        assert_eq!(chunks[1].len(), 1000);
        assert_eq!(chunks[2].len(), 800);
        assert_eq!(chunks[2], text[1600..]);
    }

    #[test]
    fn test_chunk_count_matches_step_formula() {
        for len in [1, 199, 200, 799, 800, 801, 1000, 1001, 1799, 1800, 5000] {
            let chunks = chunk_text(&sample(len), 1000, 200).unwrap();
            assert_eq!(chunks.len(), len.div_ceil(800), "len={}", len);
            for c in &chunks {
                assert!(c.chars().count() <= 1000);
            }
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = sample(3500);
        let chunks = chunk_text(&text, 1000, 200).unwrap();
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().skip(800).collect();
            let head: String = pair[1].chars().take(200).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_overlap_equal_to_size_is_invalid() {
        let err = chunk_text("abc", 100, 100).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_zero_size_is_invalid() {
        let err = chunk_text("abc", 0, 0).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_empty_text_still_validates_config() {
        assert!(chunk_text("", 10, 20).is_err());
    }

    #[test]
    fn test_multibyte_characters_are_not_split() {
        let text = "é".repeat(25);
        let chunks = chunk_text(&text, 10, 2).unwrap();
        assert_eq!(chunks[0], "é".repeat(10));
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[2].chars().count(), 9);
        assert_eq!(chunks[3], "é");
    }

    #[test]
    fn test_document_chunks_carry_provenance() {
        let text = sample(2400);
        let chunks = chunk_document("brief.txt", &text, 1000, 200).unwrap();
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.ordinal, i);
            assert_eq!(c.start, i * 800);
            assert_eq!(c.source, "brief.txt");
        }
    }

    #[test]
    fn test_deterministic() {
        let text = sample(4321);
        assert_eq!(
            chunk_text(&text, 300, 50).unwrap(),
            chunk_text(&text, 300, 50).unwrap()
        );
    }
}
