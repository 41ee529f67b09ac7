//! Fixed-window overlapping text chunking.

use crate::error::ConfigError;

/// Split text into overlapping windows of `size` characters.
///
/// Windows start at offsets `0, step, 2*step, ...` where
/// `step = size - overlap`; the final chunk runs to the end of the text
/// and may be shorter than `size`. Consecutive chunks share `overlap`
/// characters, which bounds context loss at chunk boundaries at the cost
/// of redundant storage and embedding work.
///
/// Every offset strictly below the text length emits a chunk, including
/// a trailing window that lies wholly inside the previous chunk's
/// overlap. The chunk count is therefore one more than
/// `ceil((chars - overlap) / step)` whenever `chars mod step` falls in
/// `(0, overlap]`.
///
/// Empty text produces zero chunks. `overlap >= size` (a step that would
/// never advance) is rejected rather than looped.
pub fn chunk(text: &str, size: usize, overlap: usize) -> Result<Vec<String>, ConfigError> {
    if size == 0 || overlap >= size {
        return Err(ConfigError::InvalidChunking { size, overlap });
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }

    let step = size - overlap;
    let mut chunks = Vec::with_capacity(chars.len().div_ceil(step));
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::chunk;
    use crate::error::ConfigError;

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk("", 500, 50).unwrap().is_empty());
    }

    #[test]
    fn short_text_yields_one_whole_chunk() {
        let chunks = chunk("hello world", 500, 50).unwrap();
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn overlap_not_smaller_than_size_is_rejected() {
        assert!(matches!(
            chunk("text", 50, 50),
            Err(ConfigError::InvalidChunking { .. })
        ));
        assert!(matches!(
            chunk("text", 50, 80),
            Err(ConfigError::InvalidChunking { .. })
        ));
        assert!(matches!(
            chunk("text", 0, 0),
            Err(ConfigError::InvalidChunking { .. })
        ));
    }

    #[test]
    fn chunk_count_matches_stride_formula() {
        // 1200 chars at size 500 / overlap 50: offsets 0, 450, 900.
        let text = "a".repeat(1200);
        let chunks = chunk(&text, 500, 50).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 500);
        assert_eq!(chunks[1].len(), 500);
        assert_eq!(chunks[2].len(), 300);
    }

    #[test]
    fn trailing_offset_inside_the_overlap_still_emits_a_chunk() {
        // 54050 chars at size 500 / overlap 50: the residue past the last
        // full stride (54050 mod 450 = 50) sits inside the overlap, so a
        // final window starts at 54000 even though its content is wholly
        // contained in the previous chunk.
        let text = "y".repeat(54050);
        let chunks = chunk(&text, 500, 50).unwrap();
        assert_eq!(chunks.len(), 121);
        assert_eq!(chunks.last().unwrap().len(), 50);
    }

    #[test]
    fn no_chunk_exceeds_the_window_size() {
        let text: String = ('a'..='z').cycle().take(1337).collect();
        for c in chunk(&text, 100, 30).unwrap() {
            assert!(c.chars().count() <= 100);
        }
    }

    #[test]
    fn step_prefixes_reconstruct_the_text() {
        let text: String = ('a'..='z').cycle().take(1111).collect();
        let size = 100;
        let overlap = 30;
        let step = size - overlap;

        let chunks = chunk(&text, size, overlap).unwrap();
        let mut rebuilt = String::new();
        for c in &chunks[..chunks.len() - 1] {
            rebuilt.extend(c.chars().take(step));
        }
        rebuilt.push_str(chunks.last().unwrap());
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn consecutive_chunks_share_the_overlap() {
        let text: String = ('a'..='z').cycle().take(400).collect();
        let chunks = chunk(&text, 100, 30).unwrap();
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().skip(70).collect();
            let head: String = pair[1].chars().take(tail.chars().count()).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn multibyte_text_chunks_on_character_boundaries() {
        let text = "héllo wörld ✨".repeat(40);
        let chunks = chunk(&text, 64, 16).unwrap();
        assert!(!chunks.is_empty());
        let total: usize = text.chars().count();
        let expected = (total - 16).div_ceil(48);
        assert_eq!(chunks.len(), expected);
    }
}
