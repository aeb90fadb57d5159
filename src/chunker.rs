//! Chronological chunking of the narrative text.
//!
//! Chunks are blank-line separated paragraphs, in document order. Downstream
//! code treats chunk index + 1 as the chapter id.

/// Split the novel text into trimmed, non-empty paragraph chunks.
pub fn chunk_novel(novel_text: &str) -> Vec<String> {
    novel_text
        .split("\n\n")
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_split_on_blank_lines() {
        let text = "First paragraph.\nStill first.\n\nSecond paragraph.\n\n\nThird.";
        let chunks = chunk_novel(text);
        assert_eq!(
            chunks,
            vec!["First paragraph.\nStill first.", "Second paragraph.", "Third."]
        );
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk_novel("").is_empty());
        assert!(chunk_novel("\n\n\n").is_empty());
    }
}
