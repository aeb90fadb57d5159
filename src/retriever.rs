//! Keyword retrieval of evidence passages.
//!
//! A deliberately simple case-insensitive filter over the narrative chunks,
//! used to pick the passages handed to the advisory oracle. Document order
//! is preserved.

/// Return up to `top_k` chunks containing `query` (case-insensitive).
pub fn retrieve_snippets(query: &str, chunks: &[String], top_k: usize) -> Vec<String> {
    let needle = query.to_lowercase();
    chunks
        .iter()
        .filter(|chunk| chunk.to_lowercase().contains(&needle))
        .take(top_k)
        .cloned()
        .collect()
}
