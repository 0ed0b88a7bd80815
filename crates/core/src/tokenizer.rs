//! Minimal text tokenizer for the in-memory index
//!
//! Pipeline: UAX#29 word boundaries → remove non-alphanumeric characters
//!           → lowercase → (optionally) replace stop words by holes
//!
//! Analysis proper (lemmatization, tagging) belongs to the surrounding
//! system; this is only enough to feed [`crate::MemoryIndex`] from text.

use unicode_segmentation::UnicodeSegmentation;

/// Tokenize text into lowercase words.
///
/// # Example
///
/// ```
/// use railstat_core::tokenizer::tokenize;
///
/// let tokens = tokenize("The Quick, brown fox!");
/// assert_eq!(tokens, vec!["the", "quick", "brown", "fox"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Tokenize, keeping one empty token (a hole) per stop word.
///
/// Holes preserve the positions of the remaining words, the way an
/// analysis chain leaves position gaps for removed tokens.
///
/// # Example
///
/// ```
/// use railstat_core::tokenizer::tokenize_with_stopwords;
///
/// let tokens = tokenize_with_stopwords("the cat and the dog", &["the", "and"]);
/// assert_eq!(tokens, vec!["", "cat", "", "", "dog"]);
/// ```
pub fn tokenize_with_stopwords(text: &str, stopwords: &[&str]) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .map(|w| {
            if stopwords.contains(&w.as_str()) {
                String::new()
            } else {
                w
            }
        })
        .collect()
}
