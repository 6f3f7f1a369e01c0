use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\b\w+\b").expect("valid regex");
}

/// Count word frequencies over the lowercased text. One row per distinct
/// word lands in the store for each persisted page.
pub fn word_frequencies(text: &str) -> HashMap<String, u32> {
    let lowered = text.to_lowercase();
    let mut frequencies = HashMap::new();
    for word in WORD.find_iter(&lowered) {
        *frequencies.entry(word.as_str().to_string()).or_insert(0) += 1;
    }
    frequencies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_lowercased_words() {
        let freqs = word_frequencies("Rust rust RUST, systems!");
        assert_eq!(freqs.get("rust"), Some(&3));
        assert_eq!(freqs.get("systems"), Some(&1));
        assert_eq!(freqs.len(), 2);
    }

    #[test]
    fn empty_text_yields_no_rows() {
        assert!(word_frequencies("").is_empty());
        assert!(word_frequencies("  \n ").is_empty());
    }
}
