use std::collections::HashSet;
use std::sync::OnceLock;

/// English stop words, plus the modal-verb additions the source text processor layered on
/// top of the standard NLTK list.
const BASE_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "now",
    "would", "could", "should", "might", "must",
];

static STOP_WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();

/// Whether `word` (already lowercased) is a stop word.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS
        .get_or_init(|| BASE_STOP_WORDS.iter().copied().collect())
        .contains(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_custom_modal_additions() {
        assert!(is_stop_word("would"));
        assert!(is_stop_word("could"));
        assert!(is_stop_word("should"));
        assert!(is_stop_word("might"));
        assert!(is_stop_word("must"));
    }

    #[test]
    fn keeps_content_words() {
        assert!(!is_stop_word("search"));
        assert!(!is_stop_word("rust"));
    }
}
