use std::collections::HashSet;
use std::hash::Hasher;

use fnv::FnvHasher;

const SHINGLE_SIZE: usize = 5;

pub type Fingerprint = HashSet<u32>;

/// Cleans HTML-stripped text (whitespace collapsed, lowercased) into the set of 32-bit
/// hashes of every 5-word sliding shingle (spec §4.C). Fewer than 5 words yields an empty
/// fingerprint, which is never reported as a duplicate of anything.
pub fn fingerprint(clean_text: &str) -> Fingerprint {
    let words: Vec<&str> = clean_text.split_whitespace().collect();
    if words.len() < SHINGLE_SIZE {
        return HashSet::new();
    }
    words
        .windows(SHINGLE_SIZE)
        .map(|w| hash_shingle(&w.join(" ")))
        .collect()
}

fn hash_shingle(shingle: &str) -> u32 {
    let mut hasher = FnvHasher::default();
    hasher.write(shingle.as_bytes());
    hasher.finish() as u32
}

/// Jaccard similarity between two fingerprints; 0 if either is empty (spec §4.C).
pub fn jaccard(a: &Fingerprint, b: &Fingerprint) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_yields_empty_fingerprint() {
        assert!(fingerprint("one two three").is_empty());
    }

    #[test]
    fn identical_text_has_jaccard_one() {
        let text = "the quick brown fox jumps over the lazy dog";
        let a = fingerprint(text);
        let b = fingerprint(text);
        assert_eq!(jaccard(&a, &b), 1.0);
    }

    #[test]
    fn disjoint_text_has_jaccard_zero() {
        let a = fingerprint("alpha beta gamma delta epsilon");
        let b = fingerprint("zulu yankee xray whiskey victor");
        assert_eq!(jaccard(&a, &b), 0.0);
    }

    #[test]
    fn empty_fingerprint_is_never_similar() {
        let a: Fingerprint = HashSet::new();
        let b = fingerprint("the quick brown fox jumps over the lazy dog");
        assert_eq!(jaccard(&a, &b), 0.0);
    }
}
