//! Searchable-index token pipeline
//!
//! Plaintext words become equality-searchable sidecar entries through four
//! stages: extraction, prefix expansion, normalization, and blinding.
//!
//! ```text
//! "The Quick brown"  --extract-->   ["Quick", "brown"]
//!                    --expand-->    ["Quic*", "Quick", "brow*", "brown"]
//!                    --normalize--> ["quic*", "quick", "brow*", "brown"]
//!                    --blind-->     [hmac(term_key, token) as hex]
//! ```
//!
//! Queries take a shorter path: normalization and blinding only, so the
//! stored variant `quic*` is matched by the literal query string `"quic*"`.
//! An entry is a one-way HMAC; holding the sidecar without the password
//! reveals nothing about the words.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::mac;
use crate::schedule::SUBKEY_LEN;

/// Shortest word, in code points, that enters the index.
pub const MIN_WORD_LEN: usize = 4;

/// Longest word, in code points, that enters the index.
pub const MAX_WORD_LEN: usize = 12;

// Maximal runs of letters, nonspacing marks, decimal digits, and connector
// punctuation. Anything else separates words.
fn word_runs() -> &'static Regex {
    static WORD_RUNS: OnceLock<Regex> = OnceLock::new();
    WORD_RUNS.get_or_init(|| {
        Regex::new(r"[\p{L}\p{Mn}\p{Nd}\p{Pc}]+").expect("word-run pattern is valid")
    })
}

/// Extract the indexable words of `text`: maximal word runs of
/// [`MIN_WORD_LEN`]..=[`MAX_WORD_LEN`] code points, sorted lexicographically.
pub fn extract_words(text: &str) -> Vec<String> {
    let mut words: Vec<String> = word_runs()
        .find_iter(text)
        .map(|m| m.as_str().to_owned())
        .filter(|w| {
            let n = w.chars().count();
            (MIN_WORD_LEN..=MAX_WORD_LEN).contains(&n)
        })
        .collect();
    words.sort();
    words
}

/// Emit the starred prefix variants of `word` followed by the word itself.
///
/// A word of n code points yields prefixes of 4..=n−1 code points, each
/// with a trailing `*`; a 4-code-point word yields only itself.
pub fn expand_prefixes(word: &str) -> Vec<String> {
    let n = word.chars().count();
    let mut out = Vec::with_capacity(n.saturating_sub(MIN_WORD_LEN) + 1);
    for len in MIN_WORD_LEN..n {
        let prefix: String = word.chars().take(len).collect();
        out.push(format!("{prefix}*"));
    }
    out.push(word.to_owned());
    out
}

/// Canonical token form: Unicode case fold, ASCII lower-case, then NFC.
///
/// The ASCII pass is redundant after a full case fold; the exact sequence
/// is kept because existing sidecars were written with it.
pub fn normalize_token(s: &str) -> String {
    caseless::default_case_fold_str(s)
        .to_ascii_lowercase()
        .nfc()
        .collect()
}

/// Canonical query form: case fold and NFC only. No extraction, no prefix
/// expansion; a `*` typed by the user passes through untouched.
pub fn normalize_query(s: &str) -> String {
    caseless::default_case_fold_str(s).nfc().collect()
}

/// Build the blinded token set for a plaintext.
///
/// Tokens are deduplicated, sorted, and HMAC'd under the term key; the
/// returned hex entries keep the sorted token order. Plaintext that is not
/// valid UTF-8 yields an empty set — the file still encrypts normally.
pub fn blind_terms(term_key: &[u8; SUBKEY_LEN], plaintext: &[u8]) -> Vec<String> {
    let text = match std::str::from_utf8(plaintext) {
        Ok(t) => t,
        Err(_) => return Vec::new(),
    };

    let mut tokens = BTreeSet::new();
    for word in extract_words(text) {
        for emitted in expand_prefixes(&word) {
            tokens.insert(normalize_token(&emitted));
        }
    }

    tokens
        .into_iter()
        .map(|t| mac::authenticate_hex(term_key, t.as_bytes()))
        .collect()
}

/// Blind a single query term for membership testing against `terms`.
pub fn blind_query(term_key: &[u8; SUBKEY_LEN], query: &str) -> String {
    mac::authenticate_hex(term_key, normalize_query(query).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; SUBKEY_LEN] = [0xa5; SUBKEY_LEN];

    #[test]
    fn test_extract_length_bounds() {
        let words = extract_words("abc abcd abcdefghijkl abcdefghijklm");
        assert_eq!(words, vec!["abcd", "abcdefghijkl"]);
    }

    #[test]
    fn test_extract_sorted() {
        let words = extract_words("zulu yankee xray whiskey");
        assert_eq!(words, vec!["whiskey", "xray", "yankee", "zulu"]);
    }

    #[test]
    fn test_extract_splits_on_punctuation() {
        let words = extract_words("alpha-bravo,charlie.delta");
        assert_eq!(words, vec!["alpha", "bravo", "charlie", "delta"]);
    }

    #[test]
    fn test_extract_keeps_connector_punctuation() {
        // underscore is Pc, so snake_case survives as one run
        let words = extract_words("snake_case");
        assert_eq!(words, vec!["snake_case"]);
    }

    #[test]
    fn test_extract_keeps_digits() {
        let words = extract_words("abc123 12 2024");
        assert_eq!(words, vec!["2024", "abc123"]);
    }

    #[test]
    fn test_extract_non_latin() {
        let words = extract_words("это пример текста");
        assert_eq!(words, vec!["пример", "текста"]);
    }

    #[test]
    fn test_expand_minimum_length_word() {
        assert_eq!(expand_prefixes("abcd"), vec!["abcd"]);
    }

    #[test]
    fn test_expand_five_letter_word() {
        assert_eq!(expand_prefixes("abcde"), vec!["abcd*", "abcde"]);
    }

    #[test]
    fn test_expand_seven_letter_word() {
        assert_eq!(
            expand_prefixes("example"),
            vec!["exam*", "examp*", "exampl*", "example"]
        );
    }

    #[test]
    fn test_normalize_case_folds() {
        assert_eq!(normalize_token("QUICK"), "quick");
        // ß case-folds to "ss"
        assert_eq!(normalize_token("Straße"), "strasse");
    }

    #[test]
    fn test_normalize_composes_nfc() {
        // "e" + combining acute accent composes to a single code point
        assert_eq!(normalize_token("caf\u{0065}\u{0301}"), "caf\u{00e9}");
    }

    #[test]
    fn test_query_normalization_keeps_star() {
        assert_eq!(normalize_query("QUIC*"), "quic*");
    }

    #[test]
    fn test_blind_terms_empty_for_invalid_utf8() {
        assert!(blind_terms(&KEY, &[0xff, 0xfe, 0x00, 0x01]).is_empty());
    }

    #[test]
    fn test_blind_terms_unique_sorted_hex() {
        let terms = blind_terms(&KEY, b"delta delta echo echo foxtrot");
        for t in &terms {
            assert_eq!(t.len(), 64);
            assert!(t.bytes().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
        let unique: BTreeSet<&String> = terms.iter().collect();
        assert_eq!(unique.len(), terms.len());
    }

    #[test]
    fn test_word_and_prefix_queries_hit() {
        let terms = blind_terms(&KEY, b"The quick brown fox jumps");

        // whole words of indexable length
        for word in ["quick", "brown", "jumps"] {
            assert!(terms.contains(&blind_query(&KEY, word)), "{word} missed");
        }
        // every legal prefix query for "quick" (length 4 only, |w| = 5)
        assert!(terms.contains(&blind_query(&KEY, "quic*")));

        // below minimum prefix length
        assert!(!terms.contains(&blind_query(&KEY, "qui*")));
        // too short to be indexed at all
        assert!(!terms.contains(&blind_query(&KEY, "fox")));
        // absent word
        assert!(!terms.contains(&blind_query(&KEY, "jumped")));
        // the full word is never stored with a star
        assert!(!terms.contains(&blind_query(&KEY, "quick*")));
    }

    #[test]
    fn test_prefix_queries_for_longer_word() {
        let terms = blind_terms(&KEY, b"discombobulate was here");
        // "discombobulate" is 14 code points, too long; "here" and "was"…
        assert!(!terms.contains(&blind_query(&KEY, "discombobulate")));
        assert!(terms.contains(&blind_query(&KEY, "here")));

        let terms = blind_terms(&KEY, b"observation deck");
        // |w| = 11: prefixes 4..=10 hit, the full word hits
        for q in [
            "obse*", "obser*", "observ*", "observa*", "observat*", "observati*", "observatio*",
        ] {
            assert!(terms.contains(&blind_query(&KEY, q)), "{q} missed");
        }
        assert!(terms.contains(&blind_query(&KEY, "observation")));
        assert!(!terms.contains(&blind_query(&KEY, "observation*")));
    }

    #[test]
    fn test_queries_fold_before_matching() {
        let terms = blind_terms(&KEY, b"The Quick brown fox");
        assert!(terms.contains(&blind_query(&KEY, "QUICK")));
        assert!(terms.contains(&blind_query(&KEY, "Quic*")));
    }
}
