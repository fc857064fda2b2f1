//! Text normalization shared by the classifier, matcher and keyword index
//!
//! Tokens are lowercase ASCII alphanumeric runs with stopwords removed and a
//! light suffix-stripping stemmer applied. The stemmer is intentionally small:
//! it must be stable across releases because keyword overlap, keyword search
//! and the lexical embedder all key on its output.

use std::collections::HashSet;

/// Words carrying no matching signal in legal prose
pub const STOPWORDS: &[&str] = &[
    "a", "an", "the", "of", "for", "to", "and", "or", "in", "on", "by", "with", "is", "are", "be",
    "as", "at", "from", "that", "this", "any", "all", "shall", "may", "its", "it", "such",
];

/// Reduce a lowercase word to its stem
///
/// # Examples
///
/// ```
/// use nyaya_domain::text::stem;
///
/// assert_eq!(stem("processing"), "process");
/// assert_eq!(stem("requires"), "requir");
/// assert_eq!(stem("liberties"), "liberty");
/// ```
pub fn stem(word: &str) -> String {
    if word.len() <= 3 {
        return word.to_string();
    }

    let mut w = word.to_string();
    if w.ends_with("ies") && w.len() > 4 {
        w.truncate(w.len() - 3);
        w.push('y');
    } else if w.ends_with("ing") && w.len() - 3 >= 4 {
        w.truncate(w.len() - 3);
    } else if w.ends_with("ed") && w.len() - 2 >= 4 {
        w.truncate(w.len() - 2);
    } else if w.ends_with("es") && w.len() - 2 >= 4 {
        w.truncate(w.len() - 2);
    } else if w.ends_with('s') && !w.ends_with("ss") && w.len() - 1 >= 4 {
        w.truncate(w.len() - 1);
    }

    if w.ends_with('e') && w.len() > 4 {
        w.truncate(w.len() - 1);
    }
    w
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split text into stemmed, stopword-free tokens in reading order
pub fn tokenize(text: &str) -> Vec<String> {
    words(text)
        .into_iter()
        .filter(|w| !is_stopword(w))
        .map(|w| stem(&w))
        .filter(|s| !is_stopword(s))
        .collect()
}

/// Distinct stemmed tokens of a text
pub fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Whether every stemmed token of `phrase` occurs in `tokens`
///
/// A phrase with no significant tokens never matches.
pub fn phrase_matches(phrase: &str, tokens: &HashSet<String>) -> bool {
    let stems = tokenize(phrase);
    !stems.is_empty() && stems.iter().all(|s| tokens.contains(s))
}

/// Fraction of `keywords` whose phrases fully occur in `tokens`
///
/// Returns 0.0 for an empty keyword list.
pub fn keyword_overlap<S: AsRef<str>>(keywords: &[S], tokens: &HashSet<String>) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let matched = keywords
        .iter()
        .filter(|k| phrase_matches(k.as_ref(), tokens))
        .count();
    matched as f64 / keywords.len() as f64
}

/// Find explicit "Article N" and "Section N" references in a text
///
/// References are normalized to `article_<n>` / `section_<n>`, which is the
/// id convention of the bundled knowledge bases. Duplicates are removed and
/// first-occurrence order is kept.
///
/// # Examples
///
/// ```
/// use nyaya_domain::text::extract_citations;
///
/// let refs = extract_citations("Subject to Article 19(1)(a) and Section 6 of the Act");
/// assert_eq!(refs, vec!["article_19", "section_6"]);
/// ```
pub fn extract_citations(text: &str) -> Vec<String> {
    let raw = words(text);
    let mut out: Vec<String> = Vec::new();

    for pair in raw.windows(2) {
        let kind = match pair[0].as_str() {
            "article" | "art" => "article",
            "section" | "sec" | "s" => "section",
            _ => continue,
        };
        let number: String = pair[1].chars().take_while(|c| c.is_ascii_digit()).collect();
        if number.is_empty() {
            continue;
        }
        let suffix: String = pair[1][number.len()..].to_string();
        let id = if suffix.len() == 1 {
            format!("{}_{}{}", kind, number, suffix)
        } else {
            format!("{}_{}", kind, number)
        };
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: stemming never lengthens a word
        #[test]
        fn test_stem_never_lengthens(word in "[a-z]{1,16}") {
            prop_assert!(stem(&word).len() <= word.len());
        }

        /// Property: tokens are lowercase ASCII alphanumerics and never stopwords
        #[test]
        fn test_tokens_are_normalized(text in "[A-Za-z0-9 ,.;()-]{0,80}") {
            for token in tokenize(&text) {
                prop_assert!(!token.is_empty());
                prop_assert!(token.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
                prop_assert!(!STOPWORDS.contains(&token.as_str()));
            }
        }

        /// Property: keyword overlap is a fraction
        #[test]
        fn test_overlap_bounded(text in "[a-z ]{0,60}", kws in prop::collection::vec("[a-z ]{0,12}", 0..6)) {
            let overlap = keyword_overlap(&kws, &token_set(&text));
            prop_assert!((0.0..=1.0).contains(&overlap));
        }
    }
}
