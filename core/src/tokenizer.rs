use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Anything that is neither a word character nor whitespace acts as a separator.
    static ref PUNCT: Regex = Regex::new(r"[^\w\s]").expect("valid regex");
}

/// Tokenize text using NFKC normalization, lowercasing and punctuation stripping.
///
/// The same policy is applied to document bodies and to queries. There is no
/// stemming and no stopword list, so every surviving token is matched verbatim.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    PUNCT
        .replace_all(&normalized, " ")
        .split_whitespace()
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tokenize a query, keeping only the first occurrence of each token.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for token in tokenize(query) {
        if !terms.contains(&token) { terms.push(token); }
    }
    terms
}
