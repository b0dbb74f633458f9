//! Turn a model's "which page should I read" answer into a page key.

/// Extract a lookup key from a keyword-seeking model response.
///
/// A single token is used as-is; otherwise the first double-quoted phrase
/// is used. Punctuation is stripped, camel-case words are split with an
/// underscore, and spaces become underscores. Returns an empty string when
/// no usable candidate exists, which disables retrieval for the turn.
pub fn extract_keyword(response: &str) -> String {
    let candidate = candidate(response.trim());

    let stripped: String = candidate
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    split_camel_case(&stripped).replace(' ', "_")
}

fn candidate(response: &str) -> &str {
    let mut tokens = response.split_whitespace();
    if let (Some(token), None) = (tokens.next(), tokens.next()) {
        return token;
    }

    let mut quoted = response.splitn(3, '"');
    match (quoted.next(), quoted.next(), quoted.next()) {
        (Some(_), Some(phrase), Some(_)) => phrase,
        _ => "",
    }
}

/// Insert `_` before each ASCII uppercase letter that directly follows an
/// alphanumeric character. Underscores count as a boundary, so the split is
/// stable when applied again.
pub fn split_camel_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if c.is_ascii_uppercase() && prev.is_some_and(char::is_alphanumeric) {
            out.push('_');
        }
        out.push(c);
        prev = Some(c);
    }

    out
}
