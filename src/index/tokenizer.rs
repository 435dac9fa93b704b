//! The single tokenization rule shared by documents, queries and titles

/// Splits text into lowercase runs of ASCII letters and digits
///
/// # Example
///
/// ```
/// use sumi_search::index::tokenize;
///
/// assert_eq!(tokenize("Go's CHANNELS, 2024!"), vec!["go", "s", "channels", "2024"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_ascii_lowercase())
        .collect()
}

/// Tokenizes a query, keeping only the first occurrence of each term
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for token in tokenize(query) {
        if !terms.contains(&token) {
            terms.push(token);
        }
    }
    terms
}
