// Utility functions for sentiment-ranking-service

/// Split text into lowercase word tokens. Apostrophes stay inside a word so
/// contractions such as "don't" survive as one token.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|token| token.trim_matches('\'').to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Average of `total` over `count` items, 0.0 when there are none
pub fn comparative(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
