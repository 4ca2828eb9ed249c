// ============================================
// Lexicon Sentiment Analyzer
// ============================================
//
// AFINN-style word valences in [-5, 5]. A message's rating is its
// comparative score: summed valence divided by the token count, so long
// rambling messages do not outweigh short pointed ones.
//
// A negator ("not", "never", "don't", ...) flips the sign of the next
// scored word within three tokens.

use super::RatingFunction;
use crate::utils::{comparative, tokenize};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

const NEGATION_REACH: usize = 3;

static VALENCES: Lazy<HashMap<&'static str, i8>> = Lazy::new(|| {
    [
        // positive
        ("amazing", 4),
        ("awesome", 4),
        ("beautiful", 3),
        ("best", 3),
        ("brilliant", 4),
        ("calm", 2),
        ("celebrate", 3),
        ("cheers", 2),
        ("congrats", 2),
        ("congratulations", 2),
        ("cool", 1),
        ("delighted", 3),
        ("enjoy", 2),
        ("excellent", 3),
        ("excited", 3),
        ("fantastic", 4),
        ("fine", 2),
        ("fun", 4),
        ("glad", 3),
        ("good", 3),
        ("great", 3),
        ("happy", 3),
        ("helpful", 2),
        ("hope", 2),
        ("kind", 2),
        ("like", 2),
        ("love", 3),
        ("lovely", 3),
        ("nice", 3),
        ("perfect", 3),
        ("pleased", 3),
        ("proud", 2),
        ("ready", 1),
        ("thank", 2),
        ("thanks", 2),
        ("win", 4),
        ("wonderful", 4),
        ("wow", 4),
        ("yay", 2),
        ("yes", 1),
        // negative
        ("angry", -3),
        ("annoyed", -2),
        ("annoying", -2),
        ("awful", -3),
        ("bad", -3),
        ("blame", -2),
        ("boring", -3),
        ("broken", -1),
        ("bug", -2),
        ("crap", -3),
        ("crash", -2),
        ("damn", -4),
        ("disappointed", -2),
        ("fail", -2),
        ("failed", -2),
        ("frustrated", -2),
        ("hate", -3),
        ("horrible", -3),
        ("hurt", -2),
        ("lost", -3),
        ("mad", -3),
        ("problem", -2),
        ("sad", -2),
        ("sick", -2),
        ("sorry", -1),
        ("stupid", -2),
        ("terrible", -3),
        ("tired", -2),
        ("ugly", -3),
        ("upset", -2),
        ("useless", -2),
        ("worried", -3),
        ("worse", -3),
        ("worst", -3),
        ("wrong", -2),
    ]
    .into_iter()
    .collect()
});

static NEGATORS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "not", "never", "no", "none", "nobody", "nothing", "neither", "nor", "cannot", "can't",
        "don't", "doesn't", "didn't", "isn't", "aren't", "wasn't", "weren't", "won't",
        "wouldn't", "shouldn't", "couldn't", "hardly",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Default, Clone)]
pub struct LexiconAnalyzer {
    /// Per-word overrides layered over the built-in table
    overrides: HashMap<String, i8>,
}

impl LexiconAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override or add a word valence (clamped to [-5, 5])
    pub fn with_word(mut self, word: &str, valence: i8) -> Self {
        self.overrides.insert(word.to_lowercase(), valence.clamp(-5, 5));
        self
    }

    fn valence(&self, token: &str) -> Option<i8> {
        self.overrides
            .get(token)
            .or_else(|| VALENCES.get(token))
            .copied()
    }

    /// Summed valence and token count for `text`
    pub fn analyze(&self, text: &str) -> (f64, usize) {
        let tokens = tokenize(text);
        let mut total = 0.0;
        let mut negation_left = 0usize;

        for token in &tokens {
            if NEGATORS.contains(token.as_str()) {
                negation_left = NEGATION_REACH;
                continue;
            }

            if let Some(valence) = self.valence(token) {
                let valence = f64::from(valence);
                if negation_left > 0 {
                    total -= valence;
                    negation_left = 0;
                } else {
                    total += valence;
                }
            } else {
                negation_left = negation_left.saturating_sub(1);
            }
        }

        (total, tokens.len())
    }
}

impl RatingFunction for LexiconAnalyzer {
    fn rate(&self, payload: &str) -> f64 {
        let (total, count) = self.analyze(payload);
        comparative(total, count)
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_and_empty_text() {
        let analyzer = LexiconAnalyzer::new();
        assert_eq!(analyzer.rate(""), 0.0);
        assert_eq!(analyzer.rate("!!! ..."), 0.0);
        assert_eq!(analyzer.rate("the meeting is at noon"), 0.0);
    }

    #[test]
    fn test_comparative_score() {
        let analyzer = LexiconAnalyzer::new();
        // good(3) + great(3) over 4 tokens
        assert!((analyzer.rate("good day, great team") - 1.5).abs() < 1e-9);
        assert!(analyzer.rate("this is terrible") < 0.0);
    }

    #[test]
    fn test_negation_flips_next_scored_word() {
        let analyzer = LexiconAnalyzer::new();
        let (total, count) = analyzer.analyze("this is not good");
        assert_eq!(count, 4);
        assert_eq!(total, -3.0);

        let (total, _) = analyzer.analyze("don't really hate it");
        assert_eq!(total, 3.0);
    }

    #[test]
    fn test_negation_expires() {
        let analyzer = LexiconAnalyzer::new();
        let (total, _) = analyzer.analyze("not one two three good");
        assert_eq!(total, 3.0);
    }

    #[test]
    fn test_case_insensitive_and_overrides() {
        let analyzer = LexiconAnalyzer::new().with_word("Ship", 9).with_word("bug", 0);
        let (total, _) = analyzer.analyze("SHIP it, one bug");
        assert_eq!(total, 5.0);
    }
}
