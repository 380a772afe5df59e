use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::debug;

// ── Weight tables ────────────────────────────────────────────────────

const POSITIVE: &[(&str, u32)] = &[
    ("excellent", 3),
    ("amazing", 3),
    ("fantastic", 3),
    ("outstanding", 3),
    ("perfect", 3),
    ("brilliant", 3),
    ("superb", 3),
    ("incredible", 3),
    ("wonderful", 2),
    ("delicious", 2),
    ("tasty", 2),
    ("yummy", 2),
    ("love", 2),
    ("enjoy", 2),
    ("satisfied", 2),
    ("recommend", 2),
    ("best", 2),
    ("awesome", 2),
    ("great", 1),
    ("good", 1),
    ("nice", 1),
    ("pleasant", 1),
    ("fresh", 1),
    ("hot", 1),
    ("crispy", 1),
    ("juicy", 1),
    ("flavorful", 2),
    ("aromatic", 1),
    ("authentic", 1),
    ("traditional", 1),
    ("homemade", 1),
    ("generous", 1),
    ("reasonable", 1),
    ("affordable", 1),
    ("worth", 1),
    ("value", 1),
    ("quality", 1),
    ("premium", 1),
];

// Zero weights keep spice level, temperature and venue size from counting
// against a review.
const NEGATIVE: &[(&str, u32)] = &[
    ("terrible", 3),
    ("awful", 3),
    ("horrible", 3),
    ("disgusting", 3),
    ("worst", 3),
    ("hate", 3),
    ("disappointed", 2),
    ("poor", 2),
    ("mediocre", 2),
    ("bland", 2),
    ("cold", 1),
    ("overcooked", 2),
    ("undercooked", 2),
    ("expensive", 1),
    ("waste", 2),
    ("avoid", 2),
    ("never", 2),
    ("bad", 1),
    ("dry", 1),
    ("soggy", 1),
    ("burnt", 2),
    ("tasteless", 2),
    ("flavorless", 2),
    ("greasy", 1),
    ("oily", 1),
    ("salty", 1),
    ("spicy", 0),
    ("hot", 0),
    ("slow", 1),
    ("rude", 2),
    ("unfriendly", 2),
    ("dirty", 2),
    ("noisy", 1),
    ("crowded", 0),
    ("small", 0),
    ("overpriced", 2),
];

static STANDARD: LazyLock<Lexicon> = LazyLock::new(|| {
    let lexicon = Lexicon::from_tables(POSITIVE, NEGATIVE);
    debug!(overlap = ?lexicon.overlapping_words(), "lexicon loaded");
    lexicon
});

/// Polarity-split word weights used by the sentiment scorer.
///
/// Lookups expect lowercase, single-word tokens. A word may appear in both
/// tables; the scorer applies both contributions.
#[derive(Debug, Clone)]
pub struct Lexicon {
    positive: HashMap<&'static str, u32>,
    negative: HashMap<&'static str, u32>,
}

impl Lexicon {
    /// The built-in restaurant review lexicon.
    #[must_use]
    pub fn standard() -> &'static Lexicon {
        &STANDARD
    }

    pub fn from_tables(positive: &[(&'static str, u32)], negative: &[(&'static str, u32)]) -> Self {
        Self {
            positive: positive.iter().copied().collect(),
            negative: negative.iter().copied().collect(),
        }
    }

    #[must_use]
    pub fn positive_weight(&self, word: &str) -> Option<u32> {
        self.positive.get(word).copied()
    }

    #[must_use]
    pub fn negative_weight(&self, word: &str) -> Option<u32> {
        self.negative.get(word).copied()
    }

    /// Words present in both tables, sorted.
    #[must_use]
    pub fn overlapping_words(&self) -> Vec<&'static str> {
        let mut words: Vec<&'static str> = self
            .positive
            .keys()
            .filter(|w| self.negative.contains_key(*w))
            .copied()
            .collect();
        words.sort_unstable();
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_weights() {
        let lex = Lexicon::standard();
        assert_eq!(lex.positive_weight("excellent"), Some(3));
        assert_eq!(lex.positive_weight("great"), Some(1));
        assert_eq!(lex.positive_weight("fresh"), Some(1));
        assert_eq!(lex.positive_weight("value"), Some(1));
        assert_eq!(lex.negative_weight("terrible"), Some(3));
        assert_eq!(lex.negative_weight("bad"), Some(1));
        assert_eq!(lex.negative_weight("spicy"), Some(0));
        assert_eq!(lex.positive_weight("table"), None);
    }

    #[test]
    fn test_zero_weight_entries() {
        let lex = Lexicon::standard();
        for word in ["spicy", "hot", "crowded", "small"] {
            assert_eq!(lex.negative_weight(word), Some(0), "{word}");
        }
    }

    #[test]
    fn test_overlap_is_only_hot() {
        assert_eq!(Lexicon::standard().overlapping_words(), vec!["hot"]);
    }

    #[test]
    fn test_table_sizes() {
        let lex = Lexicon::standard();
        assert_eq!(lex.positive.len(), 38);
        assert_eq!(lex.negative.len(), 36);
    }
}
