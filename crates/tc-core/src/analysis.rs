//! # Text Analysis
//!
//! Keyword-driven theme extraction and sentiment scoring. Both functions are
//! total: any string, including empty or non-ASCII text, yields a result.

use crate::lexicon::Lexicon;
use crate::models::Theme;

impl Lexicon {
    /// Themes whose keywords appear anywhere in `content`, in declaration order.
    ///
    /// Matching is plain substring containment on the lower-cased text, so
    /// "cat" also matches inside "education".
    pub fn extract_themes(&self, content: &str) -> Vec<Theme> {
        let text = content.to_lowercase();
        self.theme_keywords()
            .iter()
            .filter(|entry| entry.keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|entry| entry.theme)
            .collect()
    }

    /// Net polarity: +1 per positive token, -1 per negative token.
    pub fn analyze_sentiment(&self, content: &str) -> i32 {
        let text = content.to_lowercase();
        text.split(|c: char| !is_word_char(c))
            .filter(|token| !token.is_empty())
            .map(|token| {
                let mut score = 0;
                if self.is_positive(token) {
                    score += 1;
                }
                if self.is_negative(token) {
                    score -= 1;
                }
                score
            })
            .sum()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// [`Lexicon::extract_themes`] against the built-in tables.
pub fn extract_themes(content: &str) -> Vec<Theme> {
    Lexicon::builtin().extract_themes(content)
}

/// [`Lexicon::analyze_sentiment`] against the built-in tables.
pub fn analyze_sentiment(content: &str) -> i32 {
    Lexicon::builtin().analyze_sentiment(content)
}
