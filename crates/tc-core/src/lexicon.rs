//! # Keyword Tables
//!
//! Theme keywords and sentiment word lists, held as a value rather than
//! scattered constants so a deployment can load its own tables at startup.
//! The built-in English tables are constructed once and never mutated.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Theme;

static BUILTIN: Lazy<Lexicon> = Lazy::new(|| Lexicon::from_source(LexiconSource::english()));

/// Serializable form of a lexicon, as written in a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconSource {
    pub themes: Vec<ThemeKeywords>,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeKeywords {
    pub theme: Theme,
    pub keywords: Vec<String>,
}

/// Lookup tables used by theme extraction and sentiment scoring.
#[derive(Debug, Clone)]
pub struct Lexicon {
    /// Sorted by theme declaration order.
    themes: Vec<ThemeKeywords>,
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl Lexicon {
    /// The shipped English tables.
    pub fn builtin() -> &'static Lexicon {
        &BUILTIN
    }

    /// Parses a JSON lexicon. Keywords are lower-cased; a theme listed twice
    /// has its keyword lists merged.
    pub fn from_json(raw: &str) -> Result<Self> {
        let source: LexiconSource = serde_json::from_str(raw)
            .map_err(|e| AppError::ValidationError(format!("invalid lexicon: {e}")))?;
        Ok(Self::from_source(source))
    }

    pub fn from_source(source: LexiconSource) -> Self {
        let mut themes: Vec<ThemeKeywords> = Vec::new();
        for entry in source.themes {
            let keywords = entry
                .keywords
                .into_iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty());
            match themes.iter_mut().find(|t| t.theme == entry.theme) {
                Some(existing) => existing.keywords.extend(keywords),
                None => themes.push(ThemeKeywords {
                    theme: entry.theme,
                    keywords: keywords.collect(),
                }),
            }
        }
        themes.sort_by_key(|t| t.theme);

        Self {
            themes,
            positive: source.positive.into_iter().map(|w| w.to_lowercase()).collect(),
            negative: source.negative.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    pub fn theme_keywords(&self) -> &[ThemeKeywords] {
        &self.themes
    }

    pub fn is_positive(&self, token: &str) -> bool {
        self.positive.contains(token)
    }

    pub fn is_negative(&self, token: &str) -> bool {
        self.negative.contains(token)
    }
}

impl LexiconSource {
    pub fn english() -> Self {
        fn words(list: &[&str]) -> Vec<String> {
            list.iter().map(|w| w.to_string()).collect()
        }
        let theme = |theme, list: &[&str]| ThemeKeywords {
            theme,
            keywords: words(list),
        };

        Self {
            themes: vec![
                theme(
                    Theme::Cooking,
                    &["bake", "cook", "recipe", "bread", "cake", "kitchen", "chef", "meal"],
                ),
                theme(
                    Theme::Crafts,
                    &["craft", "make", "build", "create", "sew", "knit", "wood", "pottery"],
                ),
                theme(
                    Theme::Nature,
                    &["garden", "flower", "tree", "bird", "forest", "river", "mountain", "plant"],
                ),
                theme(
                    Theme::Festival,
                    &["festival", "celebration", "party", "dance", "music", "feast", "holiday"],
                ),
                theme(
                    Theme::Seasons,
                    &["spring", "summer", "autumn", "winter", "snow", "rain", "harvest", "bloom"],
                ),
                theme(
                    Theme::Mystery,
                    &["secret", "mysterious", "hidden", "strange", "curious", "wonder", "puzzle"],
                ),
                theme(
                    Theme::Community,
                    &["neighbor", "friend", "helper", "gather", "together", "share", "welcome"],
                ),
                theme(
                    Theme::Animals,
                    &["cat", "dog", "bird", "rabbit", "horse", "cow", "sheep", "chicken"],
                ),
            ],
            positive: words(&[
                "happy", "joy", "love", "wonderful", "amazing", "beautiful", "peaceful", "kind",
                "friendly", "warm", "cozy", "delightful", "charming", "magical", "bright", "sunny",
                "cheerful", "sweet", "gentle", "caring", "celebration", "festival", "dance",
                "music", "laughter", "smile", "bloom", "flourish",
            ]),
            negative: words(&[
                "sad", "dark", "gloomy", "angry", "worried", "trouble", "problem", "difficult",
                "harsh", "cold", "lonely", "afraid", "scary", "storm", "rain", "shadow",
                "mysterious", "strange", "lost", "broken", "empty",
            ]),
        }
    }
}
