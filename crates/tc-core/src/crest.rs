//! # Crest Selection
//!
//! A town's crest is drawn from a fixed catalog of ASCII patterns. Each
//! pattern needs at least one of its themes to appear in the town's stories,
//! some carry an extra gate, and rarer patterns get more lottery slots.

use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::{Story, Theme};
use crate::stats::ThemeHistogram;

static BUILTIN: Lazy<CrestCatalog> = Lazy::new(CrestCatalog::standard);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl Rarity {
    /// Number of lottery slots a pattern of this rarity occupies.
    pub fn weight(&self) -> usize {
        match self {
            Rarity::Common => 1,
            Rarity::Uncommon => 2,
            Rarity::Rare => 3,
            Rarity::Legendary => 4,
        }
    }
}

/// Extra eligibility condition on top of theme presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrestGate {
    pub theme: Theme,
    pub min_theme_count: u32,
    pub min_stories: usize,
}

impl CrestGate {
    fn admits(&self, histogram: &ThemeHistogram, story_count: usize) -> bool {
        histogram.count(self.theme) >= self.min_theme_count && story_count >= self.min_stories
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrestPattern {
    pub pattern: String,
    pub rarity: Rarity,
    pub unlock_condition: String,
    /// Empty means always eligible.
    pub themes: Vec<Theme>,
    pub gate: Option<CrestGate>,
}

impl CrestPattern {
    fn is_candidate(&self, histogram: &ThemeHistogram) -> bool {
        self.themes.is_empty() || self.themes.iter().any(|t| histogram.count(*t) >= 1)
    }

    fn is_eligible(&self, histogram: &ThemeHistogram, story_count: usize) -> bool {
        self.is_candidate(histogram)
            && self.gate.map_or(true, |gate| gate.admits(histogram, story_count))
    }
}

/// Ordered crest patterns. Entry 0 is the theme-less default; the catalog is
/// only built in code, so it is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CrestCatalog {
    patterns: Vec<CrestPattern>,
}

impl CrestCatalog {
    pub fn builtin() -> &'static CrestCatalog {
        &BUILTIN
    }

    pub fn patterns(&self) -> &[CrestPattern] {
        &self.patterns
    }

    pub fn default_pattern(&self) -> &str {
        &self.patterns[0].pattern
    }

    /// Draws a crest for the given story set.
    pub fn generate<R: Rng + ?Sized>(&self, stories: &[Story], rng: &mut R) -> String {
        if stories.is_empty() {
            return self.default_pattern().to_string();
        }

        let eligible = self.unlocked(stories);
        if eligible.is_empty() {
            return self.default_pattern().to_string();
        }

        let slots: Vec<&CrestPattern> = eligible
            .iter()
            .flat_map(|p| std::iter::repeat(*p).take(p.rarity.weight()))
            .collect();
        slots[rng.random_range(0..slots.len())].pattern.clone()
    }

    /// Every pattern the story set currently qualifies for, in catalog order.
    pub fn unlocked(&self, stories: &[Story]) -> Vec<&CrestPattern> {
        let histogram = ThemeHistogram::from_stories(stories);
        self.patterns
            .iter()
            .filter(|p| p.is_eligible(&histogram, stories.len()))
            .collect()
    }

    /// Rarity of a stored crest string, if it came from this catalog.
    pub fn rarity_of(&self, crest: &str) -> Option<Rarity> {
        self.patterns
            .iter()
            .find(|p| p.pattern == crest)
            .map(|p| p.rarity)
    }

    fn standard() -> Self {
        let entry = |pattern: &str, rarity, unlock: &str, themes: Vec<Theme>| CrestPattern {
            pattern: pattern.to_string(),
            rarity,
            unlock_condition: unlock.to_string(),
            themes,
            gate: None,
        };

        let mut mystery = entry(
            "   🔮✨   \n  ✨🌙✨  \n 🔮✨🔮✨ \n  \\  🌟 /  \n   \\___/   ",
            Rarity::Legendary,
            "mystery theme with 5+ entries",
            vec![Theme::Mystery],
        );
        mystery.gate = Some(CrestGate {
            theme: Theme::Mystery,
            min_theme_count: 2,
            min_stories: 5,
        });

        Self {
            patterns: vec![
                entry(
                    "    ⭐    \n   /|\\   \n  / | \\  \n /_____\\ \n| TOWN  |\n|_______|",
                    Rarity::Common,
                    "default",
                    Vec::new(),
                ),
                entry(
                    "   🌸🌸   \n  🌸🏠🌸  \n 🌸🌸🌸🌸 \n  \\     /  \n   \\___/   ",
                    Rarity::Common,
                    "nature theme",
                    vec![Theme::Nature],
                ),
                entry(
                    "   🍞🥖   \n  \\     /  \n   )   (   \n  /     \\  \n 🥧_____🧁",
                    Rarity::Uncommon,
                    "cooking theme",
                    vec![Theme::Cooking],
                ),
                entry(
                    "   🎭🎪   \n  🎨🎵🎨  \n 🎪🎭🎪🎭 \n  \\  🎵 /  \n   \\___/   ",
                    Rarity::Rare,
                    "festival theme",
                    vec![Theme::Festival],
                ),
                entry(
                    "   ❄️⭐❄️   \n  ⭐🏠⭐  \n ❄️⭐❄️⭐ \n  \\     /  \n   \\___/   ",
                    Rarity::Rare,
                    "winter theme",
                    vec![Theme::Seasons],
                ),
                mystery,
            ],
        }
    }
}

/// [`CrestCatalog::generate`] against the built-in catalog and the thread RNG.
pub fn generate_crest(stories: &[Story]) -> String {
    CrestCatalog::builtin().generate(stories, &mut rand::rng())
}
