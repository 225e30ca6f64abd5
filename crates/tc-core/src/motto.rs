//! # Motto Selection

use once_cell::sync::Lazy;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::models::{Story, Theme, DEFAULT_MOTTO};
use crate::stats::ThemeHistogram;

static BUILTIN: Lazy<MottoBook> = Lazy::new(MottoBook::standard);

/// Candidate mottos, grouped by the mood or theme that selects them.
#[derive(Debug, Clone, PartialEq)]
pub struct MottoBook {
    pub empty: String,
    pub fallback: String,
    pub joyful: Vec<String>,
    pub mysterious: Vec<String>,
    pub by_theme: Vec<(Theme, Vec<String>)>,
}

impl MottoBook {
    pub fn builtin() -> &'static MottoBook {
        &BUILTIN
    }

    /// Picks a motto from average stored sentiment, then dominant theme.
    pub fn generate<R: Rng + ?Sized>(&self, stories: &[Story], rng: &mut R) -> String {
        if stories.is_empty() {
            return self.empty.clone();
        }

        let total: i64 = stories.iter().map(|s| i64::from(s.sentiment)).sum();
        let average = total as f64 / stories.len() as f64;

        let pool = if average > 1.0 {
            Some(self.joyful.as_slice())
        } else if average < -1.0 {
            Some(self.mysterious.as_slice())
        } else {
            ThemeHistogram::from_stories(stories)
                .dominant()
                .and_then(|theme| self.for_theme(theme))
        };

        pool.and_then(|candidates| candidates.choose(rng))
            .unwrap_or(&self.fallback)
            .clone()
    }

    fn for_theme(&self, theme: Theme) -> Option<&[String]> {
        self.by_theme
            .iter()
            .find(|(t, _)| *t == theme)
            .map(|(_, mottos)| mottos.as_slice())
    }

    fn standard() -> Self {
        fn list(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            empty: DEFAULT_MOTTO.to_string(),
            fallback: "A town woven from stories".to_string(),
            joyful: list(&[
                "Where every day brings new joy",
                "A place where happiness blooms",
                "United in warmth and wonder",
                "Where smiles are our currency",
            ]),
            mysterious: list(&[
                "Where shadows hold secrets",
                "Mystery dwells in every corner",
                "A town of whispered tales",
                "Where the curious find their calling",
            ]),
            by_theme: vec![
                (
                    Theme::Cooking,
                    list(&["Where every meal tells a story", "Flavors that bring us together"]),
                ),
                (
                    Theme::Crafts,
                    list(&["Built with care, crafted with love", "Where skilled hands shape dreams"]),
                ),
                (
                    Theme::Nature,
                    list(&["In harmony with the earth", "Where nature and hearts intertwine"]),
                ),
                (
                    Theme::Festival,
                    list(&["Every day is a celebration", "Where traditions dance with joy"]),
                ),
                (
                    Theme::Community,
                    list(&["Stronger together, kinder always", "Where neighbors become family"]),
                ),
            ],
        }
    }
}

/// [`MottoBook::generate`] against the built-in mottos and the thread RNG.
pub fn generate_motto(stories: &[Story]) -> String {
    MottoBook::builtin().generate(stories, &mut rand::rng())
}
