//! # Aggregate Stats
//!
//! Town-level counters recomputed from the full story set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{Story, Theme, ThemeCount};

/// Theme occurrence counts, kept in the order each theme was first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeHistogram {
    entries: Vec<ThemeCount>,
}

impl ThemeHistogram {
    pub fn from_stories(stories: &[Story]) -> Self {
        let mut histogram = Self::default();
        for theme in stories.iter().flat_map(|s| s.themes.iter()) {
            histogram.add(*theme);
        }
        histogram
    }

    fn add(&mut self, theme: Theme) {
        match self.entries.iter_mut().find(|e| e.name == theme) {
            Some(entry) => entry.count += 1,
            None => self.entries.push(ThemeCount { name: theme, count: 1 }),
        }
    }

    pub fn count(&self, theme: Theme) -> u32 {
        self.entries
            .iter()
            .find(|e| e.name == theme)
            .map_or(0, |e| e.count)
    }

    /// Highest-count theme; on a tie the one seen first wins.
    pub fn dominant(&self) -> Option<Theme> {
        let mut best: Option<&ThemeCount> = None;
        for entry in &self.entries {
            if best.map_or(true, |b| entry.count > b.count) {
                best = Some(entry);
            }
        }
        best.map(|e| e.name)
    }

    pub fn into_counts(self) -> Vec<ThemeCount> {
        self.entries
    }
}

/// The story-derived part of a town's stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub total_stories: u32,
    pub locations_with_stories: u32,
    /// Distinct author strings, not distinct accounts.
    pub contributors: u32,
    pub themes: Vec<ThemeCount>,
}

pub fn recompute_stats(stories: &[Story]) -> DerivedStats {
    let locations: HashSet<_> = stories.iter().map(|s| s.location).collect();
    let authors: HashSet<&str> = stories.iter().map(|s| s.author.as_str()).collect();

    DerivedStats {
        total_stories: stories.len() as u32,
        locations_with_stories: locations.len() as u32,
        contributors: authors.len() as u32,
        themes: ThemeHistogram::from_stories(stories).into_counts(),
    }
}
