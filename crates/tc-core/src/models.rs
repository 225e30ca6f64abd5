//! # Domain Models
//!
//! These structs represent the core entities of Town Chronicle.
//! We use UUID v7 for time-ordered, globally unique identification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const AUTHOR_MAX_CHARS: usize = 50;
pub const CONTENT_MAX_CHARS: usize = 500;
pub const TOWN_NAME_MAX_CHARS: usize = 100;

/// Motto every town starts with, and returns to when its last story is removed.
pub const DEFAULT_MOTTO: &str = "A town waiting to be discovered";

/// The fixed thematic vocabulary. Declaration order is significant: theme
/// extraction reports matches in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Cooking,
    Crafts,
    Nature,
    Festival,
    Seasons,
    Mystery,
    Community,
    Animals,
}

impl Theme {
    pub const ALL: [Theme; 8] = [
        Theme::Cooking,
        Theme::Crafts,
        Theme::Nature,
        Theme::Festival,
        Theme::Seasons,
        Theme::Mystery,
        Theme::Community,
        Theme::Animals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Cooking => "cooking",
            Theme::Crafts => "crafts",
            Theme::Nature => "nature",
            Theme::Festival => "festival",
            Theme::Seasons => "seasons",
            Theme::Mystery => "mystery",
            Theme::Community => "community",
            Theme::Animals => "animals",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::ValidationError(format!("unknown theme '{s}'")))
    }
}

/// The fixed places in town a story can be pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Location {
    TownSquare,
    Bakery,
    Library,
    Park,
    Workshop,
    Theater,
}

impl Location {
    pub const ALL: [Location; 6] = [
        Location::TownSquare,
        Location::Bakery,
        Location::Library,
        Location::Park,
        Location::Workshop,
        Location::Theater,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::TownSquare => "town-square",
            Location::Bakery => "bakery",
            Location::Library => "library",
            Location::Park => "park",
            Location::Workshop => "workshop",
            Location::Theater => "theater",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| AppError::ValidationError(format!("unknown location '{s}'")))
    }
}

/// A single authored entry. Never edited; `themes` and `sentiment` are
/// computed from `content` once, at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: Uuid,
    pub town_id: Uuid,
    pub author: String,
    pub content: String,
    pub location: Location,
    /// Authenticated identity of the writer, if any
    pub user_id: Option<Uuid>,
    pub is_guest: bool,
    pub themes: Vec<Theme>,
    pub sentiment: i32,
    pub created_at: DateTime<Utc>,
}

/// One row of a town's theme histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeCount {
    pub name: Theme,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TownStats {
    pub total_stories: u32,
    /// Accumulates on shared reads; never derived from stories.
    pub total_visitors: u32,
    pub locations_with_stories: u32,
    pub contributors: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Town {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    /// Public handle used in share links. Assigned once.
    pub share_id: String,
    pub crest: String,
    pub motto: String,
    pub is_public: bool,
    pub allow_guest_entries: bool,
    pub stats: TownStats,
    pub themes: Vec<ThemeCount>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Town {
    /// Builds a fresh, empty town. `crest` is expected to be the catalog default.
    pub fn new(owner_id: Uuid, name: String, crest: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name,
            owner_id,
            share_id: generate_share_id(),
            crest,
            motto: DEFAULT_MOTTO.to_string(),
            is_public: true,
            allow_guest_entries: true,
            stats: TownStats::default(),
            themes: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn is_owned_by(&self, user: Option<Uuid>) -> bool {
        user == Some(self.owner_id)
    }
}

/// Everything recomputed from a town's story set after a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedFields {
    pub crest: String,
    pub motto: String,
    pub total_stories: u32,
    pub locations_with_stories: u32,
    pub contributors: u32,
    pub themes: Vec<ThemeCount>,
    pub last_activity: DateTime<Utc>,
}

/// Owner-editable town settings. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TownSettings {
    pub name: Option<String>,
    pub is_public: Option<bool>,
    pub allow_guest_entries: Option<bool>,
}

/// Which town a new story is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TownRef {
    Id(Uuid),
    Share(String),
}

/// Raw story submission, before trimming and validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStory {
    pub author: String,
    pub content: String,
    pub location: Location,
}

/// Base36 millisecond timestamp followed by random base36 characters.
pub fn generate_share_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut stamp = Vec::new();
    loop {
        stamp.push(ALPHABET[(millis % 36) as usize]);
        millis /= 36;
        if millis == 0 {
            break;
        }
    }
    stamp.reverse();

    let mut rng = rand::rng();
    let suffix = (0..10).map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())]);
    stamp.into_iter().chain(suffix).map(char::from).collect()
}

/// Trims `raw` and checks it holds between 1 and `max` characters.
pub fn trimmed_field(field: &str, raw: &str, max: usize) -> crate::error::Result<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(AppError::ValidationError(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_round_trips_through_kebab_case() {
        assert_eq!("town-square".parse::<Location>().unwrap(), Location::TownSquare);
        assert_eq!(Location::Theater.to_string(), "theater");
        assert!("dungeon".parse::<Location>().is_err());
        assert_eq!(
            serde_json::to_string(&Location::TownSquare).unwrap(),
            "\"town-square\""
        );
    }

    #[test]
    fn share_ids_are_lowercase_base36_and_distinct() {
        let a = generate_share_id();
        let b = generate_share_id();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert!(a.len() > 10);
    }

    #[test]
    fn new_town_starts_empty_with_default_motto() {
        let owner = Uuid::now_v7();
        let town = Town::new(owner, "Maple Hollow".into(), "crest".into());
        assert_eq!(town.motto, DEFAULT_MOTTO);
        assert_eq!(town.stats, TownStats::default());
        assert!(town.is_public && town.allow_guest_entries);
        assert!(town.is_owned_by(Some(owner)));
        assert!(!town.is_owned_by(None));
    }

    #[test]
    fn trimmed_field_enforces_bounds() {
        assert_eq!(trimmed_field("author", "  Al  ", 50).unwrap(), "Al");
        assert!(trimmed_field("author", "   ", 50).is_err());
        assert!(trimmed_field("author", &"x".repeat(51), 50).is_err());
        assert!(trimmed_field("author", &"é".repeat(50), 50).is_ok());
    }
}
