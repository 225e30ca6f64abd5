//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{DerivedFields, Location, Story, Town, TownSettings};

/// Data persistence contract for towns and their stories.
///
/// Implementations are not expected to serialize concurrent mutations of one
/// town; the last derived-field write wins.
#[async_trait]
pub trait TownRepo: Send + Sync {
    // Town Operations
    async fn create_town(&self, town: Town) -> anyhow::Result<()>;
    async fn get_town(&self, id: Uuid) -> anyhow::Result<Option<Town>>;
    async fn get_town_by_share_id(&self, share_id: &str) -> anyhow::Result<Option<Town>>;
    /// Most recently active first.
    async fn list_towns_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Town>>;
    /// Applies the fields present in `settings` and bumps `last_activity`.
    async fn update_town_settings(&self, id: Uuid, settings: TownSettings) -> anyhow::Result<()>;
    /// Removes the town and every story in it.
    async fn delete_town(&self, id: Uuid) -> anyhow::Result<()>;
    async fn increment_visitors(&self, id: Uuid) -> anyhow::Result<()>;
    /// Overwrites crest, motto, story-derived stats, themes and last activity.
    /// Must leave `total_visitors` alone.
    async fn persist_town_derived_fields(&self, id: Uuid, fields: DerivedFields) -> anyhow::Result<()>;

    // Story Operations
    async fn create_story(&self, story: Story) -> anyhow::Result<()>;
    async fn get_story(&self, id: Uuid) -> anyhow::Result<Option<Story>>;
    async fn delete_story(&self, id: Uuid) -> anyhow::Result<()>;
    /// The complete current story set of a town, newest first.
    async fn find_stories_by_town(&self, town_id: Uuid) -> anyhow::Result<Vec<Story>>;
    /// Newest first.
    async fn find_stories_at_location(&self, town_id: Uuid, location: Location) -> anyhow::Result<Vec<Story>>;
}

/// Identity contract. Session issuance lives outside this service.
pub trait AuthProvider: Send + Sync {
    /// Resolves a bearer token to a user id, or `None` if it does not verify.
    fn authenticate(&self, token: &str) -> Option<Uuid>;
}
