//! # tc-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `tc-core` domain models.

use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tc_core::models::{
    DerivedFields, Location, Story, ThemeCount, Town, TownSettings, TownStats,
};
use tc_core::traits::TownRepo;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS towns (
        id BLOB PRIMARY KEY,
        name TEXT NOT NULL,
        owner_id BLOB NOT NULL,
        share_id TEXT NOT NULL UNIQUE,
        crest TEXT NOT NULL DEFAULT '',
        motto TEXT NOT NULL,
        is_public INTEGER NOT NULL DEFAULT 1,
        allow_guest_entries INTEGER NOT NULL DEFAULT 1,
        total_stories INTEGER NOT NULL DEFAULT 0,
        total_visitors INTEGER NOT NULL DEFAULT 0,
        locations_with_stories INTEGER NOT NULL DEFAULT 0,
        contributors INTEGER NOT NULL DEFAULT 0,
        themes TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL,
        last_activity TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS stories (
        id BLOB PRIMARY KEY,
        town_id BLOB NOT NULL REFERENCES towns(id) ON DELETE CASCADE,
        author TEXT NOT NULL,
        content TEXT NOT NULL,
        location TEXT NOT NULL,
        user_id BLOB,
        is_guest INTEGER NOT NULL DEFAULT 0,
        themes TEXT NOT NULL DEFAULT '[]',
        sentiment INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_towns_owner ON towns (owner_id, last_activity)",
    "CREATE INDEX IF NOT EXISTS idx_stories_location ON stories (town_id, location)",
    "CREATE INDEX IF NOT EXISTS idx_stories_created ON stories (town_id, created_at)",
];

const TOWN_COLUMNS: &str = "id, name, owner_id, share_id, crest, motto, is_public, allow_guest_entries, \
     total_stories, total_visitors, locations_with_stories, contributors, themes, created_at, last_activity";

const STORY_COLUMNS: &str =
    "id, town_id, author, content, location, user_id, is_guest, themes, sentiment, created_at";

pub struct SqliteTownRepo {
    pool: SqlitePool,
}

impl SqliteTownRepo {
    /// Connects (creating the database file if needed) and applies the schema.
    ///
    /// An in-memory URL gets a single long-lived connection, since every
    /// SQLite connection to `:memory:` is its own database.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid sqlite url {url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        log::info!("sqlite store ready at {}", url);

        Ok(Self { pool })
    }
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Ok(Uuid::from_slice(blob)?)
}

fn count(row: &SqliteRow, column: &str) -> u32 {
    row.get::<i64, _>(column).max(0) as u32
}

fn town_from_row(row: &SqliteRow) -> anyhow::Result<Town> {
    let themes: Vec<ThemeCount> = serde_json::from_str(&row.get::<String, _>("themes"))?;
    Ok(Town {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice())?,
        name: row.get("name"),
        owner_id: blob_to_uuid(row.get::<Vec<u8>, _>("owner_id").as_slice())?,
        share_id: row.get("share_id"),
        crest: row.get("crest"),
        motto: row.get("motto"),
        is_public: row.get("is_public"),
        allow_guest_entries: row.get("allow_guest_entries"),
        stats: TownStats {
            total_stories: count(row, "total_stories"),
            total_visitors: count(row, "total_visitors"),
            locations_with_stories: count(row, "locations_with_stories"),
            contributors: count(row, "contributors"),
        },
        themes,
        created_at: row.get("created_at"),
        last_activity: row.get("last_activity"),
    })
}

fn story_from_row(row: &SqliteRow) -> anyhow::Result<Story> {
    let user_id = row
        .get::<Option<Vec<u8>>, _>("user_id")
        .map(|blob| blob_to_uuid(&blob))
        .transpose()?;
    Ok(Story {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice())?,
        town_id: blob_to_uuid(row.get::<Vec<u8>, _>("town_id").as_slice())?,
        author: row.get("author"),
        content: row.get("content"),
        location: Location::from_str(&row.get::<String, _>("location"))?,
        user_id,
        is_guest: row.get("is_guest"),
        themes: serde_json::from_str(&row.get::<String, _>("themes"))?,
        sentiment: row.get::<i64, _>("sentiment") as i32,
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl TownRepo for SqliteTownRepo {
    async fn create_town(&self, town: Town) -> anyhow::Result<()> {
        sqlx::query(&format!(
            "INSERT INTO towns ({TOWN_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(uuid_to_blob(town.id))
        .bind(town.name)
        .bind(uuid_to_blob(town.owner_id))
        .bind(town.share_id)
        .bind(town.crest)
        .bind(town.motto)
        .bind(town.is_public)
        .bind(town.allow_guest_entries)
        .bind(i64::from(town.stats.total_stories))
        .bind(i64::from(town.stats.total_visitors))
        .bind(i64::from(town.stats.locations_with_stories))
        .bind(i64::from(town.stats.contributors))
        .bind(serde_json::to_string(&town.themes)?)
        .bind(town.created_at)
        .bind(town.last_activity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_town(&self, id: Uuid) -> anyhow::Result<Option<Town>> {
        let row = sqlx::query(&format!("SELECT {TOWN_COLUMNS} FROM towns WHERE id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(town_from_row).transpose()
    }

    async fn get_town_by_share_id(&self, share_id: &str) -> anyhow::Result<Option<Town>> {
        let row = sqlx::query(&format!("SELECT {TOWN_COLUMNS} FROM towns WHERE share_id = ?"))
            .bind(share_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(town_from_row).transpose()
    }

    async fn list_towns_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Town>> {
        sqlx::query(&format!(
            "SELECT {TOWN_COLUMNS} FROM towns WHERE owner_id = ? ORDER BY last_activity DESC"
        ))
        .bind(uuid_to_blob(owner_id))
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(town_from_row)
        .collect()
    }

    async fn update_town_settings(&self, id: Uuid, settings: TownSettings) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE towns SET name = COALESCE(?, name), is_public = COALESCE(?, is_public), \
             allow_guest_entries = COALESCE(?, allow_guest_entries), last_activity = ? WHERE id = ?",
        )
        .bind(settings.name)
        .bind(settings.is_public)
        .bind(settings.allow_guest_entries)
        .bind(Utc::now())
        .bind(uuid_to_blob(id))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Removes stories and town in one transaction so no orphaned stories
    /// survive a partial failure.
    async fn delete_town(&self, id: Uuid) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM stories WHERE town_id = ?")
            .bind(uuid_to_blob(id))
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM towns WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn increment_visitors(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE towns SET total_visitors = total_visitors + 1 WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn persist_town_derived_fields(&self, id: Uuid, fields: DerivedFields) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE towns SET crest = ?, motto = ?, total_stories = ?, locations_with_stories = ?, \
             contributors = ?, themes = ?, last_activity = ? WHERE id = ?",
        )
        .bind(fields.crest)
        .bind(fields.motto)
        .bind(i64::from(fields.total_stories))
        .bind(i64::from(fields.locations_with_stories))
        .bind(i64::from(fields.contributors))
        .bind(serde_json::to_string(&fields.themes)?)
        .bind(fields.last_activity)
        .bind(uuid_to_blob(id))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_story(&self, story: Story) -> anyhow::Result<()> {
        sqlx::query(&format!(
            "INSERT INTO stories ({STORY_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(uuid_to_blob(story.id))
        .bind(uuid_to_blob(story.town_id))
        .bind(story.author)
        .bind(story.content)
        .bind(story.location.as_str())
        .bind(story.user_id.map(uuid_to_blob))
        .bind(story.is_guest)
        .bind(serde_json::to_string(&story.themes)?)
        .bind(i64::from(story.sentiment))
        .bind(story.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_story(&self, id: Uuid) -> anyhow::Result<Option<Story>> {
        let row = sqlx::query(&format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(story_from_row).transpose()
    }

    async fn delete_story(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM stories WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_stories_by_town(&self, town_id: Uuid) -> anyhow::Result<Vec<Story>> {
        sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE town_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(uuid_to_blob(town_id))
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(story_from_row)
        .collect()
    }

    async fn find_stories_at_location(&self, town_id: Uuid, location: Location) -> anyhow::Result<Vec<Story>> {
        sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE town_id = ? AND location = ? \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(uuid_to_blob(town_id))
        .bind(location.as_str())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(story_from_row)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tc_core::models::{NewStory, Theme, TownRef};
    use tc_core::Chronicle;

    async fn repo() -> SqliteTownRepo {
        SqliteTownRepo::new("sqlite::memory:").await.unwrap()
    }

    fn story(town_id: Uuid, location: Location, author: &str) -> Story {
        Story {
            id: Uuid::now_v7(),
            town_id,
            author: author.into(),
            content: "We bake bread together".into(),
            location,
            user_id: None,
            is_guest: true,
            themes: vec![Theme::Cooking, Theme::Community],
            sentiment: 2,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_town() {
        let repo = repo().await;
        let town = Town::new(Uuid::now_v7(), "Oakridge".into(), "crest".into());
        repo.create_town(town.clone()).await.unwrap();

        let by_id = repo.get_town(town.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Oakridge");
        assert_eq!(by_id.share_id, town.share_id);

        let by_share = repo.get_town_by_share_id(&town.share_id).await.unwrap().unwrap();
        assert_eq!(by_share.id, town.id);
        assert!(repo.get_town(Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stories_round_trip_and_filter_by_location() {
        let repo = repo().await;
        let town = Town::new(Uuid::now_v7(), "Oakridge".into(), "crest".into());
        repo.create_town(town.clone()).await.unwrap();

        let first = story(town.id, Location::Bakery, "Al");
        let mut second = story(town.id, Location::Park, "Bo");
        second.user_id = Some(Uuid::now_v7());
        second.created_at = first.created_at + chrono::Duration::seconds(1);
        repo.create_story(first.clone()).await.unwrap();
        repo.create_story(second.clone()).await.unwrap();

        let all = repo.find_stories_by_town(town.id).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id, "newest first");
        assert_eq!(all[0].user_id, second.user_id);
        assert_eq!(all[1].themes, first.themes);

        let bakery = repo.find_stories_at_location(town.id, Location::Bakery).await.unwrap();
        assert_eq!(bakery.len(), 1);
        assert_eq!(bakery[0].author, "Al");

        repo.delete_story(first.id).await.unwrap();
        assert!(repo.get_story(first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_derived_fields_do_not_touch_visitors() {
        let repo = repo().await;
        let town = Town::new(Uuid::now_v7(), "Oakridge".into(), "crest".into());
        repo.create_town(town.clone()).await.unwrap();
        repo.increment_visitors(town.id).await.unwrap();

        let fields = DerivedFields {
            crest: "new crest".into(),
            motto: "new motto".into(),
            total_stories: 3,
            locations_with_stories: 2,
            contributors: 2,
            themes: vec![ThemeCount { name: Theme::Nature, count: 3 }],
            last_activity: Utc::now(),
        };
        repo.persist_town_derived_fields(town.id, fields).await.unwrap();

        let stored = repo.get_town(town.id).await.unwrap().unwrap();
        assert_eq!(stored.crest, "new crest");
        assert_eq!(stored.stats.total_stories, 3);
        assert_eq!(stored.stats.total_visitors, 1);
        assert_eq!(stored.themes[0].name, Theme::Nature);
    }

    #[tokio::test]
    async fn test_settings_update_keeps_unset_fields() {
        let repo = repo().await;
        let town = Town::new(Uuid::now_v7(), "Oakridge".into(), "crest".into());
        repo.create_town(town.clone()).await.unwrap();
        repo.update_town_settings(
            town.id,
            TownSettings {
                is_public: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stored = repo.get_town(town.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Oakridge");
        assert!(!stored.is_public);
        assert!(stored.allow_guest_entries);
    }

    #[tokio::test]
    async fn test_delete_town_cascades_and_lists_by_owner() {
        let repo = repo().await;
        let owner = Uuid::now_v7();
        let keep = Town::new(owner, "Keep".into(), "crest".into());
        let doomed = Town::new(owner, "Doomed".into(), "crest".into());
        repo.create_town(keep.clone()).await.unwrap();
        repo.create_town(doomed.clone()).await.unwrap();
        repo.create_story(story(doomed.id, Location::Library, "Al")).await.unwrap();

        repo.delete_town(doomed.id).await.unwrap();
        assert!(repo.find_stories_by_town(doomed.id).await.unwrap().is_empty());

        let towns = repo.list_towns_by_owner(owner).await.unwrap();
        assert_eq!(towns.len(), 1);
        assert_eq!(towns[0].id, keep.id);
    }

    #[tokio::test]
    async fn test_chronicle_over_sqlite() {
        let repo = Arc::new(repo().await);
        let chronicle = Chronicle::new(repo.clone());
        let owner = Uuid::now_v7();
        let town = chronicle.create_town(owner, "Brambleton").await.unwrap();

        for (author, location) in [("Al", Location::Bakery), ("Al", Location::Bakery), ("Bo", Location::Park)] {
            chronicle
                .add_story(
                    TownRef::Id(town.id),
                    NewStory {
                        author: author.into(),
                        content: "fresh bread from the oven".into(),
                        location,
                    },
                    None,
                )
                .await
                .unwrap();
        }

        let stored = repo.get_town(town.id).await.unwrap().unwrap();
        assert_eq!(stored.stats.total_stories, 3);
        assert_eq!(stored.stats.locations_with_stories, 2);
        assert_eq!(stored.stats.contributors, 2);
        assert_eq!(stored.themes, vec![ThemeCount { name: Theme::Cooking, count: 3 }]);
    }
}
