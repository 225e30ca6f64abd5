//! # tc-storage-local
//! town-chronicle/crates/tc-plugins/tc-storage-local/src/lib.rs
//! Offline implementation of `TownRepo`.
//! Features: whole-store JSON snapshot on disk, an in-memory mode for tests
//! and demos, and portable single-town archives.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tc_core::models::{DerivedFields, Location, Story, Town, TownSettings};
use tc_core::traits::TownRepo;
use tc_core::Chronicle;
use tokio::fs;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    towns: Vec<Town>,
    /// Insertion order, oldest first.
    stories: Vec<Story>,
}

/// One town and all of its stories, as carried by an export string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TownArchive {
    pub town: Town,
    pub stories: Vec<Story>,
}

pub struct LocalTownStore {
    /// Snapshot file; `None` keeps everything in memory.
    path: Option<PathBuf>,
    state: RwLock<Snapshot>,
}

impl LocalTownStore {
    /// Opens the snapshot at `path`, starting empty if the file does not exist.
    pub async fn open(path: PathBuf) -> anyhow::Result<Self> {
        let state = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("corrupt chronicle store at {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(e.into()),
        };
        log::info!("local store opened at {}", path.display());
        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(Snapshot::default()),
        }
    }

    /// Writes the snapshot next to its target and renames it into place.
    async fn flush(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(snapshot)?).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Applies `change` to a copy under the write lock. The copy replaces the
    /// live snapshot only once it is on disk.
    async fn mutate<T>(&self, change: impl FnOnce(&mut Snapshot) -> anyhow::Result<T>) -> anyhow::Result<T> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let out = change(&mut next)?;
        self.flush(&next).await?;
        *state = next;
        Ok(out)
    }

    /// Encodes a town and its stories as a base64 JSON string.
    pub async fn export_town(&self, town_id: Uuid) -> anyhow::Result<Option<String>> {
        let state = self.state.read().await;
        let Some(town) = state.towns.iter().find(|t| t.id == town_id).cloned() else {
            return Ok(None);
        };
        let archive = TownArchive {
            town,
            stories: state.stories.iter().filter(|s| s.town_id == town_id).cloned().collect(),
        };
        let json = serde_json::to_vec(&archive)?;
        Ok(Some(base64::engine::general_purpose::STANDARD.encode(json)))
    }

    /// Restores an exported town, replacing any existing copy with the same id.
    ///
    /// Stories keep their stored themes and sentiment; derived town fields are
    /// taken from the archive as-is. [`restore_town`] also recomputes them.
    pub async fn import_town(&self, encoded: &str) -> anyhow::Result<Town> {
        let json = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .context("archive is not valid base64")?;
        let archive: TownArchive = serde_json::from_slice(&json).context("archive is not a town")?;
        let town_id = archive.town.id;
        if archive.stories.iter().any(|s| s.town_id != town_id) {
            bail!("archive contains stories from another town");
        }

        let TownArchive { town, stories } = archive;
        self.mutate(|s| {
            if s.towns.iter().any(|t| t.share_id == town.share_id && t.id != town_id) {
                bail!("share id {} already belongs to another town", town.share_id);
            }
            s.towns.retain(|t| t.id != town_id);
            s.stories.retain(|story| story.town_id != town_id);
            s.towns.push(town.clone());
            s.stories.extend(stories);
            Ok(())
        })
        .await?;

        log::info!("imported town {}", town_id);
        Ok(town)
    }
}

/// Imports an archive into `store`, then rebuilds the town's crest, motto and
/// stats from the imported stories.
pub async fn restore_town(store: &Arc<LocalTownStore>, encoded: &str) -> anyhow::Result<Town> {
    let imported = store.import_town(encoded).await?;
    let chronicle = Chronicle::new(store.clone());
    chronicle.recompute(imported.id).await?;
    store
        .get_town(imported.id)
        .await?
        .with_context(|| format!("town {} vanished after import", imported.id))
}

fn newest_first<'a>(stories: impl DoubleEndedIterator<Item = &'a Story>) -> Vec<Story> {
    stories.rev().cloned().collect()
}

#[async_trait]
impl TownRepo for LocalTownStore {
    async fn create_town(&self, town: Town) -> anyhow::Result<()> {
        self.mutate(|s| {
            s.towns.push(town);
            Ok(())
        })
        .await
    }

    async fn get_town(&self, id: Uuid) -> anyhow::Result<Option<Town>> {
        Ok(self.state.read().await.towns.iter().find(|t| t.id == id).cloned())
    }

    async fn get_town_by_share_id(&self, share_id: &str) -> anyhow::Result<Option<Town>> {
        Ok(self
            .state
            .read()
            .await
            .towns
            .iter()
            .find(|t| t.share_id == share_id)
            .cloned())
    }

    async fn list_towns_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Town>> {
        let mut towns: Vec<Town> = self
            .state
            .read()
            .await
            .towns
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        towns.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(towns)
    }

    async fn update_town_settings(&self, id: Uuid, settings: TownSettings) -> anyhow::Result<()> {
        self.mutate(|s| {
            if let Some(town) = s.towns.iter_mut().find(|t| t.id == id) {
                if let Some(name) = settings.name {
                    town.name = name;
                }
                if let Some(is_public) = settings.is_public {
                    town.is_public = is_public;
                }
                if let Some(allow) = settings.allow_guest_entries {
                    town.allow_guest_entries = allow;
                }
                town.last_activity = Utc::now();
            }
            Ok(())
        })
        .await
    }

    async fn delete_town(&self, id: Uuid) -> anyhow::Result<()> {
        self.mutate(|s| {
            s.stories.retain(|story| story.town_id != id);
            s.towns.retain(|t| t.id != id);
            Ok(())
        })
        .await
    }

    async fn increment_visitors(&self, id: Uuid) -> anyhow::Result<()> {
        self.mutate(|s| {
            if let Some(town) = s.towns.iter_mut().find(|t| t.id == id) {
                town.stats.total_visitors += 1;
            }
            Ok(())
        })
        .await
    }

    async fn persist_town_derived_fields(&self, id: Uuid, fields: DerivedFields) -> anyhow::Result<()> {
        self.mutate(|s| {
            if let Some(town) = s.towns.iter_mut().find(|t| t.id == id) {
                town.crest = fields.crest;
                town.motto = fields.motto;
                town.stats.total_stories = fields.total_stories;
                town.stats.locations_with_stories = fields.locations_with_stories;
                town.stats.contributors = fields.contributors;
                town.themes = fields.themes;
                town.last_activity = fields.last_activity;
            }
            Ok(())
        })
        .await
    }

    async fn create_story(&self, story: Story) -> anyhow::Result<()> {
        self.mutate(|s| {
            s.stories.push(story);
            Ok(())
        })
        .await
    }

    async fn get_story(&self, id: Uuid) -> anyhow::Result<Option<Story>> {
        Ok(self.state.read().await.stories.iter().find(|s| s.id == id).cloned())
    }

    async fn delete_story(&self, id: Uuid) -> anyhow::Result<()> {
        self.mutate(|s| {
            s.stories.retain(|story| story.id != id);
            Ok(())
        })
        .await
    }

    async fn find_stories_by_town(&self, town_id: Uuid) -> anyhow::Result<Vec<Story>> {
        let state = self.state.read().await;
        Ok(newest_first(state.stories.iter().filter(|s| s.town_id == town_id)))
    }

    async fn find_stories_at_location(&self, town_id: Uuid, location: Location) -> anyhow::Result<Vec<Story>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state
                .stories
                .iter()
                .filter(|s| s.town_id == town_id && s.location == location),
        ))
    }
}
