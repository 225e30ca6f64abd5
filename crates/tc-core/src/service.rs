//! # Chronicle Service
//!
//! Coordinates the repository port with the derivation pipeline. Every story
//! insert or delete is followed by one full recompute of the town's derived
//! fields from its complete story set. Both the HTTP API and the offline
//! store go through this type.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::crest::{CrestCatalog, CrestPattern};
use crate::error::{AppError, Result};
use crate::lexicon::Lexicon;
use crate::models::{
    trimmed_field, DerivedFields, Location, NewStory, Story, Town, TownRef, TownSettings,
    AUTHOR_MAX_CHARS, CONTENT_MAX_CHARS, TOWN_NAME_MAX_CHARS,
};
use crate::motto::MottoBook;
use crate::stats::recompute_stats;
use crate::traits::TownRepo;

#[derive(Clone)]
pub struct Chronicle {
    repo: Arc<dyn TownRepo>,
    lexicon: Arc<Lexicon>,
    crests: &'static CrestCatalog,
    mottos: &'static MottoBook,
}

impl Chronicle {
    pub fn new(repo: Arc<dyn TownRepo>) -> Self {
        Self {
            repo,
            lexicon: Arc::new(Lexicon::builtin().clone()),
            crests: CrestCatalog::builtin(),
            mottos: MottoBook::builtin(),
        }
    }

    /// Replaces the built-in keyword tables.
    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = Arc::new(lexicon);
        self
    }

    pub fn crests(&self) -> &CrestCatalog {
        self.crests
    }

    // Towns

    pub async fn create_town(&self, owner_id: Uuid, name: &str) -> Result<Town> {
        let name = trimmed_field("town name", name, TOWN_NAME_MAX_CHARS)?;
        let town = Town::new(owner_id, name, self.crests.default_pattern().to_string());
        self.repo.create_town(town.clone()).await?;
        info!("town {} created by {}", town.id, owner_id);
        Ok(town)
    }

    pub async fn my_towns(&self, owner_id: Uuid) -> Result<Vec<Town>> {
        Ok(self.repo.list_towns_by_owner(owner_id).await?)
    }

    /// Loads a shared town with its stories. Reads by anyone but the owner
    /// count as a visit.
    pub async fn view_shared(&self, share_id: &str, viewer: Option<Uuid>) -> Result<(Town, Vec<Story>)> {
        let mut town = self
            .repo
            .get_town_by_share_id(share_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Town".into(), share_id.to_string()))?;
        ensure_visible(&town, viewer)?;

        let stories = self.repo.find_stories_by_town(town.id).await?;
        if !town.is_owned_by(viewer) {
            self.repo.increment_visitors(town.id).await?;
            town.stats.total_visitors += 1;
        }
        Ok((town, stories))
    }

    pub async fn update_settings(&self, town_id: Uuid, requester: Uuid, mut settings: TownSettings) -> Result<Town> {
        self.owned_town(town_id, requester).await?;
        if let Some(name) = settings.name.take() {
            settings.name = Some(trimmed_field("town name", &name, TOWN_NAME_MAX_CHARS)?);
        }
        self.repo.update_town_settings(town_id, settings).await?;
        self.load_town(town_id).await
    }

    pub async fn delete_town(&self, town_id: Uuid, requester: Uuid) -> Result<()> {
        self.owned_town(town_id, requester).await?;
        self.repo.delete_town(town_id).await?;
        info!("town {} deleted with its stories", town_id);
        Ok(())
    }

    /// Re-rolls crest and motto for the current story set.
    pub async fn regenerate(&self, town_id: Uuid, requester: Uuid) -> Result<Town> {
        self.owned_town(town_id, requester).await?;
        self.recompute(town_id).await?;
        self.load_town(town_id).await
    }

    /// Crest patterns the town's stories currently qualify for.
    pub async fn unlocked_crests(&self, town_id: Uuid, viewer: Option<Uuid>) -> Result<Vec<CrestPattern>> {
        let town = self.load_town(town_id).await?;
        ensure_visible(&town, viewer)?;
        let stories = self.repo.find_stories_by_town(town_id).await?;
        Ok(self.crests.unlocked(&stories).into_iter().cloned().collect())
    }

    // Stories

    /// Validates and stores a story, then recomputes the town.
    ///
    /// Anyone other than the owner writes as a guest; guests are refused when
    /// the town disallows guest entries.
    pub async fn add_story(&self, target: TownRef, submission: NewStory, viewer: Option<Uuid>) -> Result<Story> {
        let town = match &target {
            TownRef::Id(id) => self.repo.get_town(*id).await?,
            TownRef::Share(share_id) => self.repo.get_town_by_share_id(share_id).await?,
        };
        let town = town.ok_or_else(|| {
            let key = match target {
                TownRef::Id(id) => id.to_string(),
                TownRef::Share(share_id) => share_id,
            };
            AppError::NotFound("Town".into(), key)
        })?;

        let is_guest = !town.is_owned_by(viewer);
        if is_guest && !town.allow_guest_entries {
            warn!("guest entry refused for town {}", town.id);
            return Err(AppError::Forbidden("guest entries not allowed for this town".into()));
        }

        let author = trimmed_field("author", &submission.author, AUTHOR_MAX_CHARS)?;
        let content = trimmed_field("content", &submission.content, CONTENT_MAX_CHARS)?;

        let story = Story {
            id: Uuid::now_v7(),
            town_id: town.id,
            themes: self.lexicon.extract_themes(&content),
            sentiment: self.lexicon.analyze_sentiment(&content),
            author,
            content,
            location: submission.location,
            user_id: viewer,
            is_guest,
            created_at: Utc::now(),
        };

        self.repo.create_story(story.clone()).await?;
        self.recompute(town.id).await?;
        info!("story {} added to town {} at {}", story.id, town.id, story.location);
        Ok(story)
    }

    pub async fn stories_at(&self, town_id: Uuid, location: Location, viewer: Option<Uuid>) -> Result<Vec<Story>> {
        let town = self.load_town(town_id).await?;
        ensure_visible(&town, viewer)?;
        Ok(self.repo.find_stories_at_location(town_id, location).await?)
    }

    /// Removes a story (town owner only), then recomputes the town.
    pub async fn delete_story(&self, story_id: Uuid, requester: Uuid) -> Result<()> {
        let story = self
            .repo
            .get_story(story_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story".into(), story_id.to_string()))?;
        let town = self.load_town(story.town_id).await?;
        if !town.is_owned_by(Some(requester)) {
            return Err(AppError::Forbidden("only the town owner can delete stories".into()));
        }

        self.repo.delete_story(story_id).await?;
        self.recompute(town.id).await?;
        info!("story {} removed from town {}", story_id, town.id);
        Ok(())
    }

    /// Rebuilds every story-derived town field from the full current story
    /// set and writes them back.
    pub async fn recompute(&self, town_id: Uuid) -> Result<DerivedFields> {
        let mut stories = self.repo.find_stories_by_town(town_id).await?;
        stories.reverse();
        let fields = self.derive(&stories);
        debug!(
            "town {} recomputed: {} stories, {} locations, {} contributors",
            town_id, fields.total_stories, fields.locations_with_stories, fields.contributors
        );
        self.repo
            .persist_town_derived_fields(town_id, fields.clone())
            .await?;
        Ok(fields)
    }

    /// Pure derivation step of [`Chronicle::recompute`].
    ///
    /// `stories` must be in creation order, oldest first: theme counts keep
    /// first-seen order and motto ties go to the earliest theme.
    pub fn derive(&self, stories: &[Story]) -> DerivedFields {
        let mut rng = rand::rng();
        let stats = recompute_stats(stories);
        DerivedFields {
            crest: self.crests.generate(stories, &mut rng),
            motto: self.mottos.generate(stories, &mut rng),
            total_stories: stats.total_stories,
            locations_with_stories: stats.locations_with_stories,
            contributors: stats.contributors,
            themes: stats.themes,
            last_activity: Utc::now(),
        }
    }

    async fn load_town(&self, town_id: Uuid) -> Result<Town> {
        self.repo
            .get_town(town_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Town".into(), town_id.to_string()))
    }

    async fn owned_town(&self, town_id: Uuid, requester: Uuid) -> Result<Town> {
        let town = self.load_town(town_id).await?;
        if !town.is_owned_by(Some(requester)) {
            return Err(AppError::Forbidden("not the owner of this town".into()));
        }
        Ok(town)
    }
}

fn ensure_visible(town: &Town, viewer: Option<Uuid>) -> Result<()> {
    if town.is_public || town.is_owned_by(viewer) {
        Ok(())
    } else {
        Err(AppError::Forbidden("this town is private".into()))
    }
}
