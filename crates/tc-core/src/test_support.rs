//! Fixtures shared by the unit tests in this crate.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::analysis::{analyze_sentiment, extract_themes};
use crate::models::{DerivedFields, Location, Story, Theme, Town, TownSettings};
use crate::traits::TownRepo;

pub fn story_with(themes: &[Theme], sentiment: i32) -> Story {
    Story {
        id: Uuid::now_v7(),
        town_id: Uuid::nil(),
        author: "Tester".into(),
        content: String::new(),
        location: Location::TownSquare,
        user_id: None,
        is_guest: true,
        themes: themes.to_vec(),
        sentiment,
        created_at: Utc::now(),
    }
}

pub fn story_at(author: &str, location: Location, content: &str) -> Story {
    Story {
        author: author.into(),
        content: content.into(),
        location,
        themes: extract_themes(content),
        sentiment: analyze_sentiment(content),
        ..story_with(&[], 0)
    }
}

#[derive(Default)]
pub struct MemoryRepo {
    towns: Mutex<Vec<Town>>,
    stories: Mutex<Vec<Story>>,
}

impl MemoryRepo {
    pub fn town(&self, id: Uuid) -> Option<Town> {
        self.towns.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }

    pub fn stories_of(&self, town_id: Uuid) -> Vec<Story> {
        self.stories
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.town_id == town_id)
            .cloned()
            .collect()
    }

    fn with_town(&self, id: Uuid, f: impl FnOnce(&mut Town)) {
        if let Some(town) = self.towns.lock().unwrap().iter_mut().find(|t| t.id == id) {
            f(town);
        }
    }
}

#[async_trait]
impl TownRepo for MemoryRepo {
    async fn create_town(&self, town: Town) -> anyhow::Result<()> {
        self.towns.lock().unwrap().push(town);
        Ok(())
    }

    async fn get_town(&self, id: Uuid) -> anyhow::Result<Option<Town>> {
        Ok(self.town(id))
    }

    async fn get_town_by_share_id(&self, share_id: &str) -> anyhow::Result<Option<Town>> {
        Ok(self
            .towns
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.share_id == share_id)
            .cloned())
    }

    async fn list_towns_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Town>> {
        let mut towns: Vec<Town> = self
            .towns
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        towns.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(towns)
    }

    async fn update_town_settings(&self, id: Uuid, settings: TownSettings) -> anyhow::Result<()> {
        self.with_town(id, |town| {
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
        });
        Ok(())
    }

    async fn delete_town(&self, id: Uuid) -> anyhow::Result<()> {
        self.stories.lock().unwrap().retain(|s| s.town_id != id);
        self.towns.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }

    async fn increment_visitors(&self, id: Uuid) -> anyhow::Result<()> {
        self.with_town(id, |town| town.stats.total_visitors += 1);
        Ok(())
    }

    async fn persist_town_derived_fields(&self, id: Uuid, fields: DerivedFields) -> anyhow::Result<()> {
        self.with_town(id, |town| {
            town.crest = fields.crest;
            town.motto = fields.motto;
            town.stats.total_stories = fields.total_stories;
            town.stats.locations_with_stories = fields.locations_with_stories;
            town.stats.contributors = fields.contributors;
            town.themes = fields.themes;
            town.last_activity = fields.last_activity;
        });
        Ok(())
    }

    async fn create_story(&self, story: Story) -> anyhow::Result<()> {
        self.stories.lock().unwrap().push(story);
        Ok(())
    }

    async fn get_story(&self, id: Uuid) -> anyhow::Result<Option<Story>> {
        Ok(self.stories.lock().unwrap().iter().find(|s| s.id == id).cloned())
    }

    async fn delete_story(&self, id: Uuid) -> anyhow::Result<()> {
        self.stories.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }

    async fn find_stories_by_town(&self, town_id: Uuid) -> anyhow::Result<Vec<Story>> {
        let mut stories = self.stories_of(town_id);
        stories.reverse();
        Ok(stories)
    }

    async fn find_stories_at_location(&self, town_id: Uuid, location: Location) -> anyhow::Result<Vec<Story>> {
        let mut stories = self.find_stories_by_town(town_id).await?;
        stories.retain(|s| s.location == location);
        Ok(stories)
    }
}
