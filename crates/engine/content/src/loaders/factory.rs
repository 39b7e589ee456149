//! Campaign assembly from a content directory.

use std::path::{Path, PathBuf};

use engine_core::state::{Campaign, CampaignState};
use tracing::{debug, info};

use crate::knowledge::KnowledgeBase;
use crate::loaders::{CatalogLoader, ConfigLoader, LoadResult, StoryLoader};
use crate::loaders::story::StoryFile;

/// Builds a [`CampaignState`] from an authored content directory:
///
/// ```text
/// data/
/// ├── config.toml        engine config overrides (optional)
/// ├── story.json         story tree (optional)
/// ├── knowledge/         knowledge-base folders (optional)
/// └── catalogs/
///     ├── skills.ron
///     ├── items.ron
///     ├── effects.ron
///     └── shields.ron
/// ```
///
/// Every file is optional; a missing catalog just leaves its registry empty.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Assembles a fresh campaign from the content directory.
    pub fn build(&self, campaign_name: &str) -> LoadResult<CampaignState> {
        let mut state = CampaignState::new(Campaign::new(campaign_name));

        if let Some(path) = self.existing("config.toml") {
            state.config = ConfigLoader::load(&path)?;
        }

        if let Some(path) = self.existing("catalogs/skills.ron") {
            for skill in CatalogLoader::load_skills(&path)? {
                state.skills.insert(skill.id, skill);
            }
        }
        if let Some(path) = self.existing("catalogs/items.ron") {
            for item in CatalogLoader::load_items(&path)? {
                state.items.insert(item.id, item);
            }
        }
        if let Some(path) = self.existing("catalogs/effects.ron") {
            for template in CatalogLoader::load_effects(&path)? {
                state.effect_templates.insert(template.kind, template);
            }
        }
        if let Some(path) = self.existing("catalogs/shields.ron") {
            for template in CatalogLoader::load_shields(&path)? {
                state.shield_templates.insert(template.violation, template);
            }
        }

        info!(
            campaign = campaign_name,
            skills = state.skills.len(),
            items = state.items.len(),
            effects = state.effect_templates.len(),
            shields = state.shield_templates.len(),
            "campaign content loaded"
        );
        Ok(state)
    }

    /// Loads the story tree, if the campaign ships one.
    pub fn load_story(&self) -> LoadResult<Option<StoryFile>> {
        match self.existing("story.json") {
            Some(path) => Ok(Some(StoryLoader::load(&path)?)),
            None => Ok(None),
        }
    }

    /// Imports the knowledge base, empty when the folder is absent.
    pub fn load_knowledge(&self) -> LoadResult<KnowledgeBase> {
        match self.existing("knowledge") {
            Some(path) => KnowledgeBase::import(&path),
            None => Ok(KnowledgeBase::default()),
        }
    }

    fn existing(&self, relative: &str) -> Option<PathBuf> {
        let path = self.data_dir.join(relative);
        if path.exists() {
            Some(path)
        } else {
            debug!(path = %path.display(), "content file absent, using defaults");
            None
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
