//! RON catalog loaders: skills, items, effect templates, shield templates.

use std::path::Path;

use engine_core::effect::EffectTemplate;
use engine_core::shield::ShieldTemplate;
use engine_core::skill::Skill;
use engine_core::state::Item;
use serde::{Deserialize, Serialize};

use crate::loaders::{read_file, LoadResult};

/// Skill catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCatalog {
    pub skills: Vec<Skill>,
}

/// Item catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCatalog {
    pub items: Vec<Item>,
}

/// Effect template catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectCatalog {
    pub effects: Vec<EffectTemplate>,
}

/// Shield template catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldCatalog {
    pub shields: Vec<ShieldTemplate>,
}

/// Loader for the RON catalogs.
pub struct CatalogLoader;

impl CatalogLoader {
    pub fn load_skills(path: &Path) -> LoadResult<Vec<Skill>> {
        let content = read_file(path)?;
        let catalog: SkillCatalog = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse skill catalog RON: {}", e))?;
        Ok(catalog.skills)
    }

    pub fn load_items(path: &Path) -> LoadResult<Vec<Item>> {
        let content = read_file(path)?;
        let catalog: ItemCatalog = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse item catalog RON: {}", e))?;
        Ok(catalog.items)
    }

    pub fn load_effects(path: &Path) -> LoadResult<Vec<EffectTemplate>> {
        let content = read_file(path)?;
        let catalog: EffectCatalog = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse effect catalog RON: {}", e))?;
        Ok(catalog.effects)
    }

    pub fn load_shields(path: &Path) -> LoadResult<Vec<ShieldTemplate>> {
        let content = read_file(path)?;
        let catalog: ShieldCatalog = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse shield catalog RON: {}", e))?;
        Ok(catalog.shields)
    }
}
