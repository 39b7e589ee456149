//! Story file (JSON) import.
//!
//! Stories arrive as an authored tree: chapters holding quests, quests gated
//! by starter and objective conditions built from triggers. The loader is
//! lenient by contract: an unknown trigger type is downgraded to `custom`
//! with the original kind appended to the description, and references that
//! do not resolve against the campaign are logged and skipped, never fatal.

use std::path::Path;

use engine_core::state::CampaignState;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::loaders::{read_file, LoadResult};

// ============================================================================
// Tree
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryFile {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub canonical: bool,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub order: u32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub quests: Vec<Quest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cycle_limit: Option<u64>,
    #[serde(default)]
    pub starters: Vec<Condition>,
    #[serde(default)]
    pub objectives: Vec<Condition>,
    #[serde(default)]
    pub on_success: Option<Reward>,
    #[serde(default)]
    pub on_failure: Option<Reward>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    All,
    Any,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    Search,
    Kill,
    Interaction,
    Position,
    UseItem,
    UseSkill,
    Custom,
}

impl TriggerKind {
    fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "search" => Self::Search,
            "kill" => Self::Kill,
            "interaction" => Self::Interaction,
            "position" => Self::Position,
            "useItem" => Self::UseItem,
            "useSkill" => Self::UseSkill,
            "custom" => Self::Custom,
            _ => return None,
        })
    }
}

/// A quest trigger. References are authored names or ids kept as strings;
/// resolution against the campaign happens in [`StoryLoader::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawTrigger")]
pub struct Trigger {
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Deserialization shim carrying the raw trigger type string so unknown
/// kinds can be downgraded instead of failing the whole story.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrigger {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    game_object: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    npc: Option<String>,
    #[serde(default)]
    skill: Option<String>,
    #[serde(default)]
    item: Option<String>,
    #[serde(default)]
    description: String,
}

impl From<RawTrigger> for Trigger {
    fn from(raw: RawTrigger) -> Self {
        let (kind, description) = match TriggerKind::parse(&raw.kind) {
            Some(kind) => (kind, raw.description),
            None => {
                warn!(kind = %raw.kind, "unknown trigger type, downgrading to custom");
                let description = if raw.description.is_empty() {
                    format!("(original kind: {})", raw.kind)
                } else {
                    format!("{} (original kind: {})", raw.description, raw.kind)
                };
                (TriggerKind::Custom, description)
            }
        };
        Self {
            kind,
            game_object: raw.game_object,
            position: raw.position,
            location: raw.location,
            npc: raw.npc,
            skill: raw.skill,
            item: raw.item,
            description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub experience: i64,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub tokens: i64,
    #[serde(default)]
    pub effects: Vec<String>,
}

// ============================================================================
// Loader
// ============================================================================

/// A story resolved against a campaign: counts how many trigger references
/// matched world entities and how many dangled.
#[derive(Debug, Clone)]
pub struct AppliedStory {
    pub story: StoryFile,
    pub resolved_references: usize,
    pub skipped_references: usize,
}

pub struct StoryLoader;

impl StoryLoader {
    pub fn load(path: &Path) -> LoadResult<StoryFile> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<StoryFile> {
        serde_json::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse story JSON: {}", e))
    }

    pub fn dump(story: &StoryFile) -> LoadResult<String> {
        serde_json::to_string_pretty(story)
            .map_err(|e| anyhow::anyhow!("Failed to serialize story: {}", e))
    }

    /// Resolves trigger references against the campaign by name. Dangling
    /// references are logged and skipped; the story itself is kept intact.
    pub fn resolve(story: StoryFile, state: &CampaignState) -> AppliedStory {
        let mut resolved = 0;
        let mut skipped = 0;

        let mut check = |field: &str, value: &Option<String>, known: bool| {
            if value.is_none() {
                return;
            }
            if known {
                resolved += 1;
            } else {
                skipped += 1;
                warn!(
                    field,
                    reference = value.as_deref().unwrap_or_default(),
                    "story reference does not resolve, skipping"
                );
            }
        };

        for chapter in &story.chapters {
            for quest in &chapter.quests {
                for condition in quest.starters.iter().chain(quest.objectives.iter()) {
                    for trigger in &condition.triggers {
                        check(
                            "position",
                            &trigger.position,
                            trigger
                                .position
                                .as_deref()
                                .map(|name| state.positions.iter().any(|p| p.name == name))
                                .unwrap_or(false),
                        );
                        check(
                            "npc",
                            &trigger.npc,
                            trigger
                                .npc
                                .as_deref()
                                .map(|name| state.characters.values().any(|c| c.name == name))
                                .unwrap_or(false),
                        );
                        check(
                            "skill",
                            &trigger.skill,
                            trigger
                                .skill
                                .as_deref()
                                .map(|name| state.skills.values().any(|s| s.name == name))
                                .unwrap_or(false),
                        );
                        check(
                            "item",
                            &trigger.item,
                            trigger
                                .item
                                .as_deref()
                                .map(|name| state.items.values().any(|i| i.name == name))
                                .unwrap_or(false),
                        );
                    }
                }
            }
        }

        AppliedStory {
            story,
            resolved_references: resolved,
            skipped_references: skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::state::{Campaign, Coordinates, Position};

    fn sample() -> &'static str {
        r#"{
            "title": "The Hollow Road",
            "description": "A road that eats travellers.",
            "tags": ["intro"],
            "canonical": true,
            "chapters": [{
                "title": "First Steps",
                "order": 1,
                "quests": [{
                    "title": "Reach the crossing",
                    "cycleLimit": 40,
                    "starters": [{
                        "type": "all",
                        "triggers": [{
                            "type": "position",
                            "position": "crossing",
                            "description": "stand at the crossing"
                        }]
                    }],
                    "objectives": [{
                        "type": "any",
                        "triggers": [{
                            "type": "kill",
                            "npc": "road warden",
                            "description": "fell the warden"
                        }]
                    }],
                    "onSuccess": {
                        "description": "the road opens",
                        "experience": 120,
                        "items": [],
                        "tokens": 3,
                        "effects": []
                    }
                }]
            }]
        }"#
    }

    #[test]
    fn load_dump_load_preserves_the_tree() {
        let first = StoryLoader::parse(sample()).unwrap();
        let dumped = StoryLoader::dump(&first).unwrap();
        let second = StoryLoader::parse(&dumped).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.chapters[0].quests[0].cycle_limit, Some(40));
    }

    #[test]
    fn unknown_trigger_downgrades_to_custom() {
        let raw = r#"{
            "title": "x",
            "chapters": [{
                "title": "c", "order": 1,
                "quests": [{
                    "title": "q",
                    "starters": [{
                        "type": "all",
                        "triggers": [{ "type": "ritual", "description": "light the brazier" }]
                    }]
                }]
            }]
        }"#;
        let story = StoryLoader::parse(raw).unwrap();
        let trigger = &story.chapters[0].quests[0].starters[0].triggers[0];
        assert_eq!(trigger.kind, TriggerKind::Custom);
        assert_eq!(trigger.description, "light the brazier (original kind: ritual)");
    }

    #[test]
    fn dangling_references_are_skipped_not_fatal() {
        let story = StoryLoader::parse(sample()).unwrap();
        let mut state = CampaignState::new(Campaign::new("test"));
        state
            .positions
            .insert(Position::new("crossing", Coordinates::new(3, 1, 0)));

        // "crossing" resolves, "road warden" does not exist.
        let applied = StoryLoader::resolve(story, &state);
        assert_eq!(applied.resolved_references, 1);
        assert_eq!(applied.skipped_references, 1);
        assert_eq!(applied.story.chapters.len(), 1);
    }
}
