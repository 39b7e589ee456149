//! Knowledge-base folder import and the world calendar.
//!
//! Lore is authored as a folder tree `{base}/{category}/{document_name}/`
//! holding a `document.json` and an optional `image.png`. Documents may pin
//! a timeline event to a world date; the calendar runs on a fixed ratio of
//! cycles to sols to solar years.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::loaders::{read_file, LoadResult};

/// Sols in a solar year.
pub const SOLS_PER_YEAR: u64 = 500;
/// Engine cycles in one sol.
pub const CYCLES_PER_SOL: u64 = 100;

/// A date on the world calendar.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct WorldDate {
    pub solar_year: u64,
    pub sol: u64,
}

impl WorldDate {
    pub const fn new(solar_year: u64, sol: u64) -> Self {
        Self { solar_year, sol }
    }

    /// The date a given engine cycle falls on. Cycle numbering starts at 1.
    pub fn from_cycle(cycle: u64) -> Self {
        let sols = cycle.saturating_sub(1) / CYCLES_PER_SOL;
        Self {
            solar_year: sols / SOLS_PER_YEAR,
            sol: sols % SOLS_PER_YEAR,
        }
    }

    /// The first engine cycle of this date.
    pub fn first_cycle(&self) -> u64 {
        (self.solar_year * SOLS_PER_YEAR + self.sol) * CYCLES_PER_SOL + 1
    }
}

/// A timeline marker attached to a document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub active_glow: bool,
    pub sol: u64,
    pub solar_year: u64,
}

impl TimelineEvent {
    pub fn date(&self) -> WorldDate {
        WorldDate::new(self.solar_year, self.sol)
    }
}

/// Authored shape of a `document.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFile {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub timeline_event: Option<TimelineEvent>,
}

/// One imported document: the authored file plus what the folder tree knows
/// about it.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeDocument {
    /// Category folder the document lives under.
    pub category: String,
    /// Document folder name; unique within its category.
    pub name: String,
    pub document: DocumentFile,
    pub has_image: bool,
}

/// The imported knowledge base of a campaign.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    pub documents: Vec<KnowledgeDocument>,
}

impl KnowledgeBase {
    /// Imports every `{category}/{document_name}/document.json` under `base`.
    ///
    /// Malformed documents are logged and skipped; only an unreadable base
    /// directory is an error.
    pub fn import(base: &Path) -> LoadResult<Self> {
        let mut documents = Vec::new();

        let categories = std::fs::read_dir(base).map_err(|e| {
            anyhow::anyhow!("Failed to read knowledge base {}: {}", base.display(), e)
        })?;
        for category in categories.flatten() {
            let category_path = category.path();
            if !category_path.is_dir() {
                continue;
            }
            let category_name = category.file_name().to_string_lossy().into_owned();

            let Ok(entries) = std::fs::read_dir(&category_path) else {
                warn!(category = %category_name, "unreadable category folder, skipping");
                continue;
            };
            for entry in entries.flatten() {
                let folder = entry.path();
                if !folder.is_dir() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                let file = folder.join("document.json");
                if !file.is_file() {
                    warn!(category = %category_name, document = %name, "no document.json, skipping");
                    continue;
                }
                let document: DocumentFile = match read_file(&file)
                    .and_then(|text| Ok(serde_json::from_str(&text)?))
                {
                    Ok(document) => document,
                    Err(error) => {
                        warn!(category = %category_name, document = %name, %error,
                              "malformed document, skipping");
                        continue;
                    }
                };
                documents.push(KnowledgeDocument {
                    category: category_name.clone(),
                    name,
                    document,
                    has_image: folder.join("image.png").is_file(),
                });
            }
        }

        documents.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
        Ok(Self { documents })
    }

    pub fn find(&self, category: &str, name: &str) -> Option<&KnowledgeDocument> {
        self.documents
            .iter()
            .find(|d| d.category == category && d.name == name)
    }

    /// Timeline-pinned documents in calendar order.
    pub fn timeline(&self) -> Vec<(WorldDate, &KnowledgeDocument)> {
        let mut events: Vec<(WorldDate, &KnowledgeDocument)> = self
            .documents
            .iter()
            .filter_map(|d| d.document.timeline_event.map(|e| (e.date(), d)))
            .collect();
        events.sort_by_key(|(date, _)| *date);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_document(base: &Path, category: &str, name: &str, json: &str) {
        let folder = base.join(category).join(name);
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("document.json"), json).unwrap();
    }

    #[test]
    fn calendar_conversion_round_trips() {
        assert_eq!(WorldDate::from_cycle(1), WorldDate::new(0, 0));
        assert_eq!(WorldDate::from_cycle(100), WorldDate::new(0, 0));
        assert_eq!(WorldDate::from_cycle(101), WorldDate::new(0, 1));

        let date = WorldDate::new(3, 412);
        assert_eq!(WorldDate::from_cycle(date.first_cycle()), date);
        assert_eq!(date.first_cycle(), (3 * 500 + 412) * 100 + 1);
    }

    #[test]
    fn import_reads_documents_and_flags_images() {
        let dir = tempfile::tempdir().unwrap();
        write_document(
            dir.path(),
            "history",
            "the-sundering",
            r#"{"title": "The Sundering", "content": "...", "categories": ["history"],
                "timeline_event": {"active_glow": true, "sol": 12, "solar_year": 2}}"#,
        );
        write_document(
            dir.path(),
            "places",
            "hollow-road",
            r#"{"title": "Hollow Road"}"#,
        );
        std::fs::write(
            dir.path().join("places/hollow-road/image.png"),
            b"not really a png",
        )
        .unwrap();

        let base = KnowledgeBase::import(dir.path()).unwrap();
        assert_eq!(base.documents.len(), 2);
        assert!(base.find("places", "hollow-road").unwrap().has_image);
        assert!(!base.find("history", "the-sundering").unwrap().has_image);

        let timeline = base.timeline();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].0, WorldDate::new(2, 12));
    }

    #[test]
    fn malformed_document_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_document(dir.path(), "history", "good", r#"{"title": "Good"}"#);
        write_document(dir.path(), "history", "bad", r#"{"title": 7}"#);

        let base = KnowledgeBase::import(dir.path()).unwrap();
        assert_eq!(base.documents.len(), 1);
        assert_eq!(base.documents[0].name, "good");
    }
}
