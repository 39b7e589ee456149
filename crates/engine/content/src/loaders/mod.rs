//! Content loaders for reading campaign data from files.
//!
//! Catalogs are RON, story files are JSON, configuration overrides are TOML.
//! Loaders parse into engine-core types directly via serde.

pub mod catalogs;
pub mod config;
pub mod factory;
pub mod story;

pub use catalogs::CatalogLoader;
pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use story::{AppliedStory, StoryFile, StoryLoader, TriggerKind};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
