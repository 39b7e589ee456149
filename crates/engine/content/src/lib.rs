//! Data-driven campaign content and loaders.
//!
//! This crate houses the file formats a campaign is authored in and the
//! loaders that turn them into engine state:
//! - Story files (JSON): positions, connections, characters, triggers
//! - Skill / item / effect / shield catalogs (RON)
//! - Engine configuration overrides (TOML)
//! - Knowledge-base folders (lore documents, world calendar)
//!
//! Content is consumed at campaign build time and never re-read during play.

pub mod knowledge;
pub mod loaders;

pub use knowledge::{KnowledgeBase, WorldDate, CYCLES_PER_SOL, SOLS_PER_YEAR};
pub use loaders::{
    CatalogLoader, ConfigLoader, ContentFactory, LoadResult, StoryFile, StoryLoader,
};
