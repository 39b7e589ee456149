//! Engine configuration loader (TOML).
//!
//! Campaign config files are partial: any key left out keeps the engine
//! default, so a campaign only states the knobs it actually tunes.

use std::path::Path;

use engine_core::config::EngineConfig;
use serde::Deserialize;

use crate::loaders::{read_file, LoadResult};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverrides {
    knockout_ends_in: Option<u32>,
    coma_ends_in: Option<u32>,
    coma_energy_grant: Option<i32>,
    fight_inactivity_cycles: Option<u64>,
    max_fight_participants: Option<usize>,
    visibility_window_cycles: Option<u64>,
    npc_energy_threshold: Option<f64>,
    npc_heal_threshold: Option<f64>,
    npc_reshield_level: Option<u8>,
    org_relation_threshold: Option<f64>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<EngineConfig> {
        let overrides: ConfigOverrides = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse engine config TOML: {}", e))?;

        let mut config = EngineConfig::default();
        if let Some(v) = overrides.knockout_ends_in {
            config.knockout_ends_in = v;
        }
        if let Some(v) = overrides.coma_ends_in {
            config.coma_ends_in = v;
        }
        if let Some(v) = overrides.coma_energy_grant {
            config.coma_energy_grant = v;
        }
        if let Some(v) = overrides.fight_inactivity_cycles {
            config.fight_inactivity_cycles = v;
        }
        if let Some(v) = overrides.max_fight_participants {
            config.max_fight_participants = v;
        }
        if let Some(v) = overrides.visibility_window_cycles {
            config.visibility_window_cycles = v;
        }
        if let Some(v) = overrides.npc_energy_threshold {
            config.npc_energy_threshold = v;
        }
        if let Some(v) = overrides.npc_heal_threshold {
            config.npc_heal_threshold = v;
        }
        if let Some(v) = overrides.npc_reshield_level {
            config.npc_reshield_level = v;
        }
        if let Some(v) = overrides.org_relation_threshold {
            config.org_relation_threshold = v;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let config = ConfigLoader::parse(
            r#"
            knockout_ends_in = 7
            org_relation_threshold = 0.55
            "#,
        )
        .unwrap();
        assert_eq!(config.knockout_ends_in, 7);
        assert_eq!(config.org_relation_threshold, 0.55);
        assert_eq!(config.coma_ends_in, EngineConfig::default().coma_ends_in);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ConfigLoader::parse("knockout_duration = 3").is_err());
    }
}
