//! Quest board configuration loaded from TOML
//!
//! ```toml
//! catalog = "data/quests/catalog.toml"
//! state_path = "data/quest_state.json"
//! rng_seed = 42
//!
//! [claim_bonus_gems]
//! daily = 5
//! weekly = 10
//! monthly = 15
//!
//! [reroll]
//! enabled = true
//! daily_limit = 1
//! cost_gems = 5
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::quest::{ClaimBonusGems, QuestCatalog};

pub const DEFAULT_STATE_PATH: &str = "data/quest_state.json";

/// Rerolls allowed per day and what each one costs
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RerollConfig {
    pub enabled: bool,
    pub daily_limit: u32,
    pub cost_gems: u32,
}

impl Default for RerollConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_limit: 1,
            cost_gems: 5,
        }
    }
}

impl RerollConfig {
    /// At least one reroll a day while rerolls are enabled
    pub fn daily_limit(&self) -> u32 {
        self.daily_limit.max(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuestBoardConfig {
    #[serde(default)]
    pub claim_bonus_gems: ClaimBonusGems,
    #[serde(default)]
    pub reroll: RerollConfig,
    /// Catalog file; the built-in tables are used when absent
    pub catalog: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
    /// Fixed seed for reproducible rotations
    pub rng_seed: Option<u64>,
}

impl QuestBoardConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse quest config: {}", e))
    }

    /// Load from a file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            warn!("Quest config {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
        let mut config = Self::from_toml_str(&content).map_err(|e| format!("{:?}: {}", path, e))?;

        // Relative paths inside the file resolve against the file's directory
        if let Some(base) = path.parent() {
            config.catalog = config.catalog.map(|p| resolve(base, p));
            config.state_path = config.state_path.map(|p| resolve(base, p));
        }

        info!("Loaded quest config from {:?}", path);
        Ok(config)
    }

    pub fn load_catalog(&self) -> Result<QuestCatalog, String> {
        match &self.catalog {
            Some(path) => QuestCatalog::load_from_file(path),
            None => Ok(QuestCatalog::builtin()),
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH))
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}
