//! Quest State Storage
//!
//! The host's key-value storage for the board, the cycle keys it was built
//! for, and the rotation selection. The quest core never touches storage;
//! the session loads and saves through [`QuestStateStore`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::quest::{QuestCycleKeys, QuestInstance, QuestRotationSelection};

pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Rerolls spent on one day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RerollUsage {
    /// Daily cycle key of the last reroll
    pub date: Option<String>,
    pub count: u32,
}

impl RerollUsage {
    /// Rerolls already spent on `day`; an older date counts as none
    pub fn used_on(&self, day: &str) -> u32 {
        match &self.date {
            Some(date) if date == day => self.count,
            _ => 0,
        }
    }
}

/// Everything the host persists between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedQuestState {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub cycle_keys: QuestCycleKeys,
    #[serde(default)]
    pub quests: Vec<QuestInstance>,
    #[serde(default)]
    pub selection: QuestRotationSelection,
    #[serde(default)]
    pub reroll_usage: RerollUsage,
}

impl PersistedQuestState {
    pub fn new(cycle_keys: QuestCycleKeys, quests: Vec<QuestInstance>, selection: QuestRotationSelection) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            cycle_keys,
            quests,
            selection,
            reroll_usage: RerollUsage::default(),
        }
    }

    /// Serialize for storage
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize quest state: {}", e))
    }

    /// Deserialize from storage, repairing out-of-range progress and duplicate selection ids
    pub fn from_json(json: &str) -> Result<Self, String> {
        let state: Self = serde_json::from_str(json)
            .map_err(|e| format!("Failed to parse quest state: {}", e))?;
        Ok(Self {
            quests: state.quests.into_iter().map(QuestInstance::sanitized).collect(),
            selection: state.selection.normalize(),
            ..state
        })
    }
}

/// Load/save interface for persisted quest state
pub trait QuestStateStore {
    /// `Ok(None)` when nothing was saved yet
    fn load(&self) -> Result<Option<PersistedQuestState>, String>;

    fn save(&mut self, state: &PersistedQuestState) -> Result<(), String>;
}

/// Keeps state in memory; counts saves so callers can check persistence was skipped
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    state: Option<PersistedQuestState>,
    saves: usize,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedQuestState) -> Self {
        Self {
            state: Some(state),
            saves: 0,
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl QuestStateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<PersistedQuestState>, String> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &PersistedQuestState) -> Result<(), String> {
        self.state = Some(state.clone());
        self.saves += 1;
        Ok(())
    }
}

/// Stores state as pretty-printed JSON in a single file
#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QuestStateStore for JsonFileStateStore {
    fn load(&self) -> Result<Option<PersistedQuestState>, String> {
        if !self.path.exists() {
            info!("No saved quest state at {:?}, starting fresh", self.path);
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| format!("Failed to read {:?}: {}", self.path, e))?;

        let state = PersistedQuestState::from_json(&content)
            .map_err(|e| format!("{:?}: {}", self.path, e))?;

        debug!("Loaded {} quests from {:?}", state.quests.len(), self.path);
        Ok(Some(state))
    }

    fn save(&mut self, state: &PersistedQuestState) -> Result<(), String> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create directory {:?}: {}", parent, e))?;
        }

        std::fs::write(&self.path, state.to_json()?)
            .map_err(|e| format!("Failed to write {:?}: {}", self.path, e))?;

        debug!("Saved {} quests to {:?}", state.quests.len(), self.path);
        Ok(())
    }
}
