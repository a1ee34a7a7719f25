//! Quest board lifecycle and rotation engine
//!
//! `quest` holds the pure core (cycle keys, catalog, rotation, progress,
//! reconciliation, rerolls, claims). `config`, `store` and `session` are the
//! host layer that loads settings, persists the board and drives the core.

pub mod config;
pub mod quest;
pub mod session;
pub mod store;

pub use config::{QuestBoardConfig, RerollConfig};
pub use session::{CycleSync, QuestBoardSession, RerollReceipt};
pub use store::{JsonFileStateStore, MemoryStateStore, PersistedQuestState, QuestStateStore, RerollUsage};
