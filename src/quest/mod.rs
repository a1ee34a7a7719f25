//! Quest Board Module
//!
//! Daily, weekly and monthly quests: period keys, template rotation,
//! progress tracking, cycle reconciliation with auto-claim, and rerolls.
//! Everything here is a pure function of its inputs; time and randomness
//! are passed in by the caller.

pub mod catalog;
pub mod claim;
pub mod cycle;
pub mod definition;
pub mod events;
pub mod progress;
pub mod reconcile;
pub mod reroll;
pub mod rotation;
pub mod state;

pub use catalog::{
    create_monthly_fixed_quest_instances, create_quest_instance_from_template, migrate_monthly_quests, QuestCatalog,
    DAILY_QUEST_TEMPLATES, DAILY_ROTATION_COUNT, MONTHLY_FIXED_QUEST_TEMPLATES, WEEKLY_QUEST_TEMPLATES,
    WEEKLY_ROTATION_COUNT,
};
pub use claim::{advance_chest_state, claim_quest_instance, ClaimFailureReason, QuestClaim};
pub use cycle::{changed_types, cycle_keys_for_date, get_cycle_keys, QuestCycleKeys};
pub use definition::{QuestMetric, QuestTemplate, QuestType};
pub use events::{apply_quest_event, QuestEvent};
pub use progress::{
    apply_quest_metric_progress, get_lesson_completion_quest_increments, get_streak_quest_increment,
    increment_quest_progress, QuestIncrement,
};
pub use reconcile::{
    reconcile_quest_board_on_cycle_change, ClaimBonusGems, CycleChange, QuestAutoClaimSummary,
    QuestReconcileResult,
};
pub use reroll::{reroll_quest_instance, QuestReroll, RerollFailureReason};
pub use rotation::{
    build_quest_board_for_cycles, pick_templates, repair_quest_board, QuestBoardBuild, QuestRotationSelection,
    RandomSource, RngSource,
};
pub use state::{QuestChestState, QuestInstance};
