//! Quest Reroll
//!
//! Lets the player swap one unfinished daily or weekly quest for another
//! template of the same tier that is not already on the board.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use super::catalog::{create_quest_instance_from_template, QuestCatalog};
use super::definition::{QuestTemplate, QuestType};
use super::rotation::{pick_index, RandomSource};
use super::state::QuestInstance;

/// Why a reroll was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerollFailureReason {
    /// Unknown quest id, or every template of the tier is already on the board
    NoCandidate,
    /// Monthly quests are fixed
    InvalidType,
    /// Rerolling a finished quest would reset its reward
    AlreadyCompleted,
    /// Rerolls are switched off in the config
    Disabled,
    /// The day's reroll allowance is used up
    LimitReached,
    /// The player cannot pay the reroll cost
    InsufficientGems,
}

impl RerollFailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RerollFailureReason::NoCandidate => "no_candidate",
            RerollFailureReason::InvalidType => "invalid_type",
            RerollFailureReason::AlreadyCompleted => "already_completed",
            RerollFailureReason::Disabled => "disabled",
            RerollFailureReason::LimitReached => "limit_reached",
            RerollFailureReason::InsufficientGems => "insufficient_gems",
        }
    }
}

impl fmt::Display for RerollFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful reroll
#[derive(Debug, Clone)]
pub struct QuestReroll {
    /// New board with the replacement at the old quest's position
    pub quests: Vec<QuestInstance>,
    pub old_template_id: String,
    pub new_template_id: String,
    pub quest_type: QuestType,
}

/// Replace quest `quest_id` with a fresh instance of an unused template.
///
/// The replacement keeps the period (`cycle_key`) of the quest it replaces.
/// Only board-level refusals come from here; `Disabled`, `LimitReached` and
/// `InsufficientGems` are decided by the session that owns the allowance.
pub fn reroll_quest_instance(
    quests: &[QuestInstance],
    quest_id: &str,
    catalog: &QuestCatalog,
    random: &mut dyn RandomSource,
) -> Result<QuestReroll, RerollFailureReason> {
    let target_index = quests
        .iter()
        .position(|quest| quest.id == quest_id)
        .ok_or(RerollFailureReason::NoCandidate)?;
    let target = &quests[target_index];

    if !target.quest_type.is_rotating() {
        return Err(RerollFailureReason::InvalidType);
    }

    if target.claimed || target.is_completed() {
        return Err(RerollFailureReason::AlreadyCompleted);
    }

    let on_board: HashSet<&str> = quests
        .iter()
        .filter(|quest| quest.quest_type == target.quest_type)
        .map(|quest| quest.template_id.as_str())
        .collect();

    let candidates: Vec<&QuestTemplate> = catalog
        .templates(target.quest_type)
        .iter()
        .filter(|template| !on_board.contains(&*template.template_id))
        .collect();

    if candidates.is_empty() {
        return Err(RerollFailureReason::NoCandidate);
    }

    let picked = candidates[pick_index(random, candidates.len())];
    let replacement = create_quest_instance_from_template(picked, &target.cycle_key);

    debug!(
        "Rerolled {} quest {} -> {}",
        target.quest_type, target.template_id, picked.template_id
    );

    let mut next = quests.to_vec();
    next[target_index] = replacement;

    Ok(QuestReroll {
        quests: next,
        old_template_id: target.template_id.clone(),
        new_template_id: picked.template_id.to_string(),
        quest_type: target.quest_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::catalog::DAILY_QUEST_TEMPLATES;
    use crate::quest::cycle::QuestCycleKeys;
    use crate::quest::rotation::build_quest_board_for_cycles;
    use crate::quest::state::QuestChestState;

    fn board() -> Vec<QuestInstance> {
        let keys = QuestCycleKeys {
            daily: "2026-03-10".to_string(),
            weekly: "2026-W11".to_string(),
            monthly: "2026-03".to_string(),
        };
        build_quest_board_for_cycles(&QuestCatalog::builtin(), &keys, None, None, &mut || 0.0).quests
    }

    fn first_of(quests: &[QuestInstance], quest_type: QuestType) -> (usize, QuestInstance) {
        quests
            .iter()
            .enumerate()
            .find(|(_, q)| q.quest_type == quest_type)
            .map(|(i, q)| (i, q.clone()))
            .unwrap()
    }

    #[test]
    fn test_daily_reroll_replaces_in_place() {
        let quests = board();
        let (index, target) = first_of(&quests, QuestType::Daily);

        let result = reroll_quest_instance(&quests, &target.id, &QuestCatalog::builtin(), &mut || 0.0).unwrap();
        assert_eq!(result.quest_type, QuestType::Daily);
        assert_eq!(result.old_template_id, "qd_lessons_2");
        // lessons 2/3/5 are on the board, so the first candidate is the streak quest
        assert_eq!(result.new_template_id, "qd_streak5_1");

        let replaced = &result.quests[index];
        assert_eq!(replaced.template_id, "qd_streak5_1");
        assert_eq!(replaced.cycle_key, target.cycle_key);
        assert_eq!(replaced.progress, 0);
        assert!(!replaced.claimed);
        assert_eq!(replaced.chest_state, QuestChestState::Closed);
        assert!(result.quests.iter().all(|q| q.id != target.id));
        assert_eq!(result.quests.len(), quests.len());
    }

    #[test]
    fn test_weekly_reroll() {
        let quests = board();
        let (_, target) = first_of(&quests, QuestType::Weekly);

        let result = reroll_quest_instance(&quests, &target.id, &QuestCatalog::builtin(), &mut || 0.99).unwrap();
        assert_eq!(result.quest_type, QuestType::Weekly);
        assert_eq!(result.old_template_id, target.template_id);
        assert_eq!(result.new_template_id, "qw_streak5_5");
    }

    #[test]
    fn test_in_progress_quest_can_be_rerolled() {
        let mut quests = board();
        let (index, target) = first_of(&quests, QuestType::Daily);
        quests[index].progress = target.need - 1;

        assert!(reroll_quest_instance(&quests, &target.id, &QuestCatalog::builtin(), &mut || 0.0).is_ok());
    }

    #[test]
    fn test_monthly_reroll_is_invalid() {
        let quests = board();
        let result = reroll_quest_instance(&quests, "q_monthly_50pts", &QuestCatalog::builtin(), &mut || 0.0);
        assert_eq!(result.unwrap_err(), RerollFailureReason::InvalidType);
    }

    #[test]
    fn test_completed_or_claimed_reroll_is_refused() {
        let mut quests = board();
        let (index, target) = first_of(&quests, QuestType::Daily);
        quests[index].progress = target.need;

        let result = reroll_quest_instance(&quests, &target.id, &QuestCatalog::builtin(), &mut || 0.0);
        assert_eq!(result.unwrap_err(), RerollFailureReason::AlreadyCompleted);
        assert_eq!(RerollFailureReason::AlreadyCompleted.as_str(), "already_completed");
    }

    #[test]
    fn test_unknown_id_and_full_tier_have_no_candidate() {
        let quests = board();
        let catalog = QuestCatalog::builtin();
        let result = reroll_quest_instance(&quests, "missing", &catalog, &mut || 0.0);
        assert_eq!(result.unwrap_err(), RerollFailureReason::NoCandidate);

        let all_daily: Vec<_> = DAILY_QUEST_TEMPLATES
            .iter()
            .map(|template| create_quest_instance_from_template(template, "2026-03-10"))
            .collect();
        let result = reroll_quest_instance(&all_daily, &all_daily[0].id, &catalog, &mut || 0.0);
        assert_eq!(result.unwrap_err(), RerollFailureReason::NoCandidate);
    }
}
