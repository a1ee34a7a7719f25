//! Quest Claiming
//!
//! Manual reward claims and chest progression, the two mutations the host
//! applies to an instance between cycle changes.

use std::fmt;

use super::definition::QuestType;
use super::reconcile::ClaimBonusGems;
use super::state::{QuestChestState, QuestInstance};

/// Why a claim was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimFailureReason {
    NotFound,
    NotCompleted,
    AlreadyClaimed,
}

impl ClaimFailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimFailureReason::NotFound => "not_found",
            ClaimFailureReason::NotCompleted => "not_completed",
            ClaimFailureReason::AlreadyClaimed => "already_claimed",
        }
    }
}

impl fmt::Display for ClaimFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful claim; the host's ledger pays `reward_xp` and `reward_gems`
#[derive(Debug, Clone)]
pub struct QuestClaim {
    pub quests: Vec<QuestInstance>,
    pub quest_id: String,
    pub quest_type: QuestType,
    pub reward_xp: u32,
    /// Tier bonus, the same amount an auto-claim of this quest would pay
    pub reward_gems: u32,
}

/// Mark a completed quest as claimed and start opening its chest
pub fn claim_quest_instance(
    quests: &[QuestInstance],
    quest_id: &str,
    claim_bonus_gems: &ClaimBonusGems,
) -> Result<QuestClaim, ClaimFailureReason> {
    let index = quests
        .iter()
        .position(|quest| quest.id == quest_id)
        .ok_or(ClaimFailureReason::NotFound)?;
    let target = &quests[index];

    if target.claimed {
        return Err(ClaimFailureReason::AlreadyClaimed);
    }
    if !target.is_completed() {
        return Err(ClaimFailureReason::NotCompleted);
    }

    let mut next = quests.to_vec();
    next[index].claimed = true;
    if next[index].chest_state == QuestChestState::Closed {
        next[index].chest_state = QuestChestState::Opening;
    }

    Ok(QuestClaim {
        quests: next,
        quest_id: target.id.clone(),
        quest_type: target.quest_type,
        reward_xp: target.reward_xp,
        reward_gems: claim_bonus_gems.for_type(target.quest_type),
    })
}

/// Move a quest's chest one step forward. `None` when the quest is unknown
/// or its chest is already open.
pub fn advance_chest_state(quests: &[QuestInstance], quest_id: &str) -> Option<Vec<QuestInstance>> {
    let index = quests.iter().position(|quest| quest.id == quest_id)?;
    let next_state = quests[index].chest_state.next()?;

    let mut next = quests.to_vec();
    next[index].chest_state = next_state;
    Some(next)
}
