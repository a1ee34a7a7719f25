//! Quest Cycle Reconciliation
//!
//! Rebuilds the tiers whose period ended and reports the rewards of
//! completed quests the player never claimed, so the host ledger can pay
//! them out before the old instances are discarded.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::catalog::{create_monthly_fixed_quest_instances, QuestCatalog};
use super::cycle::{changed_types, QuestCycleKeys};
use super::definition::QuestType;
use super::rotation::{roll_tier, QuestRotationSelection, RandomSource};
use super::state::QuestInstance;

/// Bonus gems paid per auto-claimed quest, by tier
///
/// Tiers left out pay `default_gems`, which is 0 unless configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimBonusGems {
    pub daily: Option<u32>,
    pub weekly: Option<u32>,
    pub monthly: Option<u32>,
    #[serde(default)]
    pub default_gems: u32,
}

impl ClaimBonusGems {
    pub fn new(daily: u32, weekly: u32, monthly: u32) -> Self {
        Self {
            daily: Some(daily),
            weekly: Some(weekly),
            monthly: Some(monthly),
            default_gems: 0,
        }
    }

    pub fn for_type(&self, quest_type: QuestType) -> u32 {
        let configured = match quest_type {
            QuestType::Daily => self.daily,
            QuestType::Weekly => self.weekly,
            QuestType::Monthly => self.monthly,
        };
        configured.unwrap_or(self.default_gems)
    }
}

/// Rewards settled automatically at a cycle boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestAutoClaimSummary {
    pub claimed_count: u32,
    pub total_reward_xp: u32,
    pub total_reward_gems: u32,
}

impl QuestAutoClaimSummary {
    pub fn is_empty(&self) -> bool {
        self.claimed_count == 0
    }
}

/// The board and periods a reconciliation starts from
#[derive(Debug, Clone, Copy)]
pub struct CycleChange<'a, 'k> {
    pub quests: &'a [QuestInstance],
    pub prev_keys: &'k QuestCycleKeys,
    pub next_keys: &'k QuestCycleKeys,
    /// Rotation persisted last time; derived from `quests` when absent
    pub previous_selection: Option<&'k QuestRotationSelection>,
}

/// Outcome of [`reconcile_quest_board_on_cycle_change`]
#[derive(Debug, Clone)]
pub struct QuestReconcileResult<'a> {
    /// `Cow::Borrowed` of the input board when no tier changed
    pub quests: Cow<'a, [QuestInstance]>,
    pub selection: QuestRotationSelection,
    pub changed_types: Vec<QuestType>,
    pub auto_claimed: QuestAutoClaimSummary,
}

impl QuestReconcileResult<'_> {
    /// Whether the host has a new board to persist
    pub fn board_changed(&self) -> bool {
        matches!(self.quests, Cow::Owned(_))
    }
}

/// Sum the rewards of completed, unclaimed quests in the changed tiers
pub fn summarize_auto_claims(
    quests: &[QuestInstance],
    changed: &[QuestType],
    claim_bonus_gems: &ClaimBonusGems,
) -> QuestAutoClaimSummary {
    quests
        .iter()
        .filter(|quest| changed.contains(&quest.quest_type) && quest.is_claimable())
        .fold(QuestAutoClaimSummary::default(), |mut summary, quest| {
            summary.claimed_count += 1;
            summary.total_reward_xp = summary.total_reward_xp.saturating_add(quest.reward_xp);
            summary.total_reward_gems = summary
                .total_reward_gems
                .saturating_add(claim_bonus_gems.for_type(quest.quest_type));
            summary
        })
}

/// Reconcile the board after the host noticed new cycle keys.
///
/// Tiers whose key is unchanged are carried over as they are; changed daily
/// and weekly tiers are re-rotated away from the previous selection and a
/// changed monthly tier is regenerated. Auto-claimed quests are only
/// reported, not marked claimed, since they are dropped from the board.
pub fn reconcile_quest_board_on_cycle_change<'a>(
    change: CycleChange<'a, '_>,
    catalog: &QuestCatalog,
    claim_bonus_gems: &ClaimBonusGems,
    random: &mut dyn RandomSource,
) -> QuestReconcileResult<'a> {
    let changed = changed_types(change.prev_keys, change.next_keys);
    let current_selection = QuestRotationSelection::from_quests(change.quests);

    if changed.is_empty() {
        return QuestReconcileResult {
            quests: Cow::Borrowed(change.quests),
            selection: current_selection,
            changed_types: changed,
            auto_claimed: QuestAutoClaimSummary::default(),
        };
    }

    let auto_claimed = summarize_auto_claims(change.quests, &changed, claim_bonus_gems);
    let previous_selection = change
        .previous_selection
        .unwrap_or(&current_selection)
        .normalize();

    let carried = |quest_type: QuestType| -> Vec<QuestInstance> {
        change
            .quests
            .iter()
            .filter(|quest| quest.quest_type == quest_type)
            .cloned()
            .collect()
    };

    let mut next_tier = |quest_type: QuestType| -> Vec<QuestInstance> {
        if !changed.contains(&quest_type) {
            return carried(quest_type);
        }
        let cycle_key = change.next_keys.key_for(quest_type);
        match quest_type {
            QuestType::Monthly => {
                create_monthly_fixed_quest_instances(catalog.templates(QuestType::Monthly), cycle_key)
            }
            _ => roll_tier(
                catalog,
                quest_type,
                previous_selection.for_type(quest_type),
                cycle_key,
                random,
            ),
        }
    };

    let monthly = next_tier(QuestType::Monthly);
    let daily = next_tier(QuestType::Daily);
    let weekly = next_tier(QuestType::Weekly);

    let selection = QuestRotationSelection {
        daily: daily.iter().map(|quest| quest.template_id.clone()).collect(),
        weekly: weekly.iter().map(|quest| quest.template_id.clone()).collect(),
    };

    let mut quests = monthly;
    quests.extend(daily);
    quests.extend(weekly);

    info!(
        "Quest cycle changed ({}): rebuilt board with {} quests",
        changed.iter().map(QuestType::as_str).collect::<Vec<_>>().join(", "),
        quests.len()
    );
    if !auto_claimed.is_empty() {
        debug!(
            "Auto-claimed {} quests for {} XP and {} gems",
            auto_claimed.claimed_count, auto_claimed.total_reward_xp, auto_claimed.total_reward_gems
        );
    }

    QuestReconcileResult {
        quests: Cow::Owned(quests),
        selection,
        changed_types: changed,
        auto_claimed,
    }
}
