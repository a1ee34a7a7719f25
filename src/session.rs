//! Quest Board Session
//!
//! Glue between the pure quest core and the host: holds the current board,
//! reconciles it against the clock, applies gameplay events and player
//! actions, and persists through a [`QuestStateStore`] whenever the board
//! actually changed.

use std::borrow::Cow;

use chrono::{DateTime, TimeZone};
use tracing::{debug, info, warn};

use crate::config::{QuestBoardConfig, RerollConfig};
use crate::quest::{
    advance_chest_state, apply_quest_event, build_quest_board_for_cycles, claim_quest_instance, get_cycle_keys,
    increment_quest_progress, reconcile_quest_board_on_cycle_change, repair_quest_board, reroll_quest_instance,
    ClaimBonusGems, ClaimFailureReason, CycleChange, QuestAutoClaimSummary, QuestCatalog, QuestChestState,
    QuestClaim, QuestCycleKeys, QuestEvent, QuestInstance, QuestReconcileResult, QuestReroll,
    QuestRotationSelection, QuestType, RandomSource, RerollFailureReason,
};
use crate::store::{PersistedQuestState, QuestStateStore, RerollUsage, SCHEMA_VERSION};

/// What happened when the session caught up with the clock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSync {
    pub changed_types: Vec<QuestType>,
    /// Rewards the ledger must pay exactly once
    pub auto_claimed: QuestAutoClaimSummary,
    /// No saved state existed and a fresh board was built
    pub created: bool,
}

/// A reroll the host has to charge for
#[derive(Debug, Clone)]
pub struct RerollReceipt {
    pub reroll: QuestReroll,
    /// Gems the ledger deducts
    pub cost_gems: u32,
    /// Rerolls still allowed today
    pub rerolls_left: u32,
}

pub struct QuestBoardSession<S: QuestStateStore> {
    catalog: QuestCatalog,
    claim_bonus_gems: ClaimBonusGems,
    reroll_config: RerollConfig,
    store: S,
    state: PersistedQuestState,
}

impl<S: QuestStateStore> QuestBoardSession<S> {
    /// Load the saved board, or build one for `now` when nothing was saved,
    /// then reconcile any cycle boundaries crossed since the last run.
    ///
    /// A saved board with missing tiers is rebuilt for its stored periods
    /// before reconciling.
    pub fn open<Tz: TimeZone>(
        config: &QuestBoardConfig,
        catalog: QuestCatalog,
        mut store: S,
        now: &DateTime<Tz>,
        random: &mut dyn RandomSource,
    ) -> Result<(Self, CycleSync), String> {
        let claim_bonus_gems = config.claim_bonus_gems.clone();
        let reroll_config = config.reroll.clone();

        let Some(mut state) = store.load()? else {
            let cycle_keys = get_cycle_keys(now);
            let board = build_quest_board_for_cycles(&catalog, &cycle_keys, None, None, random);
            let state = PersistedQuestState::new(cycle_keys, board.quests, board.selection);
            store.save(&state)?;

            info!(
                "Created quest board for {} / {} / {}",
                state.cycle_keys.daily, state.cycle_keys.weekly, state.cycle_keys.monthly
            );

            let session = Self {
                catalog,
                claim_bonus_gems,
                reroll_config,
                store,
                state,
            };
            let sync = CycleSync {
                changed_types: QuestType::ALL.to_vec(),
                auto_claimed: QuestAutoClaimSummary::default(),
                created: true,
            };
            return Ok((session, sync));
        };

        if state.schema_version > SCHEMA_VERSION {
            warn!(
                "Quest state schema {} is newer than supported {}",
                state.schema_version, SCHEMA_VERSION
            );
        }

        let repaired = match repair_quest_board(&catalog, &state.cycle_keys, &state.quests, &state.selection, random) {
            Cow::Borrowed(_) => None,
            Cow::Owned(quests) => Some(quests),
        };
        if let Some(quests) = repaired {
            warn!(
                "Stored quest board had {} quests, rebuilt to {}",
                state.quests.len(),
                quests.len()
            );
            state.selection = QuestRotationSelection::from_quests(&quests);
            state.quests = quests;
            store.save(&state)?;
        }

        let mut session = Self {
            catalog,
            claim_bonus_gems,
            reroll_config,
            store,
            state,
        };
        let sync = session.sync_cycle(now, random)?;
        Ok((session, sync))
    }

    /// Reconcile the board against the cycle keys for `now`
    pub fn sync_cycle<Tz: TimeZone>(
        &mut self,
        now: &DateTime<Tz>,
        random: &mut dyn RandomSource,
    ) -> Result<CycleSync, String> {
        let next_keys = get_cycle_keys(now);
        let result = reconcile_quest_board_on_cycle_change(
            CycleChange {
                quests: &self.state.quests,
                prev_keys: &self.state.cycle_keys,
                next_keys: &next_keys,
                previous_selection: Some(&self.state.selection),
            },
            &self.catalog,
            &self.claim_bonus_gems,
            random,
        );

        let QuestReconcileResult {
            quests,
            selection,
            changed_types,
            auto_claimed,
        } = result;

        let quests = match quests {
            Cow::Borrowed(_) => None,
            Cow::Owned(quests) => Some(quests),
        };

        if let Some(quests) = quests {
            self.state.cycle_keys = next_keys;
            self.state.quests = quests;
            self.state.selection = selection;
            self.store.save(&self.state)?;

            if !auto_claimed.is_empty() {
                info!(
                    "Auto-claimed {} quests: +{} XP, +{} gems",
                    auto_claimed.claimed_count, auto_claimed.total_reward_xp, auto_claimed.total_reward_gems
                );
            }
        }

        Ok(CycleSync {
            changed_types,
            auto_claimed,
            created: false,
        })
    }

    /// Apply a gameplay event; returns whether it produced any progress
    pub fn record_event(&mut self, event: &QuestEvent) -> Result<bool, String> {
        let quests = match apply_quest_event(&self.state.quests, event) {
            Cow::Borrowed(_) => {
                debug!("Event {} left the quest board unchanged", event.event_type());
                return Ok(false);
            }
            Cow::Owned(quests) => quests,
        };

        self.state.quests = quests;
        self.store.save(&self.state)?;
        Ok(true)
    }

    /// Advance one quest by id, for quests no gameplay metric tracks.
    /// Returns whether the board changed.
    pub fn increment_quest(&mut self, quest_id: &str, step: i64) -> Result<bool, String> {
        let quests = match increment_quest_progress(&self.state.quests, quest_id, step) {
            Cow::Borrowed(_) => {
                debug!("Increment of {} by {} left the quest board unchanged", quest_id, step);
                return Ok(false);
            }
            Cow::Owned(quests) => quests,
        };

        self.state.quests = quests;
        self.store.save(&self.state)?;
        Ok(true)
    }

    /// Swap an unfinished daily or weekly quest.
    ///
    /// Refused when rerolls are disabled, the day's allowance is spent, or
    /// `gems_balance` is below the cost; `None` skips the balance check.
    /// The outer error is a storage failure; the inner one is a refused reroll.
    pub fn reroll(
        &mut self,
        quest_id: &str,
        gems_balance: Option<u32>,
        random: &mut dyn RandomSource,
    ) -> Result<Result<RerollReceipt, RerollFailureReason>, String> {
        if !self.reroll_config.enabled {
            return Ok(Err(RerollFailureReason::Disabled));
        }
        let Some(target) = self.state.quests.iter().find(|quest| quest.id == quest_id) else {
            return Ok(Err(RerollFailureReason::NoCandidate));
        };
        if !target.quest_type.is_rotating() {
            return Ok(Err(RerollFailureReason::InvalidType));
        }

        let limit = self.reroll_config.daily_limit();
        let cost_gems = self.reroll_config.cost_gems;
        let used = self.reroll_usage_today();
        if used >= limit {
            return Ok(Err(RerollFailureReason::LimitReached));
        }
        if gems_balance.is_some_and(|balance| balance < cost_gems) {
            return Ok(Err(RerollFailureReason::InsufficientGems));
        }

        let reroll = match reroll_quest_instance(&self.state.quests, quest_id, &self.catalog, random) {
            Ok(reroll) => reroll,
            Err(reason) => return Ok(Err(reason)),
        };

        // The rerolled template counts as used so the next period avoids it
        self.state.selection = QuestRotationSelection::from_quests(&reroll.quests);
        self.state.quests = reroll.quests.clone();
        self.state.reroll_usage = RerollUsage {
            date: Some(self.state.cycle_keys.daily.clone()),
            count: used + 1,
        };
        self.store.save(&self.state)?;

        info!(
            "Rerolled {} quest {} -> {} for {} gems",
            reroll.quest_type, reroll.old_template_id, reroll.new_template_id, cost_gems
        );
        Ok(Ok(RerollReceipt {
            reroll,
            cost_gems,
            rerolls_left: limit - (used + 1),
        }))
    }

    fn reroll_usage_today(&self) -> u32 {
        self.state.reroll_usage.used_on(&self.state.cycle_keys.daily)
    }

    /// Rerolls still allowed on the current day
    pub fn rerolls_left(&self) -> u32 {
        if !self.reroll_config.enabled {
            return 0;
        }
        self.reroll_config.daily_limit().saturating_sub(self.reroll_usage_today())
    }

    /// Claim a completed quest's reward
    pub fn claim(&mut self, quest_id: &str) -> Result<Result<QuestClaim, ClaimFailureReason>, String> {
        let claim = match claim_quest_instance(&self.state.quests, quest_id, &self.claim_bonus_gems) {
            Ok(claim) => claim,
            Err(reason) => return Ok(Err(reason)),
        };

        self.state.quests = claim.quests.clone();
        self.store.save(&self.state)?;

        info!(
            "Claimed quest {} for {} XP, {} gems",
            claim.quest_id, claim.reward_xp, claim.reward_gems
        );
        Ok(Ok(claim))
    }

    /// Advance a quest's chest one step; `None` when there was nothing to advance
    pub fn advance_chest(&mut self, quest_id: &str) -> Result<Option<QuestChestState>, String> {
        let Some(quests) = advance_chest_state(&self.state.quests, quest_id) else {
            return Ok(None);
        };

        let chest_state = quests
            .iter()
            .find(|quest| quest.id == quest_id)
            .map(|quest| quest.chest_state);

        self.state.quests = quests;
        self.store.save(&self.state)?;
        Ok(chest_state)
    }

    pub fn quests(&self) -> &[QuestInstance] {
        &self.state.quests
    }

    pub fn selection(&self) -> &QuestRotationSelection {
        &self.state.selection
    }

    pub fn cycle_keys(&self) -> &QuestCycleKeys {
        &self.state.cycle_keys
    }

    pub fn catalog(&self) -> &QuestCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
