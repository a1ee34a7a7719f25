//! Quest Instance State
//!
//! A quest instance is a period-stamped copy of a template that tracks
//! progress, claim status and the reward chest shown by the host.

use serde::{Deserialize, Serialize};

use super::definition::{QuestMetric, QuestType};

/// Reward chest animation state, advanced by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestChestState {
    #[default]
    Closed,
    Opening,
    Opened,
}

impl QuestChestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestChestState::Closed => "closed",
            QuestChestState::Opening => "opening",
            QuestChestState::Opened => "opened",
        }
    }

    /// The following state, if any. Chests never move backwards.
    pub fn next(&self) -> Option<Self> {
        match self {
            QuestChestState::Closed => Some(QuestChestState::Opening),
            QuestChestState::Opening => Some(QuestChestState::Opened),
            QuestChestState::Opened => None,
        }
    }
}

/// A concrete quest on the board
///
/// `id` is the bare template id for monthly quests and
/// `{template_id}__{cycle_key}` for daily and weekly ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestInstance {
    pub id: String,
    pub template_id: String,
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    pub metric: Option<QuestMetric>,
    pub need: u32,
    pub progress: u32,
    pub reward_xp: u32,
    pub claimed: bool,
    #[serde(default)]
    pub chest_state: QuestChestState,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_key: Option<String>,
    pub cycle_key: String,
}

impl QuestInstance {
    /// Progress has reached the goal
    pub fn is_completed(&self) -> bool {
        self.progress >= self.need
    }

    /// Completed but the reward was never taken
    pub fn is_claimable(&self) -> bool {
        self.is_completed() && !self.claimed
    }

    pub fn remaining(&self) -> u32 {
        self.need.saturating_sub(self.progress)
    }

    pub fn progress_percent(&self) -> f32 {
        if self.need == 0 {
            return 1.0;
        }
        self.progress as f32 / self.need as f32
    }

    /// Copy with progress advanced by `step`, capped at `need`
    pub fn with_progress_added(&self, step: u32) -> Self {
        Self {
            progress: self.progress.saturating_add(step).min(self.need),
            ..self.clone()
        }
    }

    /// Restore the instance invariants on data read back from storage
    pub fn sanitized(mut self) -> Self {
        self.need = self.need.max(1);
        self.progress = self.progress.min(self.need);
        if self.claimed && !self.is_completed() {
            self.claimed = false;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(progress: u32, need: u32) -> QuestInstance {
        QuestInstance {
            id: "qd_lessons_3__2026-03-10".to_string(),
            template_id: "qd_lessons_3".to_string(),
            quest_type: QuestType::Daily,
            metric: Some(QuestMetric::LessonComplete),
            need,
            progress,
            reward_xp: 30,
            claimed: false,
            chest_state: QuestChestState::Closed,
            title: "Complete 3 lessons".to_string(),
            title_key: None,
            cycle_key: "2026-03-10".to_string(),
        }
    }

    #[test]
    fn test_chest_state_only_moves_forward() {
        assert_eq!(QuestChestState::Closed.next(), Some(QuestChestState::Opening));
        assert_eq!(QuestChestState::Opening.next(), Some(QuestChestState::Opened));
        assert_eq!(QuestChestState::Opened.next(), None);
    }

    #[test]
    fn test_progress_is_capped() {
        let quest = instance(2, 3);
        assert!(!quest.is_completed());
        assert_eq!(quest.remaining(), 1);

        let quest = quest.with_progress_added(5);
        assert_eq!(quest.progress, 3);
        assert!(quest.is_claimable());
        assert_eq!(quest.remaining(), 0);
    }

    #[test]
    fn test_sanitized_repairs_stored_values() {
        let mut quest = instance(9, 3);
        quest.claimed = true;
        let quest = quest.sanitized();
        assert_eq!(quest.progress, 3);
        assert!(quest.claimed);

        let mut quest = instance(1, 3);
        quest.claimed = true;
        let quest = quest.sanitized();
        assert!(!quest.claimed);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(instance(1, 3)).unwrap();
        assert_eq!(json["templateId"], "qd_lessons_3");
        assert_eq!(json["type"], "daily");
        assert_eq!(json["metric"], "lesson_complete");
        assert_eq!(json["chestState"], "closed");
        assert_eq!(json["cycleKey"], "2026-03-10");
        assert!(json.get("titleKey").is_none());
    }
}
