//! Quest Event Types
//!
//! Gameplay events forwarded by the lesson pipeline, and how they advance
//! the board.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::progress::{
    apply_quest_metric_progress, get_lesson_completion_quest_increments, get_streak_quest_increment,
    QuestIncrement,
};
use super::state::QuestInstance;

/// Events that can trigger quest progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestEvent {
    /// Player finished a lesson
    LessonCompleted {
        #[serde(default)]
        lesson_id: Option<String>,
    },

    /// Player answered correctly and the streak counter moved to `next_streak`
    AnswerStreak {
        next_streak: i64,
    },
}

impl QuestEvent {
    /// Get event type as string (for logging/debugging)
    pub fn event_type(&self) -> &'static str {
        match self {
            QuestEvent::LessonCompleted { .. } => "lesson_completed",
            QuestEvent::AnswerStreak { .. } => "answer_streak",
        }
    }

    /// Metric increments this event produces
    pub fn increments(&self) -> Vec<QuestIncrement> {
        match self {
            QuestEvent::LessonCompleted { .. } => get_lesson_completion_quest_increments(),
            QuestEvent::AnswerStreak { next_streak } => {
                get_streak_quest_increment(*next_streak).into_iter().collect()
            }
        }
    }
}

/// Apply every increment of `event` to the board.
///
/// Returns `Cow::Borrowed(quests)` when the event produced no increment.
pub fn apply_quest_event<'a>(quests: &'a [QuestInstance], event: &QuestEvent) -> Cow<'a, [QuestInstance]> {
    let mut updated: Option<Vec<QuestInstance>> = None;

    for increment in event.increments() {
        let current = updated.as_deref().unwrap_or(quests);
        let next = match apply_quest_metric_progress(current, increment.metric, i64::from(increment.step)) {
            Cow::Owned(next) => Some(next),
            Cow::Borrowed(_) => None,
        };
        if next.is_some() {
            updated = next;
        }
    }

    match updated {
        Some(quests) => Cow::Owned(quests),
        None => Cow::Borrowed(quests),
    }
}
