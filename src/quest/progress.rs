//! Quest Progress Rules
//!
//! Applies metric increments to a board and translates gameplay milestones
//! into increments.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::definition::QuestMetric;
use super::state::QuestInstance;

/// Correct answers in a row that make one streak milestone
pub const STREAK_MILESTONE_INTERVAL: i64 = 5;

/// One step of progress for every quest tracking `metric`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestIncrement {
    pub metric: QuestMetric,
    pub step: u32,
}

fn clamp_step(step: i64) -> u32 {
    u32::try_from(step.max(0)).unwrap_or(u32::MAX)
}

/// Advance every instance tracking `metric` by `step`, capped at `need`.
///
/// Negative steps count as zero. Returns `Cow::Borrowed(quests)` whenever no
/// instance would change (zero step, no instance tracks `metric`, or all of
/// them are already complete) so callers can skip persisting.
pub fn apply_quest_metric_progress(
    quests: &[QuestInstance],
    metric: QuestMetric,
    step: i64,
) -> Cow<'_, [QuestInstance]> {
    let step = clamp_step(step);
    let advances = |quest: &QuestInstance| quest.metric == Some(metric) && quest.progress < quest.need;
    if step == 0 || !quests.iter().any(advances) {
        return Cow::Borrowed(quests);
    }

    Cow::Owned(
        quests
            .iter()
            .map(|quest| {
                if quest.metric == Some(metric) {
                    quest.with_progress_added(step)
                } else {
                    quest.clone()
                }
            })
            .collect(),
    )
}

/// Advance a single instance by id, for quests the host completes itself
/// (minigame results and other goals without a metric).
///
/// Same clamping as [`apply_quest_metric_progress`]; borrowed when the id is
/// unknown, the step is zero or the quest is already complete.
pub fn increment_quest_progress<'a>(
    quests: &'a [QuestInstance],
    quest_id: &str,
    step: i64,
) -> Cow<'a, [QuestInstance]> {
    let step = clamp_step(step);
    let Some(index) = quests.iter().position(|quest| quest.id == quest_id) else {
        return Cow::Borrowed(quests);
    };
    if step == 0 || quests[index].is_completed() {
        return Cow::Borrowed(quests);
    }

    let mut next = quests.to_vec();
    next[index] = quests[index].with_progress_added(step);
    Cow::Owned(next)
}

/// Increment for a correct-answer streak that just reached `next_streak`
pub fn get_streak_quest_increment(next_streak: i64) -> Option<QuestIncrement> {
    if next_streak > 0 && next_streak % STREAK_MILESTONE_INTERVAL == 0 {
        Some(QuestIncrement {
            metric: QuestMetric::Streak5Milestone,
            step: 1,
        })
    } else {
        None
    }
}

/// Every finished lesson counts once, whatever its content
pub fn get_lesson_completion_quest_increments() -> Vec<QuestIncrement> {
    vec![QuestIncrement {
        metric: QuestMetric::LessonComplete,
        step: 1,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::catalog::{create_quest_instance_from_template, QuestCatalog};
    use crate::quest::definition::QuestType;

    fn board() -> Vec<QuestInstance> {
        let catalog = QuestCatalog::builtin();
        let mut quests = catalog.monthly_instances("2026-03");
        for id in ["qd_lessons_3", "qd_streak5_1"] {
            quests.push(create_quest_instance_from_template(catalog.get(id).unwrap(), "2026-03-10"));
        }
        quests
    }

    #[test]
    fn test_zero_step_borrows_input() {
        let quests = board();
        assert!(matches!(
            apply_quest_metric_progress(&quests, QuestMetric::LessonComplete, 0),
            Cow::Borrowed(_)
        ));
        assert!(matches!(
            apply_quest_metric_progress(&quests, QuestMetric::LessonComplete, -4),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_only_matching_metric_advances() {
        let quests = board();
        let next = apply_quest_metric_progress(&quests, QuestMetric::LessonComplete, 1);

        for (before, after) in quests.iter().zip(next.iter()) {
            if before.metric == Some(QuestMetric::LessonComplete) {
                assert_eq!(after.progress, 1);
            } else {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn test_progress_never_exceeds_need() {
        let quests = board();
        let next = apply_quest_metric_progress(&quests, QuestMetric::LessonComplete, 1000);
        let next = apply_quest_metric_progress(&next, QuestMetric::LessonComplete, i64::MAX);
        for quest in next.iter() {
            assert!(quest.progress <= quest.need);
        }

        let daily = next.iter().find(|q| q.template_id == "qd_lessons_3").unwrap();
        assert_eq!(daily.quest_type, QuestType::Daily);
        assert_eq!(daily.progress, 3);
    }

    #[test]
    fn test_unmatched_or_complete_board_is_borrowed() {
        let quests = board();
        // Only the daily streak quest tracks streaks
        let next = apply_quest_metric_progress(&quests, QuestMetric::Streak5Milestone, 1);
        assert!(matches!(next, Cow::Owned(_)));
        let capped = apply_quest_metric_progress(&next, QuestMetric::Streak5Milestone, 1);
        assert!(matches!(capped, Cow::Borrowed(_)));

        let lessons_only: Vec<_> = quests
            .iter()
            .filter(|q| q.metric != Some(QuestMetric::Streak5Milestone))
            .cloned()
            .collect();
        assert!(matches!(
            apply_quest_metric_progress(&lessons_only, QuestMetric::Streak5Milestone, 1),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn test_increment_quest_by_id() {
        let quests = board();
        let next = increment_quest_progress(&quests, "q_monthly_echoSteps", 2);
        let echo = next.iter().find(|q| q.id == "q_monthly_echoSteps").unwrap();
        assert_eq!(echo.progress, 2);
        assert_eq!(echo.metric, None);
        // Other instances are untouched
        for (before, after) in quests.iter().zip(next.iter()).filter(|(q, _)| q.id != "q_monthly_echoSteps") {
            assert_eq!(before, after);
        }

        let next = increment_quest_progress(&next, "q_monthly_echoSteps", 50);
        let echo = next.iter().find(|q| q.id == "q_monthly_echoSteps").unwrap();
        assert_eq!(echo.progress, echo.need);
        assert!(matches!(increment_quest_progress(&next, "q_monthly_echoSteps", 1), Cow::Borrowed(_)));
    }

    #[test]
    fn test_increment_quest_ignores_unknown_id_and_empty_step() {
        let quests = board();
        assert!(matches!(increment_quest_progress(&quests, "missing", 1), Cow::Borrowed(_)));
        assert!(matches!(increment_quest_progress(&quests, "q_monthly_balance", 0), Cow::Borrowed(_)));
        assert!(matches!(increment_quest_progress(&quests, "q_monthly_balance", -3), Cow::Borrowed(_)));
    }

    #[test]
    fn test_streak_increment() {
        assert_eq!(get_streak_quest_increment(4), None);
        assert_eq!(get_streak_quest_increment(0), None);
        assert_eq!(get_streak_quest_increment(-5), None);
        let expected = Some(QuestIncrement {
            metric: QuestMetric::Streak5Milestone,
            step: 1,
        });
        assert_eq!(get_streak_quest_increment(5), expected);
        assert_eq!(get_streak_quest_increment(10), expected);
        assert_eq!(get_streak_quest_increment(11), None);
    }

    #[test]
    fn test_lesson_completion_increments() {
        assert_eq!(
            get_lesson_completion_quest_increments(),
            vec![QuestIncrement {
                metric: QuestMetric::LessonComplete,
                step: 1,
            }]
        );
    }
}
