//! Quest Cycle Keys
//!
//! Maps a point in time to the daily, weekly and monthly period it belongs
//! to. Two timestamps share a period exactly when their keys are equal.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::definition::QuestType;

/// Period identity for each tier, e.g. `2026-03-10`, `2026-W11`, `2026-03`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestCycleKeys {
    pub daily: String,
    pub weekly: String,
    pub monthly: String,
}

impl QuestCycleKeys {
    pub fn key_for(&self, quest_type: QuestType) -> &str {
        match quest_type {
            QuestType::Daily => &self.daily,
            QuestType::Weekly => &self.weekly,
            QuestType::Monthly => &self.monthly,
        }
    }
}

/// Keys for a calendar date. Weeks follow ISO-8601: they start on Monday and
/// belong to the year that contains their Thursday.
pub fn cycle_keys_for_date(date: NaiveDate) -> QuestCycleKeys {
    let week = date.iso_week();
    QuestCycleKeys {
        daily: format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day()),
        weekly: format!("{:04}-W{:02}", week.year(), week.week()),
        monthly: format!("{:04}-{:02}", date.year(), date.month()),
    }
}

/// Keys for `now`, read in `now`'s own time zone (pass `Local::now()` for device-local periods)
pub fn get_cycle_keys<Tz: TimeZone>(now: &DateTime<Tz>) -> QuestCycleKeys {
    cycle_keys_for_date(now.date_naive())
}

/// Tiers whose period differs between two key sets, in daily, weekly, monthly order
pub fn changed_types(prev: &QuestCycleKeys, next: &QuestCycleKeys) -> Vec<QuestType> {
    QuestType::ALL
        .into_iter()
        .filter(|quest_type| prev.key_for(*quest_type) != next.key_for(*quest_type))
        .collect()
}
