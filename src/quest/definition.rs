//! Quest Definition Structures
//!
//! Quest templates are static catalog entries. Built-in tables live in
//! `catalog`; custom catalogs are deserialized from TOML into the raw
//! structures below and resolved into [`QuestTemplate`]s.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw catalog file as it appears in TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCatalogFile {
    /// Optional override of how many daily/weekly quests are active at once
    #[serde(default)]
    pub rotation: Option<RawRotation>,
    #[serde(default)]
    pub daily: Vec<RawQuestTemplate>,
    #[serde(default)]
    pub weekly: Vec<RawQuestTemplate>,
    #[serde(default)]
    pub monthly: Vec<RawQuestTemplate>,
}

/// Rotation sizes as they appear in TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRotation {
    pub daily: Option<usize>,
    pub weekly: Option<usize>,
}

/// Raw template as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestTemplate {
    pub id: String,
    /// Metric name, omitted for quests the host completes by hand
    pub metric: Option<String>,
    #[serde(default = "default_need")]
    pub need: i64,
    #[serde(default)]
    pub reward_xp: i64,
    pub title: String,
    pub title_key: Option<String>,
}

fn default_need() -> i64 {
    1
}

// ============================================================================
// Resolved Template Structures
// ============================================================================

/// Reset granularity of a quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestType {
    Daily,
    Weekly,
    Monthly,
}

impl QuestType {
    /// All tiers in reconciliation order
    pub const ALL: [QuestType; 3] = [QuestType::Daily, QuestType::Weekly, QuestType::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestType::Daily => "daily",
            QuestType::Weekly => "weekly",
            QuestType::Monthly => "monthly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "daily" => Some(QuestType::Daily),
            "weekly" => Some(QuestType::Weekly),
            "monthly" => Some(QuestType::Monthly),
            _ => None,
        }
    }

    /// Daily and weekly tiers rotate through a template pool; monthly is a fixed set
    pub fn is_rotating(&self) -> bool {
        !matches!(self, QuestType::Monthly)
    }
}

impl fmt::Display for QuestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gameplay metrics that advance quests automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestMetric {
    /// One lesson finished
    #[serde(rename = "lesson_complete")]
    LessonComplete,
    /// Correct-answer streak reached a multiple of 5
    #[serde(rename = "streak5_milestone")]
    Streak5Milestone,
}

impl QuestMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestMetric::LessonComplete => "lesson_complete",
            QuestMetric::Streak5Milestone => "streak5_milestone",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lesson_complete" | "lesson" => Some(QuestMetric::LessonComplete),
            "streak5_milestone" | "streak5" | "streak" => Some(QuestMetric::Streak5Milestone),
            _ => None,
        }
    }
}

/// A static, reusable quest definition
///
/// Built-in templates borrow `'static` strings; templates loaded from TOML own theirs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestTemplate {
    pub template_id: Cow<'static, str>,
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    pub metric: Option<QuestMetric>,
    /// Progress required to complete, always > 0
    pub need: u32,
    pub reward_xp: u32,
    /// Fallback display title
    pub title: Cow<'static, str>,
    /// Localization key for the title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_key: Option<Cow<'static, str>>,
}

impl QuestTemplate {
    /// Const constructor for the built-in tables
    pub const fn builtin(
        quest_type: QuestType,
        template_id: &'static str,
        metric: Option<QuestMetric>,
        need: u32,
        reward_xp: u32,
        title: &'static str,
        title_key: Option<&'static str>,
    ) -> Self {
        Self {
            template_id: Cow::Borrowed(template_id),
            quest_type,
            metric,
            need,
            reward_xp,
            title: Cow::Borrowed(title),
            title_key: match title_key {
                Some(key) => Some(Cow::Borrowed(key)),
                None => None,
            },
        }
    }

    /// Create a template from raw TOML data; the tier comes from the table it was listed in
    pub fn from_raw(raw: &RawQuestTemplate, quest_type: QuestType) -> Result<Self, String> {
        if raw.id.trim().is_empty() {
            return Err(format!("{} quest template has an empty id", quest_type));
        }

        let metric = match raw.metric.as_deref() {
            Some(name) => Some(
                QuestMetric::from_str(name)
                    .ok_or_else(|| format!("Invalid metric '{}' in quest template '{}'", name, raw.id))?,
            ),
            None => None,
        };

        let need = u32::try_from(raw.need)
            .ok()
            .filter(|need| *need > 0)
            .ok_or_else(|| format!("Quest template '{}' needs a positive 'need', got {}", raw.id, raw.need))?;

        let reward_xp = u32::try_from(raw.reward_xp)
            .map_err(|_| format!("Quest template '{}' has invalid reward_xp {}", raw.id, raw.reward_xp))?;

        Ok(Self {
            template_id: Cow::Owned(raw.id.clone()),
            quest_type,
            metric,
            need,
            reward_xp,
            title: Cow::Owned(raw.title.clone()),
            title_key: raw.title_key.clone().map(Cow::Owned),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, metric: Option<&str>, need: i64) -> RawQuestTemplate {
        RawQuestTemplate {
            id: id.to_string(),
            metric: metric.map(str::to_string),
            need,
            reward_xp: 10,
            title: "Test".to_string(),
            title_key: None,
        }
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!(QuestMetric::from_str("lesson_complete"), Some(QuestMetric::LessonComplete));
        assert_eq!(QuestMetric::from_str("streak5_milestone"), Some(QuestMetric::Streak5Milestone));
        assert_eq!(QuestMetric::from_str("Streak5"), Some(QuestMetric::Streak5Milestone));
        assert_eq!(QuestMetric::from_str("journal_submit"), None);
    }

    #[test]
    fn test_quest_type_serde_names() {
        assert_eq!(serde_json::to_string(&QuestType::Weekly).unwrap(), "\"weekly\"");
        assert_eq!(
            serde_json::to_string(&QuestMetric::Streak5Milestone).unwrap(),
            "\"streak5_milestone\""
        );
        assert_eq!(QuestType::from_str("MONTHLY"), Some(QuestType::Monthly));
        assert!(!QuestType::Monthly.is_rotating());
    }

    #[test]
    fn test_template_from_raw() {
        let template = QuestTemplate::from_raw(&raw("qd_custom", Some("lesson"), 4), QuestType::Daily).unwrap();
        assert_eq!(template.template_id, "qd_custom");
        assert_eq!(template.quest_type, QuestType::Daily);
        assert_eq!(template.metric, Some(QuestMetric::LessonComplete));
        assert_eq!(template.need, 4);

        let manual = QuestTemplate::from_raw(&raw("qm_manual", None, 3), QuestType::Monthly).unwrap();
        assert_eq!(manual.metric, None);
    }

    #[test]
    fn test_template_from_raw_rejects_bad_values() {
        assert!(QuestTemplate::from_raw(&raw("zero", None, 0), QuestType::Daily).is_err());
        assert!(QuestTemplate::from_raw(&raw("negative", None, -2), QuestType::Daily).is_err());
        assert!(QuestTemplate::from_raw(&raw("bad_metric", Some("journal"), 1), QuestType::Daily).is_err());
        assert!(QuestTemplate::from_raw(&raw("  ", None, 1), QuestType::Daily).is_err());
    }
}
