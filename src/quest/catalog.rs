//! Quest Catalog
//!
//! Built-in template tables, optional TOML catalogs, and the constructors
//! that stamp templates into board instances.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{info, warn};

use super::definition::{QuestMetric, QuestTemplate, QuestType, RawCatalogFile, RawQuestTemplate};
use super::state::{QuestChestState, QuestInstance};

/// Daily quests active at once
pub const DAILY_ROTATION_COUNT: usize = 3;
/// Weekly quests active at once
pub const WEEKLY_ROTATION_COUNT: usize = 2;

pub const DAILY_QUEST_TEMPLATES: &[QuestTemplate] = &[
    QuestTemplate::builtin(
        QuestType::Daily,
        "qd_lessons_2",
        Some(QuestMetric::LessonComplete),
        2,
        20,
        "Complete 2 lessons",
        Some("quests.templates.daily.lessons2"),
    ),
    QuestTemplate::builtin(
        QuestType::Daily,
        "qd_lessons_3",
        Some(QuestMetric::LessonComplete),
        3,
        30,
        "Complete 3 lessons",
        Some("quests.templates.daily.lessons3"),
    ),
    QuestTemplate::builtin(
        QuestType::Daily,
        "qd_lessons_5",
        Some(QuestMetric::LessonComplete),
        5,
        45,
        "Complete 5 lessons",
        Some("quests.templates.daily.lessons5"),
    ),
    QuestTemplate::builtin(
        QuestType::Daily,
        "qd_streak5_1",
        Some(QuestMetric::Streak5Milestone),
        1,
        25,
        "Answer 5 in a row correctly once",
        Some("quests.templates.daily.streak5x1"),
    ),
    QuestTemplate::builtin(
        QuestType::Daily,
        "qd_streak5_2",
        Some(QuestMetric::Streak5Milestone),
        2,
        40,
        "Answer 5 in a row correctly twice",
        Some("quests.templates.daily.streak5x2"),
    ),
];

pub const WEEKLY_QUEST_TEMPLATES: &[QuestTemplate] = &[
    QuestTemplate::builtin(
        QuestType::Weekly,
        "qw_lessons_8",
        Some(QuestMetric::LessonComplete),
        8,
        80,
        "Complete 8 lessons this week",
        Some("quests.templates.weekly.lessons8"),
    ),
    QuestTemplate::builtin(
        QuestType::Weekly,
        "qw_lessons_10",
        Some(QuestMetric::LessonComplete),
        10,
        100,
        "Complete 10 lessons this week",
        Some("quests.templates.weekly.lessons10"),
    ),
    QuestTemplate::builtin(
        QuestType::Weekly,
        "qw_lessons_15",
        Some(QuestMetric::LessonComplete),
        15,
        130,
        "Complete 15 lessons this week",
        Some("quests.templates.weekly.lessons15"),
    ),
    QuestTemplate::builtin(
        QuestType::Weekly,
        "qw_streak5_5",
        Some(QuestMetric::Streak5Milestone),
        5,
        120,
        "Answer 5 in a row correctly 5 times",
        Some("quests.templates.weekly.streak5x5"),
    ),
];

/// Monthly quests are always all active; minigame quests carry no metric
pub const MONTHLY_FIXED_QUEST_TEMPLATES: &[QuestTemplate] = &[
    QuestTemplate::builtin(
        QuestType::Monthly,
        "q_monthly_50pts",
        Some(QuestMetric::LessonComplete),
        50,
        150,
        "Complete 50 lessons this month",
        None,
    ),
    QuestTemplate::builtin(
        QuestType::Monthly,
        "q_monthly_breathTempo",
        None,
        60,
        120,
        "Reach 60 seconds in the breathing game",
        None,
    ),
    QuestTemplate::builtin(
        QuestType::Monthly,
        "q_monthly_echoSteps",
        None,
        3,
        100,
        "Clear Echo Steps 3 times",
        None,
    ),
    QuestTemplate::builtin(
        QuestType::Monthly,
        "q_monthly_balance",
        None,
        5,
        110,
        "Clear the balance game 5 times",
        None,
    ),
    QuestTemplate::builtin(
        QuestType::Monthly,
        "q_monthly_budget",
        None,
        3,
        150,
        "Get a perfect score in the budget game",
        None,
    ),
];

/// Stamp a template into a fresh instance for the given period
pub fn create_quest_instance_from_template(template: &QuestTemplate, cycle_key: &str) -> QuestInstance {
    QuestInstance {
        id: format!("{}__{}", template.template_id, cycle_key),
        template_id: template.template_id.to_string(),
        quest_type: template.quest_type,
        metric: template.metric,
        need: template.need,
        progress: 0,
        reward_xp: template.reward_xp,
        claimed: false,
        chest_state: QuestChestState::Closed,
        title: template.title.to_string(),
        title_key: template.title_key.as_ref().map(|key| key.to_string()),
        cycle_key: cycle_key.to_string(),
    }
}

/// Instances for every fixed monthly template. The id is the bare template id
/// so a month change replaces the slot instead of adding history.
pub fn create_monthly_fixed_quest_instances(templates: &[QuestTemplate], cycle_key: &str) -> Vec<QuestInstance> {
    templates
        .iter()
        .map(|template| QuestInstance {
            id: template.template_id.to_string(),
            ..create_quest_instance_from_template(template, cycle_key)
        })
        .collect()
}

/// Fresh monthly instances that keep the progress, claim and chest state of
/// matching stored instances (matched by template id, then by id)
pub fn migrate_monthly_quests(
    templates: &[QuestTemplate],
    stored: &[QuestInstance],
    cycle_key: &str,
) -> Vec<QuestInstance> {
    let previous: HashMap<&str, &QuestInstance> = stored
        .iter()
        .filter(|quest| quest.quest_type == QuestType::Monthly)
        .flat_map(|quest| [(quest.template_id.as_str(), quest), (quest.id.as_str(), quest)])
        .collect();

    create_monthly_fixed_quest_instances(templates, cycle_key)
        .into_iter()
        .map(|quest| {
            let matched = previous
                .get(quest.template_id.as_str())
                .or_else(|| previous.get(quest.id.as_str()));
            match matched {
                Some(old) => QuestInstance {
                    progress: old.progress,
                    claimed: old.claimed,
                    chest_state: old.chest_state,
                    ..quest
                }
                .sanitized(),
                None => quest,
            }
        })
        .collect()
}

/// The template tables and rotation sizes a board is built from
#[derive(Debug, Clone, PartialEq)]
pub struct QuestCatalog {
    daily: Vec<QuestTemplate>,
    weekly: Vec<QuestTemplate>,
    monthly: Vec<QuestTemplate>,
    daily_rotation_count: usize,
    weekly_rotation_count: usize,
}

impl QuestCatalog {
    /// The catalog shipped with the app
    pub fn builtin() -> Self {
        Self {
            daily: DAILY_QUEST_TEMPLATES.to_vec(),
            weekly: WEEKLY_QUEST_TEMPLATES.to_vec(),
            monthly: MONTHLY_FIXED_QUEST_TEMPLATES.to_vec(),
            daily_rotation_count: DAILY_ROTATION_COUNT,
            weekly_rotation_count: WEEKLY_ROTATION_COUNT,
        }
    }

    /// Build a catalog from explicit tables with the default rotation sizes
    pub fn new(
        daily: Vec<QuestTemplate>,
        weekly: Vec<QuestTemplate>,
        monthly: Vec<QuestTemplate>,
    ) -> Result<Self, String> {
        let catalog = Self {
            daily,
            weekly,
            monthly,
            daily_rotation_count: DAILY_ROTATION_COUNT,
            weekly_rotation_count: WEEKLY_ROTATION_COUNT,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn with_rotation_counts(mut self, daily: usize, weekly: usize) -> Self {
        self.daily_rotation_count = daily;
        self.weekly_rotation_count = weekly;
        self
    }

    /// Parse a catalog from TOML content
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        let raw: RawCatalogFile = toml::from_str(content)
            .map_err(|e| format!("Failed to parse quest catalog: {}", e))?;

        let resolve = |templates: &[RawQuestTemplate], quest_type: QuestType| {
            templates
                .iter()
                .map(|t| QuestTemplate::from_raw(t, quest_type))
                .collect::<Result<Vec<_>, _>>()
        };

        let mut catalog = Self::new(
            resolve(&raw.daily, QuestType::Daily)?,
            resolve(&raw.weekly, QuestType::Weekly)?,
            resolve(&raw.monthly, QuestType::Monthly)?,
        )?;

        if let Some(rotation) = raw.rotation {
            catalog.daily_rotation_count = rotation.daily.unwrap_or(DAILY_ROTATION_COUNT);
            catalog.weekly_rotation_count = rotation.weekly.unwrap_or(WEEKLY_ROTATION_COUNT);
        }

        for quest_type in [QuestType::Daily, QuestType::Weekly] {
            let pool = catalog.templates(quest_type).len();
            let count = catalog.rotation_count(quest_type);
            if count > pool {
                warn!(
                    "{} rotation count {} exceeds pool of {} templates, boards will hold {}",
                    quest_type, count, pool, pool
                );
            }
        }

        Ok(catalog)
    }

    /// Load a catalog from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;

        let catalog = Self::from_toml_str(&content)
            .map_err(|e| format!("{:?}: {}", path, e))?;

        info!(
            "Loaded quest catalog from {:?}: {} daily, {} weekly, {} monthly templates",
            path,
            catalog.daily.len(),
            catalog.weekly.len(),
            catalog.monthly.len()
        );

        Ok(catalog)
    }

    /// Check template ids are unique and every template sits in its own tier's table
    fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();

        for quest_type in QuestType::ALL {
            for template in self.templates(quest_type) {
                if template.quest_type != quest_type {
                    return Err(format!(
                        "Quest template '{}' is {} but listed in the {} table",
                        template.template_id, template.quest_type, quest_type
                    ));
                }
                if template.need == 0 {
                    return Err(format!("Quest template '{}' has need 0", template.template_id));
                }
                if !seen.insert(&*template.template_id) {
                    return Err(format!("Duplicate quest template id '{}'", template.template_id));
                }
            }
        }

        Ok(())
    }

    /// Templates of one tier
    pub fn templates(&self, quest_type: QuestType) -> &[QuestTemplate] {
        match quest_type {
            QuestType::Daily => &self.daily,
            QuestType::Weekly => &self.weekly,
            QuestType::Monthly => &self.monthly,
        }
    }

    /// How many instances of a tier a board holds; monthly uses the whole set
    pub fn rotation_count(&self, quest_type: QuestType) -> usize {
        match quest_type {
            QuestType::Daily => self.daily_rotation_count,
            QuestType::Weekly => self.weekly_rotation_count,
            QuestType::Monthly => self.monthly.len(),
        }
    }

    /// Get a template by id
    pub fn get(&self, template_id: &str) -> Option<&QuestTemplate> {
        QuestType::ALL
            .into_iter()
            .flat_map(|quest_type| self.templates(quest_type))
            .find(|template| template.template_id == template_id)
    }

    /// Fresh monthly instances for a period
    pub fn monthly_instances(&self, cycle_key: &str) -> Vec<QuestInstance> {
        create_monthly_fixed_quest_instances(&self.monthly, cycle_key)
    }

    /// Total number of templates
    pub fn len(&self) -> usize {
        self.daily.len() + self.weekly.len() + self.monthly.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QuestCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
