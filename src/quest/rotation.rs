//! Quest Rotation
//!
//! Picks which daily and weekly templates are active for a period, steering
//! away from the templates used in the period before.

use std::borrow::Cow;
use std::collections::HashSet;

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::catalog::{
    create_monthly_fixed_quest_instances, create_quest_instance_from_template, migrate_monthly_quests, QuestCatalog,
};
use super::cycle::QuestCycleKeys;
use super::definition::{QuestTemplate, QuestType};
use super::state::QuestInstance;

/// Source of uniform values in `[0, 1)`
///
/// Implemented for closures so tests can feed fixed sequences.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl<F: FnMut() -> f64> RandomSource for F {
    fn next_f64(&mut self) -> f64 {
        self()
    }
}

/// Adapter from any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl RngSource<ThreadRng> {
    pub fn thread() -> Self {
        Self(rand::thread_rng())
    }
}

impl RngSource<StdRng> {
    /// Reproducible sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_f64(&mut self) -> f64 {
        self.0.gen_range(0.0..1.0)
    }
}

/// Index in `0..len` from one random draw, clamped so out-of-range values stay valid
pub(crate) fn pick_index(random: &mut dyn RandomSource, len: usize) -> usize {
    debug_assert!(len > 0);
    let scaled = (random.next_f64() * len as f64).floor();
    // `as` saturates: NaN and negatives become 0
    (scaled as usize).min(len.saturating_sub(1))
}

/// Template ids chosen for the current period, kept so the next period can avoid them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestRotationSelection {
    #[serde(default)]
    pub daily: Vec<String>,
    #[serde(default)]
    pub weekly: Vec<String>,
}

impl QuestRotationSelection {
    /// Selection held by the daily and weekly instances of a board
    pub fn from_quests(quests: &[QuestInstance]) -> Self {
        let ids = |quest_type: QuestType| {
            unique_ids(
                quests
                    .iter()
                    .filter(|quest| quest.quest_type == quest_type)
                    .map(|quest| quest.template_id.as_str()),
            )
        };

        Self {
            daily: ids(QuestType::Daily),
            weekly: ids(QuestType::Weekly),
        }
    }

    /// Drop empty and repeated ids, keeping first occurrences in order
    pub fn normalize(&self) -> Self {
        Self {
            daily: unique_ids(self.daily.iter().map(String::as_str)),
            weekly: unique_ids(self.weekly.iter().map(String::as_str)),
        }
    }

    /// Ids for a tier; monthly quests do not rotate and have none
    pub fn for_type(&self, quest_type: QuestType) -> &[String] {
        match quest_type {
            QuestType::Daily => &self.daily,
            QuestType::Weekly => &self.weekly,
            QuestType::Monthly => &[],
        }
    }
}

fn unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| !id.is_empty() && seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Choose up to `count` distinct templates, drawing from those absent in
/// `previous_template_ids` first and only falling back to repeats when the
/// fresh pool runs out.
pub fn pick_templates(
    templates: &[QuestTemplate],
    count: usize,
    previous_template_ids: &[String],
    random: &mut dyn RandomSource,
) -> Vec<QuestTemplate> {
    let target_count = count.min(templates.len());
    if target_count == 0 {
        return Vec::new();
    }

    let previous: HashSet<&str> = previous_template_ids.iter().map(String::as_str).collect();
    let mut selected: Vec<QuestTemplate> = Vec::with_capacity(target_count);
    let mut selected_ids: HashSet<String> = HashSet::new();

    let mut draw_from = |pool: Vec<&QuestTemplate>, selected: &mut Vec<QuestTemplate>| {
        let mut remaining = pool;
        while !remaining.is_empty() && selected.len() < target_count {
            let picked = remaining.remove(pick_index(random, remaining.len()));
            if selected_ids.insert(picked.template_id.to_string()) {
                selected.push(picked.clone());
            }
        }
    };

    let fresh: Vec<&QuestTemplate> = templates
        .iter()
        .filter(|template| !previous.contains(&*template.template_id))
        .collect();
    draw_from(fresh, &mut selected);

    if selected.len() < target_count {
        let chosen: HashSet<&str> = selected.iter().map(|t| &*t.template_id).collect();
        let leftovers: Vec<&QuestTemplate> = templates
            .iter()
            .filter(|template| !chosen.contains(&*template.template_id))
            .collect();
        draw_from(leftovers, &mut selected);
    }

    selected
}

/// Rotate one daily or weekly tier into fresh instances stamped with `cycle_key`
pub(crate) fn roll_tier(
    catalog: &QuestCatalog,
    quest_type: QuestType,
    previous_template_ids: &[String],
    cycle_key: &str,
    random: &mut dyn RandomSource,
) -> Vec<QuestInstance> {
    pick_templates(
        catalog.templates(quest_type),
        catalog.rotation_count(quest_type),
        previous_template_ids,
        random,
    )
    .iter()
    .map(|template| create_quest_instance_from_template(template, cycle_key))
    .collect()
}

/// A newly built board and the rotation it used
#[derive(Debug, Clone)]
pub struct QuestBoardBuild {
    pub quests: Vec<QuestInstance>,
    pub selection: QuestRotationSelection,
}

/// Build a whole board for the given periods.
///
/// Monthly quests are reused when `monthly_quests` is non-empty, otherwise
/// regenerated. The board is ordered monthly, daily, weekly.
pub fn build_quest_board_for_cycles(
    catalog: &QuestCatalog,
    cycle_keys: &QuestCycleKeys,
    previous_selection: Option<&QuestRotationSelection>,
    monthly_quests: Option<&[QuestInstance]>,
    random: &mut dyn RandomSource,
) -> QuestBoardBuild {
    let previous = previous_selection.map(QuestRotationSelection::normalize).unwrap_or_default();

    let daily = roll_tier(catalog, QuestType::Daily, &previous.daily, &cycle_keys.daily, random);
    let weekly = roll_tier(catalog, QuestType::Weekly, &previous.weekly, &cycle_keys.weekly, random);
    let monthly = match monthly_quests {
        Some(existing) if !existing.is_empty() => existing.to_vec(),
        _ => create_monthly_fixed_quest_instances(catalog.templates(QuestType::Monthly), &cycle_keys.monthly),
    };

    let selection = QuestRotationSelection {
        daily: daily.iter().map(|quest| quest.template_id.clone()).collect(),
        weekly: weekly.iter().map(|quest| quest.template_id.clone()).collect(),
    };

    let mut quests = monthly;
    quests.extend(daily);
    quests.extend(weekly);

    QuestBoardBuild { quests, selection }
}

/// Rebuild the tiers of a stored board that lost instances, keeping intact
/// tiers untouched.
///
/// A tier is intact when it holds as many instances as the catalog puts on a
/// board. Rebuilt daily and weekly tiers avoid `selection`; a rebuilt monthly
/// tier keeps the progress of any monthly instances that survived.
pub fn repair_quest_board<'a>(
    catalog: &QuestCatalog,
    cycle_keys: &QuestCycleKeys,
    quests: &'a [QuestInstance],
    selection: &QuestRotationSelection,
    random: &mut dyn RandomSource,
) -> Cow<'a, [QuestInstance]> {
    let tier = |quest_type: QuestType| quests.iter().filter(move |quest| quest.quest_type == quest_type);
    let expected = |quest_type: QuestType| {
        catalog
            .rotation_count(quest_type)
            .min(catalog.templates(quest_type).len())
    };

    let broken: Vec<QuestType> = QuestType::ALL
        .into_iter()
        .filter(|quest_type| tier(*quest_type).count() != expected(*quest_type))
        .collect();
    if broken.is_empty() {
        return Cow::Borrowed(quests);
    }

    let mut next_tier = |quest_type: QuestType| -> Vec<QuestInstance> {
        if !broken.contains(&quest_type) {
            return tier(quest_type).cloned().collect();
        }
        let cycle_key = cycle_keys.key_for(quest_type);
        match quest_type {
            QuestType::Monthly => migrate_monthly_quests(catalog.templates(QuestType::Monthly), quests, cycle_key),
            _ => roll_tier(catalog, quest_type, selection.for_type(quest_type), cycle_key, &mut *random),
        }
    };

    let mut repaired = next_tier(QuestType::Monthly);
    repaired.extend(next_tier(QuestType::Daily));
    repaired.extend(next_tier(QuestType::Weekly));
    Cow::Owned(repaired)
}
