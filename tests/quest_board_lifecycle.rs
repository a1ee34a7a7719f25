use chrono::{DateTime, FixedOffset, TimeZone};
use tempfile::TempDir;

use psycle_quests::quest::{
    ClaimBonusGems, QuestAutoClaimSummary, QuestCatalog, QuestEvent, QuestType, RerollFailureReason, RngSource,
};
use psycle_quests::{
    CycleSync, JsonFileStateStore, MemoryStateStore, QuestBoardConfig, QuestBoardSession, QuestStateStore,
    RerollConfig,
};

fn tokyo(year: i32, month: u32, day: u32, hour: u32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(9 * 3600).unwrap();
    offset.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

fn write_config(dir: &TempDir) -> QuestBoardConfig {
    let path = dir.path().join("quests.toml");
    std::fs::write(
        &path,
        "state_path = \"save/quest_state.json\"\n\n[claim_bonus_gems]\ndaily = 5\nweekly = 10\nmonthly = 15\n",
    )
    .unwrap();
    QuestBoardConfig::load(&path).unwrap()
}

fn open(config: &QuestBoardConfig, now: &DateTime<FixedOffset>) -> (QuestBoardSession<JsonFileStateStore>, CycleSync) {
    let store = JsonFileStateStore::new(config.state_path());
    QuestBoardSession::open(config, config.load_catalog().unwrap(), store, now, &mut || 0.0).unwrap()
}

#[test]
fn bundled_catalog_matches_builtin_tables() {
    let catalog = QuestCatalog::from_toml_str(include_str!("../data/quests/catalog.toml")).unwrap();
    assert_eq!(catalog, QuestCatalog::builtin());
}

#[test]
fn bundled_config_pays_tier_gems_and_limits_rerolls() {
    let config = QuestBoardConfig::from_toml_str(include_str!("../quests.toml")).unwrap();
    assert_eq!(config.claim_bonus_gems, ClaimBonusGems::new(5, 10, 15));
    assert_eq!(config.reroll, RerollConfig::default());
}

#[test]
fn board_survives_restarts_and_rolls_over_periods() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    // Monday of ISO week 11
    let (mut session, sync) = open(&config, &tokyo(2026, 3, 9, 10));
    assert!(sync.created);
    assert_eq!(session.cycle_keys().weekly, "2026-W11");
    assert!(dir.path().join("save/quest_state.json").exists());

    let lesson = QuestEvent::LessonCompleted {
        lesson_id: Some("fractions-1".to_string()),
    };
    session.record_event(&lesson).unwrap();
    session.record_event(&lesson).unwrap();
    let before_restart = session.quests().to_vec();
    drop(session);

    // Same day: nothing changes
    let (session, sync) = open(&config, &tokyo(2026, 3, 9, 22));
    assert!(!sync.created);
    assert!(sync.changed_types.is_empty());
    assert_eq!(session.quests(), before_restart.as_slice());
    drop(session);

    // 01:00 on Monday in +09:00 is still Sunday in UTC; the local date decides
    let (session, sync) = open(&config, &tokyo(2026, 3, 16, 1));
    assert_eq!(sync.changed_types, vec![QuestType::Daily, QuestType::Weekly]);
    assert_eq!(
        sync.auto_claimed,
        QuestAutoClaimSummary {
            claimed_count: 1,
            total_reward_xp: 20,
            total_reward_gems: 5,
        }
    );
    assert_eq!(session.cycle_keys().daily, "2026-03-16");
    assert_eq!(session.cycle_keys().weekly, "2026-W12");

    // The previous day's rotation is avoided while fresh templates remain
    let daily: Vec<&str> = session
        .quests()
        .iter()
        .filter(|q| q.quest_type == QuestType::Daily)
        .map(|q| q.template_id.as_str())
        .collect();
    assert_eq!(daily, vec!["qd_streak5_1", "qd_streak5_2", "qd_lessons_2"]);

    let monthly = session.quests().iter().find(|q| q.id == "q_monthly_50pts").unwrap();
    assert_eq!(monthly.progress, 2);
    drop(session);

    // Month rollover regenerates monthly quests
    let (session, sync) = open(&config, &tokyo(2026, 4, 1, 8));
    assert_eq!(sync.changed_types, QuestType::ALL.to_vec());
    assert!(sync.auto_claimed.is_empty());
    let monthly = session.quests().iter().find(|q| q.id == "q_monthly_50pts").unwrap();
    assert_eq!(monthly.progress, 0);
    assert_eq!(monthly.cycle_key, "2026-04");
}

#[test]
fn persisted_file_uses_camel_case_fields() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    let (session, _) = open(&config, &tokyo(2026, 3, 10, 12));

    let json = std::fs::read_to_string(config.state_path()).unwrap();
    assert!(json.contains("\"cycleKeys\""));
    assert!(json.contains("\"templateId\""));
    assert!(json.contains("\"type\": \"daily\""));
    assert!(json.contains("\"chestState\": \"closed\""));

    let saved = session.store().load().unwrap().unwrap();
    assert_eq!(saved.quests, session.quests());
}

#[test]
fn seeded_rotation_is_reproducible() {
    let catalog = QuestCatalog::builtin();
    let config = QuestBoardConfig::default();
    let now = tokyo(2026, 3, 10, 12);

    let board = |seed: u64| {
        let (session, _) = QuestBoardSession::open(
            &config,
            catalog.clone(),
            MemoryStateStore::new(),
            &now,
            &mut RngSource::seeded(seed),
        )
        .unwrap();
        session.quests().to_vec()
    };

    assert_eq!(board(42), board(42));
}

#[test]
fn truncated_state_file_is_rebuilt_on_open() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    std::fs::create_dir_all(dir.path().join("save")).unwrap();
    std::fs::write(
        config.state_path(),
        r#"{"cycleKeys":{"daily":"2026-03-10","weekly":"2026-W11","monthly":"2026-03"},"quests":[]}"#,
    )
    .unwrap();

    let (session, sync) = open(&config, &tokyo(2026, 3, 10, 12));
    assert!(!sync.created);
    assert_eq!(session.quests().len(), 10);

    let saved = session.store().load().unwrap().unwrap();
    assert_eq!(saved.quests.len(), 10);
    assert_eq!(saved.selection.daily.len(), 3);
}

#[test]
fn reroll_allowance_is_kept_in_the_state_file() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    let (mut session, _) = open(&config, &tokyo(2026, 3, 10, 12));
    let receipt = session
        .reroll("qd_lessons_2__2026-03-10", Some(12), &mut || 0.0)
        .unwrap()
        .unwrap();
    assert_eq!(receipt.cost_gems, 5);
    drop(session);

    let json = std::fs::read_to_string(config.state_path()).unwrap();
    assert!(json.contains("\"rerollUsage\""));

    let (mut session, _) = open(&config, &tokyo(2026, 3, 10, 18));
    let refused = session.reroll("qd_lessons_3__2026-03-10", Some(12), &mut || 0.0).unwrap();
    assert_eq!(refused.unwrap_err(), RerollFailureReason::LimitReached);
    drop(session);

    let (session, _) = open(&config, &tokyo(2026, 3, 11, 8));
    assert_eq!(session.rerolls_left(), 1);
}
