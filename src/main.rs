use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use tracing::error;

use psycle_quests::quest::{QuestEvent, QuestInstance, QuestType, RandomSource, RngSource};
use psycle_quests::{CycleSync, JsonFileStateStore, QuestBoardConfig, QuestBoardSession};

fn print_usage() {
    println!("psycle-quests [--config PATH] [--state PATH] <command>");
    println!("commands:");
    println!("  show");
    println!("  lesson [lesson_id]");
    println!("    records one finished lesson");
    println!("  streak <n>");
    println!("    records a correct-answer streak that just reached n");
    println!("  progress <quest_id> [step]");
    println!("    advances one quest directly, by 1 unless step is given");
    println!("  reroll <quest_id> [gems_balance]");
    println!("  claim <quest_id>");
    println!("  open <quest_id>");
    println!("    advances the quest's reward chest");
    println!("config defaults to $PSYCLE_QUESTS_CONFIG or quests.toml");
}

struct CliArgs {
    config_path: PathBuf,
    state_path: Option<PathBuf>,
    command: Vec<String>,
}

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Show,
    Lesson(Option<String>),
    Streak(i64),
    Progress { quest_id: String, step: i64 },
    Reroll { quest_id: String, gems_balance: Option<u32> },
    Claim(String),
    Open(String),
}

fn default_config_path() -> PathBuf {
    env::var("PSYCLE_QUESTS_CONFIG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("quests.toml"))
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut config_path = None;
    let mut state_path = None;
    let mut command = Vec::new();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter.next().ok_or_else(|| "missing value for --config".to_string())?;
                config_path = Some(PathBuf::from(value));
            }
            "--state" => {
                let value = iter.next().ok_or_else(|| "missing value for --state".to_string())?;
                state_path = Some(PathBuf::from(value));
            }
            _ => command.push(arg.clone()),
        }
    }

    Ok(CliArgs {
        config_path: config_path.unwrap_or_else(default_config_path),
        state_path,
        command,
    })
}

fn parse_i64(value: Option<&String>, label: &str) -> Result<i64, String> {
    let raw = value.ok_or_else(|| format!("missing {}", label))?;
    raw.parse::<i64>()
        .map_err(|_| format!("invalid {}: {}", label, raw))
}

fn parse_u32(value: &str, label: &str) -> Result<u32, String> {
    value
        .parse::<u32>()
        .map_err(|_| format!("invalid {}: {}", label, value))
}

fn quest_id(value: Option<&String>) -> Result<String, String> {
    value.cloned().ok_or_else(|| "missing quest_id".to_string())
}

/// Validate the command line before any file is touched
fn parse_command(words: &[String]) -> Result<Command, String> {
    let Some(name) = words.first() else {
        return Ok(Command::Help);
    };
    let command = match name.as_str() {
        "help" | "--help" | "-h" => Command::Help,
        "show" => Command::Show,
        "lesson" => Command::Lesson(words.get(1).cloned()),
        "streak" => Command::Streak(parse_i64(words.get(1), "streak")?),
        "progress" => Command::Progress {
            quest_id: quest_id(words.get(1))?,
            step: words.get(2).map(|raw| parse_i64(Some(raw), "step")).transpose()?.unwrap_or(1),
        },
        "reroll" => Command::Reroll {
            quest_id: quest_id(words.get(1))?,
            gems_balance: words.get(2).map(|raw| parse_u32(raw, "gems_balance")).transpose()?,
        },
        "claim" => Command::Claim(quest_id(words.get(1))?),
        "open" => Command::Open(quest_id(words.get(1))?),
        other => return Err(format!("unknown command: {}", other)),
    };
    Ok(command)
}

fn print_sync(sync: &CycleSync) {
    if sync.created {
        println!("started a new quest board");
        return;
    }
    if !sync.changed_types.is_empty() {
        let tiers: Vec<&str> = sync.changed_types.iter().map(QuestType::as_str).collect();
        println!("new period: {}", tiers.join(", "));
    }
    if !sync.auto_claimed.is_empty() {
        println!(
            "auto-claimed {} quests: +{} XP, +{} gems",
            sync.auto_claimed.claimed_count, sync.auto_claimed.total_reward_xp, sync.auto_claimed.total_reward_gems
        );
    }
}

fn print_quest(quest: &QuestInstance) {
    let mark = if quest.claimed {
        "x"
    } else if quest.is_completed() {
        "!"
    } else {
        " "
    };
    println!(
        "  [{}] {:<32} {:<42} {:>3}/{:<3} {:>4} XP  chest={}",
        mark,
        quest.id,
        quest.title,
        quest.progress,
        quest.need,
        quest.reward_xp,
        quest.chest_state.as_str()
    );
}

fn print_board(session: &QuestBoardSession<JsonFileStateStore>) {
    for quest_type in [QuestType::Daily, QuestType::Weekly, QuestType::Monthly] {
        println!("{} ({})", quest_type, session.cycle_keys().key_for(quest_type));
        session
            .quests()
            .iter()
            .filter(|quest| quest.quest_type == quest_type)
            .for_each(print_quest);
    }
    println!("rerolls left today: {}", session.rerolls_left());
}

fn run(args: &[String]) -> Result<(), String> {
    let cli = parse_args(args)?;
    let command = match parse_command(&cli.command) {
        Ok(Command::Help) => {
            print_usage();
            return Ok(());
        }
        Ok(command) => command,
        Err(e) => {
            print_usage();
            return Err(e);
        }
    };

    let mut config = QuestBoardConfig::load(&cli.config_path)?;
    if let Some(state_path) = cli.state_path {
        config.state_path = Some(state_path);
    }

    let catalog = config.load_catalog()?;
    let store = JsonFileStateStore::new(config.state_path());
    let mut random: Box<dyn RandomSource> = match config.rng_seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource::thread()),
    };

    let (mut session, sync) = QuestBoardSession::open(&config, catalog, store, &Local::now(), &mut *random)?;
    print_sync(&sync);

    match command {
        Command::Help | Command::Show => {}
        Command::Lesson(lesson_id) => {
            if !session.record_event(&QuestEvent::LessonCompleted { lesson_id })? {
                println!("no open quest tracks lessons right now");
            }
        }
        Command::Streak(next_streak) => {
            if !session.record_event(&QuestEvent::AnswerStreak { next_streak })? {
                println!("streak {} did not advance any quest", next_streak);
            }
        }
        Command::Progress { quest_id, step } => {
            if !session.increment_quest(&quest_id, step)? {
                println!("{} was not advanced", quest_id);
            }
        }
        Command::Reroll { quest_id, gems_balance } => match session.reroll(&quest_id, gems_balance, &mut *random)? {
            Ok(receipt) => println!(
                "rerolled {} -> {} for {} gems ({} left today)",
                receipt.reroll.old_template_id, receipt.reroll.new_template_id, receipt.cost_gems, receipt.rerolls_left
            ),
            Err(reason) => return Err(format!("cannot reroll {}: {}", quest_id, reason)),
        },
        Command::Claim(quest_id) => match session.claim(&quest_id)? {
            Ok(claim) => println!(
                "claimed {}: +{} XP, +{} gems",
                claim.quest_id, claim.reward_xp, claim.reward_gems
            ),
            Err(reason) => return Err(format!("cannot claim {}: {}", quest_id, reason)),
        },
        Command::Open(quest_id) => match session.advance_chest(&quest_id)? {
            Some(state) => println!("chest of {} is now {}", quest_id, state.as_str()),
            None => return Err(format!("no chest to advance for {}", quest_id)),
        },
    }

    print_board(&session);
    Ok(())
}

fn main() -> ExitCode {
    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "psycle_quests=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
