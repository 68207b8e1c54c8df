use clap::{Parser, Subcommand};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use sweat_core::*;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "sweat")]
#[command(about = "Workout session point economy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Seed the workout selector (for reproducible redemptions)
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new session
    Start {
        /// Session name
        name: String,

        /// Pool to draw workouts from (defaults to the only pool)
        #[arg(long)]
        pool: Option<Uuid>,

        /// Optional description
        #[arg(long)]
        description: Option<String>,
    },

    /// Show the active session
    Status,

    /// Record a completed action and earn its points
    Complete {
        /// Action id (see `sweat catalog`)
        action_id: Uuid,
    },

    /// Spend points for a randomly chosen workout
    Redeem {
        /// Points to spend
        cost: u32,

        /// Restrict the draw to one difficulty
        #[arg(long)]
        difficulty: Option<String>,
    },

    /// End the active session
    End,

    /// Abandon the active session
    Cancel,

    /// List all sessions, newest first
    Sessions,

    /// List pools, workouts and actions with their ids
    Catalog,

    /// Export all data to a snapshot file
    Export {
        /// Snapshot file to write
        file: PathBuf,
    },

    /// Import a snapshot file
    Import {
        /// Snapshot file to read
        file: PathBuf,

        /// Replace existing data instead of merging
        #[arg(long)]
        overwrite: bool,
    },

    /// Write a CSV session report
    Report {
        /// CSV file to write
        file: PathBuf,
    },
}

fn main() {
    sweat_core::logging::init();

    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let engine = build_engine(&data_dir, cli.seed, &config)?;

    match cli.command {
        Commands::Start {
            name,
            pool,
            description,
        } => cmd_start(&engine, &name, pool, description),
        Commands::Status => cmd_status(&engine),
        Commands::Complete { action_id } => cmd_complete(&engine, action_id),
        Commands::Redeem { cost, difficulty } => cmd_redeem(&engine, cost, difficulty),
        Commands::End => cmd_end(&engine),
        Commands::Cancel => cmd_cancel(&engine),
        Commands::Sessions => cmd_sessions(&engine),
        Commands::Catalog => cmd_catalog(&engine),
        Commands::Export { file } => cmd_export(&engine, &file),
        Commands::Import { file, overwrite } => cmd_import(&engine, &file, overwrite),
        Commands::Report { file } => cmd_report(&engine, &file),
    }
}

type Engine = SessionEngine<FileStore, SmallRng>;

fn build_engine(data_dir: &Path, seed: Option<u64>, config: &Config) -> Result<Engine> {
    let store = FileStore::new(data_dir.join("sweat.json"));

    // First touch of an empty data dir gets the preloaded catalog
    store.transact(|data| {
        seed_defaults(data);
        Ok(())
    })?;

    let rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    Ok(SessionEngine::new(
        store,
        config.limits.clone(),
        WorkoutSelector::new(rng),
    ))
}

/// Resolve the session every point-affecting command targets
fn require_active(engine: &Engine) -> Result<Session> {
    engine
        .active_session()?
        .ok_or_else(|| Error::InvalidState("no active session".into()))
}

fn cmd_start(
    engine: &Engine,
    name: &str,
    pool: Option<Uuid>,
    description: Option<String>,
) -> Result<()> {
    let pool_id = match pool {
        Some(id) => id,
        None => {
            let pools = engine.store().read(|data| Ok(data.pools.clone()))?;
            match pools.as_slice() {
                [only] => only.id,
                [] => return Err(Error::InvalidArgument("no pools exist".into())),
                _ => {
                    return Err(Error::InvalidArgument(
                        "multiple pools exist, pass --pool (see `sweat catalog`)".into(),
                    ))
                }
            }
        }
    };

    let session = engine.start_session(name, pool_id, description)?;
    println!("✓ Started session '{}' ({})", session.name, session.id);
    Ok(())
}

fn cmd_status(engine: &Engine) -> Result<()> {
    match engine.active_session()? {
        Some(session) => {
            println!("Active session: {} ({})", session.name, session.id);
            println!(
                "  Started: {}",
                session.started_at.format("%Y-%m-%d %H:%M UTC")
            );
            println!(
                "  Points: {} earned, {} spent, balance {}",
                session.points_earned,
                session.points_spent,
                session.balance()
            );
        }
        None => println!("No active session."),
    }
    Ok(())
}

fn cmd_complete(engine: &Engine, action_id: Uuid) -> Result<()> {
    let session = require_active(engine)?;
    let completion = engine.complete_action(session.id, action_id)?;
    let session = engine.session(session.id)?;
    println!(
        "✓ Earned {} points (balance {})",
        completion.points_awarded,
        session.balance()
    );
    Ok(())
}

fn cmd_redeem(engine: &Engine, cost: u32, difficulty: Option<String>) -> Result<()> {
    let session = require_active(engine)?;

    let redemption = match difficulty.as_deref() {
        Some(label) => {
            let difficulty = parse_difficulty(label)
                .ok_or_else(|| Error::InvalidArgument(format!("unknown difficulty: {}", label)))?;
            engine.redeem_workout_by_difficulty(session.id, cost, difficulty)?
        }
        None => engine.redeem_workout(session.id, cost)?,
    };

    let session = engine.session(session.id)?;
    println!(
        "✓ Redeemed: {} ({} min, {})",
        redemption.workout.name, redemption.workout.duration_minutes, redemption.workout.difficulty
    );
    println!(
        "  Spent {} points, balance {}",
        redemption.record.points_spent,
        session.balance()
    );
    Ok(())
}

fn cmd_end(engine: &Engine) -> Result<()> {
    let session = require_active(engine)?;
    let session = engine.end_session(session.id)?;
    println!(
        "✓ Completed session '{}': {} earned, {} spent",
        session.name, session.points_earned, session.points_spent
    );
    Ok(())
}

fn cmd_cancel(engine: &Engine) -> Result<()> {
    let session = require_active(engine)?;
    let session = engine.cancel_session(session.id)?;
    println!("✓ Cancelled session '{}'", session.name);
    Ok(())
}

fn cmd_sessions(engine: &Engine) -> Result<()> {
    let sessions = engine.sessions()?;
    if sessions.is_empty() {
        println!("No sessions yet.");
        return Ok(());
    }

    for session in sessions {
        println!(
            "{}  [{}] {}  earned {} spent {} balance {}",
            session.started_at.format("%Y-%m-%d %H:%M"),
            session.status,
            session.name,
            session.points_earned,
            session.points_spent,
            session.balance()
        );
    }
    Ok(())
}

fn cmd_catalog(engine: &Engine) -> Result<()> {
    engine.store().read(|data| {
        println!("Pools:");
        for pool in &data.pools {
            println!(
                "  {}  {} ({} workouts)",
                pool.id,
                pool.name,
                data.pool_workout_ids(pool.id).len()
            );
        }

        println!("Workouts:");
        for workout in &data.workouts {
            let marker = match workout.visibility {
                WorkoutVisibility::Visible => "",
                WorkoutVisibility::Hidden => " [hidden]",
                WorkoutVisibility::Deleted => " [deleted]",
            };
            println!(
                "  {}  [{}] {} ({} min){}",
                workout.id, workout.difficulty, workout.name, workout.duration_minutes, marker
            );
        }

        println!("Actions:");
        for action in &data.actions {
            println!("  {}  {}pt  {}", action.id, action.points, action.description);
        }
        Ok(())
    })
}

fn cmd_export(engine: &Engine, file: &Path) -> Result<()> {
    let snapshot = engine.store().read(|data| Ok(export(data)))?;
    snapshot::write_snapshot(&snapshot, file)?;
    println!("✓ Exported snapshot to {}", file.display());
    Ok(())
}

fn cmd_import(engine: &Engine, file: &Path, overwrite: bool) -> Result<()> {
    let snapshot = snapshot::read_snapshot(file)?;
    let mode = if overwrite {
        ImportMode::Overwrite
    } else {
        ImportMode::Merge
    };

    let summary = import(engine.store(), &snapshot, mode)?;
    println!(
        "✓ Imported {} workouts, {} actions, {} pools, {} sessions",
        summary.workouts, summary.actions, summary.pools, summary.sessions
    );
    if summary.skipped_history > 0 || summary.skipped_pool_workouts > 0 {
        println!(
            "  Skipped {} memberships and {} history records (merge mode)",
            summary.skipped_pool_workouts, summary.skipped_history
        );
    }
    for warning in &summary.warnings {
        println!("  warning: {}", warning);
    }
    Ok(())
}

fn cmd_report(engine: &Engine, file: &Path) -> Result<()> {
    let count = engine
        .store()
        .read(|data| write_session_report(data, file))?;
    println!("✓ Wrote {} sessions to {}", count, file.display());
    Ok(())
}

fn parse_difficulty(label: &str) -> Option<Difficulty> {
    match label.to_lowercase().as_str() {
        "beginner" => Some(Difficulty::Beginner),
        "intermediate" => Some(Difficulty::Intermediate),
        "advanced" => Some(Difficulty::Advanced),
        "expert" => Some(Difficulty::Expert),
        _ => None,
    }
}
