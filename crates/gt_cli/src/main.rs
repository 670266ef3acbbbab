//! gt - Go tournament CLI
//!
//! 토너먼트 생성, 관전, 결과 스킵, 순위표, 대국 재검증

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use gt_cli::PlayEvent;
#[cfg(feature = "cli")]
use gt_core::models::{CompetitorSnapshot, TournamentKind};
#[cfg(feature = "cli")]
use gt_core::{FileStore, RecordingSink, SimConfig, TickDriver, TournamentEngine, TournamentStore};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "gt")]
#[command(about = "Simulate Go tournaments from stat blocks", long_about = None)]
struct Cli {
    /// Simulation config (.yaml/.yml or JSON). Falls back to GT_SIM_CONFIG_PATH.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Create a tournament and write its state file
    New {
        /// daily | weekly | league
        #[arg(long, value_parser = parse_kind)]
        kind: TournamentKind,

        /// Tracked competitor id
        #[arg(long)]
        owner: String,

        /// JSON array of competitor snapshots
        #[arg(long)]
        competitors: PathBuf,

        #[arg(long)]
        state: PathBuf,

        #[arg(long)]
        seed: Option<u64>,

        /// Start the first round right away
        #[arg(long, default_value = "false")]
        start: bool,

        /// Also save into this slot directory (for `watch`)
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Play the tracked competitor's matches tick by tick
    Play {
        #[arg(long)]
        state: PathBuf,

        /// Pause between ticks
        #[arg(long, default_value = "0")]
        delay_ms: u64,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Resolve everything that is left
    Skip {
        #[arg(long)]
        state: PathBuf,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print standings
    Ranks {
        #[arg(long)]
        state: PathBuf,
    },

    /// Re-run a match from its seed
    Verify {
        #[arg(long)]
        seed: u64,

        /// JSON with `p1`, `p2` and an optional `round_name`
        #[arg(long)]
        pair: PathBuf,
    },

    /// Run the periodic tick driver over a save directory
    Watch {
        #[arg(long)]
        store: PathBuf,

        /// Observing owners, comma separated. Empty means everyone.
        #[arg(long, value_delimiter = ',')]
        owners: Vec<String>,

        #[arg(long, default_value = "50")]
        passes: u32,

        #[arg(long, default_value = "1000")]
        interval_ms: u64,
    },
}

#[cfg(feature = "cli")]
fn parse_kind(tag: &str) -> std::result::Result<TournamentKind, String> {
    TournamentKind::parse(tag).ok_or_else(|| format!("unknown tournament kind '{tag}' (daily, weekly, league)"))
}

#[cfg(feature = "cli")]
fn rng_for(seed: Option<u64>) -> rand_chacha::ChaCha8Rng {
    use rand::SeedableRng;
    rand_chacha::ChaCha8Rng::seed_from_u64(seed.unwrap_or_else(rand::random))
}

#[cfg(feature = "cli")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let engine = match &cli.config {
        Some(path) => TournamentEngine::new(SimConfig::from_path(&path.to_string_lossy())?)?,
        None => TournamentEngine::from_global(),
    };

    match cli.command {
        Commands::New { kind, owner, competitors, state, seed, start, store } => {
            let field: Vec<CompetitorSnapshot> = gt_cli::read_json(&competitors)?;
            let mut rng = rng_for(seed);
            let mut created = engine.create_tournament(kind, &owner, field, &mut rng)?;
            if start {
                engine.start_next_round(&mut created, &owner, &mut rng)?;
            }
            gt_cli::save_state(&state, &created)?;
            if let Some(dir) = store {
                FileStore::new(dir).save(&created)?;
            }
            println!("{} 생성: {} ({}명)", kind.definition().display_name, created.id, created.players.len());
            println!("   State: {}", state.display());
        }

        Commands::Play { state: path, delay_ms, seed } => {
            let mut state = gt_cli::load_state(&path)?;
            let mut rng = rng_for(seed);

            gt_cli::play_tournament(&engine, &mut state, &mut rng, |event| {
                match event {
                    PlayEvent::MatchStarted { round_name } => println!("\n== {} ==", round_name),
                    // 부전승 or 휴식 회차
                    PlayEvent::NoMatch { status } => println!("-- 대국 없음 ({:?})", status),
                    PlayEvent::Line(line) => {
                        println!("{}", gt_cli::format_line(line));
                        if delay_ms > 0 {
                            std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                        }
                    }
                    PlayEvent::Checkpoint(current) => gt_cli::save_state(&path, current)?,
                }
                Ok(())
            })?;

            println!("\n결과: {:?}", state.status);
            print!("{}", gt_cli::format_ranks(&engine.calculate_ranks(&state)));
        }

        Commands::Skip { state: path, seed } => {
            let mut state = gt_cli::load_state(&path)?;
            let owner = state.owner_id.clone();
            engine.skip_to_results(&mut state, &owner, &mut rng_for(seed))?;
            gt_cli::save_state(&path, &state)?;
            print!("{}", gt_cli::format_ranks(&engine.calculate_ranks(&state)));
        }

        Commands::Ranks { state } => {
            let state = gt_cli::load_state(&state)?;
            print!("{}", gt_cli::format_ranks(&engine.calculate_ranks(&state)));
        }

        Commands::Verify { seed, pair } => {
            let pair: gt_cli::VerifyPair = gt_cli::read_json(&pair)?;
            let round_name = pair.round_name.as_deref().unwrap_or("대국");
            let result = engine.verify_match(seed, &pair.p1, &pair.p2, round_name);
            for line in &result.commentary {
                println!("{}", gt_cli::format_line(line));
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Watch { store, owners, passes, interval_ms } => {
            let store = FileStore::new(store);
            let sink = RecordingSink::new();
            let driver = TickDriver::new();

            for pass in 1..=passes {
                let report = driver.run_pass(&engine, &store, &sink, |owner| {
                    owners.is_empty() || owners.iter().any(|o| o == owner)
                });
                for note in sink.drain() {
                    println!("{} {} tick {} {:?}", note.owner_id, note.tournament_id, note.tick, note.status);
                }
                tracing::info!("Pass {}/{}: {:?}", pass, passes, report);
                if report.advanced == 0 && !report.skipped {
                    println!("진행 중인 대국 없음");
                    break;
                }
                std::thread::sleep(std::time::Duration::from_millis(interval_ms));
            }
            println!("Store: {}", store.root().display());
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("gt CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
