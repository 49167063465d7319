//! BarReplay CLI: play, replay, and pick commands.
//!
//! Commands:
//! - `play`: interactive replay: one order per day at the close, then settle
//! - `replay`: headless replay driven by a script file
//! - `pick`: pick a game and print its metadata as JSON
//! - `history`: list recorded games and summarize their results

mod panel;
mod prompt;

use anyhow::{Context, Result};
use barreplay_core::{DayAction, Session, SettlementReport};
use barreplay_runner::{
    load_game, run_script, save_artifacts, summarize, GameHistory, GameMeta, HistoryEntry,
    ReplayConfig, ReplayScript,
};
use clap::{Args, Parser, Subcommand};
use prompt::{PlayCommand, Volume};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "barreplay",
    about = "BarReplay — replay historical daily bars and practice trading decisions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a random game interactively.
    Play {
        #[command(flatten)]
        game: GameArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run a game headless from a script file.
    Replay {
        /// Script with one action per line (buy <n>, sell <n>, hold [xN], settle).
        #[arg(long)]
        script: PathBuf,

        #[command(flatten)]
        game: GameArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Pick a game and print its metadata as JSON.
    Pick {
        #[command(flatten)]
        game: GameArgs,
    },
    /// Show recorded games and a summary of their results.
    History {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Artifact directory holding history.jsonl. Overrides [output] dir.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Show only the most recent N games.
        #[arg(long)]
        last: Option<usize>,
    },
}

#[derive(Args, Default)]
struct GameArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of <ticker>.csv files. Overrides [data] dir.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Seed for game selection, for a reproducible game.
    #[arg(long)]
    seed: Option<u64>,

    /// Play on generated bars instead of the CSV directory.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Starting cash. Overrides [session] initial_cash.
    #[arg(long)]
    cash: Option<f64>,

    /// Board lot size. Overrides [session] lot_size.
    #[arg(long)]
    lot_size: Option<u64>,
}

#[derive(Args)]
struct OutputArgs {
    /// Output directory for settlement artifacts. Overrides [output] dir.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Do not write artifacts or history.
    #[arg(long, default_value_t = false)]
    no_save: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Play { game, output } => {
            let config = resolve_config(&game, Some(&output))?;
            run_play(&config, output.no_save)
        }
        Commands::Replay {
            script,
            game,
            output,
        } => {
            let config = resolve_config(&game, Some(&output))?;
            run_replay(&config, &script, output.no_save)
        }
        Commands::Pick { game } => {
            let config = resolve_config(&game, None)?;
            run_pick(&config)
        }
        Commands::History {
            config,
            output_dir,
            last,
        } => {
            let game = GameArgs {
                config,
                ..GameArgs::default()
            };
            let output = OutputArgs {
                output_dir,
                no_save: true,
            };
            let config = resolve_config(&game, Some(&output))?;
            run_history(&config, last)
        }
    }
}

/// Logs go to stderr so the panel on stdout stays readable.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("barreplay=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Load the config file (or defaults) and apply command-line overrides.
fn resolve_config(game: &GameArgs, output: Option<&OutputArgs>) -> Result<ReplayConfig> {
    let mut config = match &game.config {
        Some(path) => ReplayConfig::from_file(path)?,
        None => ReplayConfig::default(),
    };

    if let Some(dir) = &game.data_dir {
        config.data.dir = dir.clone();
    }
    if game.seed.is_some() {
        config.data.seed = game.seed;
    }
    if game.synthetic {
        config.data.synthetic = true;
    }
    if let Some(cash) = game.cash {
        config.session.initial_cash = cash;
    }
    if let Some(lot_size) = game.lot_size {
        config.session.lot_size = lot_size;
        if lot_size > 0 && config.session.default_volume % lot_size != 0 {
            config.session.default_volume = lot_size;
        }
    }
    if let Some(dir) = output.and_then(|o| o.output_dir.as_ref()) {
        config.output.dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

fn run_pick(config: &ReplayConfig) -> Result<()> {
    let game = load_game(config)?;
    println!("{}", serde_json::to_string_pretty(&game.meta)?);
    Ok(())
}

fn run_history(config: &ReplayConfig, last: Option<usize>) -> Result<()> {
    let history = GameHistory::new(config.output.history_path());
    let entries = history
        .load()
        .with_context(|| format!("Failed to read {}", history.path().display()))?;
    if entries.is_empty() {
        println!("No games recorded in {}.", history.path().display());
        return Ok(());
    }

    let shown = &entries[entries.len().saturating_sub(last.unwrap_or(entries.len()))..];
    print!("{}", panel::history(shown, &summarize(&entries)));
    Ok(())
}

fn run_replay(config: &ReplayConfig, script_path: &std::path::Path, no_save: bool) -> Result<()> {
    let script = ReplayScript::from_file(script_path)?;
    let game = load_game(config)?;
    let session = game.start_session(config)?;

    let outcome = run_script(session, &script);
    for r in &outcome.rejections {
        println!(
            "line {}: {:?} rejected on {}: {}",
            r.line,
            r.action,
            barreplay_core::domain::day_label(r.day as i64),
            r.error
        );
    }
    println!("Stopped: {:?}", outcome.stop);
    finish(config, &game.meta, &outcome.report, no_save)
}

fn run_play(config: &ReplayConfig, no_save: bool) -> Result<()> {
    let game = load_game(config)?;
    let mut session = game.start_session(config)?;
    let mut default_volume = config.session.default_volume;

    println!(
        "New game: {} from {} with {:.2} cash ({} trading days ahead).",
        game.meta.ticker,
        game.meta
            .start_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "?".into()),
        config.session.initial_cash,
        game.meta.remaining_days.saturating_sub(1)
    );
    println!("Type 'help' for commands.");
    println!();
    println!("{}", panel::status(&session, default_volume));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("Failed to read command")?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<PlayCommand>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        let action = match command {
            PlayCommand::Buy(volume) => {
                DayAction::Buy(resolve_volume(&session, volume, default_volume, true))
            }
            PlayCommand::Sell(volume) => {
                DayAction::Sell(resolve_volume(&session, volume, default_volume, false))
            }
            PlayCommand::Next => DayAction::Observe,
            PlayCommand::SetVolume(volume) => {
                let lot = session.config().lot_size;
                if volume == 0 || volume % lot != 0 {
                    println!("Volume must be a positive multiple of {lot}.");
                } else {
                    default_volume = volume;
                    println!("Default volume set to {volume}.");
                }
                continue;
            }
            PlayCommand::Info => {
                println!("{}", panel::status(&session, default_volume));
                continue;
            }
            PlayCommand::Help => {
                println!("{}", prompt::HELP);
                continue;
            }
            PlayCommand::Settle => break,
        };

        match session.step(action) {
            Ok(outcome) => {
                if let Some(trade) = &outcome.trade {
                    println!("{}", panel::trade_line(trade));
                }
                if outcome.advance.is_end_of_data() {
                    println!("End of data reached.");
                    break;
                }
                println!();
                println!("{}", panel::status(&session, default_volume));
            }
            Err(e) => println!("Order rejected: {e}"),
        }
    }

    let report = session.settle();
    finish(config, &game.meta, &report, no_save)
}

/// Turn a typed volume into shares. `All` rounds down to whole lots.
fn resolve_volume(session: &Session, volume: Volume, default_volume: u64, buying: bool) -> u64 {
    match volume {
        Volume::Default => default_volume,
        Volume::Shares(n) => n,
        Volume::All if buying => session.max_affordable_volume(),
        Volume::All => {
            let lot = session.config().lot_size;
            session.holdings() / lot * lot
        }
    }
}

/// Print the report and persist artifacts and history unless disabled.
fn finish(
    config: &ReplayConfig,
    meta: &GameMeta,
    report: &SettlementReport,
    no_save: bool,
) -> Result<()> {
    print!("{}", panel::report(report));
    if meta.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    if no_save {
        return Ok(());
    }

    let run_dir = save_artifacts(report, meta, &config.output.dir)?;
    println!();
    println!("Artifacts saved to: {}", run_dir.display());

    let run_id = run_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string());
    let history = GameHistory::new(config.output.history_path());
    if let Err(e) = history.append(&HistoryEntry::new(report, meta, run_id)) {
        warn!(path = %history.path().display(), error = %e, "failed to append game history");
    }
    Ok(())
}
