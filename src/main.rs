//! Matilda CLI: a smoke-test entry point around the engine.
//!
//! This is not a GTP server — GTP, SGF, and full game-record bookkeeping
//! are out of scope (see SPEC_FULL.md §1). `matilda eval` runs one search
//! on an empty board for a given time budget and reports the move and
//! winrate the engine would report back to a caller.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use matilda::board::{CfgBoard, Color};
use matilda::config::SearchConfig;
use matilda::coord::str_coord;
use matilda::engine::Engine;
use matilda::patterns::Pat3Store;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "matilda")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an empty board for the given number of milliseconds and
    /// print the recommended move.
    Eval {
        #[arg(long, default_value_t = 1000)]
        millis: u64,
        /// Optional `.pat3` file to load in place of the built-in table.
        #[arg(long)]
        pat3: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Eval { millis, pat3 }) => run_eval(millis, pat3),
        None => run_eval(1000, None),
    }
}

fn run_eval(millis: u64, pat3_path: Option<PathBuf>) -> Result<()> {
    let pat3 = match pat3_path {
        Some(path) => matilda::patterns::load_pat3_from(&path).with_context(|| format!("loading pattern file {}", path.display()))?,
        None => Pat3Store::default(),
    };

    let engine = Engine::with_patterns(SearchConfig::default(), pat3, None);
    let board = CfgBoard::new();
    let deadline = Instant::now() + Duration::from_millis(millis);

    let out = engine.evaluate_position(&board, Color::Black, deadline);
    match out.best_move {
        Some(mv) => {
            log::info!("recommended move: {} (pass quality {:.3})", str_coord(mv), out.pass_quality);
            println!("{}", str_coord(mv));
        }
        None => {
            log::info!("engine resigns");
            println!("resign");
        }
    }
    Ok(())
}
