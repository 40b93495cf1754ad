use std::time::Duration;

use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use packed_2048::engine::{self as GameEngine, Board};
use packed_2048::expectimax::{Expectimax, ExpectimaxConfig};
use packed_2048::game::{play_game, simulate_for};
use packed_2048::logging;
use packed_2048::policy::{Policy, RandomPolicy};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Parser)]
#[command(name = "packed-2048", version, about = "2048 on a packed u64 board with an expectimax player")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    /// Seed for tile spawns and the random policy (random if omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play one game, printing the board after every move
    Play {
        #[arg(long, value_enum, default_value_t = PolicyKind::Expectimax)]
        policy: PolicyKind,
        /// Stop after this many moves
        #[arg(long)]
        max_moves: Option<u64>,
        /// Only print the final board and summary
        #[arg(long)]
        quiet: bool,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Play games back to back for a fixed time and report throughput and score
    Simulate {
        #[arg(long, value_enum, default_value_t = PolicyKind::Random)]
        policy: PolicyKind,
        /// Wall-clock budget in seconds
        #[arg(long, default_value_t = 10)]
        seconds: u64,
        /// Suppress the spinner status line
        #[arg(long)]
        quiet: bool,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Show the expectimax evaluation of one board
    Suggest {
        /// Packed board as hex, cell 0 in the lowest nibble (e.g. 0x2211)
        #[arg(long)]
        board: Board,
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyKind {
    Expectimax,
    Random,
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Plies searched for every move
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    depth: u32,
    /// Plies searched when the two best moves are too close to call
    #[arg(long, default_value_t = 3)]
    escalated_depth: u32,
    /// Only escalate when the best expected value exceeds this
    #[arg(long, default_value_t = 2000.0)]
    escalate_above: f64,
    /// Escalate when runner-up gain / best gain exceeds this
    #[arg(long, default_value_t = 0.75)]
    escalate_ratio: f64,
    /// Clear the heuristic cache once it holds this many boards
    #[arg(long)]
    cache_limit: Option<usize>,
    /// Score chance nodes less likely than this by the heuristic alone
    #[arg(long)]
    prob_cutoff: Option<f64>,
    /// Reuse chance-node values within a decision
    #[arg(long)]
    transposition: bool,
}

impl SearchArgs {
    fn to_config(&self) -> ExpectimaxConfig {
        ExpectimaxConfig {
            base_depth: self.depth,
            escalated_depth: self.escalated_depth,
            escalation_min_value: self.escalate_above,
            escalation_ratio: self.escalate_ratio,
            cache_limit: self.cache_limit,
            prob_cutoff: self.prob_cutoff,
            transposition: self.transposition,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(logging::level_for_verbosity(cli.verbose)).context("installing logger")?;
    GameEngine::new();

    let seed = cli.seed.unwrap_or_else(rand::random);
    info!("seed {seed}");
    let mut rng = StdRng::seed_from_u64(seed);

    match cli.cmd {
        Command::Play { policy, max_moves, quiet, search } => {
            let mut policy = build_policy(policy, &search, &mut rng)?;
            let report = play_game(policy.as_mut(), &mut rng, max_moves, |dir, board| {
                if !quiet {
                    println!("Move: {dir}\n{board}");
                }
            });
            if quiet {
                println!("{}", report.final_board);
            }
            println!(
                "Moves: {} | score: {} | highest tile: {}",
                report.moves, report.score, report.highest_tile
            );
        }
        Command::Simulate { policy, seconds, quiet, search } => {
            let mut policy = build_policy(policy, &search, &mut rng)?;
            let pb = if quiet {
                None
            } else {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::with_template("{spinner} {elapsed_precise} | Games: {pos} | {msg}")?
                        .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
                );
                pb.enable_steady_tick(Duration::from_millis(120));
                Some(pb)
            };
            let report = simulate_for(policy.as_mut(), &mut rng, Duration::from_secs(seconds), |game, totals| {
                if let Some(pb) = &pb {
                    pb.set_position(totals.games);
                    pb.set_message(format!("last score: {} | mean: {:.1}", game.score, totals.mean_score()));
                }
            });
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            println!("Policy: {}", policy.name());
            println!("Games / Sec: {:.3}", report.games_per_sec());
            println!("Moves / Sec: {:.1}", report.moves_per_sec());
            println!("Score / Game: {:.1}", report.mean_score());
            println!("Best score: {} | highest tile: {}", report.best_score, report.highest_tile);
        }
        Command::Suggest { board, search } => {
            if board.is_terminal() {
                bail!("board {board:?} has no legal moves");
            }
            let cfg = search.to_config();
            let mut ex = Expectimax::with_config(cfg.clone());
            println!("{board}");
            println!("Heuristic: {}", ex.heuristic(board));
            let outcome = ex.search(board, cfg.base_depth);
            for branch in &outcome.branches {
                println!("{:>5}: {:.2}", branch.dir, branch.ev);
            }
            let dir = ex.choose_move(board);
            let stats = ex.last_stats();
            println!(
                "Move: {dir} (escalated: {}, states considered: {}, pruned: {}, table hits: {})",
                stats.escalated, stats.nodes, stats.pruned, stats.table_hits
            );
        }
    }
    Ok(())
}

fn build_policy(kind: PolicyKind, search: &SearchArgs, rng: &mut StdRng) -> anyhow::Result<Box<dyn Policy>> {
    let policy: Box<dyn Policy> = match kind {
        PolicyKind::Expectimax => Box::new(Expectimax::with_config(search.to_config())),
        PolicyKind::Random => {
            let policy_rng = StdRng::from_rng(rng).context("seeding random policy")?;
            Box::new(RandomPolicy::new(policy_rng))
        }
    };
    Ok(policy)
}
