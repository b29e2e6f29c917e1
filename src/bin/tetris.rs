use anyhow::{Context, Result};
use clap::Parser;

use tetris::{GameOptions, System};
use tetris_eval::Evaluator;
use tetris_game::MoveDownBehavior;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about = "Headless Tetris driven by its own search AI", long_about = None)]
struct Args {
  #[arg(long, default_value_t = 20)]
  rows: usize,

  #[arg(long, default_value_t = 10)]
  cols: usize,

  #[arg(long, default_value_t = 0)]
  starting_level: u32,

  /// Number of pieces the AI looks ahead at each decision.
  #[arg(long, default_value_t = 4)]
  search_depth: u32,

  /// Candidates kept per depth of the search tree.
  #[arg(long, default_value_t = 4)]
  search_width: u32,

  #[arg(long, default_value_t = 4)]
  workers: usize,

  /// Corrective moves per second `BlockMover` makes toward the AI's target.
  #[arg(long, default_value_t = 20.0)]
  move_speed: f64,

  #[arg(long, default_value_t = MoveDownBehaviorArg::Drop)]
  move_down_behavior: MoveDownBehaviorArg,

  #[arg(long, default_value_t = EvaluatorArg::Balanced)]
  evaluator: EvaluatorArg,

  /// Copies of each of the seven piece kinds per shuffled bag.
  #[arg(long, default_value_t = 1)]
  bag_size: usize,

  /// Stop after this many pieces commit; runs until game-over if absent.
  #[arg(long)]
  max_pieces: Option<u32>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum MoveDownBehaviorArg {
  Move,
  Drop,
}

impl From<MoveDownBehaviorArg> for MoveDownBehavior {
  fn from(arg: MoveDownBehaviorArg) -> Self {
    match arg {
      MoveDownBehaviorArg::Move => MoveDownBehavior::Move,
      MoveDownBehaviorArg::Drop => MoveDownBehavior::Drop,
    }
  }
}

// `default_value_t` needs `Display` to render the default in `--help`.
impl std::fmt::Display for MoveDownBehaviorArg {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      MoveDownBehaviorArg::Move => write!(f, "move"),
      MoveDownBehaviorArg::Drop => write!(f, "drop"),
    }
  }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum EvaluatorArg {
  Balanced,
  Survival,
  MakeTetrises,
  Multiplayer,
  Depressed,
}

impl From<EvaluatorArg> for Evaluator {
  fn from(arg: EvaluatorArg) -> Self {
    match arg {
      EvaluatorArg::Balanced => Evaluator::Balanced,
      EvaluatorArg::Survival => Evaluator::Survival,
      EvaluatorArg::MakeTetrises => Evaluator::MakeTetrises,
      EvaluatorArg::Multiplayer => Evaluator::Multiplayer,
      EvaluatorArg::Depressed => Evaluator::Depressed,
    }
  }
}

impl std::fmt::Display for EvaluatorArg {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      EvaluatorArg::Balanced => write!(f, "balanced"),
      EvaluatorArg::Survival => write!(f, "survival"),
      EvaluatorArg::MakeTetrises => write!(f, "make-tetrises"),
      EvaluatorArg::Multiplayer => write!(f, "multiplayer"),
      EvaluatorArg::Depressed => write!(f, "depressed"),
    }
  }
}

fn main() -> Result<()> {
  env_logger::init();
  let args = Args::parse();

  let options = GameOptions {
    rows: args.rows,
    cols: args.cols,
    starting_level: args.starting_level,
    search_depth: args.search_depth,
    search_width: args.search_width,
    workers: args.workers,
    move_speed: args.move_speed,
    move_down_behavior: args.move_down_behavior.into(),
    evaluator: args.evaluator.into(),
    bag_size: args.bag_size,
  };

  let system = System::new(options).context("invalid game options")?;
  let stats = system.run_headless(args.max_pieces);

  println!(
    "game over: {} lines cleared ({} single, {} double, {} triple, {} tetris)",
    stats.num_lines(),
    stats.singles(),
    stats.doubles(),
    stats.triples(),
    stats.tetrises(),
  );

  Ok(())
}
