//! Wires every member crate into one running game: `Game` for state, a
//! `Gravity`/`BlockMover` pair driving play in real time, and a background
//! loop that repeatedly runs `NodeCalculator` against the game's own
//! future-piece queue and feeds its result to `PrecomputedMoves`.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use tetris_eval::Evaluator;
use tetris_game::{BlockMover, Game, Gravity, InlineMainThread, MoveDownBehavior, Observer, PieceSource, PrecomputedMoves};
use tetris_pieces::PieceStream;
use tetris_search::{NodeCalculator, Status as SearchStatus};
use tetris_workers::{Worker, WorkerPool};

/// Keeps `Gravity`'s tick interval in step with `Game::level` as lines
/// clear, so the per-level speedup table actually takes effect during play
/// instead of only applying at the starting level.
struct LevelSync {
  gravity: Arc<Gravity>,
}

impl Observer for LevelSync {
  fn on_game_state_changed(&self, game: &Game) {
    self.gravity.set_level(game.level());
  }

  fn on_lines_cleared(&self, _game: &Game, _lines: u32) {}
}

/// Validated configuration for one `System`. Constructed via `new`, which
/// rejects the same degenerate shapes `NodeCalculator::new` would.
#[derive(Clone, Debug)]
pub struct GameOptions {
  pub rows: usize,
  pub cols: usize,
  pub starting_level: u32,
  pub search_depth: u32,
  pub search_width: u32,
  pub workers: usize,
  pub move_speed: f64,
  pub move_down_behavior: MoveDownBehavior,
  pub evaluator: Evaluator,
  pub bag_size: usize,
}

impl Default for GameOptions {
  fn default() -> Self {
    Self {
      rows: 20,
      cols: 10,
      starting_level: 0,
      search_depth: 4,
      search_width: 4,
      workers: 4,
      move_speed: 20.0,
      move_down_behavior: MoveDownBehavior::Drop,
      evaluator: Evaluator::Balanced,
      bag_size: 1,
    }
  }
}

#[derive(Debug)]
pub enum SystemError {
  ZeroSearchDepth,
  ZeroSearchWidth,
  ZeroWorkers,
}

impl std::fmt::Display for SystemError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SystemError::ZeroSearchDepth => write!(f, "search depth must be at least 1"),
      SystemError::ZeroSearchWidth => write!(f, "search width must be at least 1"),
      SystemError::ZeroWorkers => write!(f, "worker pool must have at least 1 worker"),
    }
  }
}

impl std::error::Error for SystemError {}

/// The single running instance: a `Game`, its real-time drivers, and the
/// search engine that keeps `PrecomputedMoves` supplied.
pub struct System {
  pub game: Arc<Game>,
  pub moves: Arc<PrecomputedMoves>,
  options: GameOptions,
  pool: Arc<WorkerPool>,
  main_worker: Arc<Worker>,
  _gravity: Arc<Gravity>,
  _block_mover: BlockMover,
}

impl System {
  pub fn new(options: GameOptions) -> Result<Arc<Self>, SystemError> {
    if options.search_depth == 0 {
      return Err(SystemError::ZeroSearchDepth);
    }
    if options.search_width == 0 {
      return Err(SystemError::ZeroSearchWidth);
    }
    if options.workers == 0 {
      return Err(SystemError::ZeroWorkers);
    }

    let piece_source: Arc<dyn PieceSource> = Arc::new(PieceStream::new(SmallRng::from_os_rng(), options.bag_size));
    let game = Game::new(
      options.rows,
      options.cols,
      options.starting_level,
      piece_source,
      Arc::new(InlineMainThread),
    );
    let moves = Arc::new(PrecomputedMoves::new());
    let pool = Arc::new(WorkerPool::new(options.workers));
    let main_worker = Arc::new(Worker::new());

    let gravity = Arc::new(Gravity::start(Arc::clone(&game), options.starting_level));
    game.register_observer(Arc::new(LevelSync {
      gravity: Arc::clone(&gravity),
    }));
    let block_mover = BlockMover::start(
      Arc::clone(&game),
      Arc::clone(&moves),
      options.move_speed,
      options.move_down_behavior,
    );

    Ok(Arc::new(Self {
      game,
      moves,
      options,
      pool,
      main_worker,
      _gravity: gravity,
      _block_mover: block_mover,
    }))
  }

  /// Runs one iterative-deepening search rooted at the game's current
  /// state and, if the game hasn't moved on while the search ran, replaces
  /// the precomputed-moves queue with its result.
  ///
  /// The snapshot guard: the root id captured before the search is
  /// compared against the game's committed id once the search finishes.
  /// `Gravity` can commit the active piece out from under a slow search
  /// (or a slow `BlockMover`), in which case the result no longer applies
  /// to any reachable state and is discarded rather than fed to the
  /// player.
  pub fn run_search_once(&self) -> SearchStatus {
    let root_id = self.game.current_state().id();
    let root_state = self.game.current_state();
    let pieces = self.game.future_pieces(self.options.search_depth as usize);
    let widths = vec![self.options.search_width; pieces.len()];

    let calculator = match NodeCalculator::new(
      root_state,
      pieces,
      widths,
      self.options.evaluator.clone(),
      Arc::clone(&self.main_worker),
      Arc::clone(&self.pool),
    ) {
      Ok(calculator) => calculator,
      Err(err) => {
        log::error!("refusing to start a search: {err}");
        return SearchStatus::Error;
      }
    };

    calculator.start();
    while !matches!(
      calculator.status(),
      SearchStatus::Finished | SearchStatus::Stopped | SearchStatus::Error
    ) {
      std::thread::sleep(Duration::from_millis(1));
    }

    let status = calculator.status();
    if status != SearchStatus::Finished {
      log::warn!("search ended as {status:?}, not applying its result");
      return status;
    }

    if self.game.current_state().id() != root_id {
      log::warn!("discarding a stale search result: the game moved on while searching");
      return status;
    }

    self.moves.replace_line(calculator.result());
    status
  }

  /// Drives the game headlessly: repeatedly searches, applies the result,
  /// and waits for `BlockMover` to drain it, until `is_game_over` or
  /// `max_commits` pieces have been committed.
  pub fn run_headless(&self, max_commits: Option<u32>) -> tetris_state::GameStateStats {
    let mut commits = 0u32;
    loop {
      if self.game.current_state().is_game_over() {
        break;
      }
      if let Some(max) = max_commits {
        if commits >= max {
          break;
        }
      }

      let before_id = self.game.current_state().id();
      self.run_search_once();

      while self.game.current_state().id() == before_id && !self.game.current_state().is_game_over() {
        std::thread::sleep(Duration::from_millis(1));
      }
      commits += 1;
      log::info!(
        "committed piece {commits}, id={}, score={}",
        self.game.current_state().id(),
        self.game.current_state().score()
      );
    }
    self.game.current_state().stats().clone()
  }
}
