use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};

use rand::RngCore;
use tetris_grid::{Block, Grid, PieceKind};
use tetris_state::GameState;

/// External collaborator producing the next piece kind, so `Game` doesn't
/// need to know whether it's talking to a real `tetris_pieces::PieceStream`
/// or a fixed sequence fed by a test.
pub trait PieceSource: Send + Sync {
  fn next(&self) -> PieceKind;
}

impl<R: RngCore + Send> PieceSource for tetris_pieces::PieceStream<R> {
  fn next(&self) -> PieceKind {
    tetris_pieces::PieceStream::next(self)
  }
}

/// Marshals a closure onto whatever thread owns the UI (or, headlessly,
/// just runs it inline). Grounded on
/// `original_source/QtTetris/QtMainThread.{h,cpp}`'s `invoke`.
pub trait MainThread: Send + Sync {
  fn post(&self, action: Box<dyn FnOnce() + Send>);
}

/// Runs posted actions immediately on the calling thread. Used by the
/// headless CLI and by tests, where there is no separate UI event loop to
/// marshal onto.
pub struct InlineMainThread;

impl MainThread for InlineMainThread {
  fn post(&self, action: Box<dyn FnOnce() + Send>) {
    action();
  }
}

pub trait Observer: Send + Sync {
  fn on_game_state_changed(&self, game: &Game);
  fn on_lines_cleared(&self, game: &Game, lines: u32);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
  Left,
  Right,
  Down,
}

impl Direction {
  fn delta(self) -> (i32, i32) {
    match self {
      Direction::Left => (0, -1),
      Direction::Right => (0, 1),
      Direction::Down => (1, 0),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveResult {
  Moved,
  Committed,
  NotMoved,
}

const MAX_LEVEL: u32 = 20;

struct Inner {
  active: Block,
  queue: VecDeque<PieceKind>,
  state: GameState,
  paused: bool,
  starting_level: u32,
  override_level: Option<u32>,
  piece_source: Arc<dyn PieceSource>,
  observers: Vec<Arc<dyn Observer>>,
  main_thread: Arc<dyn MainThread>,
  self_ref: Weak<Game>,
}

fn spawn_col(kind: PieceKind, cols: usize) -> i32 {
  let shape = tetris_grid::shape(kind, 0);
  (cols as i32 - shape.cols) / 2
}

impl Inner {
  fn pull_piece(&mut self) -> PieceKind {
    if self.queue.is_empty() {
      self.queue.push_back(self.piece_source.next());
    }
    self.queue.pop_front().unwrap()
  }

  fn spawn_next(&mut self) {
    let kind = self.pull_piece();
    let cols = self.state.grid().cols();
    self.active = Block::spawn(kind, spawn_col(kind, cols));
  }

  fn ensure_queue_len(&mut self, len: usize) {
    while self.queue.len() < len {
      self.queue.push_back(self.piece_source.next());
    }
  }
}

/// The single mutator of the active piece, piece queue and committed
/// `GameState`. `Gravity` and `BlockMover` drive play by calling its public
/// methods from their own timer threads; every method takes `&self` and
/// serializes on an internal mutex, so `Game` is shared as a plain `Arc`
/// rather than wrapped a second time by its callers.
pub struct Game {
  inner: Mutex<Inner>,
}

impl Game {
  pub fn new(
    rows: usize,
    cols: usize,
    starting_level: u32,
    piece_source: Arc<dyn PieceSource>,
    main_thread: Arc<dyn MainThread>,
  ) -> Arc<Self> {
    Arc::new_cyclic(|self_ref| {
      let mut inner = Inner {
        active: Block::spawn(PieceKind::O, 0),
        queue: VecDeque::new(),
        state: GameState::new(rows, cols),
        paused: false,
        starting_level,
        override_level: None,
        piece_source,
        observers: Vec::new(),
        main_thread,
        self_ref: self_ref.clone(),
      };
      inner.spawn_next();
      Self {
        inner: Mutex::new(inner),
      }
    })
  }

  pub fn register_observer(&self, observer: Arc<dyn Observer>) {
    self.inner.lock().unwrap().observers.push(observer);
  }

  pub fn active_block(&self) -> Block {
    self.inner.lock().unwrap().active
  }

  pub fn current_state(&self) -> GameState {
    self.inner.lock().unwrap().state.clone()
  }

  pub fn is_paused(&self) -> bool {
    self.inner.lock().unwrap().paused
  }

  pub fn set_paused(&self, paused: bool) {
    self.inner.lock().unwrap().paused = paused;
  }

  /// `startingLevel + totalLinesCleared / 10`, capped at the highest level
  /// `tetris_game::Gravity` has an interval for, unless an override level
  /// has been set.
  pub fn level(&self) -> u32 {
    let inner = self.inner.lock().unwrap();
    inner
      .override_level
      .unwrap_or_else(|| inner.starting_level + inner.state.stats().num_lines() / 10)
      .min(MAX_LEVEL)
  }

  pub fn set_override_level(&self, level: Option<u32>) {
    self.inner.lock().unwrap().override_level = level;
  }

  /// A snapshot of the next `count` piece kinds, pulling further ahead from
  /// the piece source to extend the queue if it's shorter than requested.
  /// Never advances the source beyond what ends up queued for real play, so
  /// a search reading this snapshot never disturbs what the player will
  /// actually be dealt.
  pub fn future_pieces(&self, count: usize) -> Vec<PieceKind> {
    let mut inner = self.inner.lock().unwrap();
    inner.ensure_queue_len(count);
    inner.queue.iter().take(count).copied().collect()
  }

  pub fn can_move(&self, dir: Direction) -> bool {
    let inner = self.inner.lock().unwrap();
    let (dr, dc) = dir.delta();
    let moved = inner.active.moved(dr, dc);
    inner.state.check_position_valid(&moved, moved.row, moved.col)
  }

  /// Moves the active block one cell in `dir`. A blocked `Down` commits the
  /// active block in place instead of failing; a blocked `Left`/`Right` is
  /// simply rejected.
  pub fn move_block(&self, dir: Direction) -> MoveResult {
    let landed = {
      let mut inner = self.inner.lock().unwrap();
      if inner.paused {
        return MoveResult::NotMoved;
      }
      let (dr, dc) = dir.delta();
      let moved = inner.active.moved(dr, dc);
      if inner.state.check_position_valid(&moved, moved.row, moved.col) {
        inner.active = moved;
        return MoveResult::Moved;
      }
      dir == Direction::Down
    };

    if !landed {
      return MoveResult::NotMoved;
    }

    self.commit_active();
    MoveResult::Committed
  }

  pub fn rotate(&self) -> MoveResult {
    let mut inner = self.inner.lock().unwrap();
    if inner.paused {
      return MoveResult::NotMoved;
    }
    let rotated = inner.active.rotate();
    if inner.state.check_position_valid(&rotated, rotated.row, rotated.col) {
      inner.active = rotated;
      MoveResult::Moved
    } else {
      MoveResult::NotMoved
    }
  }

  /// Moves the active block straight down as far as it will go, without
  /// committing it.
  pub fn drop_without_commit(&self) {
    let mut inner = self.inner.lock().unwrap();
    if inner.paused {
      return;
    }
    loop {
      let moved = inner.active.moved(1, 0);
      if inner.state.check_position_valid(&moved, moved.row, moved.col) {
        inner.active = moved;
      } else {
        break;
      }
    }
  }

  pub fn drop_and_commit(&self) {
    self.drop_without_commit();
    if self.inner.lock().unwrap().paused {
      return;
    }
    self.commit_active();
  }

  fn commit_active(&self) {
    let lines_cleared = {
      let mut inner = self.inner.lock().unwrap();
      let lines_before = inner.state.stats().num_lines();
      let active = inner.active;
      inner.state = inner.state.commit(active);
      inner.spawn_next();
      inner.state.stats().num_lines() - lines_before
    };

    log::debug!("committed piece, {lines_cleared} line(s) cleared");
    self.notify_state_changed();
    if lines_cleared > 0 {
      self.notify_lines_cleared(lines_cleared);
    }
  }

  /// Replaces the grid wholesale with `rows` of debris pushed in from the
  /// bottom, each with one random empty column, per spec.md's multiplayer
  /// penalty rule. Marks the game over if debris pushes an occupied cell
  /// into the top row.
  pub fn apply_line_penalty(&self, rows: u32, rng: &mut impl RngCore) {
    if rows == 0 {
      return;
    }
    use rand::Rng;

    let grid_after = {
      let inner = self.inner.lock().unwrap();
      let old_grid = inner.state.grid();
      let total_rows = old_grid.rows();
      let cols = old_grid.cols();
      let shift = (rows as usize).min(total_rows);

      let mut new_grid = Grid::new(total_rows, cols);
      for row in 0..(total_rows - shift) {
        for col in 0..cols {
          new_grid.set(row, col, old_grid.get(row + shift, col));
        }
      }
      for i in 0..shift {
        let row = total_rows - shift + i;
        let hole = rng.random_range(0..cols);
        for col in 0..cols {
          let cell = if col == hole {
            tetris_grid::Cell::Empty
          } else {
            tetris_grid::Cell::Block(PieceKind::O)
          };
          new_grid.set(row, col, cell);
        }
      }
      new_grid
    };

    let top_row_occupied = (0..grid_after.cols()).any(|col| !grid_after.get(0, col).is_empty());

    {
      let mut inner = self.inner.lock().unwrap();
      let mut next_state = inner.state.set_grid(grid_after);
      if top_row_occupied {
        log::warn!("line penalty of {rows} row(s) overflowed the top row, ending the game");
        next_state = next_state.with_game_over();
      }
      inner.state = next_state;
    }

    self.notify_state_changed();
  }

  fn notify_state_changed(&self) {
    let (main_thread, observers, game) = {
      let inner = self.inner.lock().unwrap();
      let Some(game) = inner.self_ref.upgrade() else {
        return;
      };
      (Arc::clone(&inner.main_thread), inner.observers.clone(), game)
    };
    if observers.is_empty() {
      return;
    }
    main_thread.post(Box::new(move || {
      for observer in &observers {
        observer.on_game_state_changed(&game);
      }
    }));
  }

  fn notify_lines_cleared(&self, lines: u32) {
    let (main_thread, observers, game) = {
      let inner = self.inner.lock().unwrap();
      let Some(game) = inner.self_ref.upgrade() else {
        return;
      };
      (Arc::clone(&inner.main_thread), inner.observers.clone(), game)
    };
    if observers.is_empty() {
      return;
    }
    main_thread.post(Box::new(move || {
      for observer in &observers {
        observer.on_lines_cleared(&game, lines);
      }
    }));
  }
}
