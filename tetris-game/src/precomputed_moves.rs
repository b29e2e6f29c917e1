use tetris_state::GameState;
use tetris_sync::SharedCell;

/// A FIFO of `GameState`s representing the placements the AI has chosen for
/// the upcoming pieces, one per committed piece. `BlockMover` drains the
/// front of the queue to steer the active piece toward each target in turn;
/// the search side replaces or extends the tail as fresh results arrive.
pub struct PrecomputedMoves {
  cell: SharedCell<std::collections::VecDeque<GameState>>,
}

impl PrecomputedMoves {
  pub fn new() -> Self {
    Self {
      cell: SharedCell::new(std::collections::VecDeque::new()),
    }
  }

  pub fn push_line(&self, line: Vec<GameState>) {
    self.cell.mutate(|queue| queue.extend(line));
  }

  /// Replaces whatever's queued with a freshly recomputed line, used when a
  /// deeper search result supersedes a shallower one still in flight.
  pub fn replace_line(&self, line: Vec<GameState>) {
    self.cell.mutate(|queue| {
      queue.clear();
      queue.extend(line);
    });
  }

  pub fn pop_front(&self) -> Option<GameState> {
    self.cell.mutate(|queue| queue.pop_front())
  }

  pub fn peek_front(&self) -> Option<GameState> {
    self.cell.read(|queue| queue.front().cloned())
  }

  pub fn len(&self) -> usize {
    self.cell.read(|queue| queue.len())
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Default for PrecomputedMoves {
  fn default() -> Self {
    Self::new()
  }
}
