use tetris_grid::{Block, Cell, Grid};

use crate::GameStateStats;

/// A committed playing field plus statistics. Never mutated in place after
/// construction, except the `set_grid` penalty path, which atomically swaps
/// in a new grid. `commit` is a pure function: equal inputs produce equal
/// outputs and have no observable side effect.
#[derive(Clone, Debug)]
pub struct GameState {
  grid: Grid,
  original_block: Block,
  game_over: bool,
  first_occupied_row: usize,
  stats: GameStateStats,
  id: u64,
  tainted: bool,
}

impl GameState {
  /// An empty grid, empty stats, not game over, `id = 0`.
  pub fn new(rows: usize, cols: usize) -> Self {
    let grid = Grid::new(rows, cols);
    let first_occupied_row = grid.first_occupied_row();
    Self {
      grid,
      original_block: Block::new(tetris_grid::PieceKind::O, 0, 0, 0),
      game_over: false,
      first_occupied_row,
      stats: GameStateStats::default(),
      id: 0,
      tainted: false,
    }
  }

  pub fn grid(&self) -> &Grid {
    &self.grid
  }

  pub fn original_block(&self) -> Block {
    self.original_block
  }

  pub fn is_game_over(&self) -> bool {
    self.game_over
  }

  pub fn first_occupied_row(&self) -> usize {
    self.first_occupied_row
  }

  pub fn stats(&self) -> &GameStateStats {
    &self.stats
  }

  pub fn id(&self) -> u64 {
    self.id
  }

  pub fn tainted(&self) -> bool {
    self.tainted
  }

  /// True when every non-empty cell of `block`'s shape, placed at
  /// `(row, col)`, falls inside the grid and overlaps no occupied cell.
  ///
  /// Fast path: if the block's bounding box is entirely above the first
  /// occupied row, it cannot possibly collide, so we skip the per-cell scan.
  pub fn check_position_valid(&self, block: &Block, row: i32, col: i32) -> bool {
    let shape = block.shape();
    if row + shape.rows < self.first_occupied_row as i32 {
      return true;
    }
    shape.offsets.iter().all(|&(dr, dc)| {
      let r = row + dr;
      let c = col + dc;
      self.grid.in_bounds(r, c) && self.grid.get(r as usize, c as usize).is_empty()
    })
  }

  /// Solidifies `block` into a copy of the grid and clears full rows, or
  /// marks the result game-over without solidifying anything if `block` is
  /// still at row 0 and already collides there (the freshly spawned piece
  /// had nowhere to go).
  pub fn commit(&self, block: Block) -> GameState {
    let id = self.id + 1;

    if block.row == 0 && !self.check_position_valid(&block, block.row, block.col) {
      return GameState {
        grid: self.grid.clone(),
        original_block: block,
        game_over: true,
        first_occupied_row: self.first_occupied_row,
        stats: self.stats,
        id,
        tainted: false,
      };
    }

    let mut grid = self.grid.clone();
    let cell = Cell::from(block.kind);
    for &(dr, dc) in block.shape().offsets {
      grid.set((block.row + dr) as usize, (block.col + dc) as usize, cell);
    }
    let cleared = grid.clear_full_rows();

    let mut stats = self.stats;
    stats.record_clear(cleared);

    let first_occupied_row = grid.first_occupied_row();
    GameState {
      grid,
      original_block: block,
      game_over: false,
      first_occupied_row,
      stats,
      id,
      tainted: false,
    }
  }

  /// Replaces the grid wholesale (multiplayer penalty rows). Does not touch
  /// stats or id; marks the result `tainted`.
  pub fn set_grid(&self, grid: Grid) -> GameState {
    let first_occupied_row = grid.first_occupied_row();
    GameState {
      grid,
      original_block: self.original_block,
      game_over: self.game_over,
      first_occupied_row,
      stats: self.stats,
      id: self.id,
      tainted: true,
    }
  }

  /// Marks the state game-over outside of a normal `commit`, for the
  /// penalty-row path where debris pushed in from the bottom overflows the
  /// top of the grid.
  pub fn with_game_over(&self) -> GameState {
    GameState {
      game_over: true,
      ..self.clone()
    }
  }

  pub fn score(&self) -> i64 {
    40 * self.stats.singles() as i64
      + 100 * self.stats.doubles() as i64
      + 300 * self.stats.triples() as i64
      + 1200 * self.stats.tetrises() as i64
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tetris_grid::PieceKind;

  #[test]
  fn commit_increments_id_and_is_pure() {
    let state = GameState::new(20, 10);
    let block = Block::new(PieceKind::O, 0, 18, 4);
    let a = state.commit(block);
    let b = state.commit(block);
    assert_eq!(a.id(), state.id() + 1);
    assert_eq!(a.id(), b.id());
    assert_eq!(a.score(), b.score());
    assert_eq!(a.grid(), b.grid());
  }

  #[test]
  fn commit_at_row_zero_colliding_is_game_over_without_solidifying() {
    // A 4-wide board means a 2x2 O piece never completes a row, so the
    // first commit sticks around to block the second.
    let state = GameState::new(4, 4).commit(Block::new(PieceKind::O, 0, 0, 0));
    let grid_before = state.grid().clone();
    let spawn = Block::new(PieceKind::O, 0, 0, 0);
    let after = state.commit(spawn);
    assert!(after.is_game_over());
    assert_eq!(after.grid(), &grid_before);
  }

  #[test]
  fn first_occupied_row_matches_the_grid() {
    let state = GameState::new(20, 10);
    assert_eq!(state.first_occupied_row(), 20);
    let committed = state.commit(Block::new(PieceKind::O, 0, 18, 4));
    assert_eq!(committed.first_occupied_row(), committed.grid().first_occupied_row());
  }

  #[test]
  fn set_grid_marks_tainted_and_preserves_stats_and_id() {
    let state = GameState::new(20, 10).commit(Block::new(PieceKind::O, 0, 18, 4));
    let penalty_grid = tetris_grid::Grid::new(20, 10);
    let tainted = state.set_grid(penalty_grid);
    assert!(tainted.tainted());
    assert_eq!(tainted.id(), state.id());
    assert_eq!(tainted.stats(), state.stats());
  }
}
