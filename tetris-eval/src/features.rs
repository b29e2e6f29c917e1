use tetris_state::GameState;

/// Raw, evaluator-independent measurements of a `GameState`, computed once
/// per `evaluate` call.
pub struct Features {
  pub game_height: i32,
  pub last_block_height: i32,
  pub num_holes: i32,
  pub num_singles: i32,
  pub num_doubles: i32,
  pub num_triples: i32,
  pub num_tetrises: i32,
}

impl Features {
  pub fn compute(state: &GameState) -> Self {
    let grid = state.grid();
    let rows = grid.rows() as i32;

    // A hole is an empty cell whose upper neighbour is non-empty.
    let mut num_holes = 0;
    for col in 0..grid.cols() {
      for row in 1..grid.rows() {
        if grid.get(row, col).is_empty() && !grid.get(row - 1, col).is_empty() {
          num_holes += 1;
        }
      }
    }

    let stats = state.stats();
    Self {
      game_height: rows - state.first_occupied_row() as i32,
      last_block_height: rows - state.original_block().row,
      num_holes,
      num_singles: stats.singles() as i32,
      num_doubles: stats.doubles() as i32,
      num_triples: stats.triples() as i32,
      num_tetrises: stats.tetrises() as i32,
    }
  }
}
