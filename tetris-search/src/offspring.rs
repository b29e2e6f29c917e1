use tetris_eval::Evaluator;
use tetris_grid::{Block, PieceKind};
use tetris_state::GameState;
use tetris_workers::CancelToken;

/// One candidate child produced by dropping a piece onto a parent state.
pub struct Candidate {
  pub block: Block,
  pub state: GameState,
  pub score: i32,
}

fn spawn_column(kind: PieceKind, cols: usize) -> i32 {
  let shape = tetris_grid::shape(kind, 0);
  (cols as i32 - shape.cols) / 2
}

/// Enumerates every legal final placement of `kind` dropped onto `parent`,
/// scores each with `evaluator`, and returns the top `width` ordered by
/// descending score, ties broken by ascending placement id.
///
/// If the piece cannot fit at its spawn position, returns a single
/// game-over candidate instead of enumerating placements and stops, per
/// `NodeCalculator`'s first algorithm step. Checks `cancel` once per
/// rotation and once per column -- the enumeration's yield points.
pub fn generate(
  parent: &GameState,
  kind: PieceKind,
  evaluator: &Evaluator,
  width: usize,
  cancel: &CancelToken,
) -> Vec<Candidate> {
  let cols = parent.grid().cols();
  let spawn_col = spawn_column(kind, cols);
  let spawn = Block::spawn(kind, spawn_col);

  if !parent.check_position_valid(&spawn, 0, spawn_col) {
    let state = parent.commit(spawn);
    let score = evaluator.evaluate(&state);
    return vec![Candidate {
      block: spawn,
      state,
      score,
    }];
  }

  let mut candidates = Vec::new();
  for rotation in 0..tetris_grid::rotation_count(kind) {
    if cancel.is_cancelled() {
      break;
    }
    let shape = tetris_grid::shape(kind, rotation);
    let max_col = cols as i32 - shape.cols;
    if max_col < 0 {
      continue;
    }
    for col in 0..=max_col {
      if cancel.is_cancelled() {
        break;
      }
      let top = Block::new(kind, rotation, 0, col);
      if !parent.check_position_valid(&top, 0, col) {
        continue;
      }
      let mut row = 0;
      loop {
        let next = row + 1;
        let lower = Block::new(kind, rotation, next, col);
        if parent.check_position_valid(&lower, next, col) {
          row = next;
        } else {
          break;
        }
      }
      let block = Block::new(kind, rotation, row, col);
      let state = parent.commit(block);
      let score = evaluator.evaluate(&state);
      candidates.push(Candidate { block, state, score });
    }
  }

  candidates.sort_by(|a, b| {
    b.score
      .cmp(&a.score)
      .then_with(|| a.block.placement_id().cmp(&b.block.placement_id()))
  });
  candidates.truncate(width);
  candidates
}
