//! Live play: the `Game` mutation façade, the `Gravity` and `BlockMover`
//! timers that drive it, the `Observer`/`MainThread` notification glue, and
//! the `PrecomputedMoves` buffer the AI's results flow through.

mod block_mover;
mod game;
mod gravity;
mod precomputed_moves;
mod timer;

pub use block_mover::{BlockMover, MoveDownBehavior};
pub use game::{Direction, Game, InlineMainThread, MainThread, MoveResult, Observer, PieceSource};
pub use gravity::Gravity;
pub use precomputed_moves::PrecomputedMoves;

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::{Arc, Mutex};
  use std::time::{Duration, Instant};

  use rand::rngs::SmallRng;
  use rand::SeedableRng;
  use tetris_pieces::PieceStream;

  fn wait_for<F: Fn() -> bool>(predicate: F) {
    let start = Instant::now();
    while !predicate() {
      assert!(start.elapsed() < Duration::from_secs(5), "timed out waiting");
      std::thread::sleep(Duration::from_millis(1));
    }
  }

  fn new_game(rows: usize, cols: usize) -> Arc<Game> {
    let source: Arc<dyn PieceSource> = Arc::new(PieceStream::new(SmallRng::seed_from_u64(1), 1));
    Game::new(rows, cols, 0, source, Arc::new(InlineMainThread))
  }

  #[test]
  fn moving_left_and_right_stays_in_bounds() {
    let game = new_game(20, 10);
    let start_col = game.active_block().col;
    assert_eq!(game.move_block(Direction::Left), MoveResult::Moved);
    assert_eq!(game.active_block().col, start_col - 1);
    assert_eq!(game.move_block(Direction::Right), MoveResult::Moved);
    assert_eq!(game.active_block().col, start_col);
  }

  #[test]
  fn dropping_all_the_way_down_commits_on_the_next_down_move() {
    let game = new_game(4, 4);
    game.drop_without_commit();
    let before_id = game.current_state().id();
    assert_eq!(game.move_block(Direction::Down), MoveResult::Committed);
    assert_eq!(game.current_state().id(), before_id + 1);
  }

  #[test]
  fn future_pieces_extends_the_queue_without_consuming_it_twice() {
    let game = new_game(20, 10);
    let first = game.future_pieces(5);
    let second = game.future_pieces(5);
    assert_eq!(first, second);
  }

  #[derive(Default)]
  struct CountingObserver {
    state_changes: AtomicU32,
    lines: Mutex<Vec<u32>>,
  }

  impl Observer for CountingObserver {
    fn on_game_state_changed(&self, _game: &Game) {
      self.state_changes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_lines_cleared(&self, _game: &Game, lines: u32) {
      self.lines.lock().unwrap().push(lines);
    }
  }

  #[test]
  fn observer_is_notified_when_the_active_piece_commits() {
    let game = new_game(4, 4);
    let observer = Arc::new(CountingObserver::default());
    game.register_observer(observer.clone());

    game.drop_without_commit();
    game.move_block(Direction::Down);
    assert!(observer.state_changes.load(Ordering::SeqCst) >= 1);
  }

  struct AlwaysO;

  impl PieceSource for AlwaysO {
    fn next(&self) -> tetris_grid::PieceKind {
      tetris_grid::PieceKind::O
    }
  }

  #[test]
  fn observer_is_notified_of_line_clears() {
    // A 2-row board: two O pieces side by side exactly fill it.
    let game = Game::new(2, 4, 0, Arc::new(AlwaysO), Arc::new(InlineMainThread));
    let observer = Arc::new(CountingObserver::default());
    game.register_observer(observer.clone());
    let moves = Arc::new(PrecomputedMoves::new());

    let left = game
      .current_state()
      .commit(tetris_grid::Block::new(tetris_grid::PieceKind::O, 0, 0, 0));
    moves.push_line(vec![left]);
    let mover = BlockMover::start(Arc::clone(&game), Arc::clone(&moves), 200.0, MoveDownBehavior::Drop);
    wait_for(|| moves.is_empty());

    let right = game
      .current_state()
      .commit(tetris_grid::Block::new(tetris_grid::PieceKind::O, 0, 0, 2));
    moves.push_line(vec![right]);
    wait_for(|| moves.is_empty());
    drop(mover);

    assert_eq!(observer.lines.lock().unwrap().as_slice(), &[2]);
  }

  #[test]
  fn apply_line_penalty_pushes_debris_in_from_the_bottom() {
    let game = new_game(20, 10);
    let mut rng = SmallRng::seed_from_u64(3);
    game.apply_line_penalty(2, &mut rng);
    let grid = game.current_state().grid().clone();
    assert!(!grid.get(19, 0).is_empty() || !grid.get(19, 1).is_empty());
  }

  #[test]
  fn apply_line_penalty_zero_rows_is_a_noop() {
    let game = new_game(20, 10);
    let before = game.current_state().grid().clone();
    let mut rng = SmallRng::seed_from_u64(3);
    game.apply_line_penalty(0, &mut rng);
    assert_eq!(game.current_state().grid(), &before);
  }

  #[test]
  fn precomputed_moves_drive_block_mover_to_the_target_column() {
    let game = new_game(20, 10);
    let moves = Arc::new(PrecomputedMoves::new());
    let target_block = tetris_grid::Block::new(tetris_grid::PieceKind::O, 0, 18, 0);
    let target_state = game.current_state().commit(target_block);
    moves.push_line(vec![target_state]);

    let _mover = BlockMover::start(Arc::clone(&game), Arc::clone(&moves), 200.0, MoveDownBehavior::Drop);
    wait_for(|| moves.is_empty());
    assert_eq!(game.current_state().original_block().col, 0);
  }

  #[test]
  fn gravity_moves_the_active_piece_down_over_time() {
    let game = new_game(20, 10);
    let start_row = game.active_block().row;
    let gravity = Gravity::start(Arc::clone(&game), 20);
    wait_for(|| game.active_block().row > start_row || game.current_state().id() > 0);
    drop(gravity);
  }
}
