//! Scenario: gravity level transition. Clearing lines to push the running
//! total from 9 to 10 should move `Game::level` from 0 to 1, and a
//! `Gravity` kept in step by an observer should speed up accordingly.

use std::sync::Arc;

use tetris_game::{Direction, Game, Gravity, InlineMainThread, MoveResult, Observer, PieceSource};
use tetris_grid::PieceKind;

struct AlwaysI;

impl PieceSource for AlwaysI {
  fn next(&self) -> PieceKind {
    PieceKind::I
  }
}

struct LevelSync {
  gravity: Arc<Gravity>,
}

impl Observer for LevelSync {
  fn on_game_state_changed(&self, game: &Game) {
    self.gravity.set_level(game.level());
  }

  fn on_lines_cleared(&self, _game: &Game, _lines: u32) {}
}

#[test]
fn ten_cleared_lines_advance_the_level_and_speed_up_gravity() {
  // A 4-wide board: one horizontal I fills (and instantly clears) its whole
  // row in a single commit, so ten commits clear exactly ten lines.
  let game = Game::new(20, 4, 0, Arc::new(AlwaysI), Arc::new(InlineMainThread));
  let gravity = Arc::new(Gravity::start(Arc::clone(&game), 0));
  game.register_observer(Arc::new(LevelSync {
    gravity: Arc::clone(&gravity),
  }));

  for _ in 0..9 {
    game.drop_without_commit();
    assert_eq!(game.move_block(Direction::Down), MoveResult::Committed);
  }
  assert_eq!(game.current_state().stats().num_lines(), 9);
  assert_eq!(game.level(), 0);

  game.drop_without_commit();
  assert_eq!(game.move_block(Direction::Down), MoveResult::Committed);
  assert_eq!(game.current_state().stats().num_lines(), 10);
  assert_eq!(game.level(), 1);

  drop(gravity);
}
