use std::sync::Arc;
use std::time::Duration;

use crate::game::{Direction, Game, MoveResult};
use crate::precomputed_moves::PrecomputedMoves;
use crate::timer::Timer;

/// How `BlockMover` finishes a piece once it's aligned with its target
/// column and rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDownBehavior {
  /// Step down one row per tick, same as gravity would.
  Move,
  /// Hard drop and commit immediately once aligned.
  Drop,
}

/// Steers the active piece toward the front of a `PrecomputedMoves` queue:
/// rotate first if the rotation doesn't match, then move horizontally
/// toward the target column, then descend. If a rotate or horizontal move
/// is blocked, force a hard drop rather than get stuck abandoning the
/// piece where it stands.
pub struct BlockMover {
  timer: Timer,
}

impl BlockMover {
  pub fn start(
    game: Arc<Game>,
    moves: Arc<PrecomputedMoves>,
    moves_per_second: f64,
    behavior: MoveDownBehavior,
  ) -> Self {
    let interval = interval_for_speed(moves_per_second);
    let timer = Timer::start(interval, move || {
      Self::tick(&game, &moves, behavior);
    });
    Self { timer }
  }

  pub fn set_speed(&self, moves_per_second: f64) {
    self.timer.set_interval(interval_for_speed(moves_per_second));
  }

  fn tick(game: &Game, moves: &PrecomputedMoves, behavior: MoveDownBehavior) {
    if game.current_state().is_game_over() {
      return;
    }
    let Some(target_state) = moves.peek_front() else {
      return;
    };
    let target = target_state.original_block();
    let active = game.active_block();

    if active.rotation != target.rotation {
      if matches!(game.rotate(), MoveResult::NotMoved) {
        game.drop_and_commit();
        moves.pop_front();
      }
      return;
    }

    if active.col != target.col {
      let dir = if active.col < target.col {
        Direction::Right
      } else {
        Direction::Left
      };
      if matches!(game.move_block(dir), MoveResult::NotMoved) {
        game.drop_and_commit();
        moves.pop_front();
      }
      return;
    }

    match behavior {
      MoveDownBehavior::Drop => {
        game.drop_and_commit();
        moves.pop_front();
      }
      MoveDownBehavior::Move => {
        if matches!(game.move_block(Direction::Down), MoveResult::Committed) {
          moves.pop_front();
        }
      }
    }
  }
}

fn interval_for_speed(moves_per_second: f64) -> Duration {
  Duration::from_secs_f64(1.0 / moves_per_second.max(0.1))
}
