use std::sync::Arc;
use std::time::Duration;

use crate::game::{Direction, Game};
use crate::timer::Timer;

/// Per-level drop interval in milliseconds, levels 0 through 20. Taken
/// directly from `original_source/TetrisCore/src/Gravity.cpp`'s table; it
/// has no entry past level 20, so `interval_for_level` clamps.
const LEVEL_INTERVALS_MS: [u64; 21] = [
  887, 820, 753, 686, 619, 552, 469, 368, 285, 184, 167, 151, 134, 117, 100, 100, 84, 84, 67, 67, 50,
];

fn interval_for_level(level: u32) -> Duration {
  let idx = (level as usize).min(LEVEL_INTERVALS_MS.len() - 1);
  Duration::from_millis(LEVEL_INTERVALS_MS[idx])
}

/// Drives `Game::move_block(Down)` on a timer whose interval tracks the
/// game's current level. `set_level` updates the interval immediately
/// rather than waiting out whatever tick is already pending.
pub struct Gravity {
  timer: Timer,
}

impl Gravity {
  pub fn start(game: Arc<Game>, starting_level: u32) -> Self {
    let interval = interval_for_level(starting_level);
    let timer = Timer::start(interval, move || {
      if game.current_state().is_game_over() {
        return;
      }
      game.move_block(Direction::Down);
    });
    Self { timer }
  }

  pub fn set_level(&self, level: u32) {
    self.timer.set_interval(interval_for_level(level));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn interval_clamps_past_level_twenty() {
    assert_eq!(interval_for_level(20), interval_for_level(37));
  }

  #[test]
  fn higher_levels_fall_faster() {
    assert!(interval_for_level(5) > interval_for_level(15));
  }

  #[test]
  fn level_zero_to_one_drops_the_interval_by_67ms() {
    assert_eq!(interval_for_level(0), Duration::from_millis(887));
    assert_eq!(interval_for_level(1), Duration::from_millis(820));
  }
}
