//! A tiny transactional cell for cross-thread state that is read and
//! written far more often than it is contended: the AI's levels registry,
//! the precomputed-moves buffer, and live search parameters.

use std::sync::{Condvar, Mutex};

/// A `Mutex`-backed cell exposing `read`/`mutate` closures instead of guard
/// objects, so callers never hold a lock across a yield point by accident.
///
/// There is no compare-and-set retry loop here: a single process has no
/// contention that a mutex doesn't already resolve, so `mutate` always runs
/// its closure exactly once under exclusive access.
pub struct SharedCell<T> {
  value: Mutex<T>,
  changed: Condvar,
}

impl<T> SharedCell<T> {
  pub fn new(value: T) -> Self {
    Self {
      value: Mutex::new(value),
      changed: Condvar::new(),
    }
  }

  pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
    let guard = self.value.lock().unwrap();
    f(&guard)
  }

  pub fn mutate<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
    let mut guard = self.value.lock().unwrap();
    let result = f(&mut guard);
    self.changed.notify_all();
    result
  }

  /// Blocks until `pred` holds, re-checking it each time the cell changes.
  pub fn wait_until(&self, mut pred: impl FnMut(&T) -> bool) {
    let guard = self.value.lock().unwrap();
    let _guard = self
      .changed
      .wait_while(guard, |value| !pred(value))
      .unwrap();
  }

  pub fn into_inner(self) -> T {
    self.value.into_inner().unwrap()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;
  use std::thread;

  #[test]
  fn read_mutate_round_trip() {
    let cell = SharedCell::new(0);
    cell.mutate(|v| *v += 1);
    assert_eq!(cell.read(|v| *v), 1);
  }

  #[test]
  fn wait_until_observes_other_thread_mutation() {
    let cell = Arc::new(SharedCell::new(false));
    let writer = Arc::clone(&cell);
    let handle = thread::spawn(move || {
      writer.mutate(|v| *v = true);
    });
    cell.wait_until(|v| *v);
    handle.join().unwrap();
    assert!(cell.read(|v| *v));
  }
}
