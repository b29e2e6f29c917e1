//! A deterministic bag-shuffle generator producing an unbounded sequence of
//! piece kinds.

use std::sync::Mutex;

use rand::seq::SliceRandom;
use rand::RngCore;
use tetris_grid::PieceKind;

struct Inner<R> {
  bag: Vec<PieceKind>,
  index: usize,
  bag_size: usize,
  rng: R,
}

impl<R: RngCore> Inner<R> {
  fn refill(&mut self) {
    self.bag.clear();
    for kind in PieceKind::ALL {
      for _ in 0..self.bag_size {
        self.bag.push(kind);
      }
    }
    self.bag.shuffle(&mut self.rng);
    self.index = 0;
  }

  fn next(&mut self) -> PieceKind {
    if self.index == self.bag.len() {
      self.refill();
    }
    let kind = self.bag[self.index];
    self.index += 1;
    kind
  }
}

/// Produces piece kinds using an "N-bag" policy: a permutation containing
/// `bag_size` copies of each of the seven kinds is shuffled, consumed in
/// order, then reshuffled on exhaustion. `next()` is atomic with respect to
/// concurrent callers: the index (and, on wrap, the bag) update is
/// serialized behind a mutex.
pub struct PieceStream<R> {
  inner: Mutex<Inner<R>>,
}

impl<R: RngCore> PieceStream<R> {
  pub fn new(rng: R, bag_size: usize) -> Self {
    assert!(bag_size > 0, "bag_size must be positive");
    let mut inner = Inner {
      bag: Vec::with_capacity(bag_size * 7),
      index: 0,
      bag_size,
      rng,
    };
    inner.refill();
    Self {
      inner: Mutex::new(inner),
    }
  }

  pub fn next(&self) -> PieceKind {
    self.inner.lock().unwrap().next()
  }

  /// Pulls `n` pieces in order, for handing a look-ahead window to the AI
  /// without otherwise disturbing the stream.
  pub fn take(&self, n: usize) -> Vec<PieceKind> {
    (0..n).map(|_| self.next()).collect()
  }
}
