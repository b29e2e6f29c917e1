/// Counts of cleared lines by size, plus the running total. Monotonically
/// non-decreasing across a commit chain (spec invariant (c)).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GameStateStats {
  singles: u32,
  doubles: u32,
  triples: u32,
  tetrises: u32,
  lines: u32,
}

impl GameStateStats {
  pub fn singles(&self) -> u32 {
    self.singles
  }

  pub fn doubles(&self) -> u32 {
    self.doubles
  }

  pub fn triples(&self) -> u32 {
    self.triples
  }

  pub fn tetrises(&self) -> u32 {
    self.tetrises
  }

  pub fn num_lines(&self) -> u32 {
    self.lines
  }

  /// Records a commit that cleared `n` rows (0 is a no-op).
  pub fn record_clear(&mut self, n: u32) {
    match n {
      0 => {}
      1 => self.singles += 1,
      2 => self.doubles += 1,
      3 => self.triples += 1,
      _ => self.tetrises += 1,
    }
    self.lines += n;
  }
}
