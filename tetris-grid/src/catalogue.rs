//! The process-wide, immutable table of piece shapes and rotations.
//!
//! Built once behind a `OnceLock`, the way the ancestor workspace builds its
//! own precomputed position tables (`onoro_impl`'s hash/symmetry tables),
//! and never mutated afterward.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::PieceKind;

/// The occupied cells of a piece in a given rotation, as `(row, col)`
/// offsets within the piece's bounding box. Row 0 of the offsets is the
/// topmost row of the bounding box.
#[derive(Debug)]
pub struct ShapeGrid {
  pub offsets: &'static [(i32, i32)],
  pub rows: i32,
  pub cols: i32,
}

type Catalogue = HashMap<(PieceKind, u8), ShapeGrid>;

static CATALOGUE: OnceLock<Catalogue> = OnceLock::new();

fn build_catalogue() -> Catalogue {
  let mut table = HashMap::new();
  let mut insert = |kind: PieceKind, rotation: u8, offsets: &'static [(i32, i32)], rows: i32, cols: i32| {
    table.insert((kind, rotation), ShapeGrid { offsets, rows, cols });
  };

  insert(PieceKind::O, 0, &[(0, 0), (0, 1), (1, 0), (1, 1)], 2, 2);

  insert(PieceKind::I, 0, &[(0, 0), (0, 1), (0, 2), (0, 3)], 1, 4);
  insert(PieceKind::I, 1, &[(0, 0), (1, 0), (2, 0), (3, 0)], 4, 1);

  insert(PieceKind::S, 0, &[(0, 1), (0, 2), (1, 0), (1, 1)], 2, 3);
  insert(PieceKind::S, 1, &[(0, 0), (1, 0), (1, 1), (2, 1)], 3, 2);

  insert(PieceKind::Z, 0, &[(0, 0), (0, 1), (1, 1), (1, 2)], 2, 3);
  insert(PieceKind::Z, 1, &[(0, 1), (1, 0), (1, 1), (2, 0)], 3, 2);

  insert(PieceKind::J, 0, &[(0, 0), (1, 0), (1, 1), (1, 2)], 2, 3);
  insert(PieceKind::J, 1, &[(0, 0), (0, 1), (1, 0), (2, 0)], 3, 2);
  insert(PieceKind::J, 2, &[(0, 0), (0, 1), (0, 2), (1, 2)], 2, 3);
  insert(PieceKind::J, 3, &[(0, 1), (1, 1), (2, 0), (2, 1)], 3, 2);

  insert(PieceKind::L, 0, &[(0, 2), (1, 0), (1, 1), (1, 2)], 2, 3);
  insert(PieceKind::L, 1, &[(0, 0), (1, 0), (2, 0), (2, 1)], 3, 2);
  insert(PieceKind::L, 2, &[(0, 0), (0, 1), (0, 2), (1, 0)], 2, 3);
  insert(PieceKind::L, 3, &[(0, 0), (0, 1), (1, 1), (2, 1)], 3, 2);

  insert(PieceKind::T, 0, &[(0, 0), (0, 1), (0, 2), (1, 1)], 2, 3);
  insert(PieceKind::T, 1, &[(0, 1), (1, 0), (1, 1), (2, 1)], 3, 2);
  insert(PieceKind::T, 2, &[(0, 1), (1, 0), (1, 1), (1, 2)], 2, 3);
  insert(PieceKind::T, 3, &[(0, 0), (1, 0), (1, 1), (2, 0)], 3, 2);

  table
}

fn catalogue() -> &'static Catalogue {
  CATALOGUE.get_or_init(build_catalogue)
}

/// Number of distinct rotations a piece kind has: 1, 2, or 4.
pub fn rotation_count(kind: PieceKind) -> u8 {
  match kind {
    PieceKind::O => 1,
    PieceKind::I | PieceKind::S | PieceKind::Z => 2,
    PieceKind::J | PieceKind::L | PieceKind::T => 4,
  }
}

/// The shape grid for `(kind, rotation)`. Panics if `rotation` is out of
/// range for `kind` -- callers are expected to keep rotation normalized via
/// `Block::rotate`.
pub fn shape(kind: PieceKind, rotation: u8) -> &'static ShapeGrid {
  catalogue()
    .get(&(kind, rotation))
    .unwrap_or_else(|| panic!("no shape for {kind:?} rotation {rotation}"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::PieceKind::*;

  #[test]
  fn every_kind_has_its_declared_rotation_count() {
    for kind in [I, J, L, O, S, T, Z] {
      let count = rotation_count(kind);
      assert!(count == 1 || count == 2 || count == 4);
      for rotation in 0..count {
        let s = shape(kind, rotation);
        assert_eq!(s.offsets.len(), 4);
      }
    }
  }
}
