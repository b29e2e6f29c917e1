use crate::catalogue::{self, ShapeGrid};
use crate::PieceKind;

/// A live piece position on the board: kind, rotation, and top-left corner
/// of its bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
  pub kind: PieceKind,
  pub rotation: u8,
  pub row: i32,
  pub col: i32,
}

impl Block {
  pub fn new(kind: PieceKind, rotation: u8, row: i32, col: i32) -> Self {
    debug_assert!(rotation < catalogue::rotation_count(kind));
    Self {
      kind,
      rotation,
      row,
      col,
    }
  }

  pub fn spawn(kind: PieceKind, col: i32) -> Self {
    Self::new(kind, 0, 0, col)
  }

  pub fn shape(&self) -> &'static ShapeGrid {
    catalogue::shape(self.kind, self.rotation)
  }

  /// Returns a copy of this block rotated one step clockwise, wrapping at
  /// `rotationCount(kind)`.
  pub fn rotate(&self) -> Self {
    let count = catalogue::rotation_count(self.kind);
    Self {
      rotation: (self.rotation + 1) % count,
      ..*self
    }
  }

  pub fn moved(&self, d_row: i32, d_col: i32) -> Self {
    Self {
      row: self.row + d_row,
      col: self.col + d_col,
      ..*self
    }
  }

  /// Identifies a placement among a row's possibilities:
  /// `rotationCount(kind) * column + rotation`. Used to break score ties
  /// deterministically when ordering sibling search nodes.
  pub fn placement_id(&self) -> i64 {
    catalogue::rotation_count(self.kind) as i64 * self.col as i64 + self.rotation as i64
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rotating_rotation_count_times_returns_to_the_start() {
    for kind in PieceKind::ALL {
      let count = catalogue::rotation_count(kind);
      let mut block = Block::new(kind, 0, 0, 0);
      let start_id = block.placement_id();
      for _ in 0..count {
        block = block.rotate();
      }
      assert_eq!(block.placement_id(), start_id);
    }
  }
}
