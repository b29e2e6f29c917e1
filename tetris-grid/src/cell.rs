/// One of the seven tetromino kinds. `rotationCount(kind)` (see
/// [`crate::catalogue::rotation_count`]) is fixed per kind at 1, 2, or 4.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
  I,
  J,
  L,
  O,
  S,
  T,
  Z,
}

impl PieceKind {
  pub const ALL: [PieceKind; 7] = [
    PieceKind::I,
    PieceKind::J,
    PieceKind::L,
    PieceKind::O,
    PieceKind::S,
    PieceKind::T,
    PieceKind::Z,
  ];
}

/// The value of a single grid cell: empty, or occupied by the piece that
/// solidified into it. Cheap to copy, no aliasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
  Empty,
  Block(PieceKind),
}

impl Cell {
  pub fn is_empty(&self) -> bool {
    matches!(self, Cell::Empty)
  }
}

impl From<PieceKind> for Cell {
  fn from(kind: PieceKind) -> Self {
    Cell::Block(kind)
  }
}
