/// The seven tetrominoes. The cell id written into the board is `id()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
    ];

    /// Strict 1..=7 id used for grid cell encoding (0 = empty).
    pub fn id(self) -> u8 {
        match self {
            PieceKind::I => 1,
            PieceKind::O => 2,
            PieceKind::T => 3,
            PieceKind::L => 4,
            PieceKind::J => 5,
            PieceKind::S => 6,
            PieceKind::Z => 7,
        }
    }

    /// Inverse of `id()`. Returns None for 0 and anything above 7.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1..=7 => Some(Self::ALL[(id - 1) as usize]),
            _ => None,
        }
    }

    /// Spawn orientation of this piece.
    pub fn shape(self) -> Shape {
        let v = self.id();
        match self {
            PieceKind::I => Shape::from_rows(&[&[v, v, v, v]]),
            PieceKind::O => Shape::from_rows(&[&[v, v], &[v, v]]),
            PieceKind::T => Shape::from_rows(&[&[v, v, v], &[0, v, 0]]),
            PieceKind::L => Shape::from_rows(&[&[v, v, v], &[v, 0, 0]]),
            PieceKind::J => Shape::from_rows(&[&[v, v, v], &[0, 0, v]]),
            PieceKind::S => Shape::from_rows(&[&[0, v, v], &[v, v, 0]]),
            PieceKind::Z => Shape::from_rows(&[&[v, v, 0], &[0, v, v]]),
        }
    }
}

/// Rectangular cell mask. Non-zero cells are occupied and carry the piece id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
}

impl Shape {
    /// Build a shape from row slices. All rows must have the same length.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let cols = rows.first().map_or(0, |r| r.len());
        assert!(
            rows.iter().all(|r| r.len() == cols),
            "shape rows must have equal length"
        );
        Shape {
            rows: rows.len(),
            cols,
            cells: rows.iter().flat_map(|r| r.iter().copied()).collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.cols + col]
    }

    /// The mask turned a quarter-turn clockwise. A `r x c` mask becomes `c x r`.
    pub fn rotated_clockwise(&self) -> Shape {
        let mut cells = Vec::with_capacity(self.cells.len());
        for r in 0..self.cols {
            for c in 0..self.rows {
                cells.push(self.get(self.rows - 1 - c, r));
            }
        }
        Shape {
            rows: self.cols,
            cols: self.rows,
            cells,
        }
    }

    /// `(row, col, value)` for every occupied cell, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0)
            .map(|(i, &v)| (i / self.cols, i % self.cols, v))
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells.chunks(self.cols.max(1)).map(|r| r.to_vec()).collect()
    }
}

/// The falling piece: a shape positioned by its top-left mask cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// A piece of `kind` in spawn orientation at `(x, y)`.
    pub fn new(kind: PieceKind, x: i32, y: i32) -> Self {
        Piece {
            kind,
            shape: kind.shape(),
            x,
            y,
        }
    }

    /// Board coordinates `(row, col)` of every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .occupied()
            .map(|(r, c, _)| (self.y + r as i32, self.x + c as i32))
    }
}
