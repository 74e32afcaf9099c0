use super::piece::Shape;

pub const DEFAULT_WIDTH: usize = 10;
pub const DEFAULT_HEIGHT: usize = 20;

/// Locked cells only. The falling piece is never stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl Board {
    /// Create a new empty board
    pub fn new(width: usize, height: usize) -> Self {
        Board {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the cell at a specific position
    /// Row 0 is the top, row `height - 1` is the bottom
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.width + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        self.cells[row * self.width + col] = value;
    }

    /// Row-major view of all cells.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn row(&self, row: usize) -> &[u8] {
        &self.cells[row * self.width..(row + 1) * self.width]
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        self.row(row).iter().all(|&c| c != 0)
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Whether `shape` with its top-left cell at `(x, y)` is a legal placement.
    ///
    /// Occupied cells must be inside the side walls and above the floor.
    /// Cells at row >= 0 must not overlap locked cells; cells above the top
    /// edge are allowed.
    pub fn fits(&self, shape: &Shape, x: i32, y: i32) -> bool {
        shape.occupied().all(|(r, c, _)| {
            let gx = x + c as i32;
            let gy = y + r as i32;
            if gx < 0 || gx >= self.width as i32 || gy >= self.height as i32 {
                return false;
            }
            gy < 0 || self.get(gy as usize, gx as usize) == 0
        })
    }

    /// Write the occupied cells of `shape` into the grid.
    ///
    /// Callers must have checked `fits` and that no cell lies above row 0.
    pub fn stamp(&mut self, shape: &Shape, x: i32, y: i32) {
        for (r, c, v) in shape.occupied() {
            let gx = (x + c as i32) as usize;
            let gy = (y + r as i32) as usize;
            self.set(gy, gx, v);
        }
    }

    /// Remove full rows, shifting everything above them down. Returns the
    /// number of rows removed; the row count never changes.
    pub fn clear_full_rows(&mut self) -> u32 {
        let mut cleared = 0u32;
        let mut write_row = self.height as i32 - 1;

        for r in (0..self.height).rev() {
            if self.is_row_full(r) {
                cleared += 1;
                continue;
            }
            if write_row != r as i32 {
                let (src, dst) = (r * self.width, write_row as usize * self.width);
                self.cells.copy_within(src..src + self.width, dst);
            }
            write_row -= 1;
        }

        if write_row >= 0 {
            let end = (write_row as usize + 1) * self.width;
            self.cells[..end].fill(0);
        }

        cleared
    }

    /// Rows as nested vectors, top row first.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells.chunks(self.width).map(|r| r.to_vec()).collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}
