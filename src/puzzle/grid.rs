use crate::io::error::{Result, invalid_puzzle};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Grid coordinates of a cell, serialised as `[row, col]`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Position {
    /// Zero-based row index
    pub row: usize,
    /// Zero-based column index
    pub col: usize,
}

impl Position {
    /// Create a position
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl From<Position> for (usize, usize) {
    fn from(position: Position) -> Self {
        (position.row, position.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

/// A position holding a value, serialised as `[row, col, value]`
///
/// Immutable once created; the ordering is row-major then by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(usize, usize, u8)", into = "(usize, usize, u8)")]
pub struct Cell {
    /// Zero-based row index
    pub row: usize,
    /// Zero-based column index
    pub col: usize,
    /// Value placed in the cell, starting at 1
    pub value: u8,
}

impl Cell {
    /// Create a cell
    pub const fn new(row: usize, col: usize, value: u8) -> Self {
        Self { row, col, value }
    }

    /// Position of this cell without its value
    pub const fn position(&self) -> Position {
        Position::new(self.row, self.col)
    }

    /// Same position holding another value
    #[must_use]
    pub const fn with_value(&self, value: u8) -> Self {
        Self::new(self.row, self.col, value)
    }
}

impl From<(usize, usize, u8)> for Cell {
    fn from((row, col, value): (usize, usize, u8)) -> Self {
        Self { row, col, value }
    }
}

impl From<Cell> for (usize, usize, u8) {
    fn from(cell: Cell) -> Self {
        (cell.row, cell.col, cell.value)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.row, self.col, self.value)
    }
}

/// Grid dimensions and box layout
///
/// A grid of `size` rows and columns holds values `1..=size`, and is split
/// into boxes of `box_rows` by `box_cols` cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    /// Number of rows and columns
    pub size: usize,
    /// Rows per box
    pub box_rows: usize,
    /// Columns per box
    pub box_cols: usize,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::standard()
    }
}

impl Geometry {
    /// Classic 9x9 grid with 3x3 boxes
    pub const fn standard() -> Self {
        Self {
            size: 9,
            box_rows: 3,
            box_cols: 3,
        }
    }

    /// Create a validated geometry
    ///
    /// # Errors
    ///
    /// Returns an error if the boxes don't tile the grid exactly or the value
    /// domain doesn't fit in a byte
    pub fn new(size: usize, box_rows: usize, box_cols: usize) -> Result<Self> {
        let geometry = Self {
            size,
            box_rows,
            box_cols,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Check the box layout against the grid size
    ///
    /// # Errors
    ///
    /// Returns an error if the boxes don't tile the grid exactly or the value
    /// domain doesn't fit in a byte
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 || self.size > usize::from(u8::MAX) {
            return Err(invalid_puzzle(&format!(
                "grid size {} outside 1..=255",
                self.size
            )));
        }
        if self.box_rows * self.box_cols != self.size {
            return Err(invalid_puzzle(&format!(
                "boxes of {}x{} don't tile a grid of size {}",
                self.box_rows, self.box_cols, self.size
            )));
        }
        Ok(())
    }

    /// Number of positions in the grid
    pub const fn cell_count(&self) -> usize {
        self.size * self.size
    }

    /// Largest value in the domain
    pub const fn max_value(&self) -> u8 {
        self.size as u8
    }

    /// All values of the domain in ascending order
    pub const fn values(&self) -> RangeInclusive<u8> {
        1..=self.max_value()
    }

    /// Test that a position lies on the grid
    pub const fn contains(&self, position: Position) -> bool {
        position.row < self.size && position.col < self.size
    }

    /// Test that a cell lies on the grid and holds a domain value
    pub const fn admits(&self, cell: Cell) -> bool {
        self.contains(cell.position()) && cell.value >= 1 && cell.value <= self.max_value()
    }

    /// Index of the box containing a position, counted row-major
    pub const fn box_index(&self, position: Position) -> usize {
        let boxes_per_row = self.size / self.box_cols;
        (position.row / self.box_rows) * boxes_per_row + position.col / self.box_cols
    }

    /// All positions in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        let size = self.size;
        (0..size).flat_map(move |row| (0..size).map(move |col| Position::new(row, col)))
    }
}

/// Set of cells with at most one value per position
///
/// Backed by a dense grid where 0 marks an empty position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    values: Array2<u8>,
    filled: usize,
}

impl Assignment {
    /// Create an empty assignment for a grid
    pub fn empty(geometry: Geometry) -> Self {
        Self {
            values: Array2::zeros((geometry.size, geometry.size)),
            filled: 0,
        }
    }

    /// Build an assignment from a list of cells
    ///
    /// # Errors
    ///
    /// Returns an error if a cell lies outside the grid or two cells claim the
    /// same position with different values
    pub fn from_cells(geometry: Geometry, cells: &[Cell]) -> Result<Self> {
        let mut assignment = Self::empty(geometry);
        for &cell in cells {
            if !geometry.admits(cell) {
                return Err(invalid_puzzle(&format!(
                    "cell {cell} lies outside a grid of size {}",
                    geometry.size
                )));
            }
            assignment.insert(cell)?;
        }
        Ok(assignment)
    }

    /// Place a cell
    ///
    /// Placing the value a position already holds is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the position is off the grid or already holds a
    /// different value
    pub fn insert(&mut self, cell: Cell) -> Result<()> {
        let slot = self
            .values
            .get_mut([cell.row, cell.col])
            .ok_or_else(|| invalid_puzzle(&format!("cell {cell} lies outside the grid")))?;
        match *slot {
            0 => {
                *slot = cell.value;
                self.filled += 1;
                Ok(())
            }
            existing if existing == cell.value => Ok(()),
            existing => Err(invalid_puzzle(&format!(
                "position {} already holds {existing}, cannot place {}",
                cell.position(),
                cell.value
            ))),
        }
    }

    /// Clear a position, returning the value it held
    pub fn remove(&mut self, position: Position) -> Option<u8> {
        let slot = self.values.get_mut([position.row, position.col])?;
        let value = std::mem::replace(slot, 0);
        if value == 0 {
            None
        } else {
            self.filled -= 1;
            Some(value)
        }
    }

    /// Value held at a position, if any
    pub fn get(&self, position: Position) -> Option<u8> {
        self.values
            .get([position.row, position.col])
            .copied()
            .filter(|&value| value != 0)
    }

    /// Test whether a position holds a value
    pub fn is_filled(&self, position: Position) -> bool {
        self.get(position).is_some()
    }

    /// Test whether this exact cell is part of the assignment
    pub fn contains(&self, cell: Cell) -> bool {
        self.get(cell.position()) == Some(cell.value)
    }

    /// Number of filled positions
    pub const fn len(&self) -> usize {
        self.filled
    }

    /// Test whether no position is filled
    pub const fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// All cells in row-major order
    pub fn cells(&self) -> Vec<Cell> {
        self.values
            .indexed_iter()
            .filter(|&(_, &value)| value != 0)
            .map(|((row, col), &value)| Cell::new(row, col, value))
            .collect()
    }

    /// Cells of this assignment whose positions are empty in `other`
    pub fn difference(&self, other: &Self) -> Vec<Cell> {
        self.cells()
            .into_iter()
            .filter(|cell| !other.is_filled(cell.position()))
            .collect()
    }

    /// Test that every cell of this assignment appears in `other`
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.cells().into_iter().all(|cell| other.contains(cell))
    }
}
