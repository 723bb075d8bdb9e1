//! The `Grid` value type: a validated rectangular matrix of cells in 0..=9.
//!
//! Grids are the only currency between puzzles, candidate programs, and the
//! scorer, so the constructor is the single validation chokepoint. Anything
//! that gets past `Grid::new` is guaranteed non-empty, rectangular, and
//! within the cell alphabet.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// A non-empty rectangular matrix of cell values in `0..=9`.
///
/// The inner rows are private so a `Grid` can only be produced through the
/// validating constructor (or serde, which funnels through `TryFrom`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Grid {
    rows: Vec<Vec<u8>>,
}

impl Grid {
    /// Validate and wrap a matrix of cells.
    pub fn new(rows: Vec<Vec<u8>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(DomainError::EmptyGrid);
        }
        let width = rows[0].len();
        for (r, row) in rows.iter().enumerate() {
            if row.is_empty() {
                return Err(DomainError::EmptyRow { row: r });
            }
            if row.len() != width {
                return Err(DomainError::RaggedGrid {
                    row: r,
                    expected: width,
                    got: row.len(),
                });
            }
            for (c, &value) in row.iter().enumerate() {
                if value > 9 {
                    return Err(DomainError::CellOutOfRange {
                        value,
                        row: r,
                        col: c,
                    });
                }
            }
        }
        Ok(Grid { rows })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    /// (height, width) pair.
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// Human-readable shape, e.g. `3x4`.
    pub fn shape_label(&self) -> String {
        format!("{}x{}", self.height(), self.width())
    }

    /// Total cell count.
    pub fn cell_count(&self) -> usize {
        self.height() * self.width()
    }

    /// Borrow the underlying rows.
    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    /// Cell accessor; callers must stay in bounds.
    pub fn cell(&self, row: usize, col: usize) -> u8 {
        self.rows[row][col]
    }

    /// Whether `other` has the same dimensions.
    pub fn same_shape(&self, other: &Grid) -> bool {
        self.shape() == other.shape()
    }

    /// Count of cells equal to the corresponding cell of `other`.
    ///
    /// Only meaningful for same-shape grids; callers check shape first.
    pub fn matching_cells(&self, other: &Grid) -> usize {
        self.rows
            .iter()
            .zip(other.rows.iter())
            .map(|(a, b)| a.iter().zip(b.iter()).filter(|(x, y)| x == y).count())
            .sum()
    }

    /// Canonical ASCII rendering: rows of space-separated decimal digits,
    /// newline between rows.
    pub fn render(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse the canonical ASCII rendering produced by [`Grid::render`].
    pub fn parse(text: &str) -> Result<Self> {
        let mut rows = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut row = Vec::new();
            for token in line.split_whitespace() {
                let value: u8 = token
                    .parse()
                    .map_err(|_| DomainError::UnparseableCell {
                        token: token.to_string(),
                    })?;
                row.push(value);
            }
            rows.push(row);
        }
        Grid::new(rows)
    }
}

impl TryFrom<Vec<Vec<u8>>> for Grid {
    type Error = DomainError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self> {
        Grid::new(rows)
    }
}

impl From<Grid> for Vec<Vec<u8>> {
    fn from(grid: Grid) -> Self {
        grid.rows
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}
