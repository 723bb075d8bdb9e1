//! Puzzle structure: ordered training pairs plus test inputs.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::grid::Grid;

/// One training pair: an input grid and the expected output grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainExample {
    pub input: Grid,
    pub output: Grid,
}

impl TrainExample {
    pub fn new(input: Grid, output: Grid) -> Self {
        Self { input, output }
    }
}

/// A complete puzzle: at least one training pair and at least one test input.
///
/// Training and test inputs are independent; there is no cross-reference
/// invariant between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PuzzleParts", into = "PuzzleParts")]
pub struct Puzzle {
    train: Vec<TrainExample>,
    test_inputs: Vec<Grid>,
}

/// Raw serde shape; validated into [`Puzzle`] via `TryFrom`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PuzzleParts {
    train: Vec<TrainExample>,
    test_inputs: Vec<Grid>,
}

impl Puzzle {
    /// Validate and construct a puzzle.
    pub fn new(train: Vec<TrainExample>, test_inputs: Vec<Grid>) -> Result<Self> {
        if train.is_empty() {
            return Err(DomainError::EmptyTrainingSet);
        }
        if test_inputs.is_empty() {
            return Err(DomainError::EmptyTestSet);
        }
        Ok(Puzzle { train, test_inputs })
    }

    /// Ordered training examples.
    pub fn train(&self) -> &[TrainExample] {
        &self.train
    }

    /// Ordered test inputs.
    pub fn test_inputs(&self) -> &[Grid] {
        &self.test_inputs
    }

    pub fn train_count(&self) -> usize {
        self.train.len()
    }

    pub fn test_count(&self) -> usize {
        self.test_inputs.len()
    }
}

impl TryFrom<PuzzleParts> for Puzzle {
    type Error = DomainError;

    fn try_from(parts: PuzzleParts) -> Result<Self> {
        Puzzle::new(parts.train, parts.test_inputs)
    }
}

impl From<Puzzle> for PuzzleParts {
    fn from(puzzle: Puzzle) -> Self {
        PuzzleParts {
            train: puzzle.train,
            test_inputs: puzzle.test_inputs,
        }
    }
}
