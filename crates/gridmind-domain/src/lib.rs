//! Gridmind Domain Model
//!
//! Canonical definitions for the core entities of the ensemble reasoning
//! engine:
//! - `Grid`: validated rectangular matrix of cells in 0..=9
//! - `Puzzle` / `TrainExample`: training pairs plus test inputs
//! - `ExampleResult` / `Attempt` / `ExpertHistory`: per-turn scoring records
//! - `Fingerprint`: canonical SHA-256 digest over a test-prediction sequence
//!
//! Everything here is a serializable value type with no I/O; construction
//! goes through validating constructors so downstream code can rely on the
//! documented invariants.

pub mod attempt;
pub mod error;
pub mod fingerprint;
pub mod grid;
pub mod puzzle;

pub use attempt::{Attempt, ExampleResult, ExpertHistory, FailureKind};
pub use error::{DomainError, Result};
pub use fingerprint::Fingerprint;
pub use grid::Grid;
pub use puzzle::{Puzzle, TrainExample};

/// Gridmind domain version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
