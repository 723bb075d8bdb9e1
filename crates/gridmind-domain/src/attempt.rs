//! Attempt records: per-example results and the per-iteration attempt
//! produced by one expert turn.
//!
//! Attempts are immutable once recorded; the aggregate fields are computed by
//! the constructor so the invariants `all_pass ⇔ every train result passed`
//! and `aggregate_score = mean(soft_score)` hold by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::grid::Grid;

/// How a single training-example evaluation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Program ran and the predicted grid matched exactly.
    Ok,
    /// Predicted grid has different dimensions than expected.
    ShapeMismatch,
    /// Child process raised or exited non-zero.
    RuntimeError,
    /// Child process exceeded the wall-clock limit.
    Timeout,
    /// Child output was not a valid grid.
    InvalidOutput,
    /// No program could be extracted from the model response.
    NoCode,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Ok => "ok",
            FailureKind::ShapeMismatch => "shape_mismatch",
            FailureKind::RuntimeError => "runtime_error",
            FailureKind::Timeout => "timeout",
            FailureKind::InvalidOutput => "invalid_output",
            FailureKind::NoCode => "no_code",
        };
        write!(f, "{s}")
    }
}

/// Outcome of running a candidate program against one training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleResult {
    /// Whether the example was solved exactly.
    pub success: bool,
    /// Cell-accuracy fraction in [0, 1].
    pub soft_score: f32,
    /// The grid the program produced, when it produced one.
    pub predicted: Option<Grid>,
    pub failure_kind: FailureKind,
    /// Bounded diagnostic text (stderr tail, error note); empty on success.
    pub diagnostic: String,
}

impl ExampleResult {
    /// A fully correct prediction.
    pub fn passing(predicted: Grid) -> Self {
        Self {
            success: true,
            soft_score: 1.0,
            predicted: Some(predicted),
            failure_kind: FailureKind::Ok,
            diagnostic: String::new(),
        }
    }

    /// A failed evaluation. `soft_score` must be below 1.0 for a failure;
    /// shape mismatches and absent predictions score 0.
    pub fn failed(
        failure_kind: FailureKind,
        soft_score: f32,
        predicted: Option<Grid>,
        diagnostic: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            soft_score,
            predicted,
            failure_kind,
            diagnostic: diagnostic.into(),
        }
    }
}

/// One expert turn: the proposed program and everything it scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// The candidate program text (may be empty when the gateway failed).
    pub program: String,
    /// Per-training-example results, aligned to the puzzle's training order.
    pub train_results: Vec<ExampleResult>,
    /// Predicted grids per test input; `None` where the program failed.
    pub test_predictions: Vec<Option<Grid>>,
    /// Mean soft score across training results.
    pub aggregate_score: f32,
    /// Whether every training result succeeded.
    pub all_pass: bool,
    /// 0-indexed PTR turn that produced this attempt.
    pub iteration_index: usize,
    /// Identity of the producing expert, e.g. `"deep#2"`.
    pub expert_id: String,
    /// Voting hint from the producing expert's configuration: when true, this
    /// attempt reinforces a matching passer group even if it failed training.
    pub failed_match_votes: bool,
    pub created_at: DateTime<Utc>,
}

impl Attempt {
    /// Build an attempt, computing `aggregate_score` and `all_pass` from the
    /// training results.
    pub fn new(
        program: impl Into<String>,
        train_results: Vec<ExampleResult>,
        test_predictions: Vec<Option<Grid>>,
        iteration_index: usize,
        expert_id: impl Into<String>,
        failed_match_votes: bool,
    ) -> Result<Self> {
        if train_results.is_empty() {
            return Err(DomainError::EmptyTrainResults);
        }
        let all_pass = train_results.iter().all(|r| r.success);
        let aggregate_score =
            train_results.iter().map(|r| r.soft_score).sum::<f32>() / train_results.len() as f32;
        Ok(Attempt {
            program: program.into(),
            train_results,
            test_predictions,
            aggregate_score,
            all_pass,
            iteration_index,
            expert_id: expert_id.into(),
            failed_match_votes,
            created_at: Utc::now(),
        })
    }

    /// Whether every test prediction is absent.
    pub fn all_predictions_null(&self) -> bool {
        self.test_predictions.iter().all(|p| p.is_none())
    }
}

/// Chronological attempts for one expert.
pub type ExpertHistory = Vec<Attempt>;
