//! Scoring of sandbox outcomes against expected grids.
//!
//! Shape mismatches deny partial credit: a misaligned comparison would reward
//! incidental matches. Same-shape comparisons earn cell-accuracy in [0, 1],
//! which is the gradient signal the feedback formatter relays to the model.

use gridmind_domain::{ExampleResult, FailureKind, Grid};

use crate::sandbox::{ExitReason, SandboxOutcome};

/// Map a sandbox exit reason onto the failure taxonomy.
pub fn failure_kind_for_exit(exit: ExitReason) -> FailureKind {
    match exit {
        ExitReason::Ok => FailureKind::Ok,
        ExitReason::Nonzero => FailureKind::RuntimeError,
        ExitReason::KilledTimeout => FailureKind::Timeout,
        ExitReason::UnparseableOutput => FailureKind::InvalidOutput,
    }
}

/// Score one sandbox outcome against the expected grid.
pub fn score_example(outcome: &SandboxOutcome, expected: &Grid) -> ExampleResult {
    let Some(predicted) = &outcome.predicted else {
        return ExampleResult::failed(
            failure_kind_for_exit(outcome.exit),
            0.0,
            None,
            outcome.stderr_tail.clone(),
        );
    };

    if !predicted.same_shape(expected) {
        return ExampleResult::failed(
            FailureKind::ShapeMismatch,
            0.0,
            Some(predicted.clone()),
            format!(
                "expected {}, got {}",
                expected.shape_label(),
                predicted.shape_label()
            ),
        );
    }

    let matching = predicted.matching_cells(expected);
    let total = expected.cell_count();
    if matching == total {
        return ExampleResult::passing(predicted.clone());
    }

    ExampleResult::failed(
        FailureKind::Ok,
        matching as f32 / total as f32,
        Some(predicted.clone()),
        String::new(),
    )
}
