//! Rendering of puzzles and per-attempt diagnostics into prompt prose.
//!
//! Both renderers are deterministic functions of their inputs; reproducibility
//! tests rely on that.

use std::fmt::Write as _;

use gridmind_domain::{Attempt, FailureKind, Grid, TrainExample};

/// Grids wider or taller than this are summarized by shape in diff output
/// instead of being rendered cell by cell.
pub const DIFF_RENDER_CAP: usize = 50;

/// Render the problem section of a prompt.
///
/// The section is delimited by literal `<Problem>` / `</Problem>` tags.
/// Training examples are numbered from 1 and rendered in the order given
/// (callers pass a shuffled order when configured to); test inputs follow,
/// rendered the same way without outputs.
pub fn render_problem(examples: &[&TrainExample], test_inputs: &[Grid]) -> String {
    let mut out = String::from("<Problem>\n");
    for (i, example) in examples.iter().enumerate() {
        let _ = writeln!(out, "Example {}:", i + 1);
        let _ = writeln!(out, "Input:\n{}", example.input.render());
        let _ = writeln!(out, "Output:\n{}", example.output.render());
        out.push('\n');
    }
    for (i, input) in test_inputs.iter().enumerate() {
        let _ = writeln!(out, "Test Input {}:", i + 1);
        let _ = writeln!(out, "{}", input.render());
        out.push('\n');
    }
    out.push_str("</Problem>");
    out
}

/// Render the feedback section for a sequence of prior attempts.
///
/// Attempts are enumerated in the order given (the expert orders them per its
/// configuration). Each block carries the program text, per-example
/// diagnostics, and the aggregate score.
pub fn render_feedback(attempts: &[&Attempt], train: &[TrainExample]) -> String {
    let mut out = String::new();
    for (i, attempt) in attempts.iter().enumerate() {
        let _ = writeln!(
            out,
            "Previous attempt {} (aggregate score {:.2}):",
            i + 1,
            attempt.aggregate_score
        );
        out.push_str("Program:\n");
        out.push_str(attempt.program.trim_end());
        out.push('\n');
        out.push_str(&render_attempt_diagnostics(attempt, train));
        out.push('\n');
    }
    out
}

/// Per-example diagnostics for one attempt.
pub fn render_attempt_diagnostics(attempt: &Attempt, train: &[TrainExample]) -> String {
    let mut out = String::new();
    for (i, result) in attempt.train_results.iter().enumerate() {
        if result.success {
            let _ = writeln!(out, "Example {}: solved correctly (score 1.00)", i + 1);
            continue;
        }

        let _ = writeln!(
            out,
            "Example {}: not solved (score {:.2})",
            i + 1,
            result.soft_score
        );

        match result.failure_kind {
            FailureKind::ShapeMismatch => {
                // The diagnostic already names both shapes.
                let _ = writeln!(out, "Shape mismatch: {}", result.diagnostic);
            }
            FailureKind::Ok => {
                if let (Some(predicted), Some(example)) = (&result.predicted, train.get(i)) {
                    let _ = writeln!(out, "Mismatched cells shown as predicted/expected:");
                    let _ = writeln!(out, "{}", render_diff(predicted, &example.output));
                }
            }
            kind => {
                let _ = writeln!(out, "Failure: {kind} — {}", result.diagnostic);
            }
        }
    }
    out
}

/// Diff grid for two same-shape grids: matching cells show the value,
/// mismatching cells show `predicted/expected`.
pub fn render_diff(predicted: &Grid, expected: &Grid) -> String {
    debug_assert!(predicted.same_shape(expected));

    let (height, width) = expected.shape();
    if height > DIFF_RENDER_CAP || width > DIFF_RENDER_CAP {
        return format!("diff omitted ({} grid exceeds render cap)", expected.shape_label());
    }

    let mut lines = Vec::with_capacity(height);
    for r in 0..height {
        let mut cells = Vec::with_capacity(width);
        for c in 0..width {
            let p = predicted.cell(r, c);
            let e = expected.cell(r, c);
            if p == e {
                cells.push(p.to_string());
            } else {
                cells.push(format!("{p}/{e}"));
            }
        }
        lines.push(cells.join(" "));
    }
    lines.join("\n")
}
