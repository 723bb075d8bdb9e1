//! Structured observability hooks for the solve lifecycle.
//!
//! Emission functions for the key events — solve started, attempt scored,
//! expert finished, votes tallied, solve finished — plus an [`ExpertSpan`]
//! RAII guard that scopes all tracing inside one expert's loop.
//!
//! Events are emitted at `info!` level; filter with `RUST_LOG`.

use tracing::info;

/// RAII guard entering an expert-scoped tracing span.
pub struct ExpertSpan {
    _span: tracing::span::EnteredSpan,
}

impl ExpertSpan {
    /// Create and enter a span tagged with the expert id.
    pub fn enter(expert_id: &str) -> Self {
        let span = tracing::info_span!("gridmind.expert", expert_id = %expert_id);
        Self {
            _span: span.entered(),
        }
    }

    /// Build the span tagged with the expert id without entering it.
    ///
    /// Use this (with [`tracing::Instrument`]) instead of [`ExpertSpan::enter`]
    /// when the span must be held across an `.await`, since `EnteredSpan` is
    /// not `Send` and cannot live across await points in a spawned task.
    pub fn span(expert_id: &str) -> tracing::Span {
        tracing::info_span!("gridmind.expert", expert_id = %expert_id)
    }
}

/// Emit event: a solve run started.
pub fn emit_solve_started(solve_id: &str, experts: usize, train: usize, test: usize) {
    info!(
        event = "solve.started",
        solve_id = %solve_id,
        experts = experts,
        train_examples = train,
        test_inputs = test,
    );
}

/// Emit event: one expert turn produced a scored attempt.
pub fn emit_attempt_scored(expert_id: &str, iteration: usize, aggregate_score: f32, all_pass: bool) {
    info!(
        event = "expert.attempt_scored",
        expert_id = %expert_id,
        iteration = iteration,
        aggregate_score = aggregate_score,
        all_pass = all_pass,
    );
}

/// Emit event: an expert's loop terminated.
pub fn emit_expert_finished(expert_id: &str, attempts: usize, found_passer: bool) {
    info!(
        event = "expert.finished",
        expert_id = %expert_id,
        attempts = attempts,
        found_passer = found_passer,
    );
}

/// Emit event: the voter grouped and ranked the candidate attempts.
pub fn emit_votes_tallied(candidates: usize, groups: usize, passer_groups: usize) {
    info!(
        event = "voter.tallied",
        candidates = candidates,
        groups = groups,
        passer_groups = passer_groups,
    );
}

/// Emit event: a solve run finished.
pub fn emit_solve_finished(solve_id: &str, emitted: usize, duration_ms: u64) {
    info!(
        event = "solve.finished",
        solve_id = %solve_id,
        emitted = emitted,
        duration_ms = duration_ms,
    );
}
