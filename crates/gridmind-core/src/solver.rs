//! Solver facade: the public entry point for one puzzle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::instrument;
use uuid::Uuid;

use gridmind_domain::Puzzle;

use crate::ensemble::run_ensemble;
use crate::expert::ExpertConfig;
use crate::gateway::ModelGateway;
use crate::obs;
use crate::sandbox::TransformRunner;
use crate::voting::{select_ranked, tally_groups, RankedAttempt};

/// Configuration for one solve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolveConfig {
    /// Expert configurations; one task is launched per entry.
    pub experts: Vec<ExpertConfig>,
    /// Number of final attempts emitted (K).
    pub attempts: usize,
    /// Base seed from which every expert and iteration seed is derived.
    pub base_seed: u64,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            experts: vec![ExpertConfig::default()],
            attempts: 2,
            base_seed: 0,
        }
    }
}

/// Configuration errors at the solve boundary. These are programmer bugs in
/// the caller; model and sandbox failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("solve config has no experts")]
    NoExperts,

    #[error("solve config requests zero attempts")]
    ZeroAttempts,
}

/// Result type for the solver facade.
pub type SolveResult<T> = std::result::Result<T, SolveError>;

/// What one solve produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveReport {
    pub solve_id: Uuid,
    /// Up to K ranked attempts, each aligned to the puzzle's test inputs.
    pub attempts: Vec<RankedAttempt>,
    /// Attempts recorded per expert, in config order.
    pub expert_attempt_counts: Vec<usize>,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

/// Solve one puzzle: run the ensemble, tally the votes, emit K attempts.
///
/// Pure composition; every policy lives in the coordinator, experts, and
/// voter. Cancellation of the returned future aborts all expert tasks.
#[instrument(skip_all, fields(experts = config.experts.len(), k = config.attempts))]
pub async fn solve(
    puzzle: &Puzzle,
    config: &SolveConfig,
    gateway: Arc<dyn ModelGateway>,
    runner: Arc<dyn TransformRunner>,
) -> SolveResult<SolveReport> {
    if config.experts.is_empty() {
        return Err(SolveError::NoExperts);
    }
    if config.attempts == 0 {
        return Err(SolveError::ZeroAttempts);
    }

    let solve_id = Uuid::new_v4();
    let started = Instant::now();
    obs::emit_solve_started(
        &solve_id.to_string(),
        config.experts.len(),
        puzzle.train_count(),
        puzzle.test_count(),
    );

    let histories = run_ensemble(
        puzzle,
        &config.experts,
        config.base_seed,
        gateway,
        runner,
    )
    .await;

    let expert_attempt_counts: Vec<usize> = histories.iter().map(|h| h.len()).collect();
    let candidates: Vec<_> = histories.into_iter().flatten().collect();

    let groups = tally_groups(&candidates);
    obs::emit_votes_tallied(
        candidates.len(),
        groups.len(),
        groups.iter().filter(|g| g.contains_passer).count(),
    );

    let attempts = select_ranked(&groups, config.attempts, puzzle.test_count());
    let duration_ms = started.elapsed().as_millis() as u64;
    obs::emit_solve_finished(&solve_id.to_string(), attempts.len(), duration_ms);

    Ok(SolveReport {
        solve_id,
        attempts,
        expert_attempt_counts,
        duration_ms,
        finished_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmind_domain::{Grid, TrainExample};

    use crate::fakes::{ScriptedGateway, TableTransformRunner};

    fn grid(rows: &[&[u8]]) -> Grid {
        Grid::new(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    fn puzzle() -> Puzzle {
        let input = grid(&[&[1, 2], &[3, 4]]);
        let output = grid(&[&[1, 3], &[2, 4]]);
        Puzzle::new(vec![TrainExample::new(input.clone(), output)], vec![input]).unwrap()
    }

    #[tokio::test]
    async fn test_solve_rejects_degenerate_configs() {
        let gateway = Arc::new(ScriptedGateway::new());
        let runner = Arc::new(TableTransformRunner::new());

        let no_experts = SolveConfig {
            experts: vec![],
            ..SolveConfig::default()
        };
        assert!(matches!(
            solve(&puzzle(), &no_experts, Arc::clone(&gateway) as _, Arc::clone(&runner) as _).await,
            Err(SolveError::NoExperts)
        ));

        let zero_attempts = SolveConfig {
            attempts: 0,
            ..SolveConfig::default()
        };
        assert!(matches!(
            solve(&puzzle(), &zero_attempts, gateway, runner).await,
            Err(SolveError::ZeroAttempts)
        ));
    }

    #[tokio::test]
    async fn test_solve_reports_expert_counts_and_duration() {
        let gateway = Arc::new(
            ScriptedGateway::new().with_responses("model-a", ["```python\ntranspose\n```"]),
        );
        let config = SolveConfig {
            experts: vec![ExpertConfig::new("solo", "model-a")],
            attempts: 2,
            base_seed: 42,
        };

        let report = solve(
            &puzzle(),
            &config,
            gateway,
            Arc::new(TableTransformRunner::new()),
        )
        .await
        .unwrap();

        assert_eq!(report.expert_attempt_counts, vec![1]);
        assert_eq!(report.attempts.len(), 1, "one group, one member");
        assert!(report.attempts[0].from_passer);
    }
}
