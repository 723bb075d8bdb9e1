//! Ensemble coordinator: N experts running concurrently on one puzzle.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use gridmind_domain::{ExpertHistory, Puzzle};

use crate::expert::{run_expert, ExpertConfig};
use crate::gateway::ModelGateway;
use crate::sandbox::TransformRunner;

/// Launch one task per expert config and collect every history.
///
/// Task *k* runs as `"{config.id}#{k}"` with seed `base_seed + k * stride`,
/// where the stride is the largest `max_iterations` across the configs, so
/// per-iteration seed streams never overlap between experts. A panicked or
/// cancelled expert contributes an empty history with a logged diagnostic;
/// its siblings keep running. Budgets are not enforced here — the gateway
/// enforces them per call, and `max_iterations` bounds each expert.
///
/// Dropping the returned future aborts every in-flight expert task, which is
/// how facade-level cancellation reaches the experts.
#[instrument(skip_all, fields(experts = configs.len(), base_seed = base_seed))]
pub async fn run_ensemble(
    puzzle: &Puzzle,
    configs: &[ExpertConfig],
    base_seed: u64,
    gateway: Arc<dyn ModelGateway>,
    runner: Arc<dyn TransformRunner>,
) -> Vec<ExpertHistory> {
    let stride = configs
        .iter()
        .map(|c| c.max_iterations)
        .max()
        .unwrap_or(0) as u64;

    let mut tasks: JoinSet<(usize, ExpertHistory)> = JoinSet::new();
    let mut task_slots: HashMap<tokio::task::Id, usize> = HashMap::new();

    for (k, config) in configs.iter().enumerate() {
        let expert_id = format!("{}#{}", config.id, k);
        let seed = base_seed.wrapping_add(k as u64 * stride);
        let puzzle = puzzle.clone();
        let config = config.clone();
        let gateway = Arc::clone(&gateway);
        let runner = Arc::clone(&runner);

        let handle = tasks.spawn(async move {
            let history =
                run_expert(&puzzle, &config, &expert_id, seed, gateway, runner).await;
            (k, history)
        });
        task_slots.insert(handle.id(), k);
    }

    let mut histories: Vec<ExpertHistory> = vec![Vec::new(); configs.len()];
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, (k, history))) => {
                debug!(slot = k, attempts = history.len(), "expert completed");
                histories[k] = history;
            }
            Err(err) => {
                let slot = task_slots.get(&err.id()).copied();
                warn!(slot = ?slot, error = %err, "expert task failed; recording empty history");
            }
        }
    }
    histories
}
