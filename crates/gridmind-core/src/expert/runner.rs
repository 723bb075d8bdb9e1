//! The Propose-Test-Refine loop.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, instrument, warn, Instrument};

use gridmind_domain::{
    Attempt, ExampleResult, ExpertHistory, FailureKind, Grid, Puzzle, TrainExample,
};

use super::extract::extract_program;
use super::prompt::{build_prompt, select_past_attempts};
use super::ExpertConfig;
use crate::gateway::{GenerateRequest, ModelGateway};
use crate::obs;
use crate::sandbox::TransformRunner;
use crate::scoring::score_example;

/// Run one expert's full PTR loop and return its attempt history.
///
/// Per turn `i`, the prompt seed and gateway seed are `seed + i`, so a fixed
/// base seed reproduces the entire run. Sandbox and scorer failures are never
/// fatal here; they become zero-scored results that feed the next prompt.
/// Termination: first full pass, exhausted gateway budgets, or the iteration
/// cap — whichever comes first.
#[instrument(skip_all, fields(expert_id = %expert_id, seed = seed))]
pub async fn run_expert(
    puzzle: &Puzzle,
    config: &ExpertConfig,
    expert_id: &str,
    seed: u64,
    gateway: Arc<dyn ModelGateway>,
    runner: Arc<dyn TransformRunner>,
) -> ExpertHistory {
    let span = obs::ExpertSpan::span(expert_id);
    run_expert_inner(puzzle, config, expert_id, seed, gateway, runner)
        .instrument(span)
        .await
}

async fn run_expert_inner(
    puzzle: &Puzzle,
    config: &ExpertConfig,
    expert_id: &str,
    seed: u64,
    gateway: Arc<dyn ModelGateway>,
    runner: Arc<dyn TransformRunner>,
) -> ExpertHistory {
    let mut history: ExpertHistory = Vec::new();

    for i in 0..config.max_iterations {
        let turn_seed = seed.wrapping_add(i as u64);
        let mut rng = StdRng::seed_from_u64(turn_seed);

        let mut ordered: Vec<&TrainExample> = puzzle.train().iter().collect();
        if config.shuffle_examples {
            ordered.shuffle(&mut rng);
        }
        let past = select_past_attempts(&history, config, &mut rng);
        let prompt = build_prompt(&ordered, puzzle.test_inputs(), &past, puzzle.train());

        let request = GenerateRequest {
            model_id: config.model_id.clone(),
            prompt,
            temperature: config.temperature,
            seed: turn_seed,
            extras: config.model_extras.clone(),
        };

        let built = match gateway.generate(&request).await {
            Ok(response) => match extract_program(&response) {
                Some(program) => {
                    let (train_results, test_predictions) =
                        evaluate_program(&program, puzzle, runner.as_ref()).await;
                    Attempt::new(
                        program,
                        train_results,
                        test_predictions,
                        i,
                        expert_id,
                        config.count_failed_matches,
                    )
                }
                None => Attempt::new(
                    "",
                    uniform_failure(puzzle, FailureKind::NoCode, "no code in model response"),
                    vec![None; puzzle.test_count()],
                    i,
                    expert_id,
                    config.count_failed_matches,
                ),
            },
            Err(err) if err.is_budget_exhausted() => {
                debug!(iteration = i, "gateway budgets exhausted, terminating loop");
                break;
            }
            Err(err) => {
                warn!(iteration = i, error = %err, "gateway call failed");
                Attempt::new(
                    "",
                    uniform_failure(puzzle, FailureKind::RuntimeError, err.to_string()),
                    vec![None; puzzle.test_count()],
                    i,
                    expert_id,
                    config.count_failed_matches,
                )
            }
        };

        let attempt = match built {
            Ok(attempt) => attempt,
            Err(err) => {
                warn!(iteration = i, error = %err, "could not record attempt");
                break;
            }
        };

        obs::emit_attempt_scored(expert_id, i, attempt.aggregate_score, attempt.all_pass);
        let solved = attempt.all_pass;
        history.push(attempt);

        if solved {
            info!(iteration = i, "all training examples solved");
            break;
        }
        if let Some(kind) = gateway.budgets().exhausted() {
            debug!(iteration = i, budget = %kind, "budget exhausted after turn");
            break;
        }
    }

    let found_passer = history.iter().any(|a| a.all_pass);
    obs::emit_expert_finished(expert_id, history.len(), found_passer);

    if !config.return_best_result && !found_passer {
        return Vec::new();
    }
    history
}

/// Execute a program against every training pair and every test input.
///
/// Training results keep the puzzle's original example order regardless of
/// any prompt-side shuffle. Host-side sandbox errors degrade to zero-scored
/// runtime errors.
async fn evaluate_program(
    program: &str,
    puzzle: &Puzzle,
    runner: &dyn TransformRunner,
) -> (Vec<ExampleResult>, Vec<Option<Grid>>) {
    let mut train_results = Vec::with_capacity(puzzle.train_count());
    for example in puzzle.train() {
        let result = match runner.run(program, &example.input).await {
            Ok(outcome) => score_example(&outcome, &example.output),
            Err(err) => {
                warn!(error = %err, "sandbox harness failure on training example");
                ExampleResult::failed(FailureKind::RuntimeError, 0.0, None, err.to_string())
            }
        };
        train_results.push(result);
    }

    let mut test_predictions = Vec::with_capacity(puzzle.test_count());
    for input in puzzle.test_inputs() {
        let predicted = match runner.run(program, input).await {
            Ok(outcome) => outcome.predicted,
            Err(err) => {
                warn!(error = %err, "sandbox harness failure on test input");
                None
            }
        };
        test_predictions.push(predicted);
    }

    (train_results, test_predictions)
}

/// The same failure on every training example (no_code, gateway failure).
fn uniform_failure(
    puzzle: &Puzzle,
    kind: FailureKind,
    diagnostic: impl Into<String>,
) -> Vec<ExampleResult> {
    let diagnostic = diagnostic.into();
    puzzle
        .train()
        .iter()
        .map(|_| ExampleResult::failed(kind, 0.0, None, diagnostic.clone()))
        .collect()
}
