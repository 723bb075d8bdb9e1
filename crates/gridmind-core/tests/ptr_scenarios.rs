//! End-to-end Propose-Test-Refine scenarios for a single expert, driven by a
//! scripted gateway and the table transform runner.

use std::sync::Arc;

use gridmind_core::expert::{run_expert, ExpertConfig};
use gridmind_core::fakes::{ScriptedGateway, TableTransformRunner};
use gridmind_domain::{FailureKind, Grid, Puzzle, TrainExample};

fn grid(rows: &[&[u8]]) -> Grid {
    Grid::new(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
}

fn fenced(program: &str) -> String {
    format!("Here is the transform:\n```python\n{program}\n```")
}

/// Training pair defining rotate-counterclockwise, with one test input.
fn rotation_puzzle() -> Puzzle {
    let input = grid(&[&[0, 1], &[1, 0]]);
    let output = grid(&[&[1, 0], &[0, 1]]);
    Puzzle::new(
        vec![TrainExample::new(input, output)],
        vec![grid(&[&[1, 1], &[0, 0]])],
    )
    .unwrap()
}

#[tokio::test]
async fn test_immediate_passer_terminates_at_iteration_zero() {
    let gateway = Arc::new(
        ScriptedGateway::new().with_responses("model-a", [fenced("rotate_ccw")]),
    );
    let config = ExpertConfig::new("deep", "model-a").with_max_iterations(5);

    let history = run_expert(
        &rotation_puzzle(),
        &config,
        "deep#0",
        0,
        Arc::clone(&gateway) as _,
        Arc::new(TableTransformRunner::new()),
    )
    .await;

    assert_eq!(history.len(), 1);
    let attempt = &history[0];
    assert!(attempt.all_pass);
    assert_eq!(attempt.aggregate_score, 1.0);
    assert_eq!(attempt.iteration_index, 0);
    assert_eq!(
        attempt.test_predictions[0],
        Some(grid(&[&[1, 0], &[1, 0]]))
    );
    // Early exit: exactly one gateway call despite a cap of five.
    assert_eq!(gateway.call_count(), 1);
}

#[tokio::test]
async fn test_refinement_after_a_wrong_transform() {
    // Training defines rotate-clockwise; the first response is a horizontal
    // flip, the second (after diff feedback) the correct rotation.
    let input = grid(&[&[1, 2], &[3, 4]]);
    let output = grid(&[&[3, 1], &[4, 2]]);
    let puzzle = Puzzle::new(
        vec![TrainExample::new(input.clone(), output)],
        vec![input],
    )
    .unwrap();

    let gateway = Arc::new(
        ScriptedGateway::new()
            .with_responses("model-a", [fenced("flip_h"), fenced("rotate_cw")]),
    );
    let config = ExpertConfig::new("deep", "model-a").with_max_iterations(5);

    let history = run_expert(
        &puzzle,
        &config,
        "deep#0",
        7,
        Arc::clone(&gateway) as _,
        Arc::new(TableTransformRunner::new()),
    )
    .await;

    assert_eq!(history.len(), 2);
    assert!(!history[0].all_pass);
    // flip_h of [[1,2],[3,4]] is [[2,1],[4,3]]; two of four cells match the
    // rotation.
    assert!((history[0].aggregate_score - 0.5).abs() < 1e-6);
    assert!(history[1].all_pass);
    assert_eq!(history[1].iteration_index, 1);

    // The second prompt must carry feedback with a predicted/expected diff.
    let prompts = gateway.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(!prompts[0].contains("Previous attempt"));
    assert!(prompts[1].contains("Previous attempt 1"));
    assert!(prompts[1].contains("2/3"), "diff cell missing: {}", prompts[1]);
}

#[tokio::test]
async fn test_shape_mismatch_is_scored_zero_and_expert_continues() {
    let input = grid(&[&[0, 1], &[1, 0]]);
    let output = grid(&[&[1, 0], &[0, 1]]);
    let puzzle = Puzzle::new(
        vec![TrainExample::new(input.clone(), output)],
        vec![input],
    )
    .unwrap();

    let wrong_shape = "const:[[0,0,0],[0,0,0],[0,0,0]]";
    let gateway = Arc::new(
        ScriptedGateway::new()
            .with_responses("model-a", [fenced(wrong_shape), fenced(wrong_shape)]),
    );
    let config = ExpertConfig::new("deep", "model-a").with_max_iterations(2);

    let history = run_expert(
        &puzzle,
        &config,
        "deep#0",
        0,
        Arc::clone(&gateway) as _,
        Arc::new(TableTransformRunner::new()),
    )
    .await;

    assert_eq!(history.len(), 2, "expert proceeds past the mismatch");
    let result = &history[0].train_results[0];
    assert_eq!(result.failure_kind, FailureKind::ShapeMismatch);
    assert_eq!(result.soft_score, 0.0);

    // Both shapes appear in the feedback relayed on the second turn.
    let prompts = gateway.prompts();
    assert!(prompts[1].contains("expected 2x2"));
    assert!(prompts[1].contains("got 3x3"));
}

#[tokio::test]
async fn test_timeout_is_scored_zero_and_expert_continues() {
    let gateway = Arc::new(
        ScriptedGateway::new()
            .with_responses("model-a", [fenced("loop_forever"), fenced("loop_forever")]),
    );
    let config = ExpertConfig::new("deep", "model-a").with_max_iterations(2);

    let history = run_expert(
        &rotation_puzzle(),
        &config,
        "deep#0",
        0,
        Arc::clone(&gateway) as _,
        Arc::new(TableTransformRunner::new()),
    )
    .await;

    assert_eq!(history.len(), 2);
    for attempt in &history {
        assert_eq!(attempt.train_results[0].failure_kind, FailureKind::Timeout);
        assert_eq!(attempt.aggregate_score, 0.0);
        assert_eq!(attempt.test_predictions, vec![None]);
    }
}

#[tokio::test]
async fn test_no_code_response_records_no_code_failure() {
    let gateway = Arc::new(ScriptedGateway::new().with_responses("model-a", ["   \n  "]));
    let config = ExpertConfig::new("deep", "model-a").with_max_iterations(1);

    let history = run_expert(
        &rotation_puzzle(),
        &config,
        "deep#0",
        0,
        Arc::clone(&gateway) as _,
        Arc::new(TableTransformRunner::new()),
    )
    .await;

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].program, "");
    assert_eq!(history[0].train_results[0].failure_kind, FailureKind::NoCode);
}

#[tokio::test]
async fn test_fatal_gateway_error_records_empty_attempt_and_continues() {
    // No script for the model: every call fails fatally. The expert records
    // a zero-score attempt per turn and runs to its cap.
    let gateway = Arc::new(ScriptedGateway::new());
    let config = ExpertConfig::new("deep", "missing-model").with_max_iterations(3);

    let history = run_expert(
        &rotation_puzzle(),
        &config,
        "deep#0",
        0,
        Arc::clone(&gateway) as _,
        Arc::new(TableTransformRunner::new()),
    )
    .await;

    assert_eq!(history.len(), 3);
    for attempt in &history {
        assert_eq!(attempt.program, "");
        assert_eq!(attempt.aggregate_score, 0.0);
        assert_eq!(
            attempt.train_results[0].failure_kind,
            FailureKind::RuntimeError
        );
    }
}

#[tokio::test]
async fn test_budget_exhaustion_terminates_the_loop() {
    let bad = fenced("raise: wrong every time");
    let gateway = Arc::new(
        ScriptedGateway::new()
            .with_responses("model-a", vec![bad.clone(); 10])
            .exhaust_after(3),
    );
    let config = ExpertConfig::new("deep", "model-a").with_max_iterations(10);

    let history = run_expert(
        &rotation_puzzle(),
        &config,
        "deep#0",
        0,
        Arc::clone(&gateway) as _,
        Arc::new(TableTransformRunner::new()),
    )
    .await;

    assert_eq!(gateway.call_count(), 3, "no calls after exhaustion");
    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn test_return_best_result_false_hides_non_passing_history() {
    let gateway = Arc::new(
        ScriptedGateway::new().with_responses("model-a", [fenced("raise: nope")]),
    );
    let config = ExpertConfig {
        return_best_result: false,
        ..ExpertConfig::new("deep", "model-a").with_max_iterations(1)
    };

    let history = run_expert(
        &rotation_puzzle(),
        &config,
        "deep#0",
        0,
        Arc::clone(&gateway) as _,
        Arc::new(TableTransformRunner::new()),
    )
    .await;

    assert!(history.is_empty());
}

#[tokio::test]
async fn test_prompts_are_reproducible_for_a_fixed_seed() {
    let responses = || [fenced("raise: a"), fenced("raise: b")];
    let puzzle = {
        let a = grid(&[&[1]]);
        let b = grid(&[&[2]]);
        let c = grid(&[&[3]]);
        let d = grid(&[&[4]]);
        Puzzle::new(
            vec![
                TrainExample::new(a.clone(), b.clone()),
                TrainExample::new(b, c.clone()),
                TrainExample::new(c, d.clone()),
                TrainExample::new(d, a.clone()),
            ],
            vec![a],
        )
        .unwrap()
    };
    let config = ExpertConfig::new("deep", "model-a")
        .with_max_iterations(2)
        .with_shuffle_examples(true);

    let mut runs = Vec::new();
    for _ in 0..2 {
        let gateway = Arc::new(ScriptedGateway::new().with_responses("model-a", responses()));
        run_expert(
            &puzzle,
            &config,
            "deep#0",
            1234,
            Arc::clone(&gateway) as _,
            Arc::new(TableTransformRunner::new()),
        )
        .await;
        runs.push(gateway.prompts());
    }
    assert_eq!(runs[0], runs[1], "identical seeds must replay identical prompts");
}
