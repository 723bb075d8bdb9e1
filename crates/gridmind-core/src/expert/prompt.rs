//! Prompt assembly for one PTR turn.

use rand::rngs::StdRng;
use rand::Rng;

use gridmind_domain::{Attempt, Grid, TrainExample};

use super::ExpertConfig;
use crate::feedback::{render_feedback, render_problem};

/// Instructions appended after the problem section.
pub const BASE_INSTRUCTIONS: &str = "\
Study the transformation from each input grid to its output grid, then write \
a Python function `transform(grid)` that takes one grid (a list of lists of \
integers 0-9) and returns the transformed grid. The same function must map \
every training input to its training output. Respond with the complete \
function inside a fenced code block.";

/// Header introducing the feedback section when prior attempts are included.
const FEEDBACK_HEADER: &str = "\
Your previous attempts did not solve every training example. Study the \
diagnostics below and write an improved transform.";

/// Pick which past attempts to show the model this turn.
///
/// Takes the best `max_solutions` attempts by aggregate score — equal scores
/// prefer the most recent refinement — then keeps each independently with
/// probability `selection_probability`, and orders the survivors worst→best
/// when `improving_order` is set, best→worst otherwise.
pub fn select_past_attempts<'a>(
    history: &'a [Attempt],
    config: &ExpertConfig,
    rng: &mut StdRng,
) -> Vec<&'a Attempt> {
    let mut candidates: Vec<&Attempt> = history.iter().collect();
    candidates.sort_by(|a, b| {
        b.aggregate_score
            .total_cmp(&a.aggregate_score)
            .then(b.iteration_index.cmp(&a.iteration_index))
    });
    candidates.truncate(config.max_solutions);

    let p = config.selection_probability.clamp(0.0, 1.0);
    let mut selected: Vec<&Attempt> = candidates
        .into_iter()
        .filter(|_| rng.random_bool(p))
        .collect();

    if config.improving_order {
        selected.sort_by(|a, b| {
            a.aggregate_score
                .total_cmp(&b.aggregate_score)
                .then(a.iteration_index.cmp(&b.iteration_index))
        });
    } else {
        selected.sort_by(|a, b| {
            b.aggregate_score
                .total_cmp(&a.aggregate_score)
                .then(b.iteration_index.cmp(&a.iteration_index))
        });
    }
    selected
}

/// Assemble the full prompt for one turn.
///
/// `ordered` is the (possibly shuffled) presentation order of the training
/// examples; `train` is the original order, which per-example diagnostics in
/// the feedback section are aligned to.
pub fn build_prompt(
    ordered: &[&TrainExample],
    test_inputs: &[Grid],
    past: &[&Attempt],
    train: &[TrainExample],
) -> String {
    let mut prompt = render_problem(ordered, test_inputs);
    prompt.push_str("\n\n");
    prompt.push_str(BASE_INSTRUCTIONS);

    if !past.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(FEEDBACK_HEADER);
        prompt.push_str("\n\n");
        prompt.push_str(&render_feedback(past, train));
    }
    prompt
}
