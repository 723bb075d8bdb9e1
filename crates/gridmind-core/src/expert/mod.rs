//! Expert: one independent Propose-Test-Refine solver.
//!
//! An expert repeatedly builds a prompt, calls the gateway, extracts code,
//! executes it against every training pair, scores the results, records the
//! attempt, and decides for itself whether to continue — stopping on a full
//! pass, on exhausted gateway budgets, or at its iteration cap.
//!
//! # Modules
//!
//! - [`prompt`]  — prompt assembly and past-attempt selection
//! - [`extract`] — code extraction from model responses
//! - [`runner`]  — the PTR loop itself

pub mod extract;
pub mod prompt;
pub mod runner;

use serde::{Deserialize, Serialize};

pub use extract::extract_program;
pub use prompt::{build_prompt, select_past_attempts, BASE_INSTRUCTIONS};
pub use runner::run_expert;

/// Configuration for one expert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpertConfig {
    /// Stable name; the coordinator suffixes `#k` per launched task.
    pub id: String,
    /// Model the gateway routes this expert's calls to.
    pub model_id: String,
    /// Hard cap on PTR turns.
    pub max_iterations: usize,
    /// Maximum past attempts included in the next prompt.
    pub max_solutions: usize,
    /// Bernoulli inclusion probability per remembered attempt.
    pub selection_probability: f64,
    /// When true, remembered attempts are ordered worst→best in the prompt.
    pub improving_order: bool,
    /// When true, training examples are shuffled each iteration (seeded).
    pub shuffle_examples: bool,
    /// When false, a history without a passer is returned empty.
    pub return_best_result: bool,
    /// Sampling temperature passed to the gateway.
    pub temperature: f32,
    /// Opaque model options forwarded to the gateway.
    #[serde(default)]
    pub model_extras: serde_json::Value,
    /// Voting hint: failed attempts matching a passer's fingerprint reinforce
    /// that group's vote count.
    pub count_failed_matches: bool,
}

impl Default for ExpertConfig {
    fn default() -> Self {
        Self {
            id: "expert".to_string(),
            model_id: "default".to_string(),
            max_iterations: 10,
            max_solutions: 5,
            selection_probability: 1.0,
            improving_order: false,
            shuffle_examples: false,
            return_best_result: true,
            temperature: 0.7,
            model_extras: serde_json::Value::Null,
            count_failed_matches: false,
        }
    }
}

impl ExpertConfig {
    pub fn new(id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model_id: model_id.into(),
            ..Self::default()
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_shuffle_examples(mut self, shuffle: bool) -> Self {
        self.shuffle_examples = shuffle;
        self
    }

    pub fn with_count_failed_matches(mut self, count: bool) -> Self {
        self.count_failed_matches = count;
        self
    }
}
