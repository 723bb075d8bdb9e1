//! Deterministic in-process fakes for engine tests.
//!
//! Mirrors the production seams: [`ScriptedGateway`] replays canned model
//! responses per model id, and [`TableTransformRunner`] interprets a small
//! vocabulary of named grid transforms in pure Rust so the full PTR loop can
//! be exercised without a network or a Python interpreter.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use gridmind_domain::Grid;

use crate::gateway::{BudgetSnapshot, GatewayError, GatewayResult, GenerateRequest, ModelGateway};
use crate::sandbox::{ExitReason, SandboxOutcome, SandboxResult, TransformRunner};

/// Gateway fake replaying a scripted response sequence per model id.
///
/// Each `generate` call pops the next scripted entry for the requested model;
/// an exhausted script yields a fatal error. An optional call ceiling makes
/// the budgets report exhaustion after N calls, for termination tests.
#[derive(Default)]
pub struct ScriptedGateway {
    scripts: Mutex<HashMap<String, VecDeque<GatewayResult<String>>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    exhaust_after: Option<usize>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue successful responses for a model.
    pub fn with_responses<S: Into<String>>(
        self,
        model_id: &str,
        responses: impl IntoIterator<Item = S>,
    ) -> Self {
        self.with_script(model_id, responses.into_iter().map(|r| Ok(r.into())))
    }

    /// Queue raw results (successes and errors) for a model.
    pub fn with_script(
        self,
        model_id: &str,
        script: impl IntoIterator<Item = GatewayResult<String>>,
    ) -> Self {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(model_id.to_string())
            .or_default()
            .extend(script);
        self
    }

    /// Report exhausted budgets once `calls` generate calls have completed.
    pub fn exhaust_after(mut self, calls: usize) -> Self {
        self.exhaust_after = Some(calls);
        self
    }

    /// Total `generate` calls observed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn budgets_spent(&self) -> bool {
        self.exhaust_after
            .map(|limit| self.call_count() >= limit)
            .unwrap_or(false)
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn generate(&self, request: &GenerateRequest) -> GatewayResult<String> {
        if self.budgets_spent() {
            return Err(GatewayError::BudgetExhausted {
                kind: crate::gateway::BudgetKind::WallClock,
            });
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.prompt.clone());
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&request.model_id)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| {
                Err(GatewayError::Fatal {
                    detail: format!("script exhausted for model {}", request.model_id),
                })
            })
    }

    fn budgets(&self) -> BudgetSnapshot {
        if self.budgets_spent() {
            BudgetSnapshot {
                remaining_time: Duration::ZERO,
                remaining_timeouts: 0,
            }
        } else {
            BudgetSnapshot::unlimited()
        }
    }
}

/// Sandbox fake interpreting named transforms in pure Rust.
///
/// Recognized programs (the full trimmed program text):
/// - `identity`, `transpose`, `rotate_cw`, `rotate_ccw`, `flip_h`, `flip_v`
/// - `const:<json matrix>` — always returns the given grid
/// - `loop_forever` — reports a killed-on-timeout outcome
/// - `raise:<message>` — reports a non-zero exit with the message as stderr
/// - `emit_garbage` — reports unparseable output
///
/// Anything else reports a non-zero exit naming the unknown transform.
#[derive(Debug, Clone, Default)]
pub struct TableTransformRunner;

impl TableTransformRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransformRunner for TableTransformRunner {
    async fn run(&self, program: &str, input: &Grid) -> SandboxResult<SandboxOutcome> {
        let program = program.trim();

        if program == "loop_forever" {
            return Ok(SandboxOutcome {
                predicted: None,
                stderr_tail: "killed after 1500ms".to_string(),
                exit: ExitReason::KilledTimeout,
            });
        }
        if program == "emit_garbage" {
            return Ok(SandboxOutcome {
                predicted: None,
                stderr_tail: String::new(),
                exit: ExitReason::UnparseableOutput,
            });
        }
        if let Some(message) = program.strip_prefix("raise:") {
            return Ok(SandboxOutcome {
                predicted: None,
                stderr_tail: message.trim().to_string(),
                exit: ExitReason::Nonzero,
            });
        }
        if let Some(json) = program.strip_prefix("const:") {
            return Ok(match serde_json::from_str::<Grid>(json.trim()) {
                Ok(grid) => ok_outcome(grid),
                Err(_) => SandboxOutcome {
                    predicted: None,
                    stderr_tail: "const grid is not valid".to_string(),
                    exit: ExitReason::UnparseableOutput,
                },
            });
        }

        let rows = input.rows();
        let (height, width) = input.shape();
        let transformed: Option<Vec<Vec<u8>>> = match program {
            "identity" => Some(rows.to_vec()),
            "transpose" => Some(
                (0..width)
                    .map(|c| (0..height).map(|r| rows[r][c]).collect())
                    .collect(),
            ),
            "rotate_cw" => Some(
                (0..width)
                    .map(|c| (0..height).rev().map(|r| rows[r][c]).collect())
                    .collect(),
            ),
            "rotate_ccw" => Some(
                (0..width)
                    .rev()
                    .map(|c| (0..height).map(|r| rows[r][c]).collect())
                    .collect(),
            ),
            "flip_h" => Some(
                rows.iter()
                    .map(|row| row.iter().rev().copied().collect())
                    .collect(),
            ),
            "flip_v" => Some(rows.iter().rev().cloned().collect()),
            _ => None,
        };

        Ok(match transformed.map(Grid::new) {
            Some(Ok(grid)) => ok_outcome(grid),
            _ => SandboxOutcome {
                predicted: None,
                stderr_tail: format!("unknown transform: {program}"),
                exit: ExitReason::Nonzero,
            },
        })
    }
}

fn ok_outcome(predicted: Grid) -> SandboxOutcome {
    SandboxOutcome {
        predicted: Some(predicted),
        stderr_tail: String::new(),
        exit: ExitReason::Ok,
    }
}
