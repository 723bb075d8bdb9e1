//! Child-process execution of candidate transform programs.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use gridmind_domain::Grid;

use super::error::{SandboxError, SandboxResult};

/// Python shim executed in the child via `-c`.
///
/// Reads one JSON document `{"program": …, "grid": …}` from stdin, executes
/// the program in a fresh namespace, calls its `transform` function on the
/// grid, and prints the result as JSON on stdout. Any raised exception exits
/// non-zero with the traceback on stderr.
const CHILD_SHIM: &str = r#"
import json, sys
payload = json.load(sys.stdin)
namespace = {}
exec(payload["program"], namespace)
fn = namespace.get("transform")
if fn is None:
    print("no transform function defined", file=sys.stderr)
    sys.exit(3)
result = fn(payload["grid"])
json.dump(result, sys.stdout)
"#;

/// How a sandbox child run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Child exited zero and printed a valid grid.
    Ok,
    /// Child exited non-zero (uncaught exception, explicit exit).
    Nonzero,
    /// Child exceeded the wall-clock limit and was killed.
    KilledTimeout,
    /// Child exited zero but stdout was not a valid grid.
    UnparseableOutput,
}

/// Structured record returned to the caller for one program execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxOutcome {
    /// The validated output grid, when the child produced one.
    pub predicted: Option<Grid>,
    /// Bounded tail of the child's stderr.
    pub stderr_tail: String,
    pub exit: ExitReason,
}

impl SandboxOutcome {
    fn killed(limit_ms: u64) -> Self {
        Self {
            predicted: None,
            stderr_tail: format!("killed after {limit_ms}ms"),
            exit: ExitReason::KilledTimeout,
        }
    }
}

/// Configuration for the process sandbox.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SandboxConfig {
    /// Interpreter binary used for the child process.
    pub python_bin: String,
    /// Wall-clock limit for a single execution (milliseconds).
    pub timeout_ms: u64,
    /// Maximum bytes of stderr retained as diagnostic.
    pub stderr_tail_bytes: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            python_bin: "python3".to_string(),
            timeout_ms: 1_500,
            stderr_tail_bytes: 2_048,
        }
    }
}

/// Executes one candidate program against one input grid.
///
/// Implementations must be safe to call concurrently; the engine shares one
/// runner across all experts.
#[async_trait]
pub trait TransformRunner: Send + Sync {
    async fn run(&self, program: &str, input: &Grid) -> SandboxResult<SandboxOutcome>;
}

/// Production runner: executes the program in an isolated child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessSandbox {
    config: SandboxConfig,
}

#[derive(Serialize)]
struct ChildPayload<'a> {
    program: &'a str,
    grid: &'a Grid,
}

impl ProcessSandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }
}

#[async_trait]
impl TransformRunner for ProcessSandbox {
    async fn run(&self, program: &str, input: &Grid) -> SandboxResult<SandboxOutcome> {
        let payload = serde_json::to_vec(&ChildPayload {
            program,
            grid: input,
        })?;

        let mut child = Command::new(&self.config.python_bin)
            .arg("-c")
            .arg(CHILD_SHIM)
            // Deterministic hashing: identical program + input must yield
            // identical output across runs.
            .env("PYTHONHASHSEED", "0")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SandboxError::Spawn {
                command: self.config.python_bin.clone(),
                source,
            })?;

        let mut stdin = child.stdin.take().ok_or(SandboxError::StdinUnavailable)?;
        stdin.write_all(&payload).await?;
        drop(stdin);

        let limit = Duration::from_millis(self.config.timeout_ms);
        let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_elapsed) => {
                // Dropping the wait future drops the child handle, which
                // kills the process (kill_on_drop).
                debug!(limit_ms = self.config.timeout_ms, "sandbox child killed on timeout");
                return Ok(SandboxOutcome::killed(self.config.timeout_ms));
            }
        };

        let stderr_tail = tail_lossy(&output.stderr, self.config.stderr_tail_bytes);

        if !output.status.success() {
            return Ok(SandboxOutcome {
                predicted: None,
                stderr_tail,
                exit: ExitReason::Nonzero,
            });
        }

        match parse_child_stdout(&output.stdout) {
            Some(grid) => Ok(SandboxOutcome {
                predicted: Some(grid),
                stderr_tail,
                exit: ExitReason::Ok,
            }),
            None => {
                warn!("sandbox child exited zero with unparseable output");
                Ok(SandboxOutcome {
                    predicted: None,
                    stderr_tail,
                    exit: ExitReason::UnparseableOutput,
                })
            }
        }
    }
}

/// Parse and validate the child's stdout as a grid.
///
/// Accepts only a JSON matrix of integers in 0..=9 that passes the domain
/// rectangularity check.
pub(crate) fn parse_child_stdout(stdout: &[u8]) -> Option<Grid> {
    let raw: Vec<Vec<i64>> = serde_json::from_slice(stdout).ok()?;
    let mut rows = Vec::with_capacity(raw.len());
    for raw_row in raw {
        let mut row = Vec::with_capacity(raw_row.len());
        for value in raw_row {
            if !(0..=9).contains(&value) {
                return None;
            }
            row.push(value as u8);
        }
        rows.push(row);
    }
    Grid::new(rows).ok()
}

/// Last `cap` bytes of `bytes` as lossy UTF-8, trimmed to a char boundary.
pub(crate) fn tail_lossy(bytes: &[u8], cap: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end();
    if text.len() <= cap {
        return text.to_string();
    }
    let mut start = text.len() - cap;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}
