//! Gridmind Core Engine
//!
//! Ensemble Propose-Test-Refine reasoning over grid-transformation puzzles:
//! N experts iterate generate → sandbox → score → feedback concurrently, and
//! a fingerprint voter merges their attempt histories into the final ranked
//! predictions.

pub mod ensemble;
pub mod expert;
pub mod fakes;
pub mod feedback;
pub mod gateway;
pub mod obs;
pub mod sandbox;
pub mod scoring;
pub mod solver;
pub mod telemetry;
pub mod voting;

pub use ensemble::run_ensemble;
pub use expert::{run_expert, ExpertConfig};
pub use gateway::{
    BudgetKind, BudgetLedger, BudgetSnapshot, GatewayClient, GatewayConfig, GatewayError,
    GatewayResult, GenerateRequest, ModelGateway, ModelTransport, RateConfig,
};
pub use sandbox::{
    ExitReason, ProcessSandbox, SandboxConfig, SandboxError, SandboxOutcome, SandboxResult,
    TransformRunner,
};
pub use scoring::{failure_kind_for_exit, score_example};
pub use solver::{solve, SolveConfig, SolveError, SolveReport, SolveResult};
pub use telemetry::{init_tracing, LogFormat};
pub use voting::{select_ranked, tally_groups, vote, RankedAttempt, SolutionGroup};

/// Gridmind core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
