//! Language-model gateway contract and client-side plumbing.
//!
//! The model transport itself (HTTP, SDK, whatever) lives outside the core
//! behind the [`ModelTransport`] trait. Everything the engine relies on —
//! per-model request-rate caps, transient-failure retry, and the
//! process-wide time/timeout budgets — is composed here in
//! [`GatewayClient`], the one place that sees every outgoing call.
//!
//! # Modules
//!
//! - [`budget`]     — `BudgetLedger`, `BudgetSnapshot`, `BudgetKind`
//! - [`rate_limit`] — per-model `TokenBucket`
//! - [`client`]     — `GatewayClient`, `GatewayConfig`, `RateConfig`
//! - [`error`]      — `GatewayError` / `GatewayResult`

pub mod budget;
pub mod client;
pub mod error;
pub mod rate_limit;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use budget::{BudgetKind, BudgetLedger, BudgetSnapshot};
pub use client::{GatewayClient, GatewayConfig, RateConfig};
pub use error::{GatewayError, GatewayResult};
pub use rate_limit::TokenBucket;

/// One generation request as the engine sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model_id: String,
    pub prompt: String,
    pub temperature: f32,
    pub seed: u64,
    /// Opaque model options forwarded verbatim (thinking budgets, …).
    #[serde(default)]
    pub extras: serde_json::Value,
}

/// The call surface experts depend on.
///
/// `generate` returns the raw assistant text on success and a typed error on
/// fatal failure; transient failures are absorbed by the implementation.
/// `budgets` exposes the process-wide remaining budgets so the expert loop
/// can terminate itself once they run dry. Reads may be slightly stale; the
/// gateway also fails fast on exhaustion, so racy reads are acceptable.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> GatewayResult<String>;

    fn budgets(&self) -> BudgetSnapshot;
}

/// The raw transport underneath [`GatewayClient`]: a single attempt against a
/// single model, no retry, no budgeting.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    async fn call(&self, request: &GenerateRequest) -> GatewayResult<String>;
}
