//! Error types for the gateway layer.

use super::budget::BudgetKind;

/// Errors surfaced by gateway calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// Rate-limit signal, transient server error, connection drop. Retried
    /// internally by [`super::GatewayClient`]; experts only see this from a
    /// raw transport.
    #[error("transient gateway failure: {detail}")]
    Transient { detail: String },

    /// Non-retryable failure; carries a short diagnostic.
    #[error("fatal gateway failure: {detail}")]
    Fatal { detail: String },

    /// Transient retries were exhausted without a success.
    #[error("gateway retries exhausted after {attempts} attempt(s): {detail}")]
    RetriesExhausted { attempts: u32, detail: String },

    /// A process-wide budget hit zero; callers should terminate their loops.
    #[error("gateway budget exhausted: {kind}")]
    BudgetExhausted { kind: BudgetKind },
}

impl GatewayError {
    /// Whether the expert loop should stop issuing calls.
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(self, GatewayError::BudgetExhausted { .. })
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
