//! Budgeted, rate-limited, retrying gateway client.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::budget::{BudgetKind, BudgetLedger, BudgetSnapshot};
use super::error::{GatewayError, GatewayResult};
use super::rate_limit::TokenBucket;
use super::{GenerateRequest, ModelGateway, ModelTransport};

/// Request-rate settings for one model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateConfig {
    pub requests_per_sec: f64,
    pub burst: u32,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            requests_per_sec: 1.0,
            burst: 2,
        }
    }
}

/// Configuration for [`GatewayClient`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayConfig {
    /// Process-wide wall-clock budget across all calls (milliseconds).
    pub total_time_ms: u64,
    /// Process-wide allowance of request timeouts.
    pub total_timeouts: u32,
    /// Per-request timeout (milliseconds); clamped to the remaining
    /// wall-clock budget.
    pub request_timeout_ms: u64,
    /// Maximum internal retries of transient failures.
    pub max_transient_retries: u32,
    /// Base delay for exponential backoff between retries (milliseconds).
    pub backoff_base_ms: u64,
    /// Rate settings for models without an explicit entry.
    pub default_rate: RateConfig,
    /// Per-model rate overrides.
    #[serde(default)]
    pub model_rates: HashMap<String, RateConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            total_time_ms: 600_000,
            total_timeouts: 20,
            request_timeout_ms: 120_000,
            max_transient_retries: 3,
            backoff_base_ms: 500,
            default_rate: RateConfig::default(),
            model_rates: HashMap::new(),
        }
    }
}

/// The production [`ModelGateway`]: wraps a raw transport with per-model
/// token buckets, transient-failure retry, and the shared budget ledger.
///
/// This is the only place that sees every outgoing call, which makes it the
/// sound choke point for budget enforcement.
pub struct GatewayClient<T: ModelTransport> {
    transport: T,
    config: GatewayConfig,
    ledger: Arc<BudgetLedger>,
    buckets: Mutex<HashMap<String, Arc<TokenBucket>>>,
}

impl<T: ModelTransport> GatewayClient<T> {
    pub fn new(transport: T, config: GatewayConfig) -> Self {
        let ledger = Arc::new(BudgetLedger::new(
            Duration::from_millis(config.total_time_ms),
            config.total_timeouts,
        ));
        Self {
            transport,
            config,
            ledger,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    fn bucket_for(&self, model_id: &str) -> Arc<TokenBucket> {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bucket) = buckets.get(model_id) {
            return Arc::clone(bucket);
        }
        let rate = self
            .config
            .model_rates
            .get(model_id)
            .unwrap_or(&self.config.default_rate);
        let bucket = Arc::new(TokenBucket::new(rate.requests_per_sec, rate.burst));
        buckets.insert(model_id.to_string(), Arc::clone(&bucket));
        bucket
    }

    async fn call_with_retry(&self, request: &GenerateRequest) -> GatewayResult<String> {
        let max_attempts = self.config.max_transient_retries + 1;
        let mut detail = String::new();

        for attempt in 1..=max_attempts {
            let remaining = self.ledger.snapshot().remaining_time;
            if remaining.is_zero() {
                return Err(GatewayError::BudgetExhausted {
                    kind: BudgetKind::WallClock,
                });
            }
            let per_call = Duration::from_millis(self.config.request_timeout_ms).min(remaining);

            match tokio::time::timeout(per_call, self.transport.call(request)).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(GatewayError::Transient { detail: d })) => {
                    debug!(model = %request.model_id, attempt, error = %d, "transient gateway failure");
                    detail = d;
                    if attempt < max_attempts {
                        let delay = Duration::from_millis(
                            self.config.backoff_base_ms * 2u64.pow(attempt - 1),
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
                Ok(Err(other)) => return Err(other),
                Err(_elapsed) => {
                    self.ledger.charge_timeout();
                    warn!(model = %request.model_id, timeout_ms = per_call.as_millis() as u64, "gateway request timed out");
                    return Err(GatewayError::Fatal {
                        detail: format!("request timed out after {}ms", per_call.as_millis()),
                    });
                }
            }
        }

        Err(GatewayError::RetriesExhausted {
            attempts: max_attempts,
            detail,
        })
    }
}

#[async_trait]
impl<T: ModelTransport> ModelGateway for GatewayClient<T> {
    #[instrument(skip(self, request), fields(model = %request.model_id, seed = request.seed))]
    async fn generate(&self, request: &GenerateRequest) -> GatewayResult<String> {
        if let Some(kind) = self.ledger.exhausted() {
            return Err(GatewayError::BudgetExhausted { kind });
        }

        // Suspension point one: the per-model rate limiter.
        self.bucket_for(&request.model_id).acquire().await;

        // Suspension point two: the transport await, under retry.
        let started = Instant::now();
        let result = self.call_with_retry(request).await;
        self.ledger.charge_elapsed(started.elapsed());
        result
    }

    fn budgets(&self) -> BudgetSnapshot {
        self.ledger.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Transport replaying a scripted result sequence.
    struct ScriptedTransport {
        results: Mutex<VecDeque<GatewayResult<String>>>,
        calls: std::sync::atomic::AtomicU32,
    }

    impl ScriptedTransport {
        fn new(results: Vec<GatewayResult<String>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: std::sync::atomic::AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelTransport for ScriptedTransport {
        async fn call(&self, _request: &GenerateRequest) -> GatewayResult<String> {
            self.calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(GatewayError::Fatal {
                        detail: "script exhausted".into(),
                    })
                })
        }
    }

    /// Transport that never completes; used to exercise timeouts.
    struct HangingTransport;

    #[async_trait]
    impl ModelTransport for HangingTransport {
        async fn call(&self, _request: &GenerateRequest) -> GatewayResult<String> {
            std::future::pending().await
        }
    }

    fn request() -> GenerateRequest {
        GenerateRequest {
            model_id: "test-model".into(),
            prompt: "p".into(),
            temperature: 0.5,
            seed: 1,
            extras: serde_json::Value::Null,
        }
    }

    fn fast_config() -> GatewayConfig {
        GatewayConfig {
            backoff_base_ms: 1,
            default_rate: RateConfig {
                requests_per_sec: 10_000.0,
                burst: 1_000,
            },
            ..GatewayConfig::default()
        }
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let transport = ScriptedTransport::new(vec![
            Err(GatewayError::Transient {
                detail: "429".into(),
            }),
            Err(GatewayError::Transient {
                detail: "503".into(),
            }),
            Ok("text".into()),
        ]);
        let client = GatewayClient::new(transport, fast_config());

        let text = client.generate(&request()).await.unwrap();
        assert_eq!(text, "text");
        assert_eq!(client.transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_fatal_is_not_retried() {
        let transport = ScriptedTransport::new(vec![Err(GatewayError::Fatal {
            detail: "bad request".into(),
        })]);
        let client = GatewayClient::new(transport, fast_config());

        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Fatal { .. }));
        assert_eq!(client.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let transport = ScriptedTransport::new(vec![
            Err(GatewayError::Transient { detail: "a".into() }),
            Err(GatewayError::Transient { detail: "b".into() }),
            Err(GatewayError::Transient { detail: "c".into() }),
            Err(GatewayError::Transient { detail: "d".into() }),
            Err(GatewayError::Transient { detail: "e".into() }),
        ]);
        let config = GatewayConfig {
            max_transient_retries: 2,
            ..fast_config()
        };
        let client = GatewayClient::new(transport, config);

        let err = client.generate(&request()).await.unwrap_err();
        match err {
            GatewayError::RetriesExhausted { attempts, detail } => {
                assert_eq!(attempts, 3);
                assert_eq!(detail, "c");
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(client.transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_budget_fails_fast() {
        let transport = ScriptedTransport::new(vec![Ok("unreachable".into())]);
        let config = GatewayConfig {
            total_time_ms: 0,
            ..fast_config()
        };
        let client = GatewayClient::new(transport, config);

        let err = client.generate(&request()).await.unwrap_err();
        assert!(err.is_budget_exhausted());
        assert_eq!(client.transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout_charges_timeout_budget() {
        let config = GatewayConfig {
            request_timeout_ms: 50,
            total_timeouts: 2,
            ..fast_config()
        };
        let client = GatewayClient::new(HangingTransport, config);

        let err = client.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Fatal { .. }));
        assert_eq!(client.budgets().remaining_timeouts, 1);
    }
}
