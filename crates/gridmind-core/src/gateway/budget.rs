//! Process-wide gateway budgets: remaining wall-clock time and remaining
//! request timeouts.
//!
//! The ledger is a single small record behind a mutex. Experts treat it as an
//! opaque oracle via [`BudgetSnapshot`]; only the gateway client writes to it.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetKind {
    WallClock,
    Timeouts,
}

impl std::fmt::Display for BudgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BudgetKind::WallClock => "wall_clock",
            BudgetKind::Timeouts => "timeouts",
        };
        write!(f, "{s}")
    }
}

/// Point-in-time view of the remaining budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetSnapshot {
    pub remaining_time: Duration,
    pub remaining_timeouts: u32,
}

impl BudgetSnapshot {
    /// The exhausted budget, if any (wall-clock checked first).
    pub fn exhausted(&self) -> Option<BudgetKind> {
        if self.remaining_time.is_zero() {
            return Some(BudgetKind::WallClock);
        }
        if self.remaining_timeouts == 0 {
            return Some(BudgetKind::Timeouts);
        }
        None
    }

    /// A snapshot that never reports exhaustion; used by test fakes.
    pub fn unlimited() -> Self {
        Self {
            remaining_time: Duration::from_secs(u64::MAX / 4),
            remaining_timeouts: u32::MAX,
        }
    }
}

#[derive(Debug)]
struct LedgerState {
    remaining_time: Duration,
    remaining_timeouts: u32,
}

/// Mutable budget record shared by every gateway call in the process.
#[derive(Debug)]
pub struct BudgetLedger {
    state: Mutex<LedgerState>,
}

impl BudgetLedger {
    pub fn new(total_time: Duration, total_timeouts: u32) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                remaining_time: total_time,
                remaining_timeouts: total_timeouts,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deduct elapsed wall-clock time.
    pub fn charge_elapsed(&self, elapsed: Duration) {
        let mut state = self.lock();
        state.remaining_time = state.remaining_time.saturating_sub(elapsed);
    }

    /// Deduct one request timeout.
    pub fn charge_timeout(&self) {
        let mut state = self.lock();
        state.remaining_timeouts = state.remaining_timeouts.saturating_sub(1);
    }

    pub fn snapshot(&self) -> BudgetSnapshot {
        let state = self.lock();
        BudgetSnapshot {
            remaining_time: state.remaining_time,
            remaining_timeouts: state.remaining_timeouts,
        }
    }

    /// The exhausted budget, if any.
    pub fn exhausted(&self) -> Option<BudgetKind> {
        self.snapshot().exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ledger_not_exhausted() {
        let ledger = BudgetLedger::new(Duration::from_secs(60), 3);
        assert!(ledger.exhausted().is_none());
        let snap = ledger.snapshot();
        assert_eq!(snap.remaining_timeouts, 3);
        assert_eq!(snap.remaining_time, Duration::from_secs(60));
    }

    #[test]
    fn test_charge_elapsed_saturates_to_zero() {
        let ledger = BudgetLedger::new(Duration::from_secs(1), 3);
        ledger.charge_elapsed(Duration::from_secs(5));
        assert_eq!(ledger.exhausted(), Some(BudgetKind::WallClock));
    }

    #[test]
    fn test_timeout_budget_runs_out() {
        let ledger = BudgetLedger::new(Duration::from_secs(60), 2);
        ledger.charge_timeout();
        assert!(ledger.exhausted().is_none());
        ledger.charge_timeout();
        assert_eq!(ledger.exhausted(), Some(BudgetKind::Timeouts));
        // Further charges are harmless.
        ledger.charge_timeout();
        assert_eq!(ledger.snapshot().remaining_timeouts, 0);
    }

    #[test]
    fn test_wall_clock_reported_before_timeouts() {
        let ledger = BudgetLedger::new(Duration::ZERO, 0);
        assert_eq!(ledger.exhausted(), Some(BudgetKind::WallClock));
    }

    #[test]
    fn test_unlimited_snapshot_never_exhausts() {
        assert!(BudgetSnapshot::unlimited().exhausted().is_none());
    }
}
