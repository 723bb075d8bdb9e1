//! Canonical fingerprints over test-prediction sequences.
//!
//! Two attempts that predict identical grids for every test input share one
//! fingerprint regardless of which expert or iteration produced them. The
//! fingerprint is the SHA-256 hex digest of a canonical rendering, with
//! absent predictions rendered as a distinct sentinel so `[None, G]` and
//! `[G, None]` never collide.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::grid::Grid;

/// Sentinel used in the canonical rendering for an absent prediction.
const NULL_SENTINEL: &str = "<none>";

/// Separator between consecutive predictions in the canonical rendering.
const PREDICTION_SEPARATOR: &str = "\n---\n";

/// SHA-256 hex digest identifying one test-prediction sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a full ordered prediction sequence.
    ///
    /// Returns `None` when every prediction is absent; all-null attempts do
    /// not participate in voting.
    pub fn from_predictions(predictions: &[Option<Grid>]) -> Option<Self> {
        if predictions.iter().all(|p| p.is_none()) {
            return None;
        }
        let canonical = predictions
            .iter()
            .map(|p| match p {
                Some(grid) => grid.render(),
                None => NULL_SENTINEL.to_string(),
            })
            .collect::<Vec<_>>()
            .join(PREDICTION_SEPARATOR);

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Some(Fingerprint(hex::encode(hasher.finalize())))
    }

    /// Full hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars), for logs.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
