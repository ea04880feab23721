//! Gas limit selection from the ledger estimate.
//!
//! The remote estimate is best effort. When it fails the configured
//! fallback is used and the failure is only logged.

use crate::ledger::{Ledger, Submission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasBudget {
    fallback: u64,
    margin_percent: u32,
}

impl Default for GasBudget {
    fn default() -> Self {
        Self {
            fallback: 3_000_000,
            margin_percent: 20,
        }
    }
}

impl GasBudget {
    pub fn new(fallback: u64, margin_percent: u32) -> Self {
        Self {
            fallback,
            margin_percent,
        }
    }

    pub fn fallback(&self) -> u64 {
        self.fallback
    }

    /// Estimate plus margin.
    pub fn padded(&self, estimate: u64) -> u64 {
        let margin = estimate.saturating_mul(u64::from(self.margin_percent)) / 100;
        estimate.saturating_add(margin)
    }

    /// Never fails.
    pub async fn resolve<L: Ledger>(&self, ledger: &L, submission: &Submission) -> u64 {
        match ledger.estimate(submission).await {
            Ok(estimate) => {
                let limit = self.padded(estimate);
                tracing::debug!(estimate, limit, target = %submission.target, "gas estimate");
                limit
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = self.fallback,
                    target = %submission.target,
                    "gas estimate failed, using fallback limit"
                );
                self.fallback
            }
        }
    }
}
