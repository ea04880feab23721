//! Ledger trait — the boundary to the remote execution ledger.
//!
//! The queue never talks to a network directly. It builds a `Submission`
//! per chunk and hands it to an implementation of this trait, one at a time.

use std::future::Future;

use mural_core::PackedRecord;

use crate::chunk_types::SubmissionKind;
use crate::target::Target;

/// One round trip's payload: the packed records of a single chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub target: Target,
    pub kind: SubmissionKind,
    pub records: Vec<PackedRecord>,
    /// Gas budget for the transaction. `None` when asking for an estimate.
    pub gas_limit: Option<u64>,
}

/// Returned by the ledger for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Opaque transaction reference.
    pub tx_ref: String,
    pub gas_used: u64,
}

/// Remote ledger collaborator.
///
/// Calls may suspend for as long as the implementation needs (a wallet
/// prompt, block inclusion). There is no timeout on this side. Dropping the
/// future is how a caller cancels.
pub trait Ledger: Send + Sync {
    /// Ask the ledger what `submission` would cost. Best effort.
    fn estimate(&self, submission: &Submission) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    /// Execute `submission`.
    fn submit(&self, submission: &Submission) -> impl Future<Output = Result<Receipt, LedgerError>> + Send;
}

/// Reasons the ledger did not accept a call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient funds for gas")]
    InsufficientFunds,

    #[error("transaction declined by signer")]
    Declined,

    #[error("network error: {0}")]
    Network(String),

    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("ledger rejected submission: {0}")]
    Rejected(String),
}

impl LedgerError {
    /// Map a gateway error code onto the taxonomy.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "insufficient_funds" => LedgerError::InsufficientFunds,
            "declined" | "user_rejected" => LedgerError::Declined,
            "reverted" => LedgerError::Reverted(message),
            "network" => LedgerError::Network(message),
            _ => LedgerError::Rejected(message),
        }
    }
}
