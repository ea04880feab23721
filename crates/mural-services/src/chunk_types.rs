//! Chunk types. One contiguous slice of the drawing per submission.

use serde::{Deserialize, Serialize};

use mural_core::DrawingObject;

use crate::ledger::Receipt;

/// How the ledger applies a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    /// Discard the token's existing drawing, then write.
    Replace,
    /// Write after the token's existing drawing.
    Append,
}

impl SubmissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionKind::Replace => "replace",
            SubmissionKind::Append => "append",
        }
    }
}

/// Position of a chunk in its queue.
///
/// Only the first chunk may carry `Replace`. A continuation always appends,
/// so replacing a drawing halfway through a queue is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "kind", rename_all = "lowercase")]
pub enum ChunkRole {
    First(SubmissionKind),
    Continuation,
}

impl ChunkRole {
    pub fn kind(self) -> SubmissionKind {
        match self {
            ChunkRole::First(kind) => kind,
            ChunkRole::Continuation => SubmissionKind::Append,
        }
    }
}

/// Lifecycle status of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// A chunk of drawing objects and its submission state.
///
/// Chunks are only created by `SubmissionQueue`; status changes go through
/// the queue as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Hex BLAKE3 of target, ordinal, kind, and packed records.
    pub(crate) id: String,
    pub(crate) ordinal: usize,
    pub(crate) total: usize,
    pub(crate) role: ChunkRole,
    pub(crate) objects: Vec<DrawingObject>,
    pub(crate) status: ChunkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) tx_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) gas_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) gas_limit: Option<u64>,
}

impl Chunk {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// First 16 characters of the id, for logs and listings.
    pub fn short_id(&self) -> &str {
        self.id.get(..16).unwrap_or(&self.id)
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn role(&self) -> ChunkRole {
        self.role
    }

    pub fn kind(&self) -> SubmissionKind {
        self.role.kind()
    }

    pub fn objects(&self) -> &[DrawingObject] {
        &self.objects
    }

    pub fn status(&self) -> ChunkStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn tx_ref(&self) -> Option<&str> {
        self.tx_ref.as_deref()
    }

    /// Gas the ledger reported for the completed submission.
    pub fn gas_used(&self) -> Option<u64> {
        self.gas_used
    }

    /// Gas limit sent with the most recent attempt.
    pub fn gas_limit(&self) -> Option<u64> {
        self.gas_limit
    }

    pub fn is_completed(&self) -> bool {
        self.status == ChunkStatus::Completed
    }

    pub(crate) fn begin(&mut self) {
        self.status = ChunkStatus::Processing;
        self.error = None;
    }

    pub(crate) fn complete(&mut self, receipt: Receipt) {
        self.status = ChunkStatus::Completed;
        self.error = None;
        self.tx_ref = Some(receipt.tx_ref);
        self.gas_used = Some(receipt.gas_used);
    }

    pub(crate) fn fail(&mut self, reason: String) {
        self.status = ChunkStatus::Failed;
        self.error = Some(reason);
    }
}
