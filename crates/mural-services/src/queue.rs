//! Submission queue — runs a drawing's chunks against the ledger in order.
//!
//! Per chunk: `pending → processing → completed | failed`, and a failed
//! chunk may be retried (`failed → processing → completed | failed`).
//!
//! `run_all` walks left to right, skips completed chunks, and stops at the
//! first failure. `run_chunk` runs a single chunk for manual retry. Both take
//! `&mut self` and await one submission at a time; nothing is dispatched
//! concurrently and nothing is retried automatically.
//!
//! Dropping a run's future mid-submission leaves that chunk `processing`.
//! The next run dispatches it again.

use std::fmt;

use serde::{Deserialize, Serialize};

use mural_core::{Codec, CodecError, DrawingObject, PackedRecord, PolygonSides};

use crate::chunk_types::{Chunk, ChunkRole, ChunkStatus, SubmissionKind};
use crate::estimate::GasBudget;
use crate::ledger::{Ledger, LedgerError, Submission};
use crate::planner::{ChunkPlan, PlanError, Planner};
use crate::target::Target;

// ── Progress ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_done(&self) -> bool {
        self.completed == self.total
    }

    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

/// Notified after every chunk status transition.
pub trait ProgressObserver {
    fn on_transition(&mut self, progress: Progress, chunk: &Chunk);
}

impl<F> ProgressObserver for F
where
    F: FnMut(Progress, &Chunk),
{
    fn on_transition(&mut self, progress: Progress, chunk: &Chunk) {
        self(progress, chunk)
    }
}

/// Observer that ignores every transition.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_transition(&mut self, _progress: Progress, _chunk: &Chunk) {}
}

// ── Queue ─────────────────────────────────────────────────────────────────────

/// Ordered chunks of one drawing bound for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QueueSnapshot")]
pub struct SubmissionQueue {
    target: Target,
    polygon_sides: Option<PolygonSides>,
    chunks: Vec<Chunk>,
    processing: bool,
    current: Option<usize>,
}

impl SubmissionQueue {
    /// Validate, plan, and chunk `objects`.
    ///
    /// `first_kind` applies to chunk 0 only: `Replace` overwrites the
    /// token's drawing, `Append` adds to it. Every later chunk appends.
    pub fn new(
        target: Target,
        objects: &[DrawingObject],
        codec: Codec,
        planner: &Planner,
        first_kind: SubmissionKind,
    ) -> Result<Self, QueueError> {
        let records = codec.encode_many(objects)?;
        let plan = planner.plan(objects)?;

        for over in planner.audit(objects, &plan) {
            tracing::warn!(
                chunk = over.ordinal,
                cost = over.cost,
                ceiling = over.ceiling,
                "planned chunk exceeds gas ceiling"
            );
        }

        Ok(Self::from_plan(target, codec, objects, &records, &plan, first_kind))
    }

    fn from_plan(
        target: Target,
        codec: Codec,
        objects: &[DrawingObject],
        records: &[PackedRecord],
        plan: &ChunkPlan,
        first_kind: SubmissionKind,
    ) -> Self {
        let total = plan.bounds().len();
        let chunks = plan
            .bounds()
            .iter()
            .enumerate()
            .map(|(ordinal, range)| {
                let role = if ordinal == 0 {
                    ChunkRole::First(first_kind)
                } else {
                    ChunkRole::Continuation
                };
                Chunk {
                    id: chunk_id(&target, ordinal, role.kind(), &records[range.clone()]),
                    ordinal,
                    total,
                    role,
                    objects: objects[range.clone()].to_vec(),
                    status: ChunkStatus::Pending,
                    error: None,
                    tx_ref: None,
                    gas_used: None,
                    gas_limit: None,
                }
            })
            .collect();

        tracing::info!(%target, chunks = total, kind = first_kind.as_str(), "submission queue created");

        Self {
            target,
            polygon_sides: codec.polygon_sides(),
            chunks,
            processing: false,
            current: None,
        }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// True while a run is in flight, or after a run was cancelled mid-submission.
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Index of the chunk currently (or last) in flight.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.chunks.iter().filter(|c| c.is_completed()).count(),
            total: self.chunks.len(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.chunks.iter().all(Chunk::is_completed)
    }

    /// First chunk that is not completed.
    pub fn next_pending(&self) -> Option<usize> {
        self.chunks.iter().position(|c| !c.is_completed())
    }

    /// Every object in submission order.
    pub fn objects(&self) -> impl Iterator<Item = &DrawingObject> {
        self.chunks.iter().flat_map(|c| c.objects.iter())
    }

    fn codec(&self) -> Codec {
        Codec::for_sides(self.polygon_sides)
    }

    /// Payload for chunk `index`, without a gas limit.
    pub fn submission(&self, index: usize) -> Result<Submission, QueueError> {
        let chunk = self.chunks.get(index).ok_or(QueueError::IndexOutOfRange {
            index,
            len: self.chunks.len(),
        })?;
        Ok(Submission {
            target: self.target,
            kind: chunk.kind(),
            records: self.codec().encode_many(&chunk.objects)?,
            gas_limit: None,
        })
    }

    /// Run every chunk not yet completed, left to right, stopping at the
    /// first failure. The queue keeps whatever progress was made.
    pub async fn run_all<L, O>(
        &mut self,
        ledger: &L,
        budget: &GasBudget,
        observer: &mut O,
    ) -> Result<Progress, QueueError>
    where
        L: Ledger,
        O: ProgressObserver,
    {
        self.processing = true;
        for index in 0..self.chunks.len() {
            if self.chunks[index].is_completed() {
                tracing::debug!(chunk = index, "already completed, skipping");
                continue;
            }
            if let Err(e) = self.dispatch(index, ledger, budget, observer).await {
                self.processing = false;
                return Err(e);
            }
        }
        self.processing = false;
        self.current = None;

        let progress = self.progress();
        tracing::info!(target = %self.target, %progress, "all chunks submitted");
        Ok(progress)
    }

    /// Run exactly one chunk. Every earlier chunk must be completed, because
    /// an append lands wherever the drawing currently ends.
    pub async fn run_chunk<L, O>(
        &mut self,
        index: usize,
        ledger: &L,
        budget: &GasBudget,
        observer: &mut O,
    ) -> Result<Progress, QueueError>
    where
        L: Ledger,
        O: ProgressObserver,
    {
        let chunk = self.chunks.get(index).ok_or(QueueError::IndexOutOfRange {
            index,
            len: self.chunks.len(),
        })?;
        if chunk.is_completed() {
            return Err(QueueError::AlreadyCompleted(index));
        }
        if let Some(blocking) = self.chunks[..index].iter().position(|c| !c.is_completed()) {
            return Err(QueueError::OutOfOrder { index, blocking });
        }

        self.processing = true;
        let result = self.dispatch(index, ledger, budget, observer).await;
        self.processing = false;
        result.map(|()| self.progress())
    }

    async fn dispatch<L, O>(
        &mut self,
        index: usize,
        ledger: &L,
        budget: &GasBudget,
        observer: &mut O,
    ) -> Result<(), QueueError>
    where
        L: Ledger,
        O: ProgressObserver,
    {
        let mut submission = self.submission(index)?;

        self.current = Some(index);
        self.chunks[index].begin();
        observer.on_transition(self.progress(), &self.chunks[index]);

        let gas_limit = budget.resolve(ledger, &submission).await;
        submission.gas_limit = Some(gas_limit);
        self.chunks[index].gas_limit = Some(gas_limit);

        tracing::info!(
            chunk = %self.chunks[index].short_id(),
            ordinal = index,
            total = self.chunks.len(),
            kind = submission.kind.as_str(),
            records = submission.records.len(),
            gas_limit,
            "submitting chunk"
        );

        let outcome = ledger.submit(&submission).await;
        let chunk = &mut self.chunks[index];
        let result = match outcome {
            Ok(receipt) => {
                tracing::info!(
                    chunk = %chunk.short_id(),
                    ordinal = index,
                    gas_used = receipt.gas_used,
                    tx_ref = %receipt.tx_ref,
                    "chunk completed"
                );
                chunk.complete(receipt);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    chunk = %chunk.short_id(),
                    ordinal = index,
                    error = %e,
                    "chunk failed"
                );
                chunk.fail(e.to_string());
                Err(QueueError::ChunkFailed { index, source: e })
            }
        };

        observer.on_transition(self.progress(), &self.chunks[index]);
        result
    }
}

/// Deterministic chunk identifier.
fn chunk_id(target: &Target, ordinal: usize, kind: SubmissionKind, records: &[PackedRecord]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&target.contract);
    hasher.update(&target.token_id.to_be_bytes());
    hasher.update(&(ordinal as u64).to_be_bytes());
    hasher.update(kind.as_str().as_bytes());
    for record in records {
        hasher.update(&record.wire_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

// ── Snapshot validation ───────────────────────────────────────────────────────

/// Deserialized form, checked before it becomes a queue.
#[derive(Deserialize)]
struct QueueSnapshot {
    target: Target,
    #[serde(default)]
    polygon_sides: Option<PolygonSides>,
    chunks: Vec<Chunk>,
    #[serde(default)]
    processing: bool,
    #[serde(default)]
    current: Option<usize>,
}

impl TryFrom<QueueSnapshot> for SubmissionQueue {
    type Error = QueueError;

    fn try_from(snap: QueueSnapshot) -> Result<Self, Self::Error> {
        let total = snap.chunks.len();
        if total == 0 {
            return Err(QueueError::CorruptSnapshot("queue has no chunks".into()));
        }
        for (i, chunk) in snap.chunks.iter().enumerate() {
            if chunk.ordinal != i || chunk.total != total {
                return Err(QueueError::CorruptSnapshot(format!(
                    "chunk {i} claims position {}/{}",
                    chunk.ordinal, chunk.total
                )));
            }
            let role_ok = match chunk.role {
                ChunkRole::First(_) => i == 0,
                ChunkRole::Continuation => i != 0,
            };
            if !role_ok {
                return Err(QueueError::CorruptSnapshot(format!("chunk {i} has role {:?}", chunk.role)));
            }
            if chunk.objects.is_empty() {
                return Err(QueueError::CorruptSnapshot(format!("chunk {i} is empty")));
            }
            if chunk.id.len() != 64 || !chunk.id.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(QueueError::CorruptSnapshot(format!("chunk {i} has malformed id")));
            }
        }
        if snap.current.is_some_and(|c| c >= total) {
            return Err(QueueError::CorruptSnapshot("current index out of range".into()));
        }

        Ok(Self {
            target: snap.target,
            polygon_sides: snap.polygon_sides,
            chunks: snap.chunks,
            processing: snap.processing,
            current: snap.current,
        })
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("invalid drawing object: {0}")]
    Codec(#[from] CodecError),

    #[error("cannot plan chunks: {0}")]
    Plan(#[from] PlanError),

    #[error("chunk {index} failed: {source}")]
    ChunkFailed { index: usize, source: LedgerError },

    #[error("chunk index {index} out of range (queue has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("chunk {0} is already completed")]
    AlreadyCompleted(usize),

    #[error("chunk {index} cannot run before chunk {blocking} completes")]
    OutOfOrder { index: usize, blocking: usize },

    #[error("corrupt queue snapshot: {0}")]
    CorruptSnapshot(String),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
