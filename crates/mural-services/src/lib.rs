//! mural-services — chunk planning and the resumable submission queue.
//!
//! Everything that talks to the ledger goes through the `Ledger` trait.
//! Submissions are strictly sequential: `append` has no position argument,
//! so each one must land on the state left by the previous one.

pub mod chunk_types;
pub mod estimate;
pub mod ledger;
pub mod planner;
pub mod queue;
pub mod queue_store;
pub mod target;

pub use chunk_types::{Chunk, ChunkRole, ChunkStatus, SubmissionKind};
pub use estimate::GasBudget;
pub use ledger::{Ledger, LedgerError, Receipt, Submission};
pub use planner::{plan_chunk_size, ChunkPlan, OverCeiling, PlanError, Planner};
pub use queue::{NoProgress, Progress, ProgressObserver, QueueError, SubmissionQueue};
pub use queue_store::{QueueStore, StoreError};
pub use target::{Target, TargetError};
