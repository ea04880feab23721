//! Chunk planner — splits an object list into submissions under a gas ceiling.
//!
//! The uniform strategy sizes one chunk from the list prefix and applies
//! that size to the whole list. It assumes roughly uniform object cost, so
//! a later chunk full of expensive objects can still exceed the ceiling.
//! `Planner::audit` reports such chunks. The adaptive strategy re-plans each
//! remainder instead, at the price of uneven chunk sizes.

use std::ops::Range;

use mural_core::config::PlannerStrategy;
use mural_core::{CostModel, DrawingObject};

/// Result of planning: the chunk boundaries over the object list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Objects per chunk. For an adaptive plan, the size of the first chunk.
    pub chunk_size: usize,
    pub chunk_count: usize,
    pub strategy: PlannerStrategy,
    bounds: Vec<Range<usize>>,
}

impl ChunkPlan {
    /// Contiguous, non-overlapping index ranges covering the whole list.
    pub fn bounds(&self) -> &[Range<usize>] {
        &self.bounds
    }
}

/// A chunk whose estimated cost is over the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverCeiling {
    pub ordinal: usize,
    pub cost: u64,
    pub ceiling: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct Planner {
    model: CostModel,
    ceiling: u64,
    strategy: PlannerStrategy,
}

impl Planner {
    pub fn new(model: CostModel, ceiling: u64) -> Self {
        Self {
            model,
            ceiling,
            strategy: PlannerStrategy::Uniform,
        }
    }

    pub fn with_strategy(mut self, strategy: PlannerStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    pub fn model(&self) -> &CostModel {
        &self.model
    }

    pub fn strategy(&self) -> PlannerStrategy {
        self.strategy
    }

    /// Fails when no chunk size exists or the list is empty.
    pub fn plan(&self, objects: &[DrawingObject]) -> Result<ChunkPlan, PlanError> {
        self.check_single_fits(objects)?;
        let n = objects.len();

        let bounds: Vec<Range<usize>> = match self.strategy {
            PlannerStrategy::Uniform => {
                let size = self.largest_fitting_prefix(objects);
                (0..n).step_by(size).map(|start| start..(start + size).min(n)).collect()
            }
            PlannerStrategy::Adaptive => {
                let mut bounds = Vec::new();
                let mut start = 0;
                while start < n {
                    let size = self.largest_fitting_prefix(&objects[start..]);
                    bounds.push(start..start + size);
                    start += size;
                }
                bounds
            }
        };

        let chunk_size = bounds.first().map(|r| r.len()).unwrap_or(0);
        tracing::debug!(
            objects = n,
            chunk_size,
            chunk_count = bounds.len(),
            ceiling = self.ceiling,
            strategy = ?self.strategy,
            "chunk plan"
        );

        Ok(ChunkPlan {
            chunk_size,
            chunk_count: bounds.len(),
            strategy: self.strategy,
            bounds,
        })
    }

    /// Chunks of `plan` whose batch cost exceeds the ceiling.
    pub fn audit(&self, objects: &[DrawingObject], plan: &ChunkPlan) -> Vec<OverCeiling> {
        plan.bounds
            .iter()
            .enumerate()
            .filter_map(|(ordinal, range)| {
                let cost = self.model.batch_cost(&objects[range.clone()]);
                (cost > self.ceiling).then_some(OverCeiling {
                    ordinal,
                    cost,
                    ceiling: self.ceiling,
                })
            })
            .collect()
    }

    /// The most expensive object plus submission overhead must fit alone.
    fn check_single_fits(&self, objects: &[DrawingObject]) -> Result<(), PlanError> {
        let (index, worst) = objects
            .iter()
            .map(|obj| self.model.record_cost(obj))
            .enumerate()
            .max_by_key(|&(_, cost)| cost)
            .ok_or(PlanError::EmptyDrawing)?;

        let cost = self.model.submission_overhead.saturating_add(worst);
        if cost > self.ceiling {
            return Err(PlanError::ObjectExceedsCeiling {
                index,
                cost,
                ceiling: self.ceiling,
            });
        }
        Ok(())
    }

    /// Largest `k` in `1..=len` with `batch_cost(objects[..k]) <= ceiling`.
    /// Requires `objects[0]` to fit on its own.
    fn largest_fitting_prefix(&self, objects: &[DrawingObject]) -> usize {
        let (mut lo, mut hi) = (1, objects.len());
        while lo < hi {
            let mid = lo + (hi - lo + 1) / 2;
            if self.model.batch_cost(&objects[..mid]) <= self.ceiling {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        lo
    }
}

/// Uniform chunk size and count for `objects` under `ceiling`.
pub fn plan_chunk_size(
    objects: &[DrawingObject],
    ceiling: u64,
    model: &CostModel,
) -> Result<(usize, usize), PlanError> {
    let plan = Planner::new(*model, ceiling).plan(objects)?;
    Ok((plan.chunk_size, plan.chunk_count))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("object {index} needs {cost} gas on its own, over the ceiling of {ceiling}")]
    ObjectExceedsCeiling { index: usize, cost: u64, ceiling: u64 },

    #[error("drawing has no objects")]
    EmptyDrawing,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
