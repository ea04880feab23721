//! Cost model — local gas estimates for packed records and submissions.
//!
//! Pure and synchronous. These figures size chunks; they never set a
//! transaction's gas budget (that comes from the ledger's own estimate).

use serde::{Deserialize, Serialize};

use crate::codec::EMBEDDED_POINTS;
use crate::geometry::DrawingObject;

/// Per-unit gas charges. Loaded from the `[cost]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// Fixed charge for every record.
    pub record_base: u64,
    /// Per point stored inside the base word.
    pub embedded_point: u64,
    /// Per point stored in the overflow buffer.
    pub overflow_point: u64,
    /// Added for polyline and polygon, which the decoder walks point by point.
    pub iteration_surcharge: u64,
    /// Minimum transaction cost plus the entry-point call, once per submission.
    pub submission_overhead: u64,
    /// Naive baseline: fixed charge per unpacked record.
    pub naive_record_base: u64,
    /// Naive baseline: flat charge per point, no packing.
    pub naive_point: u64,
}

/// Minimum transaction cost of the ledger.
pub const BASE_TX_COST: u64 = 21_000;

/// Entry-point dispatch and calldata framing for one submission.
pub const ENTRY_POINT_COST: u64 = 25_000;

impl Default for CostModel {
    fn default() -> Self {
        Self {
            record_base: 60,
            embedded_point: 10,
            overflow_point: 40,
            iteration_surcharge: 30,
            submission_overhead: BASE_TX_COST + ENTRY_POINT_COST,
            naive_record_base: 60,
            naive_point: 200,
        }
    }
}

/// Packed versus naive cost of the same object list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Savings {
    pub packed: u64,
    pub naive: u64,
    /// `naive - packed`. Negative when packing costs more.
    pub absolute: i64,
    /// `absolute / naive * 100`, or 0 for a zero naive cost.
    pub percent: f64,
}

impl CostModel {
    pub fn record_cost(&self, obj: &DrawingObject) -> u64 {
        let points = obj.points.len() as u64;
        let embedded = points.min(EMBEDDED_POINTS as u64);
        let overflow = points - embedded;

        let mut cost = self
            .record_base
            .saturating_add(embedded.saturating_mul(self.embedded_point))
            .saturating_add(overflow.saturating_mul(self.overflow_point));
        if obj.shape.iterates_points() {
            cost = cost.saturating_add(self.iteration_surcharge);
        }
        cost
    }

    /// Submission overhead plus every record. An empty list costs the overhead.
    pub fn batch_cost<'a, I>(&self, objects: I) -> u64
    where
        I: IntoIterator<Item = &'a DrawingObject>,
    {
        objects
            .into_iter()
            .fold(self.submission_overhead, |acc, obj| acc.saturating_add(self.record_cost(obj)))
    }

    fn naive_record_cost(&self, obj: &DrawingObject) -> u64 {
        self.naive_record_base
            .saturating_add((obj.points.len() as u64).saturating_mul(self.naive_point))
    }

    pub fn naive_batch_cost<'a, I>(&self, objects: I) -> u64
    where
        I: IntoIterator<Item = &'a DrawingObject>,
    {
        objects
            .into_iter()
            .fold(self.submission_overhead, |acc, obj| acc.saturating_add(self.naive_record_cost(obj)))
    }

    /// Informational only. Planning uses `batch_cost`.
    pub fn comparative_savings(&self, objects: &[DrawingObject]) -> Savings {
        let packed = self.batch_cost(objects);
        let naive = self.naive_batch_cost(objects);
        let absolute = (naive as i128 - packed as i128).clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        let percent = if naive == 0 {
            0.0
        } else {
            absolute as f64 / naive as f64 * 100.0
        };
        Savings {
            packed,
            naive,
            absolute,
            percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Color, Point, Shape};
    use proptest::prelude::*;

    fn shape_with(shape: Shape, n: usize) -> DrawingObject {
        DrawingObject::new(shape, Color::default(), 1, vec![Point::new(1, 1); n])
    }

    #[test]
    fn two_point_record_costs_eighty() {
        let model = CostModel::default();
        assert_eq!(model.record_cost(&shape_with(Shape::Rectangle, 2)), 80);
        assert_eq!(model.record_cost(&shape_with(Shape::Line, 2)), 80);
    }

    #[test]
    fn overflow_points_cost_more_than_embedded() {
        let model = CostModel::default();
        // 60 base + 6*10 embedded + 3*40 overflow
        assert_eq!(model.record_cost(&shape_with(Shape::Path, 9)), 240);
        assert_eq!(model.record_cost(&shape_with(Shape::Path, 6)), 120);
    }

    #[test]
    fn iterating_shapes_carry_surcharge() {
        let model = CostModel::default();
        assert_eq!(model.record_cost(&shape_with(Shape::Polygon, 3)), 60 + 30 + 30);
        assert_eq!(model.record_cost(&shape_with(Shape::Polyline, 3)), 60 + 30 + 30);
        assert_eq!(model.record_cost(&shape_with(Shape::Path, 3)), 60 + 30);
    }

    #[test]
    fn empty_batch_costs_only_overhead() {
        let model = CostModel::default();
        let none: &[DrawingObject] = &[];
        assert_eq!(model.batch_cost(none), 46_000);
        assert_eq!(model.batch_cost(std::iter::empty()), 46_000);
    }

    #[test]
    fn batch_sums_records() {
        let model = CostModel::default();
        let objects = vec![shape_with(Shape::Line, 2), shape_with(Shape::Path, 9)];
        assert_eq!(model.batch_cost(&objects), 46_000 + 80 + 240);
    }

    #[test]
    fn packed_beats_naive() {
        let model = CostModel::default();
        let objects: Vec<_> = (0..10).map(|_| shape_with(Shape::Path, 12)).collect();
        let savings = model.comparative_savings(&objects);
        assert_eq!(savings.packed, 46_000 + 10 * (60 + 60 + 240));
        assert_eq!(savings.naive, 46_000 + 10 * (60 + 12 * 200));
        assert_eq!(savings.absolute, savings.naive as i64 - savings.packed as i64);
        assert!(savings.percent > 0.0 && savings.percent < 100.0);
    }

    #[test]
    fn zero_naive_cost_reports_zero_percent() {
        let model = CostModel {
            submission_overhead: 0,
            naive_record_base: 0,
            naive_point: 0,
            ..CostModel::default()
        };
        let savings = model.comparative_savings(&[]);
        assert_eq!(savings.percent, 0.0);
        assert_eq!(savings.absolute, 0);
    }

    #[test]
    fn extreme_constants_saturate() {
        let model = CostModel {
            overflow_point: u64::MAX / 2,
            iteration_surcharge: u64::MAX,
            naive_point: u64::MAX,
            ..CostModel::default()
        };
        assert_eq!(model.record_cost(&shape_with(Shape::Path, 9)), u64::MAX);
        assert_eq!(model.record_cost(&shape_with(Shape::Polygon, 3)), u64::MAX);
        assert_eq!(model.batch_cost(&[shape_with(Shape::Path, 9)]), u64::MAX);

        let savings = model.comparative_savings(&[shape_with(Shape::Line, 2)]);
        assert_eq!(savings.naive, u64::MAX);
        assert_eq!(savings.absolute, i64::MAX);
    }

    proptest! {
        #[test]
        fn batch_cost_is_monotonic(
            counts in prop::collection::vec(1usize..30, 0..40),
            extra in 1usize..30,
        ) {
            let model = CostModel::default();
            let mut objects: Vec<_> = counts.iter().map(|&n| shape_with(Shape::Path, n)).collect();
            let before = model.batch_cost(&objects);
            objects.push(shape_with(Shape::Polyline, extra));
            prop_assert!(model.batch_cost(&objects) >= before);
        }
    }
}
