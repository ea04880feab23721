//! Mural integration test harness.
//!
//! Everything runs in-process against `MockLedger` (see `infra.rs`), which
//! applies submissions to an in-memory canvas with the ledger's replace and
//! append semantics. No network is needed:
//!
//!   cargo test --test integration
//!
//! Tests that touch the filesystem use their own directory under the system
//! temp dir and remove it when done.

use std::path::PathBuf;

use mural_core::{Color, CostModel, DrawingObject, Point, Shape};
use mural_services::{Planner, Target};

mod infra;
mod planning;
mod queue;

pub use infra::MockLedger;

// ── Harness ───────────────────────────────────────────────────────────────────

/// Contract used throughout tests.
pub const CONTRACT: [u8; 20] = [0x4d; 20];

/// Submission overhead of the default cost model.
pub const OVERHEAD: u64 = 46_000;

pub fn target(token_id: u64) -> Target {
    Target::new(CONTRACT, token_id)
}

/// Two-point rectangle. Costs 80 under the default model.
pub fn rect(i: usize) -> DrawingObject {
    let v = (i % 1000) as i16;
    DrawingObject::new(
        Shape::Rectangle,
        Color::from_rgb(0x20, 0x40, (i % 256) as u8),
        1,
        vec![Point::new(v, v), Point::new(v + 10, v + 5)],
    )
}

/// Freeform path with `n` points, some of them in the overflow buffer.
pub fn path(n: usize) -> DrawingObject {
    DrawingObject::new(
        Shape::Path,
        Color::new(0x123456).unwrap(),
        3,
        (0..n).map(|k| Point::new(k as i16, -(k as i16))).collect(),
    )
}

pub fn polygon(sides: usize) -> DrawingObject {
    DrawingObject::new(
        Shape::Polygon,
        Color::new(0xabcdef).unwrap(),
        2,
        (0..sides).map(|k| Point::new(10 * k as i16, 7)).collect(),
    )
}

/// `n` objects cycling through rect, 9-point path, triangle.
pub fn mixed(n: usize) -> Vec<DrawingObject> {
    (0..n)
        .map(|i| match i % 3 {
            0 => rect(i),
            1 => path(9),
            _ => polygon(3),
        })
        .collect()
}

/// Default cost model with room for `records` rects per submission.
pub fn rect_planner(records: u64) -> Planner {
    Planner::new(CostModel::default(), OVERHEAD + records * 80)
}

/// Fresh per-test directory.
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mural-it-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
