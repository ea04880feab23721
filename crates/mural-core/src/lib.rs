//! mural-core — drawing geometry, the packed record codec, the cost model,
//! and configuration. All other Mural crates depend on this one.

pub mod codec;
pub mod config;
pub mod cost;
pub mod geometry;

pub use codec::{Codec, CodecError, PackedRecord, PolygonSides};
pub use cost::{CostModel, Savings};
pub use geometry::{Color, Drawing, DrawingObject, Point, Shape};
