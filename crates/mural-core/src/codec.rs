//! Packed record codec — the on-ledger format for drawing objects.
//!
//! This layout IS the contract with the ledger's decoder. Every offset and
//! width below, and the zeroed high bits of the base word, is part of the
//! format. There is no version field, so nothing here may change.
//!
//! A record is one 256-bit base word plus an overflow buffer:
//!
//! ```text
//! bits   0..=2    shape id
//! bits   3..=26   color (24-bit RGB)
//! bits  27..=34   stroke weight
//! bits  35..=50   point count (all points, including overflow)
//! bits  51..=242  six 32-bit point slots, x in the high half, y in the low
//! bits 243..=255  unused, zero
//! ```
//!
//! Points past the sixth go to the overflow buffer as 4 big-endian bytes
//! each: x-high, x-low, y-high, y-low.
//!
//! The word is built with explicit shifts and masks over four u64 limbs.
//! On the wire it is the ledger's `uint256` encoding: 32 big-endian bytes.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use static_assertions::assert_eq_size;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::geometry::{Color, DrawingObject, Point, Shape};

// ── Layout ────────────────────────────────────────────────────────────────────

pub const SHAPE_OFFSET: u32 = 0;
pub const SHAPE_BITS: u32 = 3;
pub const COLOR_OFFSET: u32 = 3;
pub const COLOR_BITS: u32 = 24;
pub const STROKE_OFFSET: u32 = 27;
pub const STROKE_BITS: u32 = 8;
pub const COUNT_OFFSET: u32 = 35;
pub const COUNT_BITS: u32 = 16;
pub const POINTS_OFFSET: u32 = 51;
pub const POINT_BITS: u32 = 32;

/// Number of point slots inside the base word.
pub const EMBEDDED_POINTS: usize = 6;

/// First bit past the last point slot. Everything from here up must be zero.
pub const USED_BITS: u32 = POINTS_OFFSET + POINT_BITS * EMBEDDED_POINTS as u32;

/// Bytes per overflow point.
pub const OVERFLOW_POINT_BYTES: usize = 4;

/// The point count field is 16 bits wide.
pub const MAX_POINTS: usize = u16::MAX as usize;

const fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

// ── Word256 ───────────────────────────────────────────────────────────────────

/// 256-bit unsigned word. `limbs[0]` holds bits 0..=63.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Word256 {
    limbs: [u64; 4],
}

impl Word256 {
    pub const ZERO: Word256 = Word256 { limbs: [0; 4] };
    pub const BITS: u32 = 256;

    /// OR `value` (truncated to `width` bits) into the field at `offset`.
    /// The target field must currently be zero.
    pub fn insert(&mut self, offset: u32, width: u32, value: u64) {
        debug_assert!(width > 0 && width <= 64);
        debug_assert!(offset + width <= Self::BITS);

        let value = value & mask(width);
        let limb = (offset / 64) as usize;
        let shift = offset % 64;

        self.limbs[limb] |= value << shift;
        if shift + width > 64 {
            self.limbs[limb + 1] |= value >> (64 - shift);
        }
    }

    /// Read `width` bits starting at `offset`.
    pub fn extract(&self, offset: u32, width: u32) -> u64 {
        debug_assert!(width > 0 && width <= 64);
        debug_assert!(offset + width <= Self::BITS);

        let limb = (offset / 64) as usize;
        let shift = offset % 64;

        let mut value = self.limbs[limb] >> shift;
        if shift + width > 64 {
            value |= self.limbs[limb + 1] << (64 - shift);
        }
        value & mask(width)
    }

    pub fn bit(&self, index: u32) -> bool {
        self.extract(index, 1) == 1
    }

    /// True when no bit at or above `USED_BITS` is set.
    pub fn unused_bits_clear(&self) -> bool {
        self.extract(USED_BITS, Self::BITS - USED_BITS) == 0
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (i, limb) in self.limbs.iter().enumerate() {
            let start = (3 - i) * 8;
            out[start..start + 8].copy_from_slice(&limb.to_be_bytes());
        }
        out
    }

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let start = (3 - i) * 8;
            let mut chunk = [0u8; 8];
            chunk.copy_from_slice(&bytes[start..start + 8]);
            *limb = u64::from_be_bytes(chunk);
        }
        Self { limbs }
    }

    /// Parse a big-endian word from exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CodecError> {
        let wire = WireWord::read_from(bytes).ok_or(CodecError::WordLength(bytes.len()))?;
        Ok(Self::from_be_bytes(wire.bytes))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_be_bytes()))
    }

    /// Parse `0x`-prefixed or bare hex. Short input is left-padded with zeros,
    /// the way the ledger prints small `uint256` values.
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() > 64 {
            return Err(CodecError::WordLength(digits.len().div_ceil(2)));
        }
        let padded = format!("{digits:0>64}");
        let bytes = hex::decode(&padded).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for Word256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// The base word as it crosses the ledger boundary.
#[derive(Debug, Clone, AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
pub struct WireWord {
    /// Big-endian `uint256`.
    pub bytes: [u8; 32],
}

assert_eq_size!(WireWord, [u8; 32]);

impl From<Word256> for WireWord {
    fn from(word: Word256) -> Self {
        Self {
            bytes: word.to_be_bytes(),
        }
    }
}

// ── Packed record ─────────────────────────────────────────────────────────────

/// Dense encoding of one drawing object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedRecord {
    pub base: Word256,
    /// Points past the sixth, 4 bytes each. Length is always a multiple of 4.
    pub overflow: Bytes,
}

impl PackedRecord {
    pub fn shape_id(&self) -> u8 {
        self.base.extract(SHAPE_OFFSET, SHAPE_BITS) as u8
    }

    pub fn point_count(&self) -> usize {
        self.base.extract(COUNT_OFFSET, COUNT_BITS) as usize
    }

    pub fn overflow_points(&self) -> usize {
        self.overflow.len() / OVERFLOW_POINT_BYTES
    }

    pub fn base_hex(&self) -> String {
        self.base.to_hex()
    }

    pub fn overflow_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.overflow))
    }

    /// Rebuild a record from its gateway form. An empty overflow may be `""` or `"0x"`.
    pub fn from_hex(base: &str, overflow: &str) -> Result<Self, CodecError> {
        let digits = overflow.strip_prefix("0x").unwrap_or(overflow);
        let overflow = hex::decode(digits).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Ok(Self {
            base: Word256::from_hex(base)?,
            overflow: Bytes::from(overflow),
        })
    }

    /// Byte form of the record as the ledger receives it: 32-byte word, then overflow.
    pub fn wire_bytes(&self) -> Vec<u8> {
        let wire = WireWord::from(self.base);
        let mut out = Vec::with_capacity(32 + self.overflow.len());
        out.extend_from_slice(wire.as_bytes());
        out.extend_from_slice(&self.overflow);
        out
    }
}

/// Reinterpret a signed coordinate pair as the 32-bit slot value.
fn point_slot(p: Point) -> u64 {
    let x = u64::from(p.x as u16);
    let y = u64::from(p.y as u16);
    (x << 16) | y
}

fn slot_point(slot: u64) -> Point {
    Point {
        x: (slot >> 16) as u16 as i16,
        y: (slot & 0xffff) as u16 as i16,
    }
}

// ── Polygon sides ─────────────────────────────────────────────────────────────

/// Polygon side count assigned to a token. Every polygon drawn on that token
/// must have exactly this many points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum PolygonSides {
    Three = 3,
    Five = 5,
    Six = 6,
}

impl PolygonSides {
    pub const ALLOWED: [usize; 3] = [3, 5, 6];

    pub fn count(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for PolygonSides {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(PolygonSides::Three),
            5 => Ok(PolygonSides::Five),
            6 => Ok(PolygonSides::Six),
            other => Err(CodecError::InvalidPolygonSides(other)),
        }
    }
}

impl From<PolygonSides> for u8 {
    fn from(s: PolygonSides) -> u8 {
        s as u8
    }
}

/// Point count a shape accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRule {
    Exactly(usize),
    OneOf(&'static [usize]),
    AtLeastOne,
}

impl PointRule {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            PointRule::Exactly(n) => count == n,
            PointRule::OneOf(options) => options.contains(&count),
            PointRule::AtLeastOne => count >= 1,
        }
    }
}

impl fmt::Display for PointRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointRule::Exactly(n) => write!(f, "exactly {n}"),
            PointRule::OneOf(options) => write!(f, "one of {options:?}"),
            PointRule::AtLeastOne => f.write_str("at least 1"),
        }
    }
}

// ── Codec ─────────────────────────────────────────────────────────────────────

/// Validates and packs drawing objects for one token.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    polygon_sides: Option<PolygonSides>,
}

impl Codec {
    /// Codec for a token with no assigned polygon side count. Polygons may
    /// then use any of the allowed counts.
    pub fn new() -> Self {
        Self { polygon_sides: None }
    }

    pub fn with_polygon_sides(sides: PolygonSides) -> Self {
        Self::for_sides(Some(sides))
    }

    pub fn for_sides(polygon_sides: Option<PolygonSides>) -> Self {
        Self { polygon_sides }
    }

    pub fn polygon_sides(&self) -> Option<PolygonSides> {
        self.polygon_sides
    }

    pub fn point_rule(&self, shape: Shape) -> PointRule {
        match shape {
            Shape::Rectangle | Shape::Line | Shape::Ellipse => PointRule::Exactly(2),
            Shape::Polygon => match self.polygon_sides {
                Some(sides) => PointRule::Exactly(sides.count()),
                None => PointRule::OneOf(&PolygonSides::ALLOWED),
            },
            Shape::Polyline | Shape::Path => PointRule::AtLeastOne,
        }
    }

    /// Structural checks. Field ranges are already guaranteed by the types.
    pub fn validate(&self, obj: &DrawingObject) -> Result<(), CodecError> {
        let count = obj.points.len();
        if count == 0 {
            return Err(CodecError::NoPoints(obj.shape));
        }
        if count > MAX_POINTS {
            return Err(CodecError::TooManyPoints(count));
        }
        let rule = self.point_rule(obj.shape);
        if !rule.accepts(count) {
            return Err(CodecError::PointCount {
                shape: obj.shape,
                rule,
                actual: count,
            });
        }
        Ok(())
    }

    pub fn encode(&self, obj: &DrawingObject) -> Result<PackedRecord, CodecError> {
        self.validate(obj)?;
        Ok(pack(obj))
    }

    pub fn encode_many(&self, objects: &[DrawingObject]) -> Result<Vec<PackedRecord>, CodecError> {
        objects.iter().map(|obj| self.encode(obj)).collect()
    }

    /// Mirror of the ledger's decoder.
    pub fn decode(&self, record: &PackedRecord) -> Result<DrawingObject, CodecError> {
        let base = &record.base;
        if !base.unused_bits_clear() {
            return Err(CodecError::ReservedBitsSet);
        }

        let shape = Shape::try_from(base.extract(SHAPE_OFFSET, SHAPE_BITS) as u8)?;
        let color = Color::new(base.extract(COLOR_OFFSET, COLOR_BITS) as u32)?;
        let stroke_weight = base.extract(STROKE_OFFSET, STROKE_BITS) as u8;
        let count = base.extract(COUNT_OFFSET, COUNT_BITS) as usize;
        if count == 0 {
            return Err(CodecError::NoPoints(shape));
        }

        if record.overflow.len() % OVERFLOW_POINT_BYTES != 0 {
            return Err(CodecError::OverflowMisaligned(record.overflow.len()));
        }
        let expected_overflow = count.saturating_sub(EMBEDDED_POINTS);
        if record.overflow_points() != expected_overflow {
            return Err(CodecError::OverflowLength {
                expected: expected_overflow,
                actual: record.overflow_points(),
            });
        }

        let embedded = count.min(EMBEDDED_POINTS);
        let mut points = Vec::with_capacity(count);
        for i in 0..embedded {
            let slot = base.extract(POINTS_OFFSET + POINT_BITS * i as u32, POINT_BITS);
            points.push(slot_point(slot));
        }
        for quad in record.overflow.chunks_exact(OVERFLOW_POINT_BYTES) {
            points.push(Point {
                x: i16::from_be_bytes([quad[0], quad[1]]),
                y: i16::from_be_bytes([quad[2], quad[3]]),
            });
        }

        Ok(DrawingObject {
            shape,
            color,
            stroke_weight,
            points,
        })
    }
}

/// Pack a validated object. Total for any object that passed `validate`.
fn pack(obj: &DrawingObject) -> PackedRecord {
    let mut base = Word256::ZERO;
    base.insert(SHAPE_OFFSET, SHAPE_BITS, u64::from(obj.shape.id()));
    base.insert(COLOR_OFFSET, COLOR_BITS, u64::from(obj.color.rgb()));
    base.insert(STROKE_OFFSET, STROKE_BITS, u64::from(obj.stroke_weight));
    base.insert(COUNT_OFFSET, COUNT_BITS, obj.points.len() as u64);

    for (i, point) in obj.points.iter().take(EMBEDDED_POINTS).enumerate() {
        base.insert(POINTS_OFFSET + POINT_BITS * i as u32, POINT_BITS, point_slot(*point));
    }

    let extra = obj.points.len().saturating_sub(EMBEDDED_POINTS);
    let mut overflow = BytesMut::with_capacity(extra * OVERFLOW_POINT_BYTES);
    for point in obj.points.iter().skip(EMBEDDED_POINTS) {
        overflow.put_i16(point.x);
        overflow.put_i16(point.y);
    }

    PackedRecord {
        base,
        overflow: overflow.freeze(),
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Validation and decode errors. Raised before any packing happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("unknown shape id: {0}")]
    UnknownShape(u8),

    #[error("unknown shape name: {0:?}")]
    UnknownShapeName(String),

    #[error("invalid color literal: {0:?}")]
    InvalidColor(String),

    #[error("color 0x{0:x} does not fit in 24 bits")]
    ColorOutOfRange(u32),

    #[error("stroke weight {0} exceeds 255")]
    StrokeOutOfRange(u32),

    #[error("coordinate {0} is outside the 16-bit signed range")]
    CoordinateOutOfRange(i64),

    #[error("{0} has no points")]
    NoPoints(Shape),

    #[error("{shape} requires {rule} points, got {actual}")]
    PointCount {
        shape: Shape,
        rule: PointRule,
        actual: usize,
    },

    #[error("{0} points exceeds maximum {}", MAX_POINTS)]
    TooManyPoints(usize),

    #[error("invalid polygon side count: {0} (allowed: 3, 5, 6)")]
    InvalidPolygonSides(u8),

    #[error("unused high bits of the base word are set")]
    ReservedBitsSet,

    #[error("overflow buffer length {0} is not a multiple of 4")]
    OverflowMisaligned(usize),

    #[error("overflow buffer holds {actual} points, point count implies {expected}")]
    OverflowLength { expected: usize, actual: usize },

    #[error("base word must be 32 bytes, got {0}")]
    WordLength(usize),

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
