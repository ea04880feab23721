//! Shapes, colors, points, and the drawing document.
//!
//! Values here are validated on the way in (deserialization or the explicit
//! constructors), so a `DrawingObject` always holds in-range fields. Shape
//! specific point cardinality is checked by the codec, because the polygon
//! rule depends on the token being drawn on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::{Codec, CodecError, PolygonSides};

// ── Shape ─────────────────────────────────────────────────────────────────────

/// Shape discriminator. The numeric value is the 3-bit id stored in the
/// lowest bits of the packed base word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Shape {
    Rectangle = 0,
    Line = 1,
    Ellipse = 2,
    Polyline = 3,
    Polygon = 4,
    Path = 5,
}

impl Shape {
    pub const ALL: [Shape; 6] = [
        Shape::Rectangle,
        Shape::Line,
        Shape::Ellipse,
        Shape::Polyline,
        Shape::Polygon,
        Shape::Path,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Shape::Rectangle => "rectangle",
            Shape::Line => "line",
            Shape::Ellipse => "ellipse",
            Shape::Polyline => "polyline",
            Shape::Polygon => "polygon",
            Shape::Path => "path",
        }
    }

    /// Shapes the ledger decodes with a per-point loop.
    pub fn iterates_points(self) -> bool {
        matches!(self, Shape::Polyline | Shape::Polygon)
    }
}

impl TryFrom<u8> for Shape {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Shape::Rectangle),
            1 => Ok(Shape::Line),
            2 => Ok(Shape::Ellipse),
            3 => Ok(Shape::Polyline),
            4 => Ok(Shape::Polygon),
            5 => Ok(Shape::Path),
            other => Err(CodecError::UnknownShape(other)),
        }
    }
}

impl From<Shape> for u8 {
    fn from(s: Shape) -> u8 {
        s as u8
    }
}

impl FromStr for Shape {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rectangle" | "rect" => Ok(Shape::Rectangle),
            "line" => Ok(Shape::Line),
            "ellipse" => Ok(Shape::Ellipse),
            "polyline" => Ok(Shape::Polyline),
            "polygon" => Ok(Shape::Polygon),
            "path" | "freeform" => Ok(Shape::Path),
            _ => Err(CodecError::UnknownShapeName(s.to_string())),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shapes arrive either as their numeric id or by name.
#[derive(Deserialize)]
#[serde(untagged)]
enum ShapeRepr {
    Id(u8),
    Name(String),
}

impl Serialize for Shape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Shape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match ShapeRepr::deserialize(deserializer)? {
            ShapeRepr::Id(id) => Shape::try_from(id),
            ShapeRepr::Name(name) => name.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}

// ── Color ─────────────────────────────────────────────────────────────────────

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(u32);

impl Color {
    pub const MAX: u32 = 0x00ff_ffff;

    pub fn new(rgb: u32) -> Result<Self, CodecError> {
        if rgb > Self::MAX {
            return Err(CodecError::ColorOutOfRange(rgb));
        }
        Ok(Self(rgb))
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self((u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b))
    }

    pub fn rgb(self) -> u32 {
        self.0
    }
}

impl FromStr for Color {
    type Err = CodecError;

    /// Accepts `#rrggbb`, `rrggbb`, `0xrrggbb` and the short `#rgb` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .unwrap_or(s);
        let invalid = || CodecError::InvalidColor(s.to_string());

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(invalid()),
        };
        let rgb = u32::from_str_radix(&expanded, 16).map_err(|_| invalid())?;
        Color::new(rgb)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Rgb(u32),
    Literal(String),
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match ColorRepr::deserialize(deserializer)? {
            ColorRepr::Rgb(rgb) => Color::new(rgb),
            ColorRepr::Literal(s) => s.parse(),
        }
        .map_err(serde::de::Error::custom)
    }
}

// ── Point ─────────────────────────────────────────────────────────────────────

/// Canvas coordinate. Serialized as a two-element array `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "(i64, i64)", into = "(i16, i16)")]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

impl TryFrom<(i64, i64)> for Point {
    type Error = CodecError;

    fn try_from((x, y): (i64, i64)) -> Result<Self, Self::Error> {
        let coord = |v: i64| i16::try_from(v).map_err(|_| CodecError::CoordinateOutOfRange(v));
        Ok(Self {
            x: coord(x)?,
            y: coord(y)?,
        })
    }
}

impl From<Point> for (i16, i16) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

// ── DrawingObject ─────────────────────────────────────────────────────────────

/// One shape on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawObject")]
pub struct DrawingObject {
    pub shape: Shape,
    pub color: Color,
    pub stroke_weight: u8,
    pub points: Vec<Point>,
}

/// Wire form of a drawing object before range checks.
#[derive(Deserialize)]
struct RawObject {
    shape: Shape,
    color: Color,
    #[serde(alias = "strokeWeight", default)]
    stroke_weight: u32,
    points: Vec<Point>,
}

impl TryFrom<RawObject> for DrawingObject {
    type Error = CodecError;

    fn try_from(raw: RawObject) -> Result<Self, Self::Error> {
        let stroke_weight =
            u8::try_from(raw.stroke_weight).map_err(|_| CodecError::StrokeOutOfRange(raw.stroke_weight))?;
        Ok(Self {
            shape: raw.shape,
            color: raw.color,
            stroke_weight,
            points: raw.points,
        })
    }
}

impl DrawingObject {
    pub fn new(shape: Shape, color: Color, stroke_weight: u8, points: Vec<Point>) -> Self {
        Self {
            shape,
            color,
            stroke_weight,
            points,
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

// ── Drawing ───────────────────────────────────────────────────────────────────

/// A finalized drawing ready to be sized and submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drawing {
    /// Side count assigned to the token. Constrains every polygon in the drawing.
    #[serde(default, alias = "polygonSides", skip_serializing_if = "Option::is_none")]
    pub polygon_sides: Option<PolygonSides>,
    pub objects: Vec<DrawingObject>,
}

impl Drawing {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn codec(&self) -> Codec {
        Codec::for_sides(self.polygon_sides)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
