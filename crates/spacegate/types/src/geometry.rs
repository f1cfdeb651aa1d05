//! Grid geometry: points and axis-aligned rectangles.
//!
//! Coordinates are integer tile positions. Rectangles are inclusive on every
//! edge and may be widened by a wall-thickness tolerance when testing
//! containment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while building geometry from raw input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// Coordinate text was not two comma-separated integers.
    #[error("invalid coordinates '{input}': expected \"x,y\"")]
    InvalidCoordinates { input: String },

    /// Top-left corner lies beyond bottom-right on some axis.
    #[error("top-left {top_left} lies beyond bottom-right {bottom_right}")]
    InvertedRect { top_left: Point, bottom_right: Point },
}

/// A tile position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Parses `"x,y"`. Whitespace anywhere in the text is ignored, so `"18, 24"`
/// is accepted. Zero is a valid coordinate; anything non-numeric is rejected.
impl FromStr for Point {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GeometryError::InvalidCoordinates {
            input: s.to_string(),
        };

        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let (x, y) = compact.split_once(',').ok_or_else(invalid)?;
        let x = x.parse::<i64>().map_err(|_| invalid())?;
        let y = y.parse::<i64>().map_err(|_| invalid())?;

        Ok(Point::new(x, y))
    }
}

/// Inclusive axis-aligned rectangle. `top_left <= bottom_right` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRect")]
pub struct Rect {
    top_left: Point,
    bottom_right: Point,
}

#[derive(Deserialize)]
struct RawRect {
    top_left: Point,
    bottom_right: Point,
}

impl TryFrom<RawRect> for Rect {
    type Error = GeometryError;

    fn try_from(raw: RawRect) -> Result<Self, Self::Error> {
        Rect::new(raw.top_left, raw.bottom_right)
    }
}

impl Rect {
    /// Build a rectangle, rejecting inverted corners.
    pub fn new(top_left: Point, bottom_right: Point) -> Result<Self, GeometryError> {
        if top_left.x > bottom_right.x || top_left.y > bottom_right.y {
            return Err(GeometryError::InvertedRect {
                top_left,
                bottom_right,
            });
        }
        Ok(Self {
            top_left,
            bottom_right,
        })
    }

    pub fn top_left(&self) -> Point {
        self.top_left
    }

    pub fn bottom_right(&self) -> Point {
        self.bottom_right
    }

    /// Inclusive containment, widened by `tolerance` tiles on every side.
    ///
    /// Negative tolerances are treated as zero: a tolerance never shrinks the
    /// rectangle.
    pub fn contains(&self, point: Point, tolerance: i64) -> bool {
        let t = tolerance.max(0);
        point.x >= self.top_left.x.saturating_sub(t)
            && point.x <= self.bottom_right.x.saturating_add(t)
            && point.y >= self.top_left.y.saturating_sub(t)
            && point.y <= self.bottom_right.y.saturating_add(t)
    }

    /// Midpoint, truncated toward the top-left corner.
    pub fn center(&self) -> Point {
        Point::new(
            midpoint(self.top_left.x, self.bottom_right.x),
            midpoint(self.top_left.y, self.bottom_right.y),
        )
    }
}

// Widened so full-range corners cannot overflow. The result lies between
// `lo` and `hi`, so narrowing back is lossless.
fn midpoint(lo: i64, hi: i64) -> i64 {
    let (lo, hi) = (i128::from(lo), i128::from(hi));
    (lo + (hi - lo) / 2) as i64
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.top_left, self.bottom_right)
    }
}
