//! Value types passed across the boundary by copy

use mapnik_sys::mapnik_coord_t;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Point in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coord {
    /// X (longitude or easting)
    pub x: f64,
    /// Y (latitude or northing)
    pub y: f64,
}

impl Coord {
    /// Create a coordinate
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Coord> for (f64, f64) {
    fn from(c: Coord) -> Self {
        (c.x, c.y)
    }
}

impl From<Point2<f64>> for Coord {
    fn from(p: Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Coord> for Point2<f64> {
    fn from(c: Coord) -> Self {
        Self::new(c.x, c.y)
    }
}

impl From<Coord> for mapnik_coord_t {
    fn from(c: Coord) -> Self {
        Self { x: c.x, y: c.y }
    }
}

impl From<mapnik_coord_t> for Coord {
    fn from(c: mapnik_coord_t) -> Self {
        Self { x: c.x, y: c.y }
    }
}

/// Axis-aligned extent in map units.
///
/// No ordering of the corners is enforced; the engine decides what a
/// degenerate or inverted box means.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum X
    pub minx: f64,
    /// Minimum Y
    pub miny: f64,
    /// Maximum X
    pub maxx: f64,
    /// Maximum Y
    pub maxy: f64,
}

impl BoundingBox {
    /// Create a bounding box from its corners
    pub const fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self { minx, miny, maxx, maxy }
    }

    /// Box spanning two corner points
    pub const fn from_corners(min: Coord, max: Coord) -> Self {
        Self::new(min.x, min.y, max.x, max.y)
    }

    /// Lower-left corner
    pub const fn min(&self) -> Coord {
        Coord::new(self.minx, self.miny)
    }

    /// Upper-right corner
    pub const fn max(&self) -> Coord {
        Coord::new(self.maxx, self.maxy)
    }

    /// Width in map units, negative for an inverted box
    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }

    /// Height in map units, negative for an inverted box
    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }
}
