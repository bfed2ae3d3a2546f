//! Fixed-point geographic coordinates and the projections the kernel needs.
//!
//! Coordinates are stored as signed fixed-point integers at 1e-6 degree
//! resolution (spec §6), not `f32`/`f64` degrees: this keeps the on-disk
//! node stream exactly reproducible across platforms and matches the input
//! schema's `(lat: i32, lon: i32)` records.

use std::fmt;

/// 1e-6 degrees per integer unit, per the input schema.
pub const COORDINATE_PRECISION: f64 = 1_000_000.0;

/// A WGS-84 geographic coordinate stored as fixed-point integers.
///
/// `lat`/`lon` are in units of 1e-6 degrees, matching the serialized input
/// format exactly so no lossy float round-trip happens on load.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedPoint {
    pub lat: i32,
    pub lon: i32,
}

impl FixedPoint {
    #[inline]
    pub fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    /// Construct from floating-point degrees, rounding to the nearest 1e-6.
    #[inline]
    pub fn from_degrees(lat: f64, lon: f64) -> Self {
        Self {
            lat: (lat * COORDINATE_PRECISION).round() as i32,
            lon: (lon * COORDINATE_PRECISION).round() as i32,
        }
    }

    #[inline]
    pub fn lat_degrees(self) -> f64 {
        self.lat as f64 / COORDINATE_PRECISION
    }

    #[inline]
    pub fn lon_degrees(self) -> f64 {
        self.lon as f64 / COORDINATE_PRECISION
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: FixedPoint) -> f64 {
        const R: f64 = 6_371_000.0; // mean Earth radius, metres

        let lat1 = self.lat_degrees().to_radians();
        let lat2 = other.lat_degrees().to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.lon_degrees() - self.lon_degrees()).to_radians();

        let a = (d_lat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        R * c
    }

    /// Initial compass bearing (degrees, 0..360, 0 = north) from `self` to `other`.
    pub fn bearing_to(self, other: FixedPoint) -> f64 {
        let lat1 = self.lat_degrees().to_radians();
        let lat2 = other.lat_degrees().to_radians();
        let d_lon = (other.lon_degrees() - self.lon_degrees()).to_radians();

        let y = d_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
        let theta = y.atan2(x).to_degrees();
        (theta + 360.0) % 360.0
    }

    /// Project into web-mercator (EPSG:3857) metres, for planar bounding-box
    /// comparisons in the spatial index (C6). Segments are short enough that
    /// planar distance in this projection is an adequate proxy for
    /// great-circle distance, per spec §4.6.
    pub fn to_mercator(self) -> MercatorPoint {
        const R: f64 = 6_378_137.0; // WGS-84 equatorial radius, metres

        let lat_rad = self.lat_degrees().to_radians();
        let lon_rad = self.lon_degrees().to_radians();
        let x = R * lon_rad;
        let y = R * ((std::f64::consts::FRAC_PI_4 + lat_rad / 2.0).tan().ln());
        MercatorPoint { x, y }
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat_degrees(), self.lon_degrees())
    }
}

/// A point in web-mercator projected metres, used only for planar distance
/// and bounding-box comparisons inside the spatial index.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct MercatorPoint {
    pub x: f64,
    pub y: f64,
}

impl MercatorPoint {
    #[inline]
    pub fn squared_distance(self, other: MercatorPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// An axis-aligned bounding rectangle in mercator space.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct MercatorRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl MercatorRect {
    pub fn from_point(p: MercatorPoint) -> Self {
        Self { min_x: p.x, min_y: p.y, max_x: p.x, max_y: p.y }
    }

    pub fn from_points(a: MercatorPoint, b: MercatorPoint) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    pub fn union(self, other: MercatorRect) -> MercatorRect {
        MercatorRect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn centroid(self) -> MercatorPoint {
        MercatorPoint { x: (self.min_x + self.max_x) * 0.5, y: (self.min_y + self.max_y) * 0.5 }
    }

    pub fn intersects(self, other: MercatorRect) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn contains_point(self, p: MercatorPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Lower-bound squared distance from `p` to this rectangle (0 if inside).
    pub fn min_squared_distance(self, p: MercatorPoint) -> f64 {
        let dx = if p.x < self.min_x {
            self.min_x - p.x
        } else if p.x > self.max_x {
            p.x - self.max_x
        } else {
            0.0
        };
        let dy = if p.y < self.min_y {
            self.min_y - p.y
        } else if p.y > self.max_y {
            p.y - self.max_y
        } else {
            0.0
        };
        dx * dx + dy * dy
    }
}
