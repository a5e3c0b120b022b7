//! Geographic bounding box in north/south/east/west form.

use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

/// A latitude/longitude rectangle, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Parse a query-style bounds string: "north,south,east,west"
    pub fn from_query_string(s: &str) -> Result<Self, BoundsParseError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(BoundsParseError::InvalidFormat(s.to_string()));
        }

        let parse = |part: &str| {
            part.parse::<f64>()
                .map_err(|_| BoundsParseError::InvalidNumber(part.to_string()))
        };

        Ok(Self {
            north: parse(parts[0])?,
            south: parse(parts[1])?,
            east: parse(parts[2])?,
            west: parse(parts[3])?,
        })
    }

    /// Smallest bounds containing every position, or `None` for an empty slice.
    pub fn enclosing<'a, I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a LatLng>,
    {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first.lat, first.lat, first.lng, first.lng);
        for p in iter {
            bounds.north = bounds.north.max(p.lat);
            bounds.south = bounds.south.min(p.lat);
            bounds.east = bounds.east.max(p.lng);
            bounds.west = bounds.west.min(p.lng);
        }
        Some(bounds)
    }

    /// Longitude extent in degrees.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Latitude extent in degrees.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.north.is_finite()
            && self.south.is_finite()
            && self.east.is_finite()
            && self.west.is_finite()
    }

    /// True when the box has no area (or is inverted, or carries NaN/inf).
    pub fn is_degenerate(&self) -> bool {
        !self.is_finite() || self.height() <= 0.0 || self.width() <= 0.0
    }

    /// Check if this box intersects another (shared edges do not count).
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.west < other.east
            && self.east > other.west
            && self.south < other.north
            && self.north > other.south
    }

    /// Like `intersects`, but boxes that touch along an edge or collapse to
    /// a line still count as overlapping.
    pub fn overlaps_closed(&self, other: &Bounds) -> bool {
        self.west <= other.east
            && self.east >= other.west
            && self.south <= other.north
            && self.north >= other.south
    }

    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }

    /// Grow each side by `fraction` of that axis' extent. Latitude is clamped to ±90.
    pub fn padded(&self, fraction: f64) -> Bounds {
        let dy = self.height() * fraction;
        let dx = self.width() * fraction;
        Bounds {
            north: (self.north + dy).min(90.0),
            south: (self.south - dy).max(-90.0),
            east: self.east + dx,
            west: self.west - dx,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BoundsParseError {
    #[error("Invalid bounds format: {0}. Expected 'north,south,east,west'")]
    InvalidFormat(String),

    #[error("Invalid number in bounds: {0}")]
    InvalidNumber(String),
}
