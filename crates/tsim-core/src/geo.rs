//! Geographic and render-space coordinates.
//!
//! Nodes arrive from the graph provider with a [`GeoPoint`].  The simulation
//! never works in geographic space: a one-time [`RenderProjection`] linearly
//! rescales the geographic extent into a square canvas and every distance,
//! speed and proximity threshold is expressed in those render units.

use serde::{Deserialize, Serialize};

/// A WGS-84 coordinate.  `lon` maps to render `x`, `lat` to render `y`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

// ── RenderPoint ───────────────────────────────────────────────────────────────

/// A position on the render canvas.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderPoint {
    pub x: f32,
    pub y: f32,
}

impl RenderPoint {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(self, other: RenderPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Move up to `step` units towards `target`.
    ///
    /// Returns the new point; a zero-length segment leaves the point where it
    /// is.
    pub fn step_towards(self, target: RenderPoint, step: f32) -> RenderPoint {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist == 0.0 {
            return self;
        }
        RenderPoint {
            x: self.x + step * dx / dist,
            y: self.y + step * dy / dist,
        }
    }
}

impl std::fmt::Display for RenderPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.1}, {:.1}]", self.x, self.y)
    }
}

// ── RenderProjection ──────────────────────────────────────────────────────────

/// Linear rescale of a geographic bounding box into `[0, canvas]²`.
///
/// A degenerate axis (all nodes share one longitude or latitude) maps to the
/// canvas centre on that axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderProjection {
    min_lon: f64,
    max_lon: f64,
    min_lat: f64,
    max_lat: f64,
    canvas:  f32,
}

impl RenderProjection {
    /// Fit the projection to the extent of `points`.
    ///
    /// An empty iterator yields a projection that maps everything to the
    /// canvas centre.
    pub fn fit(points: impl IntoIterator<Item = GeoPoint>, canvas: f32) -> Self {
        let mut proj = Self {
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            canvas,
        };
        for p in points {
            proj.min_lon = proj.min_lon.min(p.lon);
            proj.max_lon = proj.max_lon.max(p.lon);
            proj.min_lat = proj.min_lat.min(p.lat);
            proj.max_lat = proj.max_lat.max(p.lat);
        }
        proj
    }

    pub fn canvas(&self) -> f32 {
        self.canvas
    }

    pub fn project(&self, p: GeoPoint) -> RenderPoint {
        RenderPoint {
            x: scale(p.lon, self.min_lon, self.max_lon, self.canvas),
            y: scale(p.lat, self.min_lat, self.max_lat, self.canvas),
        }
    }
}

fn scale(value: f64, min: f64, max: f64, canvas: f32) -> f32 {
    let span = max - min;
    if !span.is_finite() || span == 0.0 {
        return canvas / 2.0;
    }
    ((value - min) / span * canvas as f64) as f32
}
