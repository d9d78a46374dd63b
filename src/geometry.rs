//! Leaf geometry contract.
//!
//! A [`Geometry`] only builds paths. Painting, clipping and markers are
//! handled by the drawable node that owns it.

use std::any::Any;
use std::fmt;

use crate::affine::Affine;
use crate::error::Result;
use crate::surface::Surface;

/// Axis-aligned rectangle `[x, y, width, height]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box containing every point.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
        for (x, y) in iter {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Inclusive on all edges.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        BoundingBox::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.x, self.y),
            (self.right(), self.y),
            (self.right(), self.bottom()),
            (self.x, self.bottom()),
        ]
    }

    /// Axis-aligned box around this box's corners mapped through `m`.
    pub fn transformed(&self, m: &Affine) -> BoundingBox {
        let corners = self.corners().map(|(x, y)| m.apply_to_point(x, y));
        BoundingBox::from_points(corners).unwrap_or_default()
    }

    /// Maps the unit square onto this box. Used for bounding-box relative
    /// styles and clip paths.
    pub fn unit_transform(&self) -> Affine {
        let mut m = Affine::translation(self.x, self.y);
        m.scale(self.width, self.height);
        m
    }
}

/// A point on a path with the tangent direction there, used to place
/// markers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathPoint {
    pub point: (f64, f64),
    /// Radians
    pub angle: f64,
}

impl PathPoint {
    pub fn new(x: f64, y: f64, angle: f64) -> Self {
        Self {
            point: (x, y),
            angle,
        }
    }
}

/// Path-producing leaf geometry (circle, rectangle, polyline, ...).
///
/// Everything is expressed in the owning node's local space.
pub trait Geometry: fmt::Debug {
    /// Issue path construction calls. Must not fill, stroke or clip.
    fn draw_geometry(&self, surface: &mut dyn Surface) -> Result<()>;

    fn bounding_box(&self) -> BoundingBox;

    /// Hit test in local coordinates. Defaults to the bounding box.
    fn is_point_in_path(&self, x: f64, y: f64) -> bool {
        self.bounding_box().contains(x, y)
    }

    fn start_point(&self) -> Option<PathPoint> {
        None
    }

    fn end_point(&self) -> Option<PathPoint> {
        None
    }

    fn mid_points(&self) -> Vec<PathPoint> {
        Vec::new()
    }

    /// Get a reference to self as Any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Get a mutable reference to self as Any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_and_contains() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, -5.0, 10.0, 10.0);
        let u = a.union(&b);
        assert_eq!(u, BoundingBox::new(0.0, -5.0, 15.0, 15.0));
        assert!(u.contains(15.0, 10.0));
        assert!(!u.contains(15.1, 0.0));
    }

    #[test]
    fn test_transformed_box_covers_rotated_corners() {
        let bb = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let m = Affine::rotation(std::f64::consts::FRAC_PI_4);
        let t = bb.transformed(&m);
        let half_diag = 50f64.sqrt() * 2.0 / 2.0;
        assert!((t.width - 2.0 * half_diag).abs() < 1e-9);
        assert!((t.x + half_diag).abs() < 1e-9);
    }

    #[test]
    fn test_unit_transform_maps_unit_square() {
        let bb = BoundingBox::new(2.0, 3.0, 4.0, 5.0);
        let m = bb.unit_transform();
        assert_eq!(m.apply_to_point(0.0, 0.0), (2.0, 3.0));
        assert_eq!(m.apply_to_point(1.0, 1.0), (6.0, 8.0));
    }

    #[test]
    fn test_empty_point_set() {
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }
}
