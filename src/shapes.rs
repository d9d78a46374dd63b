//! Reference leaf geometries.

use std::any::Any;
use std::f64::consts::TAU;

use crate::error::Result;
use crate::geometry::{BoundingBox, Geometry, PathPoint};
use crate::surface::Surface;

/// Control point distance for approximating a quarter ellipse with a cubic
/// bezier.
const KAPPA: f64 = 0.5522847498;

/// Axis-aligned rectangle, optionally with rounded corners.
///
/// The top-left corner sits at `(cx, cy)` unless `centered` is set, in which
/// case the rectangle is centered on it.
#[derive(Clone, Debug, PartialEq)]
pub struct Rectangle {
    pub cx: f64,
    pub cy: f64,
    pub width: f64,
    pub height: f64,
    pub rx: f64,
    pub ry: f64,
    pub centered: bool,
}

impl Rectangle {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            cx: 0.0,
            cy: 0.0,
            width,
            height,
            rx: 0.0,
            ry: 0.0,
            centered: false,
        }
    }

    pub fn square(size: f64) -> Self {
        Self::new(size, size)
    }

    pub fn at(mut self, cx: f64, cy: f64) -> Self {
        self.cx = cx;
        self.cy = cy;
        self
    }

    /// Corner radii. A zero radius takes the value of the other one.
    pub fn rounded(mut self, rx: f64, ry: f64) -> Self {
        self.rx = rx;
        self.ry = ry;
        self
    }

    pub fn centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }

    fn origin(&self) -> (f64, f64) {
        if self.centered {
            (self.cx - 0.5 * self.width, self.cy - 0.5 * self.height)
        } else {
            (self.cx, self.cy)
        }
    }
}

impl Geometry for Rectangle {
    fn draw_geometry(&self, surface: &mut dyn Surface) -> Result<()> {
        let (w, h) = (self.width, self.height);
        if w == 0.0 || h == 0.0 {
            return Ok(());
        }
        let (x, y) = self.origin();

        if self.rx != 0.0 || self.ry != 0.0 {
            let rx = (w * 0.5).min(if self.rx != 0.0 { self.rx } else { self.ry });
            let ry = (h * 0.5).min(if self.ry != 0.0 { self.ry } else { rx });
            let krx = KAPPA * rx;
            let kry = KAPPA * ry;
            surface.move_to(x + rx, y);
            surface.line_to(x - rx + w, y);
            surface.bezier_curve_to(x - rx + w + krx, y, x + w, y + ry - kry, x + w, y + ry);
            surface.line_to(x + w, y + h - ry);
            surface.bezier_curve_to(x + w, y + h - ry + kry, x - rx + w + krx, y + h, x - rx + w, y + h);
            surface.line_to(x + rx, y + h);
            surface.bezier_curve_to(x + rx - krx, y + h, x, y + h - ry + kry, x, y + h - ry);
            surface.line_to(x, y + ry);
            surface.bezier_curve_to(x, y + ry - kry, x + rx - krx, y, x + rx, y);
            surface.close_path();
        } else {
            let bb = self.bounding_box();
            surface.rect(bb.x, bb.y, bb.width, bb.height);
        }
        Ok(())
    }

    /// Normalized so width and height are never negative.
    fn bounding_box(&self) -> BoundingBox {
        let (mut x, mut y) = self.origin();
        if self.width < 0.0 {
            x += self.width;
        }
        if self.height < 0.0 {
            y += self.height;
        }
        BoundingBox::new(x, y, self.width.abs(), self.height.abs())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Circle or circular arc around `(cx, cy)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub anticlockwise: bool,
    pub close_path: bool,
    /// Start the path at the center, producing a pie slice
    pub include_center: bool,
}

impl Circle {
    pub fn new(radius: f64) -> Self {
        Self {
            cx: 0.0,
            cy: 0.0,
            radius,
            start_angle: 0.0,
            end_angle: TAU,
            anticlockwise: false,
            close_path: true,
            include_center: false,
        }
    }

    pub fn at(mut self, cx: f64, cy: f64) -> Self {
        self.cx = cx;
        self.cy = cy;
        self
    }

    pub fn arc(mut self, start_angle: f64, end_angle: f64, anticlockwise: bool) -> Self {
        self.start_angle = start_angle;
        self.end_angle = end_angle;
        self.anticlockwise = anticlockwise;
        self
    }

    pub fn pie(mut self, include_center: bool) -> Self {
        self.include_center = include_center;
        self
    }

    pub fn close_path(mut self, close: bool) -> Self {
        self.close_path = close;
        self
    }

    fn point_at(&self, angle: f64) -> (f64, f64) {
        (
            self.cx + angle.cos() * self.radius,
            self.cy + angle.sin() * self.radius,
        )
    }

    fn tangent_at(&self, angle: f64) -> f64 {
        if self.anticlockwise {
            angle - std::f64::consts::FRAC_PI_2
        } else {
            angle + std::f64::consts::FRAC_PI_2
        }
    }
}

impl Geometry for Circle {
    fn draw_geometry(&self, surface: &mut dyn Surface) -> Result<()> {
        if self.radius == 0.0 {
            return Ok(());
        }
        if self.include_center {
            surface.move_to(self.cx, self.cy);
        }
        surface.arc(
            self.cx,
            self.cy,
            self.radius,
            self.start_angle,
            self.end_angle,
            self.anticlockwise,
        );
        if self.close_path {
            surface.close_path();
        }
        Ok(())
    }

    fn bounding_box(&self) -> BoundingBox {
        let r = self.radius.abs();
        BoundingBox::new(self.cx - r, self.cy - r, 2.0 * r, 2.0 * r)
    }

    fn is_point_in_path(&self, x: f64, y: f64) -> bool {
        let dx = x - self.cx;
        let dy = y - self.cy;
        dx * dx + dy * dy <= self.radius * self.radius
    }

    fn start_point(&self) -> Option<PathPoint> {
        let (x, y) = self.point_at(self.start_angle);
        Some(PathPoint::new(x, y, self.tangent_at(self.start_angle)))
    }

    fn end_point(&self) -> Option<PathPoint> {
        let (x, y) = self.point_at(self.end_angle);
        Some(PathPoint::new(x, y, self.tangent_at(self.end_angle)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Straight line segments through `points`, closed into a polygon when
/// `closed` is set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polyline {
    pub points: Vec<(f64, f64)>,
    pub closed: bool,
}

fn line_angle(a: (f64, f64), b: (f64, f64)) -> f64 {
    (b.1 - a.1).atan2(b.0 - a.0)
}

impl Polyline {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self {
            points,
            closed: false,
        }
    }

    pub fn polygon(points: Vec<(f64, f64)>) -> Self {
        Self {
            points,
            closed: true,
        }
    }
}

impl Geometry for Polyline {
    fn draw_geometry(&self, surface: &mut dyn Surface) -> Result<()> {
        let Some((&(x0, y0), rest)) = self.points.split_first() else {
            return Ok(());
        };
        surface.move_to(x0, y0);
        for &(x, y) in rest {
            surface.line_to(x, y);
        }
        if self.closed {
            surface.close_path();
        }
        Ok(())
    }

    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.points.iter().copied()).unwrap_or_default()
    }

    fn is_point_in_path(&self, x: f64, y: f64) -> bool {
        !self.points.is_empty() && self.bounding_box().contains(x, y)
    }

    fn start_point(&self) -> Option<PathPoint> {
        let first = *self.points.first()?;
        let angle = self
            .points
            .get(1)
            .map(|&second| line_angle(first, second))
            .unwrap_or(0.0);
        Some(PathPoint::new(first.0, first.1, angle))
    }

    fn end_point(&self) -> Option<PathPoint> {
        let n = self.points.len();
        let last = *self.points.last()?;
        let angle = if n > 1 {
            line_angle(self.points[n - 2], last)
        } else {
            0.0
        };
        Some(PathPoint::new(last.0, last.1, angle))
    }

    /// Interior vertices, oriented along the mean of the adjacent segments.
    fn mid_points(&self) -> Vec<PathPoint> {
        self.points
            .windows(3)
            .map(|w| {
                let angle = 0.5 * (line_angle(w[0], w[1]) + line_angle(w[1], w[2]));
                PathPoint::new(w[1].0, w[1].1, angle)
            })
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
