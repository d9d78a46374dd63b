//! Drawable node payload: geometry plus the fill/stroke compositing rules
//! applied to it.

use crate::affine::Affine;
use crate::geometry::{BoundingBox, Geometry};
use crate::paint::{Paint, StyleUnits};
use crate::scene::NodeId;
use crate::surface::{DrawContext, Surface};

/// Where the stroke goes relative to the fill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StrokeMode {
    /// Fill, then stroke on top
    #[default]
    Above,
    /// Stroke, then fill over the inner half of it
    Below,
    /// Only the inner half of the stroke is visible.
    ///
    /// Approximated by clipping to the path after a hairline stroke, not a
    /// geometric inset.
    Inside,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarkerUnits {
    /// Markers scale with the current line width
    #[default]
    StrokeWidth,
    UserSpace,
}

/// A node drawn at a path point (arrow heads, dots, ...).
///
/// The marker node should be detached from any tree: it is drawn with a
/// base matrix placing its origin on the path point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerSpec {
    pub node: NodeId,
    /// Fixed rotation instead of following the path tangent
    pub orient: Option<f64>,
    pub units: MarkerUnits,
}

impl MarkerSpec {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            orient: None,
            units: MarkerUnits::default(),
        }
    }

    pub fn orient(mut self, angle: f64) -> Self {
        self.orient = Some(angle);
        self
    }

    pub fn units(mut self, units: MarkerUnits) -> Self {
        self.units = units;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Markers {
    pub start: Option<MarkerSpec>,
    pub end: Option<MarkerSpec>,
    pub mid: Option<MarkerSpec>,
}

impl Markers {
    /// The same marker at the start, every vertex and the end.
    pub fn all(spec: MarkerSpec) -> Self {
        Self {
            start: Some(spec),
            end: Some(spec),
            mid: Some(spec),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.mid.is_none()
    }
}

/// Clip region built from another (detached) node's subtree paths.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipPath {
    pub node: NodeId,
    /// `ObjectBoundingBox` maps the clip subtree's unit square onto the
    /// clipped node's subtree bounding box.
    pub units: StyleUnits,
}

impl ClipPath {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            units: StyleUnits::UserSpace,
        }
    }

    pub fn units(mut self, units: StyleUnits) -> Self {
        self.units = units;
        self
    }
}

/// Geometry and compositing options of a drawable node.
#[derive(Debug)]
pub struct Drawable {
    pub geometry: Box<dyn Geometry>,
    pub stroke_mode: StrokeMode,
    /// Clip the node's children to its path
    pub clip: bool,
    pub markers: Markers,
}

impl Drawable {
    pub fn new(geometry: impl Geometry + 'static) -> Self {
        Self::from_box(Box::new(geometry))
    }

    pub fn from_box(geometry: Box<dyn Geometry>) -> Self {
        Self {
            geometry,
            stroke_mode: StrokeMode::default(),
            clip: false,
            markers: Markers::default(),
        }
    }

    pub fn stroke_mode(mut self, mode: StrokeMode) -> Self {
        self.stroke_mode = mode;
        self
    }

    pub fn clip(mut self, clip: bool) -> Self {
        self.clip = clip;
        self
    }

    pub fn markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }

    /// Downcast the geometry.
    pub fn geometry<G: Geometry + 'static>(&self) -> Option<&G> {
        self.geometry.as_any().downcast_ref()
    }

    pub fn geometry_mut<G: Geometry + 'static>(&mut self) -> Option<&mut G> {
        self.geometry.as_any_mut().downcast_mut()
    }

    /// Fill and/or stroke the current path according to the stroke mode
    /// and the fill/stroke toggles on the context.
    pub(crate) fn paint<S: Surface>(
        &self,
        ctx: &mut DrawContext<S>,
        fill_opacity: Option<f64>,
        stroke_opacity: Option<f64>,
    ) {
        let bbox = self.geometry.bounding_box();
        let fill_on = ctx.fill_on();
        if ctx.stroke_on() {
            match self.stroke_mode {
                StrokeMode::Above => {
                    if fill_on {
                        fill_path(ctx, &bbox, fill_opacity);
                    }
                    stroke_path(ctx, &bbox, stroke_opacity);
                }
                StrokeMode::Below => {
                    stroke_path(ctx, &bbox, stroke_opacity);
                    if fill_on {
                        fill_path(ctx, &bbox, fill_opacity);
                    }
                }
                StrokeMode::Inside => {
                    if fill_on {
                        fill_path(ctx, &bbox, fill_opacity);
                    }
                    ctx.save();
                    let width = ctx.line_width();
                    ctx.set_line_width(1.0);
                    stroke_path(ctx, &bbox, stroke_opacity);
                    ctx.set_line_width(width);
                    ctx.clip();
                    stroke_path(ctx, &bbox, stroke_opacity);
                    ctx.restore();
                }
            }
        } else if fill_on {
            fill_path(ctx, &bbox, fill_opacity);
        }
    }
}

/// The matrix a transformed paint needs on top of the node's, if any.
fn style_matrix(paint: Option<&Paint>, bbox: &BoundingBox) -> Option<Affine> {
    let paint = paint?;
    if !paint.is_transformed() {
        return None;
    }
    let mut m = if paint.units() == StyleUnits::ObjectBoundingBox {
        bbox.unit_transform()
    } else {
        Affine::IDENTITY
    };
    if let Some(t) = paint.transform() {
        m.compose(&t);
    }
    Some(m)
}

fn with_alpha<S: Surface>(
    ctx: &mut DrawContext<S>,
    opacity: Option<f64>,
    op: fn(&mut DrawContext<S>),
) {
    match opacity {
        Some(o) => {
            let alpha = ctx.global_alpha();
            ctx.set_global_alpha(alpha * o);
            op(ctx);
            ctx.set_global_alpha(alpha);
        }
        None => op(ctx),
    }
}

fn fill_path<S: Surface>(ctx: &mut DrawContext<S>, bbox: &BoundingBox, opacity: Option<f64>) {
    match style_matrix(ctx.fill_paint(), bbox) {
        Some(m) => {
            ctx.save();
            ctx.transform(&m);
            with_alpha(ctx, opacity, DrawContext::fill);
            ctx.restore();
        }
        None => with_alpha(ctx, opacity, DrawContext::fill),
    }
}

fn stroke_path<S: Surface>(ctx: &mut DrawContext<S>, bbox: &BoundingBox, opacity: Option<f64>) {
    match style_matrix(ctx.stroke_paint(), bbox) {
        Some(m) => {
            ctx.save();
            ctx.transform(&m);
            // keep the visual line width under the style's scale
            let scale = m.max_axis_scale();
            if scale > 0.0 && scale.is_finite() {
                let width = ctx.line_width();
                ctx.set_line_width(width / scale);
            }
            with_alpha(ctx, opacity, DrawContext::stroke);
            ctx.restore();
        }
        None => with_alpha(ctx, opacity, DrawContext::stroke),
    }
}
