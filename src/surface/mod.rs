//! Immediate-mode drawing surface contract and the state-tracking context
//! the scene draws through.
//!
//! ## Key Types
//!
//! - [`Surface`]: what a backend must provide: path construction, fill,
//!   stroke and clip, a save/restore stack, paint-state setters, and either a
//!   full `set_transform` or just translate/rotate/scale.
//!
//! - [`DrawContext`]: wraps a surface and mirrors the state the scene cares
//!   about (current matrix, fill/stroke toggles, line width, global alpha) so
//!   that inherited paint state can be queried without asking the backend.
//!
//! - [`RecordingSurface`]: headless surface that records every call.

mod context;
mod recording;

pub use context::DrawContext;
pub use recording::{RecordingSurface, SurfaceCall};

use crate::affine::Affine;
use crate::error::Result;
use crate::paint::{
    CompositeOp, Gradient, LineCap, LineJoin, NativeStyle, Shadow, StyleHandle, TextAlign,
    TextBaseline,
};

/// An immediate-mode 2D drawing surface (a canvas-like backend).
///
/// Paint state is set through setter methods; path construction follows the
/// HTML canvas model where the path is built in the coordinate system active
/// at the time each segment is added.
pub trait Surface {
    // State stack

    fn save(&mut self);
    fn restore(&mut self);

    // Path construction

    fn begin_path(&mut self);
    fn close_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_curve_to(&mut self, cx: f64, cy: f64, x: f64, y: f64);
    fn bezier_curve_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool);
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    // Painting

    fn fill(&mut self);
    fn stroke(&mut self);
    fn clip(&mut self);
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    // Paint state

    fn set_fill_style(&mut self, style: &NativeStyle);
    fn set_stroke_style(&mut self, style: &NativeStyle);
    fn set_line_width(&mut self, width: f64);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_line_join(&mut self, join: LineJoin);
    fn set_miter_limit(&mut self, limit: f64);
    fn set_global_alpha(&mut self, alpha: f64);
    fn set_composite_operation(&mut self, op: CompositeOp);
    fn set_shadow(&mut self, shadow: &Shadow);
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: TextAlign);
    fn set_text_baseline(&mut self, baseline: TextBaseline);

    /// Compile a gradient into a style handle usable with the style setters.
    fn create_gradient(&mut self, gradient: &Gradient) -> Result<StyleHandle>;

    // Transforms

    /// Whether [`Surface::set_transform`] is available. When it is not, the
    /// context falls back to decomposing matrices into translate, rotate and
    /// scale calls.
    fn supports_set_transform(&self) -> bool {
        true
    }

    /// Replace the current transform.
    fn set_transform(&mut self, m: &Affine);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);
    fn scale(&mut self, sx: f64, sy: f64);
}
