use crate::affine::Affine;
use crate::error::Result;
use crate::paint::{
    CompositeOp, Gradient, LineCap, LineJoin, NativeStyle, Shadow, StyleHandle, TextAlign,
    TextBaseline,
};

use super::Surface;

/// A single call made against a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCall {
    // State
    Save,
    Restore,

    // Path
    BeginPath,
    ClosePath,
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    QuadraticCurveTo { cx: f64, cy: f64, x: f64, y: f64 },
    BezierCurveTo {
        c1x: f64,
        c1y: f64,
        c2x: f64,
        c2y: f64,
        x: f64,
        y: f64,
    },
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        start: f64,
        end: f64,
        anticlockwise: bool,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    // Painting
    Fill,
    Stroke,
    Clip,
    ClearRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    // Paint state
    SetFillStyle(NativeStyle),
    SetStrokeStyle(NativeStyle),
    SetLineWidth(f64),
    SetLineCap(LineCap),
    SetLineJoin(LineJoin),
    SetMiterLimit(f64),
    SetGlobalAlpha(f64),
    SetCompositeOperation(CompositeOp),
    SetShadow(Shadow),
    SetFont(String),
    SetTextAlign(TextAlign),
    SetTextBaseline(TextBaseline),
    CreateGradient(StyleHandle),

    // Transforms
    SetTransform(Affine),
    Translate { x: f64, y: f64 },
    Rotate(f64),
    Scale { sx: f64, sy: f64 },
}

/// Headless surface that records every call for later inspection.
///
/// Useful for tests and for hosts that replay the calls onto a real
/// backend themselves.
#[derive(Debug)]
pub struct RecordingSurface {
    calls: Vec<SurfaceCall>,
    gradients: Vec<(StyleHandle, Gradient)>,
    set_transform: bool,
    depth: usize,
    next_handle: u64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            gradients: Vec::new(),
            set_transform: true,
            depth: 0,
            next_handle: 1,
        }
    }

    /// A surface that only offers translate/rotate/scale.
    pub fn without_set_transform() -> Self {
        Self {
            set_transform: false,
            ..Self::new()
        }
    }

    /// Get the recorded calls
    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    /// Take the recorded calls
    pub fn take_calls(&mut self) -> Vec<SurfaceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn count(&self, pred: impl Fn(&SurfaceCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Current depth of the save/restore stack.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn gradients(&self) -> &[(StyleHandle, Gradient)] {
        &self.gradients
    }

    fn record(&mut self, call: SurfaceCall) {
        self.calls.push(call);
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for RecordingSurface {
    fn save(&mut self) {
        self.depth += 1;
        self.record(SurfaceCall::Save);
    }

    fn restore(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.record(SurfaceCall::Restore);
    }

    fn begin_path(&mut self) {
        self.record(SurfaceCall::BeginPath);
    }

    fn close_path(&mut self) {
        self.record(SurfaceCall::ClosePath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.record(SurfaceCall::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.record(SurfaceCall::LineTo { x, y });
    }

    fn quadratic_curve_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.record(SurfaceCall::QuadraticCurveTo { cx, cy, x, y });
    }

    fn bezier_curve_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.record(SurfaceCall::BezierCurveTo {
            c1x,
            c1y,
            c2x,
            c2y,
            x,
            y,
        });
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) {
        self.record(SurfaceCall::Arc {
            x,
            y,
            radius,
            start,
            end,
            anticlockwise,
        });
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.record(SurfaceCall::Rect {
            x,
            y,
            width,
            height,
        });
    }

    fn fill(&mut self) {
        self.record(SurfaceCall::Fill);
    }

    fn stroke(&mut self) {
        self.record(SurfaceCall::Stroke);
    }

    fn clip(&mut self) {
        self.record(SurfaceCall::Clip);
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.record(SurfaceCall::ClearRect {
            x,
            y,
            width,
            height,
        });
    }

    fn set_fill_style(&mut self, style: &NativeStyle) {
        self.record(SurfaceCall::SetFillStyle(*style));
    }

    fn set_stroke_style(&mut self, style: &NativeStyle) {
        self.record(SurfaceCall::SetStrokeStyle(*style));
    }

    fn set_line_width(&mut self, width: f64) {
        self.record(SurfaceCall::SetLineWidth(width));
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.record(SurfaceCall::SetLineCap(cap));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.record(SurfaceCall::SetLineJoin(join));
    }

    fn set_miter_limit(&mut self, limit: f64) {
        self.record(SurfaceCall::SetMiterLimit(limit));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.record(SurfaceCall::SetGlobalAlpha(alpha));
    }

    fn set_composite_operation(&mut self, op: CompositeOp) {
        self.record(SurfaceCall::SetCompositeOperation(op));
    }

    fn set_shadow(&mut self, shadow: &Shadow) {
        self.record(SurfaceCall::SetShadow(*shadow));
    }

    fn set_font(&mut self, font: &str) {
        self.record(SurfaceCall::SetFont(font.to_string()));
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.record(SurfaceCall::SetTextAlign(align));
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.record(SurfaceCall::SetTextBaseline(baseline));
    }

    fn create_gradient(&mut self, gradient: &Gradient) -> Result<StyleHandle> {
        let handle = StyleHandle(self.next_handle);
        self.next_handle += 1;
        self.gradients.push((handle, gradient.clone()));
        self.record(SurfaceCall::CreateGradient(handle));
        Ok(handle)
    }

    fn supports_set_transform(&self) -> bool {
        self.set_transform
    }

    fn set_transform(&mut self, m: &Affine) {
        self.record(SurfaceCall::SetTransform(*m));
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.record(SurfaceCall::Translate { x, y });
    }

    fn rotate(&mut self, angle: f64) {
        self.record(SurfaceCall::Rotate(angle));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.record(SurfaceCall::Scale { sx, sy });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let mut s = RecordingSurface::new();
        s.save();
        s.begin_path();
        s.rect(0.0, 0.0, 10.0, 10.0);
        s.fill();
        s.restore();
        assert_eq!(
            s.calls(),
            &[
                SurfaceCall::Save,
                SurfaceCall::BeginPath,
                SurfaceCall::Rect {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height: 10.0
                },
                SurfaceCall::Fill,
                SurfaceCall::Restore,
            ]
        );
        assert_eq!(s.depth(), 0);
    }

    #[test]
    fn test_take_calls_empties() {
        let mut s = RecordingSurface::new();
        s.fill();
        assert_eq!(s.take_calls().len(), 1);
        assert!(s.calls().is_empty());
    }

    #[test]
    fn test_gradient_handles_are_unique() {
        let mut s = RecordingSurface::new();
        let g = Gradient::linear(0.0, 0.0, 1.0, 1.0);
        let a = s.create_gradient(&g).unwrap();
        let b = s.create_gradient(&g).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_transform_capability() {
        assert!(RecordingSurface::new().supports_set_transform());
        assert!(!RecordingSurface::without_set_transform().supports_set_transform());
    }
}
