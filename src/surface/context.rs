use crate::affine::{Affine, Decomposed};
use crate::error::Result;
use crate::paint::{
    CompositeOp, LineCap, LineJoin, Paint, Shadow, TextAlign, TextBaseline,
};

use super::Surface;

/// The part of the surface state the scene needs to read back.
#[derive(Clone, Debug)]
struct GraphicsState {
    matrix: Affine,
    fill_on: bool,
    stroke_on: bool,
    fill: Option<Paint>,
    stroke: Option<Paint>,
    line_width: f64,
    global_alpha: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            matrix: Affine::IDENTITY,
            fill_on: false,
            stroke_on: false,
            fill: None,
            stroke: None,
            line_width: 1.0,
            global_alpha: 1.0,
        }
    }
}

/// A surface plus a mirror of its save/restore stack.
///
/// Every `save` pushes the tracked state and every `restore` pops it, so the
/// context always knows the current matrix and whether fill or stroke is
/// enabled, and it can unwind an unbalanced stack after a failed frame.
pub struct DrawContext<S: Surface> {
    surface: S,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
}

impl<S: Surface> DrawContext<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            state: GraphicsState::default(),
            stack: Vec::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Number of saves not yet restored.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn save(&mut self) {
        self.surface.save();
        self.stack.push(self.state.clone());
    }

    pub fn restore(&mut self) {
        match self.stack.pop() {
            Some(state) => {
                self.surface.restore();
                self.state = state;
            }
            None => log::warn!("restore without matching save"),
        }
    }

    /// Restore until every outstanding save is popped. Returns how many
    /// levels were unwound.
    pub fn unwind(&mut self) -> usize {
        let depth = self.depth();
        for _ in 0..depth {
            self.restore();
        }
        depth
    }

    /// Forget all tracked state, as if the context had just been created.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.state = GraphicsState::default();
        if self.surface.supports_set_transform() {
            self.surface.set_transform(&Affine::IDENTITY);
        }
    }

    // Transforms

    pub fn matrix(&self) -> Affine {
        self.state.matrix
    }

    /// Make `m` the current transform.
    ///
    /// Surfaces without `set_transform` get the current matrix undone and
    /// `m` applied, both as translate/rotate/scale sequences.
    pub fn set_matrix(&mut self, m: &Affine) {
        if *m == self.state.matrix {
            return;
        }
        if self.surface.supports_set_transform() {
            self.surface.set_transform(m);
        } else {
            if !self.state.matrix.is_identity() {
                let undo = self.state.matrix.invert();
                if undo.is_finite() {
                    self.apply_decomposed(&undo.decompose());
                } else {
                    log::warn!("cannot undo a degenerate surface transform");
                }
            }
            self.apply_decomposed(&m.decompose());
        }
        self.state.matrix = *m;
    }

    fn apply_decomposed(&mut self, d: &Decomposed) {
        if d.dx != 0.0 || d.dy != 0.0 {
            self.surface.translate(d.dx, d.dy);
        }
        if d.angle2 != 0.0 {
            self.surface.rotate(d.angle2);
        }
        if d.sx != 1.0 || d.sy != 1.0 {
            self.surface.scale(d.sx, d.sy);
        }
        if d.angle1 != 0.0 {
            self.surface.rotate(d.angle1);
        }
    }

    pub fn translate(&mut self, x: f64, y: f64) {
        self.surface.translate(x, y);
        self.state.matrix.compose(&Affine::translation(x, y));
    }

    pub fn rotate(&mut self, angle: f64) {
        self.surface.rotate(angle);
        self.state.matrix.compose(&Affine::rotation(angle));
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.surface.scale(sx, sy);
        self.state.matrix.compose(&Affine::scaling(sx, sy));
    }

    /// Multiply `m` onto the current transform.
    pub fn transform(&mut self, m: &Affine) {
        let next = self.state.matrix.then(m);
        self.set_matrix(&next);
    }

    // Fill and stroke state

    pub fn fill_on(&self) -> bool {
        self.state.fill_on
    }

    pub fn stroke_on(&self) -> bool {
        self.state.stroke_on
    }

    pub fn set_fill_on(&mut self, on: bool) {
        self.state.fill_on = on;
    }

    pub fn set_stroke_on(&mut self, on: bool) {
        self.state.stroke_on = on;
    }

    pub fn fill_paint(&self) -> Option<&Paint> {
        self.state.fill.as_ref()
    }

    pub fn stroke_paint(&self) -> Option<&Paint> {
        self.state.stroke.as_ref()
    }

    pub fn set_fill_paint(&mut self, paint: &Paint) -> Result<()> {
        let native = paint.compile(&mut self.surface)?;
        self.surface.set_fill_style(&native);
        self.state.fill = Some(paint.clone());
        Ok(())
    }

    pub fn set_stroke_paint(&mut self, paint: &Paint) -> Result<()> {
        let native = paint.compile(&mut self.surface)?;
        self.surface.set_stroke_style(&native);
        self.state.stroke = Some(paint.clone());
        Ok(())
    }

    pub fn line_width(&self) -> f64 {
        self.state.line_width
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.surface.set_line_width(width);
        self.state.line_width = width;
    }

    pub fn global_alpha(&self) -> f64 {
        self.state.global_alpha
    }

    pub fn set_global_alpha(&mut self, alpha: f64) {
        self.surface.set_global_alpha(alpha);
        self.state.global_alpha = alpha;
    }

    // Untracked pass-through state

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.surface.set_line_cap(cap);
    }

    pub fn set_line_join(&mut self, join: LineJoin) {
        self.surface.set_line_join(join);
    }

    pub fn set_miter_limit(&mut self, limit: f64) {
        self.surface.set_miter_limit(limit);
    }

    pub fn set_composite_operation(&mut self, op: CompositeOp) {
        self.surface.set_composite_operation(op);
    }

    pub fn set_shadow(&mut self, shadow: &Shadow) {
        self.surface.set_shadow(shadow);
    }

    pub fn set_font(&mut self, font: &str) {
        self.surface.set_font(font);
    }

    pub fn set_text_align(&mut self, align: TextAlign) {
        self.surface.set_text_align(align);
    }

    pub fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.surface.set_text_baseline(baseline);
    }

    // Path operations

    pub fn begin_path(&mut self) {
        self.surface.begin_path();
    }

    pub fn fill(&mut self) {
        self.surface.fill();
    }

    pub fn stroke(&mut self) {
        self.surface.stroke();
    }

    pub fn clip(&mut self) {
        self.surface.clip();
    }

    pub fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.surface.clear_rect(x, y, width, height);
    }
}
