//! Draw traversal: paint state, clip paths, geometry and markers.

use crate::affine::Affine;
use crate::drawable::{ClipPath, MarkerSpec, MarkerUnits};
use crate::error::Result;
use crate::geometry::PathPoint;
use crate::paint::{PaintSetting, StyleUnits};
use crate::surface::{DrawContext, Surface};

use super::{NodeId, Scene};

impl Scene {
    /// Draw the subtree at `id`.
    ///
    /// Each visible node saves the surface state, applies its matrix and
    /// the paint attributes it sets, paints itself and then its children in
    /// stable z-order. An error leaves the save stack unbalanced; callers
    /// are expected to [`DrawContext::unwind`].
    pub fn handle_draw<S: Surface>(&mut self, id: NodeId, ctx: &mut DrawContext<S>) -> Result<()> {
        let visible = match self.node(id) {
            Some(node) => node.attrs.effective_visible(),
            None => {
                log::warn!("draw reached stale node {:?}", id);
                return Ok(());
            }
        };
        if !visible {
            return Ok(());
        }

        ctx.save();
        let m = self.current_matrix(id)?;
        ctx.set_matrix(&m);
        self.apply_paint_state(id, ctx)?;

        if let Some(clip) = self.get(id)?.clip_path {
            self.apply_clip_path(id, clip, ctx)?;
        }
        if self.get(id)?.attrs.drawable {
            self.draw_own_geometry(id, ctx)?;
        }

        let children = self.take_sorted_children(id);
        let mut result = Ok(());
        for &child in &children {
            result = self.handle_draw(child, ctx);
            if result.is_err() {
                break;
            }
        }
        self.put_sorted_children(id, children);
        result?;

        ctx.restore();
        Ok(())
    }

    /// Push the paint attributes the node sets. Unset ones inherit.
    fn apply_paint_state<S: Surface>(&self, id: NodeId, ctx: &mut DrawContext<S>) -> Result<()> {
        let attrs = &self.get(id)?.attrs;

        match &attrs.fill {
            PaintSetting::Inherit => {}
            PaintSetting::On => ctx.set_fill_on(true),
            PaintSetting::Off => ctx.set_fill_on(false),
            PaintSetting::Paint(paint) => {
                ctx.set_fill_paint(paint)?;
                ctx.set_fill_on(true);
            }
        }
        match &attrs.stroke {
            PaintSetting::Inherit => {}
            PaintSetting::On => ctx.set_stroke_on(true),
            PaintSetting::Off => ctx.set_stroke_on(false),
            PaintSetting::Paint(paint) => {
                ctx.set_stroke_paint(paint)?;
                ctx.set_stroke_on(true);
            }
        }

        if let Some(width) = attrs.stroke_width {
            ctx.set_line_width(width);
        }
        if let Some(cap) = attrs.line_cap {
            ctx.set_line_cap(cap);
        }
        if let Some(join) = attrs.line_join {
            ctx.set_line_join(join);
        }
        if let Some(limit) = attrs.miter_limit {
            ctx.set_miter_limit(limit);
        }
        if let Some(opacity) = attrs.opacity {
            let alpha = if attrs.absolute_opacity {
                opacity
            } else {
                ctx.global_alpha() * opacity
            };
            ctx.set_global_alpha(alpha);
        }
        if let Some(op) = attrs.composite_op {
            ctx.set_composite_operation(op);
        }
        if let Some(shadow) = &attrs.shadow {
            ctx.set_shadow(shadow);
        }
        if let Some(font) = &attrs.font {
            ctx.set_font(font);
        }
        if let Some(align) = attrs.text_align {
            ctx.set_text_align(align);
        }
        if let Some(baseline) = attrs.text_baseline {
            ctx.set_text_baseline(baseline);
        }
        Ok(())
    }

    /// Clip to the union of the paths in the clip node's subtree.
    fn apply_clip_path<S: Surface>(
        &mut self,
        id: NodeId,
        clip: ClipPath,
        ctx: &mut DrawContext<S>,
    ) -> Result<()> {
        if !self.is_alive(clip.node) {
            log::warn!("clip path node {:?} of {:?} is gone", clip.node, id);
            return Ok(());
        }

        let mut base = ctx.matrix();
        if clip.units == StyleUnits::ObjectBoundingBox {
            let bbox = self.subtree_bounding_box(id).unwrap_or_default();
            base.compose(&bbox.unit_transform());
        }

        ctx.save();
        ctx.begin_path();
        let result = self.trace_clip_path(clip.node, &base, ctx);
        ctx.restore();
        result?;
        ctx.clip();
        Ok(())
    }

    /// Add the geometry of every visible node in the subtree to the current
    /// path. The clip node's own transform is not applied.
    fn trace_clip_path<S: Surface>(
        &self,
        id: NodeId,
        m: &Affine,
        ctx: &mut DrawContext<S>,
    ) -> Result<()> {
        let Some(node) = self.node(id) else {
            return Ok(());
        };
        if !node.attrs.effective_visible() {
            return Ok(());
        }
        if let Some(drawable) = node.kind.as_drawable() {
            ctx.set_matrix(m);
            drawable.geometry.draw_geometry(ctx.surface_mut())?;
        }
        for &child in &node.children {
            if let Some(c) = self.node(child) {
                let child_matrix = c.attrs.compose_matrix(m);
                self.trace_clip_path(child, &child_matrix, ctx)?;
            }
        }
        Ok(())
    }

    fn draw_own_geometry<S: Surface>(&mut self, id: NodeId, ctx: &mut DrawContext<S>) -> Result<()> {
        let (markers, clip) = {
            let node = self.get(id)?;
            let Some(drawable) = node.kind.as_drawable() else {
                return Ok(());
            };
            ctx.begin_path();
            drawable.geometry.draw_geometry(ctx.surface_mut())?;
            drawable.paint(ctx, node.attrs.fill_opacity, node.attrs.stroke_opacity);

            let mut markers: Vec<(MarkerSpec, PathPoint)> = Vec::new();
            let geometry = &drawable.geometry;
            if let (Some(spec), Some(p)) = (drawable.markers.start, geometry.start_point()) {
                markers.push((spec, p));
            }
            if let Some(spec) = drawable.markers.mid {
                markers.extend(geometry.mid_points().into_iter().map(|p| (spec, p)));
            }
            if let (Some(spec), Some(p)) = (drawable.markers.end, geometry.end_point()) {
                markers.push((spec, p));
            }
            (markers, drawable.clip)
        };

        for (spec, point) in &markers {
            self.draw_marker(spec, point, ctx)?;
        }

        if clip {
            let node = self.get(id)?;
            if let Some(drawable) = node.kind.as_drawable() {
                // Markers replaced the current path
                if !markers.is_empty() {
                    ctx.begin_path();
                    drawable.geometry.draw_geometry(ctx.surface_mut())?;
                }
                ctx.clip();
            }
        }
        Ok(())
    }

    fn draw_marker<S: Surface>(
        &mut self,
        spec: &MarkerSpec,
        point: &PathPoint,
        ctx: &mut DrawContext<S>,
    ) -> Result<()> {
        if self.parent(spec.node).is_some() {
            log::warn!("marker {:?} is attached to a tree, ignoring placement", spec.node);
        }
        let scale = match spec.units {
            MarkerUnits::StrokeWidth => ctx.line_width(),
            MarkerUnits::UserSpace => 1.0,
        };
        let angle = spec.orient.unwrap_or(point.angle);
        let mut m = ctx.matrix();
        m.translate(point.point.0, point.point.1)
            .scale(scale, scale)
            .rotate(angle, None);

        ctx.save();
        self.set_base_matrix(spec.node, Some(m));
        self.handle_draw(spec.node, ctx)?;
        self.set_base_matrix(spec.node, None);
        ctx.restore();
        Ok(())
    }
}
