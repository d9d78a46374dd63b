//! Lazily composed node matrices and the coordinate queries built on them.

use crate::affine::Affine;
use crate::error::Result;
use crate::geometry::BoundingBox;

use super::{NodeId, Scene};

impl Scene {
    /// The node's composed transform, recomputed if it is stale.
    ///
    /// A stale parent is brought up to date first. Detached nodes compose
    /// onto their base matrix, or the identity.
    pub fn current_matrix(&mut self, id: NodeId) -> Result<Affine> {
        let (parent, base) = {
            let node = self.get(id)?;
            if !node.need_matrix_update {
                return Ok(node.current_matrix);
            }
            (node.parent, node.base_matrix)
        };
        let parent_matrix = match parent {
            Some(parent) => self.current_matrix(parent)?,
            None => base.unwrap_or(Affine::IDENTITY),
        };

        let node = self.get_mut(id)?;
        let m = node.attrs.compose_matrix(&parent_matrix);
        node.previous_matrix = node.current_matrix;
        node.current_matrix = m;
        node.need_matrix_update = false;
        Ok(m)
    }

    /// The matrix in effect before the last recomputation.
    pub fn previous_matrix(&self, id: NodeId) -> Option<Affine> {
        self.node(id).map(|n| n.previous_matrix)
    }

    /// Force the matrices of the whole subtree to be recomputed on next use.
    pub fn invalidate_matrices(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.node_mut(current) {
                node.need_matrix_update = true;
                stack.extend_from_slice(&node.children);
            }
        }
    }

    /// Give a detached node a matrix to compose onto instead of the
    /// identity.
    pub(crate) fn set_base_matrix(&mut self, id: NodeId, base: Option<Affine>) {
        if let Some(node) = self.node_mut(id) {
            node.base_matrix = base;
        }
        self.invalidate_matrices(id);
    }

    /// Map a point from the node's local space to scene space.
    pub fn transform_point(&mut self, id: NodeId, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok(self.current_matrix(id)?.apply_to_point(x, y))
    }

    /// Map a point from scene space into the node's local space.
    ///
    /// Degenerate matrices yield non-finite coordinates.
    pub fn inverse_transform_point(&mut self, id: NodeId, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok(self.current_matrix(id)?.invert().apply_to_point(x, y))
    }

    /// Bounding box of the node's own geometry in scene space, `None` for
    /// groups.
    pub fn axis_aligned_bounding_box(&mut self, id: NodeId) -> Result<Option<BoundingBox>> {
        let m = self.current_matrix(id)?;
        let bbox = self
            .get(id)?
            .kind
            .as_drawable()
            .map(|d| d.geometry.bounding_box().transformed(&m));
        Ok(bbox)
    }

    /// Union of the geometry boxes of the node and all its descendants, in
    /// the node's own local space. `None` when nothing in the subtree has
    /// geometry.
    pub fn subtree_bounding_box(&self, id: NodeId) -> Option<BoundingBox> {
        self.subtree_box_in(id, &Affine::IDENTITY)
    }

    /// `to_ref` maps the node's local space into the reference space.
    fn subtree_box_in(&self, id: NodeId, to_ref: &Affine) -> Option<BoundingBox> {
        let node = self.node(id)?;
        let own = node
            .kind
            .as_drawable()
            .map(|d| d.geometry.bounding_box().transformed(to_ref));

        node.children.iter().fold(own, |acc, &child| {
            let local = match self.node(child) {
                Some(c) => c.attrs.compose_matrix(&Affine::IDENTITY),
                None => return acc,
            };
            match (acc, self.subtree_box_in(child, &to_ref.then(&local))) {
                (Some(a), Some(b)) => Some(a.union(&b)),
                (a, b) => a.or(b),
            }
        })
    }
}
