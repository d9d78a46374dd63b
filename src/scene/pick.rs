//! Hit testing against the pointer.

use crate::error::Result;

use super::{NodeId, Scene};

impl Scene {
    /// Recompute `under_cursor` for the subtree and claim the pick target.
    ///
    /// The pointer is mapped into each node's local space before its
    /// geometry is tested. Children are tested after their parent in z-order,
    /// so the topmost hit ends up as [`Scene::target`].
    pub fn handle_pick(&mut self, id: NodeId) -> Result<()> {
        let Some(node) = self.node(id) else {
            log::warn!("pick reached stale node {:?}", id);
            return Ok(());
        };
        let attrs = &node.attrs;
        let testable = attrs.effective_visible() && attrs.catch_mouse;
        let hit_testable = attrs.pickable && attrs.drawable && node.kind.as_drawable().is_some();

        let pointer = match self.pointer.filter(|_| testable) {
            Some(pointer) => pointer,
            None => {
                self.clear_under_cursor(id);
                return Ok(());
            }
        };

        let mut hit = false;
        if hit_testable {
            let (x, y) = self.current_matrix(id)?.invert().apply_to_point(pointer.0, pointer.1);
            hit = self
                .get(id)?
                .kind
                .as_drawable()
                .map(|d| d.geometry.is_point_in_path(x, y))
                .unwrap_or(false);
            if hit {
                self.target = Some(id);
            }
        }

        let children = self.take_sorted_children(id);
        let mut result = Ok(());
        for &child in &children {
            if let Err(e) = self.handle_pick(child) {
                result = Err(e);
                break;
            }
            hit |= self.under_cursor(child);
        }
        self.put_sorted_children(id, children);
        result?;

        self.get_mut(id)?.under_cursor = hit;
        Ok(())
    }

    /// Clear the flag on every descendant that still has it set.
    fn clear_under_cursor(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.node_mut(current) {
                if node.under_cursor {
                    node.under_cursor = false;
                    stack.extend_from_slice(&node.children);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::attrs::NodeAttrs;
    use crate::scene::Scene;
    use crate::shapes::{Circle, Rectangle};

    #[test]
    fn test_topmost_sibling_wins() {
        let mut scene = Scene::new();
        let root = scene.add_group(NodeAttrs::group());
        let top = scene.add_shape(NodeAttrs::new().z_index(1), Rectangle::square(10.0));
        let bottom = scene.add_shape(NodeAttrs::new(), Rectangle::square(10.0));
        scene.append_all(root, [top, bottom]).unwrap();

        scene.set_pointer(Some((5.0, 5.0)));
        scene.handle_pick(root).unwrap();
        assert_eq!(scene.target(), Some(top));
        assert!(scene.under_cursor(bottom));
        assert!(scene.under_cursor(root));
    }

    #[test]
    fn test_pick_in_local_space() {
        let mut scene = Scene::new();
        let root = scene.add_group(NodeAttrs::group().position(100.0, 0.0).scale(2.0));
        let circle = scene.add_shape(NodeAttrs::new(), Circle::new(5.0));
        scene.append(root, circle).unwrap();

        scene.set_pointer(Some((108.0, 0.0)));
        scene.handle_pick(root).unwrap();
        assert_eq!(scene.target(), Some(circle));

        scene.set_target(None);
        scene.set_pointer(Some((112.0, 0.0)));
        scene.handle_pick(root).unwrap();
        assert_eq!(scene.target(), None);
        assert!(!scene.under_cursor(circle));
    }

    #[test]
    fn test_hidden_subtree_clears_flags() {
        let mut scene = Scene::new();
        let root = scene.add_group(NodeAttrs::group());
        let rect = scene.add_shape(NodeAttrs::new(), Rectangle::square(10.0));
        scene.append(root, rect).unwrap();
        scene.set_pointer(Some((1.0, 1.0)));
        scene.handle_pick(root).unwrap();
        assert!(scene.under_cursor(rect));

        scene.attrs_mut(root).unwrap().catch_mouse = false;
        scene.handle_pick(root).unwrap();
        assert!(!scene.under_cursor(root));
        assert!(!scene.under_cursor(rect));
    }

    #[test]
    fn test_unpickable_node_never_claims_target() {
        let mut scene = Scene::new();
        let rect = scene.add_shape(NodeAttrs::new().pickable(false), Rectangle::square(10.0));
        scene.set_pointer(Some((1.0, 1.0)));
        scene.handle_pick(rect).unwrap();
        assert_eq!(scene.target(), None);
        assert!(!scene.under_cursor(rect));
    }
}
