//! Event listeners, path dispatch and broadcast.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::attrs::Attr;
use crate::error::Result;
use crate::event::{Event, EventType, Phase, Propagation};

use super::{NodeId, Scene};

/// Listener callback. Returning [`Propagation::Stop`] ends the dispatch.
pub type EventCallback = Rc<RefCell<dyn FnMut(&mut Scene, &mut Event) -> Result<Propagation>>>;

/// Identifies a registered event listener for removal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ListenerId(u64);

pub(crate) struct Listener {
    id: ListenerId,
    kind: EventType,
    phase: Phase,
    callback: EventCallback,
}

impl Scene {
    pub fn add_event_listener<F>(
        &mut self,
        node: NodeId,
        kind: EventType,
        phase: Phase,
        callback: F,
    ) -> Result<ListenerId>
    where
        F: FnMut(&mut Scene, &mut Event) -> Result<Propagation> + 'static,
    {
        let id = ListenerId(self.next_handle().as_u64());
        self.get_mut(node)?.listeners.push(Listener {
            id,
            kind,
            phase,
            callback: Rc::new(RefCell::new(callback)),
        });
        Ok(id)
    }

    /// Returns whether the listener was registered on `node`.
    pub fn remove_event_listener(&mut self, node: NodeId, listener: ListenerId) -> bool {
        match self.node_mut(node) {
            Some(n) => {
                let before = n.listeners.len();
                n.listeners.retain(|l| l.id != listener);
                n.listeners.len() != before
            }
            None => false,
        }
    }

    pub fn has_event_listener(&self, node: NodeId, kind: &EventType) -> bool {
        self.node(node)
            .map(|n| n.listeners.iter().any(|l| l.kind == *kind))
            .unwrap_or(false)
    }

    /// Dispatch `event` along the path from its target up to `node`.
    ///
    /// Without an explicit target, keyboard events go to the focused node
    /// and other events to the last pick target, falling back to `node`. A
    /// target outside `node`'s subtree is replaced by `node`.
    ///
    /// Capture listeners run from `node` down to the target, then bubble
    /// listeners from the target back up. Returns `false` as soon as a
    /// listener stops propagation.
    pub fn dispatch_event(&mut self, node: NodeId, event: &mut Event) -> Result<bool> {
        let inferred = if event.kind.is_keyboard() {
            self.focused.or(self.target)
        } else {
            self.target
        };
        let target = match event.target.or(inferred) {
            Some(t) if self.contains(node, t) => t,
            _ => node,
        };
        event.target = Some(target);

        let mut path = vec![target];
        let mut current = target;
        while current != node {
            match self.parent(current) {
                Some(parent) => {
                    path.push(parent);
                    current = parent;
                }
                None => break,
            }
        }

        event.phase = Phase::Capture;
        for &id in path.iter().rev() {
            if !self.handle_event(id, event)? {
                return Ok(false);
            }
        }
        event.phase = Phase::Bubble;
        for &id in &path {
            if !self.handle_event(id, event)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Dispatch from the root of `target`'s tree.
    pub(crate) fn dispatch_from_root(&mut self, target: NodeId, event: &mut Event) -> Result<bool> {
        let root = self.root(target).unwrap_or(target);
        event.target = Some(target);
        self.dispatch_event(root, event)
    }

    /// Send `event` to every node of the subtree: capture on the way down
    /// (pre-order), bubble on the way back up (post-order).
    pub fn broadcast_event(&mut self, node: NodeId, event: &mut Event) -> Result<bool> {
        event.phase = Phase::Capture;
        if !self.handle_event(node, event)? {
            return Ok(false);
        }
        let children = self.children(node).to_vec();
        for child in children {
            if !self.broadcast_event(child, event)? {
                return Ok(false);
            }
        }
        event.phase = Phase::Bubble;
        self.handle_event(node, event)
    }

    /// Run the listeners of one node for the event's current phase.
    fn handle_event(&mut self, id: NodeId, event: &mut Event) -> Result<bool> {
        let Some(node) = self.node(id) else {
            log::warn!("skipping stale node {:?} during dispatch", id);
            return Ok(true);
        };
        if event.phase == Phase::Capture {
            if let Some(cursor) = node.attrs.cursor {
                event.cursor = Some(cursor);
            }
        }

        // Point-in-time copy: listeners added or removed by a callback take
        // effect on the next dispatch
        let listeners: Vec<EventCallback> = node
            .listeners
            .iter()
            .filter(|l| l.phase == event.phase && l.kind == event.kind)
            .map(|l| l.callback.clone())
            .collect();

        event.current = Some(id);
        for callback in listeners {
            let Ok(mut f) = callback.try_borrow_mut() else {
                log::warn!("listener for {} on {:?} is already running", event.kind, id);
                continue;
            };
            if f(self, event)?.is_stop() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Let the node be dragged around by the pointer.
    ///
    /// The drag delta carried by `drag` events is converted into the
    /// parent's space using the parent's axis scales.
    pub fn make_draggable(&mut self, node: NodeId) -> Result<()> {
        let start = Rc::new(Cell::new((0.0, 0.0)));

        let drag_start = start.clone();
        self.add_event_listener(node, EventType::DragStart, Phase::Bubble, move |scene, ev| {
            if let Some(attrs) = ev.current.and_then(|id| scene.attrs(id)) {
                drag_start.set((attrs.x, attrs.y));
            }
            Ok(Propagation::Stop)
        })?;

        self.add_event_listener(node, EventType::Drag, Phase::Bubble, move |scene, ev| {
            let Some(id) = ev.current else {
                return Ok(Propagation::Stop);
            };
            let (sx, sy) = match scene.parent(id) {
                Some(parent) => {
                    let m = scene.current_matrix(parent)?.data;
                    (m[0], m[3])
                }
                None => (1.0, 1.0),
            };
            let (x0, y0) = start.get();
            scene.set_attr(id, &Attr::X, x0 + ev.delta_x / sx)?;
            scene.set_attr(id, &Attr::Y, y0 + ev.delta_y / sy)?;
            Ok(Propagation::Stop)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::attrs::NodeAttrs;
    use crate::error::SceneError;
    use crate::event::CursorIcon;

    type Log = Rc<RefCell<Vec<String>>>;

    fn logger(
        scene: &mut Scene,
        node: NodeId,
        phase: Phase,
        name: &'static str,
        log: &Log,
        result: Propagation,
    ) {
        let log = log.clone();
        scene
            .add_event_listener(node, EventType::Click, phase, move |_, _| {
                log.borrow_mut().push(name.to_string());
                Ok(result)
            })
            .unwrap();
    }

    fn chain(scene: &mut Scene) -> (NodeId, NodeId, NodeId) {
        let root = scene.add_group(NodeAttrs::group());
        let mid = scene.add_group(NodeAttrs::group());
        let leaf = scene.add_group(NodeAttrs::group());
        scene.append(root, mid).unwrap();
        scene.append(mid, leaf).unwrap();
        (root, mid, leaf)
    }

    #[test]
    fn test_capture_then_bubble_order() {
        let mut scene = Scene::new();
        let (root, mid, leaf) = chain(&mut scene);
        let log: Log = Rc::default();
        for (node, name) in [(root, "root"), (mid, "mid"), (leaf, "leaf")] {
            logger(&mut scene, node, Phase::Capture, name, &log, Propagation::Continue);
            logger(&mut scene, node, Phase::Bubble, name, &log, Propagation::Continue);
        }

        let mut ev = Event::new(EventType::Click).target(leaf);
        assert!(scene.dispatch_event(root, &mut ev).unwrap());
        assert_eq!(
            *log.borrow(),
            vec!["root", "mid", "leaf", "leaf", "mid", "root"]
        );
    }

    #[test]
    fn test_stop_halts_everything() {
        let mut scene = Scene::new();
        let (root, _mid, leaf) = chain(&mut scene);
        let log: Log = Rc::default();
        logger(&mut scene, leaf, Phase::Bubble, "first", &log, Propagation::Stop);
        logger(&mut scene, leaf, Phase::Bubble, "second", &log, Propagation::Continue);
        logger(&mut scene, root, Phase::Bubble, "root", &log, Propagation::Continue);

        let mut ev = Event::new(EventType::Click).target(leaf);
        assert!(!scene.dispatch_event(root, &mut ev).unwrap());
        assert_eq!(*log.borrow(), vec!["first"]);
    }

    #[test]
    fn test_target_inference() {
        let mut scene = Scene::new();
        let (root, mid, leaf) = chain(&mut scene);
        let hits: Rc<RefCell<Vec<Option<NodeId>>>> = Rc::default();
        let h = hits.clone();
        scene
            .add_event_listener(root, EventType::KeyDown, Phase::Capture, move |_, ev| {
                h.borrow_mut().push(ev.target);
                Ok(Propagation::Continue)
            })
            .unwrap();

        scene.set_target(Some(mid));
        scene.dispatch_event(root, &mut Event::new(EventType::KeyDown)).unwrap();
        scene.focused = Some(leaf);
        scene.dispatch_event(root, &mut Event::new(EventType::KeyDown)).unwrap();

        // a target outside the subtree falls back to the dispatching node
        let other = scene.add_group(NodeAttrs::group());
        scene
            .dispatch_event(root, &mut Event::new(EventType::KeyDown).target(other))
            .unwrap();
        assert_eq!(*hits.borrow(), vec![Some(mid), Some(leaf), Some(root)]);
    }

    #[test]
    fn test_listener_removed_mid_dispatch_still_runs_this_time() {
        let mut scene = Scene::new();
        let node = scene.add_group(NodeAttrs::group());
        let log: Log = Rc::default();
        let second_id = Rc::new(Cell::new(None));

        let id_slot = second_id.clone();
        let l = log.clone();
        scene
            .add_event_listener(node, EventType::Click, Phase::Bubble, move |scene, ev| {
                l.borrow_mut().push("first".into());
                if let (Some(id), Some(node)) = (id_slot.get(), ev.current) {
                    scene.remove_event_listener(node, id);
                }
                Ok(Propagation::Continue)
            })
            .unwrap();
        let l = log.clone();
        let id = scene
            .add_event_listener(node, EventType::Click, Phase::Bubble, move |_, _| {
                l.borrow_mut().push("second".into());
                Ok(Propagation::Continue)
            })
            .unwrap();
        second_id.set(Some(id));

        scene.dispatch_event(node, &mut Event::new(EventType::Click)).unwrap();
        scene.dispatch_event(node, &mut Event::new(EventType::Click)).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second", "first"]);
    }

    #[test]
    fn test_listener_errors_propagate() {
        let mut scene = Scene::new();
        let node = scene.add_group(NodeAttrs::group());
        scene
            .add_event_listener(node, EventType::Click, Phase::Bubble, |_, _| {
                Err(SceneError::Listener("boom".into()))
            })
            .unwrap();
        let result = scene.dispatch_event(node, &mut Event::new(EventType::Click));
        assert!(matches!(result, Err(SceneError::Listener(_))));
    }

    #[test]
    fn test_broadcast_visits_pre_and_post_order() {
        let mut scene = Scene::new();
        let (root, mid, leaf) = chain(&mut scene);
        let log: Log = Rc::default();
        for (node, name) in [(root, "root"), (mid, "mid"), (leaf, "leaf")] {
            logger(&mut scene, node, Phase::Capture, name, &log, Propagation::Continue);
            logger(&mut scene, node, Phase::Bubble, name, &log, Propagation::Continue);
        }
        assert!(scene
            .broadcast_event(root, &mut Event::new(EventType::Click))
            .unwrap());
        assert_eq!(
            *log.borrow(),
            vec!["root", "mid", "leaf", "leaf", "mid", "root"]
        );
    }

    #[test]
    fn test_capture_sets_cursor() {
        let mut scene = Scene::new();
        let root = scene.add_group(NodeAttrs::group().cursor(CursorIcon::Pointer));
        let leaf = scene.add_group(NodeAttrs::group().cursor(CursorIcon::Text));
        scene.append(root, leaf).unwrap();
        let mut ev = Event::new(EventType::MouseMove).target(leaf);
        scene.dispatch_event(root, &mut ev).unwrap();
        assert_eq!(ev.cursor, Some(CursorIcon::Text));
    }

    #[test]
    fn test_drag_moves_in_parent_space() {
        let mut scene = Scene::new();
        let parent = scene.add_group(NodeAttrs::group().scale(2.0));
        let node = scene.add_group(NodeAttrs::group().position(5.0, 5.0));
        scene.append(parent, node).unwrap();
        scene.make_draggable(node).unwrap();

        let mut start = Event::new(EventType::DragStart).target(node);
        assert!(!scene.dispatch_event(parent, &mut start).unwrap());
        let mut drag = Event::new(EventType::Drag).target(node).delta(10.0, -4.0);
        scene.dispatch_event(parent, &mut drag).unwrap();

        let attrs = scene.attrs(node).unwrap();
        assert_eq!((attrs.x, attrs.y), (10.0, 3.0));
    }
}
