//! Per-frame update pass: animation advance, frame listeners and the
//! visibility / dirty-flag bookkeeping.

use std::cell::RefCell;
use std::rc::Rc;

use crate::animation::{Animatable, Animator, AttrValue, TimelineAction, TimelineEvent, Variable};
use crate::error::Result;
use crate::event::Propagation;

use super::{NodeId, Scene};

/// Callback run once per frame with the frame time and delta. Returning
/// [`Propagation::Stop`] unregisters it.
pub type FrameCallback = Rc<RefCell<dyn FnMut(&mut Scene, NodeId, f64, f64) -> Result<Propagation>>>;

impl Scene {
    /// Advance the subtree at `id` to frame time `t`.
    ///
    /// A node runs its own animations and frame listeners before its
    /// children, which are visited in insertion order.
    pub fn handle_update(&mut self, id: NodeId, t: f64, dt: f64) -> Result<()> {
        if !self.is_alive(id) {
            log::warn!("update reached stale node {:?}", id);
            return Ok(());
        }
        self.time = t;
        self.advance(id, t, dt)?;
        self.run_frame_listeners(id, t, dt)?;

        let (children, parent) = {
            let parent = self.parent(id);
            let parent_drawn = parent
                .and_then(|p| self.node(p))
                .map(|p| p.will_be_drawn)
                .unwrap_or(true);
            let node = self.get_mut(id)?;
            node.will_be_drawn = parent_drawn && node.attrs.effective_visible();
            (node.children.clone(), parent)
        };

        for child in children {
            self.handle_update(child, t, dt)?;
        }

        let changed = {
            let node = self.get_mut(id)?;
            node.need_matrix_update = true;
            let changed = node.changed && parent.is_some();
            if changed {
                node.changed = false;
            }
            changed
        };
        if let Some(parent) = parent.filter(|_| changed) {
            if let Some(p) = self.node_mut(parent) {
                p.changed = true;
            }
        }
        Ok(())
    }

    /// Run the node's timelines, keyframes, due events and animators.
    fn advance(&mut self, id: NodeId, t: f64, dt: f64) -> Result<()> {
        let mut state = self.get_mut(id)?.animation.begin_advance();
        let result = self.advance_state(id, &mut state, t, dt);
        if let Some(node) = self.node_mut(id) {
            node.animation.end_advance(state);
        }
        result
    }

    fn advance_state(
        &mut self,
        id: NodeId,
        state: &mut Animatable,
        t: f64,
        dt: f64,
    ) -> Result<()> {
        for (_, timeline) in state.timelines.iter_mut() {
            let output = timeline.evaluate(t);
            for (attr, value) in output.assignments() {
                self.set_attr(id, attr, value.clone())?;
            }
        }

        state.merge_pending(t);
        let output = state.keyframes.evaluate(t);
        for (attr, value) in output.assignments() {
            self.set_attr(id, attr, value.clone())?;
        }

        let mut rescheduled: Vec<TimelineEvent> = Vec::new();
        while let Some(mut event) = state.events.pop_due(t) {
            let propagation = match &event.action {
                TimelineAction::Callback(callback) => {
                    let callback = callback.clone();
                    let Ok(mut f) = callback.try_borrow_mut() else {
                        // Stays queued and fires on a later frame
                        log::warn!("timeline callback on {:?} is already running", id);
                        rescheduled.push(event);
                        continue;
                    };
                    let propagation = f(self, id, t, dt)?;
                    propagation
                }
                TimelineAction::Animate(spec) => {
                    let animator = self.build_animator(id, spec.clone())?;
                    state.push_animator(animator);
                    Propagation::Continue
                }
            };
            if event.reschedule(propagation) {
                rescheduled.push(event);
            }
        }
        if !rescheduled.is_empty() {
            state.events.merge(rescheduled, t);
        }

        let mut finished = Vec::new();
        for animator in state.animators.iter_mut() {
            let step = animator.step(t);
            let value = animator.value_at(step.pos);
            self.apply_variable(id, &animator.variable, &value)?;
            if step.finished {
                finished.push(animator.id());
            }
        }
        if !finished.is_empty() {
            state.animators.retain(|a: &Animator| !finished.contains(&a.id()));
        }
        Ok(())
    }

    pub(crate) fn apply_variable(
        &mut self,
        id: NodeId,
        variable: &Variable,
        value: &AttrValue,
    ) -> Result<()> {
        match variable {
            Variable::Attr(attr) => self.set_attr(id, attr, value.clone()),
            Variable::Callback(setter) => setter(self, id, value),
        }
    }

    fn run_frame_listeners(&mut self, id: NodeId, t: f64, dt: f64) -> Result<()> {
        let listeners = match self.node(id) {
            Some(node) if !node.frame_listeners.is_empty() => node.frame_listeners.clone(),
            _ => return Ok(()),
        };
        for (handle, callback) in listeners {
            let registered = self
                .node(id)
                .map(|n| n.frame_listeners.iter().any(|(h, _)| *h == handle))
                .unwrap_or(false);
            if !registered {
                continue;
            }
            let Ok(mut f) = callback.try_borrow_mut() else {
                log::warn!("frame listener on {:?} is already running", id);
                continue;
            };
            if f(self, id, t, dt)?.is_stop() {
                self.remove_frame_listener(id, handle);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::animation::{AnimateOptions, AnimatorSpec, AttrValue, Repeat, TimelineAction, Tween};
    use crate::attrs::{Attr, NodeAttrs};
    use crate::event::Propagation;
    use crate::scene::Scene;

    fn x(scene: &Scene, id: crate::scene::NodeId) -> f64 {
        scene.attrs(id).unwrap().x
    }

    #[test]
    fn test_will_be_drawn_follows_hidden_ancestor() {
        let mut scene = Scene::new();
        let root = scene.add_group(NodeAttrs::group());
        let hidden = scene.add_group(NodeAttrs::group().visible(false));
        let leaf = scene.add_group(NodeAttrs::group());
        scene.append(root, hidden).unwrap();
        scene.append(hidden, leaf).unwrap();

        scene.handle_update(root, 0.0, 0.0).unwrap();
        assert!(scene.will_be_drawn(root));
        assert!(!scene.will_be_drawn(hidden));
        assert!(!scene.will_be_drawn(leaf));
    }

    #[test]
    fn test_changed_propagates_to_root() {
        let mut scene = Scene::new();
        let root = scene.add_group(NodeAttrs::group());
        let mid = scene.add_group(NodeAttrs::group());
        let leaf = scene.add_group(NodeAttrs::group());
        scene.append(root, mid).unwrap();
        scene.append(mid, leaf).unwrap();
        scene.handle_update(root, 0.0, 0.0).unwrap();
        scene.clear_changed(root);

        scene.set_attr(leaf, &Attr::X, 4.0).unwrap();
        scene.handle_update(root, 1.0, 1.0).unwrap();
        assert!(scene.is_changed(root));
        assert!(!scene.is_changed(leaf));
        assert!(!scene.is_changed(mid));
    }

    #[test]
    fn test_keyframes_interpolate_then_snap() {
        let mut scene = Scene::new();
        let node = scene.add_group(NodeAttrs::group());
        scene.add_keyframe_at(node, 0.0, vec![(Attr::X, AttrValue::Number(0.0))], Tween::Linear).unwrap();
        scene.add_keyframe_at(node, 10.0, vec![(Attr::X, AttrValue::Number(100.0))], Tween::Linear).unwrap();

        scene.handle_update(node, 5.0, 5.0).unwrap();
        assert_eq!(x(&scene, node), 50.0);
        scene.handle_update(node, 20.0, 15.0).unwrap();
        assert_eq!(x(&scene, node), 100.0);

        // the snap happens once
        scene.set_attr(node, &Attr::X, 7.0).unwrap();
        scene.handle_update(node, 30.0, 10.0).unwrap();
        assert_eq!(x(&scene, node), 7.0);
    }

    #[test]
    fn test_animator_repeat_accumulate() {
        let mut scene = Scene::new();
        let node = scene.add_group(NodeAttrs::group());
        let spec = AnimatorSpec::new(Attr::X, 0.0, 10.0, 100.0).options(
            AnimateOptions::default()
                .repeat(Repeat::Times(2))
                .accumulate(true),
        );
        scene.animate(node, spec).unwrap();

        let mut t = 0.0;
        while t <= 300.0 {
            scene.handle_update(node, t, 10.0).unwrap();
            t += 10.0;
        }
        assert_eq!(x(&scene, node), 20.0);
        assert!(scene.animation(node).unwrap().is_idle());
    }

    #[test]
    fn test_every_reschedules_and_stops() {
        let mut scene = Scene::new();
        let node = scene.add_group(NodeAttrs::group());
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        scene
            .every(
                node,
                10.0,
                TimelineAction::callback(move |_, _, _, _| {
                    r.set(r.get() + 1);
                    Ok(Propagation::from(r.get() < 3))
                }),
                false,
            )
            .unwrap();

        for frame in 0..10 {
            scene.handle_update(node, frame as f64 * 10.0, 10.0).unwrap();
        }
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn test_zero_interval_event_runs_once_per_frame() {
        let mut scene = Scene::new();
        let node = scene.add_group(NodeAttrs::group());
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        scene
            .every(
                node,
                0.0,
                TimelineAction::callback(move |_, _, _, _| {
                    r.set(r.get() + 1);
                    Ok(Propagation::Continue)
                }),
                false,
            )
            .unwrap();
        scene.handle_update(node, 0.0, 0.0).unwrap();
        scene.handle_update(node, 1.0, 1.0).unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_busy_shared_callback_keeps_event_queued() {
        let mut scene = Scene::new();
        let a = scene.add_group(NodeAttrs::group());
        let b = scene.add_group(NodeAttrs::group());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let action = TimelineAction::callback(move |scene, id, t, dt| {
            s.borrow_mut().push(id);
            if id == a {
                scene.handle_update(b, t, dt)?;
            }
            Ok(Propagation::Continue)
        });
        scene.every(a, 10.0, action.clone(), false).unwrap();
        scene.every(b, 10.0, action, false).unwrap();

        for frame in 0..5 {
            scene.handle_update(a, frame as f64 * 10.0, 10.0).unwrap();
        }
        assert_eq!(*seen.borrow(), vec![a; 5]);
        assert!(!scene.animation(b).unwrap().is_idle());

        // outside the running callback the deferred event fires
        scene.handle_update(b, 50.0, 10.0).unwrap();
        assert_eq!(seen.borrow().last(), Some(&b));
    }

    #[test]
    fn test_scheduled_animator_starts_from_event() {
        let mut scene = Scene::new();
        let node = scene.add_group(NodeAttrs::group());
        let spec = AnimatorSpec::new(Attr::Y, 0.0, 10.0, 10.0);
        scene.at(node, 5.0, spec.into()).unwrap();

        scene.handle_update(node, 0.0, 0.0).unwrap();
        assert!(scene.animation(node).unwrap().animators().is_empty());
        scene.handle_update(node, 5.0, 5.0).unwrap();
        scene.handle_update(node, 10.0, 5.0).unwrap();
        assert_eq!(scene.attrs(node).unwrap().y, 5.0);
    }

    #[test]
    fn test_frame_listener_stop_unregisters() {
        let mut scene = Scene::new();
        let node = scene.add_group(NodeAttrs::group());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        scene
            .add_frame_listener(node, move |_, _, t, _| {
                s.borrow_mut().push(t);
                Ok(Propagation::from(t < 2.0))
            })
            .unwrap();
        for t in 0..5 {
            scene.handle_update(node, t as f64, 1.0).unwrap();
        }
        assert_eq!(*seen.borrow(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_animation_scheduled_from_callback_waits_a_frame() {
        let mut scene = Scene::new();
        let node = scene.add_group(NodeAttrs::group());
        scene
            .at(
                node,
                0.0,
                TimelineAction::callback(|scene, id, _, _| {
                    scene.animate(id, AnimatorSpec::new(Attr::X, 1.0, 1.0, 0.0))?;
                    Ok(Propagation::Continue)
                }),
            )
            .unwrap();
        scene.handle_update(node, 0.0, 0.0).unwrap();
        assert_eq!(scene.animation(node).unwrap().animator_count(), 1);
        scene.handle_update(node, 1.0, 1.0).unwrap();
        assert_eq!(x(&scene, node), 1.0);
    }
}
