//! Scheduling animations, keyframes, timeline events and frame listeners on
//! nodes.

use std::cell::RefCell;
use std::rc::Rc;

use crate::animation::{
    Animatable, AnimationHandle, Animator, AnimatorSpec, AttrValue, KeyTime, Keyframe, Timeline,
    TimelineAction, TimelineEvent, Tween, Variable,
};
use crate::attrs::Attr;
use crate::error::{Result, SceneError};
use crate::event::Propagation;

use super::{NodeId, Scene};

impl Scene {
    pub fn animation(&self, id: NodeId) -> Option<&Animatable> {
        self.node(id).map(|n| &n.animation)
    }

    /// Start an animator on the node.
    ///
    /// Attribute animators assign their start value right away. With
    /// `additive` set, start and end are offset by the attribute's value at
    /// the time of the call.
    pub fn animate(&mut self, id: NodeId, spec: AnimatorSpec) -> Result<AnimationHandle> {
        let animator = self.build_animator(id, spec)?;
        let handle = animator.id();
        self.get_mut(id)?.animation.push_animator(animator);
        Ok(handle)
    }

    /// Animate `attr` from its current value to `end`.
    pub fn animate_to(
        &mut self,
        id: NodeId,
        attr: Attr,
        end: impl Into<AttrValue>,
        duration: f64,
        tween: Tween,
    ) -> Result<AnimationHandle> {
        let start = self.current_value(id, &attr)?;
        self.animate(id, AnimatorSpec::new(attr, start, end, duration).tween(tween))
    }

    /// Animate `attr` from `start` back to its current value.
    pub fn animate_from(
        &mut self,
        id: NodeId,
        attr: Attr,
        start: impl Into<AttrValue>,
        duration: f64,
        tween: Tween,
    ) -> Result<AnimationHandle> {
        let end = self.current_value(id, &attr)?;
        self.animate(id, AnimatorSpec::new(attr, start, end, duration).tween(tween))
    }

    /// Animate `attr` to its current value multiplied by `factor`.
    pub fn animate_factor(
        &mut self,
        id: NodeId,
        attr: Attr,
        factor: f64,
        duration: f64,
        tween: Tween,
    ) -> Result<AnimationHandle> {
        let start = self.current_value(id, &attr)?;
        let end = start.scaled(factor);
        self.animate(id, AnimatorSpec::new(attr, start, end, duration).tween(tween))
    }

    fn current_value(&self, id: NodeId, attr: &Attr) -> Result<AttrValue> {
        self.get(id)?
            .attrs
            .get(attr)
            .ok_or_else(|| SceneError::invalid_value(attr.to_string(), "attribute is unset"))
    }

    pub(crate) fn build_animator(&mut self, id: NodeId, spec: AnimatorSpec) -> Result<Animator> {
        let AnimatorSpec {
            variable,
            mut start,
            mut end,
            duration,
            tween,
            options,
        } = spec;

        if let Variable::Attr(attr) = &variable {
            if options.additive {
                if let Some(current) = self.get(id)?.attrs.get(attr) {
                    start = start.add(&current);
                    end = end.add(&current);
                }
            }
            self.set_attr(id, attr, start.clone())?;
        }

        let handle = self.next_handle();
        Ok(Animator::new(
            handle, variable, start, end, duration, tween, &options,
        ))
    }

    // Keyframes

    /// Add a keyframe `delay` after the frame it gets picked up in.
    pub fn add_keyframe(
        &mut self,
        id: NodeId,
        delay: f64,
        target: Vec<(Attr, AttrValue)>,
        tween: Tween,
    ) -> Result<()> {
        self.push_keyframe(
            id,
            Keyframe {
                time: KeyTime::After(delay),
                target,
                tween,
            },
        )
    }

    /// Add a keyframe at absolute frame time `time`.
    pub fn add_keyframe_at(
        &mut self,
        id: NodeId,
        time: f64,
        target: Vec<(Attr, AttrValue)>,
        tween: Tween,
    ) -> Result<()> {
        self.push_keyframe(
            id,
            Keyframe {
                time: KeyTime::At(time),
                target,
                tween,
            },
        )
    }

    /// Add a keyframe `delta` after the previously appended one.
    pub fn append_keyframe(
        &mut self,
        id: NodeId,
        delta: f64,
        target: Vec<(Attr, AttrValue)>,
        tween: Tween,
    ) -> Result<()> {
        let animation = &mut self.get_mut(id)?.animation;
        animation.last_action += delta;
        let time = KeyTime::After(animation.last_action);
        animation.push_keyframe(Keyframe {
            time,
            target,
            tween,
        });
        Ok(())
    }

    pub fn push_keyframe(&mut self, id: NodeId, keyframe: Keyframe) -> Result<()> {
        self.get_mut(id)?.animation.push_keyframe(keyframe);
        Ok(())
    }

    pub fn clear_keyframes(&mut self, id: NodeId) -> Result<()> {
        self.get_mut(id)?.animation.clear_keyframes();
        Ok(())
    }

    // Timelines

    pub fn add_timeline(&mut self, id: NodeId, timeline: Timeline) -> Result<AnimationHandle> {
        let handle = self.next_handle();
        self.get_mut(id)?.animation.push_timeline(handle, timeline);
        Ok(handle)
    }

    pub fn remove_timeline(&mut self, id: NodeId, handle: AnimationHandle) -> bool {
        self.remove_animation(id, handle)
    }

    // Timeline events

    /// Run `action` at absolute frame time `time`.
    pub fn at(
        &mut self,
        id: NodeId,
        time: f64,
        action: TimelineAction,
    ) -> Result<AnimationHandle> {
        self.schedule(id, KeyTime::At(time), action, None)
    }

    /// Run `action` `delay` after the frame it gets picked up in.
    pub fn after(
        &mut self,
        id: NodeId,
        delay: f64,
        action: TimelineAction,
    ) -> Result<AnimationHandle> {
        self.schedule(id, KeyTime::After(delay), action, None)
    }

    /// Run `action` every `interval` until a callback action returns
    /// [`Propagation::Stop`] or the event is removed.
    pub fn every(
        &mut self,
        id: NodeId,
        interval: f64,
        action: TimelineAction,
        skip_first: bool,
    ) -> Result<AnimationHandle> {
        let first = if skip_first { interval } else { 0.0 };
        self.schedule(id, KeyTime::After(first), action, Some(interval))
    }

    fn schedule(
        &mut self,
        id: NodeId,
        time: KeyTime,
        action: TimelineAction,
        repeat_every: Option<f64>,
    ) -> Result<AnimationHandle> {
        self.get(id)?;
        let handle = self.next_handle();
        let mut event = TimelineEvent::new(handle, time, action);
        event.repeat_every = repeat_every;
        self.get_mut(id)?.animation.push_event(event);
        Ok(handle)
    }

    pub fn remove_animator(&mut self, id: NodeId, handle: AnimationHandle) -> bool {
        self.remove_animation(id, handle)
    }

    pub fn remove_timeline_event(&mut self, id: NodeId, handle: AnimationHandle) -> bool {
        self.remove_animation(id, handle)
    }

    fn remove_animation(&mut self, id: NodeId, handle: AnimationHandle) -> bool {
        self.node_mut(id)
            .map(|n| n.animation.remove(handle))
            .unwrap_or(false)
    }

    // Frame listeners

    /// Call `callback` every frame after the node's animations advanced.
    pub fn add_frame_listener<F>(&mut self, id: NodeId, callback: F) -> Result<AnimationHandle>
    where
        F: FnMut(&mut Scene, NodeId, f64, f64) -> Result<Propagation> + 'static,
    {
        self.get(id)?;
        let handle = self.next_handle();
        self.get_mut(id)?
            .frame_listeners
            .push((handle, Rc::new(RefCell::new(callback))));
        Ok(handle)
    }

    pub fn remove_frame_listener(&mut self, id: NodeId, handle: AnimationHandle) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                let before = node.frame_listeners.len();
                node.frame_listeners.retain(|(h, _)| *h != handle);
                node.frame_listeners.len() != before
            }
            None => false,
        }
    }

    /// Run `callback` once, on the `frames`-th frame from now.
    pub fn after_frame<F>(&mut self, id: NodeId, frames: u32, callback: F) -> Result<AnimationHandle>
    where
        F: FnOnce(&mut Scene, NodeId, f64, f64) -> Result<()> + 'static,
    {
        let mut remaining = frames.max(1);
        let mut callback = Some(callback);
        self.add_frame_listener(id, move |scene, id, t, dt| {
            remaining -= 1;
            if remaining > 0 {
                return Ok(Propagation::Continue);
            }
            if let Some(f) = callback.take() {
                f(scene, id, t, dt)?;
            }
            Ok(Propagation::Stop)
        })
    }

    /// Run `callback` every `frames` frames until it returns
    /// [`Propagation::Stop`].
    pub fn every_frame<F>(
        &mut self,
        id: NodeId,
        frames: u32,
        mut callback: F,
        skip_first: bool,
    ) -> Result<AnimationHandle>
    where
        F: FnMut(&mut Scene, NodeId, f64, f64) -> Result<Propagation> + 'static,
    {
        let frames = frames.max(1);
        let mut count = if skip_first { 0 } else { frames - 1 };
        self.add_frame_listener(id, move |scene, id, t, dt| {
            count += 1;
            if count < frames {
                return Ok(Propagation::Continue);
            }
            count = 0;
            callback(scene, id, t, dt)
        })
    }
}
