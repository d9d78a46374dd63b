//! Per-node animation state: animators, keyframes, timeline events and
//! timelines.
//!
//! Everything here is plain data. The scene drives it once per node per
//! frame, in a fixed order:
//!
//! 1. attached [`Timeline`]s
//! 2. the node's own keyframes
//! 3. due timeline events
//! 4. animators
//!
//! Items scheduled while a node is being advanced are queued and picked up
//! on the next frame.

mod animator;
mod keyframe;
mod timeline;
mod tween;
mod value;

pub use animator::{
    AnimateOptions, Animator, AnimatorSpec, AnimatorStep, Repeat, Variable, VariableCallback,
};
pub use keyframe::{KeyTime, Keyframe, KeyframeTrack, TrackOutput};
pub use timeline::{EventQueue, Timeline, TimelineAction, TimelineCallback, TimelineEvent};
pub use tween::Tween;
pub use value::AttrValue;

use std::mem;

/// Identifies an animator, timeline event, timeline or frame listener for
/// later removal. Unique within a scene.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct AnimationHandle(pub(crate) u64);

impl AnimationHandle {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

#[derive(Default)]
pub struct Animatable {
    pub(crate) animators: Vec<Animator>,
    pending_keyframes: Vec<Keyframe>,
    pub(crate) keyframes: KeyframeTrack,
    pending_events: Vec<TimelineEvent>,
    pub(crate) events: EventQueue,
    pub(crate) timelines: Vec<(AnimationHandle, Timeline)>,
    /// Running time used by `append_keyframe`
    pub(crate) last_action: f64,

    // Requests that arrive while the real state is out being advanced
    in_advance: bool,
    cancelled: Vec<AnimationHandle>,
    keyframes_cleared: bool,
}

impl Animatable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether there is nothing left to run.
    pub fn is_idle(&self) -> bool {
        self.animators.is_empty()
            && self.pending_keyframes.is_empty()
            && self.keyframes.is_empty()
            && self.pending_events.is_empty()
            && self.events.is_empty()
            && self.timelines.is_empty()
    }

    pub fn animator_count(&self) -> usize {
        self.animators.len()
    }

    pub fn animators(&self) -> &[Animator] {
        &self.animators
    }

    pub(crate) fn push_animator(&mut self, animator: Animator) {
        self.animators.push(animator);
    }

    pub(crate) fn push_keyframe(&mut self, keyframe: Keyframe) {
        self.pending_keyframes.push(keyframe);
    }

    pub(crate) fn push_event(&mut self, event: TimelineEvent) {
        self.pending_events.push(event);
    }

    pub(crate) fn push_timeline(&mut self, handle: AnimationHandle, timeline: Timeline) {
        self.timelines.push((handle, timeline));
    }

    /// Drop the animator, event or timeline behind `handle`.
    pub(crate) fn remove(&mut self, handle: AnimationHandle) -> bool {
        let before = self.animators.len() + self.pending_events.len() + self.timelines.len();
        self.animators.retain(|a| a.id != handle);
        self.pending_events.retain(|e| e.id != handle);
        self.timelines.retain(|(h, _)| *h != handle);
        let after = self.animators.len() + self.pending_events.len() + self.timelines.len();
        let removed = self.events.remove(handle) || before != after;

        if !removed && self.in_advance {
            self.cancelled.push(handle);
        }
        removed
    }

    pub(crate) fn clear_keyframes(&mut self) {
        self.pending_keyframes.clear();
        self.keyframes.clear();
        if self.in_advance {
            self.keyframes_cleared = true;
        }
    }

    /// Move queued keyframes and events into the active lists, resolving
    /// relative times against `now`.
    pub(crate) fn merge_pending(&mut self, now: f64) {
        if !self.pending_keyframes.is_empty() {
            self.keyframes.merge(self.pending_keyframes.drain(..), now);
        }
        if !self.pending_events.is_empty() {
            self.events.merge(self.pending_events.drain(..), now);
        }
    }

    /// Take the state out for a frame advance, leaving an empty state that
    /// queues anything scheduled in the meantime.
    pub(crate) fn begin_advance(&mut self) -> Animatable {
        let queue = Animatable {
            in_advance: true,
            last_action: self.last_action,
            ..Animatable::default()
        };
        mem::replace(self, queue)
    }

    /// Put advanced state back and fold in whatever was queued.
    pub(crate) fn end_advance(&mut self, state: Animatable) {
        let queued = mem::replace(self, state);
        self.last_action = queued.last_action;
        if queued.keyframes_cleared {
            self.clear_keyframes();
        }
        self.animators.extend(queued.animators);
        self.pending_keyframes.extend(queued.pending_keyframes);
        self.pending_events.extend(queued.pending_events);
        self.timelines.extend(queued.timelines);
        for handle in queued.cancelled {
            self.remove(handle);
        }
    }
}
