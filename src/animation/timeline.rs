use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::attrs::Attr;
use crate::error::Result;
use crate::event::Propagation;
use crate::scene::{NodeId, Scene};

use super::{
    AnimationHandle, AnimatorSpec, AttrValue, KeyTime, Keyframe, KeyframeTrack, TrackOutput, Tween,
};

/// Callback run by a timeline event with the frame time and delta.
/// Returning [`Propagation::Stop`] cancels any further repeats.
pub type TimelineCallback =
    Rc<RefCell<dyn FnMut(&mut Scene, NodeId, f64, f64) -> Result<Propagation>>>;

#[derive(Clone)]
pub enum TimelineAction {
    Callback(TimelineCallback),
    /// Start an animator on the node
    Animate(AnimatorSpec),
}

impl TimelineAction {
    pub fn callback<F>(f: F) -> Self
    where
        F: FnMut(&mut Scene, NodeId, f64, f64) -> Result<Propagation> + 'static,
    {
        TimelineAction::Callback(Rc::new(RefCell::new(f)))
    }
}

impl From<AnimatorSpec> for TimelineAction {
    fn from(spec: AnimatorSpec) -> Self {
        TimelineAction::Animate(spec)
    }
}

impl fmt::Debug for TimelineAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimelineAction::Callback(_) => write!(f, "Callback"),
            TimelineAction::Animate(spec) => f.debug_tuple("Animate").field(spec).finish(),
        }
    }
}

/// A scheduled action, optionally repeating.
#[derive(Clone, Debug)]
pub struct TimelineEvent {
    pub(crate) id: AnimationHandle,
    pub time: KeyTime,
    pub action: TimelineAction,
    pub repeat_every: Option<f64>,
    /// Repeats left after the next run. `None` repeats without limit.
    pub repeat_times: Option<u32>,
}

impl TimelineEvent {
    pub(crate) fn new(id: AnimationHandle, time: KeyTime, action: TimelineAction) -> Self {
        Self {
            id,
            time,
            action,
            repeat_every: None,
            repeat_times: None,
        }
    }

    pub fn id(&self) -> AnimationHandle {
        self.id
    }

    /// Absolute start time. Only meaningful once merged into the queue.
    pub fn start_time(&self) -> f64 {
        self.time.resolve(0.0)
    }

    /// Whether the event should run again after a run that returned
    /// `propagation`, updating its counters and start time if so.
    pub(crate) fn reschedule(&mut self, propagation: Propagation) -> bool {
        let every = match self.repeat_every {
            Some(every) if propagation == Propagation::Continue => every,
            _ => return false,
        };
        match self.repeat_times {
            Some(0) => return false,
            Some(n) => self.repeat_times = Some(n - 1),
            None => {}
        }
        self.time = KeyTime::At(self.start_time() + every);
        true
    }
}

/// Due-ordered queue of timeline events.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<TimelineEvent>,
}

impl EventQueue {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Resolve relative start times against `now` and merge. Stable.
    pub fn merge(&mut self, events: impl IntoIterator<Item = TimelineEvent>, now: f64) {
        let before = self.events.len();
        self.events.extend(events.into_iter().map(|mut ev| {
            ev.time = KeyTime::At(ev.time.resolve(now));
            ev
        }));
        if self.events.len() != before {
            self.events
                .sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));
        }
    }

    /// Remove and return the earliest event if it is due at `t`.
    pub fn pop_due(&mut self, t: f64) -> Option<TimelineEvent> {
        match self.events.first() {
            Some(ev) if ev.start_time() <= t => Some(self.events.remove(0)),
            _ => None,
        }
    }

    pub fn remove(&mut self, id: AnimationHandle) -> bool {
        let before = self.events.len();
        self.events.retain(|ev| ev.id != id);
        self.events.len() != before
    }
}

/// A reusable keyframe sequence with its own clock.
///
/// The clock starts on the first frame the timeline is evaluated in. With
/// `repeat` set it restarts whenever the sequence snaps to its last frame.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    track: KeyframeTrack,
    pending: Vec<Keyframe>,
    pub repeat: bool,
    start_time: Option<f64>,
    last_action: f64,
}

impl Timeline {
    pub fn new(repeat: bool) -> Self {
        Self {
            repeat,
            ..Self::default()
        }
    }

    /// Add a keyframe at `time` relative to the timeline start.
    pub fn add_keyframe(&mut self, time: f64, target: Vec<(Attr, AttrValue)>, tween: Tween) {
        self.pending.push(Keyframe {
            time: KeyTime::At(time),
            target,
            tween,
        });
    }

    /// Add a keyframe `delta` after the previously appended one.
    pub fn append_keyframe(&mut self, delta: f64, target: Vec<(Attr, AttrValue)>, tween: Tween) {
        self.last_action += delta;
        self.add_keyframe(self.last_action, target, tween);
    }

    pub fn keyframe(mut self, keyframe: Keyframe) -> Self {
        self.pending.push(keyframe);
        self
    }

    pub fn restart(&mut self) {
        self.start_time = None;
    }

    pub fn evaluate(&mut self, t: f64) -> TrackOutput {
        let start = *self.start_time.get_or_insert(t);
        if !self.pending.is_empty() {
            self.track.merge(self.pending.drain(..), 0.0);
        }
        let output = self.track.evaluate(t - start);
        if self.repeat && matches!(output, TrackOutput::Snapped(_)) {
            self.start_time = Some(t);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> TimelineAction {
        TimelineAction::callback(|_, _, _, _| Ok(Propagation::Continue))
    }

    #[test]
    fn test_queue_pops_in_time_order() {
        let mut queue = EventQueue::default();
        queue.merge(
            [
                TimelineEvent::new(AnimationHandle(1), KeyTime::At(30.0), noop()),
                TimelineEvent::new(AnimationHandle(2), KeyTime::After(2.0), noop()),
                TimelineEvent::new(AnimationHandle(3), KeyTime::At(15.0), noop()),
            ],
            10.0,
        );
        assert_eq!(queue.pop_due(14.0).map(|e| e.id), Some(AnimationHandle(2)));
        assert!(queue.pop_due(14.0).is_none());
        assert_eq!(queue.pop_due(40.0).map(|e| e.id), Some(AnimationHandle(3)));
        assert_eq!(queue.pop_due(40.0).map(|e| e.id), Some(AnimationHandle(1)));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_reschedule_counts_down() {
        let mut ev = TimelineEvent::new(AnimationHandle(1), KeyTime::At(0.0), noop());
        ev.repeat_every = Some(10.0);
        ev.repeat_times = Some(1);
        assert!(ev.reschedule(Propagation::Continue));
        assert_eq!(ev.start_time(), 10.0);
        assert!(!ev.reschedule(Propagation::Continue));
    }

    #[test]
    fn test_reschedule_stops_on_stop() {
        let mut ev = TimelineEvent::new(AnimationHandle(1), KeyTime::At(0.0), noop());
        ev.repeat_every = Some(10.0);
        assert!(!ev.reschedule(Propagation::Stop));
    }

    #[test]
    fn test_timeline_runs_on_own_clock() {
        let mut tl = Timeline::new(false);
        tl.add_keyframe(0.0, vec![(Attr::X, AttrValue::Number(0.0))], Tween::Linear);
        tl.append_keyframe(100.0, vec![(Attr::X, AttrValue::Number(10.0))], Tween::Linear);
        assert!(matches!(tl.evaluate(1000.0), TrackOutput::Interpolated(_)));
        assert_eq!(
            tl.evaluate(1050.0),
            TrackOutput::Interpolated(vec![(Attr::X, AttrValue::Number(5.0))])
        );
        assert!(matches!(tl.evaluate(1200.0), TrackOutput::Snapped(_)));
        assert_eq!(tl.evaluate(1300.0), TrackOutput::Idle);
    }

    #[test]
    fn test_repeating_timeline_restarts() {
        let mut tl = Timeline::new(true);
        tl.add_keyframe(0.0, vec![(Attr::X, AttrValue::Number(0.0))], Tween::Linear);
        tl.add_keyframe(100.0, vec![(Attr::X, AttrValue::Number(10.0))], Tween::Linear);
        tl.evaluate(0.0);
        assert!(matches!(tl.evaluate(100.0), TrackOutput::Snapped(_)));
        assert_eq!(
            tl.evaluate(125.0),
            TrackOutput::Interpolated(vec![(Attr::X, AttrValue::Number(2.5))])
        );
    }
}
