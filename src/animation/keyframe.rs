use crate::attrs::Attr;

use super::{AttrValue, Tween};

/// When a keyframe or timeline event happens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyTime {
    /// Absolute frame time
    At(f64),
    /// Offset from the frame time at which it gets merged
    After(f64),
}

impl KeyTime {
    pub fn resolve(self, now: f64) -> f64 {
        match self {
            KeyTime::At(t) => t,
            KeyTime::After(d) => now + d,
        }
    }
}

/// A snapshot of attribute values at a point in time.
#[derive(Clone, Debug)]
pub struct Keyframe {
    pub time: KeyTime,
    pub target: Vec<(Attr, AttrValue)>,
    /// Curve used when interpolating *towards* this keyframe
    pub tween: Tween,
}

impl Keyframe {
    pub fn at(time: f64) -> Self {
        Self {
            time: KeyTime::At(time),
            target: Vec::new(),
            tween: Tween::Linear,
        }
    }

    pub fn after(delay: f64) -> Self {
        Self {
            time: KeyTime::After(delay),
            target: Vec::new(),
            tween: Tween::Linear,
        }
    }

    pub fn set(mut self, attr: Attr, value: impl Into<AttrValue>) -> Self {
        let value = value.into();
        match self.target.iter_mut().find(|(a, _)| *a == attr) {
            Some(slot) => slot.1 = value,
            None => self.target.push((attr, value)),
        }
        self
    }

    pub fn tween(mut self, tween: Tween) -> Self {
        self.tween = tween;
        self
    }

    fn value(&self, attr: &Attr) -> Option<&AttrValue> {
        self.target.iter().find(|(a, _)| a == attr).map(|(_, v)| v)
    }
}

/// Attribute assignments produced by evaluating a track.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackOutput {
    /// Before the second keyframe, or already snapped to the end
    Idle,
    Interpolated(Vec<(Attr, AttrValue)>),
    /// Time passed the last keyframe; its target is assigned once
    Snapped(Vec<(Attr, AttrValue)>),
}

impl TrackOutput {
    pub fn assignments(&self) -> &[(Attr, AttrValue)] {
        match self {
            TrackOutput::Idle => &[],
            TrackOutput::Interpolated(a) | TrackOutput::Snapped(a) => a,
        }
    }
}

/// Time-ordered keyframes with resolved absolute times.
#[derive(Clone, Debug, Default)]
pub struct KeyframeTrack {
    frames: Vec<(f64, Keyframe)>,
    at_end: bool,
}

impl KeyframeTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.at_end = false;
    }

    /// Insert keyframes, resolving relative times against `now`.
    ///
    /// The sort is stable so keyframes sharing a time keep insertion order.
    pub fn merge(&mut self, keyframes: impl IntoIterator<Item = Keyframe>, now: f64) {
        let before = self.frames.len();
        self.frames
            .extend(keyframes.into_iter().map(|kf| (kf.time.resolve(now), kf)));
        if self.frames.len() != before {
            self.frames.sort_by(|a, b| a.0.total_cmp(&b.0));
            self.at_end = false;
        }
    }

    /// Evaluate the track at time `t`.
    pub fn evaluate(&mut self, t: f64) -> TrackOutput {
        if self.frames.is_empty() {
            return TrackOutput::Idle;
        }
        let current = self.frames.iter().position(|(time, _)| *time > t);

        match current {
            None => {
                if self.at_end {
                    return TrackOutput::Idle;
                }
                self.at_end = true;
                let last = &self.frames[self.frames.len() - 1].1;
                TrackOutput::Snapped(last.target.clone())
            }
            Some(0) => TrackOutput::Idle,
            Some(index) => {
                self.at_end = false;
                let (prev_time, prev) = &self.frames[index - 1];
                let (cur_time, cur) = &self.frames[index];
                let pos = (t - prev_time) / (cur_time - prev_time);
                let weight = cur.tween.evaluate(pos);
                let values = cur
                    .target
                    .iter()
                    .filter_map(|(attr, end)| {
                        prev.value(attr).map(|start| {
                            (attr.clone(), AttrValue::interpolate(start, end, weight))
                        })
                    })
                    .collect();
                TrackOutput::Interpolated(values)
            }
        }
    }
}
