use std::fmt;
use std::rc::Rc;

use crate::attrs::Attr;
use crate::error::Result;
use crate::scene::{NodeId, Scene};

use super::{AnimationHandle, AttrValue, Tween};

/// Setter called with each tweened value of a callback-driven animation.
pub type VariableCallback = Rc<dyn Fn(&mut Scene, NodeId, &AttrValue) -> Result<()>>;

/// What an animator writes to.
#[derive(Clone)]
pub enum Variable {
    Attr(Attr),
    Callback(VariableCallback),
}

impl Variable {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&mut Scene, NodeId, &AttrValue) -> Result<()> + 'static,
    {
        Variable::Callback(Rc::new(f))
    }
}

impl From<Attr> for Variable {
    fn from(attr: Attr) -> Self {
        Variable::Attr(attr)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Attr(attr) => write!(f, "Attr({attr})"),
            Variable::Callback(_) => write!(f, "Callback"),
        }
    }
}

/// How an animator behaves once it reaches the end of its duration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Repeat {
    /// Play once and stop at the end value
    #[default]
    None,
    /// Play this many passes in total
    Times(u32),
    Forever,
    /// Stop as soon as progress reaches this value, without wrapping
    Until(f64),
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimateOptions {
    pub repeat: Repeat,
    /// Offset start and end by the variable's value at registration time
    pub additive: bool,
    /// Shift start and end by the start→end delta on each repeat
    pub accumulate: bool,
}

impl AnimateOptions {
    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn additive(mut self, additive: bool) -> Self {
        self.additive = additive;
        self
    }

    pub fn accumulate(mut self, accumulate: bool) -> Self {
        self.accumulate = accumulate;
        self
    }
}

/// Everything needed to start an animator later, e.g. from a timeline event.
#[derive(Clone, Debug)]
pub struct AnimatorSpec {
    pub variable: Variable,
    pub start: AttrValue,
    pub end: AttrValue,
    pub duration: f64,
    pub tween: Tween,
    pub options: AnimateOptions,
}

impl AnimatorSpec {
    pub fn new(
        variable: impl Into<Variable>,
        start: impl Into<AttrValue>,
        end: impl Into<AttrValue>,
        duration: f64,
    ) -> Self {
        Self {
            variable: variable.into(),
            start: start.into(),
            end: end.into(),
            duration,
            tween: Tween::Linear,
            options: AnimateOptions::default(),
        }
    }

    pub fn tween(mut self, tween: Tween) -> Self {
        self.tween = tween;
        self
    }

    pub fn options(mut self, options: AnimateOptions) -> Self {
        self.options = options;
        self
    }
}

/// Result of advancing an animator to a frame time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimatorStep {
    pub pos: f64,
    pub finished: bool,
}

/// A running tween of one variable from `start` to `end`.
#[derive(Clone, Debug)]
pub struct Animator {
    pub(crate) id: AnimationHandle,
    pub variable: Variable,
    pub start: AttrValue,
    pub end: AttrValue,
    difference: AttrValue,
    pub duration: f64,
    pub tween: Tween,
    start_time: Option<f64>,
    repeat: Repeat,
    accumulate: bool,
}

impl Animator {
    pub(crate) fn new(
        id: AnimationHandle,
        variable: Variable,
        start: AttrValue,
        end: AttrValue,
        duration: f64,
        tween: Tween,
        options: &AnimateOptions,
    ) -> Self {
        let difference = end.sub(&start);
        Self {
            id,
            variable,
            start,
            end,
            difference,
            duration,
            tween,
            start_time: None,
            repeat: options.repeat,
            accumulate: options.accumulate,
        }
    }

    pub fn id(&self) -> AnimationHandle {
        self.id
    }

    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    /// Advance to frame time `t`. The first call anchors the start time.
    pub fn step(&mut self, t: f64) -> AnimatorStep {
        let start_time = *self.start_time.get_or_insert(t);
        if self.duration <= 0.0 {
            return AnimatorStep {
                pos: 1.0,
                finished: true,
            };
        }
        let raw = (t - start_time) / self.duration;

        match self.repeat {
            Repeat::Until(limit) if raw >= limit => AnimatorStep {
                pos: limit,
                finished: true,
            },
            Repeat::Until(_) => AnimatorStep {
                pos: raw,
                finished: false,
            },
            _ if raw < 1.0 => AnimatorStep {
                pos: raw,
                finished: false,
            },
            Repeat::None => AnimatorStep {
                pos: 1.0,
                finished: true,
            },
            Repeat::Times(n) if n <= 1 => AnimatorStep {
                pos: 1.0,
                finished: true,
            },
            Repeat::Times(n) => {
                self.repeat = Repeat::Times(n - 1);
                self.restart(t);
                AnimatorStep {
                    pos: raw % 1.0,
                    finished: false,
                }
            }
            Repeat::Forever => {
                self.restart(t);
                AnimatorStep {
                    pos: raw % 1.0,
                    finished: false,
                }
            }
        }
    }

    fn restart(&mut self, t: f64) {
        if self.accumulate {
            let next_end = self.end.add(&self.difference);
            self.start = std::mem::replace(&mut self.end, next_end);
        }
        self.start_time = Some(t);
    }

    /// The tweened value at progress `pos`.
    pub fn value_at(&self, pos: f64) -> AttrValue {
        AttrValue::interpolate(&self.start, &self.end, self.tween.evaluate(pos))
    }
}
