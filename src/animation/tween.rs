//! Tween functions (easing curves) for animators and keyframes.
//!
//! A tween maps normalized progress in `[0, 1]` to an interpolation weight.
//! Some curves overshoot outside that range ([`Tween::Sproing`]).
//!
//! Tweens can be picked by name, which is how keyframe descriptions
//! usually refer to them:
//!
//! ```ignore
//! let tween: Tween = "sine".parse()?;
//! scene.animate(node, Attr::X, 0.0, 100.0, 500.0, tween, AnimateOptions::default())?;
//! ```

use std::f64::consts::PI;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::SceneError;

/// pi + (pi - acos(0.9)): the curve peaks past 1 and settles back to it.
const SPROING_FREQUENCY: f64 = 3.59261946538606;
const SPROING_GAIN: f64 = 1.05263157894737;

#[derive(Clone, Default)]
pub enum Tween {
    /// Identity
    #[default]
    Linear,
    /// Holds the start value until progress reaches 1
    Set,
    /// Cosine ease in and out
    Sine,
    /// Overshoots past the end value, then settles
    Sproing,
    Square,
    Cube,
    Sqrt,
    CubeRoot,
    /// User-supplied curve
    Custom(Rc<dyn Fn(f64) -> f64>),
}

impl Tween {
    /// Evaluate the curve at progress `v`.
    pub fn evaluate(&self, v: f64) -> f64 {
        match self {
            Tween::Linear => v,
            Tween::Set => v.floor(),
            Tween::Sine => 0.5 - 0.5 * (v * PI).cos(),
            Tween::Sproing => (0.5 - 0.5 * (v * SPROING_FREQUENCY).cos()) * SPROING_GAIN,
            Tween::Square => v * v,
            Tween::Cube => v * v * v,
            Tween::Sqrt => v.sqrt(),
            Tween::CubeRoot => v.cbrt(),
            Tween::Custom(f) => f(v),
        }
    }

    /// Create a custom tween from a closure
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + 'static,
    {
        Tween::Custom(Rc::new(f))
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tween::Linear => write!(f, "Linear"),
            Tween::Set => write!(f, "Set"),
            Tween::Sine => write!(f, "Sine"),
            Tween::Sproing => write!(f, "Sproing"),
            Tween::Square => write!(f, "Square"),
            Tween::Cube => write!(f, "Cube"),
            Tween::Sqrt => write!(f, "Sqrt"),
            Tween::CubeRoot => write!(f, "CubeRoot"),
            Tween::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl FromStr for Tween {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Tween::Linear),
            "set" | "discrete" => Ok(Tween::Set),
            "sine" => Ok(Tween::Sine),
            "sproing" => Ok(Tween::Sproing),
            "square" => Ok(Tween::Square),
            "cube" => Ok(Tween::Cube),
            "sqrt" => Ok(Tween::Sqrt),
            "curt" | "cbrt" | "cube_root" => Ok(Tween::CubeRoot),
            other => Err(SceneError::UnknownTween(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_linear() {
        assert_eq!(Tween::Linear.evaluate(0.0), 0.0);
        assert_eq!(Tween::Linear.evaluate(0.5), 0.5);
        assert_eq!(Tween::Linear.evaluate(1.0), 1.0);
    }

    #[test]
    fn test_set_is_discrete() {
        assert_eq!(Tween::Set.evaluate(0.99), 0.0);
        assert_eq!(Tween::Set.evaluate(1.0), 1.0);
    }

    #[test]
    fn test_endpoints() {
        for tween in [
            Tween::Sine,
            Tween::Square,
            Tween::Cube,
            Tween::Sqrt,
            Tween::CubeRoot,
        ] {
            assert!(approx_eq(tween.evaluate(0.0), 0.0), "{tween:?}");
            assert!(approx_eq(tween.evaluate(1.0), 1.0), "{tween:?}");
        }
    }

    #[test]
    fn test_sine_midpoint() {
        assert!(approx_eq(Tween::Sine.evaluate(0.5), 0.5));
    }

    #[test]
    fn test_sproing_overshoots() {
        let peak = (0..=100)
            .map(|i| Tween::Sproing.evaluate(i as f64 / 100.0))
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0);
        assert!((Tween::Sproing.evaluate(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cube_root() {
        assert!(approx_eq(Tween::CubeRoot.evaluate(0.125), 0.5));
    }

    #[test]
    fn test_custom() {
        let t = Tween::custom(|v| 1.0 - v);
        assert_eq!(t.evaluate(0.25), 0.75);
    }

    #[test]
    fn test_parse_by_name() {
        assert!(matches!("sine".parse::<Tween>(), Ok(Tween::Sine)));
        assert!(matches!("discrete".parse::<Tween>(), Ok(Tween::Set)));
        assert!(matches!(
            "bounce".parse::<Tween>(),
            Err(SceneError::UnknownTween(name)) if name == "bounce"
        ));
    }
}
