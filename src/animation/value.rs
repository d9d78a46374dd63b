use crate::color::Color;

/// A value an attribute can hold and an animation can tween.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Number(f64),
    /// Component-wise value (points, colors as `[r, g, b, a]`)
    Vector(Vec<f64>),
    /// Switches discretely, never interpolated
    Flag(bool),
}

impl AttrValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            AttrValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            AttrValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            AttrValue::Number(_) => "number",
            AttrValue::Vector(_) => "vector",
            AttrValue::Flag(_) => "flag",
        }
    }

    /// `start + weight * (end - start)`, component-wise for vectors.
    ///
    /// Flags and mismatched kinds jump to `end` once `weight` reaches 1.
    pub fn interpolate(start: &AttrValue, end: &AttrValue, weight: f64) -> AttrValue {
        match (start, end) {
            (AttrValue::Number(a), AttrValue::Number(b)) => AttrValue::Number(a + weight * (b - a)),
            (AttrValue::Vector(a), AttrValue::Vector(b)) => AttrValue::Vector(
                a.iter()
                    .zip(b.iter())
                    .map(|(a, b)| a + weight * (b - a))
                    .collect(),
            ),
            _ => {
                if weight >= 1.0 {
                    end.clone()
                } else {
                    start.clone()
                }
            }
        }
    }

    /// Component-wise sum. Flags and mismatched kinds keep `self`.
    pub fn add(&self, other: &AttrValue) -> AttrValue {
        self.zip_with(other, |a, b| a + b)
    }

    /// Component-wise difference. Flags and mismatched kinds keep `self`.
    pub fn sub(&self, other: &AttrValue) -> AttrValue {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn scaled(&self, factor: f64) -> AttrValue {
        match self {
            AttrValue::Number(n) => AttrValue::Number(n * factor),
            AttrValue::Vector(v) => AttrValue::Vector(v.iter().map(|c| c * factor).collect()),
            AttrValue::Flag(b) => AttrValue::Flag(*b),
        }
    }

    fn zip_with(&self, other: &AttrValue, op: impl Fn(f64, f64) -> f64) -> AttrValue {
        match (self, other) {
            (AttrValue::Number(a), AttrValue::Number(b)) => AttrValue::Number(op(*a, *b)),
            (AttrValue::Vector(a), AttrValue::Vector(b)) => {
                AttrValue::Vector(a.iter().zip(b.iter()).map(|(a, b)| op(*a, *b)).collect())
            }
            _ => self.clone(),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Number(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Number(v as f64)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Flag(v)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        AttrValue::Vector(v)
    }
}

impl<const N: usize> From<[f64; N]> for AttrValue {
    fn from(v: [f64; N]) -> Self {
        AttrValue::Vector(v.to_vec())
    }
}

impl From<Color> for AttrValue {
    fn from(c: Color) -> Self {
        AttrValue::Vector(c.to_array().to_vec())
    }
}
