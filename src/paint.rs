//! Paint state carried by nodes and pushed onto the drawing surface.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::affine::Affine;
use crate::color::Color;
use crate::error::{Result, SceneError};
use crate::surface::Surface;

/// Line cap style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Line join style
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Start,
    End,
    Left,
    Right,
    Center,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextBaseline {
    Top,
    Hanging,
    Middle,
    #[default]
    Alphabetic,
    Ideographic,
    Bottom,
}

/// Porter-Duff compositing modes understood by canvas-like surfaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompositeOp {
    #[default]
    SourceOver,
    SourceAtop,
    SourceIn,
    SourceOut,
    DestinationOver,
    DestinationAtop,
    DestinationIn,
    DestinationOut,
    Lighter,
    Copy,
    Xor,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Shadow {
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    pub color: Color,
}

/// Coordinate space a paint style or clip path is expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StyleUnits {
    /// The node's own local space
    #[default]
    UserSpace,
    /// `[0, 1]` maps onto the node's bounding box
    ObjectBoundingBox,
}

/// Opaque handle to a style the surface compiled (gradient, pattern).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StyleHandle(pub u64);

/// A fill or stroke style in the form the surface consumes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NativeStyle {
    Color(Color),
    Compiled(StyleHandle),
}

/// A gradient, pattern or other style object that the surface has to
/// compile before use.
pub trait PaintStyle: fmt::Debug {
    fn compile(&self, surface: &mut dyn Surface) -> Result<StyleHandle>;

    /// Transform of the style itself, applied on top of the node's.
    fn transform(&self) -> Option<Affine> {
        None
    }

    fn units(&self) -> StyleUnits {
        StyleUnits::UserSpace
    }
}

#[derive(Clone, Debug)]
pub enum Paint {
    Color(Color),
    Style(Rc<dyn PaintStyle>),
}

impl Paint {
    pub fn compile(&self, surface: &mut dyn Surface) -> Result<NativeStyle> {
        match self {
            Paint::Color(c) => Ok(NativeStyle::Color(*c)),
            Paint::Style(style) => style.compile(surface).map(NativeStyle::Compiled),
        }
    }

    pub fn transform(&self) -> Option<Affine> {
        match self {
            Paint::Color(_) => None,
            Paint::Style(style) => style.transform(),
        }
    }

    pub fn units(&self) -> StyleUnits {
        match self {
            Paint::Color(_) => StyleUnits::UserSpace,
            Paint::Style(style) => style.units(),
        }
    }

    /// Whether filling or stroking with this paint needs its own transform.
    pub fn is_transformed(&self) -> bool {
        self.transform().is_some() || self.units() == StyleUnits::ObjectBoundingBox
    }
}

impl PartialEq for Paint {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Paint::Color(a), Paint::Color(b)) => a == b,
            (Paint::Style(a), Paint::Style(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Fill or stroke setting on a node.
///
/// `Inherit` leaves whatever the ancestors put on the surface in place;
/// `On`/`Off` toggle without touching the style.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PaintSetting {
    #[default]
    Inherit,
    On,
    Off,
    Paint(Paint),
}

impl From<Color> for PaintSetting {
    fn from(c: Color) -> Self {
        PaintSetting::Paint(Paint::Color(c))
    }
}

impl From<bool> for PaintSetting {
    fn from(on: bool) -> Self {
        if on {
            PaintSetting::On
        } else {
            PaintSetting::Off
        }
    }
}

impl From<Rc<dyn PaintStyle>> for PaintSetting {
    fn from(style: Rc<dyn PaintStyle>) -> Self {
        PaintSetting::Paint(Paint::Style(style))
    }
}

impl FromStr for PaintSetting {
    type Err = SceneError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(PaintSetting::Off),
            "" => Ok(PaintSetting::Inherit),
            other => other
                .parse::<Color>()
                .map(PaintSetting::from)
                .map_err(|_| SceneError::InvalidPaintStyle(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Color,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientKind {
    Linear {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Radial {
        x1: f64,
        y1: f64,
        r1: f64,
        x2: f64,
        y2: f64,
        r2: f64,
    },
}

/// Linear or radial gradient compiled by the surface.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    pub stops: Vec<ColorStop>,
    pub units: StyleUnits,
    pub transform: Option<Affine>,
}

impl Gradient {
    pub fn linear(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            kind: GradientKind::Linear { x1, y1, x2, y2 },
            stops: Vec::new(),
            units: StyleUnits::UserSpace,
            transform: None,
        }
    }

    pub fn radial(x1: f64, y1: f64, r1: f64, x2: f64, y2: f64, r2: f64) -> Self {
        Self {
            kind: GradientKind::Radial {
                x1,
                y1,
                r1,
                x2,
                y2,
                r2,
            },
            stops: Vec::new(),
            units: StyleUnits::UserSpace,
            transform: None,
        }
    }

    pub fn stop(mut self, offset: f64, color: Color) -> Self {
        self.stops.push(ColorStop {
            offset: offset.clamp(0.0, 1.0),
            color,
        });
        self
    }

    pub fn with_units(mut self, units: StyleUnits) -> Self {
        self.units = units;
        self
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn into_setting(self) -> PaintSetting {
        PaintSetting::Paint(Paint::Style(Rc::new(self)))
    }
}

impl PaintStyle for Gradient {
    fn compile(&self, surface: &mut dyn Surface) -> Result<StyleHandle> {
        if self.stops.is_empty() {
            return Err(SceneError::InvalidPaintStyle(
                "gradient has no color stops".to_string(),
            ));
        }
        surface.create_gradient(self)
    }

    fn transform(&self) -> Option<Affine> {
        self.transform
    }

    fn units(&self) -> StyleUnits {
        self.units
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    #[test]
    fn test_setting_from_str() {
        assert_eq!("none".parse::<PaintSetting>().unwrap(), PaintSetting::Off);
        assert_eq!(
            "#ff0000".parse::<PaintSetting>().unwrap(),
            PaintSetting::from(Color::RED)
        );
        assert!(matches!(
            "not-a-color".parse::<PaintSetting>(),
            Err(SceneError::InvalidPaintStyle(_))
        ));
    }

    #[test]
    fn test_color_compiles_to_itself() {
        let mut surface = RecordingSurface::new();
        let native = Paint::Color(Color::BLUE).compile(&mut surface).unwrap();
        assert_eq!(native, NativeStyle::Color(Color::BLUE));
        assert!(!Paint::Color(Color::BLUE).is_transformed());
    }

    #[test]
    fn test_gradient_compiles_through_surface() {
        let mut surface = RecordingSurface::new();
        let gradient = Gradient::linear(0.0, 0.0, 1.0, 0.0)
            .stop(0.0, Color::BLACK)
            .stop(1.0, Color::WHITE)
            .with_units(StyleUnits::ObjectBoundingBox);
        let handle = gradient.compile(&mut surface).unwrap();
        assert_eq!(surface.gradients().len(), 1);
        assert_eq!(surface.gradients()[0].0, handle);
        assert!(Paint::Style(Rc::new(gradient)).is_transformed());
    }

    #[test]
    fn test_empty_gradient_is_rejected() {
        let mut surface = RecordingSurface::new();
        let gradient = Gradient::linear(0.0, 0.0, 1.0, 0.0);
        assert!(matches!(
            gradient.compile(&mut surface),
            Err(SceneError::InvalidPaintStyle(_))
        ));
    }
}
