//! Node attributes: transform, paint state and interaction flags.
//!
//! [`NodeAttrs`] enumerates every attribute a node understands. Attributes
//! can be set directly, through the builder methods, or by name via
//! [`Attr`], which is what animators and keyframes use.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::affine::Affine;
use crate::animation::AttrValue;
use crate::color::Color;
use crate::error::{Result, SceneError};
use crate::event::CursorIcon;
use crate::paint::{
    CompositeOp, LineCap, LineJoin, Paint, PaintSetting, Shadow, TextAlign, TextBaseline,
};

/// Name of an animatable / mergeable node attribute.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Attr {
    X,
    Y,
    Rotation,
    /// Uniform scale, or `[sx, sy]`
    Scale,
    ScaleX,
    ScaleY,
    SkewX,
    SkewY,
    ZIndex,
    Opacity,
    FillOpacity,
    StrokeOpacity,
    StrokeWidth,
    MiterLimit,
    ShadowOffsetX,
    ShadowOffsetY,
    ShadowBlur,
    ShadowColor,
    Fill,
    Stroke,
    Visible,
    Display,
    Drawable,
    CatchMouse,
    Pickable,
    AbsoluteOpacity,
    /// Free-form value kept in [`NodeAttrs::custom`]
    Custom(String),
}

impl Attr {
    pub fn custom(name: impl Into<String>) -> Self {
        Attr::Custom(name.into())
    }

    /// Whether changing this attribute moves the node.
    pub fn affects_matrix(&self) -> bool {
        matches!(
            self,
            Attr::X
                | Attr::Y
                | Attr::Rotation
                | Attr::Scale
                | Attr::ScaleX
                | Attr::ScaleY
                | Attr::SkewX
                | Attr::SkewY
        )
    }

    fn name(&self) -> &str {
        match self {
            Attr::X => "x",
            Attr::Y => "y",
            Attr::Rotation => "rotation",
            Attr::Scale => "scale",
            Attr::ScaleX => "scale_x",
            Attr::ScaleY => "scale_y",
            Attr::SkewX => "skew_x",
            Attr::SkewY => "skew_y",
            Attr::ZIndex => "z_index",
            Attr::Opacity => "opacity",
            Attr::FillOpacity => "fill_opacity",
            Attr::StrokeOpacity => "stroke_opacity",
            Attr::StrokeWidth => "stroke_width",
            Attr::MiterLimit => "miter_limit",
            Attr::ShadowOffsetX => "shadow_offset_x",
            Attr::ShadowOffsetY => "shadow_offset_y",
            Attr::ShadowBlur => "shadow_blur",
            Attr::ShadowColor => "shadow_color",
            Attr::Fill => "fill",
            Attr::Stroke => "stroke",
            Attr::Visible => "visible",
            Attr::Display => "display",
            Attr::Drawable => "drawable",
            Attr::CatchMouse => "catch_mouse",
            Attr::Pickable => "pickable",
            Attr::AbsoluteOpacity => "absolute_opacity",
            Attr::Custom(name) => name,
        }
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attr {
    type Err = SceneError;

    /// Accepts snake_case names and their camelCase spellings.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let attr = match s {
            "x" => Attr::X,
            "y" => Attr::Y,
            "rotation" => Attr::Rotation,
            "scale" => Attr::Scale,
            "scale_x" | "scaleX" => Attr::ScaleX,
            "scale_y" | "scaleY" => Attr::ScaleY,
            "skew_x" | "skewX" => Attr::SkewX,
            "skew_y" | "skewY" => Attr::SkewY,
            "z_index" | "zIndex" => Attr::ZIndex,
            "opacity" => Attr::Opacity,
            "fill_opacity" | "fillOpacity" => Attr::FillOpacity,
            "stroke_opacity" | "strokeOpacity" => Attr::StrokeOpacity,
            "stroke_width" | "strokeWidth" => Attr::StrokeWidth,
            "miter_limit" | "miterLimit" => Attr::MiterLimit,
            "shadow_offset_x" | "shadowOffsetX" => Attr::ShadowOffsetX,
            "shadow_offset_y" | "shadowOffsetY" => Attr::ShadowOffsetY,
            "shadow_blur" | "shadowBlur" => Attr::ShadowBlur,
            "shadow_color" | "shadowColor" => Attr::ShadowColor,
            "fill" => Attr::Fill,
            "stroke" => Attr::Stroke,
            "visible" => Attr::Visible,
            "display" => Attr::Display,
            "drawable" => Attr::Drawable,
            "catch_mouse" | "catchMouse" => Attr::CatchMouse,
            "pickable" => Attr::Pickable,
            "absolute_opacity" | "absoluteOpacity" => Attr::AbsoluteOpacity,
            other => return Err(SceneError::UnknownAttribute(other.to_string())),
        };
        Ok(attr)
    }
}

/// One step of a node's explicit transform list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformOp {
    Translate(f64, f64),
    Rotate(f64),
    Scale(f64, f64),
    SkewX(f64),
    SkewY(f64),
    Matrix(Affine),
}

impl TransformOp {
    pub fn apply(&self, m: &mut Affine) {
        match *self {
            TransformOp::Translate(x, y) => {
                m.translate(x, y);
            }
            TransformOp::Rotate(angle) => {
                m.rotate(angle, None);
            }
            TransformOp::Scale(sx, sy) => {
                m.scale(sx, sy);
            }
            TransformOp::SkewX(angle) => {
                m.skew_x(angle);
            }
            TransformOp::SkewY(angle) => {
                m.skew_y(angle);
            }
            TransformOp::Matrix(other) => {
                if !other.is_identity() {
                    m.compose(&other);
                }
            }
        }
    }
}

/// Every attribute a scene node carries.
///
/// Optional paint fields are only pushed to the surface when set, so an
/// unset field inherits whatever the ancestors left there.
#[derive(Clone, Debug)]
pub struct NodeAttrs {
    /// Lookup id, see `Scene::get_element_by_id`
    pub id: Option<String>,

    // Transform
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub rotation: f64,
    pub rotation_center: Option<(f64, f64)>,
    pub skew_x: f64,
    pub skew_y: f64,
    /// Replaces the parent matrix instead of composing with it
    pub absolute_matrix: Option<Affine>,
    pub matrix: Option<Affine>,
    pub transform_list: Vec<TransformOp>,

    // Visibility and interaction
    pub z_index: i32,
    pub visible: bool,
    /// Overrides `visible` when set
    pub display: Option<bool>,
    pub drawable: bool,
    pub catch_mouse: bool,
    pub pickable: bool,
    pub cursor: Option<CursorIcon>,

    // Paint state
    pub fill: PaintSetting,
    pub stroke: PaintSetting,
    pub stroke_width: Option<f64>,
    pub line_cap: Option<LineCap>,
    pub line_join: Option<LineJoin>,
    pub miter_limit: Option<f64>,
    pub composite_op: Option<CompositeOp>,
    pub opacity: Option<f64>,
    /// Replace the inherited alpha instead of multiplying it
    pub absolute_opacity: bool,
    pub fill_opacity: Option<f64>,
    pub stroke_opacity: Option<f64>,
    pub shadow: Option<Shadow>,
    pub font: Option<String>,
    pub text_align: Option<TextAlign>,
    pub text_baseline: Option<TextBaseline>,

    pub custom: HashMap<String, AttrValue>,
}

impl Default for NodeAttrs {
    fn default() -> Self {
        Self {
            id: None,
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            rotation_center: None,
            skew_x: 0.0,
            skew_y: 0.0,
            absolute_matrix: None,
            matrix: None,
            transform_list: Vec::new(),
            z_index: 0,
            visible: true,
            display: None,
            drawable: true,
            catch_mouse: true,
            pickable: true,
            cursor: None,
            fill: PaintSetting::Inherit,
            stroke: PaintSetting::Inherit,
            stroke_width: None,
            line_cap: None,
            line_join: None,
            miter_limit: None,
            composite_op: None,
            opacity: None,
            absolute_opacity: false,
            fill_opacity: None,
            stroke_opacity: None,
            shadow: None,
            font: None,
            text_align: None,
            text_baseline: None,
            custom: HashMap::new(),
        }
    }
}

fn number(attr: &Attr, value: &AttrValue) -> Result<f64> {
    value
        .as_number()
        .ok_or_else(|| SceneError::invalid_value(attr.to_string(), expected("number", value)))
}

fn flag(attr: &Attr, value: &AttrValue) -> Result<bool> {
    value
        .as_flag()
        .ok_or_else(|| SceneError::invalid_value(attr.to_string(), expected("flag", value)))
}

fn color(attr: &Attr, value: &AttrValue) -> Result<Color> {
    value
        .as_vector()
        .and_then(Color::from_components)
        .ok_or_else(|| SceneError::invalid_value(attr.to_string(), expected("color", value)))
}

fn expected(kind: &str, got: &AttrValue) -> String {
    format!("expected {kind}, got {}", got.kind_name())
}

fn paint_value(setting: &PaintSetting) -> Option<AttrValue> {
    match setting {
        PaintSetting::Inherit => None,
        PaintSetting::On => Some(AttrValue::Flag(true)),
        PaintSetting::Off => Some(AttrValue::Flag(false)),
        PaintSetting::Paint(Paint::Color(c)) => Some(AttrValue::from(*c)),
        PaintSetting::Paint(Paint::Style(_)) => None,
    }
}

impl NodeAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes for grouping nodes: they never claim the pick target
    /// themselves.
    pub fn group() -> Self {
        Self {
            pickable: false,
            ..Self::default()
        }
    }

    /// Whether the node is shown this frame, honouring `display`.
    pub fn effective_visible(&self) -> bool {
        self.display.unwrap_or(self.visible)
    }

    /// Compose this node's transform onto `parent`.
    ///
    /// Order: absolute matrix (replacing `parent`), translate, rotate,
    /// skew-x, skew-y, scale, explicit matrix, transform list.
    pub fn compose_matrix(&self, parent: &Affine) -> Affine {
        let mut m = self.absolute_matrix.unwrap_or(*parent);
        m.translate(self.x, self.y)
            .rotate(self.rotation, self.rotation_center)
            .skew_x(self.skew_x)
            .skew_y(self.skew_y)
            .scale(self.scale_x, self.scale_y);
        if let Some(matrix) = &self.matrix {
            if !matrix.is_identity() {
                m.compose(matrix);
            }
        }
        for op in &self.transform_list {
            op.apply(&mut m);
        }
        m
    }

    /// Read an attribute by name. Unset optional attributes read as `None`.
    pub fn get(&self, attr: &Attr) -> Option<AttrValue> {
        let value = match attr {
            Attr::X => AttrValue::Number(self.x),
            Attr::Y => AttrValue::Number(self.y),
            Attr::Rotation => AttrValue::Number(self.rotation),
            Attr::Scale => {
                if self.scale_x == self.scale_y {
                    AttrValue::Number(self.scale_x)
                } else {
                    AttrValue::Vector(vec![self.scale_x, self.scale_y])
                }
            }
            Attr::ScaleX => AttrValue::Number(self.scale_x),
            Attr::ScaleY => AttrValue::Number(self.scale_y),
            Attr::SkewX => AttrValue::Number(self.skew_x),
            Attr::SkewY => AttrValue::Number(self.skew_y),
            Attr::ZIndex => AttrValue::Number(self.z_index as f64),
            Attr::Opacity => AttrValue::Number(self.opacity.unwrap_or(1.0)),
            Attr::FillOpacity => AttrValue::Number(self.fill_opacity?),
            Attr::StrokeOpacity => AttrValue::Number(self.stroke_opacity?),
            Attr::StrokeWidth => AttrValue::Number(self.stroke_width?),
            Attr::MiterLimit => AttrValue::Number(self.miter_limit?),
            Attr::ShadowOffsetX => AttrValue::Number(self.shadow?.offset_x),
            Attr::ShadowOffsetY => AttrValue::Number(self.shadow?.offset_y),
            Attr::ShadowBlur => AttrValue::Number(self.shadow?.blur),
            Attr::ShadowColor => AttrValue::from(self.shadow?.color),
            Attr::Fill => return paint_value(&self.fill),
            Attr::Stroke => return paint_value(&self.stroke),
            Attr::Visible => AttrValue::Flag(self.visible),
            Attr::Display => AttrValue::Flag(self.effective_visible()),
            Attr::Drawable => AttrValue::Flag(self.drawable),
            Attr::CatchMouse => AttrValue::Flag(self.catch_mouse),
            Attr::Pickable => AttrValue::Flag(self.pickable),
            Attr::AbsoluteOpacity => AttrValue::Flag(self.absolute_opacity),
            Attr::Custom(name) => return self.custom.get(name).cloned(),
        };
        Some(value)
    }

    /// Assign an attribute by name, checking the value kind.
    pub fn set(&mut self, attr: &Attr, value: AttrValue) -> Result<()> {
        match attr {
            Attr::X => self.x = number(attr, &value)?,
            Attr::Y => self.y = number(attr, &value)?,
            Attr::Rotation => match &value {
                AttrValue::Vector(v) if v.len() == 3 => {
                    self.rotation = v[0];
                    self.rotation_center = Some((v[1], v[2]));
                }
                _ => self.rotation = number(attr, &value)?,
            },
            Attr::Scale => match &value {
                AttrValue::Number(s) => {
                    self.scale_x = *s;
                    self.scale_y = *s;
                }
                AttrValue::Vector(v) if v.len() == 2 => {
                    self.scale_x = v[0];
                    self.scale_y = v[1];
                }
                _ => {
                    return Err(SceneError::invalid_value(
                        attr.to_string(),
                        expected("number or [sx, sy]", &value),
                    ))
                }
            },
            Attr::ScaleX => self.scale_x = number(attr, &value)?,
            Attr::ScaleY => self.scale_y = number(attr, &value)?,
            Attr::SkewX => self.skew_x = number(attr, &value)?,
            Attr::SkewY => self.skew_y = number(attr, &value)?,
            Attr::ZIndex => self.z_index = number(attr, &value)?.round() as i32,
            Attr::Opacity => self.opacity = Some(number(attr, &value)?),
            Attr::FillOpacity => self.fill_opacity = Some(number(attr, &value)?),
            Attr::StrokeOpacity => self.stroke_opacity = Some(number(attr, &value)?),
            Attr::StrokeWidth => self.stroke_width = Some(number(attr, &value)?),
            Attr::MiterLimit => self.miter_limit = Some(number(attr, &value)?),
            Attr::ShadowOffsetX => {
                let v = number(attr, &value)?;
                self.shadow.get_or_insert_with(Shadow::default).offset_x = v;
            }
            Attr::ShadowOffsetY => {
                let v = number(attr, &value)?;
                self.shadow.get_or_insert_with(Shadow::default).offset_y = v;
            }
            Attr::ShadowBlur => {
                let v = number(attr, &value)?;
                self.shadow.get_or_insert_with(Shadow::default).blur = v;
            }
            Attr::ShadowColor => {
                let v = color(attr, &value)?;
                self.shadow.get_or_insert_with(Shadow::default).color = v;
            }
            Attr::Fill | Attr::Stroke => {
                let setting = match &value {
                    AttrValue::Flag(on) => PaintSetting::from(*on),
                    _ => PaintSetting::from(color(attr, &value)?),
                };
                if *attr == Attr::Fill {
                    self.fill = setting;
                } else {
                    self.stroke = setting;
                }
            }
            Attr::Visible => self.visible = flag(attr, &value)?,
            Attr::Display => self.display = Some(flag(attr, &value)?),
            Attr::Drawable => self.drawable = flag(attr, &value)?,
            Attr::CatchMouse => self.catch_mouse = flag(attr, &value)?,
            Attr::Pickable => self.pickable = flag(attr, &value)?,
            Attr::AbsoluteOpacity => self.absolute_opacity = flag(attr, &value)?,
            Attr::Custom(name) => {
                self.custom.insert(name.clone(), value);
            }
        }
        Ok(())
    }

    /// Assign attributes given by name. Stops at the first unknown name or
    /// mistyped value.
    pub fn merge<'a, I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, AttrValue)>,
    {
        for (name, value) in values {
            let attr: Attr = name.parse()?;
            self.set(&attr, value)?;
        }
        Ok(())
    }

    // Builder methods

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale_x = scale;
        self.scale_y = scale;
        self
    }

    pub fn scale_xy(mut self, sx: f64, sy: f64) -> Self {
        self.scale_x = sx;
        self.scale_y = sy;
        self
    }

    pub fn rotation(mut self, angle: f64) -> Self {
        self.rotation = angle;
        self
    }

    pub fn rotation_about(mut self, angle: f64, cx: f64, cy: f64) -> Self {
        self.rotation = angle;
        self.rotation_center = Some((cx, cy));
        self
    }

    pub fn skew(mut self, skew_x: f64, skew_y: f64) -> Self {
        self.skew_x = skew_x;
        self.skew_y = skew_y;
        self
    }

    pub fn absolute_matrix(mut self, m: Affine) -> Self {
        self.absolute_matrix = Some(m);
        self
    }

    pub fn matrix(mut self, m: Affine) -> Self {
        self.matrix = Some(m);
        self
    }

    pub fn transform(mut self, op: TransformOp) -> Self {
        self.transform_list.push(op);
        self
    }

    pub fn z_index(mut self, z: i32) -> Self {
        self.z_index = z;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn display(mut self, display: bool) -> Self {
        self.display = Some(display);
        self
    }

    pub fn drawable(mut self, drawable: bool) -> Self {
        self.drawable = drawable;
        self
    }

    pub fn catch_mouse(mut self, catch_mouse: bool) -> Self {
        self.catch_mouse = catch_mouse;
        self
    }

    pub fn pickable(mut self, pickable: bool) -> Self {
        self.pickable = pickable;
        self
    }

    pub fn cursor(mut self, cursor: CursorIcon) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn fill(mut self, fill: impl Into<PaintSetting>) -> Self {
        self.fill = fill.into();
        self
    }

    pub fn stroke(mut self, stroke: impl Into<PaintSetting>) -> Self {
        self.stroke = stroke.into();
        self
    }

    pub fn stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = Some(width);
        self
    }

    pub fn line_cap(mut self, cap: LineCap) -> Self {
        self.line_cap = Some(cap);
        self
    }

    pub fn line_join(mut self, join: LineJoin) -> Self {
        self.line_join = Some(join);
        self
    }

    pub fn miter_limit(mut self, limit: f64) -> Self {
        self.miter_limit = Some(limit);
        self
    }

    pub fn composite_op(mut self, op: CompositeOp) -> Self {
        self.composite_op = Some(op);
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn absolute_opacity(mut self, absolute: bool) -> Self {
        self.absolute_opacity = absolute;
        self
    }

    pub fn fill_opacity(mut self, opacity: f64) -> Self {
        self.fill_opacity = Some(opacity);
        self
    }

    pub fn stroke_opacity(mut self, opacity: f64) -> Self {
        self.stroke_opacity = Some(opacity);
        self
    }

    pub fn shadow(mut self, shadow: Shadow) -> Self {
        self.shadow = Some(shadow);
        self
    }

    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn text_align(mut self, align: TextAlign) -> Self {
        self.text_align = Some(align);
        self
    }

    pub fn text_baseline(mut self, baseline: TextBaseline) -> Self {
        self.text_baseline = Some(baseline);
        self
    }
}
