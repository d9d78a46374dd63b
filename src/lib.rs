//! Retained-mode 2D scenegraph over immediate-mode drawing surfaces.
//!
//! A [`scene::Scene`] holds a tree of nodes with transforms, paint state,
//! animations and event listeners. Each frame the [`canvas::Canvas`] runs
//! three passes over the tree: update, pick, then draw into a
//! [`surface::Surface`].
//!
//! ```ignore
//! use layercake::prelude::*;
//!
//! let mut canvas = Canvas::new(RecordingSurface::new(), CanvasConfig::new().size(200.0, 100.0));
//! let root = canvas.root();
//! let scene = canvas.scene_mut();
//! let rect = scene.add_shape(NodeAttrs::new().fill(Color::RED), Rectangle::new(40.0, 20.0));
//! scene.append(root, rect)?;
//! scene.animate_to(rect, Attr::X, 100.0, 1000.0, Tween::Sine)?;
//! canvas.run_frames(60)?;
//! ```

pub mod affine;
pub mod animation;
pub mod attrs;
pub mod canvas;
pub mod color;
pub mod drawable;
pub mod error;
pub mod event;
pub mod geometry;
pub mod paint;
pub mod scene;
pub mod shapes;
pub mod surface;

pub mod prelude {
    pub use crate::affine::Affine;
    pub use crate::animation::{
        AnimateOptions, AnimationHandle, AnimatorSpec, AttrValue, Repeat, Timeline,
        TimelineAction, Tween,
    };
    pub use crate::attrs::{Attr, NodeAttrs, TransformOp};
    pub use crate::canvas::{Canvas, CanvasConfig, Clock, HostEvent, ManualClock, SystemClock};
    pub use crate::color::Color;
    pub use crate::drawable::{ClipPath, Drawable, MarkerSpec, StrokeMode};
    pub use crate::error::{Result, SceneError};
    pub use crate::event::{
        CursorIcon, Event, EventType, Key, Modifiers, MouseButton, Phase, Propagation,
    };
    pub use crate::geometry::{BoundingBox, Geometry};
    pub use crate::paint::{Gradient, LineCap, LineJoin, Paint, PaintSetting, StyleUnits};
    pub use crate::scene::{NodeId, Scene};
    pub use crate::shapes::{Circle, Polyline, Rectangle};
    pub use crate::surface::{DrawContext, RecordingSurface, Surface, SurfaceCall};
}
