//! Scene events and the host input vocabulary they are built from.
//!
//! An [`Event`] is dispatched along the path from the scene root to its
//! target: capture listeners run root-first, then bubble listeners run
//! target-first. A listener returning [`Propagation::Stop`] ends the whole
//! dispatch.

use std::fmt;

use bitflags::bitflags;

use crate::scene::NodeId;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    MouseDown,
    MouseUp,
    MouseMove,
    MouseOver,
    MouseOut,
    Click,
    DblClick,
    Wheel,
    DragStart,
    Drag,
    DragEnd,
    KeyDown,
    KeyUp,
    KeyPress,
    TextInput,
    Focus,
    Blur,
    /// Sent to a node right before its root changes
    RootChanged,
    Custom(String),
}

impl EventType {
    pub fn custom(name: impl Into<String>) -> Self {
        EventType::Custom(name.into())
    }

    /// Keyboard-class events target the focused node by default.
    pub fn is_keyboard(&self) -> bool {
        matches!(
            self,
            EventType::KeyDown | EventType::KeyUp | EventType::KeyPress | EventType::TextInput
        )
    }

    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            EventType::MouseDown
                | EventType::MouseUp
                | EventType::MouseMove
                | EventType::MouseOver
                | EventType::MouseOut
                | EventType::Click
                | EventType::DblClick
                | EventType::Wheel
                | EventType::DragStart
                | EventType::Drag
                | EventType::DragEnd
        )
    }

    fn name(&self) -> &str {
        match self {
            EventType::MouseDown => "mousedown",
            EventType::MouseUp => "mouseup",
            EventType::MouseMove => "mousemove",
            EventType::MouseOver => "mouseover",
            EventType::MouseOut => "mouseout",
            EventType::Click => "click",
            EventType::DblClick => "dblclick",
            EventType::Wheel => "wheel",
            EventType::DragStart => "dragstart",
            EventType::Drag => "drag",
            EventType::DragEnd => "dragend",
            EventType::KeyDown => "keydown",
            EventType::KeyUp => "keyup",
            EventType::KeyPress => "keypress",
            EventType::TextInput => "textinput",
            EventType::Focus => "focus",
            EventType::Blur => "blur",
            EventType::RootChanged => "rootchanged",
            EventType::Custom(name) => name,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    Capture,
    #[default]
    Bubble,
}

/// What a listener wants to happen after it ran.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Propagation {
    #[default]
    Continue,
    /// Skip every remaining listener, in this phase and the next
    Stop,
}

impl Propagation {
    pub fn is_stop(self) -> bool {
        self == Propagation::Stop
    }
}

impl From<bool> for Propagation {
    /// `false` stops propagation.
    fn from(keep_going: bool) -> Self {
        if keep_going {
            Propagation::Continue
        } else {
            Propagation::Stop
        }
    }
}

bitflags! {
    /// Keyboard modifier state
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Named keys plus printable characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Space,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Shift,
    Control,
    Alt,
    Meta,
    Char(char),
}

impl Key {
    /// The modifier bit this key toggles, if it is a modifier key.
    pub fn modifier(self) -> Option<Modifiers> {
        match self {
            Key::Shift => Some(Modifiers::SHIFT),
            Key::Control => Some(Modifiers::CTRL),
            Key::Alt => Some(Modifiers::ALT),
            Key::Meta => Some(Modifiers::META),
            _ => None,
        }
    }
}

/// Mouse cursor a node asks for while it is under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorIcon {
    #[default]
    Default,
    Text,
    Pointer,
    Crosshair,
    Move,
    NotAllowed,
    Grab,
    Grabbing,
    Wait,
    Progress,
}

impl CursorIcon {
    /// CSS `cursor` keyword.
    pub fn as_css(self) -> &'static str {
        match self {
            CursorIcon::Default => "default",
            CursorIcon::Text => "text",
            CursorIcon::Pointer => "pointer",
            CursorIcon::Crosshair => "crosshair",
            CursorIcon::Move => "move",
            CursorIcon::NotAllowed => "not-allowed",
            CursorIcon::Grab => "grab",
            CursorIcon::Grabbing => "grabbing",
            CursorIcon::Wait => "wait",
            CursorIcon::Progress => "progress",
        }
    }
}

/// An event travelling through the scene.
#[derive(Clone, Debug)]
pub struct Event {
    pub kind: EventType,
    /// Inferred at dispatch when unset
    pub target: Option<NodeId>,
    /// Node whose listeners are running
    pub current: Option<NodeId>,
    pub phase: Phase,
    /// Pointer position relative to the canvas backing store
    pub x: f64,
    pub y: f64,
    /// Pointer position as reported by the host
    pub client_x: f64,
    pub client_y: f64,
    /// Wheel delta, or the pointer offset since drag start for drag events
    pub delta_x: f64,
    pub delta_y: f64,
    /// Pointer movement since the previous drag event
    pub step_x: f64,
    pub step_y: f64,
    pub button: Option<MouseButton>,
    pub key: Option<Key>,
    pub text: Option<String>,
    pub modifiers: Modifiers,
    /// Frame time the event was dispatched in
    pub time: f64,
    /// The other node of a mouseover/mouseout or focus/blur pair
    pub related: Option<NodeId>,
    /// Cursor requested by the nodes on the dispatch path, deepest wins
    pub cursor: Option<CursorIcon>,
}

impl Event {
    pub fn new(kind: EventType) -> Self {
        Self {
            kind,
            target: None,
            current: None,
            phase: Phase::Bubble,
            x: 0.0,
            y: 0.0,
            client_x: 0.0,
            client_y: 0.0,
            delta_x: 0.0,
            delta_y: 0.0,
            step_x: 0.0,
            step_y: 0.0,
            button: None,
            key: None,
            text: None,
            modifiers: Modifiers::empty(),
            time: 0.0,
            related: None,
            cursor: None,
        }
    }

    pub fn target(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }

    /// Set both the relative and the client position.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self.client_x = x;
        self.client_y = y;
        self
    }

    pub fn client(mut self, x: f64, y: f64) -> Self {
        self.client_x = x;
        self.client_y = y;
        self
    }

    pub fn delta(mut self, dx: f64, dy: f64) -> Self {
        self.delta_x = dx;
        self.delta_y = dy;
        self
    }

    pub fn step(mut self, dx: f64, dy: f64) -> Self {
        self.step_x = dx;
        self.step_y = dy;
        self
    }

    pub fn button(mut self, button: MouseButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    pub fn related(mut self, related: Option<NodeId>) -> Self {
        self.related = related;
        self
    }
}
