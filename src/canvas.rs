//! Canvas driver: owns the surface and the scene root, runs frames and turns
//! host input into scene events.

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::attrs::NodeAttrs;
use crate::color::Color;
use crate::error::Result;
use crate::event::{CursorIcon, Event, EventType, Key, Modifiers, MouseButton};
use crate::paint::Paint;
use crate::scene::{NodeId, Scene};
use crate::surface::{DrawContext, Surface};

/// Two clicks on the same node within this many milliseconds make a
/// double click.
const DOUBLE_CLICK_MS: f64 = 500.0;

/// Millisecond time source for the frame loop.
pub trait Clock {
    fn now_ms(&self) -> f64;
    fn sleep_ms(&self, ms: f64);
}

/// Monotonic wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn sleep_ms(&self, ms: f64) {
        if ms > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(ms / 1000.0));
        }
    }
}

/// Test clock. Clones share the same time; sleeping advances it.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: f64) {
        if ms > 0.0 {
            self.advance(ms);
        }
    }
}

pub struct CanvasConfig {
    pub frame_duration_ms: f64,
    /// Multiplier applied to the frame delta
    pub speed: f64,
    /// Use `frame_duration_ms * speed` as delta instead of measured time
    pub fixed_timestep: bool,
    pub play_only_when_focused: bool,
    pub redraw_only_when_changed: bool,
    /// Run the pick pass every frame
    pub catch_mouse: bool,
    /// Clear the surface before drawing
    pub clear: bool,
    pub fps_window: u32,
    pub pointer_pool_cap: usize,
    /// Backing store size in pixels
    pub width: f64,
    pub height: f64,
    /// Size the host displays the canvas at
    pub display_width: f64,
    pub display_height: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            frame_duration_ms: 30.0,
            speed: 1.0,
            fixed_timestep: false,
            play_only_when_focused: true,
            redraw_only_when_changed: false,
            catch_mouse: true,
            clear: true,
            fps_window: 30,
            pointer_pool_cap: 100,
            width: 300.0,
            height: 150.0,
            display_width: 300.0,
            display_height: 150.0,
        }
    }
}

impl CanvasConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backing size; the display size follows.
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self.display_width = width;
        self.display_height = height;
        self
    }

    pub fn display_size(mut self, width: f64, height: f64) -> Self {
        self.display_width = width;
        self.display_height = height;
        self
    }

    pub fn frame_duration(mut self, ms: f64) -> Self {
        self.frame_duration_ms = ms;
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn fixed_timestep(mut self, fixed: bool) -> Self {
        self.fixed_timestep = fixed;
        self
    }

    pub fn play_only_when_focused(mut self, value: bool) -> Self {
        self.play_only_when_focused = value;
        self
    }

    pub fn redraw_only_when_changed(mut self, value: bool) -> Self {
        self.redraw_only_when_changed = value;
        self
    }

    pub fn catch_mouse(mut self, value: bool) -> Self {
        self.catch_mouse = value;
        self
    }

    pub fn clear(mut self, value: bool) -> Self {
        self.clear = value;
        self
    }

    pub fn fps_window(mut self, frames: u32) -> Self {
        self.fps_window = frames.max(1);
        self
    }

    pub fn pointer_pool_cap(mut self, cap: usize) -> Self {
        self.pointer_pool_cap = cap;
        self
    }
}

/// Raw input from the host. Positions are in display pixels relative to
/// the canvas' top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    PointerMove { x: f64, y: f64 },
    PointerDown { x: f64, y: f64, button: MouseButton },
    PointerUp { x: f64, y: f64, button: MouseButton },
    Wheel { x: f64, y: f64, delta_x: f64, delta_y: f64 },
    KeyDown { key: Key, modifiers: Modifiers },
    KeyUp { key: Key, modifiers: Modifiers },
    TextInput(String),
    PointerEnter,
    PointerLeave,
}

/// Modifier and held-key state tracked from key events.
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    modifiers: Modifiers,
    held: HashSet<Key>,
}

impl KeyState {
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    fn update(&mut self, key: Key, modifiers: Modifiers, down: bool) {
        self.modifiers = modifiers;
        if let Some(m) = key.modifier() {
            self.modifiers.set(m, down);
        }
        if down {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
    }
}

/// One queued pointer position, consumed by the next frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PointerSample {
    x: f64,
    y: f64,
    client_x: f64,
    client_y: f64,
    down: bool,
}

/// Rolling frame-rate counters.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window: u32,
    frames: u64,
    elapsed: f64,
    window_start: f64,
    /// Average over the last full window of frame processing time
    pub fps: f64,
    /// Frames per second of wall time over the last full window
    pub real_fps: f64,
    /// Based on the last frame alone
    pub current_fps: f64,
}

impl FpsCounter {
    fn new(window: u32, now: f64) -> Self {
        Self {
            window: window.max(1),
            frames: 0,
            elapsed: 0.0,
            window_start: now,
            fps: 0.0,
            real_fps: 0.0,
            current_fps: 0.0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn record(&mut self, frame_ms: f64, now: f64) {
        if frame_ms > 0.0 {
            self.current_fps = 1000.0 / frame_ms;
        }
        self.elapsed += frame_ms;
        self.frames += 1;
        if self.frames % u64::from(self.window) == 0 {
            let window = f64::from(self.window);
            if self.elapsed > 0.0 {
                self.fps = window * 1000.0 / self.elapsed;
            }
            if now > self.window_start {
                self.real_fps = window * 1000.0 / (now - self.window_start);
            }
            log::trace!("fps {:.1} (real {:.1})", self.fps, self.real_fps);
            self.elapsed = 0.0;
            self.window_start = now;
        }
    }
}

/// Drives a scene on a drawing surface.
pub struct Canvas<S: Surface, C: Clock = SystemClock> {
    scene: Scene,
    root: NodeId,
    ctx: DrawContext<S>,
    clock: C,
    config: CanvasConfig,

    playing: bool,
    blur_stopped: bool,
    real_time: f64,
    time: f64,
    fps: FpsCounter,
    z_counter: u32,

    absolute_pointer: Option<(f64, f64)>,
    mouse_down: bool,
    samples: Vec<PointerSample>,
    sample_pool: Vec<PointerSample>,
    prev_client: Option<(f64, f64)>,
    drag_target: Option<NodeId>,
    drag_offset: (f64, f64),
    press_target: Option<NodeId>,
    last_click: Option<(NodeId, f64)>,
    keys: KeyState,
    cursor: CursorIcon,
}

impl<S: Surface> Canvas<S, SystemClock> {
    pub fn new(surface: S, config: CanvasConfig) -> Self {
        Self::with_clock(surface, config, SystemClock::new())
    }
}

impl<S: Surface, C: Clock> Canvas<S, C> {
    /// Create a canvas with an empty root group. It starts playing.
    pub fn with_clock(surface: S, config: CanvasConfig, clock: C) -> Self {
        let mut scene = Scene::new();
        let root = scene.add_group(NodeAttrs::group());
        let now = clock.now_ms();
        let mut canvas = Self {
            scene,
            root,
            ctx: DrawContext::new(surface),
            fps: FpsCounter::new(config.fps_window, now),
            clock,
            config,
            playing: false,
            blur_stopped: false,
            real_time: now,
            time: 0.0,
            z_counter: 0,
            absolute_pointer: None,
            mouse_down: false,
            samples: Vec::new(),
            sample_pool: Vec::new(),
            prev_client: None,
            drag_target: None,
            drag_offset: (0.0, 0.0),
            press_target: None,
            last_click: None,
            keys: KeyState::default(),
            cursor: CursorIcon::Default,
        };
        canvas.play();
        canvas
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        self.ctx.surface()
    }

    pub fn surface_mut(&mut self) -> &mut S {
        self.ctx.surface_mut()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Scene time of the last frame.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn fps(&self) -> &FpsCounter {
        &self.fps
    }

    pub fn keys(&self) -> &KeyState {
        &self.keys
    }

    /// Cursor requested by the nodes the last dispatched event passed.
    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    /// Pointer in backing-store pixels.
    pub fn pointer(&self) -> Option<(f64, f64)> {
        self.scene.pointer()
    }

    /// Pointer in display pixels as the host reported it.
    pub fn absolute_pointer(&self) -> Option<(f64, f64)> {
        self.absolute_pointer
    }

    /// Hand out stacking values for host overlays, restarting every frame.
    pub fn next_z_index(&mut self) -> u32 {
        self.z_counter += 1;
        self.z_counter
    }

    // Playback

    pub fn play(&mut self) {
        self.stop();
        self.real_time = self.clock.now_ms();
        self.playing = true;
        log::debug!("canvas playing");
    }

    pub fn stop(&mut self) {
        self.blur_stopped = false;
        if self.playing {
            log::debug!("canvas stopped");
        }
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Run up to `frames` frames, sleeping on the clock between them so they
    /// start `frame_duration_ms` apart. Stops early once playback stops.
    pub fn run_frames(&mut self, frames: usize) -> Result<usize> {
        let mut ran = 0;
        while ran < frames && self.playing {
            let start = self.clock.now_ms();
            self.on_frame(None, None)?;
            ran += 1;
            let spent = self.clock.now_ms() - start;
            self.clock.sleep_ms(self.config.frame_duration_ms - spent);
        }
        Ok(ran)
    }

    pub fn on_host_blur(&mut self) {
        self.absolute_pointer = None;
        self.scene.set_pointer(None);
        if self.config.play_only_when_focused && self.playing {
            self.stop();
            self.blur_stopped = true;
        }
    }

    pub fn on_host_focus(&mut self) {
        if self.blur_stopped && !self.playing {
            self.play();
        }
    }

    /// Move keyboard focus within the scene.
    pub fn focus(&mut self, node: Option<NodeId>) -> Result<()> {
        self.scene.focus(node)
    }

    // Frames

    /// Advance, pick and draw one frame.
    ///
    /// Without `time` the scene clock advances by the measured (or fixed)
    /// delta. With `time`, the scene clock is set to it and `time_delta`,
    /// when given, replaces the computed delta.
    ///
    /// A failed frame unwinds the surface state stack before the error is
    /// returned.
    pub fn on_frame(&mut self, time: Option<f64>, time_delta: Option<f64>) -> Result<()> {
        self.z_counter = 0;
        let real_time = self.clock.now_ms();
        let real_elapsed = real_time - self.real_time;
        let mut dt = if self.config.fixed_timestep {
            self.config.frame_duration_ms * self.config.speed
        } else {
            real_elapsed * self.config.speed
        };
        self.real_time = real_time;
        match time {
            Some(t) => {
                self.time = t;
                if let Some(delta) = time_delta {
                    dt = delta;
                }
            }
            None => self.time += dt,
        }
        log::trace!("frame at {:.1} (dt {:.1})", self.time, dt);

        if let Err(e) = self.run_frame(dt) {
            let depth = self.ctx.unwind();
            self.ctx.reset();
            log::error!("frame at {:.1} failed, unwound {} surface states: {}", self.time, depth, e);
            return Err(e);
        }

        let now = self.clock.now_ms();
        self.fps.record(now - self.real_time, now);
        Ok(())
    }

    fn run_frame(&mut self, dt: f64) -> Result<()> {
        self.scene.handle_update(self.root, self.time, dt)?;

        let previous = self.scene.target();
        if self.config.catch_mouse {
            self.scene.set_target(None);
            self.scene.handle_pick(self.root)?;
        }
        let current = self.scene.target();
        if previous != current {
            if let Some(old) = previous.filter(|&id| self.scene.is_alive(id)) {
                self.dispatch(Event::new(EventType::MouseOut).target(old).related(current))?;
            }
            if let Some(new) = current {
                self.dispatch(Event::new(EventType::MouseOver).target(new).related(previous))?;
            }
        }

        self.drain_pointer_samples()?;

        if !self.config.redraw_only_when_changed || self.scene.is_changed(self.root) {
            self.draw()?;
            self.scene.clear_changed(self.root);
        }
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        self.ctx.save();
        if self.config.clear {
            self.ctx
                .clear_rect(0.0, 0.0, self.config.width, self.config.height);
        }
        self.ctx.set_fill_paint(&Paint::Color(Color::BLACK))?;
        self.ctx.set_stroke_paint(&Paint::Color(Color::BLACK))?;
        self.scene.handle_draw(self.root, &mut self.ctx)?;
        self.ctx.restore();
        Ok(())
    }

    // Input

    /// Feed one host input event into the scene.
    ///
    /// Returns `false` when a listener stopped the resulting dispatch.
    pub fn handle_host_event(&mut self, event: HostEvent) -> Result<bool> {
        match event {
            HostEvent::PointerMove { x, y } => {
                if self.blur_stopped && !self.playing {
                    self.play();
                }
                let (rx, ry) = self.track_pointer(x, y);
                self.push_sample(rx, ry, x, y);
                self.dispatch(self.pointer_event(EventType::MouseMove, x, y))
            }
            HostEvent::PointerDown { x, y, button } => {
                self.track_pointer(x, y);
                self.mouse_down = true;
                let target = self.scene.target();
                if self.scene.focused() != target {
                    self.scene.focus(target)?;
                }
                self.press_target = target;
                self.dispatch(self.pointer_event(EventType::MouseDown, x, y).button(button))
            }
            HostEvent::PointerUp { x, y, button } => {
                let (rx, ry) = self.track_pointer(x, y);
                self.mouse_down = false;
                self.push_sample(rx, ry, x, y);
                let keep_going =
                    self.dispatch(self.pointer_event(EventType::MouseUp, x, y).button(button))?;
                self.synthesize_click(x, y, button)?;
                Ok(keep_going)
            }
            HostEvent::Wheel {
                x,
                y,
                delta_x,
                delta_y,
            } => {
                self.track_pointer(x, y);
                let event = self
                    .pointer_event(EventType::Wheel, x, y)
                    .delta(delta_x, delta_y);
                self.dispatch(event)
            }
            HostEvent::KeyDown { key, modifiers } => {
                self.keys.update(key, modifiers, true);
                self.dispatch_key(Event::new(EventType::KeyDown).key(key))
            }
            HostEvent::KeyUp { key, modifiers } => {
                self.keys.update(key, modifiers, false);
                self.dispatch_key(Event::new(EventType::KeyUp).key(key))
            }
            HostEvent::TextInput(text) => {
                self.dispatch_key(Event::new(EventType::TextInput).text(text))
            }
            HostEvent::PointerEnter => Ok(true),
            HostEvent::PointerLeave => {
                self.absolute_pointer = None;
                self.scene.set_pointer(None);
                Ok(true)
            }
        }
    }

    /// Record the pointer and return it in backing-store pixels.
    fn track_pointer(&mut self, x: f64, y: f64) -> (f64, f64) {
        self.absolute_pointer = Some((x, y));
        let sx = scale_ratio(self.config.width, self.config.display_width);
        let sy = scale_ratio(self.config.height, self.config.display_height);
        let relative = (x * sx, y * sy);
        self.scene.set_pointer(Some(relative));
        relative
    }

    fn pointer_event(&self, kind: EventType, client_x: f64, client_y: f64) -> Event {
        let (x, y) = self.scene.pointer().unwrap_or((client_x, client_y));
        let mut event = Event::new(kind)
            .at(x, y)
            .client(client_x, client_y)
            .modifiers(self.keys.modifiers());
        event.target = self.scene.target();
        event
    }

    fn dispatch_key(&mut self, event: Event) -> Result<bool> {
        if self.scene.focused().is_none() {
            return Ok(true);
        }
        let event = event.modifiers(self.keys.modifiers());
        self.dispatch(event)
    }

    fn dispatch(&mut self, mut event: Event) -> Result<bool> {
        event.time = self.time;
        let keep_going = self.scene.dispatch_event(self.root, &mut event)?;
        self.cursor = event.cursor.unwrap_or_default();
        Ok(keep_going)
    }

    fn synthesize_click(&mut self, x: f64, y: f64, button: MouseButton) -> Result<()> {
        let target = match (self.press_target.take(), self.scene.target()) {
            (Some(pressed), Some(current)) if pressed == current => current,
            _ => return Ok(()),
        };
        self.dispatch(self.pointer_event(EventType::Click, x, y).button(button))?;

        let now = self.clock.now_ms();
        match self.last_click {
            Some((last, at)) if last == target && now - at <= DOUBLE_CLICK_MS => {
                self.last_click = None;
                self.dispatch(self.pointer_event(EventType::DblClick, x, y).button(button))?;
            }
            _ => self.last_click = Some((target, now)),
        }
        Ok(())
    }

    fn push_sample(&mut self, x: f64, y: f64, client_x: f64, client_y: f64) {
        if self.samples.len() >= self.config.pointer_pool_cap.max(1) {
            log::warn!("pointer sample queue full, dropping the oldest sample");
            let dropped = self.samples.remove(0);
            self.free_sample(dropped);
        }
        let mut sample = self.sample_pool.pop().unwrap_or_default();
        sample.x = x;
        sample.y = y;
        sample.client_x = client_x;
        sample.client_y = client_y;
        sample.down = self.mouse_down;
        self.samples.push(sample);
    }

    fn free_sample(&mut self, sample: PointerSample) {
        self.sample_pool.push(sample);
        if self.sample_pool.len() > self.config.pointer_pool_cap {
            self.sample_pool.clear();
        }
    }

    /// Turn queued pointer samples into drag events.
    fn drain_pointer_samples(&mut self) -> Result<()> {
        let mut samples = std::mem::take(&mut self.samples);
        let mut result = Ok(());
        for sample in samples.iter() {
            result = self.drag_step(sample);
            if result.is_err() {
                break;
            }
        }
        for sample in samples.drain(..) {
            self.free_sample(sample);
        }
        self.samples = samples;
        result
    }

    fn drag_step(&mut self, sample: &PointerSample) -> Result<()> {
        let (px, py) = self
            .prev_client
            .unwrap_or((sample.client_x, sample.client_y));
        let make = |kind: EventType, target: NodeId, offset: (f64, f64)| {
            Event::new(kind)
                .target(target)
                .at(sample.x, sample.y)
                .client(sample.client_x, sample.client_y)
                .delta(offset.0, offset.1)
        };

        if let Some(target) = self.drag_target {
            let step = (sample.client_x - px, sample.client_y - py);
            self.drag_offset.0 += step.0;
            self.drag_offset.1 += step.1;
            self.dispatch(make(EventType::Drag, target, self.drag_offset).step(step.0, step.1))?;
        }
        if !sample.down {
            if let Some(target) = self.drag_target.take() {
                self.dispatch(make(EventType::DragEnd, target, self.drag_offset))?;
                self.drag_offset = (0.0, 0.0);
            }
        } else if self.drag_target.is_none() {
            if let Some(target) = self.scene.target() {
                self.drag_target = Some(target);
                self.drag_offset = (0.0, 0.0);
                self.dispatch(make(EventType::DragStart, target, (0.0, 0.0)))?;
            }
        }
        self.prev_client = Some((sample.client_x, sample.client_y));
        Ok(())
    }
}

fn scale_ratio(backing: f64, display: f64) -> f64 {
    if display > 0.0 {
        backing / display
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::event::{Phase, Propagation};
    use crate::shapes::Rectangle;
    use crate::surface::{RecordingSurface, SurfaceCall};

    fn canvas() -> (Canvas<RecordingSurface, ManualClock>, ManualClock) {
        let clock = ManualClock::new(0.0);
        let config = CanvasConfig::new().size(100.0, 100.0);
        let canvas = Canvas::with_clock(RecordingSurface::new(), config, clock.clone());
        (canvas, clock)
    }

    fn record(canvas: &mut Canvas<RecordingSurface, ManualClock>, node: NodeId) -> Rc<RefCell<Vec<String>>> {
        let log: Rc<RefCell<Vec<String>>> = Rc::default();
        for kind in [
            EventType::MouseOver,
            EventType::MouseOut,
            EventType::Click,
            EventType::DblClick,
            EventType::DragStart,
            EventType::Drag,
            EventType::DragEnd,
        ] {
            let log = log.clone();
            canvas
                .scene_mut()
                .add_event_listener(node, kind, Phase::Bubble, move |_, ev| {
                    log.borrow_mut().push(ev.kind.to_string());
                    Ok(Propagation::Continue)
                })
                .unwrap();
        }
        log
    }

    #[test]
    fn test_time_advances_by_measured_delta() {
        let (mut canvas, clock) = canvas();
        clock.advance(16.0);
        canvas.on_frame(None, None).unwrap();
        assert_eq!(canvas.time(), 16.0);

        canvas.on_frame(Some(100.0), Some(5.0)).unwrap();
        assert_eq!(canvas.time(), 100.0);
        assert_eq!(canvas.scene().time(), 100.0);
    }

    #[test]
    fn test_fixed_timestep_uses_speed() {
        let clock = ManualClock::new(0.0);
        let config = CanvasConfig::new().fixed_timestep(true).speed(2.0);
        let mut canvas = Canvas::with_clock(RecordingSurface::new(), config, clock);
        canvas.on_frame(None, None).unwrap();
        assert_eq!(canvas.time(), 60.0);
    }

    #[test]
    fn test_over_out_and_click() {
        let (mut canvas, _clock) = canvas();
        let root = canvas.root();
        let rect = canvas
            .scene_mut()
            .add_shape(NodeAttrs::new(), Rectangle::square(10.0));
        canvas.scene_mut().append(root, rect).unwrap();
        let log = record(&mut canvas, rect);

        canvas
            .handle_host_event(HostEvent::PointerMove { x: 5.0, y: 5.0 })
            .unwrap();
        canvas.on_frame(None, None).unwrap();
        assert_eq!(canvas.scene().target(), Some(rect));

        canvas
            .handle_host_event(HostEvent::PointerDown { x: 5.0, y: 5.0, button: MouseButton::Left })
            .unwrap();
        assert_eq!(canvas.scene().focused(), Some(rect));
        canvas
            .handle_host_event(HostEvent::PointerUp { x: 5.0, y: 5.0, button: MouseButton::Left })
            .unwrap();
        canvas
            .handle_host_event(HostEvent::PointerDown { x: 5.0, y: 5.0, button: MouseButton::Left })
            .unwrap();
        canvas
            .handle_host_event(HostEvent::PointerUp { x: 5.0, y: 5.0, button: MouseButton::Left })
            .unwrap();

        canvas
            .handle_host_event(HostEvent::PointerMove { x: 50.0, y: 50.0 })
            .unwrap();
        canvas.on_frame(None, None).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["mouseover", "click", "click", "dblclick", "mouseout"]
        );
    }

    #[test]
    fn test_drag_synthesis() {
        let (mut canvas, _clock) = canvas();
        let root = canvas.root();
        let rect = canvas
            .scene_mut()
            .add_shape(NodeAttrs::new().position(10.0, 10.0), Rectangle::square(10.0));
        canvas.scene_mut().append(root, rect).unwrap();
        canvas.scene_mut().make_draggable(rect).unwrap();
        let log = record(&mut canvas, rect);

        canvas
            .handle_host_event(HostEvent::PointerMove { x: 15.0, y: 15.0 })
            .unwrap();
        canvas.on_frame(None, None).unwrap();
        canvas
            .handle_host_event(HostEvent::PointerDown { x: 15.0, y: 15.0, button: MouseButton::Left })
            .unwrap();
        canvas
            .handle_host_event(HostEvent::PointerMove { x: 16.0, y: 15.0 })
            .unwrap();
        canvas
            .handle_host_event(HostEvent::PointerMove { x: 19.0, y: 17.0 })
            .unwrap();
        canvas
            .handle_host_event(HostEvent::PointerUp { x: 19.0, y: 17.0, button: MouseButton::Left })
            .unwrap();
        canvas.on_frame(None, None).unwrap();

        // offset since drag start is (3, 2) from the second move on
        let attrs = canvas.scene().attrs(rect).unwrap();
        assert_eq!((attrs.x, attrs.y), (13.0, 12.0));
        // drag listeners from make_draggable stop the dispatch first
        assert_eq!(
            *log.borrow(),
            vec!["mouseover", "click", "dragend"]
        );
    }

    #[test]
    fn test_drag_reports_step_and_offset() {
        let (mut canvas, _clock) = canvas();
        let root = canvas.root();
        let rect = canvas
            .scene_mut()
            .add_shape(NodeAttrs::new().position(10.0, 10.0), Rectangle::square(10.0));
        canvas.scene_mut().append(root, rect).unwrap();
        canvas.scene_mut().make_draggable(rect).unwrap();

        let moves = Rc::new(RefCell::new(Vec::new()));
        let m = moves.clone();
        canvas
            .scene_mut()
            .add_event_listener(root, EventType::Drag, Phase::Capture, move |_, ev| {
                m.borrow_mut()
                    .push(((ev.step_x, ev.step_y), (ev.delta_x, ev.delta_y)));
                Ok(Propagation::Continue)
            })
            .unwrap();

        canvas
            .handle_host_event(HostEvent::PointerMove { x: 15.0, y: 15.0 })
            .unwrap();
        canvas.on_frame(None, None).unwrap();
        canvas
            .handle_host_event(HostEvent::PointerDown { x: 15.0, y: 15.0, button: MouseButton::Left })
            .unwrap();
        for (x, y) in [(16.0, 15.0), (19.0, 17.0), (20.0, 19.0)] {
            canvas
                .handle_host_event(HostEvent::PointerMove { x, y })
                .unwrap();
        }
        canvas
            .handle_host_event(HostEvent::PointerUp { x: 20.0, y: 19.0, button: MouseButton::Left })
            .unwrap();
        canvas.on_frame(None, None).unwrap();

        assert_eq!(
            *moves.borrow(),
            vec![
                ((3.0, 2.0), (3.0, 2.0)),
                ((1.0, 2.0), (4.0, 4.0)),
                ((0.0, 0.0), (4.0, 4.0)),
            ]
        );
    }

    #[test]
    fn test_relative_pointer_uses_display_scale() {
        let clock = ManualClock::new(0.0);
        let config = CanvasConfig::new().size(100.0, 50.0).display_size(200.0, 100.0);
        let mut canvas = Canvas::with_clock(RecordingSurface::new(), config, clock);
        canvas
            .handle_host_event(HostEvent::PointerMove { x: 100.0, y: 40.0 })
            .unwrap();
        assert_eq!(canvas.absolute_pointer(), Some((100.0, 40.0)));
        assert_eq!(canvas.pointer(), Some((50.0, 20.0)));

        canvas.handle_host_event(HostEvent::PointerLeave).unwrap();
        assert_eq!(canvas.pointer(), None);
    }

    #[test]
    fn test_blur_pauses_and_focus_resumes() {
        let (mut canvas, _clock) = canvas();
        assert!(canvas.is_playing());
        canvas.on_host_blur();
        assert!(!canvas.is_playing());
        canvas.on_host_focus();
        assert!(canvas.is_playing());

        canvas.stop();
        canvas.on_host_focus();
        assert!(!canvas.is_playing());
    }

    #[test]
    fn test_run_frames_sleeps_between_frames() {
        let (mut canvas, clock) = canvas();
        assert_eq!(canvas.run_frames(3).unwrap(), 3);
        assert_eq!(clock.now_ms(), 90.0);
        assert_eq!(canvas.fps().frames(), 3);

        canvas.stop();
        assert_eq!(canvas.run_frames(3).unwrap(), 0);
    }

    #[test]
    fn test_clear_and_redraw_only_when_changed() {
        let clock = ManualClock::new(0.0);
        let config = CanvasConfig::new().size(20.0, 10.0).redraw_only_when_changed(true);
        let mut canvas = Canvas::with_clock(RecordingSurface::new(), config, clock);
        let root = canvas.root();
        let rect = canvas
            .scene_mut()
            .add_shape(NodeAttrs::new().fill(true), Rectangle::square(5.0));
        canvas.scene_mut().append(root, rect).unwrap();

        canvas.on_frame(None, None).unwrap();
        let calls = canvas.surface_mut().take_calls();
        assert!(calls.contains(&SurfaceCall::ClearRect {
            x: 0.0,
            y: 0.0,
            width: 20.0,
            height: 10.0
        }));
        assert!(calls.contains(&SurfaceCall::Fill));

        canvas.on_frame(None, None).unwrap();
        assert!(canvas.surface().calls().is_empty());
    }

    #[test]
    fn test_key_state_and_focus_routing() {
        let (mut canvas, _clock) = canvas();
        let root = canvas.root();
        let keys = Rc::new(RefCell::new(Vec::new()));
        let k = keys.clone();
        canvas
            .scene_mut()
            .add_event_listener(root, EventType::KeyDown, Phase::Bubble, move |_, ev| {
                k.borrow_mut().push((ev.key, ev.modifiers));
                Ok(Propagation::Continue)
            })
            .unwrap();

        // nothing focused yet
        canvas
            .handle_host_event(HostEvent::KeyDown { key: Key::Char('a'), modifiers: Modifiers::empty() })
            .unwrap();
        assert!(keys.borrow().is_empty());

        canvas.focus(Some(root)).unwrap();
        canvas
            .handle_host_event(HostEvent::KeyDown { key: Key::Shift, modifiers: Modifiers::empty() })
            .unwrap();
        assert!(canvas.keys().is_down(Key::Shift));
        assert_eq!(
            keys.borrow().last().copied(),
            Some((Some(Key::Shift), Modifiers::SHIFT))
        );

        canvas
            .handle_host_event(HostEvent::KeyUp { key: Key::Shift, modifiers: Modifiers::SHIFT })
            .unwrap();
        assert!(!canvas.keys().is_down(Key::Shift));
        assert_eq!(canvas.keys().modifiers(), Modifiers::empty());
    }

    #[test]
    fn test_z_index_counter_resets_each_frame() {
        let (mut canvas, _clock) = canvas();
        assert_eq!(canvas.next_z_index(), 1);
        assert_eq!(canvas.next_z_index(), 2);
        canvas.on_frame(None, None).unwrap();
        assert_eq!(canvas.next_z_index(), 1);
    }
}
