use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use layercake::prelude::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn canvas(config: CanvasConfig) -> (Canvas<RecordingSurface, ManualClock>, ManualClock) {
    init();
    let clock = ManualClock::new(0.0);
    let canvas = Canvas::with_clock(RecordingSurface::new(), config, clock.clone());
    (canvas, clock)
}

/// Geometry whose path construction always fails.
#[derive(Debug)]
struct Broken;

impl Geometry for Broken {
    fn draw_geometry(&self, surface: &mut dyn Surface) -> Result<()> {
        surface.move_to(0.0, 0.0);
        Err(SceneError::Surface("path construction failed".into()))
    }

    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, 1.0, 1.0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn test_failed_frame_unwinds_surface_state() {
    let (mut canvas, _clock) = canvas(CanvasConfig::new().size(50.0, 50.0));
    let root = canvas.root();
    let scene = canvas.scene_mut();
    let group = scene.add_group(NodeAttrs::group().position(5.0, 5.0));
    let broken = scene.add_shape(NodeAttrs::new().fill(true), Broken);
    scene.append(root, group).unwrap();
    scene.append(group, broken).unwrap();

    let err = canvas.on_frame(None, None).unwrap_err();
    assert!(matches!(err, SceneError::Surface(_)));
    assert_eq!(canvas.surface().depth(), 0);

    // the next frame starts from a clean state
    canvas.scene_mut().remove(group, broken).unwrap();
    canvas.surface_mut().take_calls();
    canvas.on_frame(None, None).unwrap();
    assert_eq!(canvas.surface().depth(), 0);
    assert_eq!(
        canvas.surface().count(|c| matches!(c, SurfaceCall::Save)),
        canvas.surface().count(|c| matches!(c, SurfaceCall::Restore))
    );
}

#[test]
fn test_listener_error_fails_the_frame() {
    let (mut canvas, _clock) = canvas(CanvasConfig::new());
    let root = canvas.root();
    canvas
        .scene_mut()
        .add_frame_listener(root, |_, _, t, _| {
            if t > 50.0 {
                Err(SceneError::Listener("too late".into()))
            } else {
                Ok(Propagation::Continue)
            }
        })
        .unwrap();

    assert_eq!(canvas.run_frames(2).unwrap(), 2);
    assert!(matches!(
        canvas.run_frames(5),
        Err(SceneError::Listener(_))
    ));
}

#[test]
fn test_animation_runs_on_scene_time() {
    let (mut canvas, _clock) = canvas(CanvasConfig::new().fixed_timestep(true).frame_duration(10.0));
    let root = canvas.root();
    let scene = canvas.scene_mut();
    let rect = scene.add_shape(NodeAttrs::new(), Rectangle::square(4.0));
    scene.append(root, rect).unwrap();
    scene
        .animate_to(rect, Attr::X, 100.0, 100.0, Tween::Linear)
        .unwrap();

    canvas.run_frames(5).unwrap();
    let x = canvas.scene().attrs(rect).unwrap().x;
    assert!(x > 0.0 && x < 100.0, "x = {}", x);

    canvas.run_frames(20).unwrap();
    assert_eq!(canvas.scene().attrs(rect).unwrap().x, 100.0);
}

#[test]
fn test_fps_window() {
    let (mut canvas, _clock) = canvas(CanvasConfig::new().fps_window(4).frame_duration(25.0));
    canvas.run_frames(8).unwrap();
    assert_eq!(canvas.fps().frames(), 8);
    assert!((canvas.fps().real_fps - 40.0).abs() < 1e-9);
}

#[test]
fn test_pointer_over_and_cursor() {
    let (mut canvas, _clock) = canvas(CanvasConfig::new().size(100.0, 100.0));
    let root = canvas.root();
    let scene = canvas.scene_mut();
    let button = scene.add_shape(
        NodeAttrs::new().position(10.0, 10.0).cursor(CursorIcon::Pointer),
        Rectangle::new(30.0, 20.0),
    );
    scene.append(root, button).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    canvas
        .scene_mut()
        .add_event_listener(root, EventType::MouseMove, Phase::Capture, move |_, ev| {
            s.borrow_mut().push(ev.target);
            Ok(Propagation::Continue)
        })
        .unwrap();

    canvas
        .handle_host_event(HostEvent::PointerMove { x: 20.0, y: 20.0 })
        .unwrap();
    assert_eq!(canvas.cursor(), CursorIcon::Default);

    // the frame's mouseover passes the button
    canvas.on_frame(None, None).unwrap();
    assert_eq!(canvas.scene().target(), Some(button));
    assert_eq!(canvas.cursor(), CursorIcon::Pointer);

    canvas
        .handle_host_event(HostEvent::PointerMove { x: 21.0, y: 20.0 })
        .unwrap();
    assert_eq!(canvas.cursor(), CursorIcon::Pointer);
    // nothing picked yet, so the first move lands on the root
    assert_eq!(*seen.borrow(), vec![Some(root), Some(button)]);
}

#[test]
fn test_many_samples_between_frames() {
    let (mut canvas, _clock) = canvas(CanvasConfig::new().pointer_pool_cap(4));
    for i in 0..20 {
        canvas
            .handle_host_event(HostEvent::PointerMove { x: i as f64, y: 0.0 })
            .unwrap();
    }
    canvas.on_frame(None, None).unwrap();
    assert_eq!(canvas.pointer(), Some((19.0, 0.0)));
}
