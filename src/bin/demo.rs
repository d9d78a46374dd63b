//! Builds a small scene, drives it with synthetic input on a recording
//! surface and logs what was drawn.
//!
//! Run with `RUST_LOG=debug` to see the frame loop.

use layercake::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    let clock = ManualClock::new(0.0);
    let config = CanvasConfig::new()
        .size(320.0, 240.0)
        .fixed_timestep(true)
        .frame_duration(1000.0 / 60.0);
    let mut canvas = Canvas::with_clock(RecordingSurface::new(), config, clock);
    let root = canvas.root();

    let scene = canvas.scene_mut();
    let board = scene.add_group(NodeAttrs::group().id("board").position(20.0, 20.0));
    scene.append(root, board)?;

    let gradient = Gradient::linear(0.0, 0.0, 1.0, 0.0)
        .stop(0.0, Color::BLUE)
        .stop(1.0, Color::GREEN)
        .with_units(StyleUnits::ObjectBoundingBox);
    let panel = scene.add_shape(
        NodeAttrs::new()
            .fill(gradient.into_setting())
            .stroke(Color::BLACK)
            .stroke_width(2.0),
        Rectangle::new(200.0, 120.0).rounded(8.0, 0.0),
    );
    scene.append(board, panel)?;

    let ball = scene.add_shape(
        NodeAttrs::new()
            .id("ball")
            .position(30.0, 60.0)
            .fill(Color::RED)
            .cursor(CursorIcon::Grab),
        Circle::new(12.0),
    );
    scene.append(board, ball)?;
    scene.make_draggable(ball)?;

    scene.add_event_listener(ball, EventType::Click, Phase::Bubble, |scene, ev| {
        log::info!("ball clicked at ({:.0}, {:.0})", ev.x, ev.y);
        if let Some(id) = ev.current {
            scene.animate_factor(id, Attr::Scale, 1.5, 200.0, Tween::Sproing)?;
        }
        Ok(Propagation::Continue)
    })?;

    scene.add_keyframe_at(ball, 0.0, vec![(Attr::Rotation, AttrValue::Number(0.0))], Tween::Linear)?;
    scene.add_keyframe_at(
        ball,
        2000.0,
        vec![(Attr::Rotation, AttrValue::Number(std::f64::consts::TAU))],
        Tween::Sine,
    )?;
    scene.every(
        panel,
        500.0,
        TimelineAction::callback(|scene, id, t, _| {
            let opacity = if (t / 500.0) as u64 % 2 == 0 { 1.0 } else { 0.8 };
            scene.set_attr(id, &Attr::Opacity, opacity)?;
            Ok(Propagation::Continue)
        }),
        false,
    )?;

    canvas.run_frames(5)?;

    let input = [
        HostEvent::PointerMove { x: 50.0, y: 80.0 },
        HostEvent::PointerDown { x: 50.0, y: 80.0, button: MouseButton::Left },
        HostEvent::PointerUp { x: 50.0, y: 80.0, button: MouseButton::Left },
        HostEvent::PointerDown { x: 50.0, y: 80.0, button: MouseButton::Left },
        HostEvent::PointerMove { x: 90.0, y: 100.0 },
        HostEvent::PointerUp { x: 90.0, y: 100.0, button: MouseButton::Left },
    ];
    for event in input {
        canvas.handle_host_event(event)?;
        canvas.run_frames(1)?;
    }
    canvas.run_frames(120)?;

    let surface = canvas.surface();
    log::info!(
        "{} surface calls, {} fills, {} strokes, cursor {}",
        surface.calls().len(),
        surface.count(|c| matches!(c, SurfaceCall::Fill)),
        surface.count(|c| matches!(c, SurfaceCall::Stroke)),
        canvas.cursor().as_css()
    );
    if let Some(attrs) = canvas.scene().attrs(ball) {
        log::info!("ball ended at ({:.1}, {:.1})", attrs.x, attrs.y);
    }
    log::info!("fps {:.1} over {} frames", canvas.fps().fps, canvas.fps().frames());
    Ok(())
}
