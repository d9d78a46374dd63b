use std::cell::Cell;
use std::rc::Rc;

use layercake::prelude::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assert_affine_eq(a: &Affine, b: &Affine) {
    for (x, y) in a.data.iter().zip(b.data.iter()) {
        assert!((x - y).abs() < 1e-9, "{:?} != {:?}", a, b);
    }
}

#[test]
fn test_composition_is_associative() {
    let a = *Affine::identity().translate(3.0, -2.0).rotate(0.7, None);
    let b = *Affine::identity().scale(2.0, 0.5).skew_x(0.3);
    let c = *Affine::identity().rotate(-1.1, Some((4.0, 4.0))).translate(1.0, 9.0);

    assert_affine_eq(&a.then(&b).then(&c), &a.then(&b.then(&c)));
}

#[test]
fn test_invert_round_trip() {
    let m = *Affine::identity()
        .translate(10.0, 5.0)
        .rotate(0.4, None)
        .scale(3.0, 2.0);
    assert_affine_eq(&m.then(&m.invert()), &Affine::IDENTITY);

    let (x, y) = m.apply_to_point(7.0, -3.0);
    let (bx, by) = m.invert().apply_to_point(x, y);
    assert!((bx - 7.0).abs() < 1e-9);
    assert!((by + 3.0).abs() < 1e-9);
}

#[test]
fn test_z_sort_is_stable() {
    init();
    let mut scene = Scene::new();
    let root = scene.add_group(NodeAttrs::group());
    let nodes: Vec<NodeId> = [0, 0, 1, 0]
        .iter()
        .map(|&z| scene.add_group(NodeAttrs::group().z_index(z)))
        .collect();
    scene.append_all(root, nodes.iter().copied()).unwrap();

    assert_eq!(
        scene.z_sorted_children(root),
        vec![nodes[0], nodes[1], nodes[3], nodes[2]]
    );
}

#[test]
fn test_hierarchy_links() {
    init();
    let mut scene = Scene::new();
    let a = scene.add_group(NodeAttrs::group());
    let b = scene.add_group(NodeAttrs::group());
    let child = scene.add_group(NodeAttrs::group());

    scene.append(a, child).unwrap();
    assert_eq!(scene.parent(child), Some(a));
    assert_eq!(scene.root(child), scene.root(a));

    // moving to another parent detaches first
    scene.append(b, child).unwrap();
    assert_eq!(scene.parent(child), Some(b));
    assert!(scene.children(a).is_empty());
    assert_eq!(scene.children(b), &[child]);

    scene.remove(b, child).unwrap();
    assert_eq!(scene.parent(child), None);
    assert_eq!(scene.root(child), Some(child));

    assert!(matches!(
        scene.append(child, child),
        Err(SceneError::Cycle { .. })
    ));
}

#[test]
fn test_hidden_node_hides_descendants() {
    init();
    let mut scene = Scene::new();
    let root = scene.add_group(NodeAttrs::group());
    let hidden = scene.add_group(NodeAttrs::group().visible(false));
    let child = scene.add_group(NodeAttrs::group().visible(true));
    let grandchild = scene.add_group(NodeAttrs::group());
    scene.append(root, hidden).unwrap();
    scene.append(hidden, child).unwrap();
    scene.append(child, grandchild).unwrap();

    scene.handle_update(root, 0.0, 0.0).unwrap();
    assert!(scene.will_be_drawn(root));
    for id in [hidden, child, grandchild] {
        assert!(!scene.will_be_drawn(id));
    }
}

#[test]
fn test_keyframes_interpolate_and_snap_once() {
    init();
    let mut scene = Scene::new();
    let node = scene.add_group(NodeAttrs::group());
    scene
        .add_keyframe_at(node, 0.0, vec![(Attr::X, AttrValue::Number(0.0))], Tween::Linear)
        .unwrap();
    scene
        .add_keyframe_at(node, 10.0, vec![(Attr::X, AttrValue::Number(100.0))], Tween::Linear)
        .unwrap();

    scene.handle_update(node, 5.0, 5.0).unwrap();
    assert_eq!(scene.attrs(node).unwrap().x, 50.0);

    scene.handle_update(node, 20.0, 15.0).unwrap();
    assert_eq!(scene.attrs(node).unwrap().x, 100.0);

    scene.set_attr(node, &Attr::X, 1.0).unwrap();
    scene.handle_update(node, 30.0, 10.0).unwrap();
    assert_eq!(scene.attrs(node).unwrap().x, 1.0);
}

#[test]
fn test_repeat_with_accumulate_continues_from_previous_end() {
    init();
    let mut scene = Scene::new();
    let node = scene.add_group(NodeAttrs::group());
    let spec = AnimatorSpec::new(Attr::X, 0.0, 10.0, 100.0).options(
        AnimateOptions::default()
            .repeat(Repeat::Times(2))
            .accumulate(true),
    );
    scene.animate(node, spec).unwrap();

    let mut t = 0.0;
    while t <= 250.0 {
        scene.handle_update(node, t, 5.0).unwrap();
        t += 5.0;
    }
    assert_eq!(scene.attrs(node).unwrap().x, 20.0);
}

#[test]
fn test_stop_short_circuits_listeners() {
    init();
    let mut scene = Scene::new();
    let node = scene.add_group(NodeAttrs::group());
    let second_ran = Rc::new(Cell::new(false));

    scene
        .add_event_listener(node, EventType::Click, Phase::Bubble, |_, _| {
            Ok(Propagation::Stop)
        })
        .unwrap();
    let flag = second_ran.clone();
    scene
        .add_event_listener(node, EventType::Click, Phase::Bubble, move |_, _| {
            flag.set(true);
            Ok(Propagation::Continue)
        })
        .unwrap();

    let mut ev = Event::new(EventType::Click).target(node);
    assert!(!scene.dispatch_event(node, &mut ev).unwrap());
    assert!(!second_ran.get());
}

#[test]
fn test_topmost_overlapping_sibling_is_picked() {
    init();
    let mut scene = Scene::new();
    let root = scene.add_group(NodeAttrs::group());
    let upper = scene.add_shape(NodeAttrs::new().z_index(1), Rectangle::new(20.0, 20.0));
    let lower = scene.add_shape(NodeAttrs::new().position(5.0, 5.0), Rectangle::new(20.0, 20.0));
    scene.append_all(root, [upper, lower]).unwrap();

    scene.set_pointer(Some((10.0, 10.0)));
    scene.handle_update(root, 0.0, 0.0).unwrap();
    scene.handle_pick(root).unwrap();
    assert_eq!(scene.target(), Some(upper));
}

#[test]
fn test_update_pick_draw_cycle() {
    init();
    let mut scene = Scene::new();
    let root = scene.add_group(NodeAttrs::group());
    let rect = scene.add_shape(NodeAttrs::new().fill(true), Rectangle::new(10.0, 10.0));
    scene.append(root, rect).unwrap();

    let mut ctx = DrawContext::new(RecordingSurface::new());
    ctx.set_fill_paint(&Paint::Color(Color::BLACK)).unwrap();
    ctx.surface_mut().take_calls();

    scene.set_pointer(Some((5.0, 5.0)));
    scene.handle_update(root, 0.0, 0.0).unwrap();
    scene.handle_pick(root).unwrap();
    scene.handle_draw(root, &mut ctx).unwrap();

    assert!(scene.under_cursor(rect));
    let surface = ctx.surface();
    assert_eq!(
        surface.count(|c| matches!(c, SurfaceCall::Rect { width, height, .. } if *width == 10.0 && *height == 10.0)),
        1
    );
    assert_eq!(surface.count(|c| matches!(c, SurfaceCall::Fill)), 1);
    assert_eq!(surface.count(|c| matches!(c, SurfaceCall::Stroke)), 0);
    assert_eq!(surface.depth(), 0);
}
