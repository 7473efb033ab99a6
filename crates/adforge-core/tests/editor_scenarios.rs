//! End-to-end editor scenarios: full gesture flows through the editor
//! facade, committed via the sync layer.

use adforge_core::element::ElementKind;
use adforge_core::sync::ElementPatch;
use adforge_core::transform::{Corner, HandleKind};
use adforge_core::{
    AdSize, CanvasState, DelegatingOwner, InternalEditor, CanvasEditor,
};
use kurbo::{Point, Size};
use std::sync::{Arc, Mutex};
use std::time::Instant;

fn editor_300x250() -> InternalEditor {
    InternalEditor::with_state(CanvasState::new(AdSize::new(300, 250)))
}

fn set_geometry(ed: &mut InternalEditor, id: &str, pos: Point, size: Size) {
    ed.update_element(id, ElementPatch::geometry(pos, size), Instant::now());
}

/// Scenario A: a text element at (20, 30) sized (260, 40); dragging its
/// bottom-right handle by (+30, +10) yields size (290, 50) with the position
/// unchanged.
#[test]
fn bottom_right_drag_grows_size_and_keeps_position() {
    let mut ed = InternalEditor::with_state(CanvasState::new(AdSize::new(600, 500)));
    ed.set_snap_enabled(false);
    let id = ed.add_element(ElementKind::Text, Some(Point::new(20.0, 30.0)), None);
    set_geometry(&mut ed, &id, Point::new(20.0, 30.0), Size::new(260.0, 40.0));

    let grip = Point::new(280.0, 70.0);
    assert!(ed.begin_resize(&id, HandleKind::Corner(Corner::BottomRight), grip));
    ed.pointer_moved(Point::new(grip.x + 30.0, grip.y + 10.0));
    ed.end_gesture();

    let el = ed.state().element(&id).unwrap();
    assert_eq!(el.position, Point::new(20.0, 30.0));
    assert_eq!(el.size, Size::new(290.0, 50.0));
}

/// Scenario B: two elements share a left edge at x=50; dragging a third
/// element to x=52 with snapping on (threshold 5) lands it at exactly x=50.
#[test]
fn left_edges_snap_to_aligned_siblings() {
    let mut ed = editor_300x250();
    let a = ed.add_element(ElementKind::Text, Some(Point::new(50.0, 10.0)), None);
    set_geometry(&mut ed, &a, Point::new(50.0, 10.0), Size::new(80.0, 30.0));
    let b = ed.add_element(ElementKind::Text, Some(Point::new(50.0, 60.0)), None);
    set_geometry(&mut ed, &b, Point::new(50.0, 60.0), Size::new(80.0, 30.0));

    let c = ed.add_element(ElementKind::Button, Some(Point::new(100.0, 150.0)), None);
    set_geometry(&mut ed, &c, Point::new(100.0, 150.0), Size::new(80.0, 30.0));

    // Grab the element at its top-left and drag so its left edge lands at 52.
    assert!(ed.begin_move(&c, Point::new(100.0, 150.0)));
    ed.pointer_moved(Point::new(52.0, 150.0));

    let el = ed.state().element(&c).unwrap();
    assert!((el.position.x - 50.0).abs() < f64::EPSILON);
    assert!(!ed.active_guides().is_empty());
    ed.end_gesture();
    assert!(ed.active_guides().is_empty());
}

/// Beyond the threshold the same drag commits the raw position.
#[test]
fn distant_edges_do_not_snap() {
    let mut ed = editor_300x250();
    let a = ed.add_element(ElementKind::Text, Some(Point::new(50.0, 10.0)), None);
    set_geometry(&mut ed, &a, Point::new(50.0, 10.0), Size::new(80.0, 30.0));

    let c = ed.add_element(ElementKind::Button, Some(Point::new(100.0, 150.0)), None);
    set_geometry(&mut ed, &c, Point::new(100.0, 150.0), Size::new(80.0, 30.0));

    assert!(ed.begin_move(&c, Point::new(100.0, 150.0)));
    ed.pointer_moved(Point::new(57.0, 150.0));
    ed.end_gesture();

    let el = ed.state().element(&c).unwrap();
    assert!((el.position.x - 57.0).abs() < f64::EPSILON);
}

/// Bounds hold across an entire gesture no matter where the pointer goes.
#[test]
fn gesture_never_violates_canvas_bounds() {
    let mut ed = editor_300x250();
    ed.set_snap_enabled(false);
    let id = ed.add_element(ElementKind::Image, Some(Point::new(50.0, 50.0)), None);
    set_geometry(&mut ed, &id, Point::new(50.0, 50.0), Size::new(100.0, 100.0));

    assert!(ed.begin_move(&id, Point::new(60.0, 60.0)));
    for pointer in [
        Point::new(-1000.0, -1000.0),
        Point::new(1000.0, -500.0),
        Point::new(400.0, 400.0),
        Point::new(150.0, 125.0),
    ] {
        ed.pointer_moved(pointer);
        let el = ed.state().element(&id).unwrap();
        assert!(el.position.x >= 0.0);
        assert!(el.position.y >= 0.0);
        assert!(el.position.x + el.size.width <= 300.0);
        assert!(el.position.y + el.size.height <= 250.0);
    }
    ed.end_gesture();
}

/// An editor over a delegating owner keeps working against externally
/// refreshed state: the updater resolves against the accepted snapshot.
#[test]
fn delegating_editor_tracks_external_state() {
    let outbound = Arc::new(Mutex::new(Vec::<usize>::new()));
    let outbound_clone = Arc::clone(&outbound);

    let owner = DelegatingOwner::new(
        CanvasState::new(AdSize::new(300, 250)),
        Box::new(move |state| outbound_clone.lock().unwrap().push(state.len())),
    );
    let mut ed = CanvasEditor::new(owner);

    // Parent pushes a canonical state that already has an element.
    let mut external = CanvasState::new(AdSize::new(300, 250));
    let existing = external.add_element(ElementKind::Text, Point::new(10.0, 10.0));
    ed.owner_mut().accept(external);

    // A local edit builds on the accepted snapshot, not the stale one.
    let added = ed.add_element(ElementKind::Button, None, None);
    assert!(ed.state().element(&existing).is_some());
    assert!(ed.state().element(&added).is_some());
    assert_eq!(*outbound.lock().unwrap(), vec![2]);
}
