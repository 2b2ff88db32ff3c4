mod common;
use common::*;

use core_actions::{GestureState, SelectionOptions};
use core_events::{KeyModifiers, MouseAction, MouseButton, MouseEvent, TouchPhase};
use core_paragraph::Offset;
use core_state::PreviewRange;
use core_text::TextInputType;
use pretty_assertions::assert_eq;
use std::time::Duration;

const LONG_PRESS: Duration = Duration::from_millis(500);

fn mouse(h: &mut Harness, action: MouseAction, x: f32, y: f32, mods: KeyModifiers) {
    let event = MouseEvent::new(action, Offset::new(x, y), h.clock).with_mods(mods);
    h.pattern.handle_mouse_event(&event);
}

fn right_click(h: &mut Harness, x: f32, y: f32) {
    let mut event = MouseEvent::new(MouseAction::Press, Offset::new(x, y), h.clock);
    event.button = MouseButton::Right;
    h.pattern.handle_mouse_event(&event);
}

#[test]
fn tap_places_caret_and_repeat_tap_toggles_menu() {
    let mut h = harness().with_text("hello world").focused();
    let (x, y) = at_index(3);
    h.tap(x, y);
    assert_eq!(h.pattern.caret_index(), 3);
    assert_eq!(h.pattern.gesture_state(), GestureState::Caret);
    assert!(!h.pattern.overlay().menu_shown);

    h.tick(400);
    h.tap(x, y);
    assert_eq!(h.pattern.caret_index(), 3);
    assert!(h.pattern.overlay().menu_shown);

    h.tick(400);
    h.tap(x, y);
    assert!(!h.pattern.overlay().menu_shown);
}

#[test]
fn tap_focuses_an_unfocused_field() {
    let mut h = harness().with_text("abc");
    let (x, y) = at_index(1);
    h.tap(x, y);
    h.settle();
    assert!(h.pattern.has_focus());
    assert_eq!(h.pattern.caret_index(), 1);
}

#[test]
fn triple_tap_selects_paragraph() {
    let mut h = harness_with(|f| f.input_type = TextInputType::Multiline)
        .with_text("ab\ncd ef")
        .focused();
    h.tap(10.0, 30.0);
    h.tick(60);
    h.tap(10.0, 30.0);
    assert_eq!(h.pattern.selection(), (3, 5));
    assert_eq!(h.pattern.gesture_state(), GestureState::WordSelect);
    h.tick(60);
    h.tap(10.0, 30.0);
    assert_eq!(h.pattern.selection(), (3, 8));
    assert_eq!(h.pattern.gesture_state(), GestureState::ParagraphSelect);
}

#[test]
fn long_press_then_move_selects() {
    let mut h = harness().with_text("hello world").focused();
    h.touch(TouchPhase::Down, 20.0, 10.0);
    h.pump(LONG_PRESS);
    assert!(matches!(
        h.pattern.gesture_state(),
        GestureState::GestureSelecting { anchor: 2, .. }
    ));

    h.touch(TouchPhase::Move, 80.0, 10.0);
    assert_eq!(h.pattern.selection(), (2, 8));
    h.touch(TouchPhase::Up, 80.0, 10.0);
    h.layout();
    assert_eq!(h.pattern.gesture_state(), GestureState::Selected);
    assert!(h.pattern.overlay().menu_shown);
    assert!(h.pattern.overlay().handles_shown);
}

#[test]
fn short_press_does_not_long_press() {
    let mut h = harness().with_text("hello world").focused();
    h.touch(TouchPhase::Down, 20.0, 10.0);
    h.pump(Duration::from_millis(100));
    h.touch(TouchPhase::Up, 20.0, 10.0);
    h.pump(LONG_PRESS);
    assert_eq!(h.pattern.gesture_state(), GestureState::Caret);
    assert!(!h.pattern.is_selected());
}

fn drag_selection(h: &mut Harness, to_x: f32) {
    h.pattern
        .set_selection(0, 5, SelectionOptions::default(), true)
        .unwrap();
    h.layout();
    h.touch(TouchPhase::Down, 20.0, 10.0);
    h.pump(LONG_PRESS);
    assert!(matches!(
        h.pattern.gesture_state(),
        GestureState::DragArmed { .. }
    ));
    h.touch(TouchPhase::Move, to_x, 10.0);
    h.touch(TouchPhase::Up, to_x, 10.0);
    h.layout();
}

#[test]
fn dragging_selection_moves_text() {
    let mut h = harness().with_text("hello world").focused();
    drag_selection(&mut h, 110.0);
    assert_eq!(h.text(), " worldhello");
    assert_eq!(h.pattern.selection(), (6, 11));
    assert_eq!(h.pattern.undo_depth(), 1);

    assert!(h.pattern.handle_on_undo_action());
    assert_eq!(h.text(), "hello world");
}

#[test]
fn drop_inside_dragged_range_cancels() {
    let mut h = harness().with_text("hello world").focused();
    drag_selection(&mut h, 30.0);
    assert_eq!(h.text(), "hello world");
    assert_eq!(h.pattern.selection(), (0, 5));
    assert_eq!(h.pattern.undo_depth(), 0);
}

#[test]
fn hot_edge_scrolls_and_extends_selection() {
    let mut h = harness().with_text(&"a".repeat(40)).focused();
    h.pattern.set_caret_offset(0).unwrap();
    h.layout();
    assert_eq!(h.pattern.scroll_offset().x, 0.0);

    h.touch(TouchPhase::Down, 100.0, 10.0);
    h.pump(LONG_PRESS);
    h.touch(TouchPhase::Move, 195.0, 10.0);
    assert!(h.pattern.is_auto_scrolling());
    assert!(h.pattern.current_auto_scroll_speed() > 0.0);
    let before = h.pattern.selection();
    assert_eq!(before.0, 10);

    h.pump(Duration::from_millis(16));
    assert!(h.pattern.scroll_offset().x < 0.0);
    let after = h.pattern.selection();
    assert_eq!(after.0, 10);
    assert!(after.1 > before.1, "{before:?} -> {after:?}");

    h.touch(TouchPhase::Up, 195.0, 10.0);
    assert!(!h.pattern.is_auto_scrolling());
}

#[test]
fn mouse_drag_selects_without_menu() {
    let mut h = harness().with_text("hello world").focused();
    mouse(&mut h, MouseAction::Press, 10.0, 10.0, KeyModifiers::empty());
    assert_eq!(h.pattern.caret_index(), 1);
    mouse(&mut h, MouseAction::Move, 50.0, 10.0, KeyModifiers::empty());
    mouse(&mut h, MouseAction::Release, 50.0, 10.0, KeyModifiers::empty());
    assert_eq!(h.pattern.selection(), (1, 5));
    assert_eq!(h.pattern.gesture_state(), GestureState::Selected);
    assert!(!h.pattern.overlay().is_shown());
}

#[test]
fn shift_click_extends_from_caret() {
    let mut h = harness().with_text("hello world").focused();
    h.pattern.set_caret_offset(2).unwrap();
    mouse(&mut h, MouseAction::Press, 60.0, 10.0, KeyModifiers::SHIFT);
    mouse(&mut h, MouseAction::Release, 60.0, 10.0, KeyModifiers::SHIFT);
    assert_eq!(h.pattern.selection(), (2, 6));
}

#[test]
fn mouse_double_click_selects_word() {
    let mut h = harness().with_text("hello world").focused();
    mouse(&mut h, MouseAction::Press, 80.0, 10.0, KeyModifiers::empty());
    mouse(&mut h, MouseAction::Release, 80.0, 10.0, KeyModifiers::empty());
    h.tick(50);
    mouse(&mut h, MouseAction::Press, 80.0, 10.0, KeyModifiers::empty());
    mouse(&mut h, MouseAction::Release, 80.0, 10.0, KeyModifiers::empty());
    assert_eq!(h.pattern.selection(), (6, 11));
    assert!(!h.pattern.overlay().menu_shown);
}

#[test]
fn right_click_opens_menu() {
    let mut h = harness().with_text("hello world").focused();
    right_click(&mut h, 30.0, 10.0);
    assert_eq!(h.pattern.caret_index(), 3);
    assert!(h.pattern.overlay().menu_shown);
}

#[test]
fn external_drop_inserts_at_point() {
    let mut h = harness().with_text("abcd").focused();
    let (x, y) = at_index(2);
    assert!(h.pattern.on_drag_drop("XY", Offset::new(x, y)));
    assert_eq!(h.text(), "abXYcd");
    assert_eq!(h.pattern.caret_index(), 4);
    assert!(h.pattern.handle_on_undo_action());
    assert_eq!(h.text(), "abcd");
}

#[test]
fn cancel_ends_gesture_selection() {
    let mut h = harness().with_text("hello world").focused();
    h.touch(TouchPhase::Down, 20.0, 10.0);
    h.pump(LONG_PRESS);
    h.touch(TouchPhase::Move, 60.0, 10.0);
    h.touch(TouchPhase::Cancel, 60.0, 10.0);
    assert_eq!(h.pattern.gesture_state(), GestureState::Selected);
    assert_eq!(h.pattern.selection(), (2, 6));
}

#[test]
fn tap_during_composition_commits_it_before_moving_the_caret() {
    let mut h = harness().with_text("walk").focused();
    h.pattern
        .set_preview_text("ing", PreviewRange::INACTIVE)
        .unwrap();
    h.layout();
    assert!(h.pattern.has_preview_text());

    let (x, y) = at_index(1);
    h.tap(x, y);
    assert!(!h.pattern.has_preview_text());
    assert_eq!(h.pattern.caret_index(), 1);

    h.pattern.insert_value("X");
    h.layout();
    assert_eq!(h.text(), "wXalking");
    assert_eq!(h.pattern.caret_index(), 2);
}

#[test]
fn edit_queued_during_drag_cancels_the_drop() {
    let mut h = harness().with_text("hello world").focused();
    h.pattern
        .set_selection(0, 5, SelectionOptions::default(), true)
        .unwrap();
    h.layout();
    h.touch(TouchPhase::Down, 20.0, 10.0);
    h.pump(LONG_PRESS);
    h.touch(TouchPhase::Move, 110.0, 10.0);
    assert!(matches!(
        h.pattern.gesture_state(),
        GestureState::Dragging { .. }
    ));

    h.pattern.insert_value("Z");
    h.touch(TouchPhase::Up, 110.0, 10.0);
    h.layout();
    assert_eq!(h.text(), "Z world");
    assert_eq!(h.pattern.undo_depth(), 1);
    assert_eq!(h.pattern.gesture_state(), GestureState::Selected);
}
