mod common;
use common::*;

use core_actions::{DirtyFlags, KeyboardState, SelectionOptions};
use core_state::PreviewRange;
use pretty_assertions::assert_eq;

#[test]
fn insert_at_caret_appends_and_moves_caret() {
    let mut h = harness().focused();
    h.pattern.insert_value("ab");
    h.layout();
    assert_eq!(h.text(), "ab");
    assert_eq!(h.pattern.caret_index(), 2);

    h.pattern.insert_value("c");
    h.layout();
    assert_eq!(h.text(), "abc");
    assert_eq!(h.pattern.caret_index(), 3);
}

#[test]
fn delete_backward_over_select_all_clears_text() {
    let mut h = harness().with_text("hello").focused();
    h.pattern
        .set_selection(0, 5, SelectionOptions::default(), true)
        .unwrap();
    assert!(h.pattern.is_selected_all());
    h.pattern.delete_backward(1);
    h.layout();
    assert_eq!(h.text(), "");
    assert_eq!(h.pattern.caret_index(), 0);
    assert!(!h.pattern.is_selected());
}

#[test]
fn double_tap_selects_word_under_pointer() {
    let mut h = harness().with_text("hello world").focused();
    let (x, y) = (72.0, 10.0);
    h.tap(x, y);
    assert_eq!(h.pattern.caret_index(), 7);
    h.tick(60);
    h.tap(x, y);
    assert_eq!(h.pattern.selection(), (6, 11));
    assert!(h.pattern.is_selected());
    assert!(h.pattern.overlay().menu_shown);
}

#[test]
fn max_length_truncates_and_raises_counter_border() {
    let mut h = harness_with(|f| f.max_length = Some(5))
        .with_text("abc")
        .focused();
    h.pattern.set_caret_offset(0).unwrap();
    h.pattern.insert_value("xyz");
    h.layout();
    assert_eq!(h.text(), "xyabc");
    assert_eq!(h.pattern.caret_index(), 2);
    assert!(h.pattern.show_count_border_style());

    h.pattern.delete_backward(1);
    h.layout();
    assert_eq!(h.text(), "yabc");
    assert!(!h.pattern.show_count_border_style());
}

#[test]
fn preview_then_finish_commits_with_one_undo_record() {
    let mut h = harness().with_text("walk").focused();
    assert_eq!(h.pattern.caret_index(), 4);
    let undo_before = h.pattern.undo_depth();

    h.pattern
        .set_preview_text("ing", PreviewRange::INACTIVE)
        .unwrap();
    h.layout();
    assert_eq!(h.text(), "walking");
    assert_eq!(h.pattern.preview_range(), PreviewRange::new(4, 7));
    assert_eq!(h.pattern.caret_index(), 7);

    h.pattern.finish_text_preview();
    h.layout();
    assert_eq!(h.text(), "walking");
    assert_eq!(h.pattern.preview_range(), PreviewRange::INACTIVE);
    assert_eq!(h.pattern.undo_depth(), undo_before + 1);

    assert!(h.pattern.handle_on_undo_action());
    assert_eq!(h.text(), "walk");
}

#[test]
fn soft_close_keeps_keyboard_forced_close_detaches() {
    let mut h = harness().focused();
    assert_eq!(h.pattern.keyboard_state(), KeyboardState::AttachedSystem);
    assert!(h.pattern.is_twinkling());

    assert!(!h.pattern.close_keyboard(false, true));
    assert_eq!(h.pattern.keyboard_state(), KeyboardState::AttachedSystem);
    assert!(h.pattern.is_twinkling());
    assert_eq!(h.ime.log.borrow().closes, 0);

    assert!(h.pattern.close_keyboard(true, true));
    assert_eq!(h.pattern.keyboard_state(), KeyboardState::Detached);
    assert!(!h.pattern.is_twinkling());
    assert_eq!(h.ime.log.borrow().closes, 1);
}

#[test]
fn draining_an_empty_queue_touches_nothing() {
    let mut h = harness().with_text("abc").focused();
    h.pattern.take_dirty();
    let undo = h.pattern.undo_depth();
    assert!(!h.pattern.before_create_layout_wrapper());
    assert_eq!(h.pattern.dirty(), DirtyFlags::empty());
    assert_eq!(h.pattern.undo_depth(), undo);
    assert_eq!(h.text(), "abc");
}

#[test]
fn layout_pass_consumes_measure_and_leaves_render() {
    let mut h = harness().focused();
    h.pattern.take_dirty();
    h.pattern.insert_value("a");
    assert!(h.pattern.dirty().contains(DirtyFlags::MEASURE));
    assert_eq!(h.pattern.queue_len(), 1);
    let flags = h.layout();
    assert!(flags.contains(DirtyFlags::RENDER));
    assert!(!flags.contains(DirtyFlags::MEASURE));
    assert_eq!(h.pattern.queue_len(), 0);
}

#[test]
fn dump_reports_indices_and_depths() {
    let mut h = harness().focused();
    h.pattern.insert_value("hey");
    h.layout();
    let dump = h.pattern.dump();
    assert_eq!(dump.text_len, 3);
    assert_eq!(dump.caret, 3);
    assert_eq!(dump.selection, (3, 3));
    assert_eq!(dump.preview, PreviewRange::INACTIVE);
    assert!(dump.has_focus);
    assert_eq!(dump.keyboard, KeyboardState::AttachedSystem);
    assert_eq!(dump.queue_depth, 0);
    assert_eq!(dump.undo_depth, 1);
    assert_eq!(dump.redo_depth, 0);
}

#[test]
fn detached_pattern_ignores_input() {
    let mut h = harness().with_text("abc").focused();
    h.pattern.on_detach_context();
    assert!(!h.pattern.is_attached());
    assert_eq!(h.pattern.keyboard_state(), KeyboardState::Detached);
    h.pattern.insert_value("x");
    assert_eq!(h.pattern.queue_len(), 0);
    assert!(h.pattern.delete_range(0, 1).is_err());
    h.settle();
    assert_eq!(h.text(), "abc");
}
