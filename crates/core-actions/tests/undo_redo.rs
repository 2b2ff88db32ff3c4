mod common;
use common::*;

use core_actions::SelectionOptions;
use core_state::{MAX_OPERATION_RECORDS, PreviewRange};
use pretty_assertions::assert_eq;

fn typed(h: &mut Harness, value: &str) {
    h.pattern.insert_value(value);
    h.layout();
}

#[test]
fn undo_then_redo_round_trips_text_and_caret() {
    let mut h = harness().focused();
    typed(&mut h, "ab");
    typed(&mut h, "cd");
    assert_eq!(h.text(), "abcd");

    assert!(h.pattern.handle_on_undo_action());
    assert_eq!(h.text(), "ab");
    assert_eq!(h.pattern.caret_index(), 2);
    assert_eq!(h.pattern.redo_depth(), 1);

    assert!(h.pattern.handle_on_redo_action());
    assert_eq!(h.text(), "abcd");
    assert_eq!(h.pattern.caret_index(), 4);
    assert_eq!(h.pattern.redo_depth(), 0);
}

#[test]
fn fresh_edit_clears_redo() {
    let mut h = harness().focused();
    typed(&mut h, "ab");
    typed(&mut h, "cd");
    assert!(h.pattern.handle_on_undo_action());
    assert_eq!(h.pattern.redo_depth(), 1);

    typed(&mut h, "x");
    assert_eq!(h.text(), "abx");
    assert_eq!(h.pattern.redo_depth(), 0);
    assert!(!h.pattern.handle_on_redo_action());
}

#[test]
fn history_is_capped() {
    let mut h = harness().focused();
    for _ in 0..25 {
        typed(&mut h, "a");
    }
    assert_eq!(h.pattern.undo_depth(), MAX_OPERATION_RECORDS);
    let mut undone = 0;
    while h.pattern.handle_on_undo_action() {
        undone += 1;
    }
    assert_eq!(undone, MAX_OPERATION_RECORDS);
    assert_eq!(h.text(), "a".repeat(5));
}

#[test]
fn undo_applies_pending_operations_first() {
    let mut h = harness().focused();
    typed(&mut h, "ab");
    h.pattern.insert_value("c");
    assert_eq!(h.pattern.queue_len(), 1);

    assert!(h.pattern.handle_on_undo_action());
    assert_eq!(h.pattern.queue_len(), 0);
    assert_eq!(h.text(), "ab");
}

#[test]
fn undo_is_refused_during_preview() {
    let mut h = harness().focused();
    typed(&mut h, "ab");
    h.pattern
        .set_preview_text("c", PreviewRange::INACTIVE)
        .unwrap();
    h.layout();
    let depth = h.pattern.undo_depth();
    assert!(!h.pattern.handle_on_undo_action());
    assert_eq!(h.text(), "abc");
    assert_eq!(h.pattern.undo_depth(), depth);
}

#[test]
fn empty_history_is_a_no_op() {
    let mut h = harness().with_text("abc").focused();
    assert!(!h.pattern.handle_on_undo_action());
    assert!(!h.pattern.handle_on_redo_action());
    assert_eq!(h.text(), "abc");
}

#[test]
fn undo_restores_selection() {
    let mut h = harness().with_text("hello").focused();
    h.pattern
        .set_selection(1, 4, SelectionOptions::default(), true)
        .unwrap();
    typed(&mut h, "X");
    assert_eq!(h.text(), "hXo");

    assert!(h.pattern.handle_on_undo_action());
    assert_eq!(h.text(), "hello");
    assert_eq!(h.pattern.selection(), (1, 4));
    assert_eq!(h.pattern.caret_index(), 4);
}

#[test]
fn programmatic_set_is_not_undoable() {
    let mut h = harness().focused();
    typed(&mut h, "ab");
    h.pattern.set_text_value("replaced");
    assert_eq!(h.pattern.undo_depth(), 1);
    assert!(h.pattern.handle_on_undo_action());
    assert_eq!(h.text(), "");
}

#[test]
fn cursor_moves_record_the_caret_once_per_run() {
    let mut h = harness().focused();
    typed(&mut h, "abc");
    h.pattern.cursor_left();
    h.pattern.cursor_left();
    h.layout();
    assert_eq!(h.pattern.caret_index(), 1);
    assert_eq!(h.pattern.undo_depth(), 2);

    assert!(h.pattern.handle_on_undo_action());
    assert_eq!(h.text(), "abc");
    assert_eq!(h.pattern.caret_index(), 3);

    assert!(h.pattern.handle_on_undo_action());
    assert_eq!(h.text(), "");

    assert!(h.pattern.handle_on_redo_action());
    assert_eq!(h.text(), "abc");
    assert_eq!(h.pattern.caret_index(), 3);
}

#[test]
fn edit_after_moving_restores_the_moved_caret_first() {
    let mut h = harness().focused();
    typed(&mut h, "abc");
    h.pattern.cursor_left();
    typed(&mut h, "X");
    assert_eq!(h.text(), "abXc");

    assert!(h.pattern.handle_on_undo_action());
    assert_eq!(h.text(), "abc");
    assert_eq!(h.pattern.caret_index(), 2);
    assert!(h.pattern.handle_on_undo_action());
    assert_eq!(h.pattern.caret_index(), 3);
}

#[test]
fn blocked_cursor_move_records_nothing() {
    let mut h = harness().with_text("abc").focused();
    h.pattern.cursor_right();
    h.layout();
    assert_eq!(h.pattern.caret_index(), 3);
    assert_eq!(h.pattern.undo_depth(), 0);
}
