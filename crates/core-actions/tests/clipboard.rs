mod common;
use common::*;

use core_actions::{PatternTask, SelectionOptions, Services, TextFieldPattern};
use core_config::{Config, CopyOptions};
use core_events::{KeyEvent, ManualScheduler};
use core_paragraph::MonospaceParagraphFactory;
use core_state::EditError;
use core_text::TextInputType;
use pretty_assertions::assert_eq;
use std::rc::Rc;

fn select(h: &mut Harness, start: usize, end: usize) {
    h.pattern
        .set_selection(start, end, SelectionOptions::default(), true)
        .unwrap();
}

#[test]
fn copy_puts_selection_on_clipboard() {
    let mut h = harness().with_text("hello world").focused();
    select(&mut h, 0, 5);
    assert_eq!(h.pattern.copy(), Ok(true));
    assert_eq!(h.clipboard.contents().as_deref(), Some("hello"));
    assert_eq!(h.clipboard.last_options.get(), Some(CopyOptions::Local));
    assert_eq!(h.text(), "hello world");
}

#[test]
fn copy_needs_a_selection() {
    let mut h = harness().with_text("hello").focused();
    assert_eq!(h.pattern.copy(), Err(EditError::NothingSelected));
    assert_eq!(h.clipboard.contents(), None);
}

#[test]
fn password_text_never_leaves_the_field() {
    let mut h = harness_with(|f| f.input_type = TextInputType::Password)
        .with_text("secret")
        .focused();
    select(&mut h, 0, 6);
    assert_eq!(h.pattern.copy(), Ok(false));
    assert_eq!(h.pattern.cut(), Ok(false));
    assert_eq!(h.clipboard.contents(), None);
    assert_eq!(h.text(), "secret");
}

#[test]
fn copy_options_none_disables_copy() {
    let mut h = harness_with(|f| f.copy_options = CopyOptions::None)
        .with_text("hello")
        .focused();
    select(&mut h, 0, 2);
    assert_eq!(h.pattern.copy(), Ok(false));
    assert_eq!(h.clipboard.contents(), None);
}

#[test]
fn cut_is_one_undoable_edit() {
    let mut h = harness().with_text("hello world").focused();
    select(&mut h, 6, 11);
    assert_eq!(h.pattern.cut(), Ok(true));
    assert_eq!(h.text(), "hello ");
    assert_eq!(h.pattern.caret_index(), 6);
    assert_eq!(h.clipboard.contents().as_deref(), Some("world"));

    assert!(h.pattern.handle_on_undo_action());
    assert_eq!(h.text(), "hello world");
}

#[test]
fn paste_goes_through_the_queue() {
    let mut h = harness().with_text("ab").focused();
    h.clipboard.put("XY");
    assert_eq!(h.pattern.paste(), Ok(true));
    assert_eq!(h.pattern.queue_len(), 1);
    assert_eq!(h.text(), "ab");
    h.layout();
    assert_eq!(h.text(), "abXY");
    assert_eq!(h.pattern.caret_index(), 4);
}

#[test]
fn paste_replaces_selection() {
    let mut h = harness().with_text("hello").focused();
    h.clipboard.put("J");
    select(&mut h, 0, 1);
    h.pattern.paste().unwrap();
    h.layout();
    assert_eq!(h.text(), "Jello");
}

#[test]
fn empty_clipboard_pastes_nothing() {
    let mut h = harness().with_text("ab").focused();
    assert_eq!(h.pattern.paste(), Ok(false));
    assert_eq!(h.pattern.queue_len(), 0);
}

#[test]
fn pasted_text_is_filtered() {
    let mut h = harness_with(|f| f.input_type = TextInputType::Number).focused();
    h.clipboard.put("1ab2");
    h.pattern.paste().unwrap();
    h.layout();
    assert_eq!(h.text(), "12");
    assert_eq!(
        h.recorder.count(|e| *e == Event::FilterError("ab".into())),
        1
    );
}

#[test]
fn missing_clipboard_is_reported() {
    let scheduler: Rc<ManualScheduler<PatternTask>> = Rc::new(ManualScheduler::new());
    let factory = MonospaceParagraphFactory {
        advance: ADVANCE,
        line_height: LINE_HEIGHT,
    };
    let mut pattern =
        TextFieldPattern::new(Config::default(), Services::default(), scheduler, Box::new(factory));
    pattern.set_frame_rect(FRAME);
    pattern.on_attach_context();
    pattern.set_text_value("abc");
    pattern.run_layout_pass();

    assert_eq!(pattern.paste(), Err(EditError::ClipboardUnavailable));
    pattern
        .set_selection(0, 3, SelectionOptions::default(), true)
        .unwrap();
    assert_eq!(pattern.copy(), Err(EditError::ClipboardUnavailable));
}

#[test]
fn shortcuts_drive_the_clipboard() {
    let mut h = harness().with_text("abc").focused();
    assert!(h.pattern.handle_key_event(&KeyEvent::ctrl('a')));
    assert!(h.pattern.is_selected_all());
    assert!(h.pattern.overlay().menu_shown);

    assert!(h.pattern.handle_key_event(&KeyEvent::ctrl('c')));
    assert_eq!(h.clipboard.contents().as_deref(), Some("abc"));

    assert!(h.pattern.handle_key_event(&KeyEvent::ctrl('x')));
    assert_eq!(h.text(), "");

    assert!(h.pattern.handle_key_event(&KeyEvent::ctrl('v')));
    assert!(h.pattern.handle_key_event(&KeyEvent::ctrl('v')));
    h.layout();
    assert_eq!(h.text(), "abcabc");
}

#[test]
fn select_all_on_empty_text_is_ignored() {
    let mut h = harness().focused();
    h.pattern.select_all();
    assert!(!h.pattern.is_selected());
    assert!(!h.pattern.overlay().is_shown());
}
