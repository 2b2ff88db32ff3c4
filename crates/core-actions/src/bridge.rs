//! Collaborators the pattern talks to: input method, custom keyboard,
//! clipboard and application listeners.
//!
//! All of them are injected through [`Services`] when the pattern is built.
//! A missing service degrades only the feature that needs it.

use core_config::{CopyOptions, EnterKeyType};
use core_paragraph::Rect;
use core_state::PreviewRange;
use core_text::TextInputType;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImeError {
    #[error("input method service is not bound")]
    NotBound,
    #[error("input method attach failed with code {0}")]
    Code(i32),
}

/// Snapshot pushed to the input method on attach.
#[derive(Debug, Clone, PartialEq)]
pub struct ImeConfig {
    pub input_type: TextInputType,
    pub enter_key: EnterKeyType,
    pub cursor_rect: Rect,
    pub selection_start: usize,
    pub selection_end: usize,
    /// Custom filter pattern, if one is configured.
    pub input_pattern: Option<String>,
    pub window_id: u32,
    /// Echoed back through `TextFieldPattern::on_ime_attach_result`.
    pub request: u64,
}

/// How the bridge answered an attach request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachReply {
    /// Bound before `attach` returned.
    Confirmed,
    /// The outcome arrives later through `TextFieldPattern::on_ime_attach_result`.
    Pending,
}

/// Caret geometry pushed after every layout pass that moved it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorInfo {
    pub rect: Rect,
}

pub trait ImeBridge {
    /// Bind the field to the system input method. `Err` refuses the request
    /// outright; `Ok(Pending)` defers the outcome to a later result call.
    fn attach(&mut self, config: &ImeConfig, show_keyboard: bool) -> Result<AttachReply, ImeError>;
    fn close(&mut self);
    fn on_cursor_update(&mut self, info: &CursorInfo);
    fn on_selection_change(&mut self, text: &str, start: usize, end: usize);
}

pub trait CustomKeyboard {
    /// Show the overlay. Returns false when it could not be bound.
    fn attach(&mut self) -> bool;
    fn close(&mut self);
}

pub trait Clipboard {
    fn get_data(&self) -> Option<String>;
    fn set_data(&mut self, text: &str, options: CopyOptions);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertValueInfo {
    pub insert_offset: usize,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDirection {
    Backward,
    Forward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteValueInfo {
    pub delete_offset: usize,
    pub direction: DeleteDirection,
    pub value: String,
}

/// Application listener. Every method has a no-op default; `on_will_*`
/// return false to veto the edit.
pub trait TextFieldObserver {
    fn on_will_insert(&self, _info: &InsertValueInfo) -> bool {
        true
    }
    fn on_did_insert(&self, _info: &InsertValueInfo) {}
    fn on_will_delete(&self, _info: &DeleteValueInfo) -> bool {
        true
    }
    fn on_did_delete(&self, _info: &DeleteValueInfo) {}
    fn on_change(&self, _text: &str, _preview: PreviewRange) {}
    fn on_selection_change(&self, _start: usize, _end: usize) {}
    fn on_input_filter_error(&self, _rejected: &str) {}
    fn on_submit(&self, _enter_key: EnterKeyType, _text: &str) {}
    fn on_edit_change(&self, _editing: bool) {}
}

/// Fan-out over registered observers.
#[derive(Default)]
pub struct TextFieldEventHub {
    observers: Vec<Box<dyn TextFieldObserver>>,
}

impl TextFieldEventHub {
    pub fn add_observer(&mut self, observer: Box<dyn TextFieldObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Every observer is asked; any refusal vetoes.
    pub fn fire_will_insert(&self, info: &InsertValueInfo) -> bool {
        self.observers
            .iter()
            .fold(true, |ok, o| o.on_will_insert(info) && ok)
    }

    pub fn fire_did_insert(&self, info: &InsertValueInfo) {
        self.observers.iter().for_each(|o| o.on_did_insert(info));
    }

    pub fn fire_will_delete(&self, info: &DeleteValueInfo) -> bool {
        self.observers
            .iter()
            .fold(true, |ok, o| o.on_will_delete(info) && ok)
    }

    pub fn fire_did_delete(&self, info: &DeleteValueInfo) {
        self.observers.iter().for_each(|o| o.on_did_delete(info));
    }

    pub fn fire_change(&self, text: &str, preview: PreviewRange) {
        self.observers.iter().for_each(|o| o.on_change(text, preview));
    }

    pub fn fire_selection_change(&self, start: usize, end: usize) {
        self.observers
            .iter()
            .for_each(|o| o.on_selection_change(start, end));
    }

    pub fn fire_input_filter_error(&self, rejected: &str) {
        self.observers
            .iter()
            .for_each(|o| o.on_input_filter_error(rejected));
    }

    pub fn fire_submit(&self, enter_key: EnterKeyType, text: &str) {
        self.observers
            .iter()
            .for_each(|o| o.on_submit(enter_key, text));
    }

    pub fn fire_edit_change(&self, editing: bool) {
        self.observers.iter().for_each(|o| o.on_edit_change(editing));
    }
}

/// Explicitly constructed collaborators of one text field.
#[derive(Default)]
pub struct Services {
    pub ime: Option<Box<dyn ImeBridge>>,
    pub custom_keyboard: Option<Box<dyn CustomKeyboard>>,
    pub clipboard: Option<Box<dyn Clipboard>>,
    pub events: TextFieldEventHub,
    pub window_id: u32,
}

impl Services {
    pub fn with_ime(mut self, ime: Box<dyn ImeBridge>) -> Self {
        self.ime = Some(ime);
        self
    }

    pub fn with_custom_keyboard(mut self, keyboard: Box<dyn CustomKeyboard>) -> Self {
        self.custom_keyboard = Some(keyboard);
        self
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn TextFieldObserver>) -> Self {
        self.events.add_observer(observer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Veto(Rc<Cell<u32>>);
    impl TextFieldObserver for Veto {
        fn on_will_insert(&self, _info: &InsertValueInfo) -> bool {
            self.0.set(self.0.get() + 1);
            false
        }
    }

    struct Count(Rc<Cell<u32>>);
    impl TextFieldObserver for Count {
        fn on_will_insert(&self, _info: &InsertValueInfo) -> bool {
            self.0.set(self.0.get() + 1);
            true
        }
    }

    #[test]
    fn any_refusal_vetoes_but_all_are_asked() {
        let asked = Rc::new(Cell::new(0));
        let mut hub = TextFieldEventHub::default();
        hub.add_observer(Box::new(Veto(asked.clone())));
        hub.add_observer(Box::new(Count(asked.clone())));
        let info = InsertValueInfo {
            insert_offset: 0,
            value: "a".into(),
        };
        assert!(!hub.fire_will_insert(&info));
        assert_eq!(asked.get(), 2);
    }

    #[test]
    fn empty_hub_approves() {
        let hub = TextFieldEventHub::default();
        assert!(hub.is_empty());
        assert!(hub.fire_will_delete(&DeleteValueInfo {
            delete_offset: 0,
            direction: DeleteDirection::Backward,
            value: String::new(),
        }));
    }
}
