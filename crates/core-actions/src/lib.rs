//! Text field editing pattern.
//!
//! [`TextFieldPattern`] is the state machine behind one editable text field:
//! focus and keyboard negotiation, gesture driven selection, the deferred
//! operation queue, preview text, undo/redo, clipboard, drag and drop and
//! accessibility actions. It owns the content and selection controllers from
//! `core-state` and talks to its collaborators through [`bridge::Services`].
//!
//! Host contract (single UI thread):
//! * input arrives through the `handle_*` methods and the public editing API;
//! * when [`DirtyFlags::MEASURE`] is set the host calls
//!   [`TextFieldPattern::before_create_layout_wrapper`] followed by
//!   [`TextFieldPattern::on_dirty_layout_wrapper_swap`] (or
//!   [`TextFieldPattern::run_layout_pass`] which does both);
//! * tasks posted to the scheduler are handed back through
//!   [`TextFieldPattern::run_task`] when due.

pub mod bridge;
pub mod pattern;
pub mod task;

pub use bridge::{
    AttachReply, Clipboard, CursorInfo, CustomKeyboard, DeleteDirection, DeleteValueInfo, ImeBridge, ImeConfig,
    ImeError, InsertValueInfo, Services, TextFieldEventHub, TextFieldObserver,
};
pub use pattern::{
    AccessibilityAction, DirtyFlags, GestureState, KeyboardState, MenuPolicy, PatternDump,
    RequestFocusReason, ResponseArea, SelectOverlay, SelectionOptions, TextFieldPattern,
    TextMoveUnit, auto_scroll_speed,
};
pub use task::PatternTask;
