//! Editing state of a single text field.
//!
//! Ownership:
//! - [`ContentController`] owns the UTF-16 text and the input filter. It is
//!   the only writer of the text.
//! - [`TextSelectController`] owns caret and selection indices plus their
//!   derived rects, and the current paragraph. It is the only reader of
//!   paragraph hit-testing and caret metrics.
//! - [`OperationQueue`] holds edits waiting for the next layout pre-pass.
//! - [`UndoManager`] keeps the bounded undo/redo history.
//! - [`PreviewTextState`] tracks an active IME composition.
//!
//! Nothing here is shared between fields and nothing is thread safe; all of
//! it lives on the UI thread inside the pattern that owns it.
//!
//! Ordering contract: after any content mutation the selection controller is
//! told the new length (`on_content_changed`) in the same pass, and geometry
//! is only refreshed once a paragraph for the new content version has been
//! installed (`set_paragraph`). Rects read in between are stale by
//! construction and the pattern never publishes them.

pub mod content;
pub mod error;
pub mod operation;
pub mod preview;
pub mod selection;
pub mod undo;

pub use content::{ContentController, InsertOutcome};
pub use error::{EditError, EditResult};
pub use operation::{
    DeleteCommand, EditSource, InputOperation, InsertCommand, OperationQueue, PreviewCommand,
    QueuedOperation,
};
pub use preview::{PreviewRange, PreviewTextState};
pub use selection::{CaretInfo, HandleInfo, TextSelectController};
pub use undo::{MAX_OPERATION_RECORDS, OperationRecord, UndoManager};
