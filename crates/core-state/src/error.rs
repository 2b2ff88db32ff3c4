use thiserror::Error;

/// Failure modes of an editing operation.
///
/// Boundary problems (indices past the end, deleting past the start) are
/// clamped silently and never show up here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("bad parameters")]
    BadParameters,
    #[error("input rejected by the active filter")]
    Rejected,
    #[error("edit vetoed by a listener")]
    Vetoed,
    #[error("not allowed while preview text is active")]
    PreviewActive,
    #[error("text field is not focused")]
    NotFocused,
    #[error("keyboard is disabled on focus")]
    KeyboardDisabled,
    #[error("input method unavailable")]
    ImeUnavailable,
    #[error("clipboard unavailable")]
    ClipboardUnavailable,
    #[error("nothing selected")]
    NothingSelected,
    #[error("text field is detached")]
    Detached,
}

pub type EditResult<T> = Result<T, EditError>;
