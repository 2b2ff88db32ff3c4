//! Deferred work posted by the pattern.
//!
//! A task is a plain value; the owner of the pattern receives it from the
//! scheduler and hands it back through `TextFieldPattern::run_task`. Every
//! variant carries the generation it was armed with and is dropped when that
//! generation is no longer current.

use core_paragraph::Offset;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatternTask {
    CaretTwinkle { generation: u64 },
    LongPress { generation: u64, position: Offset },
    AutoScroll { generation: u64 },
    /// Follow-up of an attach the bridge confirmed at once; gated on the focus generation.
    ImeAttached { focus_generation: u64 },
    ObscureMask { generation: u64 },
}

impl PatternTask {
    pub fn label(&self) -> &'static str {
        match self {
            PatternTask::CaretTwinkle { .. } => "caret_twinkle",
            PatternTask::LongPress { .. } => "long_press",
            PatternTask::AutoScroll { .. } => "auto_scroll",
            PatternTask::ImeAttached { .. } => "ime_attached",
            PatternTask::ObscureMask { .. } => "obscure_mask",
        }
    }
}
