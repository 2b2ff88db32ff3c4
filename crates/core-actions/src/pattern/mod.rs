//! `TextFieldPattern` and its lifecycle hooks.
//!
//! The pattern is split by concern:
//! * `operations` - public editing API, queue apply, undo/redo
//! * `preview`    - IME composition text
//! * `keyboard`   - focus, blur and the keyboard attach protocol
//! * `gesture`    - touch / mouse state machine, drag and drop
//! * `scroll`     - hot-edge auto-scroll
//! * `clipboard`  - copy / cut / paste / select-all and the select overlay
//! * `obscure`    - password masking, naked character reveal, response area
//! * `key_event`  - hardware key handling
//! * `accessibility` - accessibility actions routed to the public API
//!
//! Geometry is only refreshed in [`TextFieldPattern::on_dirty_layout_wrapper_swap`]
//! (or when an operation explicitly needs a fresh paragraph), after the
//! content mutation it depends on has completed. The IME and selection
//! listeners are informed at the end of that hook, never mid-batch.

mod accessibility;
mod clipboard;
mod gesture;
mod key_event;
mod keyboard;
mod obscure;
mod operations;
mod preview;
mod scroll;

pub use accessibility::{AccessibilityAction, TextMoveUnit};
pub use clipboard::SelectOverlay;
pub use gesture::GestureState;
pub use keyboard::{KeyboardState, RequestFocusReason};
pub use obscure::ResponseArea;
pub use operations::{MenuPolicy, SelectionOptions};
pub use scroll::auto_scroll_speed;

use crate::bridge::Services;
use crate::task::PatternTask;
use core_config::{Config, ViewportContext};
use core_events::{TaskScheduler, TaskType, TimerSlot};
use core_paragraph::{ParagraphFactory, ParagraphStyle, Rect};
use core_state::{
    ContentController, EditError, EditResult, OperationQueue, OperationRecord, PreviewRange,
    PreviewTextState, TextSelectController, UndoManager,
};
use core_text::InputFilter;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, trace, warn};

bitflags::bitflags! {
    /// What the host has to redo for this field.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct DirtyFlags: u8 {
        const MEASURE = 0b0000_0001;
        const RENDER  = 0b0000_0010;
    }
}

/// Diagnostic snapshot of a pattern. Carries lengths and indices only.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternDump {
    pub text_len: usize,
    pub caret: usize,
    pub selection: (usize, usize),
    pub preview: PreviewRange,
    pub has_focus: bool,
    pub keyboard: KeyboardState,
    pub ime_shown: bool,
    pub queue_depth: usize,
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub gesture: GestureState,
    pub caret_visible: bool,
    pub show_count_border_style: bool,
    pub scroll_offset: (f32, f32),
}

pub struct TextFieldPattern {
    config: Config,
    content: ContentController,
    select: TextSelectController,
    queue: OperationQueue,
    undo: UndoManager,
    preview: PreviewTextState,
    services: Services,
    scheduler: Rc<dyn TaskScheduler<PatternTask>>,
    paragraph_factory: Box<dyn ParagraphFactory>,
    frame_rect: Rect,
    attached: bool,

    has_focus: bool,
    /// Bumped on every focus change; follow-up tasks carry the value they
    /// were posted under.
    focus_generation: u64,
    editing: bool,
    keyboard: KeyboardState,
    ime_shown: bool,
    need_to_request_keyboard_inner: bool,
    pending_ime_update: bool,

    gesture: gesture::GestureTracker,
    auto_scroll: scroll::AutoScrollState,
    twinkle: TimerSlot,
    caret_visible: bool,
    obscure: obscure::ObscureState,
    response_area: ResponseArea,
    overlay: SelectOverlay,

    dirty: DirtyFlags,
    caret_scroll_pending: bool,
    show_count_border_style: bool,
    last_selection: (usize, usize),
    /// Caret left by the last recorded run of cursor moves.
    caret_move_run: Option<usize>,
}

impl TextFieldPattern {
    pub fn new(
        config: Config,
        services: Services,
        scheduler: Rc<dyn TaskScheduler<PatternTask>>,
        paragraph_factory: Box<dyn ParagraphFactory>,
    ) -> Self {
        let caret_width = config.file.caret.width;
        let mut pattern = Self {
            config,
            content: ContentController::default(),
            select: TextSelectController::new(caret_width),
            queue: OperationQueue::new(),
            undo: UndoManager::new(),
            preview: PreviewTextState::default(),
            services,
            scheduler,
            paragraph_factory,
            frame_rect: Rect::default(),
            attached: false,
            has_focus: false,
            focus_generation: 0,
            editing: false,
            keyboard: KeyboardState::Detached,
            ime_shown: false,
            need_to_request_keyboard_inner: false,
            pending_ime_update: false,
            gesture: gesture::GestureTracker::default(),
            auto_scroll: scroll::AutoScrollState::default(),
            twinkle: TimerSlot::default(),
            caret_visible: false,
            obscure: obscure::ObscureState::default(),
            response_area: ResponseArea::None,
            overlay: SelectOverlay::default(),
            dirty: DirtyFlags::empty(),
            caret_scroll_pending: false,
            show_count_border_style: false,
            last_selection: (0, 0),
            caret_move_run: None,
        };
        pattern.on_modify_done();
        pattern
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    pub fn on_attach_context(&mut self) {
        self.attached = true;
        self.dirty |= DirtyFlags::MEASURE | DirtyFlags::RENDER;
        debug!(target: "actions.pattern", "attach_context");
    }

    /// Tear down: keyboard closed, timers cancelled. Later calls into the
    /// public API are ignored or fail with [`EditError::Detached`].
    pub fn on_detach_context(&mut self) {
        if !self.attached {
            return;
        }
        self.close_keyboard(true, true);
        self.gesture.cancel_timers();
        self.stop_auto_scroll();
        self.obscure.conceal();
        self.has_focus = false;
        self.focus_generation += 1;
        self.attached = false;
        debug!(target: "actions.pattern", "detach_context");
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Re-apply configuration: filter, line mode, caret width, response area.
    pub fn on_modify_done(&mut self) {
        let field = self.config.file.field.clone();
        let mut filter = InputFilter::new(field.input_type).with_max_length(field.max_length);
        if let Some(pattern) = field.input_filter.as_deref() {
            match filter.clone().with_pattern(pattern) {
                Ok(f) => filter = f,
                Err(e) => {
                    warn!(target: "actions.pattern", error = %e, "input_filter_pattern_invalid")
                }
            }
        }
        self.content.set_filter(filter);
        self.select.set_multiline(field.is_multiline());
        self.select.set_caret_width(self.config.file.caret.width);
        self.response_area = ResponseArea::from_config(&field, &self.response_area);
        if self.content.filter_value() {
            self.after_content_change();
            self.on_selection_updated();
        }
        self.dirty |= DirtyFlags::MEASURE | DirtyFlags::RENDER;
        debug!(target: "actions.pattern", input_type = ?field.input_type, multiline = field.is_multiline(), "modify_done");
    }

    /// Replace the configuration and re-apply it.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
        self.on_modify_done();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_frame_rect(&mut self, rect: Rect) {
        if self.frame_rect != rect {
            self.frame_rect = rect;
            self.dirty |= DirtyFlags::MEASURE;
        }
    }

    /// Layout pre-pass: drain the operation queue in FIFO order.
    /// Returns whether anything was applied; an empty queue touches nothing.
    pub fn before_create_layout_wrapper(&mut self) -> bool {
        if self.queue.is_empty() {
            return false;
        }
        let mut applied = 0usize;
        while let Some(item) = self.queue.pop_front() {
            trace!(target: "state.queue", seq = item.seq, op = item.op.name(), "apply");
            self.apply_operation(item.op);
            applied += 1;
        }
        trace!(target: "state.queue", applied, "drained");
        self.dirty |= DirtyFlags::MEASURE;
        true
    }

    /// Post-layout hook: rebuild the paragraph for the current content,
    /// refresh geometry, keep the caret visible and publish the new state.
    pub fn on_dirty_layout_wrapper_swap(&mut self) {
        self.refresh_content_rect();
        self.rebuild_paragraph();
        self.select.calculate_handle_offset();
        if self.caret_scroll_pending {
            self.caret_scroll_pending = false;
            let caret = self.select.caret_info();
            self.select.scroll_to_index(caret.index, caret.affinity);
            self.select.calculate_handle_offset();
        }
        self.notify_ime_update();
        self.notify_selection_change();
        self.dirty.remove(DirtyFlags::MEASURE);
        self.dirty |= DirtyFlags::RENDER;
    }

    /// Both layout hooks back to back. Returns the dirty flags accumulated
    /// up to and including this pass and clears them.
    pub fn run_layout_pass(&mut self) -> DirtyFlags {
        self.before_create_layout_wrapper();
        self.on_dirty_layout_wrapper_swap();
        self.take_dirty()
    }

    /// Drain pending operations now so an immediate edit keeps FIFO order
    /// with input that is already queued.
    pub(crate) fn flush_pending_operations(&mut self) {
        self.before_create_layout_wrapper();
    }

    pub fn run_task(&mut self, task: PatternTask) {
        if !self.attached {
            trace!(target: "actions.pattern", task = task.label(), "task_after_detach_dropped");
            return;
        }
        match task {
            PatternTask::CaretTwinkle { generation } => self.on_caret_twinkle(generation),
            PatternTask::LongPress {
                generation,
                position,
            } => self.on_long_press_timer(generation, position),
            PatternTask::AutoScroll { generation } => self.on_auto_scroll_tick(generation),
            PatternTask::ImeAttached { focus_generation } => self.on_ime_attached(focus_generation),
            PatternTask::ObscureMask { generation } => self.on_obscure_mask(generation),
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn text(&self) -> String {
        self.content.text()
    }

    pub fn text_len(&self) -> usize {
        self.content.len()
    }

    pub fn caret_index(&self) -> usize {
        self.select.caret_index()
    }

    pub fn caret_rect(&self) -> Rect {
        self.select.caret_rect()
    }

    pub fn selection(&self) -> (usize, usize) {
        (self.select.start(), self.select.end())
    }

    pub fn is_selected(&self) -> bool {
        self.select.is_selected()
    }

    pub fn is_selected_all(&self) -> bool {
        self.select.is_selected_all()
    }

    pub fn selected_rects(&self) -> Vec<Rect> {
        self.select.selected_rects()
    }

    pub fn content_rect(&self) -> Rect {
        self.select.content_rect()
    }

    pub fn scroll_offset(&self) -> core_paragraph::Offset {
        self.select.scroll_offset()
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn take_dirty(&mut self) -> DirtyFlags {
        std::mem::take(&mut self.dirty)
    }

    pub fn caret_visible(&self) -> bool {
        self.caret_visible
    }

    pub fn is_twinkling(&self) -> bool {
        self.twinkle.is_armed()
    }

    pub fn show_count_border_style(&self) -> bool {
        self.show_count_border_style
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.undo.redo_depth()
    }

    pub fn dump(&self) -> PatternDump {
        let offset = self.select.scroll_offset();
        PatternDump {
            text_len: self.content.len(),
            caret: self.select.caret_index(),
            selection: self.selection(),
            preview: self.preview.public_range(),
            has_focus: self.has_focus,
            keyboard: self.keyboard,
            ime_shown: self.ime_shown,
            queue_depth: self.queue.len(),
            undo_depth: self.undo.undo_depth(),
            redo_depth: self.undo.redo_depth(),
            gesture: self.gesture.state,
            caret_visible: self.caret_visible,
            show_count_border_style: self.show_count_border_style,
            scroll_offset: (offset.x, offset.y),
        }
    }

    // ---------------------------------------------------------------------
    // Shared helpers
    // ---------------------------------------------------------------------

    pub(crate) fn ensure_attached(&self) -> EditResult<()> {
        if self.attached {
            Ok(())
        } else {
            Err(EditError::Detached)
        }
    }

    pub(crate) fn post(&self, task: PatternTask, delay: Duration) {
        self.scheduler
            .post_task(task, TaskType::Ui, delay, task.label());
    }

    pub(crate) fn paragraph_style(&self) -> ParagraphStyle {
        ParagraphStyle {
            font_size: self.config.file.field.font_size,
            multiline: self.config.file.field.is_multiline(),
        }
    }

    fn refresh_content_rect(&mut self) {
        let reserved = self.response_area_width().min(self.frame_rect.width);
        let rect = Rect::new(
            self.frame_rect.x,
            self.frame_rect.y,
            self.frame_rect.width - reserved,
            self.frame_rect.height,
        );
        if rect != self.select.content_rect() {
            self.select.set_content_rect(rect);
            let extent = if self.config.file.field.is_multiline() {
                rect.height
            } else {
                rect.width
            };
            self.config.recompute_with_context(ViewportContext::new(extent));
        }
    }

    fn rebuild_paragraph(&mut self) {
        let text = self.display_text();
        let style = self.paragraph_style();
        let mut paragraph = self.paragraph_factory.create(&text, &style);
        let width = if style.multiline {
            self.select.content_rect().width
        } else {
            f32::INFINITY
        };
        paragraph.layout(width);
        self.select.set_paragraph(paragraph, self.content.version());
        trace!(target: "actions.pattern", version = self.content.version(), lines = self.select.paragraph().map(|p| p.line_count()).unwrap_or(0), "paragraph_rebuilt");
    }

    pub(crate) fn paragraph_is_fresh(&self) -> bool {
        self.select.paragraph_version() == Some(self.content.version())
    }

    /// Rebuild the paragraph if it was built from an older content version.
    pub(crate) fn ensure_paragraph(&mut self) {
        if !self.paragraph_is_fresh() {
            self.refresh_content_rect();
            self.rebuild_paragraph();
        }
    }

    /// Caret-mode placement: with a fresh paragraph the viewport follows
    /// immediately, otherwise on the next layout pass.
    pub(crate) fn move_caret(&mut self, index: usize, affinity: core_paragraph::TextAffinity) {
        let index = self.content.snap(index);
        if self.paragraph_is_fresh() {
            self.select
                .move_caret_to_content_rect(index, affinity, true, true);
        } else {
            self.select.update_caret_index(index);
            self.caret_scroll_pending = true;
        }
        self.on_selection_updated();
    }

    pub(crate) fn snapshot_record(&self) -> OperationRecord {
        let caret = self.select.caret_index();
        let anchor = if !self.select.is_selected() {
            caret
        } else if self.select.second_handle().index == caret {
            self.select.first_handle().index
        } else {
            self.select.second_handle().index
        };
        OperationRecord::new(self.content.text(), caret, anchor)
    }

    pub(crate) fn restore_record(&mut self, record: &OperationRecord) {
        self.content.set_text_value(&record.text);
        self.after_content_change();
        if record.has_selection() {
            self.select
                .update_handle_index(record.anchor_position, record.caret_position);
        } else {
            self.select.update_caret_index(record.caret_position);
        }
        self.on_selection_updated();
    }

    /// Bookkeeping after every content mutation.
    pub(crate) fn after_content_change(&mut self) {
        let len = self.content.len();
        self.caret_move_run = None;
        self.select.on_content_changed(len);
        if self.preview.is_active() && (len == 0 || !self.preview.clamp_to(len)) {
            self.preview.finish();
            debug!(target: "actions.pattern", "preview_force_finished_on_empty");
        }
        if let Some(max) = self.content.max_length()
            && len < max
        {
            self.show_count_border_style = false;
        }
        self.obscure.conceal();
        self.dirty |= DirtyFlags::MEASURE | DirtyFlags::RENDER;
        self.pending_ime_update = true;
        self.caret_scroll_pending = true;
        self.services
            .events
            .fire_change(&self.content.text(), self.preview.public_range());
    }

    /// Bookkeeping after every caret or selection change.
    pub(crate) fn on_selection_updated(&mut self) {
        self.dirty |= DirtyFlags::RENDER;
        self.pending_ime_update = true;
        if self.paragraph_is_fresh() {
            self.select.calculate_handle_offset();
        }
        if !self.select.is_selected() && self.gesture.state.is_selection() {
            self.gesture.state = GestureState::Caret;
        }
        if self.select.is_selected() {
            self.stop_twinkling();
        } else if self.has_focus {
            self.start_twinkling();
        }
    }

    fn notify_selection_change(&mut self) {
        let current = self.selection();
        if current != self.last_selection {
            self.last_selection = current;
            self.services
                .events
                .fire_selection_change(current.0, current.1);
        }
    }

    // ---------------------------------------------------------------------
    // Caret twinkle
    // ---------------------------------------------------------------------

    pub(crate) fn start_twinkling(&mut self) {
        if !self.has_focus || self.select.is_selected() {
            return;
        }
        self.caret_visible = true;
        let generation = self.twinkle.arm();
        self.post(
            PatternTask::CaretTwinkle { generation },
            self.config.file.caret.twinkle_interval(),
        );
    }

    pub(crate) fn stop_twinkling(&mut self) {
        self.twinkle.cancel();
        if self.caret_visible {
            self.caret_visible = false;
            self.dirty |= DirtyFlags::RENDER;
        }
    }

    fn on_caret_twinkle(&mut self, generation: u64) {
        if !self.twinkle.fire(generation) {
            trace!(target: "actions.pattern", generation, "stale_twinkle_dropped");
            return;
        }
        self.caret_visible = !self.caret_visible;
        self.dirty |= DirtyFlags::RENDER;
        let next = self.twinkle.arm();
        self.post(
            PatternTask::CaretTwinkle { generation: next },
            self.config.file.caret.twinkle_interval(),
        );
    }
}
