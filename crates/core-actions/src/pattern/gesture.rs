//! Touch, stylus and mouse gestures mapped onto caret and selection changes,
//! plus drag and drop of the selected text.

use super::keyboard::RequestFocusReason;
use super::{DirtyFlags, TextFieldPattern};
use crate::task::PatternTask;
use core_events::{
    InputEvent, InputSource, KeyModifiers, MouseAction, MouseButton, MouseEvent, TimerSlot,
    TouchEvent, TouchPhase,
};
use core_paragraph::{Offset, TextAffinity};
use core_state::{EditSource, InsertCommand};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Caret,
    WordSelect,
    ParagraphSelect,
    Selected,
    /// Pointer-driven selection anchored at `anchor`.
    GestureSelecting { anchor: usize, source: InputSource },
    /// Long press (or press) inside the selection; a move beyond the drag
    /// slop starts a drag.
    DragArmed { origin: Offset },
    /// Moving `[start,end)`; `version` is the content version the range was
    /// read under.
    Dragging {
        start: usize,
        end: usize,
        drop_index: usize,
        version: u64,
    },
}

impl GestureState {
    pub(crate) fn is_selection(self) -> bool {
        matches!(
            self,
            GestureState::WordSelect | GestureState::ParagraphSelect | GestureState::Selected
        )
    }
}

/// Counts consecutive clicks that land close together in time and space.
/// Wraps back to a single click after a triple.
#[derive(Debug, Default)]
struct ClickCounter {
    last: Option<(Instant, Offset)>,
    count: u8,
}

impl ClickCounter {
    fn register(&mut self, at: Instant, position: Offset, interval: Duration, slop: f32) -> u8 {
        let repeated = self.last.is_some_and(|(t, p)| {
            at.saturating_duration_since(t) <= interval && p.distance(position) <= slop
        });
        self.count = if repeated && self.count < 3 {
            self.count + 1
        } else {
            1
        };
        self.last = Some((at, position));
        self.count
    }

    fn reset(&mut self) {
        self.last = None;
        self.count = 0;
    }
}

#[derive(Debug, Clone, Copy)]
struct PointerDown {
    position: Offset,
    clicks: u8,
    /// Focus was already held before this press.
    was_focused: bool,
    moved: bool,
}

#[derive(Debug, Default)]
pub(crate) struct GestureTracker {
    pub(crate) state: GestureState,
    clicks: ClickCounter,
    long_press: TimerSlot,
    down: Option<PointerDown>,
    mouse_pressed: bool,
}

impl GestureTracker {
    pub(crate) fn cancel_timers(&mut self) {
        self.long_press.cancel();
        self.down = None;
        self.mouse_pressed = false;
        if matches!(
            self.state,
            GestureState::GestureSelecting { .. }
                | GestureState::DragArmed { .. }
                | GestureState::Dragging { .. }
        ) {
            self.state = GestureState::Idle;
        }
    }
}

impl TextFieldPattern {
    /// Route a normalized input event. Returns whether it was consumed.
    pub fn handle_input_event(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Key(key) => self.handle_key_event(key),
            InputEvent::Touch(touch) => self.handle_touch_event(touch),
            InputEvent::Mouse(mouse) => self.handle_mouse_event(mouse),
        }
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gesture.state
    }

    /// Make the model and the paragraph current before hit testing.
    /// Pointer input commits any composition so the caret it places is the
    /// next insertion point.
    fn prepare_hit_test(&mut self) {
        self.flush_pending_operations();
        if self.preview.is_active() {
            self.finish_preview_operation();
        }
        self.ensure_paragraph();
    }

    fn set_gesture_state(&mut self, state: GestureState) {
        if self.gesture.state != state {
            debug!(target: "actions.gesture", from = ?self.gesture.state, to = ?state, "gesture_state");
            self.gesture.state = state;
        }
    }

    // ---------------------------------------------------------------------
    // Touch
    // ---------------------------------------------------------------------

    pub fn handle_touch_event(&mut self, event: &TouchEvent) -> bool {
        self.handle_pointer_event(event, InputSource::Touch)
    }

    /// Stylus behaves like touch except that dragging selects right away.
    pub fn handle_stylus_event(&mut self, event: &TouchEvent) -> bool {
        self.handle_pointer_event(event, InputSource::Stylus)
    }

    fn handle_pointer_event(&mut self, event: &TouchEvent, source: InputSource) -> bool {
        if !self.attached {
            return false;
        }
        match event.phase {
            TouchPhase::Down => self.on_pointer_down(event, source),
            TouchPhase::Move => self.on_pointer_move(event.position, source),
            TouchPhase::Up => self.on_pointer_up(event.position, source),
            TouchPhase::Cancel => self.on_pointer_cancel(),
        }
        true
    }

    fn on_pointer_down(&mut self, event: &TouchEvent, source: InputSource) {
        self.prepare_hit_test();
        let was_focused = self.has_focus;
        if !was_focused {
            self.handle_focus_event(RequestFocusReason::Click);
        }
        let gesture = &self.config.file.gesture;
        let (interval, slop, long_press) = (
            gesture.double_tap_interval(),
            gesture.tap_slop,
            gesture.long_press(),
        );
        let clicks = self
            .gesture
            .clicks
            .register(event.timestamp, event.position, interval, slop);
        self.gesture.down = Some(PointerDown {
            position: event.position,
            clicks,
            was_focused,
            moved: false,
        });
        if source == InputSource::Touch {
            let generation = self.gesture.long_press.arm();
            self.post(
                PatternTask::LongPress {
                    generation,
                    position: event.position,
                },
                long_press,
            );
        }
    }

    fn on_pointer_move(&mut self, position: Offset, source: InputSource) {
        let Some(mut down) = self.gesture.down else {
            return;
        };
        let tap_slop = self.config.file.gesture.tap_slop;
        if !down.moved && down.position.distance(position) > tap_slop {
            down.moved = true;
            self.gesture.down = Some(down);
            self.gesture.long_press.cancel();
            let pointer_driven = matches!(
                self.gesture.state,
                GestureState::GestureSelecting { .. }
                    | GestureState::DragArmed { .. }
                    | GestureState::Dragging { .. }
            );
            if source == InputSource::Stylus && !pointer_driven {
                self.ensure_paragraph();
                let anchor = self.select.convert_touch_offset_to_index(down.position);
                self.select.update_caret_index(anchor);
                self.set_gesture_state(GestureState::GestureSelecting { anchor, source });
            }
        }
        self.track_pointer(position);
    }

    fn on_pointer_up(&mut self, position: Offset, source: InputSource) {
        self.gesture.long_press.cancel();
        self.stop_auto_scroll();
        let Some(down) = self.gesture.down.take() else {
            return;
        };
        match self.gesture.state {
            GestureState::GestureSelecting { source: origin, .. } => {
                self.finish_gesture_selection(origin)
            }
            GestureState::Dragging {
                start,
                end,
                drop_index,
                version,
            } => self.finish_drag(start, end, drop_index, version),
            GestureState::DragArmed { .. } => {
                // Long press on the selection without a drag: offer the menu.
                self.set_gesture_state(GestureState::Selected);
                self.overlay.handles_shown = true;
                self.overlay.menu_shown = true;
                self.dirty |= DirtyFlags::RENDER;
            }
            _ if !down.moved => {
                self.prepare_hit_test();
                self.handle_click(down.clicks, position, down.was_focused, source);
            }
            _ => {}
        }
    }

    fn on_pointer_cancel(&mut self) {
        self.gesture.long_press.cancel();
        self.gesture.down = None;
        self.stop_auto_scroll();
        if matches!(
            self.gesture.state,
            GestureState::GestureSelecting { .. }
                | GestureState::DragArmed { .. }
                | GestureState::Dragging { .. }
        ) {
            let state = if self.select.is_selected() {
                GestureState::Selected
            } else {
                GestureState::Caret
            };
            self.set_gesture_state(state);
        }
    }

    pub(crate) fn on_long_press_timer(&mut self, generation: u64, position: Offset) {
        if !self.gesture.long_press.fire(generation) || self.gesture.down.is_none() {
            return;
        }
        self.prepare_hit_test();
        let index = self.select.convert_touch_offset_to_index(position);
        let range = self.select.selection_range();
        if self.select.is_selected() && range.contains(&index) {
            debug!(target: "actions.gesture", index, "long_press_in_selection");
            self.set_gesture_state(GestureState::DragArmed { origin: position });
            return;
        }
        debug!(target: "actions.gesture", index, "long_press_select");
        self.close_select_overlay();
        self.select.update_caret_index(index);
        self.set_gesture_state(GestureState::GestureSelecting {
            anchor: index,
            source: InputSource::Touch,
        });
        self.on_selection_updated();
    }

    fn handle_click(&mut self, clicks: u8, position: Offset, was_focused: bool, source: InputSource) {
        let hit = self.select.convert_touch_offset_to_position(position);
        match clicks {
            2 => {
                let word = self.select.word_boundary(hit.index);
                if word.is_empty() {
                    self.place_caret_by_tap(hit.index, hit.affinity);
                    return;
                }
                self.select.update_handle_index(word.start, word.end);
                self.show_selection_overlay(source);
                self.set_gesture_state(GestureState::WordSelect);
                self.on_selection_updated();
            }
            3 => {
                let paragraph = self.content.paragraph_range_at(hit.index);
                if paragraph.is_empty() {
                    self.place_caret_by_tap(hit.index, hit.affinity);
                    return;
                }
                self.select.update_handle_index(paragraph.start, paragraph.end);
                self.show_selection_overlay(source);
                self.set_gesture_state(GestureState::ParagraphSelect);
                self.on_selection_updated();
            }
            _ => {
                let repeat = was_focused
                    && !self.select.is_selected()
                    && self.gesture.state == GestureState::Caret
                    && self.content.snap(hit.index) == self.select.caret_index();
                if repeat {
                    self.overlay.menu_shown = !self.overlay.menu_shown;
                    self.dirty |= DirtyFlags::RENDER;
                    debug!(target: "actions.gesture", menu = self.overlay.menu_shown, "menu_toggled");
                    return;
                }
                self.place_caret_by_tap(hit.index, hit.affinity);
            }
        }
    }

    fn place_caret_by_tap(&mut self, index: usize, affinity: TextAffinity) {
        self.close_select_overlay();
        self.move_caret(index, affinity);
        self.set_gesture_state(GestureState::Caret);
    }

    fn show_selection_overlay(&mut self, source: InputSource) {
        self.overlay.handles_shown = source != InputSource::Mouse;
        self.overlay.menu_shown = source != InputSource::Mouse;
        self.dirty |= DirtyFlags::RENDER;
    }

    /// Follow a pressed pointer: extend the gesture selection or move the
    /// drop point, and feed the hot-edge auto-scroll.
    fn track_pointer(&mut self, position: Offset) {
        match self.gesture.state {
            GestureState::GestureSelecting { .. } => {
                self.update_gesture_selection(position);
                self.update_auto_scroll(position);
            }
            GestureState::DragArmed { origin } => {
                if origin.distance(position) > self.config.file.gesture.drag_slop {
                    self.prepare_hit_test();
                    let range = self.select.selection_range();
                    let version = self.content.version();
                    debug!(target: "actions.gesture", start = range.start, end = range.end, version, "drag_start");
                    self.set_gesture_state(GestureState::Dragging {
                        start: range.start,
                        end: range.end,
                        drop_index: range.start,
                        version,
                    });
                    self.update_drop_index(position);
                    self.update_auto_scroll(position);
                }
            }
            GestureState::Dragging { .. } => {
                self.update_drop_index(position);
                self.update_auto_scroll(position);
            }
            _ => {}
        }
    }

    /// Selection becomes `[min(anchor, hit), max(anchor, hit))`.
    pub(crate) fn update_gesture_selection(&mut self, position: Offset) {
        let GestureState::GestureSelecting { anchor, .. } = self.gesture.state else {
            return;
        };
        self.ensure_paragraph();
        let index = self
            .content
            .snap(self.select.convert_touch_offset_to_index(position));
        if index == anchor {
            self.select.update_caret_index(anchor);
        } else {
            self.select.update_handle_index(anchor, index);
        }
        self.on_selection_updated();
    }

    pub(crate) fn update_drop_index(&mut self, position: Offset) {
        let GestureState::Dragging {
            start, end, version, ..
        } = self.gesture.state
        else {
            return;
        };
        self.ensure_paragraph();
        let drop_index = self
            .content
            .snap(self.select.convert_touch_offset_to_index(position));
        self.gesture.state = GestureState::Dragging {
            start,
            end,
            drop_index,
            version,
        };
    }

    fn finish_gesture_selection(&mut self, source: InputSource) {
        if !self.select.is_selected() {
            let caret = self.select.caret_index();
            self.set_gesture_state(GestureState::Caret);
            self.move_caret(caret, TextAffinity::Downstream);
            return;
        }
        self.show_selection_overlay(source);
        self.set_gesture_state(GestureState::Selected);
        self.on_selection_updated();
    }

    /// Move `[start,end)` to `drop_index` as one undoable edit. A drop inside
    /// the dragged range cancels, as does any content change since the drag
    /// started.
    fn finish_drag(&mut self, start: usize, end: usize, drop_index: usize, version: u64) {
        self.set_gesture_state(GestureState::Selected);
        if (start..=end).contains(&drop_index) {
            debug!(target: "actions.gesture", drop_index, "drag_cancelled_inside_source");
            return;
        }
        self.flush_pending_operations();
        if self.preview.is_active() {
            self.finish_preview_operation();
        }
        if self.content.version() != version || end > self.content.len() {
            debug!(target: "actions.gesture", version, current = self.content.version(), "drag_cancelled_content_changed");
            return;
        }
        let record = self.snapshot_record();
        let moved = self.content.delete_range(start, end);
        let moved_len = end - start;
        let target = if drop_index > end {
            drop_index - moved_len
        } else {
            drop_index
        };
        match self.content.insert_value(target, &moved) {
            Ok(outcome) => {
                self.undo.record(record);
                self.after_content_change();
                self.select
                    .update_handle_index(outcome.start, outcome.end());
                self.on_selection_updated();
                debug!(target: "actions.gesture", from = start, to = outcome.start, len = outcome.inserted_len, "drag_moved");
            }
            Err(err) => {
                debug!(target: "actions.gesture", error = %err, "drag_move_rejected");
                self.restore_record(&record);
            }
        }
    }

    /// Text dropped from outside the field at `position`.
    pub fn on_drag_drop(&mut self, text: &str, position: Offset) -> bool {
        if !self.attached || text.is_empty() {
            return false;
        }
        self.prepare_hit_test();
        let index = self
            .content
            .snap(self.select.convert_touch_offset_to_index(position));
        self.select.update_caret_index(index);
        self.insert_value_operation(InsertCommand {
            value: text.to_string(),
            source: EditSource::Drop,
        })
    }

    // ---------------------------------------------------------------------
    // Mouse
    // ---------------------------------------------------------------------

    pub fn handle_mouse_event(&mut self, event: &MouseEvent) -> bool {
        if !self.attached {
            return false;
        }
        match (event.action, event.button) {
            (MouseAction::Press, MouseButton::Left) => self.on_mouse_press(event),
            (MouseAction::Press, MouseButton::Right) => self.on_mouse_right_press(event.position),
            (MouseAction::Move, _) if self.gesture.mouse_pressed => {
                self.track_pointer(event.position)
            }
            (MouseAction::Release, MouseButton::Left) => self.on_mouse_release(event.position),
            _ => return false,
        }
        true
    }

    fn on_mouse_press(&mut self, event: &MouseEvent) {
        self.prepare_hit_test();
        if !self.has_focus {
            self.handle_focus_event(RequestFocusReason::Mouse);
        }
        self.gesture.mouse_pressed = true;
        let gesture = &self.config.file.gesture;
        let (interval, slop) = (gesture.double_tap_interval(), gesture.tap_slop);
        let clicks = if event.mods.contains(KeyModifiers::SHIFT) {
            self.gesture.clicks.reset();
            1
        } else {
            self.gesture
                .clicks
                .register(event.timestamp, event.position, interval, slop)
        };
        let hit = self.select.convert_touch_offset_to_position(event.position);
        let index = self.content.snap(hit.index);
        if event.mods.contains(KeyModifiers::SHIFT) {
            let anchor = self.selection_anchor();
            self.set_gesture_state(GestureState::GestureSelecting {
                anchor,
                source: InputSource::Mouse,
            });
            self.update_gesture_selection(event.position);
            return;
        }
        if clicks >= 2 {
            self.handle_click(clicks, event.position, true, InputSource::Mouse);
            return;
        }
        if self.select.is_selected() && self.select.selection_range().contains(&index) {
            self.set_gesture_state(GestureState::DragArmed {
                origin: event.position,
            });
            return;
        }
        self.close_select_overlay();
        self.move_caret(index, hit.affinity);
        self.set_gesture_state(GestureState::GestureSelecting {
            anchor: index,
            source: InputSource::Mouse,
        });
    }

    fn on_mouse_right_press(&mut self, position: Offset) {
        self.prepare_hit_test();
        if !self.has_focus {
            self.handle_focus_event(RequestFocusReason::Mouse);
        }
        let index = self.select.convert_touch_offset_to_index(position);
        if !(self.select.is_selected() && self.select.selection_range().contains(&index)) {
            self.place_caret_by_tap(index, TextAffinity::Downstream);
        }
        self.overlay.menu_shown = true;
        self.dirty |= DirtyFlags::RENDER;
    }

    fn on_mouse_release(&mut self, position: Offset) {
        self.gesture.mouse_pressed = false;
        self.stop_auto_scroll();
        match self.gesture.state {
            GestureState::GestureSelecting { .. } => {
                self.finish_gesture_selection(InputSource::Mouse)
            }
            GestureState::Dragging {
                start,
                end,
                drop_index,
                version,
            } => self.finish_drag(start, end, drop_index, version),
            GestureState::DragArmed { .. } => {
                // Click inside the selection without dragging.
                let hit = self.select.convert_touch_offset_to_position(position);
                self.place_caret_by_tap(hit.index, hit.affinity);
            }
            _ => {}
        }
    }

    /// Fixed end of the selection: the handle that is not the caret.
    pub(crate) fn selection_anchor(&self) -> usize {
        let caret = self.select.caret_index();
        if !self.select.is_selected() {
            caret
        } else if self.select.second_handle().index == caret {
            self.select.first_handle().index
        } else {
            self.select.second_handle().index
        }
    }
}
