//! Hot-edge auto-scroll while a pointer drags a selection or a drop point.

use super::gesture::GestureState;
use super::{DirtyFlags, TextFieldPattern};
use crate::task::PatternTask;
use core_events::TimerSlot;
use core_paragraph::Offset;
use tracing::{debug, trace};

/// Scroll speed for a pointer `depth` pixels inside a hot edge of width
/// `hot_edge`. Grows linearly from `min_speed` at the margin border to
/// `max_speed` at the viewport edge and stays capped beyond it.
pub fn auto_scroll_speed(depth: f32, hot_edge: f32, min_speed: f32, max_speed: f32) -> f32 {
    if hot_edge <= 0.0 || depth <= 0.0 {
        return 0.0;
    }
    let ratio = (depth / hot_edge).clamp(0.0, 1.0);
    min_speed + (max_speed - min_speed).max(0.0) * ratio
}

#[derive(Debug, Default)]
pub(crate) struct AutoScrollState {
    slot: TimerSlot,
    /// -1 towards the start of the text, +1 towards the end.
    direction: f32,
    speed: f32,
    pointer: Offset,
}

impl TextFieldPattern {
    /// Re-evaluate auto-scroll for a pointer at `pointer` (field-local).
    pub(crate) fn update_auto_scroll(&mut self, pointer: Offset) {
        let rect = self.select.content_rect();
        let hot = self.config.effective_hot_edge;
        let (lo, hi, p) = if self.config.file.field.is_multiline() {
            (rect.top(), rect.bottom(), pointer.y)
        } else {
            (rect.left(), rect.right(), pointer.x)
        };
        let (direction, depth) = if p < lo + hot {
            (-1.0, lo + hot - p)
        } else if p > hi - hot {
            (1.0, p - (hi - hot))
        } else {
            (0.0, 0.0)
        };
        let tuning = &self.config.file.auto_scroll;
        let speed = auto_scroll_speed(depth, hot, tuning.min_speed, tuning.max_speed);
        self.auto_scroll.pointer = pointer;
        if direction == 0.0 || speed == 0.0 {
            self.stop_auto_scroll();
            return;
        }
        self.auto_scroll.direction = direction;
        self.auto_scroll.speed = speed;
        if !self.auto_scroll.slot.is_armed() {
            debug!(target: "actions.scroll", direction, speed, "auto_scroll_start");
            self.arm_auto_scroll();
        }
    }

    fn arm_auto_scroll(&mut self) {
        let generation = self.auto_scroll.slot.arm();
        self.post(
            PatternTask::AutoScroll { generation },
            self.config.file.auto_scroll.tick(),
        );
    }

    pub(crate) fn stop_auto_scroll(&mut self) {
        if self.auto_scroll.slot.is_armed() {
            debug!(target: "actions.scroll", "auto_scroll_stop");
        }
        self.auto_scroll.slot.cancel();
        self.auto_scroll.direction = 0.0;
        self.auto_scroll.speed = 0.0;
    }

    pub(crate) fn on_auto_scroll_tick(&mut self, generation: u64) {
        if !self.auto_scroll.slot.fire(generation) {
            trace!(target: "actions.scroll", generation, "stale_auto_scroll_dropped");
            return;
        }
        self.ensure_paragraph();
        let secs = self.config.file.auto_scroll.tick().as_secs_f32();
        let delta = self.auto_scroll.direction * self.auto_scroll.speed * secs;
        let applied = self.select.scroll_by(delta);
        trace!(target: "actions.scroll", delta, applied, "auto_scroll_tick");
        let pointer = self.auto_scroll.pointer;
        match self.gesture.state {
            GestureState::GestureSelecting { .. } => self.update_gesture_selection(pointer),
            GestureState::Dragging { .. } => self.update_drop_index(pointer),
            _ => {}
        }
        self.dirty |= DirtyFlags::RENDER;
        if applied != 0.0 {
            self.arm_auto_scroll();
        } else {
            self.stop_auto_scroll();
        }
    }

    pub fn is_auto_scrolling(&self) -> bool {
        self.auto_scroll.slot.is_armed()
    }

    /// Current speed in pixels per second, zero when idle.
    pub fn current_auto_scroll_speed(&self) -> f32 {
        if self.is_auto_scrolling() {
            self.auto_scroll.speed
        } else {
            0.0
        }
    }

    /// Scroll the text along its axis. Returns the distance applied.
    pub fn scroll_by(&mut self, delta: f32) -> f32 {
        if !self.attached {
            return 0.0;
        }
        self.ensure_paragraph();
        let applied = self.select.scroll_by(delta);
        if applied != 0.0 {
            self.dirty |= DirtyFlags::RENDER;
            self.pending_ime_update = true;
        }
        applied
    }
}
