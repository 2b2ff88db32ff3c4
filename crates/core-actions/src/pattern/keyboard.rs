//! Focus, blur and the keyboard attach protocol.
//!
//! `Detached -> Attaching -> AttachedSystem | AttachedCustom -> Detached`.
//! The system bridge confirms an attach either at once, through a follow-up
//! task, or later through [`TextFieldPattern::on_ime_attach_result`]. Both
//! carry the focus generation the request was made under and are ignored
//! once the field has been blurred or re-focused since. A late failure drops
//! `Attaching` back to `Detached` and marks the request for retry.

use super::{DirtyFlags, TextFieldPattern};
use crate::bridge::{AttachReply, CursorInfo, ImeConfig, ImeError};
use crate::task::PatternTask;
use core_config::EnterKeyType;
use core_state::{EditError, EditResult, EditSource, InputOperation, InsertCommand};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyboardState {
    #[default]
    Detached,
    Attaching,
    AttachedSystem,
    AttachedCustom,
}

impl KeyboardState {
    pub fn is_attached(self) -> bool {
        matches!(
            self,
            KeyboardState::AttachedSystem | KeyboardState::AttachedCustom
        )
    }
}

/// Why the field is gaining focus. Decides whether a keyboard is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFocusReason {
    Click,
    LongPress,
    Mouse,
    Keyboard,
    Drag,
    Autofill,
    Api,
    Accessibility,
}

impl RequestFocusReason {
    /// Drag targets and autofill take focus without raising a keyboard.
    pub fn requests_keyboard(self) -> bool {
        !matches!(self, RequestFocusReason::Drag | RequestFocusReason::Autofill)
    }
}

impl TextFieldPattern {
    pub fn handle_focus_event(&mut self, reason: RequestFocusReason) {
        if !self.attached || self.has_focus {
            return;
        }
        self.has_focus = true;
        self.focus_generation += 1;
        debug!(target: "actions.ime", ?reason, generation = self.focus_generation, "focus");
        if !self.editing {
            self.editing = true;
            self.services.events.fire_edit_change(true);
        }
        if reason.requests_keyboard() && self.config.file.field.show_keyboard_on_focus {
            self.need_to_request_keyboard_inner = true;
            if self.request_keyboard(true).is_ok() {
                self.need_to_request_keyboard_inner = false;
            }
        }
        self.on_selection_updated();
    }

    /// Loss of focus always force-closes whatever keyboard is attached or
    /// attaching, and commits any composition.
    pub fn handle_blur_event(&mut self) {
        if !self.has_focus {
            return;
        }
        self.has_focus = false;
        self.focus_generation += 1;
        debug!(target: "actions.ime", generation = self.focus_generation, "blur");
        self.close_keyboard(true, true);
        if self.preview.is_active() {
            self.enqueue(InputOperation::SetPreviewFinish);
        }
        if self.select.is_selected() {
            let caret = self.select.caret_index();
            self.select.update_caret_index(caret);
        }
        self.close_select_overlay();
        self.gesture.cancel_timers();
        self.stop_auto_scroll();
        self.need_to_request_keyboard_inner = false;
        if self.editing {
            self.editing = false;
            self.services.events.fire_edit_change(false);
        }
        self.dirty |= DirtyFlags::RENDER;
    }

    /// Bind a keyboard. A configured custom keyboard wins over the system
    /// input method; attaching one closes the other first.
    pub fn request_keyboard(&mut self, show: bool) -> EditResult<()> {
        if !self.has_focus {
            return Err(EditError::NotFocused);
        }
        if !self.config.file.field.show_keyboard_on_focus {
            return Err(EditError::KeyboardDisabled);
        }
        if self.config.file.field.custom_keyboard {
            return self.request_custom_keyboard();
        }
        if self.keyboard == KeyboardState::AttachedCustom {
            self.close_custom_keyboard();
        }
        if matches!(
            self.keyboard,
            KeyboardState::Attaching | KeyboardState::AttachedSystem
        ) {
            return Ok(());
        }
        let config = self.ime_config();
        let Some(ime) = self.services.ime.as_mut() else {
            warn!(target: "actions.ime", "ime_bridge_unavailable");
            return Err(EditError::ImeUnavailable);
        };
        let reply = match ime.attach(&config, show) {
            Ok(reply) => reply,
            Err(err) => {
                warn!(target: "actions.ime", error = %err, "ime_attach_failed");
                return Err(EditError::ImeUnavailable);
            }
        };
        self.keyboard = KeyboardState::Attaching;
        self.ime_shown = show;
        debug!(target: "actions.ime", show, ?reply, "ime_attaching");
        if reply == AttachReply::Confirmed {
            self.post(
                PatternTask::ImeAttached {
                    focus_generation: self.focus_generation,
                },
                Duration::ZERO,
            );
        }
        Ok(())
    }

    fn request_custom_keyboard(&mut self) -> EditResult<()> {
        if self.keyboard == KeyboardState::AttachedCustom {
            return Ok(());
        }
        if matches!(
            self.keyboard,
            KeyboardState::Attaching | KeyboardState::AttachedSystem
        ) {
            self.close_system_keyboard();
        }
        let Some(keyboard) = self.services.custom_keyboard.as_mut() else {
            warn!(target: "actions.ime", "custom_keyboard_unavailable");
            return Err(EditError::ImeUnavailable);
        };
        if !keyboard.attach() {
            warn!(target: "actions.ime", "custom_keyboard_attach_failed");
            return Err(EditError::ImeUnavailable);
        }
        self.keyboard = KeyboardState::AttachedCustom;
        debug!(target: "actions.ime", "custom_keyboard_attached");
        Ok(())
    }

    /// Outcome of an attach the bridge answered with [`AttachReply::Pending`].
    /// `request` is the value the bridge received in [`ImeConfig::request`].
    pub fn on_ime_attach_result(&mut self, request: u64, result: Result<(), ImeError>) {
        match result {
            Ok(()) => self.on_ime_attached(request),
            Err(err) => {
                if !self.is_current_attach(request) {
                    debug!(target: "actions.ime", request, current = self.focus_generation, "stale_ime_failure_ignored");
                    return;
                }
                warn!(target: "actions.ime", error = %err, "ime_attach_failed");
                self.keyboard = KeyboardState::Detached;
                self.ime_shown = false;
                self.need_to_request_keyboard_inner = true;
            }
        }
    }

    fn is_current_attach(&self, focus_generation: u64) -> bool {
        self.has_focus
            && focus_generation == self.focus_generation
            && self.keyboard == KeyboardState::Attaching
    }

    pub(crate) fn on_ime_attached(&mut self, focus_generation: u64) {
        if !self.is_current_attach(focus_generation) {
            debug!(target: "actions.ime", focus_generation, current = self.focus_generation, "stale_ime_attach_ignored");
            return;
        }
        self.keyboard = KeyboardState::AttachedSystem;
        self.need_to_request_keyboard_inner = false;
        self.pending_ime_update = true;
        debug!(target: "actions.ime", "ime_attached");
        self.notify_ime_update();
    }

    /// Close the keyboard. A non-forced request is ignored and returns false.
    pub fn close_keyboard(&mut self, force_close: bool, stop_twinkling: bool) -> bool {
        if !force_close {
            debug!(target: "actions.ime", "soft_close_ignored");
            return false;
        }
        if stop_twinkling {
            self.stop_twinkling();
        }
        self.close_select_overlay();
        match self.keyboard {
            KeyboardState::AttachedCustom => self.close_custom_keyboard(),
            KeyboardState::Attaching | KeyboardState::AttachedSystem => {
                self.close_system_keyboard()
            }
            KeyboardState::Detached => {}
        }
        true
    }

    fn close_system_keyboard(&mut self) {
        if let Some(ime) = self.services.ime.as_mut() {
            ime.close();
        }
        self.keyboard = KeyboardState::Detached;
        self.ime_shown = false;
        debug!(target: "actions.ime", "ime_closed");
    }

    fn close_custom_keyboard(&mut self) {
        if let Some(keyboard) = self.services.custom_keyboard.as_mut() {
            keyboard.close();
        }
        self.keyboard = KeyboardState::Detached;
        debug!(target: "actions.ime", "custom_keyboard_closed");
    }

    /// Switch between the custom and the system keyboard. Takes effect
    /// immediately when focused.
    pub fn set_custom_keyboard(&mut self, enabled: bool) {
        if self.config.file.field.custom_keyboard == enabled {
            return;
        }
        self.config.file.field.custom_keyboard = enabled;
        if self.has_focus && self.keyboard != KeyboardState::Detached {
            let show = self.ime_shown || enabled;
            if let Err(err) = self.request_keyboard(show) {
                debug!(target: "actions.ime", error = %err, "keyboard_switch_failed");
            }
        }
    }

    /// Push caret and selection to the system input method, once per pass.
    pub(crate) fn notify_ime_update(&mut self) {
        if !self.pending_ime_update || self.keyboard != KeyboardState::AttachedSystem {
            return;
        }
        self.pending_ime_update = false;
        let info = CursorInfo {
            rect: self.select.caret_rect(),
        };
        let text = self.content.text();
        let (start, end) = (self.select.start(), self.select.end());
        if let Some(ime) = self.services.ime.as_mut() {
            ime.on_cursor_update(&info);
            ime.on_selection_change(&text, start, end);
        }
    }

    pub(crate) fn ime_config(&self) -> ImeConfig {
        let field = &self.config.file.field;
        ImeConfig {
            input_type: field.input_type,
            enter_key: field.enter_key,
            cursor_rect: self.select.caret_rect(),
            selection_start: self.select.start(),
            selection_end: self.select.end(),
            input_pattern: field.input_filter.clone(),
            window_id: self.services.window_id,
            request: self.focus_generation,
        }
    }

    pub fn keyboard_state(&self) -> KeyboardState {
        self.keyboard
    }

    pub fn is_custom_keyboard_attached(&self) -> bool {
        self.keyboard == KeyboardState::AttachedCustom
    }

    pub fn ime_shown(&self) -> bool {
        self.ime_shown
    }

    /// Whether a keyboard request failed on focus and is worth retrying.
    pub fn needs_keyboard_request(&self) -> bool {
        self.need_to_request_keyboard_inner
    }

    /// Enter from the input method.
    pub fn on_ime_enter_key(&mut self, enter_key: EnterKeyType) {
        self.perform_enter_action(enter_key);
    }

    /// Multiline fields take a line break; single-line fields submit and,
    /// when configured, give up focus.
    pub fn perform_enter_action(&mut self, enter_key: EnterKeyType) {
        if !self.attached {
            return;
        }
        if self.config.file.field.is_multiline() {
            self.enqueue(InputOperation::Insert(InsertCommand {
                value: "\n".to_string(),
                source: EditSource::Keyboard,
            }));
            return;
        }
        self.flush_pending_operations();
        if self.preview.is_active() {
            self.finish_preview_operation();
        }
        let text = self.content.text();
        debug!(target: "actions.ime", ?enter_key, len = self.content.len(), "submit");
        self.services.events.fire_submit(enter_key, &text);
        if self.config.file.field.blur_on_submit() {
            self.handle_blur_event();
        }
    }
}
