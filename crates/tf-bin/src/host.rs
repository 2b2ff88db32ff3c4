//! UI thread hosting one text field.
//!
//! The pattern is single threaded, so it lives on a dedicated thread that
//! drains two channels: driver commands and scheduler tasks delivered by
//! tokio timers. A layout pass runs whenever the field asks for one.

use crate::script::Command;
use core_actions::{
    AttachReply, Clipboard, CursorInfo, DeleteValueInfo, DirtyFlags, ImeBridge, ImeConfig, ImeError,
    InsertValueInfo, PatternDump, PatternTask, RequestFocusReason, SelectionOptions, Services,
    TextFieldObserver, TextFieldPattern,
};
use core_config::{Config, CopyOptions, EnterKeyType};
use core_events::{ChannelScheduler, SyncReply, TouchEvent, TouchPhase};
use core_paragraph::{MonospaceParagraphFactory, Offset, Rect};
use core_state::PreviewRange;
use crossbeam_channel::{Receiver, select};
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const FIELD_WIDTH: f32 = 320.0;
pub const FIELD_HEIGHT: f32 = 48.0;

pub enum UiCommand {
    Run(Command),
    Dump(SyncReply<PatternDump>),
    Shutdown,
}

/// Input method stand-in: accepts every attach and logs what it is told.
#[derive(Debug, Default)]
struct LoggingIme;

impl ImeBridge for LoggingIme {
    fn attach(
        &mut self,
        config: &ImeConfig,
        show_keyboard: bool,
    ) -> Result<AttachReply, ImeError> {
        info!(target: "runtime.ime", input_type = ?config.input_type, enter_key = ?config.enter_key, show_keyboard, "attach");
        Ok(AttachReply::Confirmed)
    }

    fn close(&mut self) {
        info!(target: "runtime.ime", "close");
    }

    fn on_cursor_update(&mut self, info: &CursorInfo) {
        debug!(target: "runtime.ime", x = info.rect.x, y = info.rect.y, "cursor_update");
    }

    fn on_selection_change(&mut self, _text: &str, start: usize, end: usize) {
        debug!(target: "runtime.ime", start, end, "selection_change");
    }
}

#[derive(Debug, Default)]
struct MemoryClipboard {
    data: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn get_data(&self) -> Option<String> {
        self.data.clone()
    }

    fn set_data(&mut self, text: &str, options: CopyOptions) {
        debug!(target: "runtime.clipboard", len = text.len(), ?options, "set_data");
        self.data = Some(text.to_string());
    }
}

/// Logs lengths and indices only; the text itself stays out of the log.
struct LoggingObserver;

impl TextFieldObserver for LoggingObserver {
    fn on_did_insert(&self, info: &InsertValueInfo) {
        debug!(target: "runtime.events", offset = info.insert_offset, len = info.value.len(), "did_insert");
    }
    fn on_did_delete(&self, info: &DeleteValueInfo) {
        debug!(target: "runtime.events", offset = info.delete_offset, direction = ?info.direction, "did_delete");
    }
    fn on_change(&self, text: &str, preview: PreviewRange) {
        debug!(target: "runtime.events", len = text.len(), preview_start = preview.start, preview_end = preview.end, "change");
    }
    fn on_input_filter_error(&self, rejected: &str) {
        info!(target: "runtime.events", rejected_len = rejected.len(), "input_filter_error");
    }
    fn on_submit(&self, enter_key: EnterKeyType, text: &str) {
        info!(target: "runtime.events", ?enter_key, len = text.len(), "submit");
    }
    fn on_edit_change(&self, editing: bool) {
        debug!(target: "runtime.events", editing, "edit_change");
    }
}

pub fn build_pattern(config: Config, scheduler: Rc<ChannelScheduler<PatternTask>>) -> TextFieldPattern {
    let services = Services::default()
        .with_ime(Box::new(LoggingIme))
        .with_clipboard(Box::new(MemoryClipboard::default()))
        .with_observer(Box::new(LoggingObserver));
    let mut pattern = TextFieldPattern::new(
        config,
        services,
        scheduler,
        Box::new(MonospaceParagraphFactory::default()),
    );
    pattern.set_frame_rect(Rect::new(0.0, 0.0, FIELD_WIDTH, FIELD_HEIGHT));
    pattern.on_attach_context();
    pattern.run_layout_pass();
    pattern
}

/// UI thread body. Returns when the driver shuts down or hangs up.
pub fn run_ui(
    mut pattern: TextFieldPattern,
    commands: Receiver<UiCommand>,
    tasks: Receiver<PatternTask>,
) {
    info!(target: "runtime.ui", "ui_thread_started");
    loop {
        select! {
            recv(commands) -> msg => match msg {
                Ok(UiCommand::Run(cmd)) => apply_command(&mut pattern, cmd),
                Ok(UiCommand::Dump(reply)) => {
                    layout_if_needed(&mut pattern);
                    if !reply.send(pattern.dump()) {
                        warn!(target: "runtime.ui", "dump_waiter_gone");
                    }
                }
                Ok(UiCommand::Shutdown) | Err(_) => break,
            },
            recv(tasks) -> task => {
                if let Ok(task) = task {
                    pattern.run_task(task);
                }
            }
        }
        layout_if_needed(&mut pattern);
    }
    pattern.on_detach_context();
    info!(target: "runtime.ui", "ui_thread_stopped");
}

fn layout_if_needed(pattern: &mut TextFieldPattern) {
    if pattern.dirty().contains(DirtyFlags::MEASURE) {
        pattern.run_layout_pass();
    } else {
        pattern.take_dirty();
    }
}

pub fn apply_command(pattern: &mut TextFieldPattern, cmd: Command) {
    let outcome = match cmd {
        Command::SetText(text) => {
            pattern.set_text_value(&text);
            Ok(())
        }
        Command::Insert(value) => {
            pattern.insert_value(&value);
            Ok(())
        }
        Command::Backspace(n) => {
            pattern.delete_backward(n);
            Ok(())
        }
        Command::Delete(n) => {
            pattern.delete_forward(n);
            Ok(())
        }
        Command::Left => {
            pattern.cursor_left();
            Ok(())
        }
        Command::Right => {
            pattern.cursor_right();
            Ok(())
        }
        Command::Up => {
            pattern.cursor_up();
            Ok(())
        }
        Command::Down => {
            pattern.cursor_down();
            Ok(())
        }
        Command::Select(start, end) => {
            pattern.set_selection(start, end, SelectionOptions::default(), true)
        }
        Command::Caret(index) => pattern.set_caret_offset(index),
        Command::Preview(value) => pattern.set_preview_text(&value, PreviewRange::INACTIVE),
        Command::FinishPreview => {
            pattern.finish_text_preview();
            Ok(())
        }
        Command::Undo => {
            pattern.handle_on_undo_action();
            Ok(())
        }
        Command::Redo => {
            pattern.handle_on_redo_action();
            Ok(())
        }
        Command::Focus => {
            pattern.handle_focus_event(RequestFocusReason::Api);
            Ok(())
        }
        Command::Blur => {
            pattern.handle_blur_event();
            Ok(())
        }
        Command::Tap(x, y) => {
            let at = Offset::new(x, y);
            let now = Instant::now();
            pattern.handle_touch_event(&TouchEvent::new(TouchPhase::Down, at, now));
            pattern.handle_touch_event(&TouchEvent::new(TouchPhase::Up, at, now));
            Ok(())
        }
        Command::Key(key) => {
            let consumed = pattern.handle_key_event(&key);
            debug!(target: "runtime.ui", key = %key, consumed, "key");
            Ok(())
        }
        Command::Copy => pattern.copy().map(drop),
        Command::Cut => pattern.cut().map(drop),
        Command::Paste => pattern.paste().map(drop),
        Command::SelectAll => {
            pattern.select_all();
            Ok(())
        }
        Command::Enter => {
            let enter_key = pattern.config().file.field.enter_key;
            pattern.perform_enter_action(enter_key);
            Ok(())
        }
        Command::Print => {
            layout_if_needed(pattern);
            let (start, end) = pattern.selection();
            println!("{:?} caret={} selection={start}..{end}", pattern.text(), pattern.caret_index());
            Ok(())
        }
        Command::Wait(_) | Command::Dump => Ok(()),
    };
    if let Err(err) = outcome {
        warn!(target: "runtime.ui", error = %err, "command_failed");
    }
}
