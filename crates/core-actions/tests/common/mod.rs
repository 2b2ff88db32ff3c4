#![allow(dead_code)] // Shared across many integration tests; each test binary uses a subset of helpers.

use core_actions::{
    AttachReply, Clipboard, CursorInfo, CustomKeyboard, DeleteValueInfo, DirtyFlags, ImeBridge, ImeConfig,
    ImeError, InsertValueInfo, PatternTask, RequestFocusReason, Services, TextFieldObserver,
    TextFieldPattern,
};
use core_config::{Config, CopyOptions, EnterKeyType, FieldConfig};
use core_events::{ManualScheduler, TouchEvent, TouchPhase};
use core_paragraph::{MonospaceParagraphFactory, Offset, Rect};
use core_state::PreviewRange;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Field frame used by every harness: twenty clusters per line at the
/// 10px advance, two lines of 20px.
pub const FRAME: Rect = Rect::new(0.0, 0.0, 200.0, 40.0);
pub const ADVANCE: f32 = 10.0;
pub const LINE_HEIGHT: f32 = 20.0;

// -------------------------------------------------------------------------------------------------
// Fake input method
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ImeLog {
    pub attaches: Vec<ImeConfig>,
    pub shows: Vec<bool>,
    pub closes: usize,
    pub cursor_updates: Vec<Rect>,
    pub selections: Vec<(usize, usize)>,
}

#[derive(Clone, Default)]
pub struct FakeIme {
    pub log: Rc<RefCell<ImeLog>>,
    pub fail_with: Rc<Cell<Option<i32>>>,
    /// Answer attaches with `Pending`; the test delivers the result.
    pub deferred: Rc<Cell<bool>>,
}

impl ImeBridge for FakeIme {
    fn attach(
        &mut self,
        config: &ImeConfig,
        show_keyboard: bool,
    ) -> Result<AttachReply, ImeError> {
        if let Some(code) = self.fail_with.get() {
            return Err(ImeError::Code(code));
        }
        let mut log = self.log.borrow_mut();
        log.attaches.push(config.clone());
        log.shows.push(show_keyboard);
        if self.deferred.get() {
            Ok(AttachReply::Pending)
        } else {
            Ok(AttachReply::Confirmed)
        }
    }

    fn close(&mut self) {
        self.log.borrow_mut().closes += 1;
    }

    fn on_cursor_update(&mut self, info: &CursorInfo) {
        self.log.borrow_mut().cursor_updates.push(info.rect);
    }

    fn on_selection_change(&mut self, _text: &str, start: usize, end: usize) {
        self.log.borrow_mut().selections.push((start, end));
    }
}

#[derive(Clone, Default)]
pub struct FakeCustomKeyboard {
    pub attached: Rc<Cell<bool>>,
    pub attaches: Rc<Cell<u32>>,
}

impl CustomKeyboard for FakeCustomKeyboard {
    fn attach(&mut self) -> bool {
        self.attached.set(true);
        self.attaches.set(self.attaches.get() + 1);
        true
    }

    fn close(&mut self) {
        self.attached.set(false);
    }
}

#[derive(Clone, Default)]
pub struct FakeClipboard {
    pub data: Rc<RefCell<Option<String>>>,
    pub last_options: Rc<Cell<Option<CopyOptions>>>,
}

impl FakeClipboard {
    pub fn contents(&self) -> Option<String> {
        self.data.borrow().clone()
    }

    pub fn put(&self, text: &str) {
        *self.data.borrow_mut() = Some(text.to_string());
    }
}

impl Clipboard for FakeClipboard {
    fn get_data(&self) -> Option<String> {
        self.data.borrow().clone()
    }

    fn set_data(&mut self, text: &str, options: CopyOptions) {
        *self.data.borrow_mut() = Some(text.to_string());
        self.last_options.set(Some(options));
    }
}

// -------------------------------------------------------------------------------------------------
// Recording observer
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    WillInsert(usize, String),
    DidInsert(usize, String),
    WillDelete(usize, String),
    DidDelete(usize, String),
    Change(String, PreviewRange),
    Selection(usize, usize),
    FilterError(String),
    Submit(EnterKeyType, String),
    EditChange(bool),
}

#[derive(Clone, Default)]
pub struct Recorder {
    pub events: Rc<RefCell<Vec<Event>>>,
    pub veto_insert: Rc<Cell<bool>>,
    pub veto_delete: Rc<Cell<bool>>,
}

impl Recorder {
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl TextFieldObserver for Recorder {
    fn on_will_insert(&self, info: &InsertValueInfo) -> bool {
        self.push(Event::WillInsert(info.insert_offset, info.value.clone()));
        !self.veto_insert.get()
    }
    fn on_did_insert(&self, info: &InsertValueInfo) {
        self.push(Event::DidInsert(info.insert_offset, info.value.clone()));
    }
    fn on_will_delete(&self, info: &DeleteValueInfo) -> bool {
        self.push(Event::WillDelete(info.delete_offset, info.value.clone()));
        !self.veto_delete.get()
    }
    fn on_did_delete(&self, info: &DeleteValueInfo) {
        self.push(Event::DidDelete(info.delete_offset, info.value.clone()));
    }
    fn on_change(&self, text: &str, preview: PreviewRange) {
        self.push(Event::Change(text.to_string(), preview));
    }
    fn on_selection_change(&self, start: usize, end: usize) {
        self.push(Event::Selection(start, end));
    }
    fn on_input_filter_error(&self, rejected: &str) {
        self.push(Event::FilterError(rejected.to_string()));
    }
    fn on_submit(&self, enter_key: EnterKeyType, text: &str) {
        self.push(Event::Submit(enter_key, text.to_string()));
    }
    fn on_edit_change(&self, editing: bool) {
        self.push(Event::EditChange(editing));
    }
}

// -------------------------------------------------------------------------------------------------
// Harness
// -------------------------------------------------------------------------------------------------

pub struct Harness {
    pub pattern: TextFieldPattern,
    pub scheduler: Rc<ManualScheduler<PatternTask>>,
    pub ime: FakeIme,
    pub keyboard: FakeCustomKeyboard,
    pub clipboard: FakeClipboard,
    pub recorder: Recorder,
    pub clock: Instant,
}

pub fn harness() -> Harness {
    harness_with(|_| {})
}

/// Attached field with fakes for every service, laid out once.
pub fn harness_with(configure: impl FnOnce(&mut FieldConfig)) -> Harness {
    let mut config = Config::default();
    configure(&mut config.file.field);
    let ime = FakeIme::default();
    let keyboard = FakeCustomKeyboard::default();
    let clipboard = FakeClipboard::default();
    let recorder = Recorder::default();
    let services = Services::default()
        .with_ime(Box::new(ime.clone()))
        .with_custom_keyboard(Box::new(keyboard.clone()))
        .with_clipboard(Box::new(clipboard.clone()))
        .with_observer(Box::new(recorder.clone()));
    let scheduler = Rc::new(ManualScheduler::new());
    let factory = MonospaceParagraphFactory {
        advance: ADVANCE,
        line_height: LINE_HEIGHT,
    };
    let mut pattern = TextFieldPattern::new(config, services, scheduler.clone(), Box::new(factory));
    pattern.set_frame_rect(FRAME);
    pattern.on_attach_context();
    pattern.run_layout_pass();
    Harness {
        pattern,
        scheduler,
        ime,
        keyboard,
        clipboard,
        recorder,
        clock: Instant::now(),
    }
}

impl Harness {
    /// Host layout pass.
    pub fn layout(&mut self) -> DirtyFlags {
        self.pattern.run_layout_pass()
    }

    /// Advance virtual time by `by` and run every task that became due,
    /// including zero-delay follow-ups those tasks post.
    pub fn pump(&mut self, by: Duration) {
        let mut due = self.scheduler.advance(by);
        while !due.is_empty() {
            for task in due {
                self.pattern.run_task(task);
            }
            due = self.scheduler.take_due();
        }
    }

    /// Run tasks that are already due.
    pub fn settle(&mut self) {
        self.pump(Duration::ZERO);
    }

    pub fn focus(&mut self) {
        self.pattern.handle_focus_event(RequestFocusReason::Click);
        self.settle();
    }

    /// Programmatic text, caret at the end, laid out.
    pub fn with_text(mut self, text: &str) -> Self {
        self.pattern.set_text_value(text);
        self.layout();
        self
    }

    pub fn focused(mut self) -> Self {
        self.focus();
        self.layout();
        self
    }

    pub fn text(&self) -> String {
        self.pattern.text()
    }

    pub fn tick(&mut self, ms: u64) -> Instant {
        self.clock += Duration::from_millis(ms);
        self.clock
    }

    pub fn touch(&mut self, phase: TouchPhase, x: f32, y: f32) {
        let at = self.clock;
        self.pattern
            .handle_touch_event(&TouchEvent::new(phase, Offset::new(x, y), at));
    }

    /// Down + up at the same point, then a layout pass.
    pub fn tap(&mut self, x: f32, y: f32) {
        self.touch(TouchPhase::Down, x, y);
        self.tick(40);
        self.touch(TouchPhase::Up, x, y);
        self.layout();
    }
}

/// Point on the first line at the boundary before cluster `index`.
pub fn at_index(index: usize) -> (f32, f32) {
    (index as f32 * ADVANCE, LINE_HEIGHT / 2.0)
}
