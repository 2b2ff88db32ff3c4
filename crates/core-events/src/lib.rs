//! Input event types and task scheduling primitives for the text field.
//!
//! Everything that touches editor state runs on one logical UI thread. Input
//! arrives as the event types below; deferred work (caret blink, long press
//! detection, auto-scroll ticks, IME follow-ups) is posted through a
//! [`scheduler::TaskScheduler`] and handed back to the owner of the editor
//! when due. Background producers marshal their results onto the UI thread
//! through the same scheduler before anything reads editor state.

pub mod scheduler;
pub mod sync;

pub use scheduler::{ChannelScheduler, ManualScheduler, TaskScheduler, TaskType, TimerSlot};
pub use sync::{SYNC_TASK_TIMEOUT, SyncReply, SyncWaiter, sync_pair};

use core_paragraph::Offset;
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::time::Instant;

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
// Relaxed atomic counters; read by tests and the diagnostics dump.
// -------------------------------------------------------------------------------------------------
pub static TASKS_POSTED: AtomicU64 = AtomicU64::new(0);
pub static TASKS_DROPPED: AtomicU64 = AtomicU64::new(0); // receiver gone before delivery
pub static SYNC_WAIT_TIMEOUTS: AtomicU64 = AtomicU64::new(0);

/// Normalized input events routed into the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key(KeyEvent),
    Touch(TouchEvent),
    Mouse(MouseEvent),
}

/// Origin of a gesture or edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Touch,
    Mouse,
    Keyboard,
    Ime,
    Stylus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    /// Position local to the text field.
    pub position: Offset,
    pub timestamp: Instant,
}

impl TouchEvent {
    pub fn new(phase: TouchPhase, position: Offset, timestamp: Instant) -> Self {
        Self {
            phase,
            position,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Press,
    Move,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    pub action: MouseAction,
    pub button: MouseButton,
    pub position: Offset,
    pub mods: KeyModifiers,
    pub timestamp: Instant,
}

impl MouseEvent {
    pub fn new(action: MouseAction, position: Offset, timestamp: Instant) -> Self {
        Self {
            action,
            button: MouseButton::Left,
            position,
            mods: KeyModifiers::empty(),
            timestamp,
        }
    }

    pub fn with_mods(mut self, mods: KeyModifiers) -> Self {
        self.mods = mods;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyEvent {
    pub fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::empty())
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CTRL)
    }
}

/// KeyCode enumerates normalized logical key representations consumed by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Delete,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const CTRL = 0b0000_0001;
        const ALT  = 0b0000_0010;
        const SHIFT= 0b0000_0100;
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{:?}", self.code, self.mods)
    }
}
