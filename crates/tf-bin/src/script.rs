//! Line-oriented driver scripts.
//!
//! One command per line; blank lines and `#` comments are skipped. Text
//! arguments run to the end of the line and understand `\n`, `\t` and `\\`.

use anyhow::{Context, Result, bail};
use core_events::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetText(String),
    Insert(String),
    Backspace(usize),
    Delete(usize),
    Left,
    Right,
    Up,
    Down,
    Select(usize, usize),
    Caret(usize),
    Preview(String),
    FinishPreview,
    Undo,
    Redo,
    Focus,
    Blur,
    Tap(f32, f32),
    Key(KeyEvent),
    Copy,
    Cut,
    Paste,
    SelectAll,
    Enter,
    Wait(Duration),
    Dump,
    Print,
}

impl Command {
    /// Commands the driver handles itself instead of forwarding to the field.
    pub fn is_driver_local(&self) -> bool {
        matches!(self, Command::Wait(_) | Command::Dump)
    }
}

/// Parse one script line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = match trimmed.split_once(' ') {
        Some((w, r)) => (w, r),
        None => (trimmed, ""),
    };
    let command = match word {
        "text" => Command::SetText(unescape(rest)),
        "insert" => Command::Insert(unescape(rest)),
        "backspace" => Command::Backspace(count(rest)?),
        "delete" => Command::Delete(count(rest)?),
        "left" => Command::Left,
        "right" => Command::Right,
        "up" => Command::Up,
        "down" => Command::Down,
        "select" => {
            let [start, end] = numbers::<usize, 2>(rest)?;
            Command::Select(start, end)
        }
        "caret" => {
            let [index] = numbers::<usize, 1>(rest)?;
            Command::Caret(index)
        }
        "preview" => Command::Preview(unescape(rest)),
        "finish" => Command::FinishPreview,
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "focus" => Command::Focus,
        "blur" => Command::Blur,
        "tap" => {
            let [x, y] = numbers::<f32, 2>(rest)?;
            Command::Tap(x, y)
        }
        "key" => Command::Key(parse_key(rest.trim())?),
        "copy" => Command::Copy,
        "cut" => Command::Cut,
        "paste" => Command::Paste,
        "selectall" => Command::SelectAll,
        "enter" => Command::Enter,
        "wait" => {
            let [ms] = numbers::<u64, 1>(rest)?;
            Command::Wait(Duration::from_millis(ms))
        }
        "dump" => Command::Dump,
        "print" => Command::Print,
        other => bail!("unknown command `{other}`"),
    };
    Ok(Some(command))
}

/// Parse a whole script, reporting the first bad line by number.
pub fn parse_script(source: &str) -> Result<Vec<Command>> {
    let mut commands = Vec::new();
    for (n, line) in source.lines().enumerate() {
        if let Some(cmd) = parse_line(line).with_context(|| format!("line {}", n + 1))? {
            commands.push(cmd);
        }
    }
    Ok(commands)
}

fn count(rest: &str) -> Result<usize> {
    if rest.trim().is_empty() {
        return Ok(1);
    }
    let [n] = numbers::<usize, 1>(rest)?;
    Ok(n)
}

fn numbers<T, const N: usize>(rest: &str) -> Result<[T; N]>
where
    T: std::str::FromStr + Copy + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let parts: Vec<&str> = rest.split_whitespace().collect();
    if parts.len() != N {
        bail!("expected {N} numeric argument(s), got {}", parts.len());
    }
    let mut out = [T::default(); N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .with_context(|| format!("bad number `{part}`"))?;
    }
    Ok(out)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// `ctrl+shift+z`, `shift+left`, `enter`, `a`.
fn parse_key(input: &str) -> Result<KeyEvent> {
    let mut mods = KeyModifiers::empty();
    let mut parts: Vec<&str> = input.split('+').collect();
    let Some(name) = parts.pop().filter(|n| !n.is_empty()) else {
        bail!("empty key");
    };
    for m in parts {
        mods |= match m.to_ascii_lowercase().as_str() {
            "ctrl" => KeyModifiers::CTRL,
            "alt" => KeyModifiers::ALT,
            "shift" => KeyModifiers::SHIFT,
            other => bail!("unknown modifier `{other}`"),
        };
    }
    let code = match name.to_ascii_lowercase().as_str() {
        "enter" => KeyCode::Enter,
        "esc" => KeyCode::Esc,
        "backspace" => KeyCode::Backspace,
        "delete" => KeyCode::Delete,
        "tab" => KeyCode::Tab,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "space" => KeyCode::Char(' '),
        _ => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => bail!("unknown key `{name}`"),
            }
        }
    };
    Ok(KeyEvent::new(code, mods))
}
