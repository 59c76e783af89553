//! Terminal prompts for secrets and confirmations.
use std::io::Write;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};

use crate::error::{AppError, Result};

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn next_key() -> Result<KeyEvent> {
    loop {
        if let Event::Key(key) = event::read()?
            && key.kind != KeyEventKind::Release
        {
            return Ok(key);
        }
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Reads a secret without echoing it; each character shows as `*`.
pub fn password(prompt: &str) -> Result<String> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let key = next_key()?;
        if is_interrupt(&key) {
            execute!(out, Print("\r\n"))?;
            return Err(AppError::Prompt("interrupted".to_string()));
        }
        match key.code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

/// Asks a yes/no question; anything but `y` is a no.
pub fn confirm(question: &str) -> Result<bool> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(out, Print(format!("{question} [y/N] ")))?;
    out.flush()?;

    let key = next_key()?;
    execute!(out, Print("\r\n"))?;
    out.flush()?;
    if is_interrupt(&key) {
        return Err(AppError::Prompt("interrupted".to_string()));
    }
    Ok(matches!(key.code, KeyCode::Char('y' | 'Y')))
}
