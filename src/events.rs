use std::io;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::engine::{ChatChunk, EngineError, ExecOutput};
use crate::runner::RunOutput;

const POLL_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Enter,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Backspace,
    Help,
    ClearScreen,
    Reset,
    Settings,
    Quit,
    Char(char),
    /// Any other key, by name. Only meaningful as a confirmation answer.
    Other(String),
}

/// Everything the session controller reacts to.
#[derive(Debug)]
pub enum SessionEvent {
    Key(KeyAction),
    Resize { width: u16, height: u16 },
    Tick,
    Exec(ExecOutput),
    ChatChunk(ChatChunk),
    EngineFailed(EngineError),
    RunFinished(RunOutput),
}

fn map_key_event(key_event: KeyEvent) -> Option<KeyAction> {
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char(c) = key_event.code {
            return Some(match c.to_ascii_lowercase() {
                'c' => KeyAction::Quit,
                'h' => KeyAction::Help,
                'l' => KeyAction::ClearScreen,
                'r' => KeyAction::Reset,
                's' => KeyAction::Settings,
                other => KeyAction::Other(format!("ctrl+{other}")),
            });
        }
    }

    let action = match key_event.code {
        KeyCode::Enter => KeyAction::Enter,
        KeyCode::Tab => KeyAction::Tab,
        KeyCode::Up => KeyAction::Up,
        KeyCode::Down => KeyAction::Down,
        KeyCode::Left => KeyAction::Left,
        KeyCode::Right => KeyAction::Right,
        KeyCode::Backspace => KeyAction::Backspace,
        KeyCode::Char(c) => KeyAction::Char(c),
        KeyCode::Esc => KeyAction::Other("esc".to_string()),
        other => KeyAction::Other(format!("{other:?}").to_ascii_lowercase()),
    };
    Some(action)
}

/// Polls the terminal once. A quiet poll interval yields `Tick` so spinners
/// keep moving.
pub fn next_terminal_event() -> io::Result<Option<SessionEvent>> {
    if !event::poll(POLL_INTERVAL)? {
        return Ok(Some(SessionEvent::Tick));
    }
    let mapped = match event::read()? {
        Event::Key(key_event) => map_key_event(key_event).map(SessionEvent::Key),
        Event::Resize(width, height) => Some(SessionEvent::Resize { width, height }),
        _ => None,
    };
    Ok(mapped)
}

/// Takes at most `max_events` already-delivered worker events without
/// blocking.
pub fn drain_events_limited(rx: &Receiver<SessionEvent>, max_events: usize) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while events.len() < max_events {
        let Ok(event) = rx.try_recv() else {
            break;
        };
        events.push(event);
    }
    events
}
