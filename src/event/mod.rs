//! Terminal events for the analysis TUI.
//!
//! Key presses, resizes and a regular tick are merged into one stream by
//! [`EventHandler`], which the application loop consumes alongside task
//! state updates.

pub mod handler;

pub use handler::EventHandler;

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind};

/// Default tick rate when none is configured.
pub const DEFAULT_TICK_RATE: Duration = Duration::from_millis(250);

/// Application events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Keyboard input event
    Key(KeyEvent),
    /// Terminal resize event
    Resize(u16, u16),
    /// Regular tick, used to refresh elapsed-time displays
    Tick,
}

impl Event {
    /// Maps a crossterm event, dropping the ones the UI has no use for.
    ///
    /// Only key presses are kept; releases and repeats would otherwise type
    /// every character twice on terminals that report them.
    pub fn from_crossterm(event: CrosstermEvent) -> Option<Self> {
        match event {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
            CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
            _ => None,
        }
    }
}
