pub mod client_detail;
pub mod client_wizard;
pub mod clients;
pub mod components;
pub mod signup;

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Next key press, or `None` after a short wait so the loop can expire notifications.
pub fn next_key() -> Result<Option<KeyEvent>> {
    if !event::poll(POLL_INTERVAL)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) if key.kind != KeyEventKind::Release => Ok(Some(key)),
        _ => Ok(None),
    }
}
