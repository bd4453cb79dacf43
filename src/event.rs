use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Terminal-side input, as opposed to [`Action`](crate::action::Action)s
/// produced by background loads.
#[derive(Debug, Clone)]
pub enum Event {
    /// Time to draw a frame
    Render,
    Key(KeyEvent),
    /// New terminal size (columns, rows)
    Resize(u16, u16),
}

impl Event {
    /// Ctrl+C leaves from anywhere, even mid-search
    pub fn is_quit(&self) -> bool {
        match self {
            Event::Key(key) => {
                key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
            }
            _ => false,
        }
    }
}
