use std::io::{self, Stdout};
use std::panic;
use std::time::Duration;

use crossterm::cursor;
use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::event::Event;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Switch to raw mode on the alternate screen. Undo with [`restore`].
pub fn init() -> io::Result<Tui> {
    terminal::enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
    let mut tui = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    tui.clear()?;
    Ok(tui)
}

pub fn restore() -> io::Result<()> {
    terminal::disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)
}

/// Leave the alternate screen before a panic message is printed
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        restore().ok();
        previous(info);
    }));
}

pub fn size() -> Option<(u16, u16)> {
    terminal::size().ok()
}

fn translate(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        CrosstermEvent::Resize(columns, rows) => Some(Event::Resize(columns, rows)),
        _ => None,
    }
}

async fn read_input(
    tx: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    frame_rate: Duration,
) {
    let mut input = EventStream::new();
    let mut frames = tokio::time::interval(frame_rate);

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => return,
            _ = frames.tick() => Some(Event::Render),
            Some(Ok(raw)) = input.next() => translate(raw),
        };
        if let Some(event) = event {
            if tx.send(event).is_err() {
                return;
            }
        }
    }
}

/// Terminal input and frame ticks, read on a background task.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventHandler {
    pub fn new(frame_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(read_input(tx, cancel.clone(), frame_rate));
        Self { rx, cancel }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
