use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};
use ratatui::Frame;

const MENU_WIDTH: u16 = 40;
const MENU_MAX_HEIGHT: u16 = 16;

/// Row of a popup menu; `checked` is set for toggles
pub struct MenuEntry {
    pub label: String,
    pub checked: Option<bool>,
}

impl MenuEntry {
    pub fn plain(label: String) -> Self {
        Self {
            label,
            checked: None,
        }
    }

    pub fn toggle(label: String, checked: bool) -> Self {
        Self {
            label,
            checked: Some(checked),
        }
    }

    fn text(&self) -> String {
        match self.checked {
            Some(true) => format!("[x] {}", self.label),
            Some(false) => format!("[ ] {}", self.label),
            None => self.label.clone(),
        }
    }
}

/// Draw a menu over the middle of the screen with `selected` highlighted
pub fn render_menu(frame: &mut Frame, title: &str, entries: &[MenuEntry], selected: usize) {
    let height = u16::try_from(entries.len() + 2)
        .unwrap_or(MENU_MAX_HEIGHT)
        .min(MENU_MAX_HEIGHT);
    let area = centered(frame.area(), MENU_WIDTH, height);
    frame.render_widget(Clear, area);

    let highlight = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let rows: Vec<ListItem> = entries
        .iter()
        .map(|entry| ListItem::new(Line::from(entry.text())))
        .collect();

    let menu = List::new(rows)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(Span::styled(format!(" {} ", title), highlight)),
        )
        .highlight_style(highlight)
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(selected));
    frame.render_stateful_widget(menu, area, &mut state);
}

/// `width` x `height` cells centered in `outer`, shrunk to fit
fn centered(outer: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(outer.width);
    let height = height.min(outer.height);
    Rect::new(
        outer.x + (outer.width - width) / 2,
        outer.y + (outer.height - height) / 2,
        width,
        height,
    )
}
