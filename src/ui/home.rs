use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use ratatui::Frame;

use super::list;
use crate::home::{ActiveView, Home};

pub fn render(frame: &mut Frame, home: &Home, area: Rect) {
    let Some(active) = home.active() else {
        let empty = Paragraph::new("No page selected. Press m to open the menu.")
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    };

    if active.tabs().len() < 2 {
        let title = active.tabs().first().map_or("", |t| t.title);
        list::render_items(frame, area, title, active.list());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_tabs(frame, active, chunks[0]);
    let title = active.tabs()[active.tab_index()].title;
    list::render_items(frame, chunks[1], title, active.list());
}

fn render_tabs(frame: &mut Frame, active: &ActiveView, area: Rect) {
    let titles: Vec<&str> = active.tabs().iter().map(|t| t.title).collect();

    let mut title = active.factory().title().to_string();
    if let Some(query) = active.factory().query().filter(|q| !q.is_empty()) {
        title = format!("{}: {}", title, query);
    }

    let tabs = Tabs::new(titles)
        .block(
            Block::default().borders(Borders::ALL).title(Span::styled(
                format!(" {} ", title),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
        )
        .select(active.tab_index())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}
