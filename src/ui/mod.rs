mod home;
mod list;
mod popup;
mod user;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{App, Popup, Screen};
use popup::MenuEntry;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match app.stack.last() {
        Some(Screen::User(view)) => user::render(frame, view, chunks[1]),
        Some(Screen::List(view)) => list::render_items(frame, chunks[1], &view.title(), view.list()),
        None => home::render(frame, &app.home, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);

    match &app.popup {
        Some(Popup::Drawer { items, selected }) => {
            let entries: Vec<MenuEntry> = items.iter().map(|i| MenuEntry::plain(i.label())).collect();
            popup::render_menu(frame, "Go to", &entries, *selected);
        }
        Some(Popup::Tools { selected }) => {
            if let Some(active) = app.home.active() {
                let entries: Vec<MenuEntry> = active
                    .tool_menu()
                    .into_iter()
                    .map(|t| MenuEntry::toggle(t.label, t.checked))
                    .collect();
                popup::render_menu(frame, "Options", &entries, *selected);
            }
        }
        None => {}
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.stack.last() {
        Some(Screen::User(view)) => format!("@{}", view.login()),
        Some(Screen::List(view)) => view.title(),
        None => app
            .home
            .active()
            .map(|a| a.factory().title().to_string())
            .unwrap_or_default(),
    };

    let mut spans = vec![Span::styled(
        format!("hubdeck - {}", title),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];

    let account = app
        .home
        .account
        .as_ref()
        .map_or(app.session.login.as_str(), |a| a.login.as_str());
    spans.push(Span::styled(
        format!("  @{}", account),
        Style::default().fg(Color::Gray),
    ));
    if app.home.has_unread {
        spans.push(Span::styled(" ●", Style::default().fg(Color::Yellow)));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(query) = &app.search {
        Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::raw(query.clone()),
            Span::styled("█", Style::default().fg(Color::Gray)),
        ])
    } else if let Some(message) = &app.status {
        Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red)))
    } else {
        let help = match app.stack.last() {
            Some(Screen::User(_)) => "j/k: nav | Enter: open | f: follow | b: bookmark | r: refresh | q: back",
            Some(Screen::List(_)) => "j/k/g/G: nav | Ctrl+d/u: page | Enter: open | b: bookmark | r: refresh | q: back",
            None => "h/l: tabs | j/k/g/G: nav | Enter: open | m: menu | t: options | /: search | r: refresh | q: quit",
        };
        Line::from(Span::styled(help, Style::default().fg(Color::Gray)))
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}
