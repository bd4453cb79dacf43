use chrono::{DateTime, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::paging::PagedList;
use crate::types::Item;

/// Render a paged list of items with its loading, empty and error states
pub fn render_items(frame: &mut Frame, area: Rect, title: &str, list: &PagedList<Item>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {} ({}) ", title, list.items.len()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(Color::DarkGray));

    if list.items.is_empty() {
        let (text, color) = match (&list.error, list.loading) {
            (Some(error), _) => (format!("Error: {}", error), Color::Red),
            (None, true) => ("Loading...".to_string(), Color::Yellow),
            (None, false) => ("Nothing here".to_string(), Color::Gray),
        };
        let empty = Paragraph::new(text)
            .block(block)
            .style(Style::default().fg(color));
        frame.render_widget(empty, area);
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let mut rows: Vec<ListItem> = list
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| ListItem::new(item_lines(item, i == list.selected, width)))
        .collect();

    if list.loading {
        rows.push(ListItem::new(Line::from(Span::styled(
            "Loading more...",
            Style::default().fg(Color::Yellow),
        ))));
    } else if let Some(error) = &list.error {
        rows.push(ListItem::new(Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        ))));
    }

    let widget = List::new(rows)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(list.selected));
    frame.render_stateful_widget(widget, area, &mut state);
}

fn item_lines(item: &Item, selected: bool, width: usize) -> Vec<Line<'static>> {
    let title_style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };

    let age = item.updated_at().map(format_age).unwrap_or_default();
    let meta = item.meta().unwrap_or_default();
    let fixed = age.chars().count() + meta.chars().count() + 4;

    let mut first = vec![Span::styled(
        truncate(&item.title(), width.saturating_sub(fixed).max(10)),
        title_style,
    )];
    if !meta.is_empty() {
        first.push(Span::raw("  "));
        first.push(Span::styled(meta, Style::default().fg(Color::Gray)));
    }
    if !age.is_empty() {
        first.push(Span::raw("  "));
        first.push(Span::styled(age, Style::default().fg(Color::DarkGray)));
    }

    let mut lines = vec![Line::from(first)];
    if let Some(detail) = item.detail().filter(|d| !d.trim().is_empty()) {
        lines.push(Line::from(Span::styled(
            format!("  {}", truncate(&detail, width.saturating_sub(2).max(10))),
            Style::default().fg(Color::Gray),
        )));
    }
    lines
}

pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

pub fn format_age(dt: DateTime<Utc>) -> String {
    format_age_at(dt, Utc::now())
}

fn format_age_at(dt: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(dt);

    if duration.num_days() > 365 {
        format!("{}y", duration.num_days() / 365)
    } else if duration.num_days() > 0 {
        format!("{}d", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m", duration.num_minutes())
    } else {
        "now".to_string()
    }
}
