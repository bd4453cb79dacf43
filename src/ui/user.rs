use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use super::list::format_age;
use crate::user::{ProfileRow, UserView};

pub fn render(frame: &mut Frame, view: &UserView, area: Rect) {
    let Some(user) = &view.user else {
        let (text, color) = if view.is_loading() {
            (format!("Loading @{}...", view.login()), Color::Yellow)
        } else {
            let error = view.error.as_deref().unwrap_or_default();
            (format!("Error: {}", error), Color::Red)
        };
        let block = Block::default().borders(Borders::ALL);
        frame.render_widget(
            Paragraph::new(text).block(block).style(Style::default().fg(color)),
            area,
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)])
        .split(area);

    let mut name_line = vec![Span::styled(
        user.display_name().to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if user.display_name() != user.login {
        name_line.push(Span::styled(
            format!("  @{}", user.login),
            Style::default().fg(Color::Gray),
        ));
    }
    if let Some(follow) = follow_label(view) {
        name_line.push(Span::raw("  "));
        name_line.push(follow);
    }

    let facts: Vec<String> = [
        user.company.clone(),
        user.location.clone(),
        user.email.clone(),
        user.blog.clone().filter(|b| !b.is_empty()),
        user.created_at.map(|c| format!("joined {} ago", format_age(c))),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut header = vec![Line::from(name_line), Line::from("")];
    if !facts.is_empty() {
        header.push(Line::from(Span::styled(
            facts.join(" · "),
            Style::default().fg(Color::Gray),
        )));
    }
    if let Some(error) = &view.error {
        header.push(Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )));
    }

    let kind = if user.is_organization() { "Organization" } else { "User" };
    let header = Paragraph::new(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", kind))
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(header, chunks[0]);

    let items: Vec<ListItem> = view
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i == view.selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(row_label(view, row), style)))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(view.selected));
    frame.render_stateful_widget(list, chunks[1], &mut state);
}

fn follow_label(view: &UserView) -> Option<Span<'static>> {
    if !view.can_follow() {
        return None;
    }
    if view.follow.is_busy() {
        return Some(Span::styled("[...]", Style::default().fg(Color::DarkGray)));
    }
    let span = match view.follow.following() {
        Some(true) => Span::styled("[f] Unfollow", Style::default().fg(Color::Red)),
        _ => Span::styled("[f] Follow", Style::default().fg(Color::Green)),
    };
    Some(span)
}

fn count(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "…".to_string(), |v| v.to_string())
}

fn row_label(view: &UserView, row: ProfileRow) -> String {
    let user = view.user.as_ref();
    match row {
        ProfileRow::Followers => format!("Followers        {}", count(user.map(|u| u.followers))),
        ProfileRow::Following => format!("Following        {}", count(user.map(|u| u.following))),
        ProfileRow::Members => format!("Members          {}", count(view.member_count)),
        ProfileRow::Repositories => {
            format!("Repositories     {}", count(user.map(|u| u.repo_count())))
        }
        ProfileRow::Gists => format!("Gists            {}", count(user.map(|u| u.gist_count()))),
        ProfileRow::Starred => "Starred".to_string(),
        ProfileRow::Repo(index) => view
            .top_repos
            .as_ref()
            .and_then(|repos| repos.get(index))
            .map(|repo| format!("  {}  ★ {}", repo.full_name(), repo.stars))
            .unwrap_or_default(),
        ProfileRow::Org(index) => view
            .organizations
            .as_ref()
            .and_then(|orgs| orgs.get(index))
            .map(|org| format!("  @{}", org.login))
            .unwrap_or_default(),
    }
}
