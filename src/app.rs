use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, trace, warn};

use crate::action::{Action, Loaded};
use crate::config::Config;
use crate::destination::{self, Destination, NavItem};
use crate::event::Event;
use crate::home::{ActiveView, Home, NavOutcome};
use crate::listing::{ListKind, ListView};
use crate::loader::ScopeId;
use crate::paging::PagedList;
use crate::prefs;
use crate::session::{self, Session};
use crate::types::{Bookmark, BookmarkKind, Item, Target};
use crate::user::{Navigation, UserView};

/// Rows of chrome around a list (header, tabs, borders, status bar)
const CHROME_ROWS: u16 = 6;

/// Screen pushed on top of the home container
#[derive(Debug)]
pub enum Screen {
    User(Box<UserView>),
    List(Box<ListView>),
}

impl Screen {
    fn scope_id(&self) -> ScopeId {
        match self {
            Screen::User(view) => view.scope_id(),
            Screen::List(view) => view.scope_id(),
        }
    }

    fn destroy(&mut self) {
        match self {
            Screen::User(view) => view.destroy(),
            Screen::List(view) => view.destroy(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    Drawer { items: Vec<NavItem>, selected: usize },
    Tools { selected: usize },
}

pub struct App {
    pub session: Session,
    config: Config,
    pub home: Home,
    pub stack: Vec<Screen>,
    pub popup: Option<Popup>,
    /// Query being typed, while in search mode
    pub search: Option<String>,
    pub status: Option<String>,
    pub should_quit: bool,
    page_rows: usize,
}

fn item_navigation(item: &Item) -> Navigation {
    match item.target() {
        Target::Profile(login) => Navigation::Profile(login),
        Target::Browser(url) => Navigation::Browser(url),
    }
}

impl App {
    pub fn new(
        session: Session,
        config: Config,
        initial: Destination,
        notification_repo: Option<(String, String)>,
    ) -> Self {
        let home = Home::new(&session, initial, notification_repo);
        Self {
            session,
            config,
            home,
            stack: Vec::new(),
            popup: None,
            search: None,
            status: None,
            should_quit: false,
            page_rows: 10,
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Resize(_, rows) => Action::Resize(rows),
            Event::Render => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        if self.search.is_some() {
            return match key.code {
                KeyCode::Esc => Action::ExitSearchMode,
                KeyCode::Enter => Action::SearchConfirm,
                KeyCode::Backspace => Action::SearchBackspace,
                KeyCode::Char(c) => Action::SearchInput(c),
                _ => Action::None,
            };
        }

        if self.popup.is_some() {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('q') => Action::Back,
                KeyCode::Char('m') => Action::ToggleDrawer,
                KeyCode::Char('t') => Action::ToggleToolDrawer,
                KeyCode::Char('j') | KeyCode::Down => Action::PopupDown,
                KeyCode::Char('k') | KeyCode::Up => Action::PopupUp,
                KeyCode::Enter => Action::PopupSelect,
                _ => Action::None,
            };
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('d')) => Action::PageDown,
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => Action::PageUp,
            (_, KeyCode::Char('q')) | (_, KeyCode::Esc) => Action::Back,
            (_, KeyCode::Char('j')) | (_, KeyCode::Down) => Action::ScrollDown,
            (_, KeyCode::Char('k')) | (_, KeyCode::Up) => Action::ScrollUp,
            (_, KeyCode::PageDown) => Action::PageDown,
            (_, KeyCode::PageUp) => Action::PageUp,
            (_, KeyCode::Char('g')) | (_, KeyCode::Home) => Action::GoToTop,
            (_, KeyCode::Char('G')) | (_, KeyCode::End) => Action::GoToBottom,
            (_, KeyCode::Enter) => Action::Select,
            (_, KeyCode::Tab) | (_, KeyCode::Char('l')) | (_, KeyCode::Right) => Action::NextTab,
            (_, KeyCode::BackTab) | (_, KeyCode::Char('h')) | (_, KeyCode::Left) => Action::PrevTab,
            (_, KeyCode::Char('r')) => Action::Refresh,
            (_, KeyCode::Char('m')) => Action::ToggleDrawer,
            (_, KeyCode::Char('t')) => Action::ToggleToolDrawer,
            (_, KeyCode::Char('/')) => Action::EnterSearchMode,
            (_, KeyCode::Char('f')) => Action::ToggleFollow,
            (_, KeyCode::Char('b')) => Action::AddBookmark,
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        if action.is_input() {
            self.status = None;
        }

        match action {
            Action::Back => {
                if self.popup.take().is_some() {
                    return;
                }
                match self.stack.pop() {
                    Some(mut screen) => screen.destroy(),
                    None => self.should_quit = true,
                }
            }
            Action::ScrollUp
            | Action::ScrollDown
            | Action::PageUp
            | Action::PageDown
            | Action::GoToTop
            | Action::GoToBottom => self.move_cursor(&action),
            Action::Select => self.select(),
            Action::NextTab | Action::PrevTab => {
                if !self.stack.is_empty() {
                    return;
                }
                let session = &self.session;
                if let Some(active) = self.home.active_mut() {
                    if matches!(action, Action::NextTab) {
                        active.next_tab(session);
                    } else {
                        active.prev_tab(session);
                    }
                }
            }
            Action::Refresh => {
                let session = &self.session;
                match self.stack.last_mut() {
                    Some(Screen::User(view)) => view.refresh(session),
                    Some(Screen::List(view)) => view.refresh(session),
                    None => self.home.refresh(session),
                }
            }

            // Drawers
            Action::ToggleDrawer => self.toggle_drawer(),
            Action::ToggleToolDrawer => self.toggle_tools(),
            Action::PopupUp => {
                if let Some(Popup::Drawer { selected, .. } | Popup::Tools { selected }) = self.popup.as_mut() {
                    *selected = selected.saturating_sub(1);
                }
            }
            Action::PopupDown => {
                let count = self.popup_len();
                if let Some(Popup::Drawer { selected, .. } | Popup::Tools { selected }) = self.popup.as_mut() {
                    if *selected + 1 < count {
                        *selected += 1;
                    }
                }
            }
            Action::PopupSelect => self.popup_select(),

            // Search
            Action::EnterSearchMode => {
                let factory = self.home.active().map(ActiveView::factory);
                if self.stack.is_empty() && factory.is_some_and(|f| f.accepts_query()) {
                    let query = factory.and_then(|f| f.query()).unwrap_or_default();
                    self.search = Some(query.to_string());
                }
            }
            Action::ExitSearchMode => {
                self.search = None;
            }
            Action::SearchInput(c) => {
                if let Some(query) = self.search.as_mut() {
                    query.push(c);
                }
            }
            Action::SearchBackspace => {
                if let Some(query) = self.search.as_mut() {
                    query.pop();
                }
            }
            Action::SearchConfirm => {
                if let Some(query) = self.search.take() {
                    let session = &self.session;
                    if let Some(active) = self.home.active_mut() {
                        active.search(&query, session);
                    }
                }
            }

            // Profile
            Action::ToggleFollow => {
                let session = &self.session;
                if let Some(Screen::User(view)) = self.stack.last_mut() {
                    view.toggle_follow(session);
                }
            }
            Action::FollowToggled { scope, result } => {
                let view = self.stack.iter_mut().find_map(|screen| match screen {
                    Screen::User(view) if view.scope_id() == scope => Some(view),
                    _ => None,
                });
                match view {
                    Some(view) => {
                        if let Some(message) = view.on_follow_result(result) {
                            self.status = Some(message);
                        }
                    }
                    None => trace!(?scope, "follow result for a closed profile"),
                }
            }

            Action::AddBookmark => self.add_bookmark(),

            Action::AccountReady { login, hub } => {
                self.session = self.session.switched(login, hub);
                self.close_screens();
                self.home.switch_account(&self.session);
                self.status = Some(format!("Signed in as @{}", self.session.login));
            }

            Action::Loaded { scope, data } => self.deliver(scope, data),
            Action::LoadFailed {
                scope,
                tab,
                message,
            } => {
                if self.home.owns(scope) {
                    if let Some(status) = self.home.fail(scope, tab, message) {
                        self.status = Some(status);
                    }
                    return;
                }
                match self.stack.iter_mut().find(|s| s.scope_id() == scope) {
                    Some(Screen::User(view)) => view.fail(message),
                    Some(Screen::List(view)) => view.fail(message),
                    None => trace!(?scope, "failure for a destroyed view"),
                }
            }

            Action::Resize(rows) => {
                self.page_rows = usize::from(rows.saturating_sub(CHROME_ROWS).max(1));
            }
            Action::Error(message) => {
                self.status = Some(message);
            }
            Action::None => {}
        }
    }

    /// Route a delivery to the view that started it, dropping it if that
    /// view is gone.
    fn deliver(&mut self, scope: ScopeId, data: Loaded) {
        if self.home.owns(scope) {
            self.home.apply(scope, data);
            return;
        }
        let session = &self.session;
        match self.stack.iter_mut().find(|s| s.scope_id() == scope) {
            Some(Screen::User(view)) => view.apply(data, session),
            Some(Screen::List(view)) => view.apply(data),
            None => warn!(?scope, "dropping delivery for a destroyed view"),
        }
    }

    fn current_list_mut(&mut self) -> Option<&mut PagedList<Item>> {
        match self.stack.last_mut() {
            Some(Screen::List(view)) => Some(view.list_mut()),
            Some(Screen::User(_)) => None,
            None => self.home.active_mut().map(ActiveView::list_mut),
        }
    }

    fn move_cursor(&mut self, action: &Action) {
        let rows = self.page_rows;
        if let Some(Screen::User(view)) = self.stack.last_mut() {
            match action {
                Action::ScrollUp | Action::PageUp => view.select_prev(),
                Action::GoToTop => view.selected = 0,
                _ => view.select_next(),
            }
            return;
        }

        let Some(list) = self.current_list_mut() else {
            return;
        };
        match action {
            Action::ScrollUp => list.select_prev(),
            Action::ScrollDown => list.select_next(),
            Action::PageUp => list.page_up(rows),
            Action::PageDown => list.page_down(rows),
            Action::GoToTop => list.select_first(),
            Action::GoToBottom => list.select_last(),
            _ => {}
        }
        self.load_more();
    }

    fn load_more(&mut self) {
        let session = &self.session;
        match self.stack.last_mut() {
            Some(Screen::List(view)) => view.load_more(session),
            Some(Screen::User(_)) => {}
            None => {
                if let Some(active) = self.home.active_mut() {
                    active.load_more(session);
                }
            }
        }
    }

    fn select(&mut self) {
        let navigation = match self.stack.last() {
            Some(Screen::User(view)) => view.select(),
            Some(Screen::List(view)) => view.list().selected_item().map(item_navigation),
            None => self
                .home
                .active()
                .and_then(|a| a.list().selected_item())
                .map(item_navigation),
        };

        match navigation {
            Some(Navigation::Profile(login)) => self.open_profile(&login),
            Some(Navigation::List(kind)) => self.open_list(kind),
            Some(Navigation::Browser(url)) => self.open_browser(&url),
            None => {}
        }
    }

    pub fn open_profile(&mut self, login: &str) {
        let mut view = UserView::new(login, &self.session);
        view.start(&self.session);
        self.stack.push(Screen::User(Box::new(view)));
    }

    fn open_list(&mut self, kind: ListKind) {
        let mut view = ListView::new(kind, &self.session);
        view.start(&self.session);
        self.stack.push(Screen::List(Box::new(view)));
    }

    fn open_browser(&mut self, url: &str) {
        match open::that(url) {
            Ok(()) => info!(url, "opened in browser"),
            Err(e) => self.status = Some(format!("Failed to open {}: {}", url, e)),
        }
    }

    fn close_screens(&mut self) {
        for mut screen in self.stack.drain(..) {
            screen.destroy();
        }
    }

    fn toggle_drawer(&mut self) {
        if matches!(self.popup, Some(Popup::Drawer { .. })) {
            self.popup = None;
            return;
        }
        let items = destination::drawer_items(&self.config.other_logins(&self.session.login));
        let current = self.home.active().map(|a| NavItem::Page(a.destination()));
        let selected = items
            .iter()
            .position(|item| Some(item) == current.as_ref())
            .unwrap_or(0);
        self.popup = Some(Popup::Drawer { items, selected });
    }

    fn toggle_tools(&mut self) {
        if matches!(self.popup, Some(Popup::Tools { .. })) {
            self.popup = None;
            return;
        }
        let has_tools = self
            .home
            .active()
            .is_some_and(|a| !a.tool_menu().is_empty());
        if self.stack.is_empty() && has_tools {
            self.popup = Some(Popup::Tools { selected: 0 });
        }
    }

    fn popup_len(&self) -> usize {
        match &self.popup {
            Some(Popup::Drawer { items, .. }) => items.len(),
            Some(Popup::Tools { .. }) => self.home.active().map_or(0, |a| a.tool_menu().len()),
            None => 0,
        }
    }

    fn popup_select(&mut self) {
        match self.popup.take() {
            Some(Popup::Drawer { items, selected }) => {
                if let Some(item) = items.get(selected) {
                    self.navigate(item);
                }
            }
            Some(Popup::Tools { selected }) => {
                let session = &self.session;
                if let Some(active) = self.home.active_mut() {
                    active.apply_tool(selected, session);
                }
            }
            None => {}
        }
    }

    fn navigate(&mut self, item: &NavItem) {
        match self.home.navigate(item, &self.session) {
            NavOutcome::Switched | NavOutcome::Unchanged => self.close_screens(),
            NavOutcome::OpenProfile => {
                let login = self.session.login.clone();
                self.open_profile(&login);
            }
            NavOutcome::SwitchAccount(login) => self.begin_account_switch(&login),
            NavOutcome::Quit => self.should_quit = true,
        }
    }

    fn begin_account_switch(&mut self, login: &str) {
        let account = match self.config.account(Some(login)) {
            Ok(account) => account.clone(),
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        };
        let cache_ttl = self.config.cache_ttl();
        let tx = self.session.tx.clone();
        self.status = Some(format!("Signing in as @{}...", login));

        tokio::spawn(async move {
            let action = match session::connect(&account, cache_ttl).await {
                Ok((login, hub)) => Action::AccountReady { login, hub },
                Err(e) => Action::from(e),
            };
            tx.send(action).ok();
        });
    }

    fn add_bookmark(&mut self) {
        let bookmark = match self.stack.last() {
            Some(Screen::User(view)) => Some(Bookmark {
                name: view.login().to_string(),
                url: format!("https://github.com/{}", view.login()),
                kind: BookmarkKind::User,
            }),
            Some(Screen::List(view)) => view.list().selected_item().and_then(Item::as_bookmark),
            None => self
                .home
                .active()
                .and_then(|a| a.list().selected_item())
                .and_then(Item::as_bookmark),
        };

        let Some(bookmark) = bookmark else {
            return;
        };
        let name = bookmark.name.clone();
        self.status = Some(if prefs::add_bookmark(self.session.prefs.as_ref(), bookmark) {
            format!("Bookmarked {}", name)
        } else {
            format!("{} is already bookmarked", name)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn app(initial: Destination) -> (App, UnboundedReceiver<Action>) {
        let (session, rx) = testing::session();
        (App::new(session, Config::default(), initial, None), rx)
    }

    /// Feed background deliveries back in, the way the main loop does
    async fn pump(app: &mut App, rx: &mut UnboundedReceiver<Action>) {
        for _ in 0..3 {
            testing::settle().await;
            for action in testing::drain(rx) {
                app.update(action);
            }
        }
    }

    #[tokio::test]
    async fn keys_map_to_actions() {
        let (app, _rx) = app(Destination::NewsFeed);
        assert!(matches!(app.handle_event(key(KeyCode::Char('j'))), Action::ScrollDown));
        assert!(matches!(app.handle_event(key(KeyCode::Char('m'))), Action::ToggleDrawer));
        assert!(matches!(app.handle_event(key(KeyCode::Char('/'))), Action::EnterSearchMode));
        assert!(matches!(
            app.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL))),
            Action::PageDown
        ));
        assert!(matches!(app.handle_event(Event::Resize(80, 30)), Action::Resize(30)));
    }

    #[tokio::test]
    async fn search_mode_captures_typing() {
        let (mut app, mut rx) = app(Destination::Search);
        app.update(Action::EnterSearchMode);
        assert_eq!(app.search.as_deref(), Some(""));
        assert!(matches!(app.handle_event(key(KeyCode::Char('q'))), Action::SearchInput('q')));

        for c in "tuix".chars() {
            app.update(Action::SearchInput(c));
        }
        app.update(Action::SearchBackspace);
        app.update(Action::SearchConfirm);
        assert!(app.search.is_none());
        pump(&mut app, &mut rx).await;

        let active = app.home.active().unwrap();
        assert_eq!(active.factory().query(), Some("tui"));
        assert_eq!(active.list().items[0].title(), "found/tui");
    }

    #[tokio::test]
    async fn search_is_only_offered_where_queries_apply() {
        let (mut app, _rx) = app(Destination::NewsFeed);
        app.update(Action::EnterSearchMode);
        assert!(app.search.is_none());
    }

    #[tokio::test]
    async fn drawer_switches_pages_and_closes_screens() {
        let (mut app, mut rx) = app(Destination::NewsFeed);
        pump(&mut app, &mut rx).await;
        app.update(Action::Select);
        assert_eq!(app.stack.len(), 1);

        app.update(Action::ToggleDrawer);
        match &app.popup {
            Some(Popup::Drawer { selected, .. }) => assert_eq!(*selected, 0),
            other => panic!("expected the drawer, got {:?}", other),
        }
        app.update(Action::PopupDown);
        app.update(Action::PopupSelect);

        assert!(app.popup.is_none());
        assert!(app.stack.is_empty());
        assert_eq!(
            app.home.active().map(ActiveView::destination),
            Some(Destination::Notifications)
        );
    }

    #[tokio::test]
    async fn back_unwinds_popup_then_screens_then_quits() {
        let (mut app, mut rx) = app(Destination::NewsFeed);
        pump(&mut app, &mut rx).await;
        app.open_profile("octocat");
        app.update(Action::ToggleDrawer);

        app.update(Action::Back);
        assert!(app.popup.is_none());
        assert_eq!(app.stack.len(), 1);
        app.update(Action::Back);
        assert!(app.stack.is_empty());
        assert!(!app.should_quit);
        app.update(Action::Back);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn deliveries_for_closed_screens_are_dropped() {
        let (mut app, mut rx) = app(Destination::NewsFeed);
        pump(&mut app, &mut rx).await;
        app.open_profile("octocat");
        app.update(Action::Back);
        pump(&mut app, &mut rx).await;
        assert!(app.stack.is_empty());
        assert!(app.status.is_none());
    }

    #[tokio::test]
    async fn selecting_an_event_opens_the_actor_profile() {
        let (mut app, mut rx) = app(Destination::NewsFeed);
        pump(&mut app, &mut rx).await;
        app.update(Action::Select);
        pump(&mut app, &mut rx).await;

        match app.stack.last() {
            Some(Screen::User(view)) => {
                assert_eq!(view.login(), "hubot");
                assert!(view.user.is_some());
            }
            other => panic!("expected a profile, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn profile_rows_open_lists() {
        let (mut app, mut rx) = app(Destination::NewsFeed);
        app.open_profile("octocat");
        pump(&mut app, &mut rx).await;
        app.update(Action::Select);
        pump(&mut app, &mut rx).await;

        match app.stack.last() {
            Some(Screen::List(view)) => {
                assert_eq!(view.title(), "Followers of @octocat");
                assert_eq!(view.list().items.len(), 1);
            }
            other => panic!("expected a list, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn follow_toggle_round_trips_through_the_loop() {
        let (mut app, mut rx) = app(Destination::NewsFeed);
        app.open_profile("octocat");
        pump(&mut app, &mut rx).await;
        app.update(Action::ToggleFollow);
        pump(&mut app, &mut rx).await;

        match app.stack.last() {
            Some(Screen::User(view)) => {
                assert_eq!(view.follow.following(), Some(true));
                assert_eq!(view.user.as_ref().map(|u| u.followers), Some(11));
            }
            other => panic!("expected a profile, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn bookmarks_are_added_once() {
        let (mut app, mut rx) = app(Destination::MyRepos);
        pump(&mut app, &mut rx).await;
        app.update(Action::AddBookmark);
        assert_eq!(app.status.as_deref(), Some("Bookmarked me/one"));
        app.update(Action::AddBookmark);
        assert_eq!(app.status.as_deref(), Some("me/one is already bookmarked"));
        assert_eq!(prefs::bookmarks(app.session.prefs.as_ref()).len(), 1);
    }

    #[tokio::test]
    async fn tool_drawer_applies_entries() {
        let (mut app, mut rx) = app(Destination::MyIssues);
        pump(&mut app, &mut rx).await;
        app.update(Action::ToggleToolDrawer);
        assert_eq!(app.popup, Some(Popup::Tools { selected: 0 }));
        app.update(Action::PopupDown);
        app.update(Action::PopupDown);
        assert_eq!(app.popup, Some(Popup::Tools { selected: 1 }));
        app.update(Action::PopupSelect);
        pump(&mut app, &mut rx).await;

        let menu = app.home.active().unwrap().tool_menu();
        assert!(menu[1].checked);
    }

    #[tokio::test]
    async fn pages_without_tools_ignore_the_tool_drawer() {
        let (mut app, _rx) = app(Destination::Blog);
        app.update(Action::ToggleToolDrawer);
        assert!(app.popup.is_none());
    }

    #[tokio::test]
    async fn unknown_account_is_reported() {
        let (mut app, _rx) = app(Destination::NewsFeed);
        app.navigate(&NavItem::SwitchAccount("nobody".into()));
        assert_eq!(
            app.status.as_deref(),
            Some("Configuration error: no account 'nobody' configured")
        );
    }

    #[tokio::test]
    async fn account_header_failure_shows_in_the_status_line() {
        let hub = std::sync::Arc::new(testing::FakeHub::default());
        hub.fail_user(true);
        let (session, mut rx) = testing::session_with(hub);
        let mut app = App::new(session, Config::default(), Destination::NewsFeed, None);
        pump(&mut app, &mut rx).await;

        assert!(app.home.account.is_none());
        assert_eq!(
            app.status.as_deref(),
            Some("Failed to load account: API error: Not Found")
        );
    }

    #[tokio::test]
    async fn account_ready_rebuilds_for_the_new_login() {
        let (mut app, mut rx) = app(Destination::MyGists);
        pump(&mut app, &mut rx).await;
        app.open_profile("octocat");

        app.update(Action::AccountReady {
            login: "work".into(),
            hub: std::sync::Arc::new(testing::FakeHub::default()),
        });
        assert!(app.stack.is_empty());
        assert_eq!(app.session.login, "work");
        pump(&mut app, &mut rx).await;
        assert_eq!(
            app.home.account.as_ref().map(|a| a.login.as_str()),
            Some("work")
        );
        assert_eq!(
            app.home.active().map(ActiveView::destination),
            Some(Destination::MyGists)
        );
    }
}
