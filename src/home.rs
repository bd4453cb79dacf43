use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::action::{Action, Loaded};
use crate::destination::{self, Destination, NavItem};
use crate::factory::{Factory, Tab, ToolEntry};
use crate::feed;
use crate::hub::NotificationFilter;
use crate::loader::{LoadKey, LoaderScope, ScopeId};
use crate::paging::PagedList;
use crate::prefs::KEY_LAST_PAGE;
use crate::session::Session;
use crate::types::{Item, UserProfile};

/// Loads owned by the container itself rather than the current page
pub const LOADER_ACCOUNT: LoadKey = 0;
pub const LOADER_UNREAD: LoadKey = 1;

/// The page currently installed in the container, with its tabs and loads.
#[derive(Debug)]
pub struct ActiveView {
    factory: Factory,
    tabs: Vec<Tab>,
    lists: Vec<PagedList<Item>>,
    tab: usize,
    scope: LoaderScope,
}

impl ActiveView {
    fn new(factory: Factory, tx: mpsc::UnboundedSender<Action>) -> Self {
        let tabs = factory.tabs();
        let lists = tabs.iter().map(|_| PagedList::default()).collect();
        Self {
            factory,
            tabs,
            lists,
            tab: 0,
            scope: LoaderScope::new(tx),
        }
    }

    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    pub fn destination(&self) -> Destination {
        self.factory.destination()
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn tab_index(&self) -> usize {
        self.tab
    }

    pub fn scope_id(&self) -> ScopeId {
        self.scope.id()
    }

    pub fn tool_menu(&self) -> Vec<ToolEntry> {
        self.factory.tool_menu()
    }

    pub fn list(&self) -> &PagedList<Item> {
        &self.lists[self.tab]
    }

    pub fn list_mut(&mut self) -> &mut PagedList<Item> {
        &mut self.lists[self.tab]
    }

    fn ensure_current(&mut self, session: &Session) {
        let tab = self.tab;
        feed::ensure_loaded(
            &mut self.scope,
            session,
            tab,
            &self.tabs[tab].feed,
            &mut self.lists[tab],
        );
    }

    /// Reload the visible tab now and the others when next shown
    pub fn refresh(&mut self, session: &Session) {
        let tab = self.tab;
        for (index, list) in self.lists.iter_mut().enumerate() {
            if index != tab {
                list.invalidate();
            }
        }
        feed::load_first_page(
            &mut self.scope,
            session,
            tab,
            &self.tabs[tab].feed,
            &mut self.lists[tab],
            true,
        );
    }

    pub fn select_tab(&mut self, index: usize, session: &Session) {
        if index < self.tabs.len() && index != self.tab {
            self.tab = index;
            self.ensure_current(session);
        }
    }

    pub fn next_tab(&mut self, session: &Session) {
        self.select_tab((self.tab + 1) % self.tabs.len(), session);
    }

    pub fn prev_tab(&mut self, session: &Session) {
        let count = self.tabs.len();
        self.select_tab((self.tab + count - 1) % count, session);
    }

    pub fn load_more(&mut self, session: &Session) {
        let tab = self.tab;
        if self.lists[tab].wants_more() {
            feed::load_next_page(
                &mut self.scope,
                session,
                tab,
                &self.tabs[tab].feed,
                &mut self.lists[tab],
            );
        }
    }

    /// Apply a tool drawer entry, reloading when it changes what is shown
    pub fn apply_tool(&mut self, index: usize, session: &Session) -> bool {
        if !self.factory.apply_tool(index, session.prefs.as_ref()) {
            return false;
        }
        self.rebuild(session);
        true
    }

    pub fn search(&mut self, query: &str, session: &Session) -> bool {
        if !self.factory.set_query(query) {
            return false;
        }
        self.rebuild(session);
        true
    }

    fn rebuild(&mut self, session: &Session) {
        self.tabs = self.factory.tabs();
        self.lists.resize_with(self.tabs.len(), PagedList::default);
        for list in &mut self.lists {
            list.invalidate();
        }
        self.tab = self.tab.min(self.tabs.len().saturating_sub(1));
        self.ensure_current(session);
    }

    fn apply(&mut self, data: Loaded) {
        match data {
            Loaded::Page {
                tab,
                generation,
                page,
                items,
            } => match self.lists.get_mut(tab) {
                Some(list) => {
                    if !list.apply(generation, page, items) {
                        debug!(tab, page, "dropping stale page");
                    }
                }
                None => warn!(tab, "page delivered for a tab that does not exist"),
            },
            other => debug!(?other, "ignoring delivery not meant for a home page"),
        }
    }

    fn fail(&mut self, tab: Option<usize>, message: String) {
        match tab.and_then(|tab| self.lists.get_mut(tab)) {
            Some(list) => list.fail(message),
            None => warn!(?tab, error = %message, "load failed outside any tab"),
        }
    }

    fn destroy(&mut self) {
        self.scope.destroy();
    }
}

/// What a drawer entry asks of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Switched,
    Unchanged,
    OpenProfile,
    SwitchAccount(String),
    Quit,
}

/// Top-level container: account header plus exactly one installed page.
#[derive(Debug)]
pub struct Home {
    active: Option<ActiveView>,
    switching: bool,
    scope: LoaderScope,
    pub account: Option<UserProfile>,
    pub has_unread: bool,
}

impl Home {
    pub fn new(
        session: &Session,
        initial: Destination,
        notification_repo: Option<(String, String)>,
    ) -> Self {
        let mut home = Self {
            active: None,
            switching: false,
            scope: LoaderScope::new(session.tx.clone()),
            account: None,
            has_unread: false,
        };
        home.load_account(session, false);
        home.switch_to(
            Factory::for_destination(initial, session, notification_repo),
            session,
        );
        home
    }

    pub fn active(&self) -> Option<&ActiveView> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut ActiveView> {
        self.active.as_mut()
    }

    pub fn scope_id(&self) -> ScopeId {
        self.scope.id()
    }

    /// Replace the installed page. The previous page's loads are cancelled
    /// before the new one starts, and the choice is remembered for "last".
    pub fn switch_to(&mut self, factory: Factory, session: &Session) -> bool {
        if self.switching {
            warn!("page switch requested while another is in progress");
            return false;
        }
        self.switching = true;

        let destination = factory.destination();
        if let Some(mut previous) = self.active.take() {
            debug!(
                from = previous.destination().persisted_key(),
                to = destination.persisted_key(),
                "switching home page"
            );
            previous.destroy();
        }

        session.prefs.set(KEY_LAST_PAGE, destination.persisted_key());
        let mut view = ActiveView::new(factory, session.tx.clone());
        view.ensure_current(session);
        self.active = Some(view);

        self.switching = false;
        true
    }

    pub fn navigate(&mut self, item: &NavItem, session: &Session) -> NavOutcome {
        match item {
            NavItem::Page(page) if self.active().map(ActiveView::destination) == Some(*page) => {
                NavOutcome::Unchanged
            }
            NavItem::Page(_) => match destination::resolve(item, session, None) {
                Some(factory) => {
                    if self.switch_to(factory, session) {
                        NavOutcome::Switched
                    } else {
                        NavOutcome::Unchanged
                    }
                }
                None => NavOutcome::Unchanged,
            },
            NavItem::Profile => NavOutcome::OpenProfile,
            NavItem::SwitchAccount(login) => NavOutcome::SwitchAccount(login.clone()),
            NavItem::Logout => NavOutcome::Quit,
        }
    }

    /// Force-reload the account header and the current page
    pub fn refresh(&mut self, session: &Session) {
        self.load_account(session, true);
        if let Some(active) = self.active.as_mut() {
            active.refresh(session);
        }
    }

    /// Rebuild everything for `session`, which belongs to another account.
    /// The current destination is kept.
    pub fn switch_account(&mut self, session: &Session) {
        info!(login = %session.login, "switching account");
        self.scope.destroy();
        self.scope = LoaderScope::new(session.tx.clone());
        self.account = None;
        self.has_unread = false;
        self.load_account(session, true);

        let destination = self
            .active()
            .map(ActiveView::destination)
            .unwrap_or(Destination::NewsFeed);
        self.switch_to(Factory::for_destination(destination, session, None), session);
    }

    fn load_account(&mut self, session: &Session, force: bool) {
        let hub = Arc::clone(&session.hub);
        let login = session.login.clone();
        self.scope.spawn(
            LOADER_ACCOUNT,
            force,
            async move { hub.get_user(&login, force).await },
            |user| Loaded::Account(Box::new(user)),
        );

        let hub = Arc::clone(&session.hub);
        self.scope.spawn(
            LOADER_UNREAD,
            force,
            async move {
                let unread = hub
                    .notifications(&NotificationFilter::default(), 1, 1, force)
                    .await?;
                Ok(!unread.items.is_empty())
            },
            Loaded::UnreadNotifications,
        );
    }

    pub fn owns(&self, scope: ScopeId) -> bool {
        scope == self.scope.id() || self.active().is_some_and(|a| a.scope_id() == scope)
    }

    pub fn apply(&mut self, scope: ScopeId, data: Loaded) {
        if scope == self.scope.id() {
            match data {
                Loaded::Account(user) => self.account = Some(*user),
                Loaded::UnreadNotifications(unread) => self.has_unread = unread,
                other => debug!(?other, "ignoring delivery not meant for the container"),
            }
        } else if let Some(active) = self.active.as_mut().filter(|a| a.scope_id() == scope) {
            active.apply(data);
        } else {
            trace!(?scope, "dropping delivery for a replaced page");
        }
    }

    /// Route a failed load. Header failures have no list to show them, so
    /// they come back as a status line message.
    pub fn fail(&mut self, scope: ScopeId, tab: Option<usize>, message: String) -> Option<String> {
        if scope == self.scope.id() {
            warn!(error = %message, "failed to load account header");
            return Some(format!("Failed to load account: {}", message));
        }
        if let Some(active) = self.active.as_mut().filter(|a| a.scope_id() == scope) {
            active.fail(tab, message);
        }
        None
    }

    pub fn destroy(&mut self) {
        self.scope.destroy();
        if let Some(active) = self.active.as_mut() {
            active.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FakeHub};
    use tokio::sync::mpsc::UnboundedReceiver;

    async fn pump(home: &mut Home, rx: &mut UnboundedReceiver<Action>) -> Vec<ScopeId> {
        testing::settle().await;
        let mut scopes = Vec::new();
        for action in testing::drain(rx) {
            match action {
                Action::Loaded { scope, data } => {
                    scopes.push(scope);
                    home.apply(scope, data);
                }
                Action::LoadFailed {
                    scope,
                    tab,
                    message,
                } => {
                    scopes.push(scope);
                    home.fail(scope, tab, message);
                }
                _ => {}
            }
        }
        scopes
    }

    fn active(home: &Home) -> &ActiveView {
        home.active().expect("a page is always installed")
    }

    #[tokio::test]
    async fn initial_page_loads_and_is_remembered() {
        let (session, mut rx) = testing::session();
        let mut home = Home::new(&session, Destination::MyGists, None);
        pump(&mut home, &mut rx).await;

        assert_eq!(active(&home).destination(), Destination::MyGists);
        assert_eq!(active(&home).list().items.len(), 1);
        assert_eq!(home.account.as_ref().map(|a| a.login.as_str()), Some("me"));
        assert!(home.has_unread);
        assert_eq!(session.prefs.get(KEY_LAST_PAGE).as_deref(), Some("gists"));
    }

    #[tokio::test]
    async fn switching_cancels_the_previous_page() {
        let hub = Arc::new(FakeHub::gated());
        let (session, mut rx) = testing::session_with(Arc::clone(&hub));
        let mut home = Home::new(&session, Destination::NewsFeed, None);
        let old_scope = active(&home).scope_id();
        testing::settle().await;

        let outcome = home.navigate(&NavItem::Page(Destination::Blog), &session);
        assert_eq!(outcome, NavOutcome::Switched);
        assert!(!home.owns(old_scope));

        hub.release();
        let delivered = pump(&mut home, &mut rx).await;
        assert!(!delivered.contains(&old_scope));
        assert!(matches!(active(&home).list().items.first(), Some(Item::Post(_))));
        assert_eq!(session.prefs.get(KEY_LAST_PAGE).as_deref(), Some("blog"));
    }

    #[tokio::test]
    async fn choosing_the_current_page_changes_nothing() {
        let (session, mut rx) = testing::session();
        let mut home = Home::new(&session, Destination::Timeline, None);
        pump(&mut home, &mut rx).await;
        let scope = active(&home).scope_id();

        let outcome = home.navigate(&NavItem::Page(Destination::Timeline), &session);
        assert_eq!(outcome, NavOutcome::Unchanged);
        assert_eq!(active(&home).scope_id(), scope);
    }

    #[tokio::test]
    async fn account_entries_are_left_to_the_caller() {
        let (session, _rx) = testing::session();
        let mut home = Home::new(&session, Destination::Timeline, None);
        assert_eq!(home.navigate(&NavItem::Profile, &session), NavOutcome::OpenProfile);
        assert_eq!(
            home.navigate(&NavItem::SwitchAccount("work".into()), &session),
            NavOutcome::SwitchAccount("work".into())
        );
        assert_eq!(home.navigate(&NavItem::Logout, &session), NavOutcome::Quit);
    }

    #[tokio::test]
    async fn refresh_reloads_visible_tab_and_invalidates_others() {
        let hub = Arc::new(FakeHub::default());
        let (session, mut rx) = testing::session_with(Arc::clone(&hub));
        let mut home = Home::new(&session, Destination::MyRepos, None);
        pump(&mut home, &mut rx).await;
        assert_eq!(hub.calls("list_repos"), 1);

        home.active_mut().unwrap().next_tab(&session);
        pump(&mut home, &mut rx).await;
        assert_eq!(hub.calls("list_starred"), 1);

        home.refresh(&session);
        pump(&mut home, &mut rx).await;
        assert_eq!(hub.calls("list_starred"), 2);
        assert_eq!(hub.calls("list_repos"), 1);
        assert_eq!(hub.calls("get_user"), 2);

        home.active_mut().unwrap().prev_tab(&session);
        pump(&mut home, &mut rx).await;
        assert_eq!(hub.calls("list_repos"), 2);
        assert_eq!(active(&home).list().items.len(), 2);
    }

    #[tokio::test]
    async fn revisiting_a_loaded_tab_does_not_reload() {
        let hub = Arc::new(FakeHub::default());
        let (session, mut rx) = testing::session_with(Arc::clone(&hub));
        let mut home = Home::new(&session, Destination::MyGists, None);
        pump(&mut home, &mut rx).await;

        let view = home.active_mut().unwrap();
        view.next_tab(&session);
        view.next_tab(&session);
        pump(&mut home, &mut rx).await;
        assert_eq!(hub.calls("list_gists"), 2);
        assert_eq!(active(&home).tab_index(), 0);
    }

    #[tokio::test]
    async fn scrolling_to_the_end_appends_the_next_page() {
        let (session, mut rx) = testing::session();
        let mut home = Home::new(&session, Destination::MyRepos, None);
        pump(&mut home, &mut rx).await;

        let view = home.active_mut().unwrap();
        view.list_mut().select_last();
        view.load_more(&session);
        pump(&mut home, &mut rx).await;

        let names: Vec<String> = active(&home).list().items.iter().map(Item::title).collect();
        assert_eq!(names, vec!["me/one", "me/two", "me/three"]);
    }

    #[tokio::test]
    async fn tool_entries_reload_the_page() {
        let (session, mut rx) = testing::session();
        let mut home = Home::new(&session, Destination::Notifications, None);
        pump(&mut home, &mut rx).await;
        assert_eq!(active(&home).list().items.len(), 1);

        assert!(home.active_mut().unwrap().apply_tool(0, &session));
        pump(&mut home, &mut rx).await;
        assert_eq!(active(&home).list().items.len(), 2);
        assert!(active(&home).tool_menu()[0].checked);
    }

    #[tokio::test]
    async fn search_runs_the_query_on_every_tab() {
        let hub = Arc::new(FakeHub::default());
        let (session, mut rx) = testing::session_with(Arc::clone(&hub));
        let mut home = Home::new(&session, Destination::Search, None);
        pump(&mut home, &mut rx).await;
        assert!(active(&home).list().items.is_empty());
        assert_eq!(hub.calls("search_repos"), 0);

        assert!(home.active_mut().unwrap().search("tui", &session));
        pump(&mut home, &mut rx).await;
        assert_eq!(active(&home).list().items[0].title(), "found/tui");

        home.active_mut().unwrap().next_tab(&session);
        pump(&mut home, &mut rx).await;
        assert_eq!(active(&home).list().items[0].title(), "tui");
    }

    #[tokio::test]
    async fn switching_account_rebuilds_the_current_page() {
        let (session, mut rx) = testing::session();
        let mut home = Home::new(&session, Destination::NewsFeed, None);
        pump(&mut home, &mut rx).await;
        let old_home_scope = home.scope_id();

        let other = session.switched("work".into(), Arc::new(FakeHub::default()));
        home.switch_account(&other);
        assert!(!home.owns(old_home_scope));
        assert!(home.account.is_none());

        pump(&mut home, &mut rx).await;
        assert_eq!(active(&home).destination(), Destination::NewsFeed);
        assert_eq!(home.account.as_ref().map(|a| a.login.as_str()), Some("work"));
        assert_eq!(
            active(&home).factory(),
            &Factory::NewsFeed {
                login: "work".into()
            }
        );
    }

    #[tokio::test]
    async fn failures_land_on_the_tab_that_failed() {
        let (session, _rx) = testing::session();
        let mut home = Home::new(&session, Destination::MyRepos, None);
        let scope = active(&home).scope_id();
        assert_eq!(home.fail(scope, Some(0), "rate limited".into()), None);
        assert_eq!(active(&home).list().error.as_deref(), Some("rate limited"));
        assert!(!active(&home).list().loading);
    }

    #[tokio::test]
    async fn header_failures_become_a_message() {
        let (session, _rx) = testing::session();
        let mut home = Home::new(&session, Destination::MyRepos, None);
        let message = home.fail(home.scope.id(), None, "Bad credentials".into());
        assert_eq!(message.as_deref(), Some("Failed to load account: Bad credentials"));
        assert!(active(&home).list().error.is_none());
    }
}
