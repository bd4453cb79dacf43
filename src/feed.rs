use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::action::Loaded;
use crate::error::Result;
use crate::hub::{Hub, NotificationFilter, RepoQuery};
use crate::loader::{LoadKey, LoaderScope};
use crate::paging::{Page, PagedList};
use crate::prefs::{self, PrefStore};
use crate::session::Session;
use crate::types::Item;

/// Where the rows of one list come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    ReceivedEvents { login: String },
    PublicEvents,
    Notifications(NotificationFilter),
    Repos(RepoQuery),
    Starred { login: String, sort: String, direction: String },
    Issues { query: String },
    Gists { login: String },
    StarredGists,
    RepoSearch { query: String, sort: Option<String> },
    UserSearch { query: String },
    Blog,
    Bookmarks,
    Followers { login: String },
    Following { login: String },
    Members { org: String },
}

impl Feed {
    /// Repositories created after `since`, most starred first
    pub fn trending(since: NaiveDate) -> Self {
        Feed::RepoSearch {
            query: format!("created:>{}", since.format("%Y-%m-%d")),
            sort: Some("stars".to_string()),
        }
    }

    /// Trending window ending `today` and spanning `days`
    pub fn trending_since(today: NaiveDate, days: i64) -> Self {
        Self::trending(today - Duration::days(days))
    }

    pub async fn fetch(
        &self,
        hub: &dyn Hub,
        store: &dyn PrefStore,
        page: u32,
        bypass_cache: bool,
    ) -> Result<Page<Item>> {
        let page = match self {
            Feed::ReceivedEvents { login } => hub
                .received_events(login, page, bypass_cache)
                .await?
                .map(Item::Event),
            Feed::PublicEvents => hub.public_events(page, bypass_cache).await?.map(Item::Event),
            Feed::Notifications(filter) => hub
                .notifications(filter, 50, page, bypass_cache)
                .await?
                .map(Item::Notification),
            Feed::Repos(query) => hub
                .list_repos(query, page, bypass_cache)
                .await?
                .map(Item::Repo),
            Feed::Starred {
                login,
                sort,
                direction,
            } => hub
                .list_starred(login, sort, direction, page, bypass_cache)
                .await?
                .map(Item::Repo),
            Feed::Issues { query } => hub
                .search_issues(query, page, bypass_cache)
                .await?
                .map(Item::Issue),
            Feed::Gists { login } => hub
                .list_gists(login, page, bypass_cache)
                .await?
                .map(Item::Gist),
            Feed::StarredGists => hub.starred_gists(page, bypass_cache).await?.map(Item::Gist),
            Feed::RepoSearch { query, .. } | Feed::UserSearch { query } if query.trim().is_empty() => {
                Page::last(Vec::new())
            }
            Feed::RepoSearch { query, sort } => hub
                .search_repos(query, sort.as_deref(), page, bypass_cache)
                .await?
                .map(Item::Repo),
            Feed::UserSearch { query } => hub
                .search_users(query, page, bypass_cache)
                .await?
                .map(Item::User),
            // Single-shot sources: everything arrives with page 1
            Feed::Blog if page > 1 => Page::last(Vec::new()),
            Feed::Blog => Page::last(
                hub.blog_posts(bypass_cache)
                    .await?
                    .into_iter()
                    .map(Item::Post)
                    .collect(),
            ),
            Feed::Bookmarks if page > 1 => Page::last(Vec::new()),
            Feed::Bookmarks => Page::last(
                prefs::bookmarks(store)
                    .into_iter()
                    .map(Item::Bookmark)
                    .collect(),
            ),
            Feed::Followers { login } => hub
                .list_followers(login, page, bypass_cache)
                .await?
                .map(Item::User),
            Feed::Following { login } => hub
                .list_following(login, page, bypass_cache)
                .await?
                .map(Item::User),
            Feed::Members { org } => hub
                .list_members(org, page, bypass_cache)
                .await?
                .map(Item::User),
        };
        Ok(page)
    }
}

/// Pages of different tabs share one scope, so keys are spread per tab.
const TAB_KEY_STRIDE: LoadKey = 1000;

pub fn page_key(tab: usize, page: u32) -> LoadKey {
    tab as LoadKey * TAB_KEY_STRIDE + page
}

/// Restart `list` from page 1. Any reload after the first must be forced,
/// or completed pages of the previous generation would be reused. Later
/// pages of the tab are dropped from the scope and fetched again on demand.
pub fn load_first_page(
    scope: &mut LoaderScope,
    session: &Session,
    tab: usize,
    feed: &Feed,
    list: &mut PagedList<Item>,
    force: bool,
) {
    scope.forget(page_key(tab, 2)..=page_key(tab, TAB_KEY_STRIDE - 1));
    let generation = list.reset(force);
    spawn_page(scope, session, tab, feed, generation, 1, force);
}

/// Request the page after the last one applied, if any
pub fn load_next_page(
    scope: &mut LoaderScope,
    session: &Session,
    tab: usize,
    feed: &Feed,
    list: &mut PagedList<Item>,
) {
    if let Some(page) = list.begin_next_page() {
        let force = list.bypass_cache();
        spawn_page(scope, session, tab, feed, list.generation(), page, force);
    }
}

/// Load page 1 unless the list already has (or is getting) it
pub fn ensure_loaded(
    scope: &mut LoaderScope,
    session: &Session,
    tab: usize,
    feed: &Feed,
    list: &mut PagedList<Item>,
) {
    if !list.is_loaded() && !list.loading {
        let force = list.bypass_cache();
        load_first_page(scope, session, tab, feed, list, force);
    }
}

fn spawn_page(
    scope: &mut LoaderScope,
    session: &Session,
    tab: usize,
    feed: &Feed,
    generation: u64,
    page: u32,
    force: bool,
) {
    let feed = feed.clone();
    let hub = Arc::clone(&session.hub);
    let prefs = Arc::clone(&session.prefs);
    scope.spawn_for_tab(
        tab,
        page_key(tab, page),
        force,
        async move { feed.fetch(hub.as_ref(), prefs.as_ref(), page, force).await },
        move |items| Loaded::Page {
            tab,
            generation,
            page,
            items,
        },
    );
}
