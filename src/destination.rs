use crate::factory::Factory;
use crate::prefs::{PrefStore, KEY_LAST_PAGE};
use crate::session::Session;

/// Start-page value meaning "whatever was open last time"
pub const LAST_USED: &str = "last";

/// Pages selectable from the navigation drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    NewsFeed,
    Notifications,
    MyRepos,
    MyIssues,
    MyPrs,
    MyGists,
    Search,
    Bookmarks,
    Timeline,
    Blog,
    Trending,
}

impl Destination {
    pub const ALL: [Destination; 11] = [
        Destination::NewsFeed,
        Destination::Notifications,
        Destination::MyRepos,
        Destination::MyIssues,
        Destination::MyPrs,
        Destination::MyGists,
        Destination::Search,
        Destination::Bookmarks,
        Destination::Timeline,
        Destination::Blog,
        Destination::Trending,
    ];

    pub fn persisted_key(self) -> &'static str {
        match self {
            Destination::NewsFeed => "newsfeed",
            Destination::Notifications => "notifications",
            Destination::MyRepos => "repos",
            Destination::MyIssues => "issues",
            Destination::MyPrs => "prs",
            Destination::MyGists => "gists",
            Destination::Search => "search",
            Destination::Bookmarks => "bookmarks",
            Destination::Timeline => "timeline",
            Destination::Blog => "blog",
            Destination::Trending => "trends",
        }
    }

    pub fn from_persisted_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.persisted_key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Destination::NewsFeed => "News Feed",
            Destination::Notifications => "Notifications",
            Destination::MyRepos => "My Repositories",
            Destination::MyIssues => "My Issues",
            Destination::MyPrs => "My Pull Requests",
            Destination::MyGists => "My Gists",
            Destination::Search => "Search",
            Destination::Bookmarks => "Bookmarks",
            Destination::Timeline => "Public Timeline",
            Destination::Blog => "GitHub Blog",
            Destination::Trending => "Trending",
        }
    }
}

/// Pick the page to open on launch.
///
/// An explicit request beats the configured start page; either may say
/// "last", which substitutes the page persisted by the previous session.
/// Anything unrecognised lands on the news feed.
pub fn determine_initial(
    explicit: Option<&str>,
    start_page: Option<&str>,
    prefs: &dyn PrefStore,
) -> Destination {
    let requested = explicit
        .or(start_page)
        .unwrap_or(Destination::NewsFeed.persisted_key());

    let key = if requested == LAST_USED {
        prefs
            .get(KEY_LAST_PAGE)
            .unwrap_or_else(|| Destination::NewsFeed.persisted_key().to_string())
    } else {
        requested.to_string()
    };

    Destination::from_persisted_key(&key).unwrap_or(Destination::NewsFeed)
}

/// One entry of the navigation drawer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavItem {
    Page(Destination),
    Profile,
    SwitchAccount(String),
    Logout,
}

impl NavItem {
    pub fn label(&self) -> String {
        match self {
            NavItem::Page(destination) => destination.label().to_string(),
            NavItem::Profile => "Profile".to_string(),
            NavItem::SwitchAccount(login) => format!("Switch to @{}", login),
            NavItem::Logout => "Quit".to_string(),
        }
    }
}

/// Build a fresh factory for a drawer entry. Entries that are not pages
/// resolve to None and are handled by the container itself.
pub fn resolve(
    item: &NavItem,
    session: &Session,
    notification_repo: Option<&(String, String)>,
) -> Option<Factory> {
    match item {
        NavItem::Page(destination) => Some(Factory::for_destination(
            *destination,
            session,
            notification_repo.cloned(),
        )),
        NavItem::Profile | NavItem::SwitchAccount(_) | NavItem::Logout => None,
    }
}

/// Drawer contents: every page, then account entries
pub fn drawer_items(other_accounts: &[String]) -> Vec<NavItem> {
    let mut items: Vec<NavItem> = Destination::ALL.into_iter().map(NavItem::Page).collect();
    items.push(NavItem::Profile);
    items.extend(other_accounts.iter().cloned().map(NavItem::SwitchAccount));
    items.push(NavItem::Logout);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPrefs;
    use crate::testing;

    #[test]
    fn persisted_keys_round_trip_through_factories() {
        let (session, _rx) = testing::session();
        for destination in Destination::ALL {
            let factory = resolve(&NavItem::Page(destination), &session, None)
                .expect("every destination has a factory");
            let key = factory.destination().persisted_key();
            assert_eq!(Destination::from_persisted_key(key), Some(destination));
        }
    }

    #[test]
    fn non_pages_do_not_resolve() {
        let (session, _rx) = testing::session();
        assert!(resolve(&NavItem::Profile, &session, None).is_none());
        assert!(resolve(&NavItem::Logout, &session, None).is_none());
        assert!(resolve(&NavItem::SwitchAccount("other".into()), &session, None).is_none());
    }

    #[test]
    fn unknown_key_is_not_a_destination() {
        assert_eq!(Destination::from_persisted_key("settings"), None);
    }

    #[test]
    fn last_substitutes_the_stored_page() {
        let prefs = MemoryPrefs::default();
        prefs.set(KEY_LAST_PAGE, "gists");
        assert_eq!(
            determine_initial(None, Some(LAST_USED), &prefs),
            Destination::MyGists
        );
    }

    #[test]
    fn explicit_request_beats_the_start_page() {
        let prefs = MemoryPrefs::default();
        prefs.set(KEY_LAST_PAGE, "gists");
        assert_eq!(
            determine_initial(Some("notifications"), Some(LAST_USED), &prefs),
            Destination::Notifications
        );
        assert_eq!(
            determine_initial(Some("blog"), Some("trends"), &prefs),
            Destination::Blog
        );
    }

    #[test]
    fn configured_start_page_is_used_without_explicit_request() {
        let prefs = MemoryPrefs::default();
        assert_eq!(
            determine_initial(None, Some("trends"), &prefs),
            Destination::Trending
        );
    }

    #[test]
    fn fallbacks_land_on_the_news_feed() {
        let prefs = MemoryPrefs::default();
        assert_eq!(determine_initial(None, None, &prefs), Destination::NewsFeed);
        assert_eq!(
            determine_initial(None, Some(LAST_USED), &prefs),
            Destination::NewsFeed
        );
        assert_eq!(
            determine_initial(Some("settings"), None, &prefs),
            Destination::NewsFeed
        );
        prefs.set(KEY_LAST_PAGE, "garbage");
        assert_eq!(
            determine_initial(None, Some(LAST_USED), &prefs),
            Destination::NewsFeed
        );
    }

    #[test]
    fn drawer_lists_pages_then_accounts() {
        let items = drawer_items(&["work".to_string()]);
        assert_eq!(items.len(), Destination::ALL.len() + 3);
        assert_eq!(items[0], NavItem::Page(Destination::NewsFeed));
        assert_eq!(
            items[Destination::ALL.len() + 1],
            NavItem::SwitchAccount("work".into())
        );
        assert_eq!(items.last(), Some(&NavItem::Logout));
    }
}
