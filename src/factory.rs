use chrono::{NaiveDate, Utc};

use crate::destination::Destination;
use crate::feed::Feed;
use crate::hub::{NotificationFilter, RepoOwner, RepoQuery};
use crate::prefs::{PrefStore, KEY_REPO_SORT};
use crate::session::Session;
use crate::types::IssueState;

/// Sort order of the own-repository list, persisted across sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoSort {
    Updated,
    Pushed,
    Name,
    Created,
}

impl RepoSort {
    pub const ALL: [RepoSort; 4] = [
        RepoSort::Updated,
        RepoSort::Pushed,
        RepoSort::Name,
        RepoSort::Created,
    ];

    pub fn key(self) -> &'static str {
        match self {
            RepoSort::Updated => "updated",
            RepoSort::Pushed => "pushed",
            RepoSort::Name => "full_name",
            RepoSort::Created => "created",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    fn label(self) -> &'static str {
        match self {
            RepoSort::Updated => "Sort by last update",
            RepoSort::Pushed => "Sort by last push",
            RepoSort::Name => "Sort by name",
            RepoSort::Created => "Sort by creation date",
        }
    }

    fn direction(self) -> &'static str {
        match self {
            RepoSort::Name => "asc",
            _ => "desc",
        }
    }

    pub fn load(prefs: &dyn PrefStore) -> Self {
        prefs
            .get(KEY_REPO_SORT)
            .and_then(|key| Self::from_key(&key))
            .unwrap_or(RepoSort::Updated)
    }
}

/// Issue-search roles, one tab each
const ISSUE_ROLES: [(&str, &str); 3] = [
    ("Created", "author"),
    ("Assigned", "assignee"),
    ("Mentioned", "mentions"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub title: &'static str,
    pub feed: Feed,
}

impl Tab {
    fn new(title: &'static str, feed: Feed) -> Self {
        Self { title, feed }
    }
}

/// Entry of a page's tool drawer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEntry {
    pub label: String,
    pub checked: bool,
}

impl ToolEntry {
    fn new(label: impl Into<String>, checked: bool) -> Self {
        Self {
            label: label.into(),
            checked,
        }
    }
}

/// Builds the tabs (and optional tool menu) of one home page.
///
/// A factory holds only plain data. All loading happens in the view that
/// owns it, so dropping a factory never leaves work behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Factory {
    NewsFeed { login: String },
    Notifications { filter: NotificationFilter },
    Repositories { login: String, sort: RepoSort },
    Issues {
        login: String,
        pull_requests: bool,
        state: IssueState,
    },
    Gists { login: String },
    Search { query: String },
    Bookmarks,
    Timeline,
    Blog,
    Trending { today: NaiveDate },
}

impl Factory {
    pub fn for_destination(
        destination: Destination,
        session: &Session,
        notification_repo: Option<(String, String)>,
    ) -> Self {
        let login = session.login.clone();
        match destination {
            Destination::NewsFeed => Factory::NewsFeed { login },
            Destination::Notifications => Factory::Notifications {
                filter: NotificationFilter {
                    repo: notification_repo,
                    ..NotificationFilter::default()
                },
            },
            Destination::MyRepos => Factory::Repositories {
                login,
                sort: RepoSort::load(session.prefs.as_ref()),
            },
            Destination::MyIssues | Destination::MyPrs => Factory::Issues {
                login,
                pull_requests: destination == Destination::MyPrs,
                state: IssueState::Open,
            },
            Destination::MyGists => Factory::Gists { login },
            Destination::Search => Factory::Search {
                query: String::new(),
            },
            Destination::Bookmarks => Factory::Bookmarks,
            Destination::Timeline => Factory::Timeline,
            Destination::Blog => Factory::Blog,
            Destination::Trending => Factory::Trending {
                today: Utc::now().date_naive(),
            },
        }
    }

    pub fn destination(&self) -> Destination {
        match self {
            Factory::NewsFeed { .. } => Destination::NewsFeed,
            Factory::Notifications { .. } => Destination::Notifications,
            Factory::Repositories { .. } => Destination::MyRepos,
            Factory::Issues {
                pull_requests: false,
                ..
            } => Destination::MyIssues,
            Factory::Issues { .. } => Destination::MyPrs,
            Factory::Gists { .. } => Destination::MyGists,
            Factory::Search { .. } => Destination::Search,
            Factory::Bookmarks => Destination::Bookmarks,
            Factory::Timeline => Destination::Timeline,
            Factory::Blog => Destination::Blog,
            Factory::Trending { .. } => Destination::Trending,
        }
    }

    pub fn title(&self) -> &'static str {
        self.destination().label()
    }

    pub fn tabs(&self) -> Vec<Tab> {
        match self {
            Factory::NewsFeed { login } => vec![Tab::new(
                "News",
                Feed::ReceivedEvents {
                    login: login.clone(),
                },
            )],
            Factory::Notifications { filter } => {
                vec![Tab::new("Notifications", Feed::Notifications(filter.clone()))]
            }
            Factory::Repositories { login, sort } => {
                let query = RepoQuery {
                    sort: sort.key().to_string(),
                    direction: sort.direction().to_string(),
                    ..RepoQuery::new(RepoOwner::Me)
                };
                // Stars can only be ordered by star date or repo update
                let (starred_sort, starred_direction) = match sort {
                    RepoSort::Updated | RepoSort::Pushed => ("updated", "desc"),
                    RepoSort::Created => ("created", "desc"),
                    RepoSort::Name => ("created", "asc"),
                };
                vec![
                    Tab::new("Repositories", Feed::Repos(query)),
                    Tab::new(
                        "Starred",
                        Feed::Starred {
                            login: login.clone(),
                            sort: starred_sort.to_string(),
                            direction: starred_direction.to_string(),
                        },
                    ),
                ]
            }
            Factory::Issues {
                login,
                pull_requests,
                state,
            } => {
                let kind = if *pull_requests { "pr" } else { "issue" };
                let state = match state {
                    IssueState::Open => "open",
                    IssueState::Closed => "closed",
                };
                ISSUE_ROLES
                    .iter()
                    .map(|&(title, role)| {
                        Tab::new(
                            title,
                            Feed::Issues {
                                query: format!(
                                    "is:{} is:{} {}:{} archived:false",
                                    kind, state, role, login
                                ),
                            },
                        )
                    })
                    .collect()
            }
            Factory::Gists { login } => vec![
                Tab::new(
                    "Mine",
                    Feed::Gists {
                        login: login.clone(),
                    },
                ),
                Tab::new("Starred", Feed::StarredGists),
            ],
            Factory::Search { query } => vec![
                Tab::new(
                    "Repositories",
                    Feed::RepoSearch {
                        query: query.clone(),
                        sort: None,
                    },
                ),
                Tab::new(
                    "Users",
                    Feed::UserSearch {
                        query: query.clone(),
                    },
                ),
            ],
            Factory::Bookmarks => vec![Tab::new("Bookmarks", Feed::Bookmarks)],
            Factory::Timeline => vec![Tab::new("Public events", Feed::PublicEvents)],
            Factory::Blog => vec![Tab::new("Posts", Feed::Blog)],
            Factory::Trending { today } => vec![
                Tab::new("Today", Feed::trending_since(*today, 1)),
                Tab::new("This week", Feed::trending_since(*today, 7)),
                Tab::new("This month", Feed::trending_since(*today, 30)),
            ],
        }
    }

    /// Entries of the tool drawer; empty when the page has none
    pub fn tool_menu(&self) -> Vec<ToolEntry> {
        match self {
            Factory::Notifications { filter } => vec![
                ToolEntry::new("Show read notifications", filter.all),
                ToolEntry::new("Participating only", filter.participating),
            ],
            Factory::Repositories { sort, .. } => RepoSort::ALL
                .into_iter()
                .map(|s| ToolEntry::new(s.label(), s == *sort))
                .collect(),
            Factory::Issues { state, .. } => vec![
                ToolEntry::new("Open", *state == IssueState::Open),
                ToolEntry::new("Closed", *state == IssueState::Closed),
            ],
            _ => Vec::new(),
        }
    }

    /// Apply tool entry `index`. Returns true when the tabs must reload.
    pub fn apply_tool(&mut self, index: usize, prefs: &dyn PrefStore) -> bool {
        match self {
            Factory::Notifications { filter } => match index {
                0 => {
                    filter.all = !filter.all;
                    true
                }
                1 => {
                    filter.participating = !filter.participating;
                    true
                }
                _ => false,
            },
            Factory::Repositories { sort, .. } => match RepoSort::ALL.get(index) {
                Some(chosen) if *chosen != *sort => {
                    *sort = *chosen;
                    prefs.set(KEY_REPO_SORT, chosen.key());
                    true
                }
                _ => false,
            },
            Factory::Issues { state, .. } => {
                let chosen = match index {
                    0 => IssueState::Open,
                    1 => IssueState::Closed,
                    _ => return false,
                };
                let changed = *state != chosen;
                *state = chosen;
                changed
            }
            _ => false,
        }
    }

    pub fn accepts_query(&self) -> bool {
        matches!(self, Factory::Search { .. })
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            Factory::Search { query } => Some(query.as_str()),
            _ => None,
        }
    }

    /// Returns true when the query changed and the tabs must reload
    pub fn set_query(&mut self, new_query: &str) -> bool {
        match self {
            Factory::Search { query } if query.as_str() != new_query.trim() => {
                *query = new_query.trim().to_string();
                true
            }
            _ => false,
        }
    }
}
