use tracing::debug;

use crate::action::Loaded;
use crate::feed::{self, Feed};
use crate::hub::{RepoOwner, RepoQuery};
use crate::loader::{LoaderScope, ScopeId};
use crate::paging::PagedList;
use crate::session::Session;
use crate::types::Item;

/// Lists reachable from a profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListKind {
    Followers(String),
    Following(String),
    Members(String),
    Repositories { login: String, organization: bool },
    Gists(String),
    Starred(String),
}

impl ListKind {
    pub fn title(&self) -> String {
        match self {
            ListKind::Followers(login) => format!("Followers of @{}", login),
            ListKind::Following(login) => format!("Followed by @{}", login),
            ListKind::Members(org) => format!("Members of @{}", org),
            ListKind::Repositories { login, .. } => format!("Repositories of @{}", login),
            ListKind::Gists(login) => format!("Gists of @{}", login),
            ListKind::Starred(login) => format!("Starred by @{}", login),
        }
    }

    pub fn feed(&self, session: &Session) -> Feed {
        match self {
            ListKind::Followers(login) => Feed::Followers {
                login: login.clone(),
            },
            ListKind::Following(login) => Feed::Following {
                login: login.clone(),
            },
            ListKind::Members(org) => Feed::Members { org: org.clone() },
            ListKind::Repositories {
                login,
                organization,
            } => {
                let owner = if session.is_self(login) {
                    RepoOwner::Me
                } else if *organization {
                    RepoOwner::Org(login.clone())
                } else {
                    RepoOwner::User(login.clone())
                };
                Feed::Repos(RepoQuery::new(owner))
            }
            ListKind::Gists(login) => Feed::Gists {
                login: login.clone(),
            },
            ListKind::Starred(login) => Feed::Starred {
                login: login.clone(),
                sort: "created".to_string(),
                direction: "desc".to_string(),
            },
        }
    }
}

/// Screen showing a single paged list
#[derive(Debug)]
pub struct ListView {
    kind: ListKind,
    feed: Feed,
    list: PagedList<Item>,
    scope: LoaderScope,
}

impl ListView {
    pub fn new(kind: ListKind, session: &Session) -> Self {
        let feed = kind.feed(session);
        Self {
            kind,
            feed,
            list: PagedList::default(),
            scope: LoaderScope::new(session.tx.clone()),
        }
    }

    pub fn title(&self) -> String {
        self.kind.title()
    }

    pub fn scope_id(&self) -> ScopeId {
        self.scope.id()
    }

    pub fn list(&self) -> &PagedList<Item> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut PagedList<Item> {
        &mut self.list
    }

    pub fn start(&mut self, session: &Session) {
        feed::ensure_loaded(&mut self.scope, session, 0, &self.feed, &mut self.list);
    }

    pub fn refresh(&mut self, session: &Session) {
        feed::load_first_page(&mut self.scope, session, 0, &self.feed, &mut self.list, true);
    }

    pub fn load_more(&mut self, session: &Session) {
        if self.list.wants_more() {
            feed::load_next_page(&mut self.scope, session, 0, &self.feed, &mut self.list);
        }
    }

    pub fn apply(&mut self, data: Loaded) {
        match data {
            Loaded::Page {
                generation,
                page,
                items,
                ..
            } => {
                if !self.list.apply(generation, page, items) {
                    debug!(page, "dropping stale page");
                }
            }
            other => debug!(?other, "ignoring delivery not meant for a list"),
        }
    }

    pub fn fail(&mut self, message: String) {
        self.list.fail(message);
    }

    pub fn destroy(&mut self) {
        self.scope.destroy();
    }
}
