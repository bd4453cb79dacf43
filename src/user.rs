use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::action::{Action, Loaded};
use crate::error::HubError;
use crate::follow::{FollowOp, FollowState};
use crate::hub::{OrgOwner, RepoOwner, RepoQuery};
use crate::listing::ListKind;
use crate::loader::{LoadKey, LoaderScope, ScopeId};
use crate::paging::fetch_all;
use crate::session::Session;
use crate::types::{Repository, UserProfile, UserSummary};

pub const LOADER_USER: LoadKey = 0;
pub const LOADER_TOP_REPOS: LoadKey = 1;
pub const LOADER_ORGS: LoadKey = 2;
pub const LOADER_IS_FOLLOWING: LoadKey = 3;
pub const LOADER_MEMBER_COUNT: LoadKey = 4;

const TOP_REPO_COUNT: u8 = 5;

/// Selectable rows of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileRow {
    Followers,
    Following,
    Members,
    Repositories,
    Gists,
    Starred,
    Repo(usize),
    Org(usize),
}

/// Where selecting a row leads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Profile(String),
    List(ListKind),
    Browser(String),
}

/// Profile screen for a user or organization.
#[derive(Debug)]
pub struct UserView {
    login: String,
    is_self: bool,
    scope: LoaderScope,
    /// Whether the current round of loads bypasses caches
    forced: bool,
    pub user: Option<UserProfile>,
    pub top_repos: Option<Vec<Repository>>,
    pub organizations: Option<Vec<UserSummary>>,
    pub member_count: Option<usize>,
    pub follow: FollowState,
    pub error: Option<String>,
    pub selected: usize,
}

impl UserView {
    pub fn new(login: &str, session: &Session) -> Self {
        Self {
            login: login.to_string(),
            is_self: session.is_self(login),
            scope: LoaderScope::new(session.tx.clone()),
            forced: false,
            user: None,
            top_repos: None,
            organizations: None,
            member_count: None,
            follow: FollowState::default(),
            error: None,
            selected: 0,
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn is_self(&self) -> bool {
        self.is_self
    }

    pub fn scope_id(&self) -> ScopeId {
        self.scope.id()
    }

    pub fn is_loading(&self) -> bool {
        self.user.is_none() && self.error.is_none()
    }

    pub fn start(&mut self, session: &Session) {
        self.load(session, false);
    }

    /// Forget everything shown and reload it from the network
    pub fn refresh(&mut self, session: &Session) {
        self.user = None;
        self.top_repos = None;
        self.organizations = None;
        self.member_count = None;
        self.follow = FollowState::default();
        self.error = None;
        self.selected = 0;
        self.load(session, true);
    }

    fn load(&mut self, session: &Session, force: bool) {
        self.forced = force;

        let hub = Arc::clone(&session.hub);
        let login = self.login.clone();
        self.scope.spawn(
            LOADER_USER,
            force,
            async move { hub.get_user(&login, force).await },
            |user| Loaded::Profile(Box::new(user)),
        );

        if !self.is_self {
            let hub = Arc::clone(&session.hub);
            let login = self.login.clone();
            self.scope.spawn(
                LOADER_IS_FOLLOWING,
                force,
                async move { hub.is_following(&login).await },
                Loaded::IsFollowing,
            );
        }
    }

    /// Loads that depend on knowing the account type
    fn load_details(&mut self, session: &Session, organization: bool) {
        let force = self.forced;

        let owner = if self.is_self {
            RepoOwner::Me
        } else if organization {
            RepoOwner::Org(self.login.clone())
        } else {
            RepoOwner::User(self.login.clone())
        };
        let query = RepoQuery {
            sort: "pushed".to_string(),
            affiliation: Some("owner,collaborator".to_string()),
            per_page: TOP_REPO_COUNT,
            ..RepoQuery::new(owner)
        };
        let hub = Arc::clone(&session.hub);
        self.scope.spawn(
            LOADER_TOP_REPOS,
            force,
            async move { Ok(hub.list_repos(&query, 1, force).await?.items) },
            Loaded::TopRepositories,
        );

        let hub = Arc::clone(&session.hub);
        let login = self.login.clone();
        if organization {
            self.scope.spawn(
                LOADER_MEMBER_COUNT,
                force,
                async move {
                    let hub = hub.as_ref();
                    let login = login.as_str();
                    let members = fetch_all(|page| hub.list_members(login, page, force)).await?;
                    Ok(members.len())
                },
                Loaded::MemberCount,
            );
        } else {
            let owner = if self.is_self {
                OrgOwner::Me
            } else {
                OrgOwner::User(login)
            };
            self.scope.spawn(
                LOADER_ORGS,
                force,
                async move {
                    let hub = hub.as_ref();
                    let owner = &owner;
                    fetch_all(|page| hub.list_orgs(owner, page, force)).await
                },
                Loaded::Organizations,
            );
        }
    }

    pub fn apply(&mut self, data: Loaded, session: &Session) {
        match data {
            Loaded::Profile(user) => {
                let organization = user.is_organization();
                self.user = Some(*user);
                self.error = None;
                self.load_details(session, organization);
            }
            Loaded::TopRepositories(repos) => self.top_repos = Some(repos),
            Loaded::Organizations(orgs) => self.organizations = Some(orgs),
            Loaded::MemberCount(count) => self.member_count = Some(count),
            Loaded::IsFollowing(following) => self.follow.loaded(following),
            other => debug!(?other, "ignoring delivery not meant for a profile"),
        }
    }

    pub fn fail(&mut self, message: String) {
        self.error = Some(message);
    }

    /// Organizations cannot be followed, and neither can yourself
    pub fn can_follow(&self) -> bool {
        !self.is_self && self.user.as_ref().is_some_and(|u| !u.is_organization())
    }

    /// Start a follow/unfollow call. Returns the operation started, if any.
    pub fn toggle_follow(&mut self, session: &Session) -> Option<FollowOp> {
        if !self.can_follow() {
            return None;
        }
        let op = self.follow.begin_toggle()?;
        info!(login = %self.login, %op, "toggling follow");

        let hub = Arc::clone(&session.hub);
        let login = self.login.clone();
        let call = self.scope.run(async move {
            match op {
                FollowOp::Follow => hub.follow(&login).await,
                FollowOp::Unfollow => hub.unfollow(&login).await,
            }
        });

        let scope = self.scope.id();
        let tx = self.scope.sender();
        tokio::spawn(async move {
            match call.await {
                Err(HubError::Cancelled) => trace!(?scope, "follow toggle cancelled"),
                result => {
                    tx.send(Action::FollowToggled {
                        scope,
                        result: result.map_err(|e| e.to_string()),
                    })
                    .ok();
                }
            }
        });
        Some(op)
    }

    /// Settle a toggle. Returns a message for the status line on failure.
    pub fn on_follow_result(&mut self, result: Result<(), String>) -> Option<String> {
        let followers = self.user.as_mut().map(|u| &mut u.followers);
        self.follow.complete(result.is_ok(), followers);
        result
            .err()
            .map(|message| format!("Toggling following state failed: {}", message))
    }

    pub fn rows(&self) -> Vec<ProfileRow> {
        let Some(user) = &self.user else {
            return Vec::new();
        };

        let mut rows = Vec::new();
        if user.is_organization() {
            rows.push(ProfileRow::Members);
            rows.push(ProfileRow::Repositories);
        } else {
            rows.extend([
                ProfileRow::Followers,
                ProfileRow::Following,
                ProfileRow::Repositories,
                ProfileRow::Gists,
                ProfileRow::Starred,
            ]);
        }
        let repos = self.top_repos.as_ref().map_or(0, Vec::len);
        rows.extend((0..repos).map(ProfileRow::Repo));
        let orgs = self.organizations.as_ref().map_or(0, Vec::len);
        rows.extend((0..orgs).map(ProfileRow::Org));
        rows
    }

    pub fn select_next(&mut self) {
        let count = self.rows().len();
        if count > 0 && self.selected + 1 < count {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select(&self) -> Option<Navigation> {
        let user = self.user.as_ref()?;
        let login = user.login.clone();
        let navigation = match *self.rows().get(self.selected)? {
            ProfileRow::Followers => Navigation::List(ListKind::Followers(login)),
            ProfileRow::Following => Navigation::List(ListKind::Following(login)),
            ProfileRow::Members => Navigation::List(ListKind::Members(login)),
            ProfileRow::Repositories => Navigation::List(ListKind::Repositories {
                login,
                organization: user.is_organization(),
            }),
            ProfileRow::Gists => Navigation::List(ListKind::Gists(login)),
            ProfileRow::Starred => Navigation::List(ListKind::Starred(login)),
            ProfileRow::Repo(index) => {
                Navigation::Browser(self.top_repos.as_ref()?.get(index)?.url.clone())
            }
            ProfileRow::Org(index) => {
                Navigation::Profile(self.organizations.as_ref()?.get(index)?.login.clone())
            }
        };
        Some(navigation)
    }

    pub fn destroy(&mut self) {
        self.scope.destroy();
    }
}
