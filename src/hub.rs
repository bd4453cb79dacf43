use async_trait::async_trait;

use crate::error::{HubError, Result};
use crate::paging::Page;
use crate::types::{
    BlogPost, FeedEvent, Gist, IssueSummary, Notification, Repository, UserProfile, UserSummary,
};

/// Whose repositories to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoOwner {
    /// The signed-in account, including private and collaborator repos
    Me,
    User(String),
    Org(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoQuery {
    pub owner: RepoOwner,
    pub sort: String,
    pub direction: String,
    pub affiliation: Option<String>,
    pub per_page: u8,
}

impl RepoQuery {
    pub fn new(owner: RepoOwner) -> Self {
        Self {
            owner,
            sort: "updated".to_string(),
            direction: "desc".to_string(),
            affiliation: None,
            per_page: 50,
        }
    }
}

/// Whose organizations to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgOwner {
    Me,
    User(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationFilter {
    pub all: bool,
    pub participating: bool,
    /// Restrict to one repository (owner, name)
    pub repo: Option<(String, String)>,
}

fn unsupported<T>(what: &str) -> Result<T> {
    Err(HubError::Api(format!("{} not supported by this hub", what)))
}

/// Remote service behind every view. `bypass_cache` skips any response cache
/// the implementation keeps; `page` is 1-based.
#[async_trait]
pub trait Hub: Send + Sync + std::fmt::Debug {
    // Core (required)
    async fn current_login(&self) -> Result<String>;
    async fn get_user(&self, login: &str, bypass_cache: bool) -> Result<UserProfile>;
    async fn list_repos(
        &self,
        query: &RepoQuery,
        page: u32,
        bypass_cache: bool,
    ) -> Result<Page<Repository>>;

    // Optional
    async fn is_following(&self, _login: &str) -> Result<bool> {
        unsupported("Following")
    }
    async fn follow(&self, _login: &str) -> Result<()> {
        unsupported("Following")
    }
    async fn unfollow(&self, _login: &str) -> Result<()> {
        unsupported("Following")
    }
    async fn list_starred(
        &self,
        _login: &str,
        _sort: &str,
        _direction: &str,
        _page: u32,
        _bypass_cache: bool,
    ) -> Result<Page<Repository>> {
        unsupported("Stars")
    }
    async fn list_orgs(
        &self,
        _owner: &OrgOwner,
        _page: u32,
        _bypass_cache: bool,
    ) -> Result<Page<UserSummary>> {
        unsupported("Organizations")
    }
    async fn list_members(
        &self,
        _org: &str,
        _page: u32,
        _bypass_cache: bool,
    ) -> Result<Page<UserSummary>> {
        unsupported("Organization members")
    }
    async fn list_followers(
        &self,
        _login: &str,
        _page: u32,
        _bypass_cache: bool,
    ) -> Result<Page<UserSummary>> {
        unsupported("Followers")
    }
    async fn list_following(
        &self,
        _login: &str,
        _page: u32,
        _bypass_cache: bool,
    ) -> Result<Page<UserSummary>> {
        unsupported("Following")
    }
    async fn received_events(
        &self,
        _login: &str,
        _page: u32,
        _bypass_cache: bool,
    ) -> Result<Page<FeedEvent>> {
        unsupported("News feed")
    }
    async fn public_events(&self, _page: u32, _bypass_cache: bool) -> Result<Page<FeedEvent>> {
        unsupported("Public timeline")
    }
    async fn notifications(
        &self,
        _filter: &NotificationFilter,
        _per_page: u8,
        _page: u32,
        _bypass_cache: bool,
    ) -> Result<Page<Notification>> {
        unsupported("Notifications")
    }
    async fn search_issues(
        &self,
        _query: &str,
        _page: u32,
        _bypass_cache: bool,
    ) -> Result<Page<IssueSummary>> {
        unsupported("Issue search")
    }
    async fn search_repos(
        &self,
        _query: &str,
        _sort: Option<&str>,
        _page: u32,
        _bypass_cache: bool,
    ) -> Result<Page<Repository>> {
        unsupported("Repository search")
    }
    async fn search_users(
        &self,
        _query: &str,
        _page: u32,
        _bypass_cache: bool,
    ) -> Result<Page<UserSummary>> {
        unsupported("User search")
    }
    async fn list_gists(
        &self,
        _login: &str,
        _page: u32,
        _bypass_cache: bool,
    ) -> Result<Page<Gist>> {
        unsupported("Gists")
    }
    async fn starred_gists(&self, _page: u32, _bypass_cache: bool) -> Result<Page<Gist>> {
        unsupported("Gists")
    }
    async fn blog_posts(&self, _bypass_cache: bool) -> Result<Vec<BlogPost>> {
        unsupported("Blog")
    }
}
