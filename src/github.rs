use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use octocrab::Octocrab;
use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache;
use crate::error::{HubError, Result};
use crate::hub::{Hub, NotificationFilter, OrgOwner, RepoOwner, RepoQuery};
use crate::paging::Page;
use crate::types::{
    AccountType, BlogPost, FeedEvent, Gist, IssueState, IssueSummary, Notification, Repository,
    UserProfile, UserSummary,
};

const BLOG_FEED_URL: &str = "https://github.blog/feed/";
const PER_PAGE: u8 = 50;

pub struct GitHub {
    client: Octocrab,
    http: reqwest::Client,
    /// Namespace for cached responses, so accounts never share entries
    account: String,
    cache_ttl: Duration,
}

impl std::fmt::Debug for GitHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHub")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl From<octocrab::Error> for HubError {
    fn from(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => {
                HubError::Api(format!("{} ({})", source.message, source.status_code))
            }
            other => HubError::Transport(other.to_string()),
        }
    }
}

impl GitHub {
    pub fn new(token: String, cache_ttl: Duration) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token)
            .build()
            .map_err(|e| HubError::Auth(e.to_string()))?;

        let http = reqwest::Client::builder()
            .user_agent("hubdeck")
            .build()
            .map_err(|e| HubError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            http,
            account: String::new(),
            cache_ttl,
        })
    }

    /// Scope the response cache to `login`
    pub fn with_account(mut self, login: &str) -> Self {
        self.account = login.to_lowercase();
        self
    }

    async fn cached<T, F, Fut>(&self, key: String, bypass_cache: bool, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        if !bypass_cache {
            if let Some(hit) = cache::read::<T>(&key, self.cache_ttl) {
                debug!(key = %key, "response cache hit");
                return Ok(hit);
            }
        }
        let value = fetch().await?;
        cache::write(&key, &value);
        Ok(value)
    }

    async fn paged<R, T>(
        &self,
        route: &str,
        mut params: Vec<(&'static str, String)>,
        page: u32,
        bypass_cache: bool,
        convert: fn(R) -> T,
    ) -> Result<Page<T>>
    where
        R: DeserializeOwned + Send + 'static,
        T: Serialize + DeserializeOwned + Send,
    {
        if !params.iter().any(|(name, _)| *name == "per_page") {
            params.push(("per_page", PER_PAGE.to_string()));
        }
        params.push(("page", page.to_string()));
        let key = cache::request_key(&self.account, route, &params);
        let params = &params;

        self.cached(key, bypass_cache, || async move {
            let response: octocrab::Page<R> = self.client.get(route, Some(params)).await?;
            Ok(Page {
                has_more: response.next.is_some(),
                items: response.items.into_iter().map(convert).collect(),
            })
        })
        .await
    }

    async fn set_following(&self, login: &str, follow: bool) -> Result<()> {
        let route = format!("/user/following/{}", login);
        let response = if follow {
            self.client._put(route.as_str(), None::<&()>).await?
        } else {
            self.client._delete(route.as_str(), None::<&()>).await?
        };

        if response.status().is_success() {
            Ok(())
        } else {
            Err(HubError::Api(format!(
                "{} {} failed: {}",
                if follow { "Following" } else { "Unfollowing" },
                login,
                response.status()
            )))
        }
    }
}

// API response types

#[derive(Deserialize)]
struct RawAccount {
    login: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct RawUser {
    login: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    followers: u32,
    #[serde(default)]
    following: u32,
    #[serde(default)]
    public_repos: u32,
    total_private_repos: Option<u32>,
    #[serde(default)]
    public_gists: u32,
    private_gists: Option<u32>,
    email: Option<String>,
    blog: Option<String>,
    company: Option<String>,
    location: Option<String>,
}

#[derive(Deserialize)]
struct RawRepo {
    name: String,
    owner: RawAccount,
    description: Option<String>,
    html_url: String,
    #[serde(default)]
    stargazers_count: u32,
    #[serde(default)]
    forks_count: u32,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    actor: RawAccount,
    repo: RawNamed,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawNamed {
    name: String,
}

#[derive(Deserialize)]
struct RawNotification {
    id: String,
    repository: RawFullNamed,
    subject: RawSubject,
    reason: String,
    unread: bool,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawFullNamed {
    full_name: String,
}

#[derive(Deserialize)]
struct RawSubject {
    title: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct RawIssue {
    number: u64,
    title: String,
    state: String,
    user: RawAccount,
    #[serde(default)]
    comments: u32,
    html_url: String,
    repository_url: String,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawGist {
    id: String,
    description: Option<String>,
    owner: Option<RawAccount>,
    #[serde(default)]
    files: HashMap<String, serde_json::Value>,
    #[serde(default)]
    public: bool,
    html_url: String,
    updated_at: Option<DateTime<Utc>>,
}

fn account_type(kind: Option<&str>) -> AccountType {
    match kind {
        Some("Organization") => AccountType::Organization,
        _ => AccountType::User,
    }
}

fn to_summary(raw: RawAccount) -> UserSummary {
    UserSummary {
        kind: account_type(raw.kind.as_deref()),
        login: raw.login,
    }
}

fn to_org(raw: RawAccount) -> UserSummary {
    UserSummary {
        login: raw.login,
        kind: AccountType::Organization,
    }
}

fn to_profile(raw: RawUser) -> UserProfile {
    UserProfile {
        kind: account_type(raw.kind.as_deref()),
        login: raw.login,
        name: raw.name,
        created_at: raw.created_at,
        followers: raw.followers,
        following: raw.following,
        public_repos: raw.public_repos,
        total_private_repos: raw.total_private_repos,
        public_gists: raw.public_gists,
        private_gists: raw.private_gists,
        email: raw.email,
        blog: raw.blog,
        company: raw.company,
        location: raw.location,
    }
}

fn to_repo(raw: RawRepo) -> Repository {
    Repository {
        owner: raw.owner.login,
        name: raw.name,
        description: raw.description,
        url: raw.html_url,
        stars: raw.stargazers_count,
        forks: raw.forks_count,
        updated_at: raw.updated_at,
    }
}

fn to_event(raw: RawEvent) -> FeedEvent {
    FeedEvent {
        id: raw.id,
        actor: raw.actor.login,
        kind: raw.kind.unwrap_or_else(|| "Event".to_string()),
        repo: raw.repo.name,
        created_at: raw.created_at,
    }
}

fn to_notification(raw: RawNotification) -> Notification {
    Notification {
        id: raw.id,
        repo: raw.repository.full_name,
        title: raw.subject.title,
        subject_kind: raw.subject.kind,
        reason: raw.reason.replace('_', " "),
        unread: raw.unread,
        updated_at: raw.updated_at,
    }
}

/// "https://api.github.com/repos/owner/name" -> "owner/name"
fn repo_from_api_url(url: &str) -> String {
    let parts: Vec<&str> = url.trim_end_matches('/').rsplitn(3, '/').collect();
    match parts.as_slice() {
        [name, owner, ..] => format!("{}/{}", owner, name),
        _ => url.to_string(),
    }
}

fn to_issue(raw: RawIssue) -> IssueSummary {
    IssueSummary {
        repo: repo_from_api_url(&raw.repository_url),
        number: raw.number,
        title: raw.title,
        state: if raw.state == "closed" {
            IssueState::Closed
        } else {
            IssueState::Open
        },
        author: raw.user.login,
        comments: raw.comments,
        url: raw.html_url,
        updated_at: raw.updated_at,
    }
}

fn to_gist(raw: RawGist) -> Gist {
    Gist {
        id: raw.id,
        description: raw.description,
        owner: raw
            .owner
            .map(|o| o.login)
            .unwrap_or_else(|| "unknown".to_string()),
        files: raw.files.len() as u32,
        public: raw.public,
        url: raw.html_url,
        updated_at: raw.updated_at,
    }
}

#[derive(Default)]
struct PostFields {
    title: String,
    link: String,
    published: String,
}

impl PostFields {
    fn push(&mut self, tag: &[u8], text: &str) {
        match tag {
            b"title" => self.title.push_str(text),
            b"link" => self.link.push_str(text),
            b"pubDate" => self.published.push_str(text),
            _ => {}
        }
    }

    fn finish(self) -> Option<BlogPost> {
        if self.title.trim().is_empty() || self.link.trim().is_empty() {
            return None;
        }
        Some(BlogPost {
            title: self.title.trim().to_string(),
            link: self.link.trim().to_string(),
            published: Some(self.published.trim().to_string()).filter(|p| !p.is_empty()),
        })
    }
}

/// Collect the `<item>` entries of an RSS 2.0 document. Items without a
/// title or link are skipped; a malformed tail keeps the items read so far.
pub fn parse_rss(xml: &str) -> Vec<BlogPost> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut posts = Vec::new();
    let mut item: Option<PostFields> = None;
    let mut tag: Option<Vec<u8>> = None;

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(start)) => {
                let name = start.name().as_ref().to_vec();
                if name == b"item" {
                    item = Some(PostFields::default());
                } else if item.is_some() {
                    tag = Some(name);
                }
            }
            Ok(XmlEvent::End(end)) => {
                if end.name().as_ref() == b"item" {
                    if let Some(post) = item.take().and_then(PostFields::finish) {
                        posts.push(post);
                    }
                }
                tag = None;
            }
            Ok(XmlEvent::Text(text)) => {
                if let (Some(fields), Some(tag)) = (item.as_mut(), tag.as_deref()) {
                    if let Ok(value) = text.unescape() {
                        fields.push(tag, &value);
                    }
                }
            }
            Ok(XmlEvent::CData(data)) => {
                if let (Some(fields), Some(tag)) = (item.as_mut(), tag.as_deref()) {
                    fields.push(tag, &String::from_utf8_lossy(&data));
                }
            }
            Ok(XmlEvent::Eof) => break,
            Err(e) => {
                debug!(error = %e, "stopping at malformed RSS");
                break;
            }
            _ => {}
        }
    }
    posts
}

#[async_trait]
impl Hub for GitHub {
    async fn current_login(&self) -> Result<String> {
        let user = self.client.current().user().await?;
        Ok(user.login)
    }

    async fn get_user(&self, login: &str, bypass_cache: bool) -> Result<UserProfile> {
        let path = format!("/users/{}", login);
        let route = path.as_str();
        let key = cache::request_key(&self.account, route, &[]);
        self.cached(key, bypass_cache, || async move {
            let raw: RawUser = self.client.get(route, None::<&()>).await?;
            Ok(to_profile(raw))
        })
        .await
    }

    async fn list_repos(
        &self,
        query: &RepoQuery,
        page: u32,
        bypass_cache: bool,
    ) -> Result<Page<Repository>> {
        let route = match &query.owner {
            RepoOwner::Me => "/user/repos".to_string(),
            RepoOwner::User(login) => format!("/users/{}/repos", login),
            RepoOwner::Org(org) => format!("/orgs/{}/repos", org),
        };
        let mut params = vec![
            ("sort", query.sort.clone()),
            ("direction", query.direction.clone()),
            ("per_page", query.per_page.to_string()),
        ];
        if let (RepoOwner::Me, Some(affiliation)) = (&query.owner, &query.affiliation) {
            params.push(("affiliation", affiliation.clone()));
        }
        self.paged(&route, params, page, bypass_cache, to_repo).await
    }

    async fn is_following(&self, login: &str) -> Result<bool> {
        let route = format!("/user/following/{}", login);
        match self.client._get(route.as_str()).await {
            Ok(response) => match response.status().as_u16() {
                204 => Ok(true),
                404 => Ok(false),
                status => Err(HubError::Api(format!(
                    "unexpected status {} checking follow state",
                    status
                ))),
            },
            Err(octocrab::Error::GitHub { source, .. }) if source.status_code.as_u16() == 404 => {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn follow(&self, login: &str) -> Result<()> {
        self.set_following(login, true).await
    }

    async fn unfollow(&self, login: &str) -> Result<()> {
        self.set_following(login, false).await
    }

    async fn list_starred(
        &self,
        login: &str,
        sort: &str,
        direction: &str,
        page: u32,
        bypass_cache: bool,
    ) -> Result<Page<Repository>> {
        let route = format!("/users/{}/starred", login);
        let params = vec![("sort", sort.to_string()), ("direction", direction.to_string())];
        self.paged(&route, params, page, bypass_cache, to_repo).await
    }

    async fn list_orgs(
        &self,
        owner: &OrgOwner,
        page: u32,
        bypass_cache: bool,
    ) -> Result<Page<UserSummary>> {
        let route = match owner {
            OrgOwner::Me => "/user/orgs".to_string(),
            OrgOwner::User(login) => format!("/users/{}/orgs", login),
        };
        self.paged(&route, Vec::new(), page, bypass_cache, to_org).await
    }

    async fn list_members(
        &self,
        org: &str,
        page: u32,
        bypass_cache: bool,
    ) -> Result<Page<UserSummary>> {
        let route = format!("/orgs/{}/members", org);
        self.paged(&route, Vec::new(), page, bypass_cache, to_summary).await
    }

    async fn list_followers(
        &self,
        login: &str,
        page: u32,
        bypass_cache: bool,
    ) -> Result<Page<UserSummary>> {
        let route = format!("/users/{}/followers", login);
        self.paged(&route, Vec::new(), page, bypass_cache, to_summary).await
    }

    async fn list_following(
        &self,
        login: &str,
        page: u32,
        bypass_cache: bool,
    ) -> Result<Page<UserSummary>> {
        let route = format!("/users/{}/following", login);
        self.paged(&route, Vec::new(), page, bypass_cache, to_summary).await
    }

    async fn received_events(
        &self,
        login: &str,
        page: u32,
        bypass_cache: bool,
    ) -> Result<Page<FeedEvent>> {
        let route = format!("/users/{}/received_events", login);
        self.paged(&route, Vec::new(), page, bypass_cache, to_event).await
    }

    async fn public_events(&self, page: u32, bypass_cache: bool) -> Result<Page<FeedEvent>> {
        self.paged("/events", Vec::new(), page, bypass_cache, to_event).await
    }

    async fn notifications(
        &self,
        filter: &NotificationFilter,
        per_page: u8,
        page: u32,
        bypass_cache: bool,
    ) -> Result<Page<Notification>> {
        let route = match &filter.repo {
            Some((owner, name)) => format!("/repos/{}/{}/notifications", owner, name),
            None => "/notifications".to_string(),
        };
        let params = vec![
            ("all", filter.all.to_string()),
            ("participating", filter.participating.to_string()),
            ("per_page", per_page.to_string()),
        ];
        self.paged(&route, params, page, bypass_cache, to_notification)
            .await
    }

    async fn search_issues(
        &self,
        query: &str,
        page: u32,
        bypass_cache: bool,
    ) -> Result<Page<IssueSummary>> {
        let params = vec![
            ("q", query.to_string()),
            ("sort", "updated".to_string()),
            ("order", "desc".to_string()),
        ];
        self.paged("/search/issues", params, page, bypass_cache, to_issue)
            .await
    }

    async fn search_repos(
        &self,
        query: &str,
        sort: Option<&str>,
        page: u32,
        bypass_cache: bool,
    ) -> Result<Page<Repository>> {
        let mut params = vec![("q", query.to_string())];
        if let Some(sort) = sort {
            params.push(("sort", sort.to_string()));
            params.push(("order", "desc".to_string()));
        }
        self.paged("/search/repositories", params, page, bypass_cache, to_repo)
            .await
    }

    async fn search_users(
        &self,
        query: &str,
        page: u32,
        bypass_cache: bool,
    ) -> Result<Page<UserSummary>> {
        let params = vec![("q", query.to_string())];
        self.paged("/search/users", params, page, bypass_cache, to_summary)
            .await
    }

    async fn list_gists(&self, login: &str, page: u32, bypass_cache: bool) -> Result<Page<Gist>> {
        let route = format!("/users/{}/gists", login);
        self.paged(&route, Vec::new(), page, bypass_cache, to_gist).await
    }

    async fn starred_gists(&self, page: u32, bypass_cache: bool) -> Result<Page<Gist>> {
        self.paged("/gists/starred", Vec::new(), page, bypass_cache, to_gist)
            .await
    }

    async fn blog_posts(&self, bypass_cache: bool) -> Result<Vec<BlogPost>> {
        let key = cache::request_key("blog", "/feed", &[]);
        self.cached(key, bypass_cache, || async move {
            let body = self
                .http
                .get(BLOG_FEED_URL)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            Ok(parse_rss(&body))
        })
        .await
    }
}
