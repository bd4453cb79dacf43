//! In-memory hub and session builders for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, Semaphore};

use crate::action::Action;
use crate::error::{HubError, Result};
use crate::hub::{Hub, NotificationFilter, OrgOwner, RepoOwner, RepoQuery};
use crate::paging::Page;
use crate::prefs::MemoryPrefs;
use crate::session::Session;
use crate::types::{
    AccountType, BlogPost, FeedEvent, Gist, IssueState, IssueSummary, Notification, Repository,
    UserProfile, UserSummary,
};

/// Logins treated as organizations by [`FakeHub`]
pub const ORG_LOGIN: &str = "acme";

#[derive(Debug)]
pub struct FakeHub {
    calls: Mutex<HashMap<&'static str, usize>>,
    /// Every call waits for a permit, so tests can hold loads in flight
    gate: Semaphore,
    following: AtomicBool,
    fail_follow: AtomicBool,
    fail_user: AtomicBool,
    starred_order: Mutex<Option<(String, String)>>,
}

impl Default for FakeHub {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            gate: Semaphore::new(Semaphore::MAX_PERMITS),
            following: AtomicBool::new(false),
            fail_follow: AtomicBool::new(false),
            fail_user: AtomicBool::new(false),
            starred_order: Mutex::new(None),
        }
    }
}

impl FakeHub {
    /// A hub whose calls block until [`release`](Self::release)
    pub fn gated() -> Self {
        Self {
            gate: Semaphore::new(0),
            ..Self::default()
        }
    }

    pub fn release(&self) {
        self.gate.add_permits(1000);
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(method).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn set_following(&self, following: bool) {
        self.following.store(following, Ordering::SeqCst);
    }

    pub fn fail_follow(&self, fail: bool) {
        self.fail_follow.store(fail, Ordering::SeqCst);
    }

    pub fn fail_user(&self, fail: bool) {
        self.fail_user.store(fail, Ordering::SeqCst);
    }

    /// Sort and direction of the last `list_starred` call
    pub fn starred_order(&self) -> Option<(String, String)> {
        self.starred_order.lock().ok().and_then(|order| order.clone())
    }

    async fn enter(&self, method: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(method).or_default() += 1;
        }
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
    }
}

pub fn profile(login: &str) -> UserProfile {
    UserProfile {
        login: login.to_string(),
        name: None,
        kind: if login == ORG_LOGIN {
            AccountType::Organization
        } else {
            AccountType::User
        },
        created_at: None,
        followers: 10,
        following: 2,
        public_repos: 3,
        total_private_repos: None,
        public_gists: 1,
        private_gists: None,
        email: None,
        blog: None,
        company: None,
        location: None,
    }
}

pub fn repo(owner: &str, name: &str) -> Repository {
    Repository {
        owner: owner.to_string(),
        name: name.to_string(),
        description: None,
        url: format!("https://github.com/{}/{}", owner, name),
        stars: 1,
        forks: 0,
        updated_at: None,
    }
}

fn user(login: &str) -> UserSummary {
    UserSummary {
        login: login.to_string(),
        kind: AccountType::User,
    }
}

/// Two pages: a full one, then a final one
fn two_pages<T>(page: u32, first: Vec<T>, second: Vec<T>) -> Page<T> {
    match page {
        1 => Page {
            items: first,
            has_more: true,
        },
        2 => Page::last(second),
        _ => Page::last(Vec::new()),
    }
}

#[async_trait]
impl Hub for FakeHub {
    async fn current_login(&self) -> Result<String> {
        self.enter("current_login").await;
        Ok("me".to_string())
    }

    async fn get_user(&self, login: &str, _bypass_cache: bool) -> Result<UserProfile> {
        self.enter("get_user").await;
        if self.fail_user.load(Ordering::SeqCst) {
            return Err(HubError::Api("Not Found".into()));
        }
        Ok(profile(login))
    }

    async fn list_repos(&self, query: &RepoQuery, page: u32, _bypass_cache: bool) -> Result<Page<Repository>> {
        self.enter("list_repos").await;
        let owner = match &query.owner {
            RepoOwner::Me => "me".to_string(),
            RepoOwner::User(login) | RepoOwner::Org(login) => login.clone(),
        };
        Ok(two_pages(
            page,
            vec![repo(&owner, "one"), repo(&owner, "two")],
            vec![repo(&owner, "three")],
        ))
    }

    async fn is_following(&self, _login: &str) -> Result<bool> {
        self.enter("is_following").await;
        Ok(self.following.load(Ordering::SeqCst))
    }

    async fn follow(&self, _login: &str) -> Result<()> {
        self.enter("follow").await;
        if self.fail_follow.load(Ordering::SeqCst) {
            return Err(HubError::Api("Forbidden".into()));
        }
        self.following.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn unfollow(&self, _login: &str) -> Result<()> {
        self.enter("unfollow").await;
        if self.fail_follow.load(Ordering::SeqCst) {
            return Err(HubError::Api("Forbidden".into()));
        }
        self.following.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn list_starred(
        &self,
        login: &str,
        sort: &str,
        direction: &str,
        page: u32,
        _bypass_cache: bool,
    ) -> Result<Page<Repository>> {
        if let Ok(mut order) = self.starred_order.lock() {
            *order = Some((sort.to_string(), direction.to_string()));
        }
        self.enter("list_starred").await;
        Ok(two_pages(page, vec![repo("rust-lang", "rust")], vec![repo(login, "starred")]))
    }

    async fn list_orgs(&self, _owner: &OrgOwner, page: u32, _bypass_cache: bool) -> Result<Page<UserSummary>> {
        self.enter("list_orgs").await;
        Ok(two_pages(
            page,
            vec![UserSummary {
                login: ORG_LOGIN.to_string(),
                kind: AccountType::Organization,
            }],
            Vec::new(),
        ))
    }

    async fn list_members(&self, _org: &str, page: u32, _bypass_cache: bool) -> Result<Page<UserSummary>> {
        self.enter("list_members").await;
        Ok(two_pages(page, vec![user("ann"), user("bob")], vec![user("cat")]))
    }

    async fn list_followers(&self, _login: &str, page: u32, _bypass_cache: bool) -> Result<Page<UserSummary>> {
        self.enter("list_followers").await;
        Ok(two_pages(page, vec![user("fan")], Vec::new()))
    }

    async fn list_following(&self, _login: &str, page: u32, _bypass_cache: bool) -> Result<Page<UserSummary>> {
        self.enter("list_following").await;
        Ok(two_pages(page, vec![user("idol")], Vec::new()))
    }

    async fn received_events(&self, login: &str, page: u32, _bypass_cache: bool) -> Result<Page<FeedEvent>> {
        self.enter("received_events").await;
        let event = FeedEvent {
            id: format!("{}-{}", login, page),
            actor: "hubot".into(),
            kind: "WatchEvent".into(),
            repo: "github/hub".into(),
            created_at: None,
        };
        Ok(two_pages(page, vec![event.clone()], vec![event]))
    }

    async fn public_events(&self, page: u32, bypass_cache: bool) -> Result<Page<FeedEvent>> {
        self.received_events("public", page, bypass_cache).await
    }

    async fn notifications(
        &self,
        filter: &NotificationFilter,
        _per_page: u8,
        _page: u32,
        _bypass_cache: bool,
    ) -> Result<Page<Notification>> {
        self.enter("notifications").await;
        let unread = Notification {
            id: "1".into(),
            repo: "o/r".into(),
            title: "Build failed".into(),
            subject_kind: "CheckSuite".into(),
            reason: "ci_activity".into(),
            unread: true,
            updated_at: None,
        };
        let items = if filter.all {
            vec![unread.clone(), Notification { unread: false, ..unread }]
        } else {
            vec![unread]
        };
        Ok(Page::last(items))
    }

    async fn search_issues(&self, query: &str, _page: u32, _bypass_cache: bool) -> Result<Page<IssueSummary>> {
        self.enter("search_issues").await;
        Ok(Page::last(vec![IssueSummary {
            repo: "o/r".into(),
            number: 7,
            title: query.to_string(),
            state: IssueState::Open,
            author: "me".into(),
            comments: 0,
            url: "https://github.com/o/r/issues/7".into(),
            updated_at: None,
        }]))
    }

    async fn search_repos(
        &self,
        query: &str,
        _sort: Option<&str>,
        _page: u32,
        _bypass_cache: bool,
    ) -> Result<Page<Repository>> {
        self.enter("search_repos").await;
        Ok(Page::last(vec![repo("found", query)]))
    }

    async fn search_users(&self, query: &str, _page: u32, _bypass_cache: bool) -> Result<Page<UserSummary>> {
        self.enter("search_users").await;
        Ok(Page::last(vec![user(query)]))
    }

    async fn list_gists(&self, login: &str, _page: u32, _bypass_cache: bool) -> Result<Page<Gist>> {
        self.enter("list_gists").await;
        Ok(Page::last(vec![Gist {
            id: "abc".into(),
            description: Some("dotfiles".into()),
            owner: login.to_string(),
            files: 2,
            public: true,
            url: "https://gist.github.com/abc".into(),
            updated_at: None,
        }]))
    }

    async fn starred_gists(&self, page: u32, bypass_cache: bool) -> Result<Page<Gist>> {
        self.list_gists("someone", page, bypass_cache).await
    }

    async fn blog_posts(&self, _bypass_cache: bool) -> Result<Vec<BlogPost>> {
        self.enter("blog_posts").await;
        Ok(vec![BlogPost {
            title: "Release notes".into(),
            link: "https://github.blog/release".into(),
            published: None,
        }])
    }
}

/// Session for "me" backed by a default [`FakeHub`]
pub fn session() -> (Session, mpsc::UnboundedReceiver<Action>) {
    session_with(Arc::new(FakeHub::default()))
}

pub fn session_with(hub: Arc<FakeHub>) -> (Session, mpsc::UnboundedReceiver<Action>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = Session::new(
        "me".to_string(),
        hub,
        Arc::new(MemoryPrefs::default()),
        tx,
    );
    (session, rx)
}

/// Let spawned tasks on the current-thread test runtime run to completion
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Everything delivered so far, without waiting
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Action>) -> Vec<Action> {
    let mut actions = Vec::new();
    while let Ok(action) = rx.try_recv() {
        actions.push(action);
    }
    actions
}
