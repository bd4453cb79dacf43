use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    User,
    Organization,
}

/// Full profile of a user or organization account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub name: Option<String>,
    pub kind: AccountType,
    pub created_at: Option<DateTime<Utc>>,
    pub followers: u32,
    pub following: u32,
    pub public_repos: u32,
    pub total_private_repos: Option<u32>,
    pub public_gists: u32,
    pub private_gists: Option<u32>,
    pub email: Option<String>,
    pub blog: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.login,
        }
    }

    pub fn is_organization(&self) -> bool {
        self.kind == AccountType::Organization
    }

    pub fn repo_count(&self) -> u32 {
        self.public_repos + self.total_private_repos.unwrap_or(0)
    }

    pub fn gist_count(&self) -> u32 {
        self.public_gists + self.private_gists.unwrap_or(0)
    }
}

/// Account as it appears in member/follower/organization lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub login: String,
    pub kind: AccountType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub stars: u32,
    pub forks: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Repository {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Entry of a news feed or the public timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEvent {
    pub id: String,
    pub actor: String,
    pub kind: String,
    pub repo: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl FeedEvent {
    /// "PushEvent" -> "push"
    pub fn verb(&self) -> String {
        let bare = self.kind.strip_suffix("Event").unwrap_or(&self.kind);
        let mut out = String::with_capacity(bare.len() + 4);
        for (i, ch) in bare.chars().enumerate() {
            if ch.is_uppercase() && i > 0 {
                out.push(' ');
            }
            out.extend(ch.to_lowercase());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub repo: String,
    pub title: String,
    pub subject_kind: String,
    pub reason: String,
    pub unread: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueState {
    Open,
    Closed,
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => write!(f, "Open"),
            IssueState::Closed => write!(f, "Closed"),
        }
    }
}

/// Issue or pull request found through the search API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub repo: String,
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    pub author: String,
    pub comments: u32,
    pub url: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gist {
    pub id: String,
    pub description: Option<String>,
    pub owner: String,
    pub files: u32,
    pub public: bool,
    pub url: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub title: String,
    pub link: String,
    pub published: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkKind {
    User,
    Repository,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub name: String,
    pub url: String,
    pub kind: BookmarkKind,
}

/// What pressing Enter on a list row does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Profile(String),
    Browser(String),
}

/// One row of any list view.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Repo(Repository),
    User(UserSummary),
    Event(FeedEvent),
    Notification(Notification),
    Issue(IssueSummary),
    Gist(Gist),
    Post(BlogPost),
    Bookmark(Bookmark),
}

impl Item {
    pub fn title(&self) -> String {
        match self {
            Item::Repo(repo) => repo.full_name(),
            Item::User(user) => user.login.clone(),
            Item::Event(event) => format!("{} {} {}", event.actor, event.verb(), event.repo),
            Item::Notification(n) => n.title.clone(),
            Item::Issue(issue) => format!("{}#{} {}", issue.repo, issue.number, issue.title),
            Item::Gist(gist) => gist
                .description
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| gist.id.clone()),
            Item::Post(post) => post.title.clone(),
            Item::Bookmark(bookmark) => bookmark.name.clone(),
        }
    }

    pub fn detail(&self) -> Option<String> {
        match self {
            Item::Repo(repo) => repo.description.clone(),
            Item::User(user) => match user.kind {
                AccountType::Organization => Some("organization".to_string()),
                AccountType::User => None,
            },
            Item::Event(_) => None,
            Item::Notification(n) => Some(format!("{} · {} · {}", n.repo, n.subject_kind, n.reason)),
            Item::Issue(issue) => Some(format!("{} by @{}", issue.state, issue.author)),
            Item::Gist(gist) => Some(format!(
                "{} file{}{}",
                gist.files,
                if gist.files == 1 { "" } else { "s" },
                if gist.public { "" } else { " · secret" }
            )),
            Item::Post(post) => post.published.clone(),
            Item::Bookmark(bookmark) => Some(bookmark.url.clone()),
        }
    }

    pub fn meta(&self) -> Option<String> {
        match self {
            Item::Repo(repo) => Some(format!("★ {}  ⑂ {}", repo.stars, repo.forks)),
            Item::Issue(issue) => Some(format!("💬 {}", issue.comments)),
            Item::Notification(n) if n.unread => Some("●".to_string()),
            _ => None,
        }
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Item::Repo(repo) => repo.updated_at,
            Item::Event(event) => event.created_at,
            Item::Notification(n) => n.updated_at,
            Item::Issue(issue) => issue.updated_at,
            Item::Gist(gist) => gist.updated_at,
            Item::User(_) | Item::Post(_) | Item::Bookmark(_) => None,
        }
    }

    pub fn target(&self) -> Target {
        match self {
            Item::User(user) => Target::Profile(user.login.clone()),
            Item::Event(event) => Target::Profile(event.actor.clone()),
            Item::Repo(repo) => Target::Browser(repo.url.clone()),
            Item::Issue(issue) => Target::Browser(issue.url.clone()),
            Item::Gist(gist) => Target::Browser(gist.url.clone()),
            Item::Post(post) => Target::Browser(post.link.clone()),
            Item::Notification(n) => Target::Browser(format!("https://github.com/{}", n.repo)),
            Item::Bookmark(bookmark) => match bookmark.kind {
                BookmarkKind::User => Target::Profile(bookmark.name.clone()),
                BookmarkKind::Repository => Target::Browser(bookmark.url.clone()),
            },
        }
    }

    /// Bookmark for this row, if it names something worth bookmarking
    pub fn as_bookmark(&self) -> Option<Bookmark> {
        match self {
            Item::Repo(repo) => Some(Bookmark {
                name: repo.full_name(),
                url: repo.url.clone(),
                kind: BookmarkKind::Repository,
            }),
            Item::User(user) => Some(Bookmark {
                name: user.login.clone(),
                url: format!("https://github.com/{}", user.login),
                kind: BookmarkKind::User,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: Option<&str>) -> UserProfile {
        UserProfile {
            login: "octocat".to_string(),
            name: name.map(str::to_string),
            kind: AccountType::User,
            created_at: None,
            followers: 3,
            following: 1,
            public_repos: 8,
            total_private_repos: Some(2),
            public_gists: 4,
            private_gists: None,
            email: None,
            blog: None,
            company: None,
            location: None,
        }
    }

    #[test]
    fn display_name_falls_back_to_login() {
        assert_eq!(profile(None).display_name(), "octocat");
        assert_eq!(profile(Some("  ")).display_name(), "octocat");
        assert_eq!(profile(Some("The Octocat")).display_name(), "The Octocat");
    }

    #[test]
    fn counts_add_private_totals() {
        let p = profile(None);
        assert_eq!(p.repo_count(), 10);
        assert_eq!(p.gist_count(), 4);
    }

    #[test]
    fn event_verb_splits_camel_case() {
        let event = FeedEvent {
            id: "1".into(),
            actor: "a".into(),
            kind: "PullRequestReviewEvent".into(),
            repo: "o/r".into(),
            created_at: None,
        };
        assert_eq!(event.verb(), "pull request review");
    }

    #[test]
    fn users_open_profiles_and_repos_open_browser() {
        let user = Item::User(UserSummary {
            login: "hubot".into(),
            kind: AccountType::User,
        });
        assert_eq!(user.target(), Target::Profile("hubot".into()));

        let repo = Item::Repo(Repository {
            owner: "o".into(),
            name: "r".into(),
            description: None,
            url: "https://github.com/o/r".into(),
            stars: 0,
            forks: 0,
            updated_at: None,
        });
        assert_eq!(repo.target(), Target::Browser("https://github.com/o/r".into()));
        assert_eq!(repo.as_bookmark().map(|b| b.name), Some("o/r".to_string()));
    }
}
