use std::sync::Arc;

use crate::error::HubError;
use crate::hub::Hub;
use crate::loader::ScopeId;
use crate::paging::Page;
use crate::types::{Item, Repository, UserProfile, UserSummary};

/// Results of loads, routed back to the scope that started them.
#[derive(Debug, Clone)]
pub enum Loaded {
    // Home container
    Account(Box<UserProfile>),
    UnreadNotifications(bool),

    // One page of a list (a home tab or a pushed list screen)
    Page {
        tab: usize,
        generation: u64,
        page: u32,
        items: Page<Item>,
    },

    // Profile screen
    Profile(Box<UserProfile>),
    TopRepositories(Vec<Repository>),
    Organizations(Vec<UserSummary>),
    IsFollowing(bool),
    MemberCount(usize),
}

#[derive(Debug, Clone)]
pub enum Action {
    Back,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,
    Select,
    NextTab,
    PrevTab,
    Refresh,

    // Drawers
    ToggleDrawer,
    ToggleToolDrawer,
    PopupUp,
    PopupDown,
    PopupSelect,

    // Search
    EnterSearchMode,
    ExitSearchMode,
    SearchInput(char),
    SearchBackspace,
    SearchConfirm,

    // Profile
    ToggleFollow,
    FollowToggled {
        scope: ScopeId,
        result: Result<(), String>,
    },

    AddBookmark,

    // A different account finished signing in
    AccountReady {
        login: String,
        hub: Arc<dyn Hub>,
    },

    Loaded {
        scope: ScopeId,
        data: Loaded,
    },
    LoadFailed {
        scope: ScopeId,
        tab: Option<usize>,
        message: String,
    },

    /// Terminal body height in rows
    Resize(u16),
    Error(String),
    None,
}

impl Action {
    /// Actions that come from the keyboard rather than from background work
    pub fn is_input(&self) -> bool {
        !matches!(
            self,
            Action::Loaded { .. }
                | Action::LoadFailed { .. }
                | Action::FollowToggled { .. }
                | Action::AccountReady { .. }
                | Action::Resize(_)
                | Action::Error(_)
                | Action::None
        )
    }
}

impl From<HubError> for Action {
    fn from(err: HubError) -> Self {
        Action::Error(err.to_string())
    }
}
