use std::fmt;

/// Which call a toggle needs to make
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOp {
    Follow,
    Unfollow,
}

impl fmt::Display for FollowOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FollowOp::Follow => write!(f, "Follow"),
            FollowOp::Unfollow => write!(f, "Unfollow"),
        }
    }
}

/// Follow relationship between the signed-in account and a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowState {
    /// Not loaded yet; the toggle shows a busy indicator.
    #[default]
    Unknown,
    Idle {
        following: bool,
    },
    /// A follow/unfollow call is in flight; input is disabled.
    Pending {
        following: bool,
    },
}

impl FollowState {
    pub fn following(&self) -> Option<bool> {
        match self {
            FollowState::Unknown => None,
            FollowState::Idle { following } | FollowState::Pending { following } => {
                Some(*following)
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self, FollowState::Idle { .. })
    }

    /// Label for the toggle, or None while it is busy
    pub fn action(&self) -> Option<FollowOp> {
        match self {
            FollowState::Idle { following: true } => Some(FollowOp::Unfollow),
            FollowState::Idle { following: false } => Some(FollowOp::Follow),
            _ => None,
        }
    }

    pub fn loaded(&mut self, following: bool) {
        *self = FollowState::Idle { following };
    }

    /// Enter `Pending`. Returns the call to make, or None when input is disabled.
    pub fn begin_toggle(&mut self) -> Option<FollowOp> {
        let op = self.action()?;
        if let FollowState::Idle { following } = *self {
            *self = FollowState::Pending { following };
        }
        Some(op)
    }

    /// Settle a pending toggle. On success the relationship flips and
    /// `followers` moves by one; on failure both stay as they were.
    /// Returns true when the state changed.
    pub fn complete(&mut self, succeeded: bool, followers: Option<&mut u32>) -> bool {
        let FollowState::Pending { following } = *self else {
            return false;
        };

        if !succeeded {
            *self = FollowState::Idle { following };
            return false;
        }

        let now_following = !following;
        *self = FollowState::Idle {
            following: now_following,
        };
        if let Some(count) = followers {
            *count = if now_following {
                count.saturating_add(1)
            } else {
                count.saturating_sub(1)
            };
        }
        true
    }
}
