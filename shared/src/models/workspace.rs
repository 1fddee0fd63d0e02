//! Workspaces and workspace invitation links

/// Number of joins a single workspace invitation link allows
pub const DEFAULT_INVITATION_LIMIT: i32 = 10;

/// Whether an invitation link with `used` joins out of `limit` may be used again
pub fn invitation_has_capacity(used: i32, limit: i32) -> bool {
    used < limit
}

/// Who may leave a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveCheck {
    Allowed,
    OwnerCannotLeave,
    NotMember,
}

/// Decide whether a user may leave a workspace
pub fn can_leave_workspace(is_owner: bool, is_member: bool) -> LeaveCheck {
    if is_owner {
        LeaveCheck::OwnerCannotLeave
    } else if !is_member {
        LeaveCheck::NotMember
    } else {
        LeaveCheck::Allowed
    }
}
