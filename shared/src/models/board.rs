//! Boards, cards, comments, activities and join requests

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Default board background colour
pub const DEFAULT_BOARD_BACKGROUND: &str = "#ffffff";

/// Status reported to a user asking whether they may request access
pub const JOIN_STATUS_ALLOWED: &str = "allowed";
pub const JOIN_STATUS_PENDING_LIMIT: &str = "REQUEST_ACCESS_MEMBER_LIMIT_EXCEEDED";

/// Lifecycle of a request to join a board
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JoinRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl JoinRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinRequestStatus::Pending => "pending",
            JoinRequestStatus::Accepted => "accepted",
            JoinRequestStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for JoinRequestStatus {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JoinRequestStatus::Pending),
            "accepted" => Ok(JoinRequestStatus::Accepted),
            "rejected" => Ok(JoinRequestStatus::Rejected),
            _ => Err("Unknown join request status"),
        }
    }
}

/// Owner decision on a pending join request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JoinDecision {
    Accept,
    Reject,
}

impl JoinDecision {
    pub fn resulting_status(&self) -> JoinRequestStatus {
        match self {
            JoinDecision::Accept => JoinRequestStatus::Accepted,
            JoinDecision::Reject => JoinRequestStatus::Rejected,
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            JoinDecision::Accept => "accepted",
            JoinDecision::Reject => "rejected",
        }
    }
}

/// Whether a user may file a new join request, given their most recent one
pub fn join_request_availability(latest: Option<JoinRequestStatus>) -> &'static str {
    match latest {
        Some(JoinRequestStatus::Pending) => JOIN_STATUS_PENDING_LIMIT,
        _ => JOIN_STATUS_ALLOWED,
    }
}

/// Kinds of card activity recorded in the activity log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ActivityAction {
    Commented,
    Moved,
    CreateCard,
    AddMemberToCard,
    RemoveMemberFromCard,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Commented => "commented",
            ActivityAction::Moved => "moved",
            ActivityAction::CreateCard => "createCard",
            ActivityAction::AddMemberToCard => "addMemberToCard",
            ActivityAction::RemoveMemberFromCard => "removeMemberFromCard",
        }
    }
}

/// Difference between two card member sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberChanges {
    pub added: Vec<Uuid>,
    pub removed: Vec<Uuid>,
}

/// Compute which members were added and removed, preserving input order
pub fn diff_members(before: &[Uuid], after: &[Uuid]) -> MemberChanges {
    let before_set: HashSet<&Uuid> = before.iter().collect();
    let after_set: HashSet<&Uuid> = after.iter().collect();

    let mut seen = HashSet::new();
    let added = after
        .iter()
        .filter(|id| !before_set.contains(id) && seen.insert(**id))
        .copied()
        .collect();
    let removed = before
        .iter()
        .filter(|id| !after_set.contains(id))
        .copied()
        .collect();

    MemberChanges { added, removed }
}

/// Requested card members that are not on the board, in request order
pub fn outside_board(board_members: &[Uuid], requested: &[Uuid]) -> Vec<Uuid> {
    let members: HashSet<&Uuid> = board_members.iter().collect();
    let mut seen = HashSet::new();
    requested
        .iter()
        .filter(|id| !members.contains(id) && seen.insert(**id))
        .copied()
        .collect()
}

/// Card and list mutations as they affect a board's `card_count`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardCountChange {
    CardAdded,
    CardMoved,
    CardDeleted,
    ListDeleted { cards: u64 },
}

impl CardCountChange {
    pub fn delta(self) -> i32 {
        match self {
            CardCountChange::CardAdded => 1,
            CardCountChange::CardMoved => 0,
            CardCountChange::CardDeleted => -1,
            CardCountChange::ListDeleted { cards } => {
                i32::try_from(cards).unwrap_or(i32::MAX).saturating_neg()
            }
        }
    }

    /// The count after this change, never below zero
    pub fn apply(self, current: i32) -> i32 {
        current.saturating_add(self.delta()).max(0)
    }
}

/// Emoji used to react to a comment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Emoji {
    pub emoji: String,
    pub unified: String,
}

/// All reactions on a comment sharing the same emoji
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReactionGroup {
    pub emoji: Emoji,
    pub user_ids: Vec<Uuid>,
    pub count: usize,
}

/// Outcome of toggling a reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionChange {
    Added,
    Removed,
}

/// Toggle `user`'s reaction with `emoji`.
///
/// Groups are keyed by `emoji.unified`; a group whose last user leaves is dropped.
pub fn toggle_reaction(groups: &mut Vec<ReactionGroup>, emoji: &Emoji, user: Uuid) -> ReactionChange {
    let Some(index) = groups.iter().position(|g| g.emoji.unified == emoji.unified) else {
        groups.push(ReactionGroup {
            emoji: emoji.clone(),
            user_ids: vec![user],
            count: 1,
        });
        return ReactionChange::Added;
    };

    let group = &mut groups[index];
    let change = if let Some(pos) = group.user_ids.iter().position(|id| *id == user) {
        group.user_ids.remove(pos);
        ReactionChange::Removed
    } else {
        group.user_ids.push(user);
        ReactionChange::Added
    };
    group.count = group.user_ids.len();

    if group.count == 0 {
        groups.remove(index);
    }
    change
}

/// Fold flat `(emoji, unified, user)` rows into reaction groups, first-seen order
pub fn group_reactions<I>(rows: I) -> Vec<ReactionGroup>
where
    I: IntoIterator<Item = (String, String, Uuid)>,
{
    let mut groups: Vec<ReactionGroup> = Vec::new();
    for (emoji, unified, user) in rows {
        match groups.iter_mut().find(|g| g.emoji.unified == unified) {
            Some(group) => {
                if !group.user_ids.contains(&user) {
                    group.user_ids.push(user);
                    group.count = group.user_ids.len();
                }
            }
            None => groups.push(ReactionGroup {
                emoji: Emoji { emoji, unified },
                user_ids: vec![user],
                count: 1,
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thumbs() -> Emoji {
        Emoji {
            emoji: "👍".into(),
            unified: "1f44d".into(),
        }
    }

    #[test]
    fn test_join_request_availability() {
        assert_eq!(join_request_availability(None), JOIN_STATUS_ALLOWED);
        assert_eq!(
            join_request_availability(Some(JoinRequestStatus::Rejected)),
            JOIN_STATUS_ALLOWED
        );
        assert_eq!(
            join_request_availability(Some(JoinRequestStatus::Accepted)),
            JOIN_STATUS_ALLOWED
        );
        assert_eq!(
            join_request_availability(Some(JoinRequestStatus::Pending)),
            JOIN_STATUS_PENDING_LIMIT
        );
    }

    #[test]
    fn test_toggle_reaction_add_then_remove() {
        let user = Uuid::new_v4();
        let mut groups = Vec::new();

        assert_eq!(toggle_reaction(&mut groups, &thumbs(), user), ReactionChange::Added);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 1);

        assert_eq!(toggle_reaction(&mut groups, &thumbs(), user), ReactionChange::Removed);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_toggle_reaction_second_user_joins_group() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut groups = Vec::new();
        toggle_reaction(&mut groups, &thumbs(), a);
        toggle_reaction(&mut groups, &thumbs(), b);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 2);

        toggle_reaction(&mut groups, &thumbs(), a);
        assert_eq!(groups[0].user_ids, vec![b]);
        assert_eq!(groups[0].count, 1);
    }

    #[test]
    fn test_diff_members() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let changes = diff_members(&[a, b], &[b, c, c]);
        assert_eq!(changes.added, vec![c]);
        assert_eq!(changes.removed, vec![a]);
    }

    #[test]
    fn test_activity_wire_names() {
        let json = serde_json::to_string(&ActivityAction::RemoveMemberFromCard).unwrap();
        assert_eq!(json, "\"removeMemberFromCard\"");
        assert_eq!(ActivityAction::CreateCard.as_str(), "createCard");
    }
}
