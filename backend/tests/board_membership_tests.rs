//! Board membership and collaboration tests
//!
//! Property-based and unit tests for:
//! - Card member diffs driving add/remove notifications
//! - Card members restricted to board members
//! - Board card counts across card and list mutations
//! - Comment reaction toggling and grouping
//! - Join request availability and owner decisions
//! - Workspace leave rules and invitation link capacity

use proptest::prelude::*;
use shared::{
    can_leave_workspace, diff_members, outside_board, CardCountChange, group_reactions, invitation_has_capacity,
    join_request_availability, toggle_reaction, Emoji, JoinDecision, JoinRequestStatus,
    LeaveCheck, ReactionChange, ReactionGroup, DEFAULT_INVITATION_LIMIT, JOIN_STATUS_ALLOWED,
    JOIN_STATUS_PENDING_LIMIT,
};
use std::collections::HashSet;
use uuid::Uuid;

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Generate user ids
fn user_id_strategy() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

/// Generate card member lists (may contain duplicates)
fn member_list_strategy() -> impl Strategy<Value = Vec<Uuid>> {
    prop::collection::vec(0u128..20, 0..12)
        .prop_map(|ids| ids.into_iter().map(Uuid::from_u128).collect())
}

/// Generate reaction emojis from a small palette
fn emoji_strategy() -> impl Strategy<Value = Emoji> {
    prop_oneof![
        Just(("👍", "1f44d")),
        Just(("🎉", "1f389")),
        Just(("❤️", "2764-fe0f")),
        Just(("😂", "1f602")),
    ]
    .prop_map(|(emoji, unified)| Emoji {
        emoji: emoji.to_string(),
        unified: unified.to_string(),
    })
}

/// Generate join request histories
fn latest_request_strategy() -> impl Strategy<Value = Option<JoinRequestStatus>> {
    prop_oneof![
        Just(None),
        Just(Some(JoinRequestStatus::Pending)),
        Just(Some(JoinRequestStatus::Accepted)),
        Just(Some(JoinRequestStatus::Rejected)),
    ]
}

/// Reaction groups as an order-independent set of (unified, user) pairs
fn normalized(groups: &[ReactionGroup]) -> HashSet<(String, Uuid)> {
    groups
        .iter()
        .flat_map(|g| g.user_ids.iter().map(move |u| (g.emoji.unified.clone(), *u)))
        .collect()
}

fn thumbs_up() -> Emoji {
    Emoji {
        emoji: "👍".to_string(),
        unified: "1f44d".to_string(),
    }
}

/// Card and list operations on a board with four lists
#[derive(Debug, Clone)]
enum BoardOp {
    AddCard(usize),
    MoveCard(usize, usize),
    DeleteCard(usize),
    DeleteList(usize),
}

fn board_op_strategy() -> impl Strategy<Value = BoardOp> {
    prop_oneof![
        (0usize..4).prop_map(BoardOp::AddCard),
        (0usize..4, 0usize..4).prop_map(|(from, to)| BoardOp::MoveCard(from, to)),
        (0usize..4).prop_map(BoardOp::DeleteCard),
        (0usize..4).prop_map(BoardOp::DeleteList),
    ]
}

/// Apply an operation to per-list card counts, returning the count change it made
fn apply_op(lists: &mut [u64; 4], op: &BoardOp) -> Option<CardCountChange> {
    match *op {
        BoardOp::AddCard(list) => {
            lists[list] += 1;
            Some(CardCountChange::CardAdded)
        }
        BoardOp::MoveCard(from, to) if lists[from] > 0 => {
            lists[from] -= 1;
            lists[to] += 1;
            Some(CardCountChange::CardMoved)
        }
        BoardOp::DeleteCard(list) if lists[list] > 0 => {
            lists[list] -= 1;
            Some(CardCountChange::CardDeleted)
        }
        BoardOp::DeleteList(list) => {
            let cards = std::mem::take(&mut lists[list]);
            Some(CardCountChange::ListDeleted { cards })
        }
        // Nothing to move or delete
        _ => None,
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Added members are exactly the new ones, each reported once
    #[test]
    fn prop_diff_added_are_new_members(
        before in member_list_strategy(),
        after in member_list_strategy(),
    ) {
        let changes = diff_members(&before, &after);
        let before_set: HashSet<_> = before.iter().collect();

        for id in &changes.added {
            prop_assert!(!before_set.contains(id));
            prop_assert!(after.contains(id));
        }
        let unique: HashSet<_> = changes.added.iter().collect();
        prop_assert_eq!(unique.len(), changes.added.len());
    }

    /// Removed members are exactly those no longer on the card
    #[test]
    fn prop_diff_removed_are_gone(
        before in member_list_strategy(),
        after in member_list_strategy(),
    ) {
        let changes = diff_members(&before, &after);
        for id in &changes.removed {
            prop_assert!(before.contains(id));
            prop_assert!(!after.contains(id));
        }
    }

    /// An unchanged member list produces no changes
    #[test]
    fn prop_diff_identity_is_empty(members in member_list_strategy()) {
        let changes = diff_members(&members, &members);
        prop_assert!(changes.added.is_empty());
        prop_assert!(changes.removed.is_empty());
    }

    /// Toggling the same reaction twice restores the original groups
    #[test]
    fn prop_toggle_twice_is_identity(
        seed in prop::collection::vec((emoji_strategy(), user_id_strategy()), 0..8),
        emoji in emoji_strategy(),
        user in user_id_strategy(),
    ) {
        let mut groups: Vec<ReactionGroup> = Vec::new();
        for (e, u) in &seed {
            toggle_reaction(&mut groups, e, *u);
        }
        let original = groups.clone();

        let first = toggle_reaction(&mut groups, &emoji, user);
        let second = toggle_reaction(&mut groups, &emoji, user);

        prop_assert_ne!(first, second);
        prop_assert_eq!(normalized(&groups), normalized(&original));
    }

    /// Every group's count matches its user list and no group is empty
    #[test]
    fn prop_reaction_counts_consistent(
        toggles in prop::collection::vec((emoji_strategy(), 0u128..5), 0..30),
    ) {
        let mut groups = Vec::new();
        for (emoji, user) in &toggles {
            toggle_reaction(&mut groups, emoji, Uuid::from_u128(*user));
        }
        for group in &groups {
            prop_assert_eq!(group.count, group.user_ids.len());
            prop_assert!(group.count > 0);
        }
        let unified: HashSet<_> = groups.iter().map(|g| g.emoji.unified.clone()).collect();
        prop_assert_eq!(unified.len(), groups.len());
    }

    /// A pending request blocks new requests; anything else allows them
    #[test]
    fn prop_join_availability(latest in latest_request_strategy()) {
        let status = join_request_availability(latest);
        if latest == Some(JoinRequestStatus::Pending) {
            prop_assert_eq!(status, JOIN_STATUS_PENDING_LIMIT);
        } else {
            prop_assert_eq!(status, JOIN_STATUS_ALLOWED);
        }
    }

    /// Invitation links accept joins strictly below their limit
    #[test]
    fn prop_invitation_capacity(used in 0i32..50, limit in 1i32..50) {
        prop_assert_eq!(invitation_has_capacity(used, limit), used < limit);
    }

    /// The stored card count tracks the cards actually on the board
    #[test]
    fn prop_card_count_matches_cards(ops in prop::collection::vec(board_op_strategy(), 0..60)) {
        let mut lists = [0u64; 4];
        let mut card_count = 0i32;
        for op in &ops {
            if let Some(change) = apply_op(&mut lists, op) {
                card_count = change.apply(card_count);
            }
            prop_assert_eq!(i64::from(card_count), lists.iter().sum::<u64>() as i64);
        }
    }

    /// Only requested ids missing from the board are reported
    #[test]
    fn prop_outside_board(
        board in member_list_strategy(),
        requested in member_list_strategy(),
    ) {
        let outside = outside_board(&board, &requested);
        for id in &outside {
            prop_assert!(!board.contains(id));
            prop_assert!(requested.contains(id));
        }
        for id in requested.iter().filter(|id| !board.contains(id)) {
            prop_assert!(outside.contains(id));
        }
        prop_assert!(outside_board(&board, &board).is_empty());
    }
}

// ============================================================================
// Card Member Tests
// ============================================================================

#[cfg(test)]
mod card_member_tests {
    use super::*;

    #[test]
    fn test_diff_preserves_order() {
        let ids: Vec<Uuid> = (1..=4).map(Uuid::from_u128).collect();
        let before = vec![ids[0], ids[1]];
        let after = vec![ids[3], ids[1], ids[2]];

        let changes = diff_members(&before, &after);
        assert_eq!(changes.added, vec![ids[3], ids[2]]);
        assert_eq!(changes.removed, vec![ids[0]]);
    }

    #[test]
    fn test_diff_duplicate_additions_reported_once() {
        let new = Uuid::from_u128(7);
        let changes = diff_members(&[], &[new, new]);
        assert_eq!(changes.added, vec![new]);
    }

    #[test]
    fn test_diff_clearing_members() {
        let ids: Vec<Uuid> = (1..=3).map(Uuid::from_u128).collect();
        let changes = diff_members(&ids, &[]);
        assert!(changes.added.is_empty());
        assert_eq!(changes.removed, ids);
    }

    #[test]
    fn test_unknown_card_member_reported_once() {
        let (owner, member, stranger) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            outside_board(&[owner, member], &[member, stranger, stranger]),
            vec![stranger]
        );
        assert!(outside_board(&[owner, member], &[]).is_empty());
    }

    #[test]
    fn test_card_count_changes() {
        assert_eq!(CardCountChange::CardAdded.apply(0), 1);
        assert_eq!(CardCountChange::CardMoved.apply(3), 3);
        assert_eq!(CardCountChange::CardDeleted.apply(3), 2);
        assert_eq!(CardCountChange::ListDeleted { cards: 2 }.apply(5), 3);
    }

    #[test]
    fn test_card_count_never_negative() {
        assert_eq!(CardCountChange::CardDeleted.apply(0), 0);
        assert_eq!(CardCountChange::ListDeleted { cards: 10 }.apply(4), 0);
        assert_eq!(CardCountChange::ListDeleted { cards: u64::MAX }.apply(i32::MAX), 0);
    }
}

// ============================================================================
// Comment Reaction Tests
// ============================================================================

#[cfg(test)]
mod reaction_tests {
    use super::*;

    #[test]
    fn test_first_reaction_creates_group() {
        let mut groups = Vec::new();
        let user = Uuid::from_u128(1);

        assert_eq!(toggle_reaction(&mut groups, &thumbs_up(), user), ReactionChange::Added);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].user_ids, vec![user]);
        assert_eq!(groups[0].count, 1);
    }

    #[test]
    fn test_second_user_joins_group() {
        let mut groups = Vec::new();
        toggle_reaction(&mut groups, &thumbs_up(), Uuid::from_u128(1));
        toggle_reaction(&mut groups, &thumbs_up(), Uuid::from_u128(2));

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 2);
    }

    #[test]
    fn test_last_removal_drops_group() {
        let mut groups = Vec::new();
        let user = Uuid::from_u128(1);
        toggle_reaction(&mut groups, &thumbs_up(), user);

        assert_eq!(toggle_reaction(&mut groups, &thumbs_up(), user), ReactionChange::Removed);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_group_keyed_by_unified_code() {
        let mut groups = Vec::new();
        let skin_tone = Emoji {
            emoji: "👍🏽".to_string(),
            unified: "1f44d".to_string(),
        };
        toggle_reaction(&mut groups, &thumbs_up(), Uuid::from_u128(1));
        toggle_reaction(&mut groups, &skin_tone, Uuid::from_u128(2));

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].emoji.emoji, "👍");
    }

    #[test]
    fn test_group_rows_first_seen_order() {
        let (a, b) = (Uuid::from_u128(1), Uuid::from_u128(2));
        let rows = vec![
            ("🎉".to_string(), "1f389".to_string(), a),
            ("👍".to_string(), "1f44d".to_string(), a),
            ("🎉".to_string(), "1f389".to_string(), b),
            ("🎉".to_string(), "1f389".to_string(), b),
        ];

        let groups = group_reactions(rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].emoji.unified, "1f389");
        assert_eq!(groups[0].user_ids, vec![a, b]);
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[1].count, 1);
    }

    #[test]
    fn test_reaction_group_json_shape() {
        let mut groups = Vec::new();
        toggle_reaction(&mut groups, &thumbs_up(), Uuid::nil());

        let json = serde_json::to_value(&groups[0]).unwrap();
        assert_eq!(json["emoji"]["unified"], "1f44d");
        assert_eq!(json["count"], 1);
        assert!(json["userIds"].is_array());
    }
}

// ============================================================================
// Join Request Tests
// ============================================================================

#[cfg(test)]
mod join_request_tests {
    use super::*;

    #[test]
    fn test_decision_outcomes() {
        assert_eq!(JoinDecision::Accept.resulting_status(), JoinRequestStatus::Accepted);
        assert_eq!(JoinDecision::Reject.resulting_status(), JoinRequestStatus::Rejected);
        assert_eq!(JoinDecision::Accept.past_tense(), "accepted");
        assert_eq!(JoinDecision::Reject.past_tense(), "rejected");
    }

    #[test]
    fn test_decision_from_json() {
        let decision: JoinDecision = serde_json::from_str("\"accept\"").unwrap();
        assert_eq!(decision, JoinDecision::Accept);
        assert!(serde_json::from_str::<JoinDecision>("\"maybe\"").is_err());
    }

    #[test]
    fn test_status_parse() {
        for status in [
            JoinRequestStatus::Pending,
            JoinRequestStatus::Accepted,
            JoinRequestStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<JoinRequestStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<JoinRequestStatus>().is_err());
    }

    #[test]
    fn test_rejected_user_may_ask_again() {
        assert_eq!(
            join_request_availability(Some(JoinRequestStatus::Rejected)),
            JOIN_STATUS_ALLOWED
        );
    }
}

// ============================================================================
// Workspace Membership Tests
// ============================================================================

#[cfg(test)]
mod workspace_membership_tests {
    use super::*;

    #[test]
    fn test_owner_cannot_leave() {
        assert_eq!(can_leave_workspace(true, true), LeaveCheck::OwnerCannotLeave);
        assert_eq!(can_leave_workspace(true, false), LeaveCheck::OwnerCannotLeave);
    }

    #[test]
    fn test_non_member_cannot_leave() {
        assert_eq!(can_leave_workspace(false, false), LeaveCheck::NotMember);
    }

    #[test]
    fn test_member_may_leave() {
        assert_eq!(can_leave_workspace(false, true), LeaveCheck::Allowed);
    }

    #[test]
    fn test_default_invitation_limit() {
        assert!(invitation_has_capacity(DEFAULT_INVITATION_LIMIT - 1, DEFAULT_INVITATION_LIMIT));
        assert!(!invitation_has_capacity(DEFAULT_INVITATION_LIMIT, DEFAULT_INVITATION_LIMIT));
    }
}
