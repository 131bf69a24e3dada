//! Comment lifecycle rules shared by the detail controller and the stores.

use crate::models::CommentStatus;

/// What a "delete" gesture turns into for a comment in `current` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteIntent {
    /// Permanent deletion. The caller must confirm first.
    ConfirmPermanent,
    /// Soft delete, reversible.
    MoveToTrash,
}

pub fn delete_intent(current: CommentStatus) -> DeleteIntent {
    match current {
        CommentStatus::Spam | CommentStatus::Trash => DeleteIntent::ConfirmPermanent,
        _ => DeleteIntent::MoveToTrash,
    }
}

/// Default moderate button: approved comments get unapproved, everything else approved.
pub fn moderate_toggle_target(current: CommentStatus) -> CommentStatus {
    if current == CommentStatus::Approved {
        CommentStatus::Unapproved
    } else {
        CommentStatus::Approved
    }
}

pub fn spam_toggle_target(current: CommentStatus) -> CommentStatus {
    if current == CommentStatus::Spam {
        CommentStatus::Approved
    } else {
        CommentStatus::Spam
    }
}

/// Label used when tracking a transition. Restoring from spam or trash is an
/// approval on the wire but tracked as unspam / untrash.
pub fn tracked_status(previous: CommentStatus, new: CommentStatus) -> CommentStatus {
    match (previous, new) {
        (CommentStatus::Spam, CommentStatus::Approved) => CommentStatus::Unspam,
        (CommentStatus::Trash, CommentStatus::Approved) => CommentStatus::Untrash,
        _ => new,
    }
}

pub fn can_transition(from: CommentStatus, to: CommentStatus) -> bool {
    use CommentStatus::*;

    let to = to.persisted();
    if from == Deleted || from == to {
        return false;
    }
    match to {
        Deleted => matches!(from, Spam | Trash),
        Trash => true,
        Approved => matches!(from, Unapproved | Spam | Trash),
        Unapproved => from == Approved,
        Spam => matches!(from, Approved | Unapproved),
        Unspam | Untrash => false,
    }
}
