use domain::CommentStatus;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    CommentApproved,
    CommentUnapproved,
    CommentSpammed,
    CommentUnspammed,
    CommentTrashed,
    CommentUntrashed,
    CommentDeleted,
    CommentLiked,
    CommentUnliked,
    CommentReplied,
    ReaderInfiniteScroll,
    ReaderSitesSearched,
    LoginMagicLinkRequested,
    LoginMagicLinkSent,
    LoginMagicLinkFailed,
}

impl Stat {
    /// `status` is the tracked label, see `domain::moderation::tracked_status`.
    pub fn for_moderation(status: CommentStatus) -> Stat {
        match status {
            CommentStatus::Approved => Stat::CommentApproved,
            CommentStatus::Unapproved => Stat::CommentUnapproved,
            CommentStatus::Spam => Stat::CommentSpammed,
            CommentStatus::Unspam => Stat::CommentUnspammed,
            CommentStatus::Trash => Stat::CommentTrashed,
            CommentStatus::Untrash => Stat::CommentUntrashed,
            CommentStatus::Deleted => Stat::CommentDeleted,
        }
    }
}

pub trait Tracker: Send + Sync {
    fn track(&self, stat: Stat);
}

/// Writes every stat to the log under the `analytics` target.
#[derive(Debug, Default)]
pub struct LogTracker;

impl Tracker for LogTracker {
    fn track(&self, stat: Stat) {
        info!(target: "analytics", ?stat, "tracked");
    }
}
