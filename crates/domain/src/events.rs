use crate::errors::{AuthError, CommentError, ReaderError, TaxonomyError};
use crate::models::{FeedKey, ReaderFeedSite, RequestDataAction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentChangeCause {
    FetchComment,
    PushComment,
    DeleteComment,
    LikeComment,
    CreateNewComment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnCommentChanged {
    pub cause: CommentChangeCause,
    pub changed_local_ids: Vec<i64>,
    pub error: Option<CommentError>,
}

impl OnCommentChanged {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnReaderSitesSearched {
    pub term: String,
    pub offset: u32,
    pub feeds: Vec<ReaderFeedSite>,
    pub can_load_more: bool,
    pub error: Option<ReaderError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateResult {
    Changed,
    Unchanged,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnReaderPostsUpdated {
    pub feed: FeedKey,
    pub action: RequestDataAction,
    pub result: UpdateResult,
    pub num_new_posts: u32,
    pub error: Option<ReaderError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnReaderPostsBackfilled {
    pub feed: FeedKey,
    pub num_new_posts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnMagicLinkSent {
    pub email: String,
    pub error: Option<AuthError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnTaxonomyChanged {
    pub local_site_id: i64,
    pub rows_affected: u64,
    pub error: Option<TaxonomyError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadKind {
    Media,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnUploadChanged {
    pub kind: UploadKind,
    pub local_id: i64,
}
