//! Data carried by actions, in both directions.
//!
//! Request payloads describe what a store should ask the remote service for.
//! Response payloads carry either the result or a typed error, never both.

use serde::{Deserialize, Serialize};

use crate::errors::{AuthError, CommentError, ReaderError, TaxonomyError};
use crate::models::{
    Comment, FeedKey, ReaderFeedSite, ReaderPost, RequestDataAction, Site, Taxonomy,
};

pub trait Payload {
    type Error;

    fn error(&self) -> Option<&Self::Error>;

    fn is_error(&self) -> bool {
        self.error().is_some()
    }
}

macro_rules! impl_payload {
    ($ty:ty, $err:ty) => {
        impl Payload for $ty {
            type Error = $err;

            fn error(&self) -> Option<&$err> {
                self.error.as_ref()
            }
        }
    };
}

// --- Comments ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchCommentPayload {
    pub site: Site,
    pub remote_comment_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCommentPayload {
    pub site: Site,
    pub comment: Comment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteLikeCommentPayload {
    pub site: Site,
    pub comment: Comment,
    pub like: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCreateCommentPayload {
    pub site: Site,
    pub parent: Comment,
    pub reply: Comment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCommentResponsePayload {
    pub site: Site,
    pub comment: Option<Comment>,
    pub error: Option<CommentError>,
}

impl RemoteCommentResponsePayload {
    pub fn success(site: Site, comment: Comment) -> Self {
        Self {
            site,
            comment: Some(comment),
            error: None,
        }
    }

    /// `comment` is the record the request was about, so the store can still
    /// name it in the change event.
    pub fn failure(site: Site, comment: Option<Comment>, error: CommentError) -> Self {
        Self {
            site,
            comment,
            error: Some(error),
        }
    }
}

impl_payload!(RemoteCommentResponsePayload, CommentError);

// --- Reader ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSitesPayload {
    pub term: String,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderSearchSitesResponsePayload {
    pub feeds: Vec<ReaderFeedSite>,
    pub term: String,
    pub offset: u32,
    pub can_load_more: bool,
    pub error: Option<ReaderError>,
}

impl_payload!(ReaderSearchSitesResponsePayload, ReaderError);

/// Controller-level request: "update this feed in this direction".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchPostsPayload {
    pub feed: FeedKey,
    pub action: RequestDataAction,
    pub allow_backfill: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PagePurpose {
    Newer { allow_backfill: bool },
    Older,
    /// `new_so_far` accumulates unseen posts across the backfill chain.
    Backfill { new_so_far: u32 },
}

/// One page actually requested from the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostsPageRequest {
    pub feed: FeedKey,
    pub offset: u32,
    pub number: u32,
    pub purpose: PagePurpose,
}

impl PostsPageRequest {
    pub fn action(&self) -> RequestDataAction {
        match self.purpose {
            PagePurpose::Older => RequestDataAction::LoadOlder,
            _ => RequestDataAction::LoadNewer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPostsPayload {
    pub request: PostsPageRequest,
    pub posts: Vec<ReaderPost>,
    /// 服务端返回的条数，含解析时丢弃的文章
    pub page_len: u32,
    pub error: Option<ReaderError>,
}

impl_payload!(FetchedPostsPayload, ReaderError);

// --- Account ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMagicLinkPayload {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicLinkResponsePayload {
    pub email: String,
    pub error: Option<AuthError>,
}

impl_payload!(MagicLinkResponsePayload, AuthError);

// --- Taxonomy ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchTaxonomiesPayload {
    pub site: Site,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedTaxonomiesPayload {
    pub site: Site,
    pub taxonomies: Vec<Taxonomy>,
    pub error: Option<TaxonomyError>,
}

impl_payload!(FetchedTaxonomiesPayload, TaxonomyError);
