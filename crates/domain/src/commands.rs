use crate::models::{MediaUpload, PostUpload};
use crate::payloads::{
    FetchCommentPayload, FetchPostsPayload, FetchTaxonomiesPayload, FetchedPostsPayload,
    FetchedTaxonomiesPayload, MagicLinkResponsePayload, PostsPageRequest,
    ReaderSearchSitesResponsePayload, RemoteCommentPayload, RemoteCommentResponsePayload,
    RemoteCreateCommentPayload, RemoteLikeCommentPayload, SearchSitesPayload,
    SendMagicLinkPayload,
};

/// Routing key: the dispatcher hands an action to every store registered for its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    Comment,
    Reader,
    Account,
    Taxonomy,
    Upload,
}

#[derive(Debug, Clone)]
pub enum Action {
    Comment(CommentAction),
    Reader(ReaderAction),
    Account(AccountAction),
    Taxonomy(TaxonomyAction),
    Upload(UploadAction),
}

impl Action {
    pub fn action_type(&self) -> ActionType {
        match self {
            Action::Comment(_) => ActionType::Comment,
            Action::Reader(_) => ActionType::Reader,
            Action::Account(_) => ActionType::Account,
            Action::Taxonomy(_) => ActionType::Taxonomy,
            Action::Upload(_) => ActionType::Upload,
        }
    }
}

// 请求 / 响应成对出现: 响应变体即"带着原始动作标签"的结果
#[derive(Debug, Clone)]
pub enum CommentAction {
    FetchComment(FetchCommentPayload),
    FetchedComment(RemoteCommentResponsePayload),
    PushComment(RemoteCommentPayload),
    PushedComment(RemoteCommentResponsePayload),
    DeleteComment(RemoteCommentPayload),
    DeletedComment(RemoteCommentResponsePayload),
    LikeComment(RemoteLikeCommentPayload),
    LikedComment(RemoteCommentResponsePayload),
    CreateNewComment(RemoteCreateCommentPayload),
    CreatedNewComment(RemoteCommentResponsePayload),
}

#[derive(Debug, Clone)]
pub enum ReaderAction {
    SearchSites(SearchSitesPayload),
    SearchedSites(ReaderSearchSitesResponsePayload),
    FetchPosts(FetchPostsPayload),
    /// Follow-up page inside a backfill chain.
    FetchPostsPage(PostsPageRequest),
    FetchedPosts(FetchedPostsPayload),
}

#[derive(Debug, Clone)]
pub enum AccountAction {
    SendMagicLink(SendMagicLinkPayload),
    SentMagicLink(MagicLinkResponsePayload),
}

#[derive(Debug, Clone)]
pub enum TaxonomyAction {
    FetchTaxonomies(FetchTaxonomiesPayload),
    FetchedTaxonomies(FetchedTaxonomiesPayload),
}

#[derive(Debug, Clone)]
pub enum UploadAction {
    UpdateMediaUpload(MediaUpload),
    UpdatePostUpload(PostUpload),
}

impl From<CommentAction> for Action {
    fn from(a: CommentAction) -> Self {
        Action::Comment(a)
    }
}

impl From<ReaderAction> for Action {
    fn from(a: ReaderAction) -> Self {
        Action::Reader(a)
    }
}

impl From<AccountAction> for Action {
    fn from(a: AccountAction) -> Self {
        Action::Account(a)
    }
}

impl From<TaxonomyAction> for Action {
    fn from(a: TaxonomyAction) -> Self {
        Action::Taxonomy(a)
    }
}

impl From<UploadAction> for Action {
    fn from(a: UploadAction) -> Self {
        Action::Upload(a)
    }
}
