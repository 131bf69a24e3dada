mod capability;
mod commands;
mod errors;
mod events;
mod models;
pub mod moderation;
pub mod payloads;
pub mod protocol;

pub use capability::{Capability, CapabilitySet};
pub use commands::{
    AccountAction, Action, ActionType, CommentAction, ReaderAction, TaxonomyAction, UploadAction,
};
pub use errors::{
    AuthError, AuthErrorType, BaseNetworkError, CommentError, CommentErrorType, GenericErrorType,
    ReaderError, ReaderErrorType, TaxonomyError, TaxonomyErrorType,
};
pub use events::{
    CommentChangeCause, OnCommentChanged, OnMagicLinkSent, OnReaderPostsBackfilled,
    OnReaderPostsUpdated, OnReaderSitesSearched, OnTaxonomyChanged, OnUploadChanged, UpdateResult,
    UploadKind,
};
pub use models::{
    Comment, CommentStatus, FeedKey, MediaUpload, MediaUploadState, PostListType, PostUpload,
    PostUploadState, ReaderFeedSite, ReaderPost, RequestDataAction, Site, SiteOrigin, Taxonomy,
    UnknownStatus,
};
