use std::fmt;

/// What the host should do after a controller call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Controller state changed; redraw from it.
    Render,
    Toast(Notice),
    CloseScreen,
    /// Ask before deleting for good; answer with `confirm_delete`.
    ConfirmDelete,
    ShowProgress(bool),
    SetReplyEnabled(bool),
    ClearReply,
    RefocusReply,
    RefreshCommentList,
    ShowRefreshing(bool),
    ShowLoadingOlder(bool),
    ShowNewPostsBar,
    HideNewPostsBar,
    RefreshPosts,
    ScrollToTop,
    ShowLinkSent,
    /// Login link could not be sent; offer password entry instead.
    FallBackToPassword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NoConnection,
    CommentNotFound,
    SiteNotFound,
    ModerationFailed,
    ReplySucceeded,
    ReplyFailed(String),
    LoginLinkFailed(String),
    SearchFailed(String),
    Error(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoConnection => write!(f, "No network connection"),
            Notice::CommentNotFound => write!(f, "Comment could not be found"),
            Notice::SiteNotFound => write!(f, "Site could not be found"),
            Notice::ModerationFailed => write!(f, "Error moderating comment"),
            Notice::ReplySucceeded => write!(f, "Reply published"),
            Notice::ReplyFailed(msg)
            | Notice::LoginLinkFailed(msg)
            | Notice::SearchFailed(msg)
            | Notice::Error(msg) => write!(f, "{msg}"),
        }
    }
}
