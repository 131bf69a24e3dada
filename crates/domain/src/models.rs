use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteOrigin {
    WpComRest,
    XmlRpc,
    /// 本地合成的占位站点 (通知里引用了尚未同步的站点)
    Placeholder,
}

impl SiteOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteOrigin::WpComRest => "wpcom_rest",
            SiteOrigin::XmlRpc => "xmlrpc",
            SiteOrigin::Placeholder => "placeholder",
        }
    }
}

impl FromStr for SiteOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wpcom_rest" => Ok(SiteOrigin::WpComRest),
            "xmlrpc" => Ok(SiteOrigin::XmlRpc),
            "placeholder" => Ok(SiteOrigin::Placeholder),
            other => Err(format!("Unknown site origin: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: i64,
    pub site_id: i64,
    pub name: String,
    pub url: String,
    pub origin: SiteOrigin,
    pub has_capability_edit_others_posts: bool,
    pub is_self_hosted_admin: bool,
}

impl Site {
    pub fn placeholder(remote_site_id: i64) -> Self {
        Self {
            id: 0,
            site_id: remote_site_id,
            name: String::new(),
            url: String::new(),
            origin: SiteOrigin::Placeholder,
            has_capability_edit_others_posts: false,
            is_self_hosted_admin: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.origin == SiteOrigin::Placeholder
    }

    // 占位站点只可能来自 WP.com 通知，所以同样走 REST
    pub fn is_accessed_via_wpcom_rest(&self) -> bool {
        matches!(self.origin, SiteOrigin::WpComRest | SiteOrigin::Placeholder)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Approved,
    Unapproved,
    Spam,
    Trash,
    Deleted,
    /// Only used to label a spam -> approved transition, never stored.
    Unspam,
    /// Only used to label a trash -> approved transition, never stored.
    Untrash,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown comment status: {0}")]
pub struct UnknownStatus(pub String);

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Approved => "approved",
            CommentStatus::Unapproved => "unapproved",
            CommentStatus::Spam => "spam",
            CommentStatus::Trash => "trash",
            CommentStatus::Deleted => "deleted",
            CommentStatus::Unspam => "unspam",
            CommentStatus::Untrash => "untrash",
        }
    }

    pub fn is_transitional(&self) -> bool {
        matches!(self, CommentStatus::Unspam | CommentStatus::Untrash)
    }

    /// The status that actually gets stored for this intent.
    pub fn persisted(self) -> Self {
        if self.is_transitional() {
            CommentStatus::Approved
        } else {
            self
        }
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CommentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" | "approve" => Ok(CommentStatus::Approved),
            "unapproved" | "hold" => Ok(CommentStatus::Unapproved),
            "spam" => Ok(CommentStatus::Spam),
            "trash" => Ok(CommentStatus::Trash),
            "deleted" => Ok(CommentStatus::Deleted),
            "unspam" => Ok(CommentStatus::Unspam),
            "untrash" => Ok(CommentStatus::Untrash),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub remote_comment_id: i64,
    pub remote_post_id: i64,
    pub remote_parent_comment_id: i64,
    pub local_site_id: i64,
    pub remote_site_id: i64,
    pub author_name: String,
    pub author_email: Option<String>,
    pub author_url: Option<String>,
    pub author_profile_image_url: Option<String>,
    pub content: String,
    pub date_published: Option<NaiveDateTime>,
    pub status: CommentStatus,
    pub like_count: i64,
    pub i_like: bool,
    pub post_title: Option<String>,
    pub url: Option<String>,
}

impl Comment {
    /// 本地构造的回复草稿，只有正文，其余字段由服务端回填
    pub fn reply_draft(content: impl Into<String>) -> Self {
        Self {
            id: 0,
            remote_comment_id: 0,
            remote_post_id: 0,
            remote_parent_comment_id: 0,
            local_site_id: 0,
            remote_site_id: 0,
            author_name: String::new(),
            author_email: None,
            author_url: None,
            author_profile_image_url: None,
            content: content.into(),
            date_published: None,
            status: CommentStatus::Unapproved,
            like_count: 0,
            i_like: false,
            post_title: None,
            url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub id: i64,
    pub local_site_id: i64,
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub is_hierarchical: bool,
    pub is_public: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaUploadState {
    Uploading,
    Completed,
    Failed,
}

impl MediaUploadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaUploadState::Uploading => "uploading",
            MediaUploadState::Completed => "completed",
            MediaUploadState::Failed => "failed",
        }
    }
}

impl FromStr for MediaUploadState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploading" => Ok(MediaUploadState::Uploading),
            "completed" => Ok(MediaUploadState::Completed),
            "failed" => Ok(MediaUploadState::Failed),
            other => Err(format!("Unknown media upload state: {}", other)),
        }
    }
}

/// Tracks the upload of one local media item. `id` is the local media id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaUpload {
    pub id: i64,
    pub local_post_id: i64,
    pub upload_state: MediaUploadState,
    pub progress: f32,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl MediaUpload {
    pub fn new(local_media_id: i64, local_post_id: i64) -> Self {
        Self {
            id: local_media_id,
            local_post_id,
            upload_state: MediaUploadState::Uploading,
            progress: 0.0,
            error_type: None,
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostUploadState {
    Pending,
    Failed,
    Cancelled,
}

impl PostUploadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostUploadState::Pending => "pending",
            PostUploadState::Failed => "failed",
            PostUploadState::Cancelled => "cancelled",
        }
    }
}

impl FromStr for PostUploadState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PostUploadState::Pending),
            "failed" => Ok(PostUploadState::Failed),
            "cancelled" => Ok(PostUploadState::Cancelled),
            other => Err(format!("Unknown post upload state: {}", other)),
        }
    }
}

/// Tracks the upload of one local post. `id` is the local post id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostUpload {
    pub id: i64,
    pub upload_state: PostUploadState,
    pub associated_media_ids: Vec<i64>,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl PostUpload {
    pub fn new(local_post_id: i64) -> Self {
        Self {
            id: local_post_id,
            upload_state: PostUploadState::Pending,
            associated_media_ids: Vec::new(),
            error_type: None,
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedKey {
    Tag(String),
    Blog(i64),
}

impl FeedKey {
    pub fn is_tag(&self) -> bool {
        matches!(self, FeedKey::Tag(_))
    }
}

// 存储用的字符串形式: "tag:<name>" / "blog:<id>"
impl fmt::Display for FeedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedKey::Tag(name) => write!(f, "tag:{}", name),
            FeedKey::Blog(id) => write!(f, "blog:{}", id),
        }
    }
}

impl FromStr for FeedKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("tag", name)) if !name.is_empty() => Ok(FeedKey::Tag(name.to_string())),
            Some(("blog", id)) => id
                .parse()
                .map(FeedKey::Blog)
                .map_err(|_| format!("Invalid blog feed key: {}", s)),
            _ => Err(format!("Invalid feed key: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestDataAction {
    LoadNewer,
    LoadOlder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostListType {
    TagFollowed,
    TagPreview,
    BlogPreview,
}

impl PostListType {
    pub fn is_preview(&self) -> bool {
        matches!(self, PostListType::TagPreview | PostListType::BlogPreview)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderPost {
    pub id: i64,
    pub feed: FeedKey,
    pub blog_id: i64,
    pub post_id: i64,
    pub title: String,
    pub excerpt: String,
    pub author_name: String,
    pub url: String,
    pub date_published: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderFeedSite {
    pub feed_id: i64,
    pub blog_id: i64,
    pub name: String,
    pub url: String,
    pub subscriber_count: i64,
}
