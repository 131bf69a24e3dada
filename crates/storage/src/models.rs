use chrono::NaiveDateTime;
use domain::{
    Comment, CommentStatus, FeedKey, MediaUpload, MediaUploadState, PostUpload, PostUploadState,
    ReaderPost, Site, SiteOrigin, Taxonomy,
};
use sqlx::FromRow;
use tracing::warn;

#[derive(FromRow)]
pub struct SqlSite {
    pub id: i64,
    pub site_id: i64,
    pub name: String,
    pub url: String,
    pub origin: String,
    pub has_capability_edit_others_posts: bool,
    pub is_self_hosted_admin: bool,
}

impl From<SqlSite> for Site {
    fn from(sql: SqlSite) -> Self {
        let origin = sql.origin.parse().unwrap_or_else(|e| {
            warn!("Site {} has {}; treating as placeholder", sql.id, e);
            SiteOrigin::Placeholder
        });
        Site {
            id: sql.id,
            site_id: sql.site_id,
            name: sql.name,
            url: sql.url,
            origin,
            has_capability_edit_others_posts: sql.has_capability_edit_others_posts,
            is_self_hosted_admin: sql.is_self_hosted_admin,
        }
    }
}

#[derive(FromRow)]
pub struct SqlComment {
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
    pub status: String,
    pub like_count: i64,
    pub i_like: bool,
    pub post_title: Option<String>,
    pub url: Option<String>,
}

impl From<SqlComment> for Comment {
    fn from(sql: SqlComment) -> Self {
        let status = sql.status.parse().unwrap_or_else(|e| {
            warn!("Comment {}: {}; falling back to unapproved", sql.id, e);
            CommentStatus::Unapproved
        });
        Comment {
            id: sql.id,
            remote_comment_id: sql.remote_comment_id,
            remote_post_id: sql.remote_post_id,
            remote_parent_comment_id: sql.remote_parent_comment_id,
            local_site_id: sql.local_site_id,
            remote_site_id: sql.remote_site_id,
            author_name: sql.author_name,
            author_email: sql.author_email,
            author_url: sql.author_url,
            author_profile_image_url: sql.author_profile_image_url,
            content: sql.content,
            date_published: sql.date_published,
            status,
            like_count: sql.like_count,
            i_like: sql.i_like,
            post_title: sql.post_title,
            url: sql.url,
        }
    }
}

#[derive(FromRow)]
pub struct SqlTaxonomy {
    pub id: i64,
    pub local_site_id: i64,
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub is_hierarchical: bool,
    pub is_public: bool,
}

impl From<SqlTaxonomy> for Taxonomy {
    fn from(sql: SqlTaxonomy) -> Self {
        Taxonomy {
            id: sql.id,
            local_site_id: sql.local_site_id,
            name: sql.name,
            label: sql.label,
            description: sql.description,
            is_hierarchical: sql.is_hierarchical,
            is_public: sql.is_public,
        }
    }
}

#[derive(FromRow)]
pub struct SqlMediaUpload {
    pub id: i64,
    pub local_post_id: i64,
    pub upload_state: String,
    pub progress: f32,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl From<SqlMediaUpload> for MediaUpload {
    fn from(sql: SqlMediaUpload) -> Self {
        let upload_state = sql.upload_state.parse().unwrap_or_else(|e| {
            warn!("Media upload {}: {}", sql.id, e);
            MediaUploadState::Failed
        });
        MediaUpload {
            id: sql.id,
            local_post_id: sql.local_post_id,
            upload_state,
            progress: sql.progress,
            error_type: sql.error_type,
            error_message: sql.error_message,
        }
    }
}

#[derive(FromRow)]
pub struct SqlPostUpload {
    pub id: i64,
    pub upload_state: String,
    // 逗号分隔的本地媒体 id
    pub associated_media_ids: String,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl From<SqlPostUpload> for PostUpload {
    fn from(sql: SqlPostUpload) -> Self {
        let upload_state = sql.upload_state.parse().unwrap_or_else(|e| {
            warn!("Post upload {}: {}", sql.id, e);
            PostUploadState::Failed
        });
        PostUpload {
            id: sql.id,
            upload_state,
            associated_media_ids: sql
                .associated_media_ids
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect(),
            error_type: sql.error_type,
            error_message: sql.error_message,
        }
    }
}

#[derive(FromRow)]
pub struct SqlReaderPost {
    pub id: i64,
    pub feed_key: String,
    pub blog_id: i64,
    pub post_id: i64,
    pub title: String,
    pub excerpt: String,
    pub author_name: String,
    pub url: String,
    pub date_published: NaiveDateTime,
}

impl From<SqlReaderPost> for ReaderPost {
    fn from(sql: SqlReaderPost) -> Self {
        // feed_key 只由本 crate 写入，解析失败说明数据被外部改动过
        let feed = sql.feed_key.parse().unwrap_or_else(|e| {
            warn!("Reader post {}: {}", sql.id, e);
            FeedKey::Tag(sql.feed_key.clone())
        });
        ReaderPost {
            id: sql.id,
            feed,
            blog_id: sql.blog_id,
            post_id: sql.post_id,
            title: sql.title,
            excerpt: sql.excerpt,
            author_name: sql.author_name,
            url: sql.url,
            date_published: sql.date_published,
        }
    }
}
