use crate::models::{
    Comment, CommentStatus, FeedKey, ReaderFeedSite, ReaderPost, Site, Taxonomy,
};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `{"error": "unknown_comment", "message": "Unknown comment"}`
#[derive(Deserialize, Debug, Default)]
pub struct ErrorEnvelope {
    pub error: Option<String>,
    pub message: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CommentPostRef {
    #[serde(rename = "ID")]
    pub id: i64,
    pub title: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CommentAuthor {
    pub name: Option<String>,
    // WP.com 在无权限时返回 false 而不是字符串
    pub email: Option<Value>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
    #[serde(rename = "avatar_URL")]
    pub avatar_url: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CommentWpComRestResponse {
    #[serde(rename = "ID")]
    pub id: i64,
    pub post: Option<CommentPostRef>,
    pub author: Option<CommentAuthor>,
    pub date: Option<String>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
    #[serde(default)]
    pub content: String,
    pub status: Option<String>,
    /// `false` or `{"ID": ..}`
    pub parent: Option<Value>,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub i_like: bool,
}

#[derive(Deserialize, Debug)]
pub struct CommentLikeWpComRestResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub i_like: bool,
    #[serde(default)]
    pub like_count: i64,
}

#[derive(Deserialize, Debug)]
pub struct ReaderSearchSitesResponse {
    #[serde(default)]
    pub feeds: Vec<ReaderFeedResponse>,
}

#[derive(Deserialize, Debug)]
pub struct ReaderFeedResponse {
    #[serde(rename = "feed_ID", default, deserialize_with = "lenient_i64")]
    pub feed_id: i64,
    #[serde(rename = "blog_ID", default, deserialize_with = "lenient_i64")]
    pub blog_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub subscribers_count: i64,
}

#[derive(Deserialize, Debug)]
pub struct ReaderPostListResponse {
    #[serde(default)]
    pub posts: Vec<ReaderPostResponse>,
}

#[derive(Deserialize, Debug)]
pub struct ReaderPostAuthor {
    pub name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ReaderPostResponse {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "site_ID", default)]
    pub site_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub author: Option<ReaderPostAuthor>,
    #[serde(rename = "URL", default)]
    pub url: String,
    pub date: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct TaxonomiesResponse {
    #[serde(default)]
    pub taxonomies: Vec<TaxonomyResponse>,
}

#[derive(Deserialize, Debug)]
pub struct TaxonomyResponse {
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub hierarchical: bool,
    #[serde(default)]
    pub public: bool,
}

#[derive(Serialize, Debug)]
pub struct MagicLinkRequest<'a> {
    pub email: &'a str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64().unwrap_or_default(),
        Value::String(s) => s.parse().unwrap_or_default(),
        _ => 0,
    })
}

/// WP.com dates look like `2019-05-01T10:00:00+00:00`; stored as naive UTC.
pub fn parse_wpcom_date(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

pub fn comment_from_response(resp: CommentWpComRestResponse, site: &Site) -> Comment {
    let (author_name, author_email, author_url, author_profile_image_url) = match resp.author {
        Some(a) => (
            a.name.unwrap_or_default(),
            a.email.and_then(|e| e.as_str().map(str::to_string)),
            a.url.filter(|u| !u.is_empty()),
            a.avatar_url.filter(|u| !u.is_empty()),
        ),
        None => (String::new(), None, None, None),
    };

    let remote_parent_comment_id = resp
        .parent
        .as_ref()
        .and_then(|p| p.get("ID"))
        .and_then(Value::as_i64)
        .unwrap_or(0);

    let status = resp
        .status
        .as_deref()
        .and_then(|s| s.parse::<CommentStatus>().ok())
        .unwrap_or(CommentStatus::Unapproved);

    let (remote_post_id, post_title) = match resp.post {
        Some(p) => (p.id, p.title),
        None => (0, None),
    };

    Comment {
        id: 0,
        remote_comment_id: resp.id,
        remote_post_id,
        remote_parent_comment_id,
        local_site_id: site.id,
        remote_site_id: site.site_id,
        author_name,
        author_email,
        author_url,
        author_profile_image_url,
        content: resp.content,
        date_published: resp.date.as_deref().and_then(parse_wpcom_date),
        status,
        like_count: resp.like_count,
        i_like: resp.i_like,
        post_title,
        url: resp.url,
    }
}

pub fn build_push_comment_body(comment: &Comment) -> Value {
    serde_json::json!({
        "content": comment.content,
        "status": comment.status.persisted().as_str(),
    })
}

pub fn feed_site_from_response(resp: ReaderFeedResponse) -> ReaderFeedSite {
    ReaderFeedSite {
        feed_id: resp.feed_id,
        blog_id: resp.blog_id,
        name: resp.name,
        url: resp.url,
        subscriber_count: resp.subscribers_count,
    }
}

/// Posts without a parseable date are dropped: ordering depends on it.
pub fn reader_post_from_response(resp: ReaderPostResponse, feed: &FeedKey) -> Option<ReaderPost> {
    let date_published = resp.date.as_deref().and_then(parse_wpcom_date)?;
    Some(ReaderPost {
        id: 0,
        feed: feed.clone(),
        blog_id: resp.site_id,
        post_id: resp.id,
        title: resp.title,
        excerpt: resp.excerpt,
        author_name: resp.author.and_then(|a| a.name).unwrap_or_default(),
        url: resp.url,
        date_published,
    })
}

pub fn taxonomy_from_response(resp: TaxonomyResponse, site: &Site) -> Taxonomy {
    Taxonomy {
        id: 0,
        local_site_id: site.id,
        name: resp.name,
        label: resp.label,
        description: resp.description.filter(|d| !d.is_empty()),
        is_hierarchical: resp.hierarchical,
        is_public: resp.public,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Site {
        let mut s = Site::placeholder(1000);
        s.id = 3;
        s
    }

    #[test]
    fn maps_comment_with_false_email_and_parent() {
        let raw = serde_json::json!({
            "ID": 55,
            "post": { "ID": 9, "title": "Hello" },
            "author": { "name": "Ana", "email": false, "URL": "", "avatar_URL": "https://a/b.png" },
            "date": "2019-05-01T10:00:00+02:00",
            "content": "<p>hi</p>",
            "status": "unapproved",
            "parent": { "ID": 12, "type": "comment" },
            "like_count": 2,
            "i_like": true
        });
        let resp: CommentWpComRestResponse = serde_json::from_value(raw).unwrap();
        let c = comment_from_response(resp, &site());

        assert_eq!(c.remote_comment_id, 55);
        assert_eq!(c.remote_post_id, 9);
        assert_eq!(c.remote_parent_comment_id, 12);
        assert_eq!(c.local_site_id, 3);
        assert_eq!(c.remote_site_id, 1000);
        assert_eq!(c.author_email, None);
        assert_eq!(c.author_url, None);
        assert_eq!(c.status, CommentStatus::Unapproved);
        assert_eq!(c.post_title.as_deref(), Some("Hello"));
        assert_eq!(
            c.date_published.unwrap().to_string(),
            "2019-05-01 08:00:00"
        );
        assert!(c.i_like);
    }

    #[test]
    fn top_level_comment_has_no_parent() {
        let raw = serde_json::json!({ "ID": 1, "parent": false, "status": "approved" });
        let resp: CommentWpComRestResponse = serde_json::from_value(raw).unwrap();
        let c = comment_from_response(resp, &site());
        assert_eq!(c.remote_parent_comment_id, 0);
        assert_eq!(c.status, CommentStatus::Approved);
    }

    #[test]
    fn push_body_never_sends_transitional_status() {
        let mut c = Comment::reply_draft("x");
        c.status = CommentStatus::Untrash;
        let body = build_push_comment_body(&c);
        assert_eq!(body["status"], "approved");
    }

    #[test]
    fn feed_ids_may_be_strings() {
        let raw = serde_json::json!({ "feeds": [
            { "feed_ID": "123", "blog_ID": 7, "name": "n", "URL": "u", "subscribers_count": "40" }
        ]});
        let resp: ReaderSearchSitesResponse = serde_json::from_value(raw).unwrap();
        let site = feed_site_from_response(resp.feeds.into_iter().next().unwrap());
        assert_eq!(site.feed_id, 123);
        assert_eq!(site.subscriber_count, 40);
    }

    #[test]
    fn undated_posts_are_dropped() {
        let feed = FeedKey::Tag("rust".into());
        let raw = serde_json::json!({ "ID": 1, "site_ID": 2, "title": "t" });
        let resp: ReaderPostResponse = serde_json::from_value(raw).unwrap();
        assert!(reader_post_from_response(resp, &feed).is_none());
    }
}
