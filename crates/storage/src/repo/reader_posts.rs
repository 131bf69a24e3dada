use crate::{
    models::SqlReaderPost,
    record::{select_sql, SqliteQuery},
    Db, Record,
};
use domain::{FeedKey, ReaderPost};

impl Record for ReaderPost {
    const TABLE: &'static str = "reader_posts";
    const COLUMNS: &'static [&'static str] = &[
        "feed_key",
        "blog_id",
        "post_id",
        "title",
        "excerpt",
        "author_name",
        "url",
        "date_published",
    ];

    type Row = SqlReaderPost;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.feed.to_string())
            .bind(self.blog_id)
            .bind(self.post_id)
            .bind(&self.title)
            .bind(&self.excerpt)
            .bind(&self.author_name)
            .bind(&self.url)
            .bind(self.date_published)
    }
}

impl Db {
    pub async fn count_posts_in_feed(&self, feed: &FeedKey) -> anyhow::Result<u32> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reader_posts WHERE feed_key = ?")
            .bind(feed.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// Newest first.
    pub async fn get_posts_in_feed(
        &self,
        feed: &FeedKey,
        limit: u32,
    ) -> anyhow::Result<Vec<ReaderPost>> {
        let sql = format!(
            "{} ORDER BY date_published DESC, id DESC LIMIT ?",
            select_sql::<ReaderPost>("feed_key = ?")
        );
        let rows = sqlx::query_as::<_, SqlReaderPost>(&sql)
            .bind(feed.to_string())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_reader_post(
        &self,
        feed: &FeedKey,
        blog_id: i64,
        post_id: i64,
    ) -> anyhow::Result<Option<ReaderPost>> {
        let sql = select_sql::<ReaderPost>("feed_key = ? AND blog_id = ? AND post_id = ?");
        let row = sqlx::query_as::<_, SqlReaderPost>(&sql)
            .bind(feed.to_string())
            .bind(blog_id)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Upserts by `(feed, blog_id, post_id)`. Returns `true` when the post was
    /// not in the feed before.
    pub async fn upsert_reader_post(&self, post: &mut ReaderPost) -> anyhow::Result<bool> {
        let existing = self
            .find_reader_post(&post.feed, post.blog_id, post.post_id)
            .await?;
        let is_new = existing.is_none();
        post.id = existing.map(|p| p.id).unwrap_or(0);
        self.insert_or_update(Some(post)).await?;
        Ok(is_new)
    }

    /// Keeps the `max` newest posts of `feed`, returns how many were removed.
    pub async fn trim_feed(&self, feed: &FeedKey, max: u32) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "DELETE FROM reader_posts WHERE feed_key = ?1 AND id NOT IN (
                SELECT id FROM reader_posts WHERE feed_key = ?1
                ORDER BY date_published DESC, id DESC LIMIT ?2
            )",
        )
        .bind(feed.to_string())
        .bind(i64::from(max))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
