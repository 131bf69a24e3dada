use crate::{
    models::SqlComment,
    record::{select_sql, SqliteQuery},
    Db, Record,
};
use domain::{Comment, CommentStatus};

impl Record for Comment {
    const TABLE: &'static str = "comments";
    const COLUMNS: &'static [&'static str] = &[
        "remote_comment_id",
        "remote_post_id",
        "remote_parent_comment_id",
        "local_site_id",
        "remote_site_id",
        "author_name",
        "author_email",
        "author_url",
        "author_profile_image_url",
        "content",
        "date_published",
        "status",
        "like_count",
        "i_like",
        "post_title",
        "url",
    ];

    type Row = SqlComment;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.remote_comment_id)
            .bind(self.remote_post_id)
            .bind(self.remote_parent_comment_id)
            .bind(self.local_site_id)
            .bind(self.remote_site_id)
            .bind(&self.author_name)
            .bind(&self.author_email)
            .bind(&self.author_url)
            .bind(&self.author_profile_image_url)
            .bind(&self.content)
            .bind(self.date_published)
            // 过渡状态 (unspam/untrash) 永远不落库
            .bind(self.status.persisted().as_str())
            .bind(self.like_count)
            .bind(self.i_like)
            .bind(&self.post_title)
            .bind(&self.url)
    }
}

impl Db {
    pub async fn get_comment_by_local_id(&self, id: i64) -> anyhow::Result<Option<Comment>> {
        self.get_by_id::<Comment>(id).await
    }

    pub async fn get_comment_by_remote_id(
        &self,
        local_site_id: i64,
        remote_comment_id: i64,
    ) -> anyhow::Result<Option<Comment>> {
        let sql = select_sql::<Comment>("local_site_id = ? AND remote_comment_id = ?");
        let row = sqlx::query_as::<_, SqlComment>(&sql)
            .bind(local_site_id)
            .bind(remote_comment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Reconciles a comment coming back from the service with the local
    /// cache: an unsaved comment adopts the local id of the row holding the
    /// same remote comment, then the usual upsert by local id applies.
    pub async fn upsert_comment(&self, comment: &mut Comment) -> anyhow::Result<u64> {
        if comment.id <= 0 && comment.remote_comment_id > 0 {
            if let Some(existing) = self
                .get_comment_by_remote_id(comment.local_site_id, comment.remote_comment_id)
                .await?
            {
                comment.id = existing.id;
            }
        }
        self.insert_or_update(Some(comment)).await
    }

    pub async fn remove_comment(&self, id: i64) -> anyhow::Result<u64> {
        self.delete_by_id::<Comment>(id).await
    }

    pub async fn list_comments_for_site(
        &self,
        local_site_id: i64,
        status: Option<CommentStatus>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Comment>> {
        let rows = match status {
            Some(status) => {
                let sql = format!(
                    "{} ORDER BY date_published DESC LIMIT ? OFFSET ?",
                    select_sql::<Comment>("local_site_id = ? AND status = ?")
                );
                sqlx::query_as::<_, SqlComment>(&sql)
                    .bind(local_site_id)
                    .bind(status.persisted().as_str())
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "{} ORDER BY date_published DESC LIMIT ? OFFSET ?",
                    select_sql::<Comment>("local_site_id = ?")
                );
                sqlx::query_as::<_, SqlComment>(&sql)
                    .bind(local_site_id)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
