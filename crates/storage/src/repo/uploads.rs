use crate::{
    models::{SqlMediaUpload, SqlPostUpload},
    record::{select_sql, SqliteQuery},
    Db, Record,
};
use domain::{MediaUpload, PostUpload};

impl Record for MediaUpload {
    const TABLE: &'static str = "media_uploads";
    const COLUMNS: &'static [&'static str] = &[
        "local_post_id",
        "upload_state",
        "progress",
        "error_type",
        "error_message",
    ];

    type Row = SqlMediaUpload;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.local_post_id)
            .bind(self.upload_state.as_str())
            .bind(self.progress)
            .bind(&self.error_type)
            .bind(&self.error_message)
    }
}

impl Record for PostUpload {
    const TABLE: &'static str = "post_uploads";
    const COLUMNS: &'static [&'static str] = &[
        "upload_state",
        "associated_media_ids",
        "error_type",
        "error_message",
    ];

    type Row = SqlPostUpload;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        let media_ids = self
            .associated_media_ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        query
            .bind(self.upload_state.as_str())
            .bind(media_ids)
            .bind(&self.error_type)
            .bind(&self.error_message)
    }
}

// 上传记录的 id 就是本地媒体 / 文章 id，由调用方给出
impl Db {
    pub async fn insert_or_update_media(&self, media: Option<&mut MediaUpload>) -> anyhow::Result<u64> {
        self.insert_or_update(media).await
    }

    pub async fn get_media_upload_for_local_id(
        &self,
        local_media_id: i64,
    ) -> anyhow::Result<Option<MediaUpload>> {
        self.get_by_id::<MediaUpload>(local_media_id).await
    }

    pub async fn get_media_uploads_for_post(
        &self,
        local_post_id: i64,
    ) -> anyhow::Result<Vec<MediaUpload>> {
        let sql = select_sql::<MediaUpload>("local_post_id = ? ORDER BY id");
        let rows = sqlx::query_as::<_, SqlMediaUpload>(&sql)
            .bind(local_post_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn insert_or_update_post(&self, post: Option<&mut PostUpload>) -> anyhow::Result<u64> {
        self.insert_or_update(post).await
    }

    pub async fn get_post_upload_for_local_id(
        &self,
        local_post_id: i64,
    ) -> anyhow::Result<Option<PostUpload>> {
        self.get_by_id::<PostUpload>(local_post_id).await
    }
}
