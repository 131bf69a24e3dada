use crate::{
    models::SqlSite,
    record::{select_sql, SqliteQuery},
    Db, Record,
};
use domain::Site;

impl Record for Site {
    const TABLE: &'static str = "sites";
    const COLUMNS: &'static [&'static str] = &[
        "site_id",
        "name",
        "url",
        "origin",
        "has_capability_edit_others_posts",
        "is_self_hosted_admin",
    ];

    type Row = SqlSite;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.site_id)
            .bind(&self.name)
            .bind(&self.url)
            .bind(self.origin.as_str())
            .bind(self.has_capability_edit_others_posts)
            .bind(self.is_self_hosted_admin)
    }
}

impl Db {
    pub async fn get_site_by_local_id(&self, id: i64) -> anyhow::Result<Option<Site>> {
        self.get_by_id::<Site>(id).await
    }

    pub async fn get_site_by_remote_id(&self, site_id: i64) -> anyhow::Result<Option<Site>> {
        let sql = select_sql::<Site>("site_id = ? ORDER BY id LIMIT 1");
        let row = sqlx::query_as::<_, SqlSite>(&sql)
            .bind(site_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn upsert_site(&self, site: &mut Site) -> anyhow::Result<u64> {
        if site.id <= 0 {
            if let Some(existing) = self.get_site_by_remote_id(site.site_id).await? {
                site.id = existing.id;
            }
        }
        self.insert_or_update(Some(site)).await
    }
}
