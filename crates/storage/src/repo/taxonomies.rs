use crate::{
    models::SqlTaxonomy,
    record::{select_sql, SqliteQuery},
    Db, Record,
};
use domain::Taxonomy;

impl Record for Taxonomy {
    const TABLE: &'static str = "taxonomies";
    const COLUMNS: &'static [&'static str] = &[
        "local_site_id",
        "name",
        "label",
        "description",
        "is_hierarchical",
        "is_public",
    ];

    type Row = SqlTaxonomy;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.local_site_id)
            .bind(&self.name)
            .bind(&self.label)
            .bind(&self.description)
            .bind(self.is_hierarchical)
            .bind(self.is_public)
    }
}

impl Db {
    pub async fn get_taxonomies_for_site(&self, local_site_id: i64) -> anyhow::Result<Vec<Taxonomy>> {
        let sql = select_sql::<Taxonomy>("local_site_id = ? ORDER BY name");
        let rows = sqlx::query_as::<_, SqlTaxonomy>(&sql)
            .bind(local_site_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_taxonomy_by_name(
        &self,
        local_site_id: i64,
        name: &str,
    ) -> anyhow::Result<Option<Taxonomy>> {
        let sql = select_sql::<Taxonomy>("local_site_id = ? AND name = ?");
        let row = sqlx::query_as::<_, SqlTaxonomy>(&sql)
            .bind(local_site_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn upsert_taxonomy(&self, taxonomy: &mut Taxonomy) -> anyhow::Result<u64> {
        if taxonomy.id <= 0 {
            if let Some(existing) = self
                .get_taxonomy_by_name(taxonomy.local_site_id, &taxonomy.name)
                .await?
            {
                taxonomy.id = existing.id;
            }
        }
        self.insert_or_update(Some(taxonomy)).await
    }
}
