use sqlx::{
    query::Query,
    sqlite::{SqliteArguments, SqliteRow},
    FromRow, Sqlite,
};

use crate::Db;

pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// A model stored in its own table, keyed by an integer `id` column.
///
/// `COLUMNS` lists every column except `id`, in the order `bind_columns` binds
/// them. `Row` is the `FromRow` mirror of the table (selected as `id` followed
/// by `COLUMNS`).
pub trait Record: Send + Sync + Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    type Row: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + Into<Self>;

    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;
}

pub(crate) fn select_sql<T: Record>(where_clause: &str) -> String {
    format!(
        "SELECT id, {} FROM {} WHERE {}",
        T::COLUMNS.join(", "),
        T::TABLE,
        where_clause
    )
}

impl Db {
    /// Inserts `record` if no row has its id, otherwise overwrites every
    /// column but `id` on the existing row. Returns the affected row count;
    /// `None` is a no-op returning 0.
    ///
    /// A non-positive id means "not stored yet": the database assigns one and
    /// it is written back into `record`.
    pub async fn insert_or_update<T: Record>(&self, record: Option<&mut T>) -> anyhow::Result<u64> {
        let Some(record) = record else {
            return Ok(0);
        };

        let existing = if record.id() > 0 {
            self.get_by_id::<T>(record.id()).await?
        } else {
            None
        };

        match existing {
            None => {
                let id = self.insert(&*record).await?;
                record.set_id(id);
                Ok(1)
            }
            Some(old) => self.update_by_id(old.id(), &*record).await,
        }
    }

    pub async fn get_by_id<T: Record>(&self, id: i64) -> anyhow::Result<Option<T>> {
        let sql = select_sql::<T>("id = ?");
        let row = sqlx::query_as::<_, T::Row>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    pub async fn delete_by_id<T: Record>(&self, id: i64) -> anyhow::Result<u64> {
        let sql = format!("DELETE FROM {} WHERE id = ?", T::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn insert<T: Record>(&self, record: &T) -> anyhow::Result<i64> {
        let explicit_id = record.id() > 0;
        let mut columns: Vec<&str> = Vec::with_capacity(T::COLUMNS.len() + 1);
        if explicit_id {
            columns.push("id");
        }
        columns.extend_from_slice(T::COLUMNS);
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::TABLE,
            columns.join(", "),
            placeholders
        );

        let mut query = sqlx::query(&sql);
        if explicit_id {
            query = query.bind(record.id());
        }
        let result = record.bind_columns(query).execute(&self.pool).await?;

        Ok(if explicit_id {
            record.id()
        } else {
            result.last_insert_rowid()
        })
    }

    async fn update_by_id<T: Record>(&self, id: i64, record: &T) -> anyhow::Result<u64> {
        let assignments = T::COLUMNS
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {} SET {} WHERE id = ?", T::TABLE, assignments);

        let result = record
            .bind_columns(sqlx::query(&sql))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
