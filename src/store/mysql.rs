use async_trait::async_trait;
use serde_json::Value;
use sqlx::MySqlPool;
use sqlx::types::Json;
use tracing::debug;

use super::sql::{KeyColumn, bind_query, bind_query_as, body_of, build_where};
use super::{
    Collection, DeleteResult, Document, DocumentId, Filter, ID_FIELD, InsertOneResult,
    StoreError, UniqueIndex, UpdateResult, merge_set,
};

/// Unique keys live in stored generated columns so MySQL enforces them.
/// Column widths follow `MAX_EMAIL_LEN` and `MAX_DATE_LEN`.
///
/// Only JSON strings are mirrored, compared byte for byte (`0900_bin` is
/// also NO PAD, so trailing spaces count), matching the in-memory indexes.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS employees (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        body JSON NOT NULL,
        email VARCHAR(254) COLLATE utf8mb4_0900_bin AS (
            CASE WHEN JSON_TYPE(JSON_EXTRACT(body, '$.email')) = 'STRING'
                THEN JSON_UNQUOTE(JSON_EXTRACT(body, '$.email')) END
        ) STORED,
        UNIQUE KEY uq_employees_email (email)
    ) DEFAULT CHARSET = utf8mb4
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        body JSON NOT NULL,
        email VARCHAR(254) COLLATE utf8mb4_0900_bin AS (
            CASE WHEN JSON_TYPE(JSON_EXTRACT(body, '$.email')) = 'STRING'
                THEN JSON_UNQUOTE(JSON_EXTRACT(body, '$.email')) END
        ) STORED,
        att_date VARCHAR(64) COLLATE utf8mb4_0900_bin AS (
            CASE WHEN JSON_TYPE(JSON_EXTRACT(body, '$.date')) = 'STRING'
                THEN JSON_UNQUOTE(JSON_EXTRACT(body, '$.date')) END
        ) STORED,
        UNIQUE KEY uq_attendance_email_date (email, att_date),
        KEY ix_attendance_email (email)
    ) DEFAULT CHARSET = utf8mb4
    "#,
];

pub const EMPLOYEE_KEYS: &[KeyColumn] = &[KeyColumn {
    field: "email",
    column: "email",
}];

pub const ATTENDANCE_KEYS: &[KeyColumn] = &[
    KeyColumn {
        field: "email",
        column: "email",
    },
    KeyColumn {
        field: "date",
        column: "att_date",
    },
];

pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Collection stored as `(id, body JSON)` rows of one table.
pub struct MySqlCollection {
    pool: MySqlPool,
    table: &'static str,
    index: UniqueIndex,
    keys: &'static [KeyColumn],
}

type Row = (u64, Json<Value>);

impl MySqlCollection {
    pub fn new(
        pool: MySqlPool,
        table: &'static str,
        index: UniqueIndex,
        keys: &'static [KeyColumn],
    ) -> Self {
        Self {
            pool,
            table,
            index,
            keys,
        }
    }

    fn map_write_error(&self, e: sqlx::Error) -> StoreError {
        // Duplicate key on the generated key columns
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return StoreError::DuplicateKey {
                    collection: self.table.to_string(),
                    index: self.index.name.to_string(),
                };
            }
        }
        StoreError::Database(e)
    }
}

fn into_document((id, Json(body)): Row) -> Document {
    let mut doc = match body {
        Value::Object(map) => map,
        other => {
            let mut map = Document::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    doc.insert(ID_FIELD.to_string(), Value::from(id));
    doc
}

#[async_trait]
impl Collection for MySqlCollection {
    fn name(&self) -> &str {
        self.table
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let built = build_where(filter, self.keys)?;
        let sql = format!(
            "SELECT id, body FROM {} WHERE {} ORDER BY id",
            self.table, built.clause
        );
        debug!(sql = %sql, values = ?built.values, "find");

        let rows = bind_query_as(sqlx::query_as::<_, Row>(&sql), &built.values)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(into_document).collect())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let built = build_where(filter, self.keys)?;
        let sql = format!(
            "SELECT id, body FROM {} WHERE {} ORDER BY id LIMIT 1",
            self.table, built.clause
        );
        debug!(sql = %sql, values = ?built.values, "find_one");

        let row = bind_query_as(sqlx::query_as::<_, Row>(&sql), &built.values)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(into_document))
    }

    async fn insert_one(&self, doc: Document) -> Result<InsertOneResult, StoreError> {
        let sql = format!("INSERT INTO {} (body) VALUES (?)", self.table);

        let result = sqlx::query(&sql)
            .bind(Json(body_of(&doc)))
            .execute(&self.pool)
            .await
            .map_err(|e| self.map_write_error(e))?;

        Ok(InsertOneResult::new(DocumentId(result.last_insert_id())))
    }

    async fn update_one(
        &self,
        filter: &Filter,
        set: Document,
        upsert: bool,
    ) -> Result<UpdateResult, StoreError> {
        let built = build_where(filter, self.keys)?;
        let select = format!(
            "SELECT id, body FROM {} WHERE {} ORDER BY id LIMIT 1 FOR UPDATE",
            self.table, built.clause
        );

        let mut tx = self.pool.begin().await?;

        let current = bind_query_as(sqlx::query_as::<_, Row>(&select), &built.values)
            .fetch_optional(&mut *tx)
            .await?;

        let result = match current {
            Some(row) => {
                let id = row.0;
                let mut doc = into_document(row);
                if !merge_set(&mut doc, set) {
                    UpdateResult::matched(false)
                } else {
                    let sql = format!("UPDATE {} SET body = ? WHERE id = ?", self.table);
                    sqlx::query(&sql)
                        .bind(Json(body_of(&doc)))
                        .bind(id)
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| self.map_write_error(e))?;
                    UpdateResult::matched(true)
                }
            }
            None if upsert => {
                let mut doc = filter.seed();
                merge_set(&mut doc, set);
                let sql = format!("INSERT INTO {} (body) VALUES (?)", self.table);
                let inserted = sqlx::query(&sql)
                    .bind(Json(body_of(&doc)))
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| self.map_write_error(e))?;
                UpdateResult::upserted(DocumentId(inserted.last_insert_id()))
            }
            None => UpdateResult::unmatched(),
        };

        tx.commit().await?;
        Ok(result)
    }

    async fn delete_one(&self, filter: &Filter) -> Result<DeleteResult, StoreError> {
        let built = build_where(filter, self.keys)?;
        let sql = format!(
            "DELETE FROM {} WHERE {} ORDER BY id LIMIT 1",
            self.table, built.clause
        );
        debug!(sql = %sql, values = ?built.values, "delete_one");

        let result = bind_query(sqlx::query(&sql), &built.values)
            .execute(&self.pool)
            .await?;

        Ok(DeleteResult::new(result.rows_affected()))
    }
}
