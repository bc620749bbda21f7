use async_trait::async_trait;
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use trip_journal_core::store::{
    merge_shallow, Constraint, Document, DocumentStore, Query, StoreError,
};
use trip_journal_core::EntityId;

// Primary SQLite result codes (extended codes keep these in the low byte)
const SQLITE_PERM: i32 = 3;
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_READONLY: i32 = 8;
const SQLITE_AUTH: i32 = 23;

/// [`DocumentStore`] backed by a single SQLite `documents` table.
///
/// Bodies are stored as JSON text; filters and sort keys go through
/// `json_extract`. Queries without a sort key return documents in id order.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    body: String,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends `FROM documents WHERE ... ORDER BY ... LIMIT ...`.
    fn push_selection<'a>(
        qb: &mut QueryBuilder<'a, Sqlite>,
        collection: &str,
        query: &Query,
    ) -> Result<(), StoreError> {
        qb.push(" FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());

        for (field, value) in &query.filters {
            qb.push(" AND json_extract(body, ");
            qb.push_bind(json_path(field)?);
            match value {
                Value::Null => {
                    qb.push(") IS NULL");
                }
                Value::Bool(b) => {
                    qb.push(") = ");
                    qb.push_bind(*b);
                }
                Value::Number(n) => {
                    qb.push(") = ");
                    match n.as_i64() {
                        Some(i) => qb.push_bind(i),
                        None => qb.push_bind(n.as_f64().unwrap_or(f64::NAN)),
                    };
                }
                Value::String(s) => {
                    qb.push(") = ");
                    qb.push_bind(s.clone());
                }
                Value::Array(_) | Value::Object(_) => {
                    qb.push(") = json(");
                    qb.push_bind(value.to_string());
                    qb.push(")");
                }
            }
        }

        qb.push(" ORDER BY ");
        for (field, direction) in &query.sorts {
            qb.push("json_extract(body, ");
            qb.push_bind(json_path(field)?);
            qb.push(format!(") {}, ", direction));
        }
        qb.push("id");

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn create(&self, collection: &str, data: Document) -> Result<EntityId, StoreError> {
        let id = EntityId::generate();
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)")
            .bind(collection)
            .bind(id.as_str())
            .bind(encode(&data)?)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(id)
    }

    async fn put(
        &self,
        collection: &str,
        id: &EntityId,
        data: Document,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)
            ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body
            "#,
        )
        .bind(collection)
        .bind(id.as_str())
        .bind(encode(&data)?)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn read(&self, collection: &str, id: &EntityId) -> Result<Option<Document>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?;

        row.map(|(body,)| decode_body(collection, id.as_str(), &body))
            .transpose()
    }

    async fn update(
        &self,
        collection: &str,
        id: &EntityId,
        patch: Document,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_error)?;

        let mut doc = match row {
            Some((body,)) => decode_body(collection, id.as_str(), &body)?,
            None => {
                return Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.clone(),
                })
            }
        };
        merge_shallow(&mut doc, patch);

        sqlx::query("UPDATE documents SET body = ? WHERE collection = ? AND id = ?")
            .bind(encode(&doc)?)
            .bind(collection)
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)
    }

    async fn delete(&self, collection: &str, id: &EntityId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        constraints: &[Constraint],
    ) -> Result<Vec<(EntityId, Document)>, StoreError> {
        let query = Query::from_constraints(constraints);
        let mut qb = QueryBuilder::new("SELECT id, body");
        Self::push_selection(&mut qb, collection, &query)?;

        let rows: Vec<DocumentRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        rows.into_iter()
            .map(|row| -> Result<(EntityId, Document), StoreError> {
                let id = EntityId::parse(&row.id)
                    .map_err(|e| malformed(collection, &row.id, e.to_string()))?;
                let doc = decode_body(collection, &row.id, &row.body)?;
                Ok((id, doc))
            })
            .collect()
    }

    async fn count(&self, collection: &str, constraints: &[Constraint]) -> Result<usize, StoreError> {
        let query = Query::from_constraints(constraints);
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM (SELECT id");
        Self::push_selection(&mut qb, collection, &query)?;
        qb.push(")");

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

/// JSON path for a top-level key. SQLite's quoted path labels have no
/// escape syntax, so a key containing `"` cannot be addressed.
fn json_path(field: &str) -> Result<String, StoreError> {
    if field.contains('"') {
        return Err(StoreError::backend(
            "invalid_field",
            format!("field name {:?} cannot be used in a query", field),
        ));
    }
    Ok(format!("$.\"{}\"", field))
}

fn encode(doc: &Document) -> Result<String, StoreError> {
    serde_json::to_string(doc).map_err(|e| StoreError::backend("encode", e.to_string()))
}

fn decode_body(collection: &str, id: &str, body: &str) -> Result<Document, StoreError> {
    match serde_json::from_str(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(malformed(collection, id, "body is not a JSON object".to_string())),
        Err(e) => Err(malformed(collection, id, e.to_string())),
    }
}

fn malformed(collection: &str, id: &str, reason: String) -> StoreError {
    StoreError::Malformed {
        collection: collection.to_string(),
        id: id.to_string(),
        reason,
    }
}

fn store_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(db) => {
            let code = db.code().map(|c| c.into_owned()).unwrap_or_default();
            let message = db.message().to_string();
            match code.parse::<i32>().map(|c| c & 0xff) {
                Ok(SQLITE_PERM | SQLITE_READONLY | SQLITE_AUTH) => {
                    StoreError::PermissionDenied(message)
                }
                Ok(SQLITE_BUSY | SQLITE_LOCKED) => StoreError::Unavailable(message),
                _ => StoreError::backend(code, message),
            }
        }
        other @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)) => {
            StoreError::Unavailable(other.to_string())
        }
        other => StoreError::backend("sqlx", other.to_string()),
    }
}
