// SQLite DocumentRepository Implementation
//
// Documents live as JSON bodies in a single table keyed by (collection, id).
// Conditions and sorts reach into the body with json_extract; partial updates
// go through json_patch in one UPDATE so there is no read-modify-write window.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use taskbox_core::error::{AppError, Result};
use taskbox_core::port::{Condition, Document, DocumentRepository, IdProvider, Query, TimeProvider};

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                match code.as_ref() {
                    "2067" | "1555" => AppError::Database(format!(
                        "Unique constraint violation: {}",
                        db_err.message()
                    )),
                    "5" => AppError::Database(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => AppError::Database(format!("Database full: {}", db_err.message())),
                    other => AppError::Database(format!(
                        "Database error [{}]: {}",
                        other,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        _ => AppError::Database(err.to_string()),
    }
}

pub struct SqliteDocumentRepository<T: Document> {
    pool: SqlitePool,
    ids: Arc<dyn IdProvider>,
    clock: Arc<dyn TimeProvider>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> SqliteDocumentRepository<T> {
    pub fn new(pool: SqlitePool, ids: Arc<dyn IdProvider>, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            ids,
            clock,
            _marker: PhantomData,
        }
    }

    fn not_found(id: &str) -> AppError {
        AppError::NotFound(format!("{} {} not found", T::COLLECTION, id))
    }

    fn decode(raw: &str) -> Result<T> {
        Ok(serde_json::from_str(raw)?)
    }

    fn decode_value(value: Value) -> Result<T> {
        Ok(serde_json::from_value(value)?)
    }
}

/// JSON path for a document field, or `None` for names the store cannot
/// address safely. Unaddressable fields are ignored, not an error.
fn json_path(field: &str) -> Option<String> {
    if field.is_empty()
        || !field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }
    Some(format!("$.{field}"))
}

fn condition_operator(condition: &Condition) -> (&'static str, &Value) {
    match condition {
        Condition::Eq(v) => ("=", v),
        Condition::Ne(v) => ("!=", v),
        Condition::Gt(v) => (">", v),
        Condition::Gte(v) => (">=", v),
        Condition::Lt(v) => ("<", v),
        Condition::Lte(v) => ("<=", v),
    }
}

fn push_bind_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::Null => {
            builder.push_bind(Option::<String>::None);
        }
        Value::Bool(b) => {
            builder.push_bind(*b);
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                builder.push_bind(i);
            } else {
                builder.push_bind(n.as_f64().unwrap_or(0.0));
            }
        }
        Value::String(s) => {
            builder.push_bind(s.clone());
        }
        other => {
            builder.push_bind(other.to_string());
        }
    }
}

#[async_trait]
impl<T: Document> DocumentRepository<T> for SqliteDocumentRepository<T> {
    async fn create(&self, fields: Value) -> Result<T> {
        let Value::Object(mut body) = fields else {
            return Err(AppError::Validation(
                "document fields must be a JSON object".to_string(),
            ));
        };

        let id = self.ids.generate_id();
        let now = self.clock.now_millis();
        body.insert("id".to_string(), Value::String(id.clone()));
        body.insert("created_at".to_string(), json!(now));
        body.insert("updated_at".to_string(), json!(now));
        let document = Value::Object(body);

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(T::COLLECTION)
        .bind(&id)
        .bind(document.to_string())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Self::decode_value(document)
    }

    async fn by_id(&self, id: &str) -> Result<T> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM documents WHERE collection = ? AND id = ?")
                .bind(T::COLLECTION)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        let body = body.ok_or_else(|| Self::not_found(id))?;
        Self::decode(&body)
    }

    async fn all(&self, query: Query) -> Result<Vec<T>> {
        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT body FROM documents WHERE collection = ");
        builder.push_bind(T::COLLECTION);

        for (field, condition) in &query.conditions {
            let Some(path) = json_path(field) else {
                continue;
            };
            let (operator, value) = condition_operator(condition);
            builder.push(format!(" AND json_extract(body, '{path}') {operator} "));
            push_bind_value(&mut builder, value);
        }

        let (sort_field, ascending) = query.sort_spec();
        // created_at/updated_at have real columns; anything else reads the body
        let order_expr = match sort_field.as_str() {
            "created_at" => "created_at".to_string(),
            "updated_at" => "updated_at".to_string(),
            field => match json_path(field) {
                Some(path) => format!("json_extract(body, '{path}')"),
                None => "created_at".to_string(),
            },
        };
        let direction = if ascending { "ASC" } else { "DESC" };
        builder.push(format!(" ORDER BY {order_expr} {direction}, id ASC"));

        if let Some(per_page) = query.per_page {
            let page = query.page.unwrap_or(1).max(1);
            builder.push(format!(
                " LIMIT {} OFFSET {}",
                per_page,
                (page - 1) * per_page
            ));
        }

        let rows: Vec<String> = builder
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|raw| {
                let document: Value = serde_json::from_str(&raw)?;
                Self::decode_value(query.apply_projection(document))
            })
            .collect()
    }

    async fn atomic_update(&self, id: &str, partial: Value) -> Result<T> {
        let Value::Object(mut patch) = partial else {
            return Err(AppError::Validation(
                "partial update must be a JSON object".to_string(),
            ));
        };

        let now = self.clock.now_millis();
        patch.insert("updated_at".to_string(), json!(now));

        let body: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE documents
            SET body = json_patch(body, ?), updated_at = ?
            WHERE collection = ? AND id = ?
            RETURNING body
            "#,
        )
        .bind(Value::Object(patch).to_string())
        .bind(now)
        .bind(T::COLLECTION)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let body = body.ok_or_else(|| Self::not_found(id))?;
        Self::decode(&body)
    }

    async fn destroy(&self, id: &str) -> Result<T> {
        let body: Option<String> = sqlx::query_scalar(
            "DELETE FROM documents WHERE collection = ? AND id = ? RETURNING body",
        )
        .bind(T::COLLECTION)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let body = body.ok_or_else(|| Self::not_found(id))?;
        Self::decode(&body)
    }
}
