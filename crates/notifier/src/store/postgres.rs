//! PostgreSQL backend: documents stored as JSONB rows keyed by path.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;

use super::{DocumentStore, FieldUpdate, FieldValue, StoreError};

pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Split an update into the JSON object of plain fields and the names of
    /// fields the database should stamp with `now()`.
    fn split(fields: FieldUpdate) -> (Value, Vec<String>) {
        let mut values = Map::new();
        let mut stamped = Vec::new();
        for (key, value) in fields {
            match value {
                FieldValue::Bool(b) => {
                    values.insert(key, Value::Bool(b));
                }
                FieldValue::String(s) => {
                    values.insert(key, Value::String(s));
                }
                FieldValue::ServerTimestamp => stamped.push(key),
            }
        }
        (Value::Object(values), stamped)
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn update_fields(&self, path: &str, fields: FieldUpdate) -> Result<(), StoreError> {
        let (values, stamped) = Self::split(fields);

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET fields = fields || $2::jsonb || COALESCE(
                    (SELECT jsonb_object_agg(f, to_jsonb(now())) FROM unnest($3::text[]) AS f),
                    '{}'::jsonb
                ),
                updated_at = now()
            WHERE path = $1
            "#,
        )
        .bind(path)
        .bind(&values)
        .bind(&stamped)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_separates_server_timestamps() {
        let (values, stamped) = PgDocumentStore::split(vec![
            ("sent".to_string(), FieldValue::Bool(false)),
            ("error".to_string(), FieldValue::String("boom".to_string())),
            ("errorAt".to_string(), FieldValue::ServerTimestamp),
        ]);
        assert_eq!(values, serde_json::json!({ "sent": false, "error": "boom" }));
        assert_eq!(stamped, vec!["errorAt".to_string()]);
    }
}
