//! In-process document store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{DocumentStore, FieldUpdate, FieldValue, StoreError};

/// Documents held in a map keyed by path. Server timestamps are RFC 3339 strings.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, Map<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a document.
    pub async fn insert(&self, path: impl Into<String>, fields: Value) {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.documents.write().await.insert(path.into(), fields);
    }

    pub async fn get(&self, path: &str) -> Option<Map<String, Value>> {
        self.documents.read().await.get(path).cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn update_fields(&self, path: &str, fields: FieldUpdate) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        for (key, value) in fields {
            let value = match value {
                FieldValue::Bool(b) => Value::Bool(b),
                FieldValue::String(s) => Value::String(s),
                FieldValue::ServerTimestamp => Value::String(now.clone()),
            };
            document.insert(key, value);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
