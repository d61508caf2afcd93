//! Firestore REST backend.
//!
//! Uses a single `documents:commit` write per update so that plain fields and
//! `REQUEST_TIME` transforms land atomically, with an `exists: true`
//! precondition matching update (not upsert) semantics.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use fittogether_common::config::ServiceCredentials;

use super::{DocumentStore, FieldUpdate, FieldValue, StoreError};

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

pub struct FirestoreStore {
    http: reqwest::Client,
    base_url: String,
    database: String,
    credentials: ServiceCredentials,
}

impl FirestoreStore {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        database: &str,
        credentials: ServiceCredentials,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            database: database.to_string(),
            credentials,
        }
    }

    fn database_root(&self) -> String {
        format!(
            "projects/{}/databases/{}",
            self.credentials.project_id, self.database
        )
    }

    fn commit_url(&self) -> String {
        format!("{}/v1/{}/documents:commit", self.base_url, self.database_root())
    }

    /// Build the `documents:commit` request body for one partial update.
    fn commit_body(&self, path: &str, fields: &FieldUpdate) -> Value {
        let mut values = Map::new();
        let mut mask = Vec::new();
        let mut transforms = Vec::new();

        for (key, value) in fields {
            match value {
                FieldValue::Bool(b) => {
                    values.insert(key.clone(), json!({ "booleanValue": b }));
                    mask.push(key.clone());
                }
                FieldValue::String(s) => {
                    values.insert(key.clone(), json!({ "stringValue": s }));
                    mask.push(key.clone());
                }
                FieldValue::ServerTimestamp => {
                    transforms.push(json!({
                        "fieldPath": key,
                        "setToServerValue": "REQUEST_TIME"
                    }));
                }
            }
        }

        json!({
            "writes": [{
                "update": {
                    "name": format!("{}/documents/{}", self.database_root(), path),
                    "fields": values,
                },
                "updateMask": { "fieldPaths": mask },
                "updateTransforms": transforms,
                "currentDocument": { "exists": true }
            }]
        })
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn update_fields(&self, path: &str, fields: FieldUpdate) -> Result<(), StoreError> {
        let body = self.commit_body(path, &fields);

        let response = self
            .http
            .post(self.commit_url())
            .bearer_auth(&self.credentials.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await?;
        let parsed = serde_json::from_str::<ErrorEnvelope>(&text).ok();

        if status == reqwest::StatusCode::NOT_FOUND
            || parsed
                .as_ref()
                .is_some_and(|e| e.error.status == "NOT_FOUND")
        {
            return Err(StoreError::NotFound(path.to_string()));
        }

        Err(StoreError::Rejected {
            status: status.as_u16(),
            message: parsed.map(|e| e.error.message).unwrap_or(text),
        })
    }

    fn name(&self) -> &'static str {
        "firestore"
    }
}
