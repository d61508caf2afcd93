//! Shared application state for the trigger service.

use std::sync::Arc;

use fittogether_common::config::{AppConfig, StorageBackend};
use fittogether_common::db::connect_document_db;
use fittogether_notifier::dispatcher::NotificationDispatcher;
use fittogether_notifier::push::{FcmClient, PushSender};
use fittogether_notifier::store::DocumentStore;
use fittogether_notifier::store::firestore::FirestoreStore;
use fittogether_notifier::store::postgres::PgDocumentStore;
use fittogether_notifier::token_observer::TokenRegistrationObserver;

/// Handlers shared across all routes via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<NotificationDispatcher>,
    pub observer: TokenRegistrationObserver,
    /// Name of the status write-back backend
    pub storage: &'static str,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, push: Arc<dyn PushSender>) -> Self {
        Self {
            storage: store.name(),
            dispatcher: Arc::new(NotificationDispatcher::new(store, push)),
            observer: TokenRegistrationObserver::new(),
        }
    }

    /// Wire the FCM client and the configured document store from startup config.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::new();

        let store: Arc<dyn DocumentStore> = match config.storage_backend {
            StorageBackend::Firestore => Arc::new(FirestoreStore::new(
                http.clone(),
                &config.firestore_base_url,
                &config.firestore_database,
                config.credentials.clone(),
            )),
            StorageBackend::Postgres => {
                let database_url = config.database_url.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL is required for the postgres backend")
                })?;
                let pool = connect_document_db(database_url, config.db_max_connections).await?;
                Arc::new(PgDocumentStore::new(pool))
            }
        };

        let push: Arc<dyn PushSender> = Arc::new(FcmClient::new(
            http,
            &config.fcm_base_url,
            config.credentials.clone(),
        ));

        tracing::info!(
            project_id = %config.credentials.project_id,
            storage = store.name(),
            "Trigger handlers configured"
        );

        Ok(Self::new(store, push))
    }
}
