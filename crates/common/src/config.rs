use std::net::SocketAddr;
use std::str::FromStr;

/// Which document store the notifier writes delivery status back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StorageBackend::Firestore),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => Err(anyhow::anyhow!(
                "STORAGE_BACKEND must be 'firestore' or 'postgres', got '{}'",
                other
            )),
        }
    }
}

/// Process identity shared by the push client and the document store.
///
/// Established once at startup and handed to each client explicitly.
#[derive(Clone)]
pub struct ServiceCredentials {
    /// Firebase / GCP project id
    pub project_id: String,

    /// OAuth2 bearer token
    pub access_token: String,
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("project_id", &self.project_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: ServiceCredentials,

    /// FCM HTTP v1 base URL
    pub fcm_base_url: String,

    /// Firestore REST base URL
    pub firestore_base_url: String,

    /// Firestore database id (default: "(default)")
    pub firestore_database: String,

    pub storage_backend: StorageBackend,

    /// PostgreSQL connection string, required for the postgres backend
    pub database_url: Option<String>,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// Address the trigger service binds to
    pub listen_addr: SocketAddr,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let storage_backend: StorageBackend = std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .parse()?;

        let database_url = std::env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(anyhow::anyhow!(
                "DATABASE_URL environment variable is required when STORAGE_BACKEND=postgres"
            ));
        }

        Ok(Self {
            credentials: ServiceCredentials {
                project_id: std::env::var("GCP_PROJECT_ID").map_err(|_| {
                    anyhow::anyhow!("GCP_PROJECT_ID environment variable is required")
                })?,
                access_token: std::env::var("GOOGLE_ACCESS_TOKEN").map_err(|_| {
                    anyhow::anyhow!("GOOGLE_ACCESS_TOKEN environment variable is required")
                })?,
            },
            fcm_base_url: std::env::var("FCM_BASE_URL")
                .unwrap_or_else(|_| "https://fcm.googleapis.com".to_string()),
            firestore_base_url: std::env::var("FIRESTORE_BASE_URL")
                .unwrap_or_else(|_| "https://firestore.googleapis.com".to_string()),
            firestore_database: std::env::var("FIRESTORE_DATABASE")
                .unwrap_or_else(|_| "(default)".to_string()),
            storage_backend,
            database_url,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("LISTEN_ADDR must be a valid socket address"))?,
        })
    }
}
