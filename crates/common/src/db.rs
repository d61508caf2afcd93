use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Connect to the PostgreSQL document backend and apply the schema.
///
/// `max_connections` comes from `AppConfig::db_max_connections` (default 20).
pub async fn connect_document_db(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await?;

    tracing::info!(max_connections, "Connected to PostgreSQL document store");

    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Document store migrations applied");

    Ok(pool)
}
