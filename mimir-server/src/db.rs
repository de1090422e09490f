//! Database module - PostgreSQL connection and migrations

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Verdict records: one row per ingestion call, insert-only.
CREATE TABLE IF NOT EXISTS bias_verdicts (
    id BIGSERIAL PRIMARY KEY,
    alert_id TEXT NOT NULL,
    alert_group_id TEXT,
    timestamp TIMESTAMPTZ NOT NULL,
    test_case TEXT,
    raw_log_summary TEXT NOT NULL,
    bias_analysis TEXT NOT NULL,
    created_at TIMESTAMPTZ DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_bias_verdicts_created ON bias_verdicts(created_at);
CREATE INDEX IF NOT EXISTS idx_bias_verdicts_group ON bias_verdicts(alert_group_id);
CREATE INDEX IF NOT EXISTS idx_bias_verdicts_test_case ON bias_verdicts(test_case);
"#;
