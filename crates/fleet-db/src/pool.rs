use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::RepoError;

/// Thin wrapper around a pooled Postgres connection. Schema migrations run
/// once at startup (spec §6: "migrated at startup") via the embedded
/// migration set in `migrations/`.
#[derive(Clone)]
pub struct DbPool {
    pool: PgPool,
}

impl DbPool {
    pub async fn connect(database_url: &str) -> Result<Self, RepoError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        let db = DbPool { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<(), RepoError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepoError::TransactionError(e.to_string()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
