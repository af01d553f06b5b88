use sqlx::{PgConnection, Postgres, Transaction};

use crate::error::RepoError;
use crate::pool::DbPool;

/// A single atomic multi-row write (spec §4.4). Repository write methods
/// take `&mut Tx` so every mutation happens inside one transaction per
/// inbound event or outbound action.
///
/// Dropping a `Tx` without calling [`Tx::commit`] rolls back automatically
/// (sqlx's `Transaction::drop` issues `ROLLBACK`), which is exactly the
/// "panic inside the transaction triggers rollback" guarantee spec §4.4
/// asks for — no separate unwind guard is needed.
pub struct Tx {
    inner: Transaction<'static, Postgres>,
}

impl Tx {
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.inner
    }

    pub async fn commit(self) -> Result<(), RepoError> {
        self.inner
            .commit()
            .await
            .map_err(|e| RepoError::TransactionError(e.to_string()))
    }

    pub async fn rollback(self) -> Result<(), RepoError> {
        self.inner
            .rollback()
            .await
            .map_err(|e| RepoError::TransactionError(e.to_string()))
    }
}

/// Opens transactions against the pool. Pure reads bypass this and use the
/// ambient pool connection directly (spec §4.4: "pure reads use the
/// ambient connection").
#[derive(Clone)]
pub struct UnitOfWork {
    pool: DbPool,
}

impl UnitOfWork {
    pub fn new(pool: DbPool) -> Self {
        UnitOfWork { pool }
    }

    pub async fn begin(&self) -> Result<Tx, RepoError> {
        let inner = self.pool.pool().begin().await?;
        Ok(Tx { inner })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}
