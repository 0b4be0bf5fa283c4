//! Repository layer for database operations

pub mod items;
pub mod lending;
pub mod loans;
#[cfg(test)]
pub mod memory;
pub mod reservations;
pub mod users;

use sqlx::{Pool, Postgres};

pub use lending::{LendingStore, LendingTx, PgLendingStore};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub items: items::ItemsRepository,
    pub reservations: reservations::ReservationsRepository,
    pub loans: loans::LoansRepository,
    pub users: users::UsersRepository,
    pub lending: PgLendingStore,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            items: items::ItemsRepository::new(pool.clone()),
            reservations: reservations::ReservationsRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            lending: PgLendingStore::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, used by the readiness probe
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
