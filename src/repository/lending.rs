//! Transaction seam for the lending engine.
//!
//! Every lending mutation runs against a [`LendingTx`]: a handle that owns one
//! pooled connection with an open transaction. Nothing is visible to other
//! connections until [`LendingTx::commit`]; dropping the handle rolls back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction};

use super::{
    items::ItemsRepository, loans::LoansRepository, reservations::ReservationsRepository,
    users::UsersRepository,
};
use crate::{
    error::AppResult,
    models::{
        item::{Item, ItemStatus},
        loan::{Loan, NewLoan},
        reservation::{NewReservation, Reservation},
        user::User,
    },
};

/// Opens lending transactions
#[async_trait]
pub trait LendingStore: Clone + Send + Sync + 'static {
    type Tx: LendingTx;

    async fn begin(&self) -> AppResult<Self::Tx>;
}

/// Reads and writes available inside one lending transaction.
///
/// `lock_*` methods take a row lock held until commit or rollback.
#[async_trait]
pub trait LendingTx: Send {
    async fn lock_user(&mut self, user_id: i32) -> AppResult<Option<User>>;

    async fn lock_item(&mut self, item_id: i32) -> AppResult<Option<Item>>;

    /// Unconditional overwrite; the caller holds the item lock and has
    /// checked the previous status
    async fn update_item_status(&mut self, item_id: i32, status: ItemStatus) -> AppResult<Item>;

    async fn find_reservation(&mut self, reservation_id: i32) -> AppResult<Option<Reservation>>;

    async fn is_reservation_fulfilled(&mut self, reservation_id: i32) -> AppResult<bool>;

    /// Reservations of the user with `end_at >= now`, whether or not a loan
    /// already collected them
    async fn active_reservations_for_user(
        &mut self,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>>;

    async fn live_reservation_for_item(
        &mut self,
        item_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>>;

    async fn insert_reservation(&mut self, reservation: &NewReservation) -> AppResult<Reservation>;

    async fn lock_loan(&mut self, loan_id: i32) -> AppResult<Option<Loan>>;

    async fn outstanding_loan_for_title(
        &mut self,
        user_id: i32,
        isbn: &str,
    ) -> AppResult<Option<Loan>>;

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<Loan>;

    async fn mark_loan_returned(&mut self, loan_id: i32, returned_at: DateTime<Utc>) -> AppResult<Loan>;

    /// Flag active loans with `due_at < now` as overdue, returning how many changed
    async fn flag_overdue_loans(&mut self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Lock held items whose reservations are all expired or fulfilled
    async fn lock_releasable_holds(&mut self, now: DateTime<Utc>) -> AppResult<Vec<i32>>;

    async fn commit(self) -> AppResult<()>;
}

/// Postgres-backed store: one pooled connection per transaction
#[derive(Clone)]
pub struct PgLendingStore {
    pool: Pool<Postgres>,
}

impl PgLendingStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LendingStore for PgLendingStore {
    type Tx = PgLendingTx;

    async fn begin(&self) -> AppResult<PgLendingTx> {
        let tx = self.pool.begin().await?;
        Ok(PgLendingTx { tx })
    }
}

pub struct PgLendingTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LendingTx for PgLendingTx {
    async fn lock_user(&mut self, user_id: i32) -> AppResult<Option<User>> {
        UsersRepository::lock(&mut self.tx, user_id).await
    }

    async fn lock_item(&mut self, item_id: i32) -> AppResult<Option<Item>> {
        ItemsRepository::lock(&mut self.tx, item_id).await
    }

    async fn update_item_status(&mut self, item_id: i32, status: ItemStatus) -> AppResult<Item> {
        ItemsRepository::update_status(&mut self.tx, item_id, status).await
    }

    async fn find_reservation(&mut self, reservation_id: i32) -> AppResult<Option<Reservation>> {
        ReservationsRepository::find(&mut self.tx, reservation_id).await
    }

    async fn is_reservation_fulfilled(&mut self, reservation_id: i32) -> AppResult<bool> {
        ReservationsRepository::is_fulfilled(&mut self.tx, reservation_id).await
    }

    async fn active_reservations_for_user(
        &mut self,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        ReservationsRepository::active_for_user(&mut self.tx, user_id, now).await
    }

    async fn live_reservation_for_item(
        &mut self,
        item_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>> {
        ReservationsRepository::live_for_item(&mut self.tx, item_id, now).await
    }

    async fn insert_reservation(&mut self, reservation: &NewReservation) -> AppResult<Reservation> {
        ReservationsRepository::insert(&mut self.tx, reservation).await
    }

    async fn lock_loan(&mut self, loan_id: i32) -> AppResult<Option<Loan>> {
        LoansRepository::lock(&mut self.tx, loan_id).await
    }

    async fn outstanding_loan_for_title(
        &mut self,
        user_id: i32,
        isbn: &str,
    ) -> AppResult<Option<Loan>> {
        LoansRepository::outstanding_for_title(&mut self.tx, user_id, isbn).await
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<Loan> {
        LoansRepository::insert(&mut self.tx, loan).await
    }

    async fn mark_loan_returned(&mut self, loan_id: i32, returned_at: DateTime<Utc>) -> AppResult<Loan> {
        LoansRepository::mark_returned(&mut self.tx, loan_id, returned_at).await
    }

    async fn flag_overdue_loans(&mut self, now: DateTime<Utc>) -> AppResult<u64> {
        LoansRepository::flag_overdue(&mut self.tx, now).await
    }

    async fn lock_releasable_holds(&mut self, now: DateTime<Utc>) -> AppResult<Vec<i32>> {
        ItemsRepository::lock_releasable_holds(&mut self.tx, now).await
    }

    async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
