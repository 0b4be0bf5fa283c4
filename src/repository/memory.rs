//! In-memory [`LendingStore`] for coordinator tests.
//!
//! A transaction holds the store mutex for its whole life (the same
//! serialization row locks give per row) and works on a copy of the state;
//! commit writes the copy back, drop discards it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::lending::{LendingStore, LendingTx};
use crate::{
    error::{AppError, AppResult},
    models::{
        item::{Item, ItemStatus},
        loan::{Loan, LoanStatus, NewLoan},
        reservation::{NewReservation, Reservation},
        user::User,
    },
};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub users: BTreeMap<i32, User>,
    pub items: BTreeMap<i32, Item>,
    pub reservations: BTreeMap<i32, Reservation>,
    pub loans: BTreeMap<i32, Loan>,
    next_id: i32,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn is_fulfilled(&self, reservation_id: i32) -> bool {
        self.loans
            .values()
            .any(|l| l.reservation_id == Some(reservation_id))
    }

    fn is_live(&self, reservation: &Reservation, now: DateTime<Utc>) -> bool {
        reservation.is_active_at(now) && !self.is_fulfilled(reservation.id)
    }

    /// Loans on `item_id` that are not returned
    pub fn outstanding_loans_for_item(&self, item_id: i32) -> Vec<&Loan> {
        self.loans
            .values()
            .filter(|l| l.item_id == item_id && l.is_outstanding())
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct MemoryLendingStore {
    state: Arc<Mutex<MemoryState>>,
    fail_item_updates: Arc<AtomicBool>,
}

impl MemoryLendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, cpf: &str) -> User {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let user = User {
            id,
            cpf: cpf.to_string(),
            name: format!("User {}", id),
            email: None,
            created_at: Utc::now(),
        };
        state.users.insert(id, user.clone());
        user
    }

    pub async fn add_item(&self, isbn: &str) -> Item {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let item = Item {
            id,
            isbn: isbn.to_string(),
            status: ItemStatus::Available,
            created_at: Utc::now(),
        };
        state.items.insert(id, item.clone());
        item
    }

    /// Committed state
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    /// Make every `update_item_status` fail, to exercise rollback after the
    /// ledger row was written
    pub fn fail_item_updates(&self, fail: bool) {
        self.fail_item_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LendingStore for MemoryLendingStore {
    type Tx = MemoryLendingTx;

    async fn begin(&self) -> AppResult<MemoryLendingTx> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(MemoryLendingTx {
            guard,
            working,
            fail_item_updates: self.fail_item_updates.load(Ordering::SeqCst),
        })
    }
}

pub struct MemoryLendingTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_item_updates: bool,
}

#[async_trait]
impl LendingTx for MemoryLendingTx {
    async fn lock_user(&mut self, user_id: i32) -> AppResult<Option<User>> {
        Ok(self.working.users.get(&user_id).cloned())
    }

    async fn lock_item(&mut self, item_id: i32) -> AppResult<Option<Item>> {
        Ok(self.working.items.get(&item_id).cloned())
    }

    async fn update_item_status(&mut self, item_id: i32, status: ItemStatus) -> AppResult<Item> {
        if self.fail_item_updates {
            return Err(AppError::Internal("item update failed".to_string()));
        }
        let item = self
            .working
            .items
            .get_mut(&item_id)
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", item_id)))?;
        item.status = status;
        Ok(item.clone())
    }

    async fn find_reservation(&mut self, reservation_id: i32) -> AppResult<Option<Reservation>> {
        Ok(self.working.reservations.get(&reservation_id).cloned())
    }

    async fn is_reservation_fulfilled(&mut self, reservation_id: i32) -> AppResult<bool> {
        Ok(self.working.is_fulfilled(reservation_id))
    }

    async fn active_reservations_for_user(
        &mut self,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        Ok(self
            .working
            .reservations
            .values()
            .filter(|r| r.user_id == user_id && r.is_active_at(now))
            .cloned()
            .collect())
    }

    async fn live_reservation_for_item(
        &mut self,
        item_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>> {
        Ok(self
            .working
            .reservations
            .values()
            .filter(|r| r.item_id == item_id && self.working.is_live(r, now))
            .max_by_key(|r| (r.created_at, r.id))
            .cloned())
    }

    async fn insert_reservation(&mut self, reservation: &NewReservation) -> AppResult<Reservation> {
        let id = self.working.next_id();
        let row = Reservation {
            id,
            code: reservation.code.clone(),
            user_id: reservation.user_id,
            item_id: reservation.item_id,
            start_at: reservation.start_at,
            end_at: reservation.end_at,
            created_at: Utc::now(),
        };
        self.working.reservations.insert(id, row.clone());
        Ok(row)
    }

    async fn lock_loan(&mut self, loan_id: i32) -> AppResult<Option<Loan>> {
        Ok(self.working.loans.get(&loan_id).cloned())
    }

    async fn outstanding_loan_for_title(
        &mut self,
        user_id: i32,
        isbn: &str,
    ) -> AppResult<Option<Loan>> {
        let items = &self.working.items;
        Ok(self
            .working
            .loans
            .values()
            .find(|l| {
                l.user_id == user_id
                    && l.is_outstanding()
                    && items.get(&l.item_id).map(|i| i.isbn == isbn).unwrap_or(false)
            })
            .cloned())
    }

    async fn insert_loan(&mut self, loan: &NewLoan) -> AppResult<Loan> {
        // unique indexes on loans
        if !self.working.outstanding_loans_for_item(loan.item_id).is_empty() {
            return Err(AppError::Conflict("duplicate outstanding loan".to_string()));
        }
        if let Some(reservation_id) = loan.reservation_id {
            if self.working.is_fulfilled(reservation_id) {
                return Err(AppError::Conflict("reservation already fulfilled".to_string()));
            }
        }

        let id = self.working.next_id();
        let row = Loan {
            id,
            code: loan.code.clone(),
            reservation_id: loan.reservation_id,
            user_id: loan.user_id,
            item_id: loan.item_id,
            start_at: loan.start_at,
            due_at: loan.due_at,
            returned_at: None,
            status: LoanStatus::Active,
            created_at: Utc::now(),
        };
        self.working.loans.insert(id, row.clone());
        Ok(row)
    }

    async fn mark_loan_returned(&mut self, loan_id: i32, returned_at: DateTime<Utc>) -> AppResult<Loan> {
        let loan = self
            .working
            .loans
            .get_mut(&loan_id)
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;
        loan.status = LoanStatus::Returned;
        loan.returned_at = Some(returned_at);
        Ok(loan.clone())
    }

    async fn flag_overdue_loans(&mut self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut flagged = 0;
        for loan in self.working.loans.values_mut() {
            if loan.mark_as_late(now) {
                flagged += 1;
            }
        }
        Ok(flagged)
    }

    async fn lock_releasable_holds(&mut self, now: DateTime<Utc>) -> AppResult<Vec<i32>> {
        let state = &self.working;
        Ok(state
            .items
            .values()
            .filter(|i| i.status == ItemStatus::Held)
            .filter(|i| {
                !state
                    .reservations
                    .values()
                    .any(|r| r.item_id == i.id && state.is_live(r, now))
            })
            .map(|i| i.id)
            .collect())
    }

    async fn commit(self) -> AppResult<()> {
        let MemoryLendingTx {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }
}
