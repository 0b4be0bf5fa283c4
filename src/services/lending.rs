//! Lending coordinator: the transaction boundary around every lending mutation.
//!
//! Each operation opens one [`LendingTx`], runs the manager logic against it
//! and commits. Returning early with an error drops the handle, which rolls
//! back the ledger row and the item status together.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{loan::Loan, reservation::Reservation, ReturnedLoan},
    repository::{LendingStore, LendingTx},
};

use super::{
    clock::Clock,
    loans::{LoanManager, LoanRequest},
    reservations::{ReservationManager, ReservationRequest},
};

/// Outcome of one sweep pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct SweepReport {
    pub overdue_flagged: u64,
    pub holds_released: u64,
}

#[derive(Clone)]
pub struct LendingCoordinator<S: LendingStore> {
    store: S,
    clock: Arc<dyn Clock>,
}

fn log_rejection(operation: &str, err: &AppError) {
    tracing::warn!(operation, error = %err, "Lending operation rejected");
}

impl<S: LendingStore> LendingCoordinator<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Hold an item for a user
    pub async fn reserve(&self, request: ReservationRequest) -> AppResult<Reservation> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let (reservation, item) = ReservationManager::create_reservation(&mut tx, &request, now)
            .await
            .inspect_err(|e| log_rejection("reserve", e))?;
        tx.commit().await?;

        tracing::info!(
            reservation_id = reservation.id,
            user_id = reservation.user_id,
            item_id = item.id,
            code = %reservation.code,
            "Reservation created"
        );

        Ok(reservation)
    }

    /// Lend an item, optionally fulfilling a reservation
    pub async fn lend(&self, request: LoanRequest) -> AppResult<Loan> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let (loan, item) = LoanManager::create_loan(&mut tx, &request, now)
            .await
            .inspect_err(|e| log_rejection("lend", e))?;
        tx.commit().await?;

        tracing::info!(
            loan_id = loan.id,
            user_id = loan.user_id,
            item_id = item.id,
            reservation_id = ?loan.reservation_id,
            due_at = %loan.due_at,
            "Loan created"
        );

        Ok(loan)
    }

    /// Return a loan and make its item available again
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<ReturnedLoan> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let returned = LoanManager::return_loan_and_item(&mut tx, loan_id, now)
            .await
            .inspect_err(|e| log_rejection("return", e))?;
        tx.commit().await?;

        tracing::info!(
            loan_id = returned.loan.id,
            item_id = returned.item.id,
            item_status = %returned.item.status,
            "Loan returned"
        );

        Ok(returned)
    }

    /// Flag overdue loans and release lapsed holds in one transaction
    pub async fn sweep(&self) -> AppResult<SweepReport> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let overdue_flagged = LoanManager::flag_overdue_loans(&mut tx, now).await?;
        let released = ReservationManager::release_expired_holds(&mut tx, now).await?;
        tx.commit().await?;

        let report = SweepReport {
            overdue_flagged,
            holds_released: released.len() as u64,
        };
        if report != SweepReport::default() {
            tracing::info!(
                overdue_flagged = report.overdue_flagged,
                holds_released = report.holds_released,
                released_items = ?released,
                "Lending sweep applied"
            );
        }

        Ok(report)
    }
}
