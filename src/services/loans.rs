//! Loan manager: lending, returns and overdue flags

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        generate_code,
        item::{Item, ItemStatus},
        loan::{Loan, NewLoan, ReturnedLoan},
    },
    repository::LendingTx,
};

/// Borrow request, optionally fulfilling a reservation
#[derive(Debug, Clone)]
pub struct LoanRequest {
    pub user_id: i32,
    pub item_id: i32,
    pub start_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub reservation_id: Option<i32>,
}

pub struct LoanManager;

impl LoanManager {
    /// Persist an active loan and flip the item to `on_loan`
    pub async fn create_loan<T: LendingTx>(
        tx: &mut T,
        request: &LoanRequest,
        now: DateTime<Utc>,
    ) -> AppResult<(Loan, Item)> {
        if request.due_at <= request.start_at {
            return Err(AppError::Validation(
                "Loan due date must be after its start".to_string(),
            ));
        }

        tx.lock_user(request.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", request.user_id)))?;

        let item = tx
            .lock_item(request.item_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", request.item_id)))?;

        let mut reservation_id = request.reservation_id;

        if let Some(id) = reservation_id {
            let reservation = tx
                .find_reservation(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))?;

            if reservation.user_id != request.user_id || reservation.item_id != item.id {
                return Err(AppError::Mismatch(format!(
                    "Reservation {} does not belong to this user and item",
                    reservation.code
                )));
            }
            if tx.is_reservation_fulfilled(id).await? {
                return Err(AppError::Conflict(format!(
                    "Reservation {} was already fulfilled",
                    reservation.code
                )));
            }
            if reservation.is_expired_at(now) {
                return Err(AppError::InvalidState(format!(
                    "Reservation {} expired at {}",
                    reservation.code, reservation.end_at
                )));
            }
        }

        item.ensure_transition(ItemStatus::OnLoan)?;

        if item.status == ItemStatus::Held {
            // A held copy goes only to the holder; a hold with no live
            // reservation behind it is stale and does not block lending
            match tx.live_reservation_for_item(item.id, now).await? {
                Some(live) if reservation_id == Some(live.id) => {}
                Some(live) if reservation_id.is_none() && live.user_id == request.user_id => {
                    reservation_id = Some(live.id);
                }
                Some(_) => {
                    return Err(AppError::Conflict(format!(
                        "Item {} is held by another reservation",
                        item.id
                    )));
                }
                None => {}
            }
        }

        if let Some(existing) = tx
            .outstanding_loan_for_title(request.user_id, &item.isbn)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "User already has an active loan of title {} ({})",
                item.isbn, existing.code
            )));
        }

        let loan = tx
            .insert_loan(&NewLoan {
                code: generate_code("LN"),
                reservation_id,
                user_id: request.user_id,
                item_id: item.id,
                start_at: request.start_at,
                due_at: request.due_at,
            })
            .await?;
        let item = tx.update_item_status(item.id, ItemStatus::OnLoan).await?;

        Ok((loan, item))
    }

    /// Close a loan and put the copy back on the shelf.
    ///
    /// A copy withdrawn while lent out stays withdrawn.
    pub async fn return_loan_and_item<T: LendingTx>(
        tx: &mut T,
        loan_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<ReturnedLoan> {
        let loan = tx
            .lock_loan(loan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if !loan.is_outstanding() {
            return Err(AppError::InvalidState(format!(
                "Loan {} was already returned",
                loan.code
            )));
        }

        let item = tx
            .lock_item(loan.item_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", loan.item_id)))?;

        let loan = tx.mark_loan_returned(loan.id, now).await?;

        let item = match item.status {
            ItemStatus::OnLoan => tx.update_item_status(item.id, ItemStatus::Available).await?,
            ItemStatus::Withdrawn => item,
            // the loan still closes; a held copy keeps its holder
            status => {
                tracing::warn!(
                    loan_id = loan.id,
                    item_id = item.id,
                    status = %status,
                    "Returned loan's copy was not on loan; status left unchanged"
                );
                item
            }
        };

        Ok(ReturnedLoan { loan, item })
    }

    /// Flag active loans past due. Returns how many changed.
    pub async fn flag_overdue_loans<T: LendingTx>(tx: &mut T, now: DateTime<Utc>) -> AppResult<u64> {
        tx.flag_overdue_loans(now).await
    }
}
