//! Reservation manager: time-boxed holds on a copy

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        generate_code,
        item::{Item, ItemStatus},
        reservation::{NewReservation, Reservation},
    },
    repository::LendingTx,
};

/// Hold request for `[start_at, end_at)`
#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub user_id: i32,
    pub item_id: i32,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

pub struct ReservationManager;

impl ReservationManager {
    /// Persist a reservation and flip the item to `held`.
    ///
    /// A user may not open a reservation while another of theirs covers `now`,
    /// even one already collected by a loan, and only an available copy can
    /// be held.
    pub async fn create_reservation<T: LendingTx>(
        tx: &mut T,
        request: &ReservationRequest,
        now: DateTime<Utc>,
    ) -> AppResult<(Reservation, Item)> {
        if request.end_at <= request.start_at {
            return Err(AppError::Validation(
                "Reservation end must be after its start".to_string(),
            ));
        }

        tx.lock_user(request.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", request.user_id)))?;

        let active = tx.active_reservations_for_user(request.user_id, now).await?;
        if let Some(current) = active.iter().find(|r| r.overlaps(now)) {
            return Err(AppError::Conflict(format!(
                "User already has an active reservation ({})",
                current.code
            )));
        }

        let item = tx
            .lock_item(request.item_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", request.item_id)))?;
        item.ensure_transition(ItemStatus::Held)?;

        let reservation = tx
            .insert_reservation(&NewReservation {
                code: generate_code("RSV"),
                user_id: request.user_id,
                item_id: item.id,
                start_at: request.start_at,
                end_at: request.end_at,
            })
            .await?;
        let item = tx.update_item_status(item.id, ItemStatus::Held).await?;

        Ok((reservation, item))
    }

    /// Put back on the shelf every held copy whose reservations have all
    /// lapsed or been collected. Returns the released item ids.
    pub async fn release_expired_holds<T: LendingTx>(
        tx: &mut T,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<i32>> {
        let item_ids = tx.lock_releasable_holds(now).await?;
        for item_id in &item_ids {
            tx.update_item_status(*item_id, ItemStatus::Available).await?;
        }
        Ok(item_ids)
    }
}
