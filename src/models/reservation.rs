//! Reservation (time-boxed hold) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookShort;

/// Reservation row. Never updated after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: i32,
    /// Human-readable code (`RSV-XXXXXXXX`)
    pub code: String,
    pub user_id: i32,
    pub item_id: i32,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// The window has not ended yet (`end_at >= now`)
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.end_at >= now
    }

    /// The window contains `now`
    pub fn overlaps(&self, now: DateTime<Utc>) -> bool {
        self.start_at <= now && now <= self.end_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.end_at
    }

    pub fn state_at(&self, now: DateTime<Utc>, fulfilled: bool) -> ReservationState {
        if fulfilled {
            ReservationState::Fulfilled
        } else if self.is_expired_at(now) {
            ReservationState::Expired
        } else {
            ReservationState::Active
        }
    }
}

/// Reservation state derived on read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
    Active,
    Fulfilled,
    Expired,
}

/// Values for a reservation about to be inserted
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub code: String,
    pub user_id: i32,
    pub item_id: i32,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// Reservation with title information, for history views
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationDetails {
    pub id: i32,
    pub code: String,
    pub item_id: i32,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub state: ReservationState,
    pub book: BookShort,
}
