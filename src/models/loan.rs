//! Loan (borrow) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::BookShort;
use super::item::Item;

/// Loan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "loan_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Returned,
    Overdue,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Returned => "returned",
            LoanStatus::Overdue => "overdue",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Loan model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    /// Human-readable code (`LN-XXXXXXXX`)
    pub code: String,
    /// Reservation this loan fulfilled, if any
    pub reservation_id: Option<i32>,
    pub user_id: i32,
    pub item_id: i32,
    pub start_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    /// Not yet returned (active or overdue)
    pub fn is_outstanding(&self) -> bool {
        self.status != LoanStatus::Returned && self.returned_at.is_none()
    }

    /// Strictly past due: a loan due exactly at `now` is still on time
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.is_outstanding() && now > self.due_at
    }

    /// Flag an active loan as overdue. Returns whether the status changed.
    pub fn mark_as_late(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == LoanStatus::Active && self.is_overdue_at(now) {
            self.status = LoanStatus::Overdue;
            true
        } else {
            false
        }
    }

    /// Status as of `now`, without touching the stored value
    pub fn effective_status(&self, now: DateTime<Utc>) -> LoanStatus {
        if self.is_overdue_at(now) {
            LoanStatus::Overdue
        } else {
            self.status
        }
    }
}

/// Values for a loan about to be inserted (always starts active)
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub code: String,
    pub reservation_id: Option<i32>,
    pub user_id: i32,
    pub item_id: i32,
    pub start_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

/// Loan with title information, for history views
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub code: String,
    pub reservation_id: Option<i32>,
    pub item_id: i32,
    pub start_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    /// Effective status at query time
    pub status: LoanStatus,
    pub is_overdue: bool,
    pub book: BookShort,
}

/// Result of a return: both rows after the transaction committed
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReturnedLoan {
    pub loan: Loan,
    pub item: Item,
}
