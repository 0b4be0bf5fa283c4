//! Item (physical copy) model and availability state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::AppError;

/// Lending status of a physical copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "item_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Available,
    Held,
    OnLoan,
    Withdrawn,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::Held => "held",
            ItemStatus::OnLoan => "on_loan",
            ItemStatus::Withdrawn => "withdrawn",
        }
    }

    /// Transitions the lending engine may perform.
    ///
    /// `Withdrawn` is set by catalog administration only and nothing leaves it.
    pub fn can_transition_to(self, next: ItemStatus) -> bool {
        matches!(
            (self, next),
            (ItemStatus::Available, ItemStatus::Held)
                | (ItemStatus::Available, ItemStatus::OnLoan)
                | (ItemStatus::Held, ItemStatus::OnLoan)
                | (ItemStatus::Held, ItemStatus::Available)
                | (ItemStatus::OnLoan, ItemStatus::Available)
        )
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One physical copy of a catalog title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: i32,
    /// Title identifier
    pub isbn: String,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Check that the lending engine may move this copy to `next`
    pub fn ensure_transition(&self, next: ItemStatus) -> Result<(), AppError> {
        if self.status.can_transition_to(next) {
            return Ok(());
        }

        Err(match self.status {
            ItemStatus::Withdrawn => {
                AppError::InvalidState(format!("Item {} is withdrawn", self.id))
            }
            ItemStatus::OnLoan => AppError::Conflict(format!("Item {} is already on loan", self.id)),
            ItemStatus::Available => {
                AppError::InvalidState(format!("Item {} is not lent out", self.id))
            }
            ItemStatus::Held => AppError::Conflict(format!("Item {} is not available", self.id)),
        })
    }
}
