//! Loan management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    error::AppResult,
    models::loan::{Loan, LoanDetails, ReturnedLoan},
    services::loans::LoanRequest,
};

use super::{from_epoch_ms, validate_request, AuthenticatedUser};

/// Create loan request (timestamps in epoch milliseconds)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_loan_window"))]
pub struct CreateLoanRequest {
    /// Item (physical copy) to lend
    #[serde(rename = "itemID")]
    #[validate(range(min = 1, message = "itemID must be positive"))]
    pub item_id: i32,
    /// Borrower
    #[serde(rename = "userID")]
    #[validate(range(min = 1, message = "userID must be positive"))]
    pub user_id: i32,
    #[serde(rename = "startAt")]
    pub start_at: i64,
    /// Due date, after `startAt`
    #[serde(rename = "dueAt")]
    pub due_at: i64,
    /// Reservation this loan fulfills
    #[serde(rename = "reservationID", default)]
    pub reservation_id: Option<i32>,
}

fn validate_loan_window(request: &CreateLoanRequest) -> Result<(), ValidationError> {
    if request.due_at <= request.start_at {
        let mut err = ValidationError::new("loan_window");
        err.message = Some("dueAt must be after startAt".into());
        return Err(err);
    }
    Ok(())
}

/// Lend an item to a user (staff only)
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Staff privileges required, or reservation mismatch"),
        (status = 404, description = "User, item or reservation not found"),
        (status = 409, description = "Item on loan or held, or title already borrowed"),
        (status = 422, description = "Item withdrawn or reservation expired")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    claims.require_staff()?;
    validate_request(&request)?;

    let loan = state
        .services
        .lending
        .lend(LoanRequest {
            user_id: request.user_id,
            item_id: request.item_id,
            start_at: from_epoch_ms("startAt", request.start_at)?,
            due_at: from_epoch_ms("dueAt", request.due_at)?,
            reservation_id: request.reservation_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed item (staff only)
#[utoipa::path(
    patch,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Item returned", body = ReturnedLoan),
        (status = 404, description = "Loan not found"),
        (status = 422, description = "Loan already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<ReturnedLoan>> {
    claims.require_staff()?;

    let returned = state.services.lending.return_loan(loan_id).await?;
    Ok(Json(returned))
}

/// Loan history of the authenticated user
#[utoipa::path(
    get,
    path = "/me/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's loans with title info", body = Vec<LoanDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.history.loans_for_user(claims.user_id).await?;
    Ok(Json(loans))
}

/// Loans of a user, looked up by CPF (staff only)
#[utoipa::path(
    get,
    path = "/loans/users/{cpf}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("cpf" = String, Path, description = "User CPF, with or without punctuation")
    ),
    responses(
        (status = 200, description = "User's loans", body = Vec<LoanDetails>),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(cpf): Path<String>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    claims.require_staff()?;

    let loans = state.services.history.loans_by_cpf(&cpf).await?;
    Ok(Json(loans))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_is_optional() {
        let request: CreateLoanRequest = serde_json::from_str(
            r#"{"itemID": 1, "userID": 2, "startAt": 1000, "dueAt": 2000}"#,
        )
        .unwrap();
        assert_eq!(request.reservation_id, None);
        assert!(validate_request(&request).is_ok());

        let request: CreateLoanRequest = serde_json::from_str(
            r#"{"itemID": 1, "userID": 2, "startAt": 1000, "dueAt": 2000, "reservationID": 9}"#,
        )
        .unwrap();
        assert_eq!(request.reservation_id, Some(9));
    }

    #[test]
    fn test_due_must_follow_start() {
        let request: CreateLoanRequest = serde_json::from_str(
            r#"{"itemID": 1, "userID": 2, "startAt": 2000, "dueAt": 2000}"#,
        )
        .unwrap();
        assert!(validate_request(&request).is_err());
    }
}
