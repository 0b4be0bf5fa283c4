//! Reservation endpoints

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
    models::reservation::{Reservation, ReservationDetails},
    services::reservations::ReservationRequest,
};

use super::{from_epoch_ms, validate_request, AuthenticatedUser};

/// Create reservation request (timestamps in epoch milliseconds)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_reservation_window"))]
pub struct CreateReservationRequest {
    /// Item (physical copy) to hold
    #[serde(rename = "itemID")]
    #[validate(range(min = 1, message = "itemID must be positive"))]
    pub item_id: i32,
    /// Start of the hold window
    #[serde(rename = "startAt")]
    pub start_at: i64,
    /// End of the hold window, after `startAt`
    #[serde(rename = "endAt")]
    pub end_at: i64,
}

fn validate_reservation_window(request: &CreateReservationRequest) -> Result<(), ValidationError> {
    if request.end_at <= request.start_at {
        let mut err = ValidationError::new("reservation_window");
        err.message = Some("endAt must be after startAt".into());
        return Err(err);
    }
    Ok(())
}

/// Reserve an item for the authenticated user
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation created", body = Reservation),
        (status = 400, description = "Invalid window"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "User already has an active reservation, or item not available"),
        (status = 422, description = "Item withdrawn")
    )
)]
pub async fn create_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateReservationRequest>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    validate_request(&request)?;

    let reservation = state
        .services
        .lending
        .reserve(ReservationRequest {
            user_id: claims.user_id,
            item_id: request.item_id,
            start_at: from_epoch_ms("startAt", request.start_at)?,
            end_at: from_epoch_ms("endAt", request.end_at)?,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Reservations of the authenticated user
#[utoipa::path(
    get,
    path = "/me/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's reservations", body = Vec<ReservationDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state.services.history.reservations_for_user(claims.user_id).await?;
    Ok(Json(reservations))
}

/// Reservations of a user, looked up by CPF (staff only)
#[utoipa::path(
    get,
    path = "/reservations/users/{cpf}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("cpf" = String, Path, description = "User CPF, with or without punctuation")
    ),
    responses(
        (status = 200, description = "User's reservations", body = Vec<ReservationDetails>),
        (status = 403, description = "Staff privileges required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(cpf): Path<String>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    claims.require_staff()?;

    let reservations = state.services.history.reservations_by_cpf(&cpf).await?;
    Ok(Json(reservations))
}
