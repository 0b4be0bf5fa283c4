//! Lending maintenance endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, services::SweepReport};

use super::AuthenticatedUser;

/// Flag overdue loans and release lapsed holds now (admin only)
#[utoipa::path(
    post,
    path = "/lending/sweep",
    tag = "lending",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sweep applied", body = SweepReport),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn run_sweep(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<SweepReport>> {
    claims.require_admin()?;

    let report = state.services.lending.sweep().await?;
    Ok(Json(report))
}
