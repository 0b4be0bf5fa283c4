//! Physical copy lookups

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{error::AppResult, models::item::Item};

use super::AuthenticatedUser;

/// Get a copy by ID
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item", body = Item),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Item>> {
    let item = state.services.catalog.get_item(id).await?;
    Ok(Json(item))
}

/// All copies of a title
#[utoipa::path(
    get,
    path = "/books/{isbn}/items",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("isbn" = String, Path, description = "Title ISBN")
    ),
    responses(
        (status = 200, description = "Copies of the title", body = Vec<Item>)
    )
)]
pub async fn list_copies(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(isbn): Path<String>,
) -> AppResult<Json<Vec<Item>>> {
    let items = state.services.catalog.copies_of(&isbn).await?;
    Ok(Json(items))
}

/// A copy of the title that is available right now
#[utoipa::path(
    get,
    path = "/books/{isbn}/available-item",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("isbn" = String, Path, description = "Title ISBN")
    ),
    responses(
        (status = 200, description = "An available copy", body = Item),
        (status = 404, description = "No copy available")
    )
)]
pub async fn available_copy(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(isbn): Path<String>,
) -> AppResult<Json<Item>> {
    let item = state.services.catalog.available_copy(&isbn).await?;
    Ok(Json(item))
}
