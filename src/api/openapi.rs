//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, items, lending, loans, reservations};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lending API",
        version = "0.1.0",
        description = "Library circulation REST API: reservations, loans and returns",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Items
        items::get_item,
        items::list_copies,
        items::available_copy,
        // Reservations
        reservations::create_reservation,
        reservations::my_reservations,
        reservations::user_reservations,
        // Loans
        loans::create_loan,
        loans::return_loan,
        loans::my_loans,
        loans::user_loans,
        // Lending maintenance
        lending::run_sweep,
    ),
    components(
        schemas(
            // Items
            crate::models::item::Item,
            crate::models::item::ItemStatus,
            crate::models::book::BookShort,
            // Reservations
            reservations::CreateReservationRequest,
            crate::models::reservation::Reservation,
            crate::models::reservation::ReservationDetails,
            crate::models::reservation::ReservationState,
            // Loans
            loans::CreateLoanRequest,
            crate::models::loan::Loan,
            crate::models::loan::LoanStatus,
            crate::models::loan::LoanDetails,
            crate::models::loan::ReturnedLoan,
            // Lending
            crate::services::SweepReport,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "items", description = "Physical copy lookups"),
        (name = "reservations", description = "Time-boxed holds"),
        (name = "loans", description = "Loans and returns"),
        (name = "lending", description = "Lending maintenance")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lending_paths_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/reservations",
            "/loans",
            "/loans/{id}/return",
            "/me/loans",
            "/me/reservations",
            "/loans/users/{cpf}",
            "/reservations/users/{cpf}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
