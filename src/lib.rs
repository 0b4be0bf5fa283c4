//! Lending server
//!
//! REST service running the lending lifecycle of a library: time-boxed
//! reservations, loans and returns of physical copies, each applied in a
//! single database transaction together with the copy's status.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
