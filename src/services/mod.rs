//! Business logic services

pub mod catalog;
pub mod clock;
pub mod history;
pub mod lending;
pub mod loans;
pub mod reservations;
pub mod sweeper;

use std::sync::Arc;

use crate::{
    error::AppResult,
    repository::{PgLendingStore, Repository},
};

pub use lending::{LendingCoordinator, SweepReport};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub lending: LendingCoordinator<PgLendingStore>,
    pub history: history::HistoryService,
    pub catalog: catalog::CatalogService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, clock: Arc<dyn clock::Clock>) -> Self {
        Self {
            lending: LendingCoordinator::new(repository.lending.clone(), clock.clone()),
            history: history::HistoryService::new(repository.clone(), clock),
            catalog: catalog::CatalogService::new(repository.clone()),
            repository,
        }
    }

    /// Database round-trip for the readiness probe
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
