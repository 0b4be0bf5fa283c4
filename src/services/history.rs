//! Read-only loan and reservation history

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{loan::LoanDetails, reservation::ReservationDetails, user::normalize_cpf},
    repository::Repository,
};

use super::clock::Clock;

#[derive(Clone)]
pub struct HistoryService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl HistoryService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Reservations of the given user
    pub async fn reservations_for_user(&self, user_id: i32) -> AppResult<Vec<ReservationDetails>> {
        self.repository
            .reservations
            .list_for_user(user_id, self.clock.now())
            .await
    }

    /// Loans of the given user, with status evaluated now
    pub async fn loans_for_user(&self, user_id: i32) -> AppResult<Vec<LoanDetails>> {
        self.repository
            .loans
            .list_for_user(user_id, self.clock.now())
            .await
    }

    /// Staff lookup: reservations of the user with this CPF
    pub async fn reservations_by_cpf(&self, cpf: &str) -> AppResult<Vec<ReservationDetails>> {
        let user = self.repository.users.get_by_cpf(&normalize_cpf(cpf)?).await?;
        self.reservations_for_user(user.id).await
    }

    /// Staff lookup: loans of the user with this CPF
    pub async fn loans_by_cpf(&self, cpf: &str) -> AppResult<Vec<LoanDetails>> {
        let user = self.repository.users.get_by_cpf(&normalize_cpf(cpf)?).await?;
        self.loans_for_user(user.id).await
    }
}
