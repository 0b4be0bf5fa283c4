//! Catalog lookups for physical copies

use crate::{
    error::{AppError, AppResult},
    models::item::Item,
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get item by ID
    pub async fn get_item(&self, id: i32) -> AppResult<Item> {
        self.repository.items.get_by_id(id).await
    }

    /// All copies of a title
    pub async fn copies_of(&self, isbn: &str) -> AppResult<Vec<Item>> {
        self.repository.items.find_by_isbn(isbn.trim()).await
    }

    /// A copy of the title that can be reserved or lent right now
    pub async fn available_copy(&self, isbn: &str) -> AppResult<Item> {
        let isbn = isbn.trim();
        self.repository
            .items
            .first_available(isbn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No available copy of {}", isbn)))
    }
}
