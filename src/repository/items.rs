//! Items repository: the single place item status is read and written

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::item::{Item, ItemStatus},
};

#[derive(Clone)]
pub struct ItemsRepository {
    pool: Pool<Postgres>,
}

impl ItemsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get item by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Item> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))
    }

    /// All copies of a title
    pub async fn find_by_isbn(&self, isbn: &str) -> AppResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE isbn = $1 ORDER BY id")
            .bind(isbn)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// First copy of a title that can be reserved or lent right now
    pub async fn first_available(&self, isbn: &str) -> AppResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            "SELECT * FROM items WHERE isbn = $1 AND status = $2 ORDER BY id LIMIT 1",
        )
        .bind(isbn)
        .bind(ItemStatus::Available)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Read an item and hold its row lock until the transaction ends
    pub async fn lock(conn: &mut PgConnection, id: i32) -> AppResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(item)
    }

    /// Overwrite an item's status. No check on the previous value.
    pub async fn update_status(
        conn: &mut PgConnection,
        id: i32,
        status: ItemStatus,
    ) -> AppResult<Item> {
        sqlx::query_as::<_, Item>("UPDATE items SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(status)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))
    }

    /// Held items with no live reservation left, locked; rows already
    /// locked by an in-flight lend or reserve are skipped
    pub async fn lock_releasable_holds(
        conn: &mut PgConnection,
        now: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT i.id FROM items i
            WHERE i.status = 'held'
              AND NOT EXISTS (
                  SELECT 1 FROM reservations r
                  WHERE r.item_id = i.id
                    AND r.end_at >= $1
                    AND NOT EXISTS (SELECT 1 FROM loans l WHERE l.reservation_id = r.id)
              )
            ORDER BY i.id
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(now)
        .fetch_all(conn)
        .await?;

        Ok(ids)
    }
}
