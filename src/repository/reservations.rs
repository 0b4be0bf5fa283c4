//! Reservations repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres, Row};

use crate::{
    error::AppResult,
    models::{
        book::BookShort,
        reservation::{NewReservation, Reservation, ReservationDetails},
    },
};

/// Live = not ended and not yet turned into a loan
const LIVE_FILTER: &str =
    "r.end_at >= $2 AND NOT EXISTS (SELECT 1 FROM loans l WHERE l.reservation_id = r.id)";

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Reservations of a user with title info, newest first
    pub async fn list_for_user(
        &self,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<ReservationDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT r.*, b.isbn, b.title, b.author, b.cover_url,
                   EXISTS(SELECT 1 FROM loans l WHERE l.reservation_id = r.id) AS fulfilled
            FROM reservations r
            JOIN items i ON i.id = r.item_id
            JOIN books b ON b.isbn = i.isbn
            WHERE r.user_id = $1
            ORDER BY r.start_at DESC, r.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let reservation = Reservation {
                id: row.get("id"),
                code: row.get("code"),
                user_id: row.get("user_id"),
                item_id: row.get("item_id"),
                start_at: row.get("start_at"),
                end_at: row.get("end_at"),
                created_at: row.get("created_at"),
            };
            let fulfilled: bool = row.get("fulfilled");

            result.push(ReservationDetails {
                state: reservation.state_at(now, fulfilled),
                id: reservation.id,
                code: reservation.code,
                item_id: reservation.item_id,
                start_at: reservation.start_at,
                end_at: reservation.end_at,
                created_at: reservation.created_at,
                book: BookShort {
                    isbn: row.get("isbn"),
                    title: row.get("title"),
                    author: row.get("author"),
                    cover_url: row.get("cover_url"),
                },
            });
        }

        Ok(result)
    }

    pub async fn find(conn: &mut PgConnection, id: i32) -> AppResult<Option<Reservation>> {
        let reservation =
            sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
                .bind(id)
                .fetch_optional(conn)
                .await?;

        Ok(reservation)
    }

    pub async fn is_fulfilled(conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let fulfilled: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE reservation_id = $1)")
                .bind(id)
                .fetch_one(conn)
                .await?;

        Ok(fulfilled)
    }

    /// Reservations of a user not yet ended, collected ones included
    pub async fn active_for_user(
        conn: &mut PgConnection,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE user_id = $1 AND end_at >= $2 ORDER BY start_at",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(conn)
        .await?;

        Ok(reservations)
    }

    pub async fn live_for_item(
        conn: &mut PgConnection,
        item_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Reservation>> {
        let reservation = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT r.* FROM reservations r WHERE r.item_id = $1 AND {} \
             ORDER BY r.created_at DESC LIMIT 1",
            LIVE_FILTER
        ))
        .bind(item_id)
        .bind(now)
        .fetch_optional(conn)
        .await?;

        Ok(reservation)
    }

    pub async fn insert(
        conn: &mut PgConnection,
        reservation: &NewReservation,
    ) -> AppResult<Reservation> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (code, user_id, item_id, start_at, end_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&reservation.code)
        .bind(reservation.user_id)
        .bind(reservation.item_id)
        .bind(reservation.start_at)
        .bind(reservation.end_at)
        .fetch_one(conn)
        .await?;

        Ok(reservation)
    }
}
