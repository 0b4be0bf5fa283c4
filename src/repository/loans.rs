//! Loans repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookShort,
        loan::{Loan, LoanDetails, LoanStatus, NewLoan},
    },
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Loan history of a user with title info, newest first.
    /// Status is the effective status at `now`; stored rows are not touched.
    pub async fn list_for_user(&self, user_id: i32, now: DateTime<Utc>) -> AppResult<Vec<LoanDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT l.*, b.isbn, b.title, b.author, b.cover_url
            FROM loans l
            JOIN items i ON i.id = l.item_id
            JOIN books b ON b.isbn = i.isbn
            WHERE l.user_id = $1
            ORDER BY l.start_at DESC, l.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            let loan = Loan {
                id: row.get("id"),
                code: row.get("code"),
                reservation_id: row.get("reservation_id"),
                user_id: row.get("user_id"),
                item_id: row.get("item_id"),
                start_at: row.get("start_at"),
                due_at: row.get("due_at"),
                returned_at: row.get("returned_at"),
                status: row.get("status"),
                created_at: row.get("created_at"),
            };

            result.push(LoanDetails {
                status: loan.effective_status(now),
                is_overdue: loan.is_overdue_at(now),
                id: loan.id,
                code: loan.code,
                reservation_id: loan.reservation_id,
                item_id: loan.item_id,
                start_at: loan.start_at,
                due_at: loan.due_at,
                returned_at: loan.returned_at,
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

    /// Read a loan and hold its row lock until the transaction ends
    pub async fn lock(conn: &mut PgConnection, id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(loan)
    }

    /// Any not-yet-returned loan of the user on a copy of this title
    pub async fn outstanding_for_title(
        conn: &mut PgConnection,
        user_id: i32,
        isbn: &str,
    ) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            SELECT l.* FROM loans l
            JOIN items i ON i.id = l.item_id
            WHERE l.user_id = $1 AND i.isbn = $2
              AND l.status <> 'returned' AND l.returned_at IS NULL
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(isbn)
        .fetch_optional(conn)
        .await?;

        Ok(loan)
    }

    pub async fn insert(conn: &mut PgConnection, loan: &NewLoan) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (code, reservation_id, user_id, item_id, start_at, due_at, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&loan.code)
        .bind(loan.reservation_id)
        .bind(loan.user_id)
        .bind(loan.item_id)
        .bind(loan.start_at)
        .bind(loan.due_at)
        .bind(LoanStatus::Active)
        .fetch_one(conn)
        .await?;

        Ok(loan)
    }

    pub async fn mark_returned(
        conn: &mut PgConnection,
        id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            "UPDATE loans SET status = $2, returned_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(LoanStatus::Returned)
        .bind(returned_at)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Flag active loans strictly past due
    pub async fn flag_overdue(conn: &mut PgConnection, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE loans SET status = $2 WHERE status = $3 AND returned_at IS NULL AND due_at < $1",
        )
        .bind(now)
        .bind(LoanStatus::Overdue)
        .bind(LoanStatus::Active)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }
}
