//! Listing instances repository

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    admin::DateCondition,
    error::{AppError, AppResult, FOREIGN_KEY_VIOLATION},
    models::{
        listing_instance::{ListingInstance, ListingInstanceDetails, ListingInstanceForm, LoanStatus},
        pagination::Pagination,
    },
};

const DETAILS_COLUMNS: &str = r#"
    i.id, i.listing_id, l.title AS listing_title, i.imprint, i.due_back,
    i.status, i.borrower_id, u.login AS borrower_login
"#;

const DETAILS_JOINS: &str = r#"
    JOIN listings l ON l.id = i.listing_id
    LEFT JOIN users u ON u.id = i.borrower_id
"#;

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Listing instance with id {} not found", id))
}

/// A dangling listing or borrower reference is a form error
fn reference_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            AppError::Validation("Select a valid listing and a valid borrower".to_string())
        }
        _ => AppError::Database(err),
    }
}

#[derive(Clone)]
pub struct ListingInstancesRepository {
    pool: Pool<Postgres>,
}

impl ListingInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get an instance with its listing title and borrower login
    pub async fn get_details(&self, id: Uuid) -> AppResult<ListingInstanceDetails> {
        let query = format!(
            "SELECT {} FROM listing_instances i {} WHERE i.id = $1",
            DETAILS_COLUMNS, DETAILS_JOINS
        );
        sqlx::query_as::<_, ListingInstanceDetails>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Every copy of one listing
    pub async fn for_listing(&self, listing_id: i32) -> AppResult<Vec<ListingInstanceDetails>> {
        let query = format!(
            "SELECT {} FROM listing_instances i {} WHERE i.listing_id = $1 ORDER BY i.imprint, i.id",
            DETAILS_COLUMNS, DETAILS_JOINS
        );
        let rows = sqlx::query_as::<_, ListingInstanceDetails>(&query)
            .bind(listing_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listing_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM listing_instances WHERE status = $1")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// One page of instances in `status`, by parent listing title
    pub async fn list_by_status(
        &self,
        status: LoanStatus,
        pagination: &Pagination,
    ) -> AppResult<Vec<ListingInstanceDetails>> {
        let query = format!(
            "SELECT {} FROM listing_instances i {} WHERE i.status = $1 \
             ORDER BY l.title, i.id LIMIT $2 OFFSET $3",
            DETAILS_COLUMNS, DETAILS_JOINS
        );
        let rows = sqlx::query_as::<_, ListingInstanceDetails>(&query)
            .bind(status)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Number of instances on loan to a borrower
    pub async fn count_on_loan_to(&self, borrower_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM listing_instances WHERE borrower_id = $1 AND status = $2",
        )
        .bind(borrower_id)
        .bind(LoanStatus::OnLoan)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// One page of instances on loan to a borrower, soonest due first
    pub async fn list_on_loan_to(
        &self,
        borrower_id: i32,
        pagination: &Pagination,
    ) -> AppResult<Vec<ListingInstanceDetails>> {
        let query = format!(
            "SELECT {} FROM listing_instances i {} \
             WHERE i.borrower_id = $1 AND i.status = $2 \
             ORDER BY i.due_back ASC, i.id LIMIT $3 OFFSET $4",
            DETAILS_COLUMNS, DETAILS_JOINS
        );
        let rows = sqlx::query_as::<_, ListingInstanceDetails>(&query)
            .bind(borrower_id)
            .bind(LoanStatus::OnLoan)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Lend an instance: borrower, status and due date change in one statement
    pub async fn lend(
        &self,
        id: Uuid,
        borrower_id: i32,
        due_back: NaiveDate,
    ) -> AppResult<ListingInstanceDetails> {
        let query = format!(
            r#"
            WITH i AS (
                UPDATE listing_instances
                SET borrower_id = $1, status = $2, due_back = $3
                WHERE id = $4
                RETURNING *
            )
            SELECT {} FROM i {}
            "#,
            DETAILS_COLUMNS, DETAILS_JOINS
        );
        sqlx::query_as::<_, ListingInstanceDetails>(&query)
            .bind(borrower_id)
            .bind(LoanStatus::OnLoan)
            .bind(due_back)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(reference_error)?
            .ok_or_else(|| not_found(id))
    }

    /// Make an instance available again, clearing the loan term
    pub async fn mark_returned(&self, id: Uuid) -> AppResult<ListingInstanceDetails> {
        let query = format!(
            r#"
            WITH i AS (
                UPDATE listing_instances
                SET borrower_id = NULL, status = $1, due_back = NULL
                WHERE id = $2
                RETURNING *
            )
            SELECT {} FROM i {}
            "#,
            DETAILS_COLUMNS, DETAILS_JOINS
        );
        sqlx::query_as::<_, ListingInstanceDetails>(&query)
            .bind(LoanStatus::Available)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Console change list, filtered by status and due date
    pub async fn list_filtered(
        &self,
        status: Option<LoanStatus>,
        due_back: DateCondition,
    ) -> AppResult<Vec<ListingInstanceDetails>> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if status.is_some() {
            conditions.push(format!("i.status = ${}", idx));
            idx += 1;
        }
        match due_back {
            DateCondition::Unrestricted => {}
            DateCondition::Between(_, _) => {
                conditions.push(format!("i.due_back >= ${} AND i.due_back < ${}", idx, idx + 1));
            }
            DateCondition::IsNull => conditions.push("i.due_back IS NULL".to_string()),
            DateCondition::IsNotNull => conditions.push("i.due_back IS NOT NULL".to_string()),
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {} FROM listing_instances i {} {} ORDER BY l.title, i.id",
            DETAILS_COLUMNS, DETAILS_JOINS, where_clause
        );

        let mut builder = sqlx::query_as::<_, ListingInstanceDetails>(&query);
        if let Some(status) = status {
            builder = builder.bind(status);
        }
        if let DateCondition::Between(start, end) = due_back {
            builder = builder.bind(start).bind(end);
        }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn create(&self, form: &ListingInstanceForm) -> AppResult<ListingInstance> {
        let instance = sqlx::query_as::<_, ListingInstance>(
            r#"
            INSERT INTO listing_instances (id, listing_id, imprint, due_back, status, borrower_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, listing_id, imprint, due_back, status, borrower_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(form.listing_id)
        .bind(&form.imprint)
        .bind(form.due_back)
        .bind(form.status)
        .bind(form.borrower_id)
        .fetch_one(&self.pool)
        .await
        .map_err(reference_error)?;
        Ok(instance)
    }

    pub async fn update(&self, id: Uuid, form: &ListingInstanceForm) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE listing_instances
            SET listing_id = $1, imprint = $2, due_back = $3, status = $4, borrower_id = $5
            WHERE id = $6
            "#,
        )
        .bind(form.listing_id)
        .bind(&form.imprint)
        .bind(form.due_back)
        .bind(form.status)
        .bind(form.borrower_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(reference_error)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM listing_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
