//! Realtors repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::Pagination,
        realtor::{Realtor, RealtorForm},
    },
};

#[derive(Clone)]
pub struct RealtorsRepository {
    pool: Pool<Postgres>,
}

impl RealtorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get realtor by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Realtor> {
        sqlx::query_as::<_, Realtor>("SELECT * FROM realtors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Realtor with id {} not found", id)))
    }

    /// One page of realtors, by last then first name
    pub async fn list(&self, pagination: &Pagination) -> AppResult<Vec<Realtor>> {
        let realtors = sqlx::query_as::<_, Realtor>(
            "SELECT * FROM realtors ORDER BY last_name, first_name, id LIMIT $1 OFFSET $2",
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(realtors)
    }

    /// Every realtor, by last then first name
    pub async fn list_all(&self) -> AppResult<Vec<Realtor>> {
        let realtors = sqlx::query_as::<_, Realtor>(
            "SELECT * FROM realtors ORDER BY last_name, first_name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(realtors)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM realtors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn create(&self, form: &RealtorForm) -> AppResult<Realtor> {
        let realtor = sqlx::query_as::<_, Realtor>(
            r#"
            INSERT INTO realtors (first_name, last_name, date_of_birth, date_of_death, author_image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&form.first_name)
        .bind(&form.last_name)
        .bind(form.date_of_birth)
        .bind(form.date_of_death)
        .bind(&form.author_image)
        .fetch_one(&self.pool)
        .await?;
        Ok(realtor)
    }

    pub async fn update(&self, id: i32, form: &RealtorForm) -> AppResult<Realtor> {
        sqlx::query_as::<_, Realtor>(
            r#"
            UPDATE realtors
            SET first_name = $1, last_name = $2, date_of_birth = $3,
                date_of_death = $4, author_image = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&form.first_name)
        .bind(&form.last_name)
        .bind(form.date_of_birth)
        .bind(form.date_of_death)
        .bind(&form.author_image)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Realtor with id {} not found", id)))
    }

    /// Number of listings referencing the realtor
    pub async fn count_listings(&self, id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings WHERE realtor_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Delete a realtor. A listing added since the caller's dependents check
    /// still trips the foreign key, which surfaces as a conflict.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM realtors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::from_constraint(e, format!("Listings exist for realtor {}", id))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Realtor with id {} not found", id)));
        }
        Ok(())
    }
}
