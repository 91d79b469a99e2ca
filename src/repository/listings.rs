//! Listings repository

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult, FOREIGN_KEY_VIOLATION},
    models::{
        listing::{Listing, ListingForm, ListingShort},
        pagination::Pagination,
    },
};

const LISTING_SHORT_SELECT: &str = r#"
    SELECT l.id, l.title, l.realtor_id,
           r.first_name || ' ' || r.last_name AS realtor_name
    FROM listings l
    JOIN realtors r ON r.id = l.realtor_id
"#;

/// A dangling realtor or genre reference is a form error, not a server error
fn reference_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            AppError::Validation("Select a valid realtor and valid genres".to_string())
        }
        _ => AppError::Database(err),
    }
}

#[derive(Clone)]
pub struct ListingsRepository {
    pool: Pool<Postgres>,
}

impl ListingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get listing by ID (genres not loaded)
    pub async fn get_by_id(&self, id: i32) -> AppResult<Listing> {
        sqlx::query_as::<_, Listing>(
            "SELECT id, title, realtor_id, summary, isbn FROM listings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing with id {} not found", id)))
    }

    /// One page of listings ordered by title
    pub async fn list(&self, pagination: &Pagination) -> AppResult<Vec<ListingShort>> {
        let query = format!("{} ORDER BY l.title, l.id LIMIT $1 OFFSET $2", LISTING_SHORT_SELECT);
        let listings = sqlx::query_as::<_, ListingShort>(&query)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(listings)
    }

    /// Every listing ordered by title
    pub async fn list_all(&self) -> AppResult<Vec<ListingShort>> {
        let query = format!("{} ORDER BY l.title, l.id", LISTING_SHORT_SELECT);
        let listings = sqlx::query_as::<_, ListingShort>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(listings)
    }

    /// Listings written by one realtor
    pub async fn by_realtor(&self, realtor_id: i32) -> AppResult<Vec<ListingShort>> {
        let query = format!(
            "{} WHERE l.realtor_id = $1 ORDER BY l.title, l.id",
            LISTING_SHORT_SELECT
        );
        let listings = sqlx::query_as::<_, ListingShort>(&query)
            .bind(realtor_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(listings)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Create a listing with its genres
    pub async fn create(&self, form: &ListingForm) -> AppResult<Listing> {
        let mut tx = self.pool.begin().await?;

        let listing = sqlx::query_as::<_, Listing>(
            r#"
            INSERT INTO listings (title, realtor_id, summary, isbn)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, realtor_id, summary, isbn
            "#,
        )
        .bind(&form.title)
        .bind(form.realtor_id)
        .bind(&form.summary)
        .bind(&form.isbn)
        .fetch_one(&mut *tx)
        .await
        .map_err(reference_error)?;

        Self::replace_genres(&mut tx, listing.id, &form.genre_ids).await?;
        tx.commit().await?;

        Ok(listing)
    }

    /// Update a listing and replace its genres
    pub async fn update(&self, id: i32, form: &ListingForm) -> AppResult<Listing> {
        let mut tx = self.pool.begin().await?;

        let listing = sqlx::query_as::<_, Listing>(
            r#"
            UPDATE listings
            SET title = $1, realtor_id = $2, summary = $3, isbn = $4
            WHERE id = $5
            RETURNING id, title, realtor_id, summary, isbn
            "#,
        )
        .bind(&form.title)
        .bind(form.realtor_id)
        .bind(&form.summary)
        .bind(&form.isbn)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(reference_error)?
        .ok_or_else(|| AppError::NotFound(format!("Listing with id {} not found", id)))?;

        Self::replace_genres(&mut tx, id, &form.genre_ids).await?;
        tx.commit().await?;

        Ok(listing)
    }

    async fn replace_genres(
        tx: &mut Transaction<'_, Postgres>,
        listing_id: i32,
        genre_ids: &[i32],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM listing_genres WHERE listing_id = $1")
            .bind(listing_id)
            .execute(&mut **tx)
            .await?;

        if !genre_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO listing_genres (listing_id, genre_id)
                SELECT $1, g FROM UNNEST($2::int[]) AS g
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(listing_id)
            .bind(genre_ids)
            .execute(&mut **tx)
            .await
            .map_err(reference_error)?;
        }
        Ok(())
    }

    /// Delete a listing; its instances go with it
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::from_constraint(e, format!("Listing {} is referenced by other records", id))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Listing with id {} not found", id)));
        }
        Ok(())
    }
}
