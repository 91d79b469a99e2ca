//! Repository layer for database operations

pub mod genres;
pub mod listing_instances;
pub mod listings;
pub mod realtors;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub listings: listings::ListingsRepository,
    pub realtors: realtors::RealtorsRepository,
    pub genres: genres::GenresRepository,
    pub instances: listing_instances::ListingInstancesRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            listings: listings::ListingsRepository::new(pool.clone()),
            realtors: realtors::RealtorsRepository::new(pool.clone()),
            genres: genres::GenresRepository::new(pool.clone()),
            instances: listing_instances::ListingInstancesRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
