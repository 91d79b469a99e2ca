//! Catalog service: listings, realtors and genres

use chrono::NaiveDate;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        genre::{Genre, GenreForm},
        listing::{Listing, ListingDetail, ListingForm, ListingShort},
        listing_instance::LoanStatus,
        pagination::Pagination,
        realtor::{Realtor, RealtorDeletion, RealtorDetail, RealtorForm},
    },
    repository::Repository,
};

/// Row counts shown on the home page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomeCounts {
    pub num_listings: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_realtors: i64,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn home_counts(&self) -> AppResult<HomeCounts> {
        Ok(HomeCounts {
            num_listings: self.repository.listings.count().await?,
            num_instances: self.repository.instances.count().await?,
            num_instances_available: self
                .repository
                .instances
                .count_by_status(LoanStatus::Available)
                .await?,
            num_realtors: self.repository.realtors.count().await?,
        })
    }

    // Listings

    /// One page of listings with the total count
    pub async fn list_listings(&self, pagination: &Pagination) -> AppResult<(Vec<ListingShort>, i64)> {
        let total = self.repository.listings.count().await?;
        pagination.ensure_in_range(total)?;
        let listings = self.repository.listings.list(pagination).await?;
        Ok((listings, total))
    }

    pub async fn list_all_listings(&self) -> AppResult<Vec<ListingShort>> {
        self.repository.listings.list_all().await
    }

    /// Get a listing with its genres loaded
    pub async fn get_listing(&self, id: i32) -> AppResult<Listing> {
        let mut listing = self.repository.listings.get_by_id(id).await?;
        listing.genres = self.repository.genres.for_listing(id).await?;
        Ok(listing)
    }

    /// Listing detail page: genres, realtor name and every copy
    pub async fn get_listing_detail(&self, id: i32, today: NaiveDate) -> AppResult<ListingDetail> {
        let listing = self.get_listing(id).await?;
        let realtor = self.repository.realtors.get_by_id(listing.realtor_id).await?;
        let instances = self
            .repository
            .instances
            .for_listing(id)
            .await?
            .into_iter()
            .map(|i| i.with_overdue(today))
            .collect();

        Ok(ListingDetail {
            realtor_name: realtor.display_name(),
            listing,
            instances,
        })
    }

    pub async fn create_listing(&self, form: ListingForm) -> AppResult<Listing> {
        form.validate()?;
        let created = self.repository.listings.create(&form).await?;
        tracing::info!("Created listing {} ({})", created.id, created.title);
        self.get_listing(created.id).await
    }

    pub async fn update_listing(&self, id: i32, form: ListingForm) -> AppResult<Listing> {
        form.validate()?;
        self.repository.listings.update(id, &form).await?;
        self.get_listing(id).await
    }

    pub async fn delete_listing(&self, id: i32) -> AppResult<()> {
        self.repository.listings.delete(id).await?;
        tracing::info!("Deleted listing {}", id);
        Ok(())
    }

    // Realtors

    /// One page of realtors with the total count
    pub async fn list_realtors(&self, pagination: &Pagination) -> AppResult<(Vec<Realtor>, i64)> {
        let total = self.repository.realtors.count().await?;
        pagination.ensure_in_range(total)?;
        let realtors = self.repository.realtors.list(pagination).await?;
        Ok((realtors, total))
    }

    pub async fn list_all_realtors(&self) -> AppResult<Vec<Realtor>> {
        self.repository.realtors.list_all().await
    }

    pub async fn get_realtor(&self, id: i32) -> AppResult<Realtor> {
        self.repository.realtors.get_by_id(id).await
    }

    /// Realtor detail page with the realtor's listings
    pub async fn get_realtor_detail(&self, id: i32) -> AppResult<RealtorDetail> {
        let realtor = self.repository.realtors.get_by_id(id).await?;
        let listings = self.repository.listings.by_realtor(id).await?;
        Ok(RealtorDetail { realtor, listings })
    }

    pub async fn create_realtor(&self, form: RealtorForm) -> AppResult<Realtor> {
        form.validate()?;
        let realtor = self.repository.realtors.create(&form).await?;
        tracing::info!("Created realtor {} ({})", realtor.id, realtor.display_name());
        Ok(realtor)
    }

    pub async fn update_realtor(&self, id: i32, form: RealtorForm) -> AppResult<Realtor> {
        form.validate()?;
        self.repository.realtors.update(id, &form).await
    }

    /// Try to delete a realtor.
    ///
    /// A missing realtor is an error. Once the realtor is loaded, every other
    /// result is reported as a [`RealtorDeletion`] so the caller can tell the
    /// user what happened.
    pub async fn delete_realtor(&self, id: i32) -> AppResult<(Realtor, RealtorDeletion)> {
        let realtor = self.repository.realtors.get_by_id(id).await?;

        let listings = self.repository.realtors.count_listings(id).await?;
        if listings > 0 {
            tracing::info!(
                "Refused to delete realtor {}: {} listing(s) reference it",
                id,
                listings
            );
            return Ok((realtor, RealtorDeletion::HasDependents { listings }));
        }

        let outcome = match self.repository.realtors.delete(id).await {
            Ok(()) => {
                tracing::info!("Deleted realtor {} ({})", id, realtor.display_name());
                RealtorDeletion::Deleted
            }
            // A listing was added after the check above
            Err(AppError::Conflict(_)) => {
                blocked_deletion(id, self.repository.realtors.count_listings(id).await)
            }
            Err(e) => {
                tracing::error!("Failed to delete realtor {}: {}", id, e);
                RealtorDeletion::Failed(e.to_string())
            }
        };
        Ok((realtor, outcome))
    }

    // Genres

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list_all().await
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        self.repository.genres.get_by_id(id).await
    }

    pub async fn create_genre(&self, form: GenreForm) -> AppResult<Genre> {
        form.validate()?;
        self.repository.genres.create(form.name.trim()).await
    }

    pub async fn update_genre(&self, id: i32, form: GenreForm) -> AppResult<Genre> {
        form.validate()?;
        self.repository.genres.update(id, form.name.trim()).await
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        self.repository.genres.delete(id).await
    }
}

/// Outcome of a delete refused by the listing foreign key
fn blocked_deletion(id: i32, recount: AppResult<i64>) -> RealtorDeletion {
    let listings = match recount {
        Ok(listings) => listings,
        Err(e) => {
            tracing::warn!("Failed to count listings of realtor {} after a refused delete: {}", id, e);
            0
        }
    };
    RealtorDeletion::HasDependents { listings }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_deletion_reports_listing_count() {
        assert_eq!(
            blocked_deletion(7, Ok(3)),
            RealtorDeletion::HasDependents { listings: 3 }
        );
    }

    #[test]
    fn test_blocked_deletion_survives_recount_failure() {
        let outcome = blocked_deletion(7, Err(AppError::Internal("connection reset".to_string())));
        assert_eq!(outcome, RealtorDeletion::HasDependents { listings: 0 });
    }
}
