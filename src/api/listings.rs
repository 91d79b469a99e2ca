//! Listing pages

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        listing::{ListingDetail, ListingShort},
        listing_instance::ListingInstanceDetails,
        pagination::{PageQuery, Pagination, PAGE_SIZE},
    },
    services::today,
};

use super::AuthenticatedUser;

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
#[aliases(
    ListingPage = PaginatedResponse<ListingShort>,
    InstancePage = PaginatedResponse<ListingInstanceDetails>
)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Rows on this page
    pub items: Vec<T>,
    /// Total number of rows
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Rows per page
    pub per_page: i64,
    /// Number of pages
    pub num_pages: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, pagination: &Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
            num_pages: pagination.num_pages(total),
        }
    }
}

/// List listings by title
#[utoipa::path(
    get,
    path = "/listings",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "One page of listings", body = ListingPage),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_listings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<ListingShort>>> {
    let pagination = Pagination::new(query, PAGE_SIZE)?;
    let (listings, total) = state.services.catalog.list_listings(&pagination).await?;
    Ok(Json(PaginatedResponse::new(listings, total, &pagination)))
}

/// Listing detail with genres and copies
#[utoipa::path(
    get,
    path = "/listings/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing", body = ListingDetail),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn get_listing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ListingDetail>> {
    let listing = state.services.catalog.get_listing_detail(id, today()).await?;
    Ok(Json(listing))
}
