//! Listing (catalogued work) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{genre::Genre, listing_instance::ListingInstanceDetails};

/// Listing row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Listing {
    pub id: i32,
    pub title: String,
    pub realtor_id: i32,
    pub summary: Option<String>,
    pub isbn: Option<String>,
    /// Loaded from `listing_genres`, empty when queried without the join
    #[sqlx(skip)]
    #[serde(default)]
    pub genres: Vec<Genre>,
}

/// Short listing representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ListingShort {
    pub id: i32,
    pub title: String,
    pub realtor_id: i32,
    pub realtor_name: String,
}

/// Listing detail page: the listing, its realtor name, genres and copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListingDetail {
    #[serde(flatten)]
    pub listing: Listing,
    pub realtor_name: String,
    pub instances: Vec<ListingInstanceDetails>,
}

/// Create/update listing request (admin console)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ListingForm {
    #[validate(length(min = 1, max = 200, message = "Title is required (200 characters max)"))]
    pub title: String,
    pub realtor_id: i32,
    pub summary: Option<String>,
    #[validate(length(equal = 13, message = "ISBN must be 13 characters"))]
    pub isbn: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}
