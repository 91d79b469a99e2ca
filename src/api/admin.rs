//! Administrative console endpoints

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    admin::{
        instance_values, project_columns, project_fieldsets, DueBackFilter, FieldsetValues,
        ModelAdminInfo, LISTING_INSTANCE_ADMIN, REGISTRY,
    },
    error::{AppError, AppResult},
    models::{
        genre::{Genre, GenreForm},
        listing::{Listing, ListingForm, ListingShort},
        listing_instance::{ListingInstanceDetails, ListingInstanceForm, LoanStatus},
        realtor::{Realtor, RealtorDeletion, RealtorForm},
        user::{CreateUser, UserShort},
    },
    services::today,
};

use super::AuthenticatedUser;

/// Registered models
#[utoipa::path(
    get,
    path = "/admin",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Console registry", body = Vec<ModelAdminInfo>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn registry(AuthenticatedUser(claims): AuthenticatedUser) -> AppResult<Json<Vec<ModelAdminInfo>>> {
    claims.require_admin()?;
    Ok(Json(REGISTRY.iter().map(ModelAdminInfo::from).collect()))
}

// Listings

#[utoipa::path(
    get,
    path = "/admin/listings",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All listings", body = Vec<ListingShort>))
)]
pub async fn list_listings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<ListingShort>>> {
    claims.require_admin()?;
    Ok(Json(state.services.catalog.list_all_listings().await?))
}

#[utoipa::path(
    get,
    path = "/admin/listings/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing with genres", body = Listing),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn get_listing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Listing>> {
    claims.require_admin()?;
    Ok(Json(state.services.catalog.get_listing(id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/listings",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = ListingForm,
    responses(
        (status = 201, description = "Listing created", body = Listing),
        (status = 400, description = "Invalid listing", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_listing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<ListingForm>,
) -> AppResult<(StatusCode, Json<Listing>)> {
    claims.require_admin()?;
    let listing = state.services.catalog.create_listing(form).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

#[utoipa::path(
    put,
    path = "/admin/listings/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Listing ID")),
    request_body = ListingForm,
    responses(
        (status = 200, description = "Listing updated", body = Listing),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn update_listing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(form): Json<ListingForm>,
) -> AppResult<Json<Listing>> {
    claims.require_admin()?;
    Ok(Json(state.services.catalog.update_listing(id, form).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/listings/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Listing ID")),
    responses(
        (status = 204, description = "Listing and its instances deleted"),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn delete_listing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.catalog.delete_listing(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Realtors

#[utoipa::path(
    get,
    path = "/admin/realtors",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All realtors", body = Vec<Realtor>))
)]
pub async fn list_realtors(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Realtor>>> {
    claims.require_admin()?;
    Ok(Json(state.services.catalog.list_all_realtors().await?))
}

#[utoipa::path(
    get,
    path = "/admin/realtors/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Realtor ID")),
    responses(
        (status = 200, description = "Realtor", body = Realtor),
        (status = 404, description = "Realtor not found")
    )
)]
pub async fn get_realtor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Realtor>> {
    claims.require_admin()?;
    Ok(Json(state.services.catalog.get_realtor(id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/realtors",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = RealtorForm,
    responses(
        (status = 201, description = "Realtor created", body = Realtor),
        (status = 400, description = "Invalid realtor", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_realtor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<RealtorForm>,
) -> AppResult<(StatusCode, Json<Realtor>)> {
    claims.require_admin()?;
    let realtor = state.services.catalog.create_realtor(form).await?;
    Ok((StatusCode::CREATED, Json(realtor)))
}

#[utoipa::path(
    put,
    path = "/admin/realtors/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Realtor ID")),
    request_body = RealtorForm,
    responses(
        (status = 200, description = "Realtor updated", body = Realtor),
        (status = 404, description = "Realtor not found")
    )
)]
pub async fn update_realtor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(form): Json<RealtorForm>,
) -> AppResult<Json<Realtor>> {
    claims.require_admin()?;
    Ok(Json(state.services.catalog.update_realtor(id, form).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/realtors/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Realtor ID")),
    responses(
        (status = 204, description = "Realtor deleted"),
        (status = 404, description = "Realtor not found"),
        (status = 409, description = "Listings exist for this realtor", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_realtor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    let (realtor, outcome) = state.services.catalog.delete_realtor(id).await?;
    let message = outcome.message(&realtor.display_name());
    match outcome {
        RealtorDeletion::Deleted => Ok(StatusCode::NO_CONTENT),
        RealtorDeletion::HasDependents { .. } => Err(AppError::Conflict(message)),
        RealtorDeletion::Failed(cause) => Err(AppError::Internal(format!("{}: {}", message, cause))),
    }
}

// Genres

#[utoipa::path(
    get,
    path = "/admin/genres",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All genres", body = Vec<Genre>))
)]
pub async fn list_genres(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Genre>>> {
    claims.require_admin()?;
    Ok(Json(state.services.catalog.list_genres().await?))
}

#[utoipa::path(
    get,
    path = "/admin/genres/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre", body = Genre),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn get_genre(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Genre>> {
    claims.require_admin()?;
    Ok(Json(state.services.catalog.get_genre(id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/genres",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = GenreForm,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 409, description = "Genre already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_genre(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<GenreForm>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    claims.require_admin()?;
    let genre = state.services.catalog.create_genre(form).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

#[utoipa::path(
    put,
    path = "/admin/genres/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    request_body = GenreForm,
    responses(
        (status = 200, description = "Genre updated", body = Genre),
        (status = 404, description = "Genre not found"),
        (status = 409, description = "Genre already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_genre(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(form): Json<GenreForm>,
) -> AppResult<Json<Genre>> {
    claims.require_admin()?;
    Ok(Json(state.services.catalog.update_genre(id, form).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/genres/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn delete_genre(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.catalog.delete_genre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Listing instances

/// Change list filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InstanceFilterQuery {
    /// Status code: m, o, a or r
    #[param(value_type = Option<String>)]
    pub status: Option<LoanStatus>,
    /// any, today, past_7_days, this_month, this_year, no_date or has_date
    #[param(value_type = Option<String>)]
    pub due_back: Option<DueBackFilter>,
}

/// Instance change list, projected onto the configured columns
#[derive(Serialize, ToSchema)]
pub struct InstanceChangeList {
    pub columns: Vec<String>,
    pub filters: Vec<String>,
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<BTreeMap<String, Value>>,
}

/// Instance change form, grouped by the configured fieldsets
#[derive(Serialize, ToSchema)]
pub struct InstanceChangeView {
    pub instance: ListingInstanceDetails,
    pub fieldsets: Vec<FieldsetValues>,
}

impl From<ListingInstanceDetails> for InstanceChangeView {
    fn from(instance: ListingInstanceDetails) -> Self {
        let fieldsets = project_fieldsets(&LISTING_INSTANCE_ADMIN, &instance_values(&instance));
        Self { instance, fieldsets }
    }
}

#[utoipa::path(
    get,
    path = "/admin/listinginstances",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(InstanceFilterQuery),
    responses((status = 200, description = "Filtered instances", body = InstanceChangeList))
)]
pub async fn list_instances(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<InstanceFilterQuery>,
) -> AppResult<Json<InstanceChangeList>> {
    claims.require_admin()?;

    let instances = state
        .services
        .loans
        .list_instances(query.status, query.due_back.unwrap_or_default(), today())
        .await?;

    let columns = LISTING_INSTANCE_ADMIN.list_display;
    Ok(Json(InstanceChangeList {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        filters: LISTING_INSTANCE_ADMIN
            .list_filter
            .iter()
            .map(|f| f.to_string())
            .collect(),
        rows: instances
            .iter()
            .map(|i| project_columns(columns, &instance_values(i)))
            .collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/admin/listinginstances/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing instance ID")),
    responses(
        (status = 200, description = "Instance change form", body = InstanceChangeView),
        (status = 404, description = "Instance not found")
    )
)]
pub async fn get_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<InstanceChangeView>> {
    claims.require_admin()?;
    let instance = state.services.loans.get_instance(id, today()).await?;
    Ok(Json(instance.into()))
}

#[utoipa::path(
    post,
    path = "/admin/listinginstances",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = ListingInstanceForm,
    responses(
        (status = 201, description = "Instance created", body = InstanceChangeView),
        (status = 400, description = "Invalid instance", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<ListingInstanceForm>,
) -> AppResult<(StatusCode, Json<InstanceChangeView>)> {
    claims.require_admin()?;
    let instance = state.services.loans.create_instance(form, today()).await?;
    Ok((StatusCode::CREATED, Json(instance.into())))
}

#[utoipa::path(
    put,
    path = "/admin/listinginstances/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing instance ID")),
    request_body = ListingInstanceForm,
    responses(
        (status = 200, description = "Instance updated", body = InstanceChangeView),
        (status = 400, description = "Invalid instance", body = crate::error::ErrorResponse),
        (status = 404, description = "Instance not found")
    )
)]
pub async fn update_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(form): Json<ListingInstanceForm>,
) -> AppResult<Json<InstanceChangeView>> {
    claims.require_admin()?;
    let instance = state.services.loans.update_instance(id, form, today()).await?;
    Ok(Json(instance.into()))
}

#[utoipa::path(
    delete,
    path = "/admin/listinginstances/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing instance ID")),
    responses(
        (status = 204, description = "Instance deleted"),
        (status = 404, description = "Instance not found")
    )
)]
pub async fn delete_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;
    state.services.loans.delete_instance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Users

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "All users", body = Vec<UserShort>))
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<UserShort>>> {
    claims.require_admin()?;
    Ok(Json(state.services.users.list().await?))
}

#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserShort),
        (status = 400, description = "Invalid user", body = crate::error::ErrorResponse),
        (status = 409, description = "Login already taken", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(user): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<UserShort>)> {
    claims.require_admin()?;
    let created = state.services.users.create_user(user).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_change_view_groups_by_fieldset() {
        let instance = ListingInstanceDetails {
            id: Uuid::nil(),
            listing_id: 4,
            listing_title: "The Dispossessed".to_string(),
            imprint: "Harper & Row, 1974".to_string(),
            due_back: NaiveDate::from_ymd_opt(2024, 3, 1),
            status: LoanStatus::OnLoan,
            borrower_id: Some(2),
            borrower_login: Some("jdoe".to_string()),
            is_overdue: false,
        };

        let view = InstanceChangeView::from(instance);
        assert_eq!(view.fieldsets.len(), 2);
        assert_eq!(view.fieldsets[0].name, None);
        assert_eq!(view.fieldsets[0].fields["listing"], "The Dispossessed");
        assert_eq!(view.fieldsets[1].name.as_deref(), Some("Availability"));
        assert_eq!(view.fieldsets[1].fields["status"], "o");
        assert_eq!(view.fieldsets[1].fields["borrower"], "jdoe");
    }

    #[test]
    fn test_filter_query_parses_codes() {
        let query: InstanceFilterQuery =
            serde_json::from_str(r#"{"status": "a", "due_back": "past_7_days"}"#).unwrap();
        assert_eq!(query.status, Some(LoanStatus::Available));
        assert_eq!(query.due_back, Some(DueBackFilter::Past7Days));
    }
}
