//! Realtor pages and realtor create/update/delete

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        pagination::{PageQuery, Pagination, PAGE_SIZE},
        realtor::{Realtor, RealtorDeletion, RealtorDetail, RealtorForm},
        session::{FlashMessage, MessageLevel},
    },
};

use super::{routes::Route, save_session, AuthenticatedUser, CurrentSession};

/// Realtor list page: one page of realtors and the pending messages
#[derive(Serialize, ToSchema)]
pub struct RealtorListPage {
    pub items: Vec<Realtor>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub num_pages: i64,
    pub messages: Vec<FlashMessage>,
}

/// List realtors by last and first name
#[utoipa::path(
    get,
    path = "/realtors",
    tag = "realtors",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "One page of realtors", body = RealtorListPage),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_realtors(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    CurrentSession(mut session): CurrentSession,
    Query(query): Query<PageQuery>,
) -> AppResult<(CookieJar, Json<RealtorListPage>)> {
    let pagination = Pagination::new(query, PAGE_SIZE)?;
    let (realtors, total) = state.services.catalog.list_realtors(&pagination).await?;

    let messages = session.data.take_messages();
    let jar = save_session(&state, &session).await?;

    Ok((
        jar,
        Json(RealtorListPage {
            items: realtors,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
            num_pages: pagination.num_pages(total),
            messages,
        }),
    ))
}

/// Realtor detail with their listings
#[utoipa::path(
    get,
    path = "/realtors/{id}",
    tag = "realtors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Realtor ID")),
    responses(
        (status = 200, description = "Realtor", body = RealtorDetail),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Realtor not found")
    )
)]
pub async fn get_realtor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<RealtorDetail>> {
    let realtor = state.services.catalog.get_realtor_detail(id).await?;
    Ok(Json(realtor))
}

/// Create a realtor, then go to the realtor list
#[utoipa::path(
    post,
    path = "/realtors",
    tag = "realtors",
    security(("bearer_auth" = [])),
    request_body = RealtorForm,
    responses(
        (status = 303, description = "Created; redirect to the realtor list"),
        (status = 400, description = "Invalid realtor", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn create_realtor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<RealtorForm>,
) -> AppResult<Redirect> {
    claims.require_staff()?;

    state.services.catalog.create_realtor(form).await?;
    Ok(Route::RealtorList.redirect())
}

/// Update a realtor, then go to the realtor list
#[utoipa::path(
    put,
    path = "/realtors/{id}",
    tag = "realtors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Realtor ID")),
    request_body = RealtorForm,
    responses(
        (status = 303, description = "Updated; redirect to the realtor list"),
        (status = 400, description = "Invalid realtor", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarian privileges required"),
        (status = 404, description = "Realtor not found")
    )
)]
pub async fn update_realtor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(form): Json<RealtorForm>,
) -> AppResult<Redirect> {
    claims.require_staff()?;

    state.services.catalog.update_realtor(id, form).await?;
    Ok(Route::RealtorList.redirect())
}

/// Delete a realtor unless listings reference them.
///
/// The outcome is left as a message in the session; the client is always sent
/// back to the realtor list.
#[utoipa::path(
    delete,
    path = "/realtors/{id}",
    tag = "realtors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Realtor ID")),
    responses(
        (status = 303, description = "Redirect to the realtor list"),
        (status = 403, description = "Librarian privileges required"),
        (status = 404, description = "Realtor not found")
    )
)]
pub async fn delete_realtor(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    CurrentSession(mut session): CurrentSession,
    Path(id): Path<i32>,
) -> AppResult<(CookieJar, Redirect)> {
    claims.require_staff()?;

    let (realtor, outcome) = state.services.catalog.delete_realtor(id).await?;
    let level = match outcome {
        RealtorDeletion::Deleted => MessageLevel::Success,
        RealtorDeletion::HasDependents { .. } | RealtorDeletion::Failed(_) => MessageLevel::Error,
    };
    session
        .data
        .push_message(level, outcome.message(&realtor.display_name()));

    let jar = save_session(&state, &session).await?;
    Ok((jar, Route::RealtorList.redirect()))
}
