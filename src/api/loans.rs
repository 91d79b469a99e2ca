//! Loan pages and librarian loan processing

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        listing_instance::ListingInstanceDetails,
        loan_form::{LoanForm, LoanSubmission},
        pagination::{PageQuery, Pagination, PAGE_SIZE},
    },
    services::{loans::LoanOutcome, today},
};

use super::{routes::Route, AuthenticatedUser, PaginatedResponse};

/// Instances on loan to the current user, soonest due first
#[utoipa::path(
    get,
    path = "/mylistings",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "One page of the user's loans", body = crate::api::listings::InstancePage),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn my_listings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<ListingInstanceDetails>>> {
    let pagination = Pagination::new(query, PAGE_SIZE)?;
    let (instances, total) = state
        .services
        .loans
        .my_loans(claims.user_id, &pagination, today())
        .await?;
    Ok(Json(PaginatedResponse::new(instances, total, &pagination)))
}

/// Instances available for loan, by listing title
#[utoipa::path(
    get,
    path = "/listinginstances/available",
    tag = "loans",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of available instances", body = crate::api::listings::InstancePage),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn all_available(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<ListingInstanceDetails>>> {
    let pagination = Pagination::new(query, PAGE_SIZE)?;
    let (instances, total) = state.services.loans.available(&pagination).await?;
    Ok(Json(PaginatedResponse::new(instances, total, &pagination)))
}

/// Loan form for one instance
#[utoipa::path(
    get,
    path = "/listinginstances/{id}/loan",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing instance ID")),
    responses(
        (status = 200, description = "Loan form", body = LoanForm),
        (status = 403, description = "Librarian privileges required"),
        (status = 404, description = "Instance not found")
    )
)]
pub async fn loan_form(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LoanForm>> {
    claims.require_staff()?;

    let form = state.services.loans.loan_form(id).await?;
    Ok(Json(form))
}

/// Lend an instance to the submitted borrower for four weeks
#[utoipa::path(
    post,
    path = "/listinginstances/{id}/loan",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing instance ID")),
    request_body = LoanSubmission,
    responses(
        (status = 303, description = "Lent; redirect to the available instances"),
        (status = 400, description = "Form errors", body = LoanForm),
        (status = 403, description = "Librarian privileges required"),
        (status = 404, description = "Instance not found")
    )
)]
pub async fn process_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(submission): Json<LoanSubmission>,
) -> AppResult<Response> {
    claims.require_staff()?;

    match state.services.loans.process_loan(id, submission, today()).await? {
        LoanOutcome::Lent(_) => Ok(Route::AllAvailable.redirect().into_response()),
        LoanOutcome::Invalid(form) => Ok((StatusCode::BAD_REQUEST, Json(form)).into_response()),
    }
}

/// Mark an instance returned and available
#[utoipa::path(
    post,
    path = "/listinginstances/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Listing instance ID")),
    responses(
        (status = 303, description = "Returned; redirect to the available instances"),
        (status = 403, description = "Librarian privileges required"),
        (status = 404, description = "Instance not found")
    )
)]
pub async fn return_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Redirect> {
    claims.require_staff()?;

    state.services.loans.return_instance(id).await?;
    Ok(Route::AllAvailable.redirect())
}
