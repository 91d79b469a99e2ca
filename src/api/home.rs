//! Home page

use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

use super::{save_session, CurrentSession};

/// Home page context
#[derive(Serialize, ToSchema)]
pub struct HomePage {
    pub num_listings: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_realtors: i64,
    /// Visits to this page earlier in the session
    pub num_visits: i64,
}

/// Catalog counts and the session visit counter
#[utoipa::path(
    get,
    path = "/",
    tag = "catalog",
    responses(
        (status = 200, description = "Home page", body = HomePage)
    )
)]
pub async fn index(
    State(state): State<crate::AppState>,
    CurrentSession(mut session): CurrentSession,
) -> AppResult<(CookieJar, Json<HomePage>)> {
    let counts = state.services.catalog.home_counts().await?;
    let num_visits = session.data.record_visit();
    let jar = save_session(&state, &session).await?;

    Ok((
        jar,
        Json(HomePage {
            num_listings: counts.num_listings,
            num_instances: counts.num_instances,
            num_instances_available: counts.num_instances_available,
            num_realtors: counts.num_realtors,
            num_visits,
        }),
    ))
}
