//! API handlers for the catalog endpoints

pub mod admin;
pub mod auth;
pub mod health;
pub mod home;
pub mod listings;
pub mod loans;
pub mod openapi;
pub mod realtors;
pub mod routes;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    error::{AppError, AppResult},
    models::user::UserClaims,
    services::sessions::Session,
    AppState,
};

pub use listings::PaginatedResponse;

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Extractor for the caller's session, loaded from the session cookie.
///
/// Handlers that change the session must hand it to [`save_session`] and
/// return the resulting jar with their response.
pub struct CurrentSession(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let sessions = &state.services.sessions;
        let session = sessions
            .load(jar.get(sessions.cookie_name()).map(|c| c.value()))
            .await?;
        Ok(CurrentSession(session))
    }
}

/// Persist a session and return the jar carrying its cookie
pub async fn save_session(state: &AppState, session: &Session) -> AppResult<CookieJar> {
    let cookie = state.services.sessions.save(session).await?;
    Ok(CookieJar::new().add(cookie))
}
