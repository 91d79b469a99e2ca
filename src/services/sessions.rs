//! Redis-backed session store
//!
//! Handlers receive the session explicitly, change it, and hand it back to
//! [`SessionService::save`], which writes it and returns the cookie to set.

use axum_extra::extract::cookie::{Cookie, SameSite};
use redis::{AsyncCommands, Client};
use uuid::Uuid;

use crate::{
    config::SessionConfig,
    error::{AppError, AppResult},
    models::session::SessionData,
};

/// A loaded session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub data: SessionData,
}

impl Session {
    /// Fresh session with a new random identifier
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            data: SessionData::default(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn session_key(id: &Uuid) -> String {
    format!("session:{}", id)
}

#[derive(Clone)]
pub struct SessionService {
    client: Client,
    config: SessionConfig,
}

impl SessionService {
    /// Create a new session service, checking the connection
    pub async fn new(url: &str, config: SessionConfig) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Load the session named by the cookie value. Unknown, expired or
    /// malformed identifiers start a new session under a new identifier.
    pub async fn load(&self, cookie_value: Option<&str>) -> AppResult<Session> {
        let Some(id) = cookie_value.and_then(|v| Uuid::parse_str(v).ok()) else {
            return Ok(Session::new());
        };

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let stored: Option<String> = conn.get(session_key(&id)).await?;

        match stored {
            Some(json) => match serde_json::from_str::<SessionData>(&json) {
                Ok(data) => Ok(Session { id, data }),
                Err(e) => {
                    tracing::warn!("Discarding unreadable session {}: {}", id, e);
                    Ok(Session::new())
                }
            },
            None => Ok(Session::new()),
        }
    }

    /// Persist the session, refreshing its expiry, and build its cookie
    pub async fn save(&self, session: &Session) -> AppResult<Cookie<'static>> {
        let json = serde_json::to_string(&session.data)
            .map_err(|e| AppError::Internal(format!("Failed to encode session: {}", e)))?;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(session_key(&session.id), json, self.config.ttl_seconds)
            .await?;

        Ok(self.cookie(session))
    }

    fn cookie(&self, session: &Session) -> Cookie<'static> {
        Cookie::build((self.config.cookie_name.clone(), session.id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key() {
        let id = Uuid::nil();
        assert_eq!(session_key(&id), "session:00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_new_sessions_are_distinct_and_empty() {
        let a = Session::new();
        let b = Session::new();
        assert_ne!(a.id, b.id);
        assert_eq!(a.data, SessionData::default());
    }
}
