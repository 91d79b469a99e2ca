//! Business logic services

pub mod catalog;
pub mod loans;
pub mod sessions;
pub mod users;

use chrono::NaiveDate;

use crate::{config::AuthConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub sessions: sessions::SessionService,
}

impl Services {
    /// Create all services with the given repository
    pub async fn new(
        repository: Repository,
        auth_config: AuthConfig,
        session_service: sessions::SessionService,
    ) -> AppResult<Self> {
        Ok(Self {
            users: users::UsersService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone()),
            sessions: session_service,
            repository,
        })
    }
}

/// Local calendar date used for due dates and overdue checks
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
