//! Named routes used for redirects

use axum::response::Redirect;

/// A page that handlers redirect to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    RealtorList,
    AllAvailable,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::RealtorList => "/realtors",
            Route::AllAvailable => "/listinginstances/available",
        }
    }

    /// `303 See Other` to this route
    pub fn redirect(&self) -> Redirect {
        Redirect::to(self.path())
    }
}
