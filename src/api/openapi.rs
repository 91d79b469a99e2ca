//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, auth, health, home, listings, loans, realtors};

/// Registers the `bearer_auth` scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = "Library catalog: listings, realtors, copies and loans",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Catalog
        home::index,
        listings::list_listings,
        listings::get_listing,
        // Realtors
        realtors::list_realtors,
        realtors::get_realtor,
        realtors::create_realtor,
        realtors::update_realtor,
        realtors::delete_realtor,
        // Loans
        loans::my_listings,
        loans::all_available,
        loans::loan_form,
        loans::process_loan,
        loans::return_instance,
        // Admin
        admin::registry,
        admin::list_listings,
        admin::get_listing,
        admin::create_listing,
        admin::update_listing,
        admin::delete_listing,
        admin::list_realtors,
        admin::get_realtor,
        admin::create_realtor,
        admin::update_realtor,
        admin::delete_realtor,
        admin::list_genres,
        admin::get_genre,
        admin::create_genre,
        admin::update_genre,
        admin::delete_genre,
        admin::list_instances,
        admin::get_instance,
        admin::create_instance,
        admin::update_instance,
        admin::delete_instance,
        admin::list_users,
        admin::create_user,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            // Catalog
            home::HomePage,
            listings::ListingPage,
            listings::InstancePage,
            crate::models::listing::Listing,
            crate::models::listing::ListingShort,
            crate::models::listing::ListingDetail,
            crate::models::listing::ListingForm,
            crate::models::genre::Genre,
            crate::models::genre::GenreForm,
            // Realtors
            realtors::RealtorListPage,
            crate::models::realtor::Realtor,
            crate::models::realtor::RealtorDetail,
            crate::models::realtor::RealtorForm,
            crate::models::session::FlashMessage,
            crate::models::session::MessageLevel,
            // Loans
            crate::models::listing_instance::LoanStatus,
            crate::models::listing_instance::ListingInstanceDetails,
            crate::models::listing_instance::ListingInstanceForm,
            crate::models::loan_form::LoanForm,
            crate::models::loan_form::LoanSubmission,
            // Users
            crate::models::user::UserShort,
            crate::models::user::CreateUser,
            crate::models::user::AccountTypeSlug,
            // Admin
            crate::admin::ModelAdminInfo,
            crate::admin::FieldsetInfo,
            crate::admin::FieldsetValues,
            admin::InstanceChangeList,
            admin::InstanceChangeView,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "catalog", description = "Home page and listings"),
        (name = "realtors", description = "Realtor pages and editing"),
        (name = "loans", description = "Loans, returns and availability"),
        (name = "admin", description = "Administrative console")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/listinginstances/{id}/loan"));
        assert!(doc.paths.paths.contains_key("/admin/listinginstances"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
