//! Data models for the catalog

pub mod genre;
pub mod listing;
pub mod listing_instance;
pub mod loan_form;
pub mod pagination;
pub mod realtor;
pub mod session;
pub mod user;

// Re-export commonly used types
pub use genre::Genre;
pub use listing::{Listing, ListingShort};
pub use listing_instance::{ListingInstance, ListingInstanceDetails, LoanStatus};
pub use realtor::Realtor;
pub use session::SessionData;
pub use user::{User, UserShort};
