//! Realtor (author) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::listing::ListingShort;

/// Full realtor model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Realtor {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    /// Path or URL of the realtor portrait
    pub author_image: Option<String>,
}

impl Realtor {
    /// "First Last", as shown in lists and messages
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Realtor detail page: the realtor and every listing they wrote
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RealtorDetail {
    #[serde(flatten)]
    pub realtor: Realtor,
    pub listings: Vec<ListingShort>,
}

/// Realtor create/update form
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_life_dates"))]
pub struct RealtorForm {
    #[validate(length(min = 1, max = 100, message = "This field is required (100 characters max)"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "This field is required (100 characters max)"))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub author_image: Option<String>,
}

fn validate_life_dates(form: &RealtorForm) -> Result<(), ValidationError> {
    match (form.date_of_birth, form.date_of_death) {
        (Some(born), Some(died)) if died < born => {
            let mut err = ValidationError::new("date_of_death");
            err.message = Some("Date of death is before date of birth".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Outcome of a realtor deletion attempt
#[derive(Debug, PartialEq, Eq)]
pub enum RealtorDeletion {
    Deleted,
    /// Listings still reference the realtor; nothing was removed
    HasDependents { listings: i64 },
    /// Any other failure, kept for logging
    Failed(String),
}

impl RealtorDeletion {
    /// User-facing message naming the realtor
    pub fn message(&self, name: &str) -> String {
        match self {
            RealtorDeletion::Deleted => format!("{} has been deleted", name),
            RealtorDeletion::HasDependents { .. } => {
                format!("{} cannot be deleted. Listings exist for this realtor", name)
            }
            RealtorDeletion::Failed(_) => format!("{} could not be deleted", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(born: Option<NaiveDate>, died: Option<NaiveDate>) -> RealtorForm {
        RealtorForm {
            first_name: "Ursula".to_string(),
            last_name: "Le Guin".to_string(),
            date_of_birth: born,
            date_of_death: died,
            author_image: None,
        }
    }

    #[test]
    fn test_display_name() {
        let realtor = Realtor {
            id: 1,
            first_name: "Ursula".to_string(),
            last_name: "Le Guin".to_string(),
            date_of_birth: None,
            date_of_death: None,
            author_image: None,
        };
        assert_eq!(realtor.display_name(), "Ursula Le Guin");
    }

    #[test]
    fn test_form_requires_names() {
        let mut f = form(None, None);
        f.first_name.clear();
        assert!(f.validate().is_err());
        assert!(form(None, None).validate().is_ok());
    }

    #[test]
    fn test_form_rejects_death_before_birth() {
        let born = NaiveDate::from_ymd_opt(1929, 10, 21);
        let died = NaiveDate::from_ymd_opt(2018, 1, 22);
        assert!(form(born, died).validate().is_ok());
        assert!(form(died, born).validate().is_err());
    }

    #[test]
    fn test_deletion_messages() {
        let name = "Ursula Le Guin";
        assert_eq!(RealtorDeletion::Deleted.message(name), "Ursula Le Guin has been deleted");
        assert_eq!(
            RealtorDeletion::HasDependents { listings: 2 }.message(name),
            "Ursula Le Guin cannot be deleted. Listings exist for this realtor"
        );
        assert_eq!(
            RealtorDeletion::Failed("timeout".into()).message(name),
            "Ursula Le Guin could not be deleted"
        );
    }
}
