//! Librarian loan form over a listing instance
//!
//! Only the borrower is editable. The listing title is displayed for context and
//! whatever the client sends back for it is ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::listing_instance::ListingInstanceDetails;

/// Loan form as rendered to the librarian
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanForm {
    pub instance_id: Uuid,
    /// Read-only
    pub listing_title: String,
    pub borrower: Option<i32>,
    /// Field name to error messages, empty when the form is unbound or valid
    pub errors: BTreeMap<String, Vec<String>>,
}

impl LoanForm {
    /// Unbound form pre-filled from the instance
    pub fn initial(instance: &ListingInstanceDetails) -> Self {
        Self {
            instance_id: instance.id,
            listing_title: instance.listing_title.clone(),
            borrower: instance.borrower_id,
            errors: BTreeMap::new(),
        }
    }

    /// Form bound to a submission, carrying its errors back
    pub fn bound(
        instance: &ListingInstanceDetails,
        submission: &LoanSubmission,
        errors: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            instance_id: instance.id,
            listing_title: instance.listing_title.clone(),
            borrower: submission.borrower,
            errors,
        }
    }
}

/// Loan form submission
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoanSubmission {
    /// Ignored: the title is display-only
    #[serde(default)]
    pub listing_title: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub borrower: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::field_errors;
    use crate::models::listing_instance::LoanStatus;

    fn instance() -> ListingInstanceDetails {
        ListingInstanceDetails {
            id: Uuid::new_v4(),
            listing_id: 4,
            listing_title: "The Left Hand of Darkness".to_string(),
            imprint: "Ace, 1969".to_string(),
            due_back: None,
            status: LoanStatus::Available,
            borrower_id: None,
            borrower_login: None,
            is_overdue: false,
        }
    }

    #[test]
    fn test_initial_form_shows_title() {
        let form = LoanForm::initial(&instance());
        assert_eq!(form.listing_title, "The Left Hand of Darkness");
        assert_eq!(form.borrower, None);
        assert!(form.errors.is_empty());
    }

    #[test]
    fn test_borrower_required() {
        let submission = LoanSubmission {
            listing_title: None,
            borrower: None,
        };
        let errors = field_errors(&submission.validate().unwrap_err());
        assert_eq!(errors["borrower"], vec!["This field is required.".to_string()]);
    }

    #[test]
    fn test_submitted_title_is_not_round_tripped() {
        let submission: LoanSubmission =
            serde_json::from_str(r#"{"listing_title": "Tampered", "borrower": 3}"#).unwrap();
        assert!(submission.validate().is_ok());
        let form = LoanForm::bound(&instance(), &submission, BTreeMap::new());
        assert_eq!(form.listing_title, "The Left Hand of Darkness");
        assert_eq!(form.borrower, Some(3));
    }
}
