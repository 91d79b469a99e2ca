//! Loan service: loans, returns and listing instance administration

use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::{
    admin::DueBackFilter,
    error::{field_errors, AppResult},
    models::{
        listing_instance::{loan_due_date, ListingInstanceDetails, ListingInstanceForm, LoanStatus},
        loan_form::{LoanForm, LoanSubmission},
        pagination::Pagination,
    },
    repository::Repository,
};

const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Result of a loan form submission
#[derive(Debug)]
pub enum LoanOutcome {
    /// The instance is now on loan
    Lent(ListingInstanceDetails),
    /// The submission was rejected; the form carries the errors
    Invalid(LoanForm),
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// One page of the instances on loan to a borrower, soonest due first
    pub async fn my_loans(
        &self,
        borrower_id: i32,
        pagination: &Pagination,
        today: NaiveDate,
    ) -> AppResult<(Vec<ListingInstanceDetails>, i64)> {
        let total = self.repository.instances.count_on_loan_to(borrower_id).await?;
        pagination.ensure_in_range(total)?;
        let instances = self
            .repository
            .instances
            .list_on_loan_to(borrower_id, pagination)
            .await?
            .into_iter()
            .map(|i| i.with_overdue(today))
            .collect();
        Ok((instances, total))
    }

    /// One page of available instances, by listing title
    pub async fn available(
        &self,
        pagination: &Pagination,
    ) -> AppResult<(Vec<ListingInstanceDetails>, i64)> {
        let total = self
            .repository
            .instances
            .count_by_status(LoanStatus::Available)
            .await?;
        pagination.ensure_in_range(total)?;
        let instances = self
            .repository
            .instances
            .list_by_status(LoanStatus::Available, pagination)
            .await?;
        Ok((instances, total))
    }

    /// Loan form pre-filled from the instance
    pub async fn loan_form(&self, id: Uuid) -> AppResult<LoanForm> {
        let instance = self.repository.instances.get_details(id).await?;
        Ok(LoanForm::initial(&instance))
    }

    /// Validate a loan submission and, when valid, lend the instance until
    /// `today` plus the loan period
    pub async fn process_loan(
        &self,
        id: Uuid,
        submission: LoanSubmission,
        today: NaiveDate,
    ) -> AppResult<LoanOutcome> {
        let instance = self.repository.instances.get_details(id).await?;

        let mut errors = match submission.validate() {
            Ok(()) => BTreeMap::new(),
            Err(e) => field_errors(&e),
        };

        let borrower_id = match submission.borrower {
            Some(borrower_id) if errors.is_empty() => {
                if self.repository.users.exists(borrower_id).await? {
                    Some(borrower_id)
                } else {
                    errors
                        .entry("borrower".to_string())
                        .or_default()
                        .push(INVALID_CHOICE.to_string());
                    None
                }
            }
            _ => None,
        };

        let Some(borrower_id) = borrower_id else {
            return Ok(LoanOutcome::Invalid(LoanForm::bound(&instance, &submission, errors)));
        };

        let due_back = loan_due_date(today);
        let lent = self.repository.instances.lend(id, borrower_id, due_back).await?;
        tracing::info!(
            "Lent instance {} of '{}' to user {} until {}",
            id,
            lent.listing_title,
            borrower_id,
            due_back
        );
        Ok(LoanOutcome::Lent(lent.with_overdue(today)))
    }

    /// Mark an instance available again
    pub async fn return_instance(&self, id: Uuid) -> AppResult<ListingInstanceDetails> {
        let returned = self.repository.instances.mark_returned(id).await?;
        tracing::info!("Returned instance {} of '{}'", id, returned.listing_title);
        Ok(returned)
    }

    // Console

    pub async fn list_instances(
        &self,
        status: Option<LoanStatus>,
        due_back: DueBackFilter,
        today: NaiveDate,
    ) -> AppResult<Vec<ListingInstanceDetails>> {
        let instances = self
            .repository
            .instances
            .list_filtered(status, due_back.condition(today))
            .await?;
        Ok(instances.into_iter().map(|i| i.with_overdue(today)).collect())
    }

    pub async fn get_instance(&self, id: Uuid, today: NaiveDate) -> AppResult<ListingInstanceDetails> {
        let instance = self.repository.instances.get_details(id).await?;
        Ok(instance.with_overdue(today))
    }

    pub async fn create_instance(
        &self,
        form: ListingInstanceForm,
        today: NaiveDate,
    ) -> AppResult<ListingInstanceDetails> {
        form.validate()?;
        form.check_consistency()?;
        let created = self.repository.instances.create(&form).await?;
        tracing::info!("Created instance {} of listing {}", created.id, created.listing_id);
        self.get_instance(created.id, today).await
    }

    pub async fn update_instance(
        &self,
        id: Uuid,
        form: ListingInstanceForm,
        today: NaiveDate,
    ) -> AppResult<ListingInstanceDetails> {
        form.validate()?;
        form.check_consistency()?;
        self.repository.instances.update(id, &form).await?;
        self.get_instance(id, today).await
    }

    pub async fn delete_instance(&self, id: Uuid) -> AppResult<()> {
        self.repository.instances.delete(id).await?;
        tracing::info!("Deleted instance {}", id);
        Ok(())
    }
}
