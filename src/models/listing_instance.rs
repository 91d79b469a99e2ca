//! Listing instance (loanable copy) model and related types

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Length of a loan started by a librarian
pub const LOAN_PERIOD_DAYS: i64 = 28;

/// Loan status, stored as a single character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    #[serde(rename = "m")]
    Maintenance,
    #[serde(rename = "o")]
    OnLoan,
    #[serde(rename = "a")]
    Available,
    #[serde(rename = "r")]
    Reserved,
}

impl LoanStatus {
    pub fn as_code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl Default for LoanStatus {
    fn default() -> Self {
        LoanStatus::Maintenance
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            other => Err(format!("Invalid loan status: {}", other)),
        }
    }
}

// SQLx conversion for LoanStatus (CHAR(1) column)
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_code(), buf)
    }
}

/// Due date of a loan started on `loan_date`
pub fn loan_due_date(loan_date: NaiveDate) -> NaiveDate {
    loan_date + Duration::days(LOAN_PERIOD_DAYS)
}

/// An instance is on loan exactly when it has both a borrower and a due date.
pub fn check_loan_consistency(
    status: LoanStatus,
    borrower_id: Option<i32>,
    due_back: Option<NaiveDate>,
) -> Result<(), AppError> {
    match (status, borrower_id, due_back) {
        (LoanStatus::OnLoan, Some(_), Some(_)) => Ok(()),
        (LoanStatus::OnLoan, _, _) => Err(AppError::Validation(
            "An instance on loan needs a borrower and a due date".to_string(),
        )),
        (_, None, None) => Ok(()),
        (status, _, _) => Err(AppError::Validation(format!(
            "An instance with status '{}' cannot have a borrower or a due date",
            status.label()
        ))),
    }
}

/// Full listing instance model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ListingInstance {
    pub id: Uuid,
    pub listing_id: i32,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
}

/// Past due: a due date strictly before `today`
fn past_due(due_back: Option<NaiveDate>, today: NaiveDate) -> bool {
    due_back.map(|d| d < today).unwrap_or(false)
}

impl ListingInstance {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        past_due(self.due_back, today)
    }
}

/// Listing instance joined with its listing title and borrower login
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ListingInstanceDetails {
    pub id: Uuid,
    pub listing_id: i32,
    pub listing_title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
    pub borrower_login: Option<String>,
    #[sqlx(default)]
    #[serde(default)]
    pub is_overdue: bool,
}

impl ListingInstanceDetails {
    /// Fill the computed overdue flag against `today`
    pub fn with_overdue(mut self, today: NaiveDate) -> Self {
        self.is_overdue = past_due(self.due_back, today);
        self
    }
}

/// Create/update listing instance request (admin console)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ListingInstanceForm {
    pub listing_id: i32,
    #[validate(length(min = 1, max = 200, message = "Imprint is required (200 characters max)"))]
    pub imprint: String,
    #[serde(default)]
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
}

impl ListingInstanceForm {
    pub fn check_consistency(&self) -> Result<(), AppError> {
        check_loan_consistency(self.status, self.borrower_id, self.due_back)
    }
}
