//! Administrative console registry
//!
//! Declares which models the console exposes, which columns its change lists
//! show, which filters they accept and how change forms group their fields.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::models::ListingInstanceDetails;

/// A named group of fields on a change form
#[derive(Debug, Clone, Copy)]
pub struct Fieldset {
    pub name: Option<&'static str>,
    pub fields: &'static [&'static str],
}

/// Console configuration of one model
#[derive(Debug, Clone, Copy)]
pub struct ModelAdmin {
    pub model: &'static str,
    /// Path segment under `/admin`
    pub path: &'static str,
    pub list_display: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    pub fieldsets: &'static [Fieldset],
}

pub const LISTING_ADMIN: ModelAdmin = ModelAdmin {
    model: "Listing",
    path: "listings",
    list_display: &["title"],
    list_filter: &[],
    fieldsets: &[Fieldset {
        name: None,
        fields: &["title", "realtor_id", "summary", "isbn", "genres"],
    }],
};

pub const REALTOR_ADMIN: ModelAdmin = ModelAdmin {
    model: "Realtor",
    path: "realtors",
    list_display: &["name"],
    list_filter: &[],
    fieldsets: &[Fieldset {
        name: None,
        fields: &["first_name", "last_name", "date_of_birth", "date_of_death", "author_image"],
    }],
};

pub const GENRE_ADMIN: ModelAdmin = ModelAdmin {
    model: "Genre",
    path: "genres",
    list_display: &["name"],
    list_filter: &[],
    fieldsets: &[Fieldset {
        name: None,
        fields: &["name"],
    }],
};

pub const LISTING_INSTANCE_ADMIN: ModelAdmin = ModelAdmin {
    model: "ListingInstance",
    path: "listinginstances",
    list_display: &["listing", "status", "borrower", "due_back", "id"],
    list_filter: &["status", "due_back"],
    fieldsets: &[
        Fieldset {
            name: None,
            fields: &["listing", "imprint", "id"],
        },
        Fieldset {
            name: Some("Availability"),
            fields: &["status", "due_back", "borrower"],
        },
    ],
};

/// Every model registered with the console, in display order
pub const REGISTRY: &[ModelAdmin] = &[
    LISTING_ADMIN,
    REALTOR_ADMIN,
    GENRE_ADMIN,
    LISTING_INSTANCE_ADMIN,
];

/// Registry entry as served by `GET /admin`
#[derive(Debug, Serialize, ToSchema)]
pub struct ModelAdminInfo {
    pub model: String,
    pub url: String,
    pub list_display: Vec<String>,
    pub list_filter: Vec<String>,
    pub fieldsets: Vec<FieldsetInfo>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FieldsetInfo {
    pub name: Option<String>,
    pub fields: Vec<String>,
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl From<&ModelAdmin> for ModelAdminInfo {
    fn from(admin: &ModelAdmin) -> Self {
        Self {
            model: admin.model.to_string(),
            url: format!("/admin/{}", admin.path),
            list_display: owned(admin.list_display),
            list_filter: owned(admin.list_filter),
            fieldsets: admin
                .fieldsets
                .iter()
                .map(|fs| FieldsetInfo {
                    name: fs.name.map(str::to_string),
                    fields: owned(fs.fields),
                })
                .collect(),
        }
    }
}

/// Values of one fieldset on a change form
#[derive(Debug, Serialize, ToSchema)]
pub struct FieldsetValues {
    pub name: Option<String>,
    #[schema(value_type = Object)]
    pub fields: BTreeMap<String, Value>,
}

/// Pick `columns` out of a JSON object, missing keys read as null
pub fn project_columns(columns: &[&str], values: &Value) -> BTreeMap<String, Value> {
    columns
        .iter()
        .map(|c| (c.to_string(), values.get(*c).cloned().unwrap_or(Value::Null)))
        .collect()
}

/// Group a JSON object by the model's fieldsets
pub fn project_fieldsets(admin: &ModelAdmin, values: &Value) -> Vec<FieldsetValues> {
    admin
        .fieldsets
        .iter()
        .map(|fs| FieldsetValues {
            name: fs.name.map(str::to_string),
            fields: project_columns(fs.fields, values),
        })
        .collect()
}

/// Console field names for a listing instance
pub fn instance_values(instance: &ListingInstanceDetails) -> Value {
    json!({
        "id": instance.id,
        "listing": instance.listing_title,
        "listing_id": instance.listing_id,
        "imprint": instance.imprint,
        "status": instance.status,
        "due_back": instance.due_back,
        "borrower": instance.borrower_login,
        "borrower_id": instance.borrower_id,
    })
}

/// Date filter choices offered for `due_back`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DueBackFilter {
    #[default]
    Any,
    Today,
    #[serde(rename = "past_7_days")]
    Past7Days,
    ThisMonth,
    ThisYear,
    NoDate,
    HasDate,
}

/// SQL-ready form of a date filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCondition {
    Unrestricted,
    /// `start <= due_back < end`
    Between(NaiveDate, NaiveDate),
    IsNull,
    IsNotNull,
}

impl DueBackFilter {
    pub fn condition(&self, today: NaiveDate) -> DateCondition {
        let tomorrow = today + Duration::days(1);
        match self {
            DueBackFilter::Any => DateCondition::Unrestricted,
            DueBackFilter::Today => DateCondition::Between(today, tomorrow),
            DueBackFilter::Past7Days => DateCondition::Between(today - Duration::days(7), tomorrow),
            DueBackFilter::ThisMonth => {
                let start = today.with_day(1).unwrap_or(today);
                let end = if start.month() == 12 {
                    NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
                };
                DateCondition::Between(start, end.unwrap_or(tomorrow))
            }
            DueBackFilter::ThisYear => {
                let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                let end = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).unwrap_or(tomorrow);
                DateCondition::Between(start, end)
            }
            DueBackFilter::NoDate => DateCondition::IsNull,
            DueBackFilter::HasDate => DateCondition::IsNotNull,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoanStatus;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_registry_exposes_all_models() {
        let models: Vec<&str> = REGISTRY.iter().map(|m| m.model).collect();
        assert_eq!(models, vec!["Listing", "Realtor", "Genre", "ListingInstance"]);
    }

    #[test]
    fn test_instance_admin_configuration() {
        let info = ModelAdminInfo::from(&LISTING_INSTANCE_ADMIN);
        assert_eq!(info.list_display, vec!["listing", "status", "borrower", "due_back", "id"]);
        assert_eq!(info.list_filter, vec!["status", "due_back"]);
        assert_eq!(info.fieldsets.len(), 2);
        assert_eq!(info.fieldsets[0].name, None);
        assert_eq!(info.fieldsets[1].name.as_deref(), Some("Availability"));
        assert_eq!(info.url, "/admin/listinginstances");
    }

    #[test]
    fn test_fieldset_projection() {
        let instance = ListingInstanceDetails {
            id: Uuid::nil(),
            listing_id: 2,
            listing_title: "Earthsea".to_string(),
            imprint: "Parnassus, 1968".to_string(),
            due_back: Some(date(2024, 5, 1)),
            status: LoanStatus::OnLoan,
            borrower_id: Some(9),
            borrower_login: Some("reader1".to_string()),
            is_overdue: false,
        };
        let groups = project_fieldsets(&LISTING_INSTANCE_ADMIN, &instance_values(&instance));
        assert_eq!(groups[0].fields["listing"], json!("Earthsea"));
        assert_eq!(groups[0].fields["imprint"], json!("Parnassus, 1968"));
        assert_eq!(groups[1].fields["status"], json!("o"));
        assert_eq!(groups[1].fields["due_back"], json!("2024-05-01"));
        assert_eq!(groups[1].fields["borrower"], json!("reader1"));
        assert!(!groups[1].fields.contains_key("imprint"));
    }

    #[test]
    fn test_missing_columns_are_null() {
        let row = project_columns(&["title", "missing"], &json!({"title": "Earthsea"}));
        assert_eq!(row["missing"], Value::Null);
    }

    #[test]
    fn test_due_back_ranges() {
        let today = date(2024, 12, 15);
        assert_eq!(
            DueBackFilter::Today.condition(today),
            DateCondition::Between(today, date(2024, 12, 16))
        );
        assert_eq!(
            DueBackFilter::Past7Days.condition(today),
            DateCondition::Between(date(2024, 12, 8), date(2024, 12, 16))
        );
        assert_eq!(
            DueBackFilter::ThisMonth.condition(today),
            DateCondition::Between(date(2024, 12, 1), date(2025, 1, 1))
        );
        assert_eq!(
            DueBackFilter::ThisYear.condition(today),
            DateCondition::Between(date(2024, 1, 1), date(2025, 1, 1))
        );
        assert_eq!(DueBackFilter::Any.condition(today), DateCondition::Unrestricted);
        assert_eq!(DueBackFilter::NoDate.condition(today), DateCondition::IsNull);
    }

    #[test]
    fn test_due_back_filter_parses_snake_case() {
        let f: DueBackFilter = serde_json::from_str("\"past_7_days\"").unwrap();
        assert_eq!(f, DueBackFilter::Past7Days);
    }
}
