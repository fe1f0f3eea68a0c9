use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::LazyLock;
use utoipa::ToSchema;

/// Legal-entity prefixes offered as a separate "company type" field.
pub const COMPANY_TYPES: [&str; 5] = ["PT", "CV", "UD", "Koperasi", "Yayasan"];

/// Category stored when the user leaves both category fields blank.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

const ISSUED_DATE_FORMAT: &str = "%Y-%m-%d";
const DISPLAY_DATE_FORMAT: &str = "%d/%b/%Y";

static COMPANY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = COMPANY_TYPES
        .iter()
        .map(|t| format!(r"{}\.?", regex::escape(t)))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)^(?:{})\s", alternatives)).expect("company prefix pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct DocumentRecord {
    pub id: i64,
    pub filename: String,
    pub category: String,
    pub doc_type: String,
    pub company_type: String,
    pub company_name: String,
    pub issued_date: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Values for a new row, after validation and normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub filename: String,
    pub category: String,
    pub doc_type: String,
    pub company_type: String,
    pub company_name: String,
    pub issued_date: String,
    pub notes: String,
}

/// Metadata form submitted after the upload preview, and on edit.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct DocumentMetadata {
    /// Name returned by the upload step. Ignored on edit.
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Free-text category used when `category` is empty.
    #[serde(default)]
    pub custom_category: Option<String>,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub company_type: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    /// `YYYY-MM-DD` or empty.
    #[serde(default)]
    pub issued_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("Company name must not start with a company type ({0})")]
    CompanyNamePrefixed(String),
    #[error("Issued date '{0}' is not in YYYY-MM-DD format")]
    InvalidIssuedDate(String),
}

impl DocumentMetadata {
    /// `category`, else `custom_category`, else [`DEFAULT_CATEGORY`].
    pub fn resolved_category(&self) -> String {
        [self.category.as_deref(), self.custom_category.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string()
    }

    pub fn validate(&self) -> Result<(), MetadataError> {
        let company_name = self.company_name.as_deref().unwrap_or("");
        if !company_name_valid(company_name) {
            return Err(MetadataError::CompanyNamePrefixed(company_name.trim().to_string()));
        }

        let issued_date = self.issued_date.as_deref().unwrap_or("").trim();
        if !issued_date.is_empty()
            && NaiveDate::parse_from_str(issued_date, ISSUED_DATE_FORMAT).is_err()
        {
            return Err(MetadataError::InvalidIssuedDate(issued_date.to_string()));
        }

        Ok(())
    }

    /// Validates and turns the form into a row for `filename`.
    pub fn into_new_document(self, filename: String) -> Result<NewDocument, MetadataError> {
        self.validate()?;
        Ok(NewDocument {
            filename,
            category: self.resolved_category(),
            doc_type: trimmed(self.doc_type),
            company_type: trimmed(self.company_type),
            company_name: trimmed(self.company_name),
            issued_date: trimmed(self.issued_date),
            notes: self.notes.unwrap_or_default(),
        })
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// False when `name` begins with a company type such as `"PT. "` or `"cv "`,
/// which belongs in the separate company type field.
pub fn company_name_valid(name: &str) -> bool {
    !COMPANY_PREFIX.is_match(name.trim())
}

/// Formats `2025-07-09` as `09/Jul/2025`; anything unparsable is returned as is.
pub fn display_date(value: &str) -> String {
    NaiveDate::parse_from_str(value, ISSUED_DATE_FORMAT)
        .map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_else(|_| value.to_string())
}
