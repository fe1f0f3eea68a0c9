use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Id,
    Filename,
    Category,
    CompanyType,
    CompanyName,
    IssuedDate,
}

impl SortField {
    /// Unknown keys fall back to `id`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "filename" => SortField::Filename,
            "category" => SortField::Category,
            "company_type" => SortField::CompanyType,
            "company_name" => SortField::CompanyName,
            "issued_date" => SortField::IssuedDate,
            _ => SortField::Id,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Filename => "filename",
            SortField::Category => "category",
            SortField::CompanyType => "company_type",
            SortField::CompanyName => "company_name",
            SortField::IssuedDate => "issued_date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Raw query string of the listing endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DocumentListQuery {
    pub category: Option<String>,
    pub company_type: Option<String>,
    pub company_name: Option<String>,
    /// Inclusive lower bound on `issued_date` (`YYYY-MM-DD`).
    pub date_from: Option<String>,
    /// Inclusive upper bound on `issued_date` (`YYYY-MM-DD`).
    pub date_to: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

/// Normalised filter: blank values are dropped, sort keys are whitelisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFilter {
    pub category: Option<String>,
    pub company_type: Option<String>,
    pub company_name: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort_by: SortField,
    pub sort_dir: SortDirection,
}

impl Default for DocumentFilter {
    fn default() -> Self {
        Self {
            category: None,
            company_type: None,
            company_name: None,
            date_from: None,
            date_to: None,
            sort_by: SortField::Id,
            sort_dir: SortDirection::Asc,
        }
    }
}

impl From<&DocumentListQuery> for DocumentFilter {
    fn from(query: &DocumentListQuery) -> Self {
        fn non_blank(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Self {
            category: non_blank(&query.category),
            company_type: non_blank(&query.company_type),
            company_name: non_blank(&query.company_name),
            date_from: non_blank(&query.date_from),
            date_to: non_blank(&query.date_to),
            sort_by: query.sort_by.as_deref().map(SortField::parse).unwrap_or(SortField::Id),
            sort_dir: query
                .sort_dir
                .as_deref()
                .map(SortDirection::parse)
                .unwrap_or(SortDirection::Asc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_keys_are_whitelisted() {
        assert_eq!(SortField::parse("company_name"), SortField::CompanyName);
        assert_eq!(SortField::parse("notes; DROP TABLE documents"), SortField::Id);
        assert_eq!(SortDirection::parse("DESC"), SortDirection::Desc);
        assert_eq!(SortDirection::parse("sideways"), SortDirection::Asc);
    }

    #[test]
    fn test_filter_from_query() {
        let query = DocumentListQuery {
            category: Some("Invoice".to_string()),
            company_type: Some("   ".to_string()),
            date_to: Some("2025-12-31".to_string()),
            sort_by: Some("bogus".to_string()),
            sort_dir: Some("Desc".to_string()),
            ..Default::default()
        };
        let filter = DocumentFilter::from(&query);
        assert_eq!(filter.category.as_deref(), Some("Invoice"));
        assert_eq!(filter.company_type, None);
        assert_eq!(filter.date_to.as_deref(), Some("2025-12-31"));
        assert_eq!(filter.sort_by, SortField::Id);
        assert_eq!(filter.sort_dir, SortDirection::Desc);
    }
}
