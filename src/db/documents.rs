use anyhow::Result;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use crate::db::Database;
use crate::models::{DocumentFilter, DocumentRecord, NewDocument};

/// Columns selected for every `DocumentRecord` query
pub const DOCUMENT_FIELDS: &str =
    "id, filename, category, doc_type, company_type, company_name, issued_date, notes, created_at";

impl Database {
    pub async fn create_document(&self, document: &NewDocument) -> Result<DocumentRecord> {
        let query_str = format!(
            r#"
            INSERT INTO documents (filename, category, doc_type, company_type, company_name, issued_date, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            DOCUMENT_FIELDS
        );

        let record = sqlx::query_as::<_, DocumentRecord>(&query_str)
            .bind(&document.filename)
            .bind(&document.category)
            .bind(&document.doc_type)
            .bind(&document.company_type)
            .bind(&document.company_name)
            .bind(&document.issued_date)
            .bind(&document.notes)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(record)
    }

    pub async fn get_document_by_id(&self, id: i64) -> Result<Option<DocumentRecord>> {
        let query_str = format!("SELECT {} FROM documents WHERE id = ?", DOCUMENT_FIELDS);
        let record = sqlx::query_as::<_, DocumentRecord>(&query_str)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// Replaces the editable metadata of a record. The stored filename never changes.
    pub async fn update_document_metadata(
        &self,
        id: i64,
        document: &NewDocument,
    ) -> Result<Option<DocumentRecord>> {
        let query_str = format!(
            r#"
            UPDATE documents
            SET category = ?, doc_type = ?, company_type = ?, company_name = ?,
                issued_date = ?, notes = ?
            WHERE id = ?
            RETURNING {}
            "#,
            DOCUMENT_FIELDS
        );

        let record = sqlx::query_as::<_, DocumentRecord>(&query_str)
            .bind(&document.category)
            .bind(&document.doc_type)
            .bind(&document.company_type)
            .bind(&document.company_name)
            .bind(&document.issued_date)
            .bind(&document.notes)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Deletes the row and hands it back so the caller can remove the file.
    pub async fn delete_document(&self, id: i64) -> Result<Option<DocumentRecord>> {
        let query_str = format!("DELETE FROM documents WHERE id = ? RETURNING {}", DOCUMENT_FIELDS);
        let record = sqlx::query_as::<_, DocumentRecord>(&query_str)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// Lists documents matching every non-empty filter, ordered by the
    /// whitelisted sort column.
    pub async fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT ");
        query.push(DOCUMENT_FIELDS);
        query.push(" FROM documents WHERE 1 = 1");

        if let Some(category) = &filter.category {
            query.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(company_type) = &filter.company_type {
            query.push(" AND company_type = ").push_bind(company_type.clone());
        }
        if let Some(company_name) = &filter.company_name {
            query.push(" AND company_name = ").push_bind(company_name.clone());
        }
        if let Some(date_from) = &filter.date_from {
            query.push(" AND issued_date >= ").push_bind(date_from.clone());
        }
        if let Some(date_to) = &filter.date_to {
            query.push(" AND issued_date <= ").push_bind(date_to.clone());
        }

        // Column and direction come from closed enums, never from user text
        query.push(format!(
            " ORDER BY {} {}, id {}",
            filter.sort_by.column(),
            filter.sort_dir.keyword(),
            filter.sort_dir.keyword()
        ));

        let records = query
            .build_query_as::<DocumentRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    pub async fn distinct_categories(&self) -> Result<Vec<String>> {
        self.distinct_values("category").await
    }

    pub async fn distinct_company_types(&self) -> Result<Vec<String>> {
        self.distinct_values("company_type").await
    }

    pub async fn distinct_company_names(&self) -> Result<Vec<String>> {
        self.distinct_values("company_name").await
    }

    async fn distinct_values(&self, column: &'static str) -> Result<Vec<String>> {
        let query_str = format!(
            "SELECT DISTINCT {col} FROM documents WHERE {col} IS NOT NULL AND {col} != '' ORDER BY {col}",
            col = column
        );
        let values = sqlx::query_scalar::<_, String>(&query_str)
            .fetch_all(&self.pool)
            .await?;
        Ok(values)
    }

    pub async fn count_documents(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn filename_in_use(&self, filename: &str) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM documents WHERE filename = ?")
                .bind(filename)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists > 0)
    }
}
