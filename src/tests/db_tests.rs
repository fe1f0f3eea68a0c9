#[cfg(test)]
mod tests {
    use crate::db::{is_unique_violation, Database};
    use crate::models::{DocumentFilter, NewDocument, SortDirection, SortField};

    async fn create_test_db() -> Database {
        Database::connect_and_migrate("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database")
    }

    fn new_document(
        filename: &str,
        category: &str,
        company_type: &str,
        company_name: &str,
        issued_date: &str,
    ) -> NewDocument {
        NewDocument {
            filename: filename.to_string(),
            category: category.to_string(),
            doc_type: "Scan".to_string(),
            company_type: company_type.to_string(),
            company_name: company_name.to_string(),
            issued_date: issued_date.to_string(),
            notes: format!("notes for {}", filename),
        }
    }

    async fn seed(db: &Database) {
        for doc in [
            new_document("b.pdf", "Invoice", "PT", "Maju Jaya", "2025-03-01"),
            new_document("a.pdf", "Invoice", "CV", "Sinar", "2025-01-15"),
            new_document("c.docx", "Contract", "PT", "Maju Jaya", "2024-12-31"),
            new_document("d.png", "Uncategorized", "", "", ""),
        ] {
            db.create_document(&doc).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_create_and_get_document() {
        let db = create_test_db().await;

        let created = db
            .create_document(&new_document("report.pdf", "Invoice", "PT", "ABC", "2025-07-09"))
            .await
            .unwrap();
        assert!(created.id > 0);
        assert_eq!(created.notes, "notes for report.pdf");

        let fetched = db.get_document_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        assert!(db.get_document_by_id(created.id + 100).await.unwrap().is_none());
        assert!(db.filename_in_use("report.pdf").await.unwrap());
        assert!(!db.filename_in_use("other.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_keeps_filename() {
        let db = create_test_db().await;
        let created = db
            .create_document(&new_document("report.pdf", "Invoice", "PT", "ABC", ""))
            .await
            .unwrap();

        let mut update = new_document("ignored.pdf", "Contract", "CV", "XYZ", "2025-01-01");
        update.notes = "edited".to_string();
        let updated = db.update_document_metadata(created.id, &update).await.unwrap().unwrap();

        assert_eq!(updated.filename, "report.pdf");
        assert_eq!(updated.category, "Contract");
        assert_eq!(updated.company_name, "XYZ");
        assert_eq!(updated.notes, "edited");
        assert_eq!(updated.created_at, created.created_at);

        assert!(db.update_document_metadata(9999, &update).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_document() {
        let db = create_test_db().await;
        let created = db
            .create_document(&new_document("report.pdf", "Invoice", "", "", ""))
            .await
            .unwrap();

        let deleted = db.delete_document(created.id).await.unwrap().unwrap();
        assert_eq!(deleted.filename, "report.pdf");
        assert!(db.get_document_by_id(created.id).await.unwrap().is_none());
        assert!(db.delete_document(created.id).await.unwrap().is_none());
        assert_eq!(db.count_documents().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_filename_is_unique() {
        let db = create_test_db().await;
        db.create_document(&new_document("report.pdf", "Invoice", "", "", ""))
            .await
            .unwrap();

        let err = db
            .create_document(&new_document("report.pdf", "Contract", "PT", "ABC", ""))
            .await
            .unwrap_err();

        assert!(is_unique_violation(&err));
        assert_eq!(db.count_documents().await.unwrap(), 1);
        assert!(db.filename_in_use("report.pdf").await.unwrap());
    }

    #[test]
    fn test_other_errors_are_not_unique_violations() {
        let err = anyhow::anyhow!("connection reset");
        assert!(!is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_list_default_order_is_id_ascending() {
        let db = create_test_db().await;
        seed(&db).await;

        let docs = db.list_documents(&DocumentFilter::default()).await.unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["b.pdf", "a.pdf", "c.docx", "d.png"]);
    }

    #[tokio::test]
    async fn test_list_filters_combine() {
        let db = create_test_db().await;
        seed(&db).await;

        let filter = DocumentFilter {
            category: Some("Invoice".to_string()),
            company_type: Some("PT".to_string()),
            ..Default::default()
        };
        let docs = db.list_documents(&filter).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "b.pdf");

        let filter = DocumentFilter {
            company_name: Some("Maju Jaya".to_string()),
            date_from: Some("2025-01-01".to_string()),
            date_to: Some("2025-12-31".to_string()),
            ..Default::default()
        };
        let docs = db.list_documents(&filter).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "b.pdf");
    }

    #[tokio::test]
    async fn test_list_date_range_is_inclusive() {
        let db = create_test_db().await;
        seed(&db).await;

        let filter = DocumentFilter {
            date_from: Some("2024-12-31".to_string()),
            date_to: Some("2025-01-15".to_string()),
            sort_by: SortField::IssuedDate,
            ..Default::default()
        };
        let docs = db.list_documents(&filter).await.unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["c.docx", "a.pdf"]);
    }

    #[tokio::test]
    async fn test_list_sorting() {
        let db = create_test_db().await;
        seed(&db).await;

        let filter = DocumentFilter {
            sort_by: SortField::Filename,
            sort_dir: SortDirection::Desc,
            ..Default::default()
        };
        let docs = db.list_documents(&filter).await.unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["d.png", "c.docx", "b.pdf", "a.pdf"]);
    }

    #[tokio::test]
    async fn test_distinct_values_skip_empty() {
        let db = create_test_db().await;
        seed(&db).await;

        assert_eq!(
            db.distinct_categories().await.unwrap(),
            vec!["Contract", "Invoice", "Uncategorized"]
        );
        assert_eq!(db.distinct_company_types().await.unwrap(), vec!["CV", "PT"]);
        assert_eq!(db.distinct_company_names().await.unwrap(), vec!["Maju Jaya", "Sinar"]);
    }
}
