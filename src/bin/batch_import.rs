use anyhow::{anyhow, Result};
use clap::{Arg, Command};
use std::path::Path;

use arsip::{
    config::Config,
    db::Database,
    extraction::ExtractionPipeline,
    ingestion::{batch_import::BatchImporter, document_ingestion::DocumentIngestionService},
    models::DocumentMetadata,
    services::file_service::FileService,
};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .init();

    let matches = Command::new("batch_import")
        .about("Import every supported file in a directory into the archive")
        .arg(
            Arg::new("directory")
                .help("Directory to import files from (not recursive)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("category")
                .help("Category assigned to every imported document")
                .long("category")
                .short('c')
                .value_name("CATEGORY"),
        )
        .arg(
            Arg::new("doc-type")
                .help("Document type assigned to every imported document")
                .long("doc-type")
                .short('t')
                .value_name("TYPE"),
        )
        .arg(
            Arg::new("company-type")
                .help("Company type (PT, CV, UD, Koperasi, Yayasan)")
                .long("company-type")
                .value_name("COMPANY_TYPE"),
        )
        .arg(
            Arg::new("company-name")
                .help("Company name, without the company type prefix")
                .long("company-name")
                .value_name("NAME"),
        )
        .get_matches();

    let directory = matches
        .get_one::<String>("directory")
        .ok_or_else(|| anyhow!("directory argument is required"))?;
    let dir_path = Path::new(directory);

    if !dir_path.is_dir() {
        eprintln!("Error: Directory {} does not exist", directory);
        std::process::exit(1);
    }

    let defaults = DocumentMetadata {
        category: matches.get_one::<String>("category").cloned(),
        doc_type: matches.get_one::<String>("doc-type").cloned(),
        company_type: matches.get_one::<String>("company-type").cloned(),
        company_name: matches.get_one::<String>("company-name").cloned(),
        ..Default::default()
    };

    let config = Config::from_env()?;
    let db = Database::connect_and_migrate(&config.database_url).await?;
    let file_service = FileService::new(config.upload_path.clone());
    file_service.initialize_directory_structure().await?;

    let ingestion = DocumentIngestionService::new(
        db,
        file_service,
        ExtractionPipeline::new(&config.extraction_config()),
        config.allowed_file_types.clone(),
    );
    let importer = BatchImporter::new(ingestion);

    println!("Starting batch import from: {}", directory);

    let summary = match importer.import_directory(dir_path, &defaults).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Import failed: {}", e);
            std::process::exit(1);
        }
    };

    for record in &summary.imported {
        println!("  [{}] {}", record.id, record.filename);
    }
    for (path, reason) in &summary.failed {
        println!("  failed: {} ({})", path.display(), reason);
    }
    println!(
        "Imported {} documents ({} without extracted text), {} failed",
        summary.imported.len(),
        summary.extraction_failures,
        summary.failed.len()
    );

    Ok(())
}
