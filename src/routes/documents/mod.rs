use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;

pub mod bulk;
pub mod crud;
pub mod upload;

pub use bulk::*;
pub use crud::*;
pub use upload::*;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // Upload preview and metadata save
        .route("/upload", post(upload_document).layer(DefaultBodyLimit::disable()))
        .route("/", post(save_document))
        .route("/", get(list_documents))

        // Single document
        .route("/{id}", get(get_document).put(update_document).delete(delete_document))
        .route("/{id}/file", get(download_document))

        // Bulk operations
        .route("/batch", post(batch_upload).layer(DefaultBodyLimit::disable()))
}
