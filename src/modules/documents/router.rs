use crate::modules::documents::controller::{
    change_document_status, create_document, delete_document, expire_documents, list_documents,
    reset_document, review_document, upload_document,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, patch, post},
};

pub fn init_documents_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_document).get(list_documents))
        .route("/expire", post(expire_documents))
        .route("/{id}", delete(delete_document))
        .route("/{id}/upload", post(upload_document))
        .route("/{id}/review", post(review_document))
        .route("/{id}/reset", post(reset_document))
        .route("/{id}/status", patch(change_document_status))
}
