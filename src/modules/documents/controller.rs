use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use registrar_core::{AppError, Paginated};
use registrar_models::DocumentId;

use crate::middleware::auth::CurrentUser;
use crate::middleware::role::{RequireAdmin, RequireAdminOrStudent, RequireStaff};
use crate::modules::documents::model::{
    CreateDocumentDto, Document, DocumentDto, DocumentFilterParams, DocumentStatus,
    ExpireDocumentsResponse, ReviewDocumentDto, UpdateDocumentStatusDto, UploadDocumentDto,
};
use crate::modules::documents::service::{DocumentService, Transition};
use crate::state::AppState;
use crate::utils::access::{ensure_student_visible, record_scope};
use crate::utils::response::MessageResponse;
use crate::validator::{ApiPath, ApiQuery, ValidatedJson};

fn ensure_owner(current: &CurrentUser, document: &Document) -> Result<(), AppError> {
    if current.is_admin() || current.student_id == Some(document.student_id) {
        Ok(())
    } else {
        Err(AppError::forbidden("You do not own this document"))
    }
}

fn shaped(document: Document) -> DocumentDto {
    DocumentDto::new(document, Utc::now().date_naive())
}

/// List documents
///
/// Admins and teachers see every document, students their own and parents
/// their children's.
#[utoipa::path(
    get,
    path = "/api/documents",
    summary = "List documents",
    params(DocumentFilterParams),
    responses(
        (status = 200, description = "Paginated documents", body = Paginated<DocumentDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Documents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current), fields(user_id = %current.id()))]
pub async fn list_documents(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(filters): ApiQuery<DocumentFilterParams>,
) -> Result<Json<Paginated<DocumentDto>>, AppError> {
    let scope = record_scope(&state.db, &current).await?;
    let documents = DocumentService::list_documents(
        &state.db,
        &scope,
        &filters,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Json(documents))
}

/// Request a document
///
/// Students request documents for themselves; admins name the student.
#[utoipa::path(
    post,
    path = "/api/documents",
    summary = "Create document",
    request_body = CreateDocumentDto,
    responses(
        (status = 201, description = "Document created as pending", body = DocumentDto),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an admin, or a student creating for someone else"),
        (status = 404, description = "Student not found")
    ),
    tag = "Documents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current, dto), fields(user_id = %current.id()))]
pub async fn create_document(
    State(state): State<AppState>,
    RequireAdminOrStudent(current): RequireAdminOrStudent,
    ValidatedJson(dto): ValidatedJson<CreateDocumentDto>,
) -> Result<(StatusCode, Json<DocumentDto>), AppError> {
    let student_id = if current.is_admin() {
        let student_id = dto.student_id.ok_or_else(|| {
            AppError::bad_request(anyhow::anyhow!("student_id is required"))
        })?;
        ensure_student_visible(&state.db, &current, student_id).await?;
        student_id
    } else {
        let own = current.student_id()?;
        if dto.student_id.is_some_and(|requested| requested != own) {
            return Err(AppError::forbidden(
                "Students can only create documents for themselves",
            ));
        }
        own
    };

    let document = DocumentService::create_document(&state.db, student_id, dto).await?;
    Ok((StatusCode::CREATED, Json(shaped(document))))
}

#[utoipa::path(
    post,
    path = "/api/documents/{id}/upload",
    summary = "Upload document file",
    params(("id" = Uuid, Path, description = "Document ID")),
    request_body = UploadDocumentDto,
    responses(
        (status = 200, description = "Document uploaded", body = DocumentDto),
        (status = 400, description = "Invalid file metadata"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owning student or an admin"),
        (status = 404, description = "Document not found"),
        (status = 409, description = "Document is not pending")
    ),
    tag = "Documents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current, dto), fields(user_id = %current.id()))]
pub async fn upload_document(
    State(state): State<AppState>,
    RequireAdminOrStudent(current): RequireAdminOrStudent,
    ApiPath(id): ApiPath<DocumentId>,
    ValidatedJson(dto): ValidatedJson<UploadDocumentDto>,
) -> Result<Json<DocumentDto>, AppError> {
    let document = DocumentService::get_document(&state.db, id).await?;
    ensure_owner(&current, &document)?;

    let transition = Transition {
        file: Some(dto),
        ..Transition::to(DocumentStatus::Uploaded, current.id())
    };
    let document = DocumentService::transition(&state.db, id, transition).await?;
    Ok(Json(shaped(document)))
}

#[utoipa::path(
    post,
    path = "/api/documents/{id}/review",
    summary = "Review document",
    params(("id" = Uuid, Path, description = "Document ID")),
    request_body = ReviewDocumentDto,
    responses(
        (status = 200, description = "Document approved or rejected", body = DocumentDto),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires teacher or admin role"),
        (status = 404, description = "Document not found"),
        (status = 409, description = "Document is not uploaded")
    ),
    tag = "Documents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current, dto), fields(user_id = %current.id()))]
pub async fn review_document(
    State(state): State<AppState>,
    RequireStaff(current): RequireStaff,
    ApiPath(id): ApiPath<DocumentId>,
    ValidatedJson(dto): ValidatedJson<ReviewDocumentDto>,
) -> Result<Json<DocumentDto>, AppError> {
    let transition = Transition {
        notes: dto.notes,
        ..Transition::to(dto.decision.into(), current.id())
    };
    let document = DocumentService::transition(&state.db, id, transition).await?;
    Ok(Json(shaped(document)))
}

/// Reset a document to pending
///
/// Clears the uploaded file and any review so the student can resubmit.
#[utoipa::path(
    post,
    path = "/api/documents/{id}/reset",
    summary = "Reset document to pending",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document is pending again", body = DocumentDto),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owning student or an admin"),
        (status = 404, description = "Document not found"),
        (status = 409, description = "Document is already pending")
    ),
    tag = "Documents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current), fields(user_id = %current.id()))]
pub async fn reset_document(
    State(state): State<AppState>,
    RequireAdminOrStudent(current): RequireAdminOrStudent,
    ApiPath(id): ApiPath<DocumentId>,
) -> Result<Json<DocumentDto>, AppError> {
    let document = DocumentService::get_document(&state.db, id).await?;
    ensure_owner(&current, &document)?;

    let document = DocumentService::transition(
        &state.db,
        id,
        Transition::to(DocumentStatus::Pending, current.id()),
    )
    .await?;
    Ok(Json(shaped(document)))
}

#[utoipa::path(
    patch,
    path = "/api/documents/{id}/status",
    summary = "Change document status",
    params(("id" = Uuid, Path, description = "Document ID")),
    request_body = UpdateDocumentStatusDto,
    responses(
        (status = 200, description = "Status changed", body = DocumentDto),
        (status = 400, description = "Invalid input, or uploaded without file metadata"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Document not found"),
        (status = 409, description = "Transition not allowed from the current status")
    ),
    tag = "Documents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto), fields(user_id = %admin.id()))]
pub async fn change_document_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<DocumentId>,
    ValidatedJson(dto): ValidatedJson<UpdateDocumentStatusDto>,
) -> Result<Json<DocumentDto>, AppError> {
    let transition = Transition {
        notes: dto.notes,
        ..Transition::to(dto.status, admin.id())
    };
    let document = DocumentService::transition(&state.db, id, transition).await?;
    Ok(Json(shaped(document)))
}

#[utoipa::path(
    post,
    path = "/api/documents/expire",
    summary = "Expire overdue documents",
    responses(
        (status = 200, description = "Number of documents expired", body = ExpireDocumentsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role")
    ),
    tag = "Documents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn expire_documents(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ExpireDocumentsResponse>, AppError> {
    let expired = DocumentService::expire_overdue(&state.db, Utc::now().date_naive()).await?;
    Ok(Json(ExpireDocumentsResponse { expired }))
}

/// Delete a document
///
/// Admins delete any document; students only their own while pending.
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    summary = "Delete document",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owning student or an admin"),
        (status = 404, description = "Document not found"),
        (status = 409, description = "Students can only delete pending documents")
    ),
    tag = "Documents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, current), fields(user_id = %current.id()))]
pub async fn delete_document(
    State(state): State<AppState>,
    RequireAdminOrStudent(current): RequireAdminOrStudent,
    ApiPath(id): ApiPath<DocumentId>,
) -> Result<Json<MessageResponse>, AppError> {
    let document = DocumentService::get_document(&state.db, id).await?;
    ensure_owner(&current, &document)?;

    if !current.is_admin() && document.status != DocumentStatus::Pending {
        return Err(AppError::conflict(anyhow::anyhow!(
            "Only pending documents can be deleted"
        )));
    }

    DocumentService::delete_document(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Document deleted successfully")))
}
