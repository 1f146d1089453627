//! Document workflow.
//!
//! Every status change goes through [`DocumentService::transition`], which
//! locks the row, checks the move against
//! [`DocumentStatus::can_transition_to`] and writes the fields that belong
//! to the target state. Moving back to pending wipes file and review data.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use registrar_core::{AppError, Paginated};
use registrar_models::{DocumentId, Labeled, StudentId, UserId};
use registrar_observability::track_document_transition;

use crate::modules::documents::model::{
    CreateDocumentDto, Document, DocumentDto, DocumentFilterParams, DocumentStatus,
    UploadDocumentDto,
};
use crate::utils::access::RecordScope;

const DOCUMENT_COLUMNS: &str = r#"
    id, student_id, title, document_type, description, status, due_date,
    file_name, file_url, file_size, mime_type, uploaded_at,
    reviewed_by, reviewed_at, review_notes, created_at, updated_at"#;

/// A requested status change with the data the target state needs.
#[derive(Debug, Clone)]
pub struct Transition {
    pub next: DocumentStatus,
    pub actor: UserId,
    pub notes: Option<String>,
    pub file: Option<UploadDocumentDto>,
}

impl Transition {
    pub fn to(next: DocumentStatus, actor: UserId) -> Self {
        Self {
            next,
            actor,
            notes: None,
            file: None,
        }
    }
}

pub struct DocumentService;

impl DocumentService {
    fn push_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        scope: &RecordScope,
        filters: &DocumentFilterParams,
    ) {
        qb.push(" WHERE TRUE");
        if let RecordScope::Students(ids) = scope {
            qb.push(" AND student_id = ANY(").push_bind(ids.clone()).push(")");
        }
        if let Some(status) = filters.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(student_id) = filters.student_id {
            qb.push(" AND student_id = ").push_bind(student_id);
        }
    }

    /// Teachers are not narrowed: document review is not tied to courses.
    #[instrument(skip(db))]
    pub async fn list_documents(
        db: &PgPool,
        scope: &RecordScope,
        filters: &DocumentFilterParams,
        today: NaiveDate,
    ) -> Result<Paginated<DocumentDto>, AppError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents");
        Self::push_filters(&mut count_query, scope, filters);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(db)
            .await?;

        let mut data_query = QueryBuilder::<Postgres>::new("SELECT");
        data_query.push(DOCUMENT_COLUMNS).push(" FROM documents");
        Self::push_filters(&mut data_query, scope, filters);
        data_query
            .push(" ORDER BY due_date ASC NULLS LAST, created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let documents = data_query.build_query_as::<Document>().fetch_all(db).await?;

        Ok(Paginated::new(documents, total, &filters.pagination)
            .map(|doc| DocumentDto::new(doc, today)))
    }

    async fn fetch(
        conn: &mut PgConnection,
        id: DocumentId,
        lock: bool,
    ) -> Result<Document, AppError> {
        let mut query = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1");
        if lock {
            query.push_str(" FOR UPDATE");
        }
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Document not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_document(db: &PgPool, id: DocumentId) -> Result<Document, AppError> {
        let mut conn = db.acquire().await?;
        Self::fetch(&mut *conn, id, false).await
    }

    #[instrument(skip(db, dto))]
    pub async fn create_document(
        db: &PgPool,
        student_id: StudentId,
        dto: CreateDocumentDto,
    ) -> Result<Document, AppError> {
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"INSERT INTO documents (student_id, title, document_type, description, due_date)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {DOCUMENT_COLUMNS}"#
        ))
        .bind(student_id)
        .bind(dto.title.trim())
        .bind(dto.document_type.trim())
        .bind(dto.description)
        .bind(dto.due_date)
        .fetch_one(db)
        .await
        .map_err(|e| AppError::database(e, "Document already exists"))?;

        info!(document_id = %document.id, student_id = %student_id, "Document requested");
        Ok(document)
    }

    async fn write_state(
        conn: &mut PgConnection,
        id: DocumentId,
        transition: &Transition,
    ) -> Result<(), AppError> {
        let next = transition.next;
        match next {
            DocumentStatus::Pending => {
                sqlx::query(
                    r#"UPDATE documents SET
                           status = $2,
                           file_name = NULL, file_url = NULL, file_size = NULL,
                           mime_type = NULL, uploaded_at = NULL,
                           reviewed_by = NULL, reviewed_at = NULL, review_notes = NULL,
                           updated_at = NOW()
                       WHERE id = $1"#,
                )
                .bind(id)
                .bind(next)
                .execute(&mut *conn)
                .await?;
            }
            DocumentStatus::Uploaded => {
                let file = transition.file.as_ref().ok_or_else(|| {
                    AppError::bad_request(anyhow::anyhow!(
                        "Uploading requires file metadata; use the upload endpoint"
                    ))
                })?;
                sqlx::query(
                    r#"UPDATE documents SET
                           status = $2,
                           file_name = $3, file_url = $4, file_size = $5, mime_type = $6,
                           uploaded_at = NOW(),
                           updated_at = NOW()
                       WHERE id = $1"#,
                )
                .bind(id)
                .bind(next)
                .bind(file.file_name.trim())
                .bind(file.file_url.trim())
                .bind(file.file_size)
                .bind(file.mime_type.as_deref())
                .execute(&mut *conn)
                .await?;
            }
            DocumentStatus::Approved | DocumentStatus::Rejected => {
                sqlx::query(
                    r#"UPDATE documents SET
                           status = $2,
                           reviewed_by = $3, reviewed_at = NOW(), review_notes = $4,
                           updated_at = NOW()
                       WHERE id = $1"#,
                )
                .bind(id)
                .bind(next)
                .bind(transition.actor)
                .bind(transition.notes.as_deref())
                .execute(&mut *conn)
                .await?;
            }
            DocumentStatus::Expired => {
                sqlx::query(
                    r#"UPDATE documents SET
                           status = $2,
                           review_notes = COALESCE($3, review_notes),
                           updated_at = NOW()
                       WHERE id = $1"#,
                )
                .bind(id)
                .bind(next)
                .bind(transition.notes.as_deref())
                .execute(&mut *conn)
                .await?;
            }
        }
        Ok(())
    }

    /// Apply a status change. 409 when the move is not allowed from the
    /// current state.
    #[instrument(skip(db, transition), fields(next = transition.next.as_str()))]
    pub async fn transition(
        db: &PgPool,
        id: DocumentId,
        transition: Transition,
    ) -> Result<Document, AppError> {
        let mut tx = db.begin().await?;
        let current = Self::fetch(&mut *tx, id, true).await?;

        if !current.status.can_transition_to(transition.next) {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Cannot change document status from {} to {}",
                current.status.as_str(),
                transition.next.as_str()
            )));
        }

        Self::write_state(&mut *tx, id, &transition).await?;
        let document = Self::fetch(&mut *tx, id, false).await?;
        tx.commit().await?;

        info!(
            document_id = %id,
            from = current.status.as_str(),
            to = document.status.as_str(),
            "Document status changed"
        );
        track_document_transition(current.status.as_str(), document.status.as_str());
        Ok(document)
    }

    /// Expire every pending document whose due date is before `today`.
    #[instrument(skip(db))]
    pub async fn expire_overdue(db: &PgPool, today: NaiveDate) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"UPDATE documents SET status = 'expired', updated_at = NOW()
               WHERE status = 'pending' AND due_date < $1"#,
        )
        .bind(today)
        .execute(db)
        .await?;

        let expired = result.rows_affected();
        for _ in 0..expired {
            track_document_transition(
                DocumentStatus::Pending.as_str(),
                DocumentStatus::Expired.as_str(),
            );
        }
        info!(expired, "Expired overdue documents");
        Ok(expired)
    }

    #[instrument(skip(db))]
    pub async fn delete_document(db: &PgPool, id: DocumentId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Document not found")));
        }
        Ok(())
    }
}
