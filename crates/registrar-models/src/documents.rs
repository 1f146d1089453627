//! Student document models and status transitions.
//!
//! ```text
//! pending ──upload──▶ uploaded ──review──▶ approved | rejected
//!    │                   │                    │
//!    └───────────────────┴──────expire────────┴──▶ expired
//!
//! any state except pending ──reset──▶ pending (clears file and review data)
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use registrar_core::PaginationParams;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::display::Labeled;
use crate::ids::{DocumentId, StudentId, UserId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "document_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Uploaded,
    Approved,
    Rejected,
    Expired,
}

impl Labeled for DocumentStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Uploaded => "uploaded",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }
}

impl DocumentStatus {
    pub fn can_transition_to(self, next: DocumentStatus) -> bool {
        use DocumentStatus::*;
        match (self, next) {
            (Pending, Uploaded) => true,
            (Uploaded, Approved | Rejected) => true,
            (Pending | Uploaded | Approved, Expired) => true,
            (from, Pending) => from != Pending,
            _ => false,
        }
    }

    /// Moving to pending wipes file and review metadata.
    pub fn clears_attachments(self) -> bool {
        self == DocumentStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Document {
    pub id: DocumentId,
    pub student_id: StudentId,
    pub title: String,
    pub document_type: String,
    pub description: Option<String>,
    pub status: DocumentStatus,
    pub due_date: Option<NaiveDate>,
    pub file_name: Option<String>,
    pub file_url: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Still pending after its due date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == DocumentStatus::Pending && self.due_date.is_some_and(|due| due < today)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentDto {
    #[serde(flatten)]
    pub document: Document,
    pub status_label: String,
    pub is_overdue: bool,
}

impl DocumentDto {
    pub fn new(document: Document, today: NaiveDate) -> Self {
        Self {
            status_label: document.status.label(),
            is_overdue: document.is_overdue(today),
            document,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateDocumentDto {
    /// Required for admins; students always create for themselves
    pub student_id: Option<StudentId>,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub document_type: String,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UploadDocumentDto {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub file_name: String,
    #[validate(url(message = "must be a valid URL"))]
    pub file_url: String,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub file_size: Option<i64>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl From<ReviewDecision> for DocumentStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => DocumentStatus::Approved,
            ReviewDecision::Rejected => DocumentStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReviewDocumentDto {
    pub decision: ReviewDecision,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateDocumentStatusDto {
    pub status: DocumentStatus,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DocumentFilterParams {
    pub status: Option<DocumentStatus>,
    pub student_id: Option<StudentId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpireDocumentsResponse {
    pub expired: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use DocumentStatus::*;

    const ALL: [DocumentStatus; 5] = [Pending, Uploaded, Approved, Rejected, Expired];

    #[test]
    fn test_forward_transitions() {
        assert!(Pending.can_transition_to(Uploaded));
        assert!(Uploaded.can_transition_to(Approved));
        assert!(Uploaded.can_transition_to(Rejected));
    }

    #[test]
    fn test_no_backwards_or_skipping() {
        assert!(!Pending.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Uploaded));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Expired.can_transition_to(Uploaded));
    }

    #[test]
    fn test_expiry_sources() {
        assert!(Pending.can_transition_to(Expired));
        assert!(Uploaded.can_transition_to(Expired));
        assert!(Approved.can_transition_to(Expired));
        assert!(!Rejected.can_transition_to(Expired));
        assert!(!Expired.can_transition_to(Expired));
    }

    #[test]
    fn test_reset_allowed_from_every_other_state() {
        for status in ALL {
            assert_eq!(status.can_transition_to(Pending), status != Pending);
        }
    }

    #[test]
    fn test_only_pending_clears_attachments() {
        for status in ALL {
            assert_eq!(status.clears_attachments(), status == Pending);
        }
    }

    #[test]
    fn test_overdue_only_when_pending_past_due() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut doc = Document {
            id: DocumentId::new(),
            student_id: StudentId::new(),
            title: "Transcript".into(),
            document_type: "transcript".into(),
            description: None,
            status: Pending,
            due_date: NaiveDate::from_ymd_opt(2025, 5, 31),
            file_name: None,
            file_url: None,
            file_size: None,
            mime_type: None,
            uploaded_at: None,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(doc.is_overdue(today));
        doc.status = Uploaded;
        assert!(!doc.is_overdue(today));
        doc.status = Pending;
        doc.due_date = Some(today);
        assert!(!doc.is_overdue(today));
    }

    #[test]
    fn test_upload_requires_url() {
        let dto = UploadDocumentDto {
            file_name: "transcript.pdf".into(),
            file_url: "not a url".into(),
            file_size: Some(1024),
            mime_type: Some("application/pdf".into()),
        };
        assert!(dto.validate().is_err());
    }
}
