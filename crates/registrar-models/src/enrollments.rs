//! Enrollment models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::display::{Labeled, display_id};
use crate::ids::{CourseId, EnrollmentId, SemesterId, StudentId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "enrollment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Enrolled,
    Dropped,
    Completed,
}

impl Labeled for EnrollmentStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Enrolled => "enrolled",
            Self::Dropped => "dropped",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub semester_id: SemesterId,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
}

/// Enroll a student in a course. The semester defaults to the active one.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EnrollStudentDto {
    pub student_id: StudentId,
    pub semester_id: Option<SemesterId>,
}

/// Move an enrollment between enrolled, dropped and completed.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateEnrollmentStatusDto {
    pub status: EnrollmentStatus,
}

/// A student enrolled in a course, with their grade when one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseStudent {
    pub student_id: StudentId,
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub semester_id: SemesterId,
    pub semester_name: String,
    pub enrollment_status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub score: Option<f64>,
    pub letter_grade: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseStudentDto {
    #[serde(flatten)]
    pub row: CourseStudent,
    pub display_id: String,
    pub enrollment_status_label: String,
}

impl From<CourseStudent> for CourseStudentDto {
    fn from(row: CourseStudent) -> Self {
        Self {
            display_id: display_id("STU", row.student_id.as_uuid()),
            enrollment_status_label: row.enrollment_status.label(),
            row,
        }
    }
}
