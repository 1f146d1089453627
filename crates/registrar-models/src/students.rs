//! Student profile models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use registrar_core::PaginationParams;
use registrar_core::serde::deserialize_optional_string;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::aggregate::{LetterDistribution, round2};
use crate::display::{Labeled, display_id};
use crate::ids::{DepartmentId, StudentId, UserId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "student_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Active,
    AtRisk,
    Suspended,
    Inactive,
}

impl Labeled for StudentStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::AtRisk => "at_risk",
            Self::Suspended => "suspended",
            Self::Inactive => "inactive",
        }
    }
}

/// Column list matching [`Student`]; queries alias `students` as `s`,
/// `users` as `u` and `departments` as `d`.
pub const STUDENT_COLUMNS: &str = r#"
    s.id, s.user_id, u.first_name, u.last_name, u.email, s.student_number,
    s.department_id, d.name AS department_name, s.gpa, s.credits_earned,
    s.credits_required, s.enrollment_date, s.status, s.created_at, s.updated_at"#;

/// A student profile joined with its user and department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: StudentId,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub student_number: String,
    pub department_id: Option<DepartmentId>,
    pub department_name: Option<String>,
    pub gpa: Option<f64>,
    pub credits_earned: i32,
    pub credits_required: i32,
    pub enrollment_date: NaiveDate,
    pub status: StudentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Share of required credits earned, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        if self.credits_required <= 0 {
            return 0.0;
        }
        let pct = f64::from(self.credits_earned) * 100.0 / f64::from(self.credits_required);
        round2(pct.min(100.0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentDto {
    pub id: StudentId,
    pub display_id: String,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub student_number: String,
    pub department_id: Option<DepartmentId>,
    pub department_name: Option<String>,
    pub gpa: Option<f64>,
    pub credits_earned: i32,
    pub credits_required: i32,
    pub progress_percent: f64,
    pub enrollment_date: NaiveDate,
    pub status: StudentStatus,
    pub status_label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Student> for StudentDto {
    fn from(student: Student) -> Self {
        Self {
            display_id: display_id("STU", student.id.as_uuid()),
            full_name: format!("{} {}", student.first_name, student.last_name),
            progress_percent: student.progress_percent(),
            status_label: student.status.label(),
            id: student.id,
            user_id: student.user_id,
            first_name: student.first_name,
            last_name: student.last_name,
            email: student.email,
            student_number: student.student_number,
            department_id: student.department_id,
            department_name: student.department_name,
            gpa: student.gpa,
            credits_earned: student.credits_earned,
            credits_required: student.credits_required,
            enrollment_date: student.enrollment_date,
            status: student.status,
            created_at: student.created_at,
            updated_at: student.updated_at,
        }
    }
}

/// Admin update of a student profile. Only provided fields change.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentDto {
    #[validate(length(min = 1, max = 32, message = "must be 1-32 characters"))]
    pub student_number: Option<String>,
    pub department_id: Option<DepartmentId>,
    #[validate(range(min = 0.0, max = 4.0, message = "must be between 0 and 4"))]
    pub gpa: Option<f64>,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub credits_earned: Option<i32>,
    #[validate(range(min = 1, max = 400, message = "must be between 1 and 400"))]
    pub credits_required: Option<i32>,
    pub status: Option<StudentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct StudentFilterParams {
    pub status: Option<StudentStatus>,
    pub department_id: Option<DepartmentId>,
    /// Matches name, email or student number, case-insensitive
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// Academic summary of one student.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentSummary {
    pub student: StudentDto,
    pub average_score: f64,
    pub pass_rate: f64,
    pub graded_courses: i64,
    pub enrolled_courses: i64,
    pub distribution: LetterDistribution,
    /// Average below the at-risk threshold with at least one graded course
    pub at_risk: bool,
}
